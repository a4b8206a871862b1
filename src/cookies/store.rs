//! Cookie store infrastructure.
//!
//! A **cookie store** is a provisioner and persistence layer for a profile's
//! cookie jar.
//! - The consent components only *hold a [`CookieJarHandle`]*, never a store.
//! - A **CookieStore** can *mint* the jar and persist it after each change
//!   (e.g., a single JSON file or an SQLite database).
//!
//! For ephemeral profiles, skip the store and use an in-memory
//! [`DefaultCookieJar`] directly.
//!
//! ## Example
//! ```rust,no_run
//! use consenthub::cookies::{CookieStore, JsonCookieStore};
//!
//! let store = JsonCookieStore::new("cookies.json".into());
//! let jar = store.jar();
//! jar.write().unwrap().set_cookie("a=1; path=/");
//! ```
mod json;
#[cfg(feature = "sqlite_cookie_store")]
mod sqlite;

use crate::cookies::cookie_jar::DefaultCookieJar;
use crate::cookies::CookieJarHandle;

/// File-backed JSON cookie store.
pub use json::JsonCookieStore;
/// SQLite-backed cookie store.
#[cfg(feature = "sqlite_cookie_store")]
pub use sqlite::SqliteCookieStore;

/// A cookie **store** mints the profile's cookie **jar** and persists it.
///
/// Implementations must be `Send + Sync` and safe for concurrent use. Every
/// method is **best-effort**: failures are logged and must not panic.
pub trait CookieStore: Send + Sync {
    /// Returns (or creates and returns) the jar handle for this store.
    ///
    /// Should return the *same logical jar instance* across calls, so all
    /// holders observe consistent state.
    fn jar(&self) -> CookieJarHandle;

    /// Persists the cookie state from a provided snapshot, replacing what was stored.
    fn persist_snapshot(&self, snapshot: &DefaultCookieJar);

    /// Removes all persisted cookies and empties the live jar.
    fn clear(&self);
}
