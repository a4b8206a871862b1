//! Cookies: [`CookieJar`], [`CookieStore`] and backends.

mod cookie;
mod cookie_jar;
mod persistent_cookie_jar;
mod store;

pub use cookie::{format_http_date, parse_http_date, Cookie, SameSite};
pub use cookie::{CookieJarHandle, CookieStoreHandle};

pub use cookie_jar::CookieJar;
pub use cookie_jar::DefaultCookieJar;
pub use persistent_cookie_jar::PersistentCookieJar;

pub use store::CookieStore;
pub use store::JsonCookieStore;
#[cfg(feature = "sqlite_cookie_store")]
pub use store::SqliteCookieStore;
