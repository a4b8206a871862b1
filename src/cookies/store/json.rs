//! JSON-backed cookie store.
//!
//! `JsonCookieStore` persists the profile's cookie jar in a single JSON file on
//! disk. It implements the [`CookieStore`] trait and returns a jar wrapped in
//! [`PersistentCookieJar`], so that **every mutation** triggers a snapshot
//! write back to this store.
//!
//! ### I/O characteristics & caveats
//! - Each persist rewrites the entire file. The jar of a consent widget holds a
//!   handful of cookies, so this stays cheap.
//! - File writes go to a sibling temp file first and are renamed into place.
//! - I/O and serialization errors are logged, never raised: the in-memory jar
//!   remains authoritative for the running process.
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock, Weak};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::cookies::cookie_jar::DefaultCookieJar;
use crate::cookies::persistent_cookie_jar::PersistentCookieJar;
use crate::cookies::store::CookieStore;
use crate::cookies::{Cookie, CookieJar, CookieJarHandle, CookieStoreHandle};

/// On-disk representation of the jar.
#[derive(Debug, Default, Serialize, Deserialize)]
struct CookieStoreFile {
    cookies: Vec<Cookie>,
}

/// A JSON-based cookie store that persists cookies across sessions.
pub struct JsonCookieStore {
    /// Path to the JSON file where cookies are stored.
    path: PathBuf,

    /// The live jar, once minted. Held weakly: the jar owns the store, not the other way around.
    jar: RwLock<Weak<RwLock<PersistentCookieJar>>>,

    /// Self handle, so `PersistentCookieJar` can call back into this store.
    store_self: Weak<JsonCookieStore>,
}

impl JsonCookieStore {
    /// Creates (or opens) a JSON cookie store at `path`.
    ///
    /// The file is created lazily on the first persist.
    pub fn new(path: PathBuf) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            path,
            jar: RwLock::new(Weak::new()),
            store_self: me.clone(),
        })
    }

    /// Loads the file. A missing file is an empty jar; an unreadable one is logged and treated as empty.
    fn load_file(&self) -> CookieStoreFile {
        if !self.path.exists() {
            return CookieStoreFile::default();
        }

        match self.read_file() {
            Ok(file) => file,
            Err(e) => {
                log::error!("cookie store {}: {:#}", self.path.display(), e);
                CookieStoreFile::default()
            }
        }
    }

    fn read_file(&self) -> Result<CookieStoreFile> {
        let contents = fs::read_to_string(&self.path).context("cannot read cookie store file")?;
        serde_json::from_str(&contents).context("cannot parse cookie store file")
    }

    fn save_file(&self, store_file: &CookieStoreFile) -> Result<()> {
        let contents = serde_json::to_string_pretty(store_file).context("cannot serialize cookies")?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, contents).context("cannot write cookie store file")?;
        fs::rename(&tmp, &self.path).context("cannot replace cookie store file")?;
        Ok(())
    }

    fn save_or_log(&self, cookies: Vec<Cookie>) {
        if let Err(e) = self.save_file(&CookieStoreFile { cookies }) {
            log::error!("cookie store {}: {:#}", self.path.display(), e);
        }
    }
}

impl CookieStore for JsonCookieStore {
    /// Returns the live jar, loading it from disk on first use.
    fn jar(&self) -> CookieJarHandle {
        let mut slot = self.jar.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(jar) = slot.upgrade() {
            return jar;
        }

        let loaded = DefaultCookieJar::from_cookies(self.load_file().cookies);
        let store: CookieStoreHandle = match self.store_self.upgrade() {
            Some(store) => store,
            // Only reachable while the store itself is being dropped
            None => return Arc::new(RwLock::new(loaded)),
        };

        let jar = Arc::new(RwLock::new(PersistentCookieJar::new(loaded, store)));
        *slot = Arc::downgrade(&jar);
        jar
    }

    fn persist_snapshot(&self, snapshot: &DefaultCookieJar) {
        self.save_or_log(snapshot.cookies());
    }

    fn clear(&self) {
        let jar = self.jar.read().unwrap_or_else(PoisonError::into_inner).upgrade();
        match jar {
            // Persists the now empty jar
            Some(jar) => jar.write().unwrap_or_else(PoisonError::into_inner).clear(),
            None => self.save_or_log(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookies_survive_a_new_store_instance() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");

        {
            let store = JsonCookieStore::new(path.clone());
            let jar = store.jar();
            jar.write().unwrap().set_cookie("a=1; max-age=3600; path=/");
            jar.write().unwrap().set_cookie("visitor=xyz; path=/");
        }

        let store = JsonCookieStore::new(path);
        let jar = store.jar();
        assert_eq!(jar.read().unwrap().cookie_string(), "a=1; visitor=xyz");
    }

    #[test]
    fn same_store_returns_same_jar() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonCookieStore::new(dir.path().join("cookies.json"));

        let a = store.jar();
        let b = store.jar();
        a.write().unwrap().set_cookie("k=v");
        assert_eq!(b.read().unwrap().cookie_string(), "k=v");
    }

    #[test]
    fn corrupted_file_loads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");
        fs::write(&path, "{ definitely not json").unwrap();

        let store = JsonCookieStore::new(path);
        assert_eq!(store.jar().read().unwrap().cookie_string(), "");
    }

    #[test]
    fn clear_wipes_disk_and_jar() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");

        let store = JsonCookieStore::new(path.clone());
        let jar = store.jar();
        jar.write().unwrap().set_cookie("k=v");
        store.clear();
        assert_eq!(jar.read().unwrap().cookie_string(), "");

        let reopened = JsonCookieStore::new(path);
        assert_eq!(reopened.jar().read().unwrap().cookie_string(), "");
    }
}
