//! SQLite-backed cookie store.
//!
//! `SqliteCookieStore` persists the profile's cookie jar in an SQLite database.
//! It implements the [`CookieStore`] trait and returns a jar wrapped in a
//! [`PersistentCookieJar`], so that **every mutation** triggers a snapshot
//! write back to this store.
//!
//! ## Design
//! - One **table** (`cookies`); each row is a single cookie keyed by name.
//! - Database access is via an `r2d2` pool for safe multi-threaded use.
//! - `save` **rewrites** the set of cookies (DELETE + INSERT in one transaction).
//! - Runtime DB errors are logged; only opening the database can fail.
//!
//! ## Example
//! ```no_run
//! use consenthub::cookies::{CookieStore, SqliteCookieStore};
//!
//! let store = SqliteCookieStore::new("cookies.sqlite".into()).unwrap();
//! let jar = store.jar();
//! ```

use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock, Weak};
use std::time::Duration;

use anyhow::Result;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::rusqlite::{params, OpenFlags};
use r2d2_sqlite::SqliteConnectionManager;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::cookies::cookie_jar::DefaultCookieJar;
use crate::cookies::persistent_cookie_jar::PersistentCookieJar;
use crate::cookies::store::CookieStore;
use crate::cookies::{Cookie, CookieJar, CookieJarHandle, CookieStoreHandle, SameSite};

/// A SQLite-based cookie store that persists cookies across sessions.
pub struct SqliteCookieStore {
    /// Connection pool for SQLite database (so it can run multithreaded)
    pool: Pool<SqliteConnectionManager>,
    /// The live jar, once minted.
    jar: RwLock<Weak<RwLock<PersistentCookieJar>>>,
    /// Self handle provided to the persistent jar for callback persistence.
    store_self: Weak<SqliteCookieStore>,
}

impl SqliteCookieStore {
    /// Opens (or creates) a SQLite database at `path` and ensures the schema exists.
    pub fn new(path: PathBuf) -> Result<Arc<Self>> {
        let manager = SqliteConnectionManager::file(path)
            .with_flags(OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE)
            .with_init(|c| {
                c.busy_timeout(Duration::from_millis(500))?;
                c.execute_batch(
                    "CREATE TABLE IF NOT EXISTS cookies (
                        name TEXT NOT NULL PRIMARY KEY,
                        value TEXT NOT NULL,
                        path TEXT,
                        domain TEXT,
                        expires TEXT,
                        same_site TEXT,
                        secure INTEGER NOT NULL
                    );",
                )?;
                Ok(())
            });

        let pool = Pool::builder()
            .max_size(4)
            .connection_timeout(Duration::from_secs(5))
            .build(manager)?;

        Ok(Arc::new_cyclic(|me| Self {
            pool,
            jar: RwLock::new(Weak::new()),
            store_self: me.clone(),
        }))
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }

    /// Loads all cookies from the database into a new [`DefaultCookieJar`].
    fn load(&self) -> Result<DefaultCookieJar> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT name, value, path, domain, expires, same_site, secure FROM cookies ORDER BY rowid")?;

        let rows = stmt.query_map([], |row| {
            let expires: Option<String> = row.get(4)?;
            let same_site: Option<String> = row.get(5)?;
            Ok(Cookie {
                name: row.get(0)?,
                value: row.get(1)?,
                path: row.get(2)?,
                domain: row.get(3)?,
                expires: expires.and_then(|e| OffsetDateTime::parse(&e, &Rfc3339).ok()),
                same_site: same_site.as_deref().and_then(SameSite::parse),
                secure: row.get::<_, i64>(6)? != 0,
            })
        })?;

        let cookies = rows.filter_map(|r| r.ok()).collect();
        Ok(DefaultCookieJar::from_cookies(cookies))
    }

    /// Replaces all stored cookies with `cookies` in a transaction.
    fn save(&self, cookies: &[Cookie]) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM cookies", [])?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO cookies (name, value, path, domain, expires, same_site, secure)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;

            for cookie in cookies {
                let expires = match cookie.expires {
                    Some(e) => Some(e.format(&Rfc3339)?),
                    None => None,
                };
                stmt.execute(params![
                    cookie.name,
                    cookie.value,
                    cookie.path,
                    cookie.domain,
                    expires,
                    cookie.same_site.map(|s| s.to_string()),
                    cookie.secure as i64,
                ])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn save_or_log(&self, cookies: &[Cookie]) {
        if let Err(e) = self.save(cookies) {
            log::error!("sqlite cookie store: cannot persist cookies: {:#}", e);
        }
    }
}

impl CookieStore for SqliteCookieStore {
    fn jar(&self) -> CookieJarHandle {
        let mut slot = self.jar.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(jar) = slot.upgrade() {
            return jar;
        }

        let loaded = self.load().unwrap_or_else(|e| {
            log::error!("sqlite cookie store: cannot load cookies: {:#}", e);
            DefaultCookieJar::new()
        });

        let store: CookieStoreHandle = match self.store_self.upgrade() {
            Some(store) => store,
            None => return Arc::new(RwLock::new(loaded)),
        };

        let jar = Arc::new(RwLock::new(PersistentCookieJar::new(loaded, store)));
        *slot = Arc::downgrade(&jar);
        jar
    }

    fn persist_snapshot(&self, snapshot: &DefaultCookieJar) {
        self.save_or_log(&snapshot.cookies());
    }

    fn clear(&self) {
        let jar = self.jar.read().unwrap_or_else(PoisonError::into_inner).upgrade();
        match jar {
            Some(jar) => jar.write().unwrap_or_else(PoisonError::into_inner).clear(),
            None => self.save_or_log(&[]),
        }
    }
}
