use crate::cookies::cookie_jar::DefaultCookieJar;
use crate::cookies::{Cookie, CookieJar, CookieStoreHandle};

/// A `CookieJar` decorator that persists changes after each mutation.
///
/// This type is *transparent* for reads but *eagerly* persists after writes.
pub struct PersistentCookieJar {
    /// Jar that holds the actual cookie state.
    pub(crate) inner: DefaultCookieJar,
    /// Handle to the cookie store responsible for persistence.
    store_handle: CookieStoreHandle,
}

impl PersistentCookieJar {
    /// Creates a new persistence-enabled wrapper around an existing jar.
    pub fn new(jar: DefaultCookieJar, store_handle: CookieStoreHandle) -> Self {
        Self {
            inner: jar,
            store_handle,
        }
    }

    fn persist(&self) {
        self.store_handle.persist_snapshot(&self.inner);
    }
}

impl CookieJar for PersistentCookieJar {
    /// Applies the assignment, then persists the updated state.
    fn set_cookie(&mut self, assignment: &str) {
        self.inner.set_cookie(assignment);
        self.persist();
    }

    fn cookie_string(&self) -> String {
        self.inner.cookie_string()
    }

    fn cookies(&self) -> Vec<Cookie> {
        self.inner.cookies()
    }

    /// Clears all cookies in the jar, then persists the updated state.
    fn clear(&mut self) {
        self.inner.clear();
        self.persist();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookies::store::CookieStore;
    use crate::cookies::CookieJarHandle;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct RecordingStore {
        snapshots: Mutex<Vec<String>>,
    }

    impl CookieStore for RecordingStore {
        fn jar(&self) -> CookieJarHandle {
            unreachable!("not used by these tests")
        }
        fn persist_snapshot(&self, snapshot: &DefaultCookieJar) {
            self.snapshots.lock().unwrap().push(snapshot.cookie_string());
        }
        fn clear(&self) {}
    }

    #[test]
    fn every_mutation_persists_a_snapshot() {
        let store = Arc::new(RecordingStore::default());
        let mut jar = PersistentCookieJar::new(DefaultCookieJar::new(), store.clone());

        jar.set_cookie("a=1");
        jar.set_cookie("b=2");
        assert_eq!(jar.cookie_string(), "a=1; b=2");
        jar.clear();

        let snapshots = store.snapshots.lock().unwrap();
        assert_eq!(*snapshots, vec!["a=1", "a=1; b=2", ""]);
    }
}
