//! Pseudo-anonymous visitor identity.
//!
//! A visitor id correlates consent reports of one storage profile. It is
//! created lazily on first use and never regenerated while the entry exists.
//! Uniqueness is probabilistic, not cryptographic.

use crate::storage::CookieStorage;
use rand::Rng;

/// Storage key of the visitor id.
pub const VISITOR_ID_KEY: &str = "consenthub_visitor_id";

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

#[derive(Clone, Debug)]
pub struct VisitorIdentity {
    storage: CookieStorage,
}

impl VisitorIdentity {
    pub fn new(storage: CookieStorage) -> Self {
        Self { storage }
    }

    /// Returns the persisted visitor id, creating and persisting one if absent.
    pub fn get_or_create_visitor_id(&self) -> String {
        if let Some(id) = self.storage.read(VISITOR_ID_KEY).filter(|id| !id.is_empty()) {
            return id;
        }

        let id = generate_visitor_id(&mut rand::rng());
        // No expiry attribute: lives as long as the storage profile
        self.storage.write(VISITOR_ID_KEY, &id, None);
        log::debug!("created visitor id {}", id);
        id
    }
}

/// Two independent random base-36 fragments, concatenated.
pub(crate) fn generate_visitor_id<R: Rng>(rng: &mut R) -> String {
    let mut id = base36_fragment(rng.random::<u64>());
    id.push_str(&base36_fragment(rng.random::<u64>()));
    id
}

fn base36_fragment(mut n: u64) -> String {
    if n == 0 {
        return String::from("0");
    }

    let mut digits = Vec::with_capacity(13);
    while n > 0 {
        digits.push(BASE36[(n % 36) as usize]);
        n /= 36;
    }
    digits.reverse();
    // Only ASCII digits and lowercase letters were pushed
    String::from_utf8_lossy(&digits).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookies::DefaultCookieJar;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::{Arc, RwLock};

    fn identity() -> (VisitorIdentity, CookieStorage) {
        let storage = CookieStorage::new(Arc::new(RwLock::new(DefaultCookieJar::new())));
        (VisitorIdentity::new(storage.clone()), storage)
    }

    #[test]
    fn same_profile_same_id() {
        let (identity, _) = identity();
        let a = identity.get_or_create_visitor_id();
        let b = identity.get_or_create_visitor_id();
        assert_eq!(a, b);
        assert!(!a.is_empty());
    }

    #[test]
    fn id_is_persisted_without_expiry() {
        let (identity, storage) = identity();
        let id = identity.get_or_create_visitor_id();
        assert_eq!(storage.read(VISITOR_ID_KEY), Some(id));

        let cookies = storage.jar().read().unwrap().cookies();
        assert!(cookies.iter().find(|c| c.name == VISITOR_ID_KEY).unwrap().is_session());
    }

    #[test]
    fn existing_id_is_reused() {
        let (identity, storage) = identity();
        storage.write(VISITOR_ID_KEY, "preexisting42", None);
        assert_eq!(identity.get_or_create_visitor_id(), "preexisting42");
    }

    #[test]
    fn separate_profiles_get_different_ids() {
        let (a, _) = identity();
        let (b, _) = identity();
        assert_ne!(a.get_or_create_visitor_id(), b.get_or_create_visitor_id());
    }

    #[test]
    fn generated_ids_are_base36() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let id = generate_visitor_id(&mut rng);
            assert!(id.len() >= 2 && id.len() <= 26);
            assert!(id.bytes().all(|b| b.is_ascii_digit() || b.is_ascii_lowercase()));
        }
    }

    #[test]
    fn base36_fragment_encodes() {
        assert_eq!(base36_fragment(0), "0");
        assert_eq!(base36_fragment(35), "z");
        assert_eq!(base36_fragment(36), "10");
        assert_eq!(base36_fragment(u64::MAX), "3w5e11264sgsf");
    }
}
