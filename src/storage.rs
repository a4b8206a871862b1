//! Local key/value store on top of a cookie jar.
//!
//! [`CookieStorage`] is the only component that talks to the jar. Every entry
//! is a site-wide (`path=/`), `SameSite=Lax` cookie, either with an expiry a
//! number of days ahead or session-scoped.
//!
//! Values are escaped only as far as needed to keep them free of the `;` field
//! separator. Names are taken as-is; reserved characters in names are a caller
//! error.

use crate::cookies::{format_http_date, CookieJarHandle};
use std::borrow::Cow;
use std::sync::PoisonError;
use time::{Duration, OffsetDateTime};

const DELETED_EXPIRES: &str = "Thu, 01 Jan 1970 00:00:00 GMT";

/// Cookie-backed key/value storage.
#[derive(Clone)]
pub struct CookieStorage {
    jar: CookieJarHandle,
}

impl std::fmt::Debug for CookieStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieStorage").finish_non_exhaustive()
    }
}

impl CookieStorage {
    pub fn new(jar: CookieJarHandle) -> Self {
        Self { jar }
    }

    /// Returns the underlying jar handle.
    pub fn jar(&self) -> &CookieJarHandle {
        &self.jar
    }

    /// Stores `value` under `name`. `ttl_days` of `None` writes a session entry.
    ///
    /// Like a browser cookie, leading and trailing whitespace of `value` is not
    /// kept.
    pub fn write(&self, name: &str, value: &str, ttl_days: Option<u32>) {
        let mut assignment = format!("{}={}", name, escape(value));
        if let Some(days) = ttl_days {
            let expires = OffsetDateTime::now_utc() + Duration::days(i64::from(days));
            assignment.push_str("; expires=");
            assignment.push_str(&format_http_date(expires));
        }
        assignment.push_str("; path=/; SameSite=Lax");

        self.jar.write().unwrap_or_else(PoisonError::into_inner).set_cookie(&assignment);
    }

    /// Returns the value stored under `name`, if any.
    pub fn read(&self, name: &str) -> Option<String> {
        let cookies = self.jar.read().unwrap_or_else(PoisonError::into_inner).cookie_string();
        cookies
            .split(';')
            .filter_map(|pair| pair.trim_start().split_once('='))
            .find(|(k, _)| *k == name)
            .map(|(_, v)| unescape(v).into_owned())
    }

    /// Removes the entry by overwriting it with an already expired one.
    pub fn delete(&self, name: &str) {
        let assignment = format!("{}=; expires={}; path=/; SameSite=Lax", name, DELETED_EXPIRES);
        self.jar.write().unwrap_or_else(PoisonError::into_inner).set_cookie(&assignment);
    }
}

fn escape(value: &str) -> Cow<'_, str> {
    if value.contains(['%', ';']) {
        Cow::Owned(value.replace('%', "%25").replace(';', "%3B"))
    } else {
        Cow::Borrowed(value)
    }
}

fn unescape(value: &str) -> Cow<'_, str> {
    if value.contains('%') {
        Cow::Owned(value.replace("%3B", ";").replace("%25", "%"))
    } else {
        Cow::Borrowed(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookies::DefaultCookieJar;
    use std::sync::{Arc, RwLock};

    fn storage() -> CookieStorage {
        CookieStorage::new(Arc::new(RwLock::new(DefaultCookieJar::new())))
    }

    #[test]
    fn write_read_delete() {
        let s = storage();
        assert_eq!(s.read("k"), None);

        s.write("k", "v", Some(365));
        assert_eq!(s.read("k").as_deref(), Some("v"));

        s.delete("k");
        assert_eq!(s.read("k"), None);
    }

    #[test]
    fn ttl_sets_expiry_and_lax_site_wide_scope() {
        let s = storage();
        s.write("k", "v", Some(365));

        let cookies = s.jar().read().unwrap().cookies();
        let c = &cookies[0];
        assert_eq!(c.path.as_deref(), Some("/"));
        assert_eq!(c.same_site, Some(crate::cookies::SameSite::Lax));

        let remaining = c.expires.unwrap() - OffsetDateTime::now_utc();
        assert!(remaining > Duration::days(364));
        assert!(remaining <= Duration::days(365));
    }

    #[test]
    fn no_ttl_writes_session_entry() {
        let s = storage();
        s.write("session", "1", None);
        let cookies = s.jar().read().unwrap().cookies();
        assert!(cookies[0].is_session());
    }

    #[test]
    fn names_do_not_match_by_prefix() {
        let s = storage();
        s.write("consenthub_visitor_id_old", "stale", None);
        s.write("id", "1", None);
        assert_eq!(s.read("consenthub_visitor_id"), None);
        assert_eq!(s.read("id").as_deref(), Some("1"));
    }

    #[test]
    fn separator_in_value_is_escaped() {
        let s = storage();
        s.write("k", r#"{"a":"x;y","b":"100%"}"#, None);
        s.write("other", "1", None);
        assert_eq!(s.read("k").as_deref(), Some(r#"{"a":"x;y","b":"100%"}"#));
        assert_eq!(s.read("other").as_deref(), Some("1"));
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        let s = storage();
        s.write("k", "  padded value  ", None);
        assert_eq!(s.read("k").as_deref(), Some("padded value"));
    }

    #[test]
    fn json_values_pass_through_unchanged() {
        let s = storage();
        let json = r#"{"timestamp":"2026-10-19T10:00:00Z","categories":{"necessary":true}}"#;
        s.write("k", json, Some(1));
        assert_eq!(s.jar().read().unwrap().cookies()[0].value, json);
    }
}
