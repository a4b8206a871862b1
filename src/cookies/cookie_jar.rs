//! Cookie jar abstraction and a simple in-memory implementation.
//!
//! A **cookie jar** holds every cookie of one storage profile (a single site as
//! seen by one browser profile). Writes use the same assignment syntax a page
//! script would hand to `document.cookie`, reads return the familiar
//! `"name=value; other=value"` string.
//!
//! ## Notes & limitations
//! - Attributes handled: `expires`, `max-age`, `path`, `domain`, `samesite`,
//!   `secure`. Everything else is ignored.
//! - An assignment whose expiry is in the past deletes the cookie.
//! - Cookies are keyed by name only; path/domain are stored but not used for
//!   matching since the jar already is scoped to one site.
//! - This module is **not** internally synchronized. Use it via a
//!   [`CookieJarHandle`](crate::cookies::CookieJarHandle).

use crate::cookies::cookie::parse_http_date;
use crate::cookies::{Cookie, SameSite};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

/// A cookie jar keeps the cookies of one storage profile.
pub trait CookieJar: Send + Sync {
    /// Applies a `document.cookie`-style assignment (`name=value; attr=...`).
    ///
    /// Same-name cookies are replaced (last write wins). An assignment that is
    /// already expired removes the cookie. Malformed assignments are ignored.
    fn set_cookie(&mut self, assignment: &str);

    /// Returns all live cookies as `"name=value"` pairs joined by `"; "`.
    fn cookie_string(&self) -> String;

    /// Returns a snapshot of all live cookies.
    fn cookies(&self) -> Vec<Cookie>;

    /// Removes all cookies from the jar.
    fn clear(&mut self);
}

/// Default cookie jar, **in-memory only**.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefaultCookieJar {
    /// Cookies in insertion order.
    pub entries: Vec<Cookie>,
}

impl DefaultCookieJar {
    /// Creates an empty in-memory cookie jar.
    pub fn new() -> Self {
        DefaultCookieJar { entries: Vec::new() }
    }

    /// Creates a jar from previously persisted cookies, dropping the ones that expired meanwhile.
    pub fn from_cookies(cookies: Vec<Cookie>) -> Self {
        let now = OffsetDateTime::now_utc();
        DefaultCookieJar {
            entries: cookies.into_iter().filter(|c| !c.is_expired(now)).collect(),
        }
    }

    fn purge_expired(&mut self, now: OffsetDateTime) {
        self.entries.retain(|c| !c.is_expired(now));
    }
}

/// Parses an assignment into a cookie. `now` anchors `max-age`.
pub(crate) fn parse_assignment(assignment: &str, now: OffsetDateTime) -> Option<Cookie> {
    let mut parts = assignment.split(';');
    let (name, value) = parts.next()?.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }

    let mut cookie = Cookie::new(name, value.trim());
    let mut max_age = None;

    for part in parts {
        let part = part.trim();
        if let Some((k, v)) = part.split_once('=') {
            match k.trim().to_ascii_lowercase().as_str() {
                "path" => cookie.path = Some(v.trim().to_string()),
                "domain" => cookie.domain = Some(v.trim().trim_start_matches('.').to_string()),
                "expires" => cookie.expires = parse_http_date(v),
                "max-age" => max_age = v.trim().parse::<i64>().ok(),
                "samesite" => cookie.same_site = SameSite::parse(v),
                _ => {}
            }
        } else if part.eq_ignore_ascii_case("secure") {
            cookie.secure = true;
        }
    }

    // Max-Age wins over Expires
    if let Some(secs) = max_age {
        cookie.expires = Some(now + Duration::seconds(secs));
    }

    Some(cookie)
}

impl CookieJar for DefaultCookieJar {
    fn set_cookie(&mut self, assignment: &str) {
        let now = OffsetDateTime::now_utc();
        let Some(cookie) = parse_assignment(assignment, now) else {
            log::debug!("ignoring malformed cookie assignment");
            return;
        };

        self.purge_expired(now);

        if cookie.is_expired(now) {
            self.entries.retain(|c| c.name != cookie.name);
            return;
        }

        // Replace existing cookie with same name
        if let Some(existing) = self.entries.iter_mut().find(|c| c.name == cookie.name) {
            *existing = cookie;
        } else {
            self.entries.push(cookie);
        }
    }

    fn cookie_string(&self) -> String {
        let now = OffsetDateTime::now_utc();
        self.entries
            .iter()
            .filter(|c| !c.is_expired(now))
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn cookies(&self) -> Vec<Cookie> {
        let now = OffsetDateTime::now_utc();
        self.entries.iter().filter(|c| !c.is_expired(now)).cloned().collect()
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookies::format_http_date;

    #[test]
    fn set_and_read_back() {
        let mut jar = DefaultCookieJar::new();
        jar.set_cookie("a=1; path=/");
        jar.set_cookie("b=2; path=/; SameSite=Lax");
        assert_eq!(jar.cookie_string(), "a=1; b=2");
    }

    #[test]
    fn same_name_replaces() {
        let mut jar = DefaultCookieJar::new();
        jar.set_cookie("a=1");
        jar.set_cookie("b=2");
        jar.set_cookie("a=3");
        assert_eq!(jar.cookie_string(), "a=3; b=2");
        assert_eq!(jar.cookies().len(), 2);
    }

    #[test]
    fn attributes_are_parsed() {
        let future = OffsetDateTime::now_utc() + Duration::days(3);
        let mut jar = DefaultCookieJar::new();
        jar.set_cookie(&format!(
            "k=v; expires={}; path=/; domain=.example.com; SameSite=Lax; Secure",
            format_http_date(future)
        ));

        let c = &jar.cookies()[0];
        assert_eq!(c.path.as_deref(), Some("/"));
        assert_eq!(c.domain.as_deref(), Some("example.com"));
        assert_eq!(c.same_site, Some(SameSite::Lax));
        assert!(c.secure);
        // HTTP dates carry whole seconds only
        let exp = c.expires.unwrap();
        assert!((exp - future).abs() < Duration::seconds(1));
    }

    #[test]
    fn expired_assignment_deletes() {
        let mut jar = DefaultCookieJar::new();
        jar.set_cookie("a=1; path=/");
        jar.set_cookie("a=; expires=Thu, 01 Jan 1970 00:00:00 GMT; path=/");
        assert_eq!(jar.cookie_string(), "");
        assert!(jar.cookies().is_empty());
    }

    #[test]
    fn max_age_zero_deletes() {
        let mut jar = DefaultCookieJar::new();
        jar.set_cookie("a=1");
        jar.set_cookie("a=1; max-age=0");
        assert!(jar.cookies().is_empty());
    }

    #[test]
    fn malformed_assignments_are_ignored() {
        let mut jar = DefaultCookieJar::new();
        jar.set_cookie("no-equals-sign");
        jar.set_cookie("=value-without-name");
        assert!(jar.cookies().is_empty());
    }

    #[test]
    fn from_cookies_drops_expired() {
        let mut alive = Cookie::new("alive", "1");
        alive.expires = Some(OffsetDateTime::now_utc() + Duration::days(1));
        let mut dead = Cookie::new("dead", "1");
        dead.expires = Some(OffsetDateTime::now_utc() - Duration::days(1));

        let jar = DefaultCookieJar::from_cookies(vec![alive, dead, Cookie::new("session", "1")]);
        assert_eq!(jar.cookie_string(), "alive=1; session=1");
    }

    #[test]
    fn clear_empties_the_jar() {
        let mut jar = DefaultCookieJar::new();
        jar.set_cookie("a=1");
        jar.clear();
        assert_eq!(jar.cookie_string(), "");
    }
}
