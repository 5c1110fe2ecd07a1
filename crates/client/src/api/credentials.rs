//! Cookie credentials shared by every request.
//!
//! The backend authenticates with a session cookie set by `login/`. The store
//! wraps a `reqwest` cookie jar so the cookie can be exported into the
//! persisted session, restored on the next start, and dropped on logout.

use std::sync::{PoisonError, RwLock};

use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::HeaderValue;
use url::Url;

/// Clearable cookie jar.
#[derive(Default)]
pub struct CredentialStore {
    jar: RwLock<Jar>,
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("jar", &"[REDACTED]")
            .finish()
    }
}

impl CredentialStore {
    /// Cookie header the next request to `url` would carry.
    pub fn export(&self, url: &Url) -> Option<String> {
        self.cookies(url)
            .and_then(|value| value.to_str().ok().map(str::to_owned))
    }

    /// Load cookies previously returned by [`Self::export`].
    pub fn restore(&self, url: &Url, header: &str) {
        let jar = self.jar.read().unwrap_or_else(PoisonError::into_inner);
        for pair in header.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            jar.add_cookie_str(pair, url);
        }
    }

    /// Forget every cookie.
    pub fn clear(&self) {
        *self.jar.write().unwrap_or_else(PoisonError::into_inner) = Jar::default();
    }
}

impl CookieStore for CredentialStore {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        self.jar
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .set_cookies(cookie_headers, url);
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        self.jar
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .cookies(url)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_restore_export_clear() {
        let url = Url::parse("http://127.0.0.1:8000/api/").unwrap();
        let store = CredentialStore::default();
        assert!(store.export(&url).is_none());

        store.restore(&url, "sessionid=abc123; csrftoken=xyz");
        let exported = store.export(&url).unwrap();
        assert!(exported.contains("sessionid=abc123"));
        assert!(exported.contains("csrftoken=xyz"));

        store.clear();
        assert!(store.export(&url).is_none());
    }
}
