//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional:
//! - `VUNJABEI_API_BASE_URL` - Backend base URL (e.g. `https://shop.example/api/`)
//! - `VUNJABEI_API_HOST` - Host for the fallback URL when the base URL is unset
//!   (default: 127.0.0.1; the fallback is `http://{host}:8000/api/`)
//! - `VUNJABEI_STATE_DIR` - Directory holding the persisted session (default: .vunjabei)
//! - `VUNJABEI_HTTP_TIMEOUT_SECS` - Request timeout in seconds (default: 30)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Port the backend listens on when no base URL is configured.
const FALLBACK_API_PORT: u16 = 8000;

/// File name of the persisted session inside the state directory.
const SESSION_FILE: &str = "session.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL, always ending in `/`
    pub api_base_url: Url,
    /// Directory for client state (persisted session)
    pub state_dir: PathBuf,
    /// Per-request timeout
    pub timeout: Duration,
}

impl ClientConfig {
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Configuration for an explicit base URL with default settings.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the URL is not http(s).
    pub fn new(api_base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_base_url: parse_base_url("VUNJABEI_API_BASE_URL", api_base_url)?,
            state_dir: PathBuf::from(".vunjabei"),
            timeout: Self::DEFAULT_TIMEOUT,
        })
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_base_url = match lookup("VUNJABEI_API_BASE_URL").filter(|v| !v.trim().is_empty()) {
            Some(raw) => parse_base_url("VUNJABEI_API_BASE_URL", &raw)?,
            None => {
                let host = lookup("VUNJABEI_API_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
                parse_base_url(
                    "VUNJABEI_API_HOST",
                    &format!("http://{host}:{FALLBACK_API_PORT}/api/"),
                )?
            }
        };

        let state_dir = lookup("VUNJABEI_STATE_DIR")
            .map_or_else(|| PathBuf::from(".vunjabei"), PathBuf::from);

        let timeout = match lookup("VUNJABEI_HTTP_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw.trim().parse::<u64>().map_err(|e| {
                    ConfigError::InvalidEnvVar("VUNJABEI_HTTP_TIMEOUT_SECS".to_string(), e.to_string())
                })?;
                if secs == 0 {
                    return Err(ConfigError::InvalidEnvVar(
                        "VUNJABEI_HTTP_TIMEOUT_SECS".to_string(),
                        "must be at least 1".to_string(),
                    ));
                }
                Duration::from_secs(secs)
            }
            None => Self::DEFAULT_TIMEOUT,
        };

        Ok(Self {
            api_base_url,
            state_dir,
            timeout,
        })
    }

    /// Path of the persisted session file.
    #[must_use]
    pub fn session_file(&self) -> PathBuf {
        self.state_dir.join(SESSION_FILE)
    }
}

/// Parse an http(s) base URL and make sure it ends in `/`.
///
/// Without the trailing slash `Url::join` would replace the last path
/// segment instead of appending to it.
fn parse_base_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let trimmed = raw.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };

    let url = Url::parse(&with_slash)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme: {}", url.scheme()),
        ));
    }

    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_fallback_base_url() {
        let config = ClientConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.api_base_url.as_str(), "http://127.0.0.1:8000/api/");
        assert_eq!(config.timeout, ClientConfig::DEFAULT_TIMEOUT);
        assert_eq!(config.session_file(), PathBuf::from(".vunjabei/session.json"));
    }

    #[test]
    fn test_fallback_uses_configured_host() {
        let config =
            ClientConfig::from_lookup(lookup_from(&[("VUNJABEI_API_HOST", "shop.local")])).unwrap();
        assert_eq!(config.api_base_url.as_str(), "http://shop.local:8000/api/");
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let config = ClientConfig::from_lookup(lookup_from(&[(
            "VUNJABEI_API_BASE_URL",
            "https://api.vunjabei.example/api",
        )]))
        .unwrap();
        assert_eq!(
            config.api_base_url.as_str(),
            "https://api.vunjabei.example/api/"
        );
        assert_eq!(
            config.api_base_url.join("products/").unwrap().as_str(),
            "https://api.vunjabei.example/api/products/"
        );
    }

    #[test]
    fn test_blank_base_url_uses_fallback() {
        let config =
            ClientConfig::from_lookup(lookup_from(&[("VUNJABEI_API_BASE_URL", "  ")])).unwrap();
        assert_eq!(config.api_base_url.port(), Some(8000));
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        let err = ClientConfig::new("ftp://files.example/").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_invalid_timeout() {
        let err = ClientConfig::from_lookup(lookup_from(&[("VUNJABEI_HTTP_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains("VUNJABEI_HTTP_TIMEOUT_SECS"));

        let err = ClientConfig::from_lookup(lookup_from(&[("VUNJABEI_HTTP_TIMEOUT_SECS", "0")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_custom_state_dir() {
        let config =
            ClientConfig::from_lookup(lookup_from(&[("VUNJABEI_STATE_DIR", "/tmp/vb")])).unwrap();
        assert_eq!(config.session_file(), PathBuf::from("/tmp/vb/session.json"));
    }
}
