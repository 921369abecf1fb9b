//! Portal configuration parsed from environment variables.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;
pub const DEFAULT_TOAST_SECS: u64 = 4;
pub const MIN_TOAST_SECS: u64 = 3;
pub const MAX_TOAST_SECS: u64 = 5;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub request_secs: u64,
    pub connect_secs: u64,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self { request_secs: DEFAULT_REQUEST_TIMEOUT_SECS, connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalConfig {
    pub base_url: String,
    pub session_cookie: Option<String>,
    pub max_upload_bytes: u64,
    pub toast_ttl: Duration,
    pub timeouts: HttpTimeouts,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            session_cookie: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            toast_ttl: Duration::from_secs(DEFAULT_TOAST_SECS),
            timeouts: HttpTimeouts::default(),
        }
    }
}

impl PortalConfig {
    /// Build typed portal config from environment variables.
    ///
    /// Optional:
    /// - `PORTAL_BASE_URL`: server origin, default `http://127.0.0.1:8080`
    /// - `PORTAL_SESSION_COOKIE`: sent as the `Cookie` header
    /// - `PORTAL_MAX_UPLOAD_BYTES`: default 10 MiB
    /// - `PORTAL_TOAST_SECS`: default 4, clamped to 3..=5
    /// - `PORTAL_REQUEST_TIMEOUT_SECS`: default 30
    /// - `PORTAL_CONNECT_TIMEOUT_SECS`: default 10
    #[must_use]
    pub fn from_env() -> Self {
        let base_url = normalize_base_url(
            &std::env::var("PORTAL_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_owned()),
        );
        let session_cookie = std::env::var("PORTAL_SESSION_COOKIE")
            .ok()
            .filter(|v| !v.trim().is_empty());
        let toast_secs = env_parse_u64("PORTAL_TOAST_SECS", DEFAULT_TOAST_SECS).clamp(MIN_TOAST_SECS, MAX_TOAST_SECS);

        Self {
            base_url,
            session_cookie,
            max_upload_bytes: env_parse_u64("PORTAL_MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES),
            toast_ttl: Duration::from_secs(toast_secs),
            timeouts: HttpTimeouts {
                request_secs: env_parse_u64("PORTAL_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
                connect_secs: env_parse_u64("PORTAL_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
            },
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = normalize_base_url(base_url);
        self
    }

    #[must_use]
    pub fn with_session_cookie(mut self, cookie: Option<String>) -> Self {
        if cookie.is_some() {
            self.session_cookie = cookie;
        }
        self
    }
}

#[must_use]
pub fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_owned()
}

fn env_parse_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(default)
}
