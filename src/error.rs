//! Portal error taxonomy.
//!
//! ERROR HANDLING
//! ==============
//! Every failure is terminal at the controller boundary: it is shown to the
//! user as a toast and written to the diagnostic log, never retried.
//! `retryable` only tells the user whether trying again could help.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

pub const NETWORK_ERROR_MESSAGE: &str = "Network error, please retry later";
pub const DECODE_ERROR_MESSAGE: &str = "Unexpected server response";
pub const RENDER_ERROR_MESSAGE: &str = "Failed to display data";

#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    /// A client-side check failed; no request was made.
    #[error("{0}")]
    Validation(String),

    /// The request never reached the server.
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// A success response body did not have the expected shape.
    #[error("response decode failed: {0}")]
    Decode(String),

    /// Building the table view failed.
    #[error("render failed: {0}")]
    Render(String),

    /// A configuration value is unusable.
    #[error("config error: {0}")]
    Config(String),

    /// Local file access failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl PortalError {
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "E_VALIDATION",
            Self::Network(_) => "E_NETWORK",
            Self::Http { .. } => "E_HTTP",
            Self::Decode(_) => "E_DECODE",
            Self::Render(_) => "E_RENDER",
            Self::Config(_) => "E_CONFIG",
            Self::Io(_) => "E_IO",
        }
    }

    #[must_use]
    pub fn retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Http { status: 429 | 500..=599, .. })
    }

    /// HTTP status, when the server produced one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Text shown in the error toast.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(message) | Self::Http { message, .. } | Self::Config(message) => message.clone(),
            Self::Network(_) => NETWORK_ERROR_MESSAGE.to_owned(),
            Self::Decode(_) => DECODE_ERROR_MESSAGE.to_owned(),
            Self::Render(_) => RENDER_ERROR_MESSAGE.to_owned(),
            Self::Io(e) => e.to_string(),
        }
    }
}

impl From<serde_json::Error> for PortalError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}
