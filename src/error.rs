//! Error types for Taiga API operations.

use reqwest::Method;
use thiserror::Error;

/// Message used when the transport fails before any response arrives.
pub(crate) const NETWORK_ERROR: &str = "Network error!";

/// Errors that can occur during Taiga API operations.
#[derive(Debug, Error)]
pub enum TaigaError {
    /// The server rejected the request, or the request never reached it.
    ///
    /// Connection failures are reported here too, with status 400 and a
    /// fixed "Network error!" message.
    #[error("{message}")]
    Rest {
        /// Fully resolved request URL.
        uri: String,
        /// HTTP status code (400 for transport failures).
        status_code: u16,
        /// HTTP method of the failed request.
        method: Method,
        /// Raw response body, empty for transport failures.
        body: String,
        /// Best-effort human readable message.
        message: String,
    },

    /// The call was rejected locally before touching the network.
    #[error("{0}")]
    Usage(String),

    /// Configuration is missing or incomplete.
    #[error("Taiga configuration required: {0}")]
    ConfigMissing(String),

    /// The server answered with a body of an unexpected shape.
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    /// HTTP client construction failed.
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("Failed to parse response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),
}

impl TaigaError {
    /// Build a REST error from a failed response, extracting the message
    /// from the `_error_message` envelope when there is one.
    pub(crate) fn rest(uri: &str, status_code: u16, body: String, method: Method) -> Self {
        let message = extract_error_message(uri, status_code, &body);
        Self::Rest {
            uri: uri.to_string(),
            status_code,
            method,
            body,
            message,
        }
    }

    /// Build the error reported for a connection-level failure.
    pub(crate) fn network(uri: &str, method: Method) -> Self {
        Self::Rest {
            uri: uri.to_string(),
            status_code: 400,
            method,
            body: String::new(),
            message: NETWORK_ERROR.to_string(),
        }
    }

    /// HTTP status code, if this error came from a request.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Rest { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }

    /// Returns true if the server answered 404.
    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }
}

fn extract_error_message(uri: &str, status_code: u16, body: &str) -> String {
    if body.is_empty() {
        return format!("Status: {status_code} on URI: {uri}");
    }

    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(msg) = json.get("_error_message").and_then(|m| m.as_str()) {
            return msg.to_string();
        }
    }

    body.to_string()
}

/// Result type alias for Taiga operations.
pub type Result<T> = core::result::Result<T, TaigaError>;
