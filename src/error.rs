//! Error types for talking to the scanner backend.

use thiserror::Error;

/// Errors that can occur while calling the scanner API.
///
/// The `Display` output of each variant is what the user sees, either in
/// place of a view's content (fetch failures) or in the status bar
/// (per-action failures).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The server answered with a non-2xx status.
    ///
    /// `message` is the server's `error` field when present, otherwise
    /// `"Server error {status}"`.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// The server answered 2xx but reported a failure in the body
    /// (`success: false` or an `error` field).
    #[error("API Error: {0}")]
    Rejected(String),

    /// Connection to the backend failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Timeout waiting for response.
    #[error("Request timed out")]
    Timeout,

    /// The body could not be decoded as JSON.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// The body was JSON but not the shape the endpoint promises.
    #[error("Invalid API response format: {0}")]
    Malformed(String),

    /// Any other transport-level failure.
    #[error("Request failed: {0}")]
    Transport(String),
}

impl ApiError {
    /// Build the error for a non-2xx response, using the body's `error`
    /// field when the server supplied one.
    pub fn from_status(status: u16, server_message: Option<String>) -> Self {
        let message = server_message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| format!("Server error {}", status));
        ApiError::Http { status, message }
    }

    /// HTTP status code, if the error came from a non-2xx response.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if err.is_connect() {
            ApiError::Connection(err.to_string())
        } else if err.is_decode() {
            ApiError::Parse(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_uses_server_message() {
        let err = ApiError::from_status(404, Some("Host 10.0.0.9 not found".to_string()));
        assert_eq!(err.to_string(), "Host 10.0.0.9 not found");
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn test_from_status_falls_back_to_generic_message() {
        assert_eq!(ApiError::from_status(500, None).to_string(), "Server error 500");
        assert_eq!(
            ApiError::from_status(502, Some("   ".to_string())).to_string(),
            "Server error 502"
        );
    }

    #[test]
    fn test_non_http_errors_have_no_status() {
        assert!(ApiError::Timeout.status().is_none());
        assert!(ApiError::Malformed("expected array".into()).status().is_none());
    }
}
