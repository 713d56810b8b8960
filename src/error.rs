//! # Error Types
//!
//! Custom error types for the telemetry poller using `thiserror`.

use thiserror::Error;

/// Main error type for the telemetry poller
#[derive(Debug, Error)]
pub enum PollerError {
    /// Network-level failure (connection refused, timeout, DNS)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Response body could not be decoded
    #[error("Malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Backend answered with a non-success status
    #[error("Backend returned HTTP {status}{}", reason_suffix(.reason))]
    Status { status: u16, reason: Option<String> },

    /// Backend rejected the session (HTTP 401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Backend reported, in a JSON error field, that the session is gone
    #[error("Session expired: {0}")]
    SessionExpired(String),

    /// Base URL or session id cannot form a request URL
    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn reason_suffix(reason: &Option<String>) -> String {
    match reason {
        Some(r) => format!(": {}", r),
        None => String::new(),
    }
}

impl PollerError {
    /// Classify a non-success response.
    ///
    /// `structured` is the reason the backend put in a JSON error field,
    /// `raw` the trimmed body otherwise. Only a structured reason can mark
    /// the session as expired; raw bodies (proxy or HTML error pages) are
    /// kept for display only.
    pub fn from_response(status: u16, structured: Option<String>, raw: Option<String>) -> Self {
        if status == 401 {
            return PollerError::Unauthorized(
                structured.or(raw).unwrap_or_else(|| "HTTP 401".to_string()),
            );
        }

        match structured {
            Some(reason) if mentions_session_expiry(&reason) => PollerError::SessionExpired(reason),
            structured => PollerError::Status {
                status,
                reason: structured.or(raw),
            },
        }
    }

    /// Whether this error means the user has to sign in again.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            PollerError::Unauthorized(_)
                | PollerError::SessionExpired(_)
                | PollerError::Status { status: 401, .. }
        )
    }
}

/// Returns true if a backend message is about the session being gone.
pub fn mentions_session_expiry(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("session")
        && (lower.contains("expire") || lower.contains("expiré") || lower.contains("invalid"))
}

/// Result type alias for the telemetry poller
pub type Result<T> = std::result::Result<T, PollerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_status_is_auth_failure() {
        let err = PollerError::Status { status: 401, reason: None };
        assert!(err.is_auth_failure());
    }

    #[test]
    fn test_unauthorized_variant_is_auth_failure() {
        assert!(PollerError::Unauthorized("token".to_string()).is_auth_failure());
    }

    #[test]
    fn test_session_expired_reason_is_auth_failure() {
        let err = PollerError::from_response(403, Some("Session expired, please log in".to_string()), None);
        assert!(matches!(err, PollerError::SessionExpired(_)));
        assert!(err.is_auth_failure());
    }

    #[test]
    fn test_french_session_reason_is_auth_failure() {
        let err = PollerError::from_response(400, Some("Session expirée".to_string()), None);
        assert!(err.is_auth_failure());
    }

    #[test]
    fn test_raw_body_never_expires_session() {
        let page = "<html><body>Invalid session cookie</body></html>".to_string();
        let err = PollerError::from_response(502, None, Some(page.clone()));
        assert!(!err.is_auth_failure());
        assert!(matches!(err, PollerError::Status { status: 502, reason: Some(ref r) } if *r == page));
    }

    #[test]
    fn test_from_response_401() {
        let err = PollerError::from_response(401, None, Some("Unauthorized".to_string()));
        assert!(matches!(err, PollerError::Unauthorized(ref r) if r == "Unauthorized"));

        let err = PollerError::from_response(401, None, None);
        assert!(matches!(err, PollerError::Unauthorized(ref r) if r == "HTTP 401"));
    }

    #[test]
    fn test_generic_status_is_not_auth_failure() {
        let err = PollerError::from_response(503, Some("collect unavailable: TimeoutError".to_string()), None);
        assert!(matches!(err, PollerError::Status { status: 503, .. }));
        assert!(!err.is_auth_failure());
    }

    #[test]
    fn test_session_not_found_is_not_auth_failure() {
        assert!(!mentions_session_expiry("session not found"));
    }

    #[test]
    fn test_transport_is_not_auth_failure() {
        assert!(!PollerError::Transport("connection refused".to_string()).is_auth_failure());
    }

    #[test]
    fn test_status_display_includes_reason() {
        let err = PollerError::Status { status: 404, reason: Some("session not found".to_string()) };
        assert_eq!(err.to_string(), "Backend returned HTTP 404: session not found");

        let err = PollerError::Status { status: 500, reason: None };
        assert_eq!(err.to_string(), "Backend returned HTTP 500");
    }
}
