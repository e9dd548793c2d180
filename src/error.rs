// Error handling module
// Defines the errors surfaced by the authenticated client

use thiserror::Error;

/// Errors that can occur while issuing an authenticated request
#[derive(Error, Debug)]
pub enum FetchError {
    /// Address or refresh path could not be resolved against the base URL
    #[error("Invalid request address: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Header name or value is not representable on the wire
    #[error("Invalid header: {name}")]
    InvalidHeader { name: String },

    /// Transport failure, or a refresh body that is not JSON
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Refresh endpoint rejected the refresh credential.
    /// Both stored credentials have already been cleared when this is returned.
    #[error("Session expired: refresh rejected with status {status}")]
    SessionExpired { status: u16 },
}

impl FetchError {
    /// True when the host should treat the session as invalidated
    pub fn is_session_expired(&self) -> bool {
        matches!(self, FetchError::SessionExpired { .. })
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, FetchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = FetchError::InvalidHeader {
            name: "authorization".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid header: authorization");

        let err = FetchError::SessionExpired { status: 401 };
        assert_eq!(
            err.to_string(),
            "Session expired: refresh rejected with status 401"
        );
    }

    #[test]
    fn test_invalid_url_from_parse_error() {
        let parse_err = url::Url::parse("not a url").unwrap_err();
        let err: FetchError = parse_err.into();
        assert!(err.to_string().starts_with("Invalid request address:"));
        assert!(!err.is_session_expired());
    }

    #[test]
    fn test_is_session_expired() {
        assert!(FetchError::SessionExpired { status: 403 }.is_session_expired());
        assert!(!FetchError::InvalidHeader {
            name: "x".to_string()
        }
        .is_session_expired());
    }
}
