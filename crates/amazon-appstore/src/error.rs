//! Error types for Appstore operations

use thiserror::Error;

/// Appstore client errors
#[derive(Debug, Error)]
pub enum AppstoreError {
    /// Client credentials missing or configuration unusable
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Token exchange rejected, or an operation attempted without valid credentials
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Non-success status from the remote API
    #[error("API error: {status} - {body}")]
    Api { status: u16, body: String },

    /// Body cannot be encoded for the requested verb
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL error
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl AppstoreError {
    /// HTTP status carried by an API error
    pub fn status(&self) -> Option<u16> {
        match self {
            AppstoreError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the remote service rejected a write because the ETag was stale
    pub fn is_conflict(&self) -> bool {
        matches!(self.status(), Some(409) | Some(412))
    }

    /// Whether the remote resource does not exist
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub(crate) fn requires_authentication() -> Self {
        AppstoreError::Authentication("requires authentication".to_string())
    }
}

/// Result type for Appstore operations
pub type Result<T> = std::result::Result<T, AppstoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_statuses() {
        let precondition = AppstoreError::Api { status: 412, body: String::new() };
        let conflict = AppstoreError::Api { status: 409, body: String::new() };
        let forbidden = AppstoreError::Api { status: 403, body: "[]".to_string() };

        assert!(precondition.is_conflict());
        assert!(conflict.is_conflict());
        assert!(!forbidden.is_conflict());
        assert_eq!(forbidden.status(), Some(403));
    }

    #[test]
    fn test_non_api_errors_have_no_status() {
        let err = AppstoreError::requires_authentication();
        assert_eq!(err.status(), None);
        assert!(!err.is_not_found());
        assert_eq!(err.to_string(), "Authentication error: requires authentication");
    }
}
