//! Exit codes for the CLI

use amazon_appstore::AppstoreError;

/// General error
pub const ERROR: i32 = 1;

/// Configuration error
pub const CONFIG_ERROR: i32 = 2;

/// Authentication error
pub const AUTH_ERROR: i32 = 3;

/// API error (non-success HTTP status)
pub const API_ERROR: i32 = 4;

/// Map a command failure to its exit code
pub fn for_error(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<AppstoreError>() {
        Some(AppstoreError::Configuration(_)) => CONFIG_ERROR,
        Some(AppstoreError::Toml(_)) | Some(AppstoreError::Yaml(_)) => CONFIG_ERROR,
        Some(AppstoreError::Authentication(_)) => AUTH_ERROR,
        Some(AppstoreError::Api { .. }) => API_ERROR,
        _ => ERROR,
    }
}
