//! Client configuration
//!
//! Configuration can come from a TOML or YAML file, from environment
//! variables, or both. Environment values win over file values.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::error::{AppstoreError, Result};

/// Base URL of the submission API
pub const DEFAULT_API_BASE_URL: &str = "https://developer.amazon.com/api/appstore/";

/// OAuth token endpoint
pub const DEFAULT_TOKEN_URL: &str = "https://api.amazon.com/auth/o2/token";

/// Scope requested for the client-credentials grant
pub const DEFAULT_SCOPE: &str = "appstore::apps:readwrite";

/// Environment variable holding the client ID
pub const ENV_CLIENT_ID: &str = "AMAZON_APPSTORE_CLIENT_ID";
/// Environment variable holding the client secret
pub const ENV_CLIENT_SECRET: &str = "AMAZON_APPSTORE_CLIENT_SECRET";
/// Environment variable overriding the API base URL
pub const ENV_API_URL: &str = "AMAZON_APPSTORE_API_URL";
/// Environment variable overriding the token URL
pub const ENV_TOKEN_URL: &str = "AMAZON_APPSTORE_TOKEN_URL";

/// Configuration file names searched for, in order
pub const CONFIG_FILE_NAMES: &[&str] = &["appstore.toml", "appstore.yaml", "appstore.yml"];

/// Appstore client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppstoreConfig {
    /// OAuth client ID
    pub client_id: Option<String>,

    /// OAuth client secret
    #[serde(skip_serializing)]
    pub client_secret: Option<String>,

    /// Base URL for resource paths
    pub api_base_url: String,

    /// Token endpoint
    pub token_url: String,

    /// Requested OAuth scope
    pub scope: String,

    /// User-Agent sent with every request
    pub user_agent: String,

    /// Request timeout in seconds (none by default)
    pub timeout_secs: Option<u64>,
}

impl Default for AppstoreConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            scope: DEFAULT_SCOPE.to_string(),
            user_agent: default_user_agent(),
            timeout_secs: None,
        }
    }
}

/// Identifying User-Agent string
pub fn default_user_agent() -> String {
    format!("amazon-appstore-rust/{}", env!("CARGO_PKG_VERSION"))
}

impl AppstoreConfig {
    /// Create a config with the given client credentials and default endpoints
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: Some(client_id.into()),
            client_secret: Some(client_secret.into()),
            ..Default::default()
        }
    }

    /// Creates a config from environment variables.
    ///
    /// Looks for:
    /// - `AMAZON_APPSTORE_CLIENT_ID`
    /// - `AMAZON_APPSTORE_CLIENT_SECRET`
    /// - `AMAZON_APPSTORE_API_URL` (optional)
    /// - `AMAZON_APPSTORE_TOKEN_URL` (optional)
    ///
    /// Missing credentials are not an error here; they surface when the
    /// client first authenticates.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.merge_env();
        config
    }

    /// Overlay any environment variables that are set onto this config
    pub fn merge_env(&mut self) {
        if let Ok(value) = std::env::var(ENV_CLIENT_ID) {
            self.client_id = Some(value);
        }
        if let Ok(value) = std::env::var(ENV_CLIENT_SECRET) {
            self.client_secret = Some(value);
        }
        if let Ok(value) = std::env::var(ENV_API_URL) {
            self.api_base_url = value;
        }
        if let Ok(value) = std::env::var(ENV_TOKEN_URL) {
            self.token_url = value;
        }
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        let format = if path.extension().is_some_and(|e| e == "toml") {
            "TOML"
        } else {
            "YAML"
        };
        info!(path = %path.display(), format, "loading config");

        let content = std::fs::read_to_string(path)?;
        let config: Self = if format == "TOML" {
            toml::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };

        config.validate()?;
        debug!(path = %path.display(), "config loaded and validated");
        Ok(config)
    }

    /// Check that configured endpoints are usable URLs
    pub fn validate(&self) -> Result<()> {
        let base = Url::parse(&self.api_base_url)?;
        if base.cannot_be_a_base() {
            return Err(AppstoreError::Configuration(format!(
                "api_base_url cannot be used as a base: {}",
                self.api_base_url
            )));
        }
        Url::parse(&self.token_url)?;
        Ok(())
    }

    /// Parsed API base, always ending in `/` so relative joins keep the path
    pub fn base_url(&self) -> Result<Url> {
        let mut base = self.api_base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        Ok(Url::parse(&base)?)
    }

    /// Request timeout, if one is configured
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Find a configuration file in a directory or its parents.
///
/// At each level both `<dir>/<name>` and `<dir>/.github/<name>` are checked;
/// the first match wins.
pub fn find_config(start_dir: &Path) -> Option<PathBuf> {
    debug!(start_dir = %start_dir.display(), "searching for config file");
    let mut current = start_dir.to_path_buf();

    loop {
        for name in CONFIG_FILE_NAMES {
            let config_path = current.join(name);
            if config_path.exists() {
                info!(path = %config_path.display(), "found config file");
                return Some(config_path);
            }

            let github_path = current.join(".github").join(name);
            if github_path.exists() {
                info!(path = %github_path.display(), "found config file in .github/");
                return Some(github_path);
            }
        }

        if !current.pop() {
            break;
        }
    }

    debug!("no config file found");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = AppstoreConfig::default();
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.token_url, DEFAULT_TOKEN_URL);
        assert_eq!(config.scope, "appstore::apps:readwrite");
        assert!(config.user_agent.starts_with("amazon-appstore-rust/"));
        assert!(config.timeout().is_none());
        assert!(config.client_id.is_none());
    }

    #[test]
    fn test_load_toml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("appstore.toml");
        std::fs::write(
            &path,
            "client_id = \"id\"\nclient_secret = \"secret\"\ntimeout_secs = 30\n",
        )
        .unwrap();

        let config = AppstoreConfig::load(&path).unwrap();
        assert_eq!(config.client_id.as_deref(), Some("id"));
        assert_eq!(config.client_secret.as_deref(), Some("secret"));
        assert_eq!(config.timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.token_url, DEFAULT_TOKEN_URL);
    }

    #[test]
    fn test_load_yaml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("appstore.yaml");
        std::fs::write(&path, "client_id: yaml-id\napi_base_url: http://localhost:9000/api\n")
            .unwrap();

        let config = AppstoreConfig::load(&path).unwrap();
        assert_eq!(config.client_id.as_deref(), Some("yaml-id"));
        assert_eq!(
            config.base_url().unwrap().as_str(),
            "http://localhost:9000/api/"
        );
    }

    #[test]
    fn test_load_rejects_bad_url() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("appstore.toml");
        std::fs::write(&path, "token_url = \"not a url\"\n").unwrap();

        assert!(AppstoreConfig::load(&path).is_err());
    }

    #[test]
    fn test_find_config_in_parent_and_github_dir() {
        let temp = TempDir::new().unwrap();
        let github_dir = temp.path().join(".github");
        std::fs::create_dir_all(&github_dir).unwrap();
        let config_path = github_dir.join("appstore.yml");
        std::fs::write(&config_path, "client_id: x\n").unwrap();

        let nested = temp.path().join("app").join("src");
        std::fs::create_dir_all(&nested).unwrap();

        assert_eq!(find_config(&nested), Some(config_path));
    }

    #[test]
    fn test_secret_not_serialized() {
        let config = AppstoreConfig::new("id", "hunter2");
        let rendered = toml::to_string(&config).unwrap();
        assert!(rendered.contains("client_id"));
        assert!(!rendered.contains("hunter2"));
    }
}
