//! CLI commands

mod apk;
mod auth;
mod availability;
mod details;
mod edit;
mod image;
mod listing;
mod targeting;
mod video;

pub use apk::ApkCommand;
pub use auth::AuthCommand;
pub use availability::AvailabilityCommand;
pub use details::DetailsCommand;
pub use edit::EditCommand;
pub use image::ImageCommand;
pub use listing::ListingCommand;
pub use targeting::TargetingCommand;
pub use video::VideoCommand;

use anyhow::Context;
use clap::Args;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::path::Path;

/// App identifier shared by every command
#[derive(Debug, Clone, Args)]
pub struct AppArgs {
    /// Appstore application ID
    #[arg(long, env = "AMAZON_APPSTORE_APP_ID")]
    pub app_id: String,
}

/// App and edit identifiers
#[derive(Debug, Clone, Args)]
pub struct EditArgs {
    #[command(flatten)]
    pub app: AppArgs,

    /// Edit ID
    #[arg(long = "edit", env = "AMAZON_APPSTORE_EDIT_ID")]
    pub edit_id: String,
}

impl EditArgs {
    pub fn app_id(&self) -> &str {
        &self.app.app_id
    }
}

/// Drive one async command on a fresh runtime
fn block_on<F: Future<Output = anyhow::Result<()>>>(future: F) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(future)
}

/// Read a JSON resource body from disk
fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("invalid JSON in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use amazon_appstore::Listing;

    #[test]
    fn test_read_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("listing.json");
        std::fs::write(&path, r#"{"title": "My App", "keywords": ["a"]}"#).unwrap();

        let listing: Listing = read_json(&path).unwrap();
        assert_eq!(listing.title.as_deref(), Some("My App"));
        assert_eq!(listing.keywords, vec!["a"]);
    }

    #[test]
    fn test_read_json_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{").unwrap();

        let err = read_json::<Listing>(&path).unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }
}
