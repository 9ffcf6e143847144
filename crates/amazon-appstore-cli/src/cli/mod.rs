//! CLI definition and command handling

pub mod commands;
pub mod output;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use amazon_appstore::{find_config, ApiClient, AppstoreConfig};

use commands::{
    ApkCommand, AuthCommand, AvailabilityCommand, DetailsCommand, EditCommand, ImageCommand,
    ListingCommand, TargetingCommand, VideoCommand,
};

/// appstore - Amazon Appstore submission CLI
#[derive(Debug, Parser)]
#[command(name = "appstore")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to a configuration file (TOML or YAML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for CLI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output
    Json,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Check that the configured credentials are accepted
    Auth(AuthCommand),

    /// Edit lifecycle
    Edit(EditCommand),

    /// Localized store listings
    Listing(ListingCommand),

    /// App details (default language, contact info)
    Details(DetailsCommand),

    /// APK management
    Apk(ApkCommand),

    /// Listing images
    Image(ImageCommand),

    /// Listing videos
    Video(VideoCommand),

    /// Publishing availability
    Availability(AvailabilityCommand),

    /// APK device targeting
    Targeting(TargetingCommand),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> anyhow::Result<()> {
        match self.command {
            Commands::Auth(ref cmd) => cmd.execute(&self),
            Commands::Edit(ref cmd) => cmd.execute(&self),
            Commands::Listing(ref cmd) => cmd.execute(&self),
            Commands::Details(ref cmd) => cmd.execute(&self),
            Commands::Apk(ref cmd) => cmd.execute(&self),
            Commands::Image(ref cmd) => cmd.execute(&self),
            Commands::Video(ref cmd) => cmd.execute(&self),
            Commands::Availability(ref cmd) => cmd.execute(&self),
            Commands::Targeting(ref cmd) => cmd.execute(&self),
        }
    }

    /// Resolve configuration: explicit file, else a discovered file, else
    /// defaults. Environment variables win over file values.
    pub fn load_config(&self) -> anyhow::Result<AppstoreConfig> {
        let path = match &self.config {
            Some(path) => Some(path.clone()),
            None => find_config(&std::env::current_dir()?),
        };

        let mut config = match path {
            Some(path) => {
                debug!(path = %path.display(), "loading configuration");
                AppstoreConfig::load(&path)
                    .with_context(|| format!("failed to load {}", path.display()))?
            }
            None => AppstoreConfig::default(),
        };
        config.merge_env();

        if self.timeout.is_some() {
            config.timeout_secs = self.timeout;
        }
        Ok(config)
    }

    /// Build a client and authenticate it
    pub async fn connect(&self) -> anyhow::Result<ApiClient> {
        let mut client = ApiClient::new(self.load_config()?)?;
        client.authenticate_if_needed().await?;
        Ok(client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_global_flags() {
        let cli = Cli::try_parse_from([
            "appstore",
            "--format",
            "json",
            "--timeout",
            "30",
            "edit",
            "active",
            "--app-id",
            "amzn1.devportal.mobileapp.1",
        ])
        .unwrap();

        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.timeout, Some(30));
        assert!(matches!(cli.command, Commands::Edit(_)));
    }

    #[test]
    fn test_explicit_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("appstore.toml");
        std::fs::write(
            &path,
            "client_id = \"file-id\"\nclient_secret = \"file-secret\"\ntimeout_secs = 5\n",
        )
        .unwrap();

        let cli = Cli::try_parse_from([
            "appstore",
            "--config",
            path.to_str().unwrap(),
            "--timeout",
            "60",
            "auth",
            "check",
        ])
        .unwrap();
        let config = cli.load_config().unwrap();

        assert_eq!(config.timeout_secs, Some(60));
        assert!(config.client_id.is_some());
    }
}
