//! Credential check command

use clap::{Args, Subcommand};

use super::block_on;
use crate::cli::{output, Cli, OutputFormat};

#[derive(Debug, Args)]
pub struct AuthCommand {
    #[command(subcommand)]
    pub command: AuthSubcommand,
}

#[derive(Debug, Subcommand)]
pub enum AuthSubcommand {
    /// Exchange the configured credentials for a token
    Check,
}

impl AuthCommand {
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        match self.command {
            AuthSubcommand::Check => block_on(check(cli)),
        }
    }
}

async fn check(cli: &Cli) -> anyhow::Result<()> {
    let client = cli.connect().await?;
    let Some(credentials) = client.auth().credentials() else {
        anyhow::bail!("no credentials after authentication");
    };
    let expires_at = client
        .auth()
        .issued_at()
        .and_then(|issued| credentials.expires_at(issued))
        .map(|expires_at| expires_at.to_rfc3339());

    match cli.format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "authenticated": true,
                "token_type": credentials.token_type,
                "scope": credentials.scope,
                "expires_at": expires_at,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => {
            output::success("Credentials accepted");
            println!("{}", output::key_value("Scope", &credentials.scope));
            if let Some(expires_at) = &expires_at {
                println!("{}", output::key_value("Expires", expires_at));
            }
        }
    }
    Ok(())
}
