//! APK device targeting commands

use clap::{Args, Subcommand};
use std::path::PathBuf;

use amazon_appstore::Targeting;

use super::apk::ApkArgs;
use super::{block_on, read_json};
use crate::cli::{output, Cli};

#[derive(Debug, Args)]
pub struct TargetingCommand {
    #[command(subcommand)]
    pub command: TargetingSubcommand,
}

#[derive(Debug, Subcommand)]
pub enum TargetingSubcommand {
    /// Show an APK's device targeting
    Get(ApkArgs),

    /// Replace an APK's targeting with the contents of a JSON file
    Update {
        #[command(flatten)]
        target: ApkArgs,

        /// JSON file with the targeting body
        #[arg(long)]
        file: PathBuf,
    },
}

impl TargetingCommand {
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        block_on(self.run(cli))
    }

    async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let mut client = cli.connect().await?;

        match &self.command {
            TargetingSubcommand::Get(args) => {
                let targeting = client
                    .get_targeting(args.edit.app_id(), &args.edit.edit_id, &args.apk_id)
                    .await?;
                output::emit(cli.format, &targeting, |targeting| output::pretty(targeting))
            }
            TargetingSubcommand::Update { target, file } => {
                let body: Targeting = read_json(file)?;
                let edit = &target.edit;
                client
                    .get_targeting(edit.app_id(), &edit.edit_id, &target.apk_id)
                    .await?;
                let targeting = client
                    .update_targeting(edit.app_id(), &edit.edit_id, &target.apk_id, &body)
                    .await?;
                output::emit(cli.format, &targeting, |_| {
                    output::success(&format!("Updated targeting of APK {}", target.apk_id));
                })
            }
        }
    }
}
