//! App details commands

use clap::{Args, Subcommand};
use std::path::PathBuf;

use amazon_appstore::AppDetails;

use super::{block_on, read_json, EditArgs};
use crate::cli::{output, Cli};

#[derive(Debug, Args)]
pub struct DetailsCommand {
    #[command(subcommand)]
    pub command: DetailsSubcommand,
}

#[derive(Debug, Subcommand)]
pub enum DetailsSubcommand {
    /// Show the edit's app details
    Get(EditArgs),

    /// Replace app details with the contents of a JSON file
    Update {
        #[command(flatten)]
        edit: EditArgs,

        /// JSON file with the details body
        #[arg(long)]
        file: PathBuf,
    },
}

impl DetailsCommand {
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        block_on(self.run(cli))
    }

    async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let mut client = cli.connect().await?;

        match &self.command {
            DetailsSubcommand::Get(args) => {
                let details = client.get_details(args.app_id(), &args.edit_id).await?;
                output::emit(cli.format, &details, print_details)
            }
            DetailsSubcommand::Update { edit, file } => {
                let body: AppDetails = read_json(file)?;
                client.get_details(edit.app_id(), &edit.edit_id).await?;
                let details = client
                    .update_details(edit.app_id(), &edit.edit_id, &body)
                    .await?;
                output::emit(cli.format, &details, |_| {
                    output::success("Updated app details");
                })
            }
        }
    }
}

fn print_details(details: &AppDetails) {
    println!("{}", output::header("App details"));
    let fields = [
        ("Default language", &details.default_language),
        ("Website", &details.contact_website),
        ("Email", &details.contact_email),
        ("Phone", &details.contact_phone),
    ];
    for (key, value) in fields {
        if let Some(value) = value {
            println!("{}", output::key_value(key, value));
        }
    }
}
