//! Availability commands

use clap::{Args, Subcommand};
use std::path::PathBuf;

use amazon_appstore::Availability;

use super::{block_on, read_json, EditArgs};
use crate::cli::{output, Cli};

#[derive(Debug, Args)]
pub struct AvailabilityCommand {
    #[command(subcommand)]
    pub command: AvailabilitySubcommand,
}

#[derive(Debug, Subcommand)]
pub enum AvailabilitySubcommand {
    /// Show the edit's publishing availability
    Get(EditArgs),

    /// Replace availability with the contents of a JSON file
    Update {
        #[command(flatten)]
        edit: EditArgs,

        /// JSON file with the availability body
        #[arg(long)]
        file: PathBuf,
    },
}

impl AvailabilityCommand {
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        block_on(self.run(cli))
    }

    async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let mut client = cli.connect().await?;

        match &self.command {
            AvailabilitySubcommand::Get(args) => {
                let availability = client
                    .get_availability(args.app_id(), &args.edit_id)
                    .await?;
                output::emit(cli.format, &availability, print_availability)
            }
            AvailabilitySubcommand::Update { edit, file } => {
                let body: Availability = read_json(file)?;
                client.get_availability(edit.app_id(), &edit.edit_id).await?;
                let availability = client
                    .update_availability(edit.app_id(), &edit.edit_id, &body)
                    .await?;
                output::emit(cli.format, &availability, |_| {
                    output::success("Updated availability");
                })
            }
        }
    }
}

fn print_availability(availability: &Availability) {
    println!("{}", output::header("Availability"));
    match &availability.publishing_date {
        Some(date) => {
            println!("{}", output::key_value("Publishing date", &date.date_time));
            if let Some(zone) = &date.zone_id {
                println!("{}", output::key_value("Time zone", zone));
            }
        }
        None => println!("{}", output::key_value("Publishing date", "as soon as approved")),
    }
}
