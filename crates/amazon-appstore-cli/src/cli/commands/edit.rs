//! Edit lifecycle commands

use clap::{Args, Subcommand};
use console::style;

use amazon_appstore::Edit;

use super::{block_on, AppArgs, EditArgs};
use crate::cli::{output, Cli};

#[derive(Debug, Args)]
pub struct EditCommand {
    #[command(subcommand)]
    pub command: EditSubcommand,
}

#[derive(Debug, Subcommand)]
pub enum EditSubcommand {
    /// Open a new edit
    Create(AppArgs),

    /// Show the app's open edit, if any
    Active(AppArgs),

    /// Show one edit
    Get(EditArgs),

    /// Discard an edit
    Delete(EditArgs),

    /// Validate an edit without committing it
    Validate(EditArgs),

    /// Submit an edit for review
    Commit(EditArgs),
}

impl EditCommand {
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        block_on(self.run(cli))
    }

    async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let mut client = cli.connect().await?;

        match &self.command {
            EditSubcommand::Create(args) => {
                let edit = client.create_edit(&args.app_id).await?;
                output::emit(cli.format, &edit, |edit| {
                    output::success(&format!("Created edit {}", style(&edit.id).cyan()));
                })
            }
            EditSubcommand::Active(args) => match client.get_active_edit(&args.app_id).await? {
                Some(edit) => output::emit(cli.format, &edit, print_edit),
                None => output::emit(cli.format, &serde_json::Value::Null, |_| {
                    output::info("No open edit");
                }),
            },
            EditSubcommand::Get(args) => {
                let edit = client.get_edit(args.app_id(), &args.edit_id).await?;
                output::emit(cli.format, &edit, print_edit)
            }
            EditSubcommand::Delete(args) => {
                client.get_edit(args.app_id(), &args.edit_id).await?;
                client.delete_edit(args.app_id(), &args.edit_id).await?;
                output::done(cli.format, &format!("Deleted edit {}", args.edit_id))
            }
            EditSubcommand::Validate(args) => {
                client.get_edit(args.app_id(), &args.edit_id).await?;
                let edit = client.validate_edit(args.app_id(), &args.edit_id).await?;
                output::emit(cli.format, &edit, |edit| {
                    output::success(&format!("Edit {} is valid", style(&edit.id).cyan()));
                })
            }
            EditSubcommand::Commit(args) => {
                client.get_edit(args.app_id(), &args.edit_id).await?;
                let edit = client.commit_edit(args.app_id(), &args.edit_id).await?;
                output::emit(cli.format, &edit, |edit| {
                    output::success(&format!("Committed edit {}", style(&edit.id).cyan()));
                })
            }
        }
    }
}

fn print_edit(edit: &Edit) {
    println!("{}", output::header("Edit"));
    println!("{}", output::key_value("ID", &edit.id));
    if let Some(status) = &edit.status {
        println!("{}", output::key_value("Status", status));
    }
}
