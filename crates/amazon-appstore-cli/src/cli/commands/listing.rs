//! Store listing commands

use clap::{Args, Subcommand};
use console::style;
use std::path::PathBuf;

use amazon_appstore::Listing;

use super::{block_on, read_json, EditArgs};
use crate::cli::{output, Cli};

#[derive(Debug, Args)]
pub struct ListingCommand {
    #[command(subcommand)]
    pub command: ListingSubcommand,
}

#[derive(Debug, Subcommand)]
pub enum ListingSubcommand {
    /// List every language's listing
    List(EditArgs),

    /// Show one language's listing
    Get(LanguageArgs),

    /// Replace a listing with the contents of a JSON file
    Update(UpdateListingArgs),

    /// Remove a language's listing
    Delete(LanguageArgs),
}

#[derive(Debug, Args)]
pub struct LanguageArgs {
    #[command(flatten)]
    pub edit: EditArgs,

    /// Listing language (e.g. en-US)
    #[arg(long, short)]
    pub language: String,
}

#[derive(Debug, Args)]
pub struct UpdateListingArgs {
    #[command(flatten)]
    pub target: LanguageArgs,

    /// JSON file with the listing body
    #[arg(long)]
    pub file: PathBuf,
}

impl ListingCommand {
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        block_on(self.run(cli))
    }

    async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let mut client = cli.connect().await?;

        match &self.command {
            ListingSubcommand::List(args) => {
                let listings = client.get_listings(args.app_id(), &args.edit_id).await?;
                output::emit(cli.format, &listings, |listings| {
                    for (language, listing) in listings {
                        println!(
                            "  {} {}",
                            style(language).cyan(),
                            listing.title.as_deref().unwrap_or("")
                        );
                    }
                })
            }
            ListingSubcommand::Get(args) => {
                let listing = client
                    .get_listing(args.edit.app_id(), &args.edit.edit_id, &args.language)
                    .await?;
                output::emit(cli.format, &listing, print_listing)
            }
            ListingSubcommand::Update(args) => {
                let body: Listing = read_json(&args.file)?;
                let target = &args.target;
                client
                    .get_listing(target.edit.app_id(), &target.edit.edit_id, &target.language)
                    .await?;
                let listing = client
                    .update_listing(
                        target.edit.app_id(),
                        &target.edit.edit_id,
                        &target.language,
                        &body,
                    )
                    .await?;
                output::emit(cli.format, &listing, |_| {
                    output::success(&format!("Updated {} listing", target.language));
                })
            }
            ListingSubcommand::Delete(args) => {
                client
                    .get_listing(args.edit.app_id(), &args.edit.edit_id, &args.language)
                    .await?;
                client
                    .delete_listing(args.edit.app_id(), &args.edit.edit_id, &args.language)
                    .await?;
                output::done(cli.format, &format!("Deleted {} listing", args.language))
            }
        }
    }
}

fn print_listing(listing: &Listing) {
    println!("{}", output::header("Listing"));
    let fields = [
        ("Language", &listing.language),
        ("Title", &listing.title),
        ("Short description", &listing.short_description),
        ("Recent changes", &listing.recent_changes),
    ];
    for (key, value) in fields {
        if let Some(value) = value {
            println!("{}", output::key_value(key, value));
        }
    }
    if !listing.keywords.is_empty() {
        println!("{}", output::key_value("Keywords", &listing.keywords.join(", ")));
    }
}
