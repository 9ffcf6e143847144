//! Listing image commands

use clap::{Args, Subcommand};
use console::style;
use std::path::PathBuf;

use amazon_appstore::ImageType;

use super::{block_on, EditArgs};
use crate::cli::{output, Cli};

#[derive(Debug, Args)]
pub struct ImageCommand {
    #[command(subcommand)]
    pub command: ImageSubcommand,
}

#[derive(Debug, Subcommand)]
pub enum ImageSubcommand {
    /// List images of one type
    List(ImageSlot),

    /// Upload an image
    Upload {
        #[command(flatten)]
        slot: ImageSlot,

        /// Path to the image
        #[arg(required = true)]
        path: PathBuf,
    },

    /// Delete one image
    Delete {
        #[command(flatten)]
        slot: ImageSlot,

        /// Image asset ID
        #[arg(long = "asset")]
        asset_id: String,
    },

    /// Delete every image of one type
    DeleteAll(ImageSlot),
}

/// Edit, language and image type
#[derive(Debug, Args)]
pub struct ImageSlot {
    #[command(flatten)]
    pub edit: EditArgs,

    /// Listing language (e.g. en-US)
    #[arg(long, short)]
    pub language: String,

    /// Image type (small-icons, large-icons, screenshots, promo-images, firetv-*)
    #[arg(long = "type", value_parser = parse_image_type)]
    pub image_type: ImageType,
}

fn parse_image_type(value: &str) -> Result<ImageType, String> {
    value.parse()
}

impl ImageCommand {
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        block_on(self.run(cli))
    }

    async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let mut client = cli.connect().await?;

        match &self.command {
            ImageSubcommand::List(slot) => {
                let images = client
                    .list_images(
                        slot.edit.app_id(),
                        &slot.edit.edit_id,
                        &slot.language,
                        slot.image_type,
                    )
                    .await?;
                output::emit(cli.format, &images, |images| {
                    if images.is_empty() {
                        output::info(&format!("No {} for {}", slot.image_type, slot.language));
                    }
                    for image in images {
                        println!("  {}", style(&image.id).cyan());
                    }
                })
            }
            ImageSubcommand::Upload { slot, path } => {
                let edit = &slot.edit;
                client
                    .list_images(edit.app_id(), &edit.edit_id, &slot.language, slot.image_type)
                    .await?;
                let image = client
                    .upload_image(
                        edit.app_id(),
                        &edit.edit_id,
                        &slot.language,
                        slot.image_type,
                        path,
                    )
                    .await?;
                output::emit(cli.format, &image, |image| {
                    output::success(&format!(
                        "Uploaded {} as {}",
                        path.display(),
                        style(&image.id).cyan()
                    ));
                })
            }
            ImageSubcommand::Delete { slot, asset_id } => {
                let edit = &slot.edit;
                client
                    .list_images(edit.app_id(), &edit.edit_id, &slot.language, slot.image_type)
                    .await?;
                client
                    .delete_image(
                        edit.app_id(),
                        &edit.edit_id,
                        &slot.language,
                        slot.image_type,
                        asset_id,
                    )
                    .await?;
                output::done(cli.format, &format!("Deleted image {}", asset_id))
            }
            ImageSubcommand::DeleteAll(slot) => {
                let edit = &slot.edit;
                client
                    .list_images(edit.app_id(), &edit.edit_id, &slot.language, slot.image_type)
                    .await?;
                client
                    .delete_images(edit.app_id(), &edit.edit_id, &slot.language, slot.image_type)
                    .await?;
                output::done(
                    cli.format,
                    &format!("Deleted all {} for {}", slot.image_type, slot.language),
                )
            }
        }
    }
}
