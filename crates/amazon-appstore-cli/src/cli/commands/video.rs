//! Listing video commands

use clap::{Args, Subcommand};
use console::style;
use std::path::PathBuf;

use super::{block_on, EditArgs};
use crate::cli::{output, Cli};

#[derive(Debug, Args)]
pub struct VideoCommand {
    #[command(subcommand)]
    pub command: VideoSubcommand,
}

#[derive(Debug, Subcommand)]
pub enum VideoSubcommand {
    /// List a listing's videos
    List(VideoSlot),

    /// Upload a video
    Upload {
        #[command(flatten)]
        slot: VideoSlot,

        /// Path to the video
        #[arg(required = true)]
        path: PathBuf,
    },

    /// Delete one video
    Delete {
        #[command(flatten)]
        slot: VideoSlot,

        /// Video asset ID
        #[arg(long = "asset")]
        asset_id: String,
    },

    /// Delete every video of a listing
    DeleteAll(VideoSlot),
}

#[derive(Debug, Args)]
pub struct VideoSlot {
    #[command(flatten)]
    pub edit: EditArgs,

    /// Listing language (e.g. en-US)
    #[arg(long, short)]
    pub language: String,
}

impl VideoCommand {
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        block_on(self.run(cli))
    }

    async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let mut client = cli.connect().await?;

        match &self.command {
            VideoSubcommand::List(slot) => {
                let videos = client
                    .list_videos(slot.edit.app_id(), &slot.edit.edit_id, &slot.language)
                    .await?;
                output::emit(cli.format, &videos, |videos| {
                    if videos.is_empty() {
                        output::info(&format!("No videos for {}", slot.language));
                    }
                    for video in videos {
                        println!("  {}", style(&video.id).cyan());
                    }
                })
            }
            VideoSubcommand::Upload { slot, path } => {
                let edit = &slot.edit;
                client
                    .list_videos(edit.app_id(), &edit.edit_id, &slot.language)
                    .await?;
                let video = client
                    .upload_video(edit.app_id(), &edit.edit_id, &slot.language, path)
                    .await?;
                output::emit(cli.format, &video, |video| {
                    output::success(&format!(
                        "Uploaded {} as {}",
                        path.display(),
                        style(&video.id).cyan()
                    ));
                })
            }
            VideoSubcommand::Delete { slot, asset_id } => {
                let edit = &slot.edit;
                client
                    .list_videos(edit.app_id(), &edit.edit_id, &slot.language)
                    .await?;
                client
                    .delete_video(edit.app_id(), &edit.edit_id, &slot.language, asset_id)
                    .await?;
                output::done(cli.format, &format!("Deleted video {}", asset_id))
            }
            VideoSubcommand::DeleteAll(slot) => {
                let edit = &slot.edit;
                client
                    .list_videos(edit.app_id(), &edit.edit_id, &slot.language)
                    .await?;
                client
                    .delete_videos(edit.app_id(), &edit.edit_id, &slot.language)
                    .await?;
                output::done(cli.format, &format!("Deleted all videos for {}", slot.language))
            }
        }
    }
}
