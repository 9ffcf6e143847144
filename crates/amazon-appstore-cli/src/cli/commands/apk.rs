//! APK commands

use clap::{Args, Subcommand};
use console::style;
use std::path::PathBuf;

use amazon_appstore::Apk;

use super::{block_on, EditArgs};
use crate::cli::{output, Cli, OutputFormat};

#[derive(Debug, Args)]
pub struct ApkCommand {
    #[command(subcommand)]
    pub command: ApkSubcommand,
}

#[derive(Debug, Subcommand)]
pub enum ApkSubcommand {
    /// List the edit's APKs
    List(EditArgs),

    /// Show one APK
    Get(ApkArgs),

    /// Upload a new APK
    Upload(UploadArgs),

    /// Replace an APK's binary, keeping its targeting
    Replace {
        #[command(flatten)]
        target: ApkArgs,

        /// Path to the replacement APK
        #[arg(required = true)]
        artifact: PathBuf,
    },

    /// Remove an APK from the edit
    Delete(ApkArgs),

    /// Stage a large APK; prints the file ID to pass to `attach`
    UploadLarge(UploadArgs),

    /// Attach a staged large APK to the edit
    Attach {
        #[command(flatten)]
        edit: EditArgs,

        /// File ID returned by `upload-large`
        #[arg(long)]
        file_id: String,
    },
}

#[derive(Debug, Args)]
pub struct ApkArgs {
    #[command(flatten)]
    pub edit: EditArgs,

    /// APK ID
    #[arg(long = "apk")]
    pub apk_id: String,
}

#[derive(Debug, Args)]
pub struct UploadArgs {
    #[command(flatten)]
    pub edit: EditArgs,

    /// Path to the APK
    #[arg(required = true)]
    pub artifact: PathBuf,
}

impl ApkCommand {
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        block_on(self.run(cli))
    }

    async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let mut client = cli.connect().await?;

        match &self.command {
            ApkSubcommand::List(args) => {
                let apks = client.list_apks(args.app_id(), &args.edit_id).await?;
                output::emit(cli.format, &apks, |apks| {
                    if apks.is_empty() {
                        output::info("No APKs in this edit");
                    }
                    for apk in apks {
                        print_apk_line(apk);
                    }
                })
            }
            ApkSubcommand::Get(args) => {
                let apk = client
                    .get_apk(args.edit.app_id(), &args.edit.edit_id, &args.apk_id)
                    .await?;
                output::emit(cli.format, &apk, print_apk_line)
            }
            ApkSubcommand::Upload(args) => {
                // Refresh the edit ETag; the upload is a write to the edit.
                client.get_edit(args.edit.app_id(), &args.edit.edit_id).await?;
                if cli.format == OutputFormat::Text {
                    output::info(&format!("Uploading {}", style(args.artifact.display()).cyan()));
                }
                let apk = client
                    .upload_apk(args.edit.app_id(), &args.edit.edit_id, &args.artifact)
                    .await?;
                output::emit(cli.format, &apk, |apk| {
                    output::success(&format!("Uploaded APK {}", style(&apk.id).cyan()));
                })
            }
            ApkSubcommand::Replace { target, artifact } => {
                let edit = &target.edit;
                client
                    .get_apk(edit.app_id(), &edit.edit_id, &target.apk_id)
                    .await?;
                let apk = client
                    .replace_apk(edit.app_id(), &edit.edit_id, &target.apk_id, artifact)
                    .await?;
                output::emit(cli.format, &apk, |apk| {
                    output::success(&format!("Replaced APK {}", style(&apk.id).cyan()));
                })
            }
            ApkSubcommand::Delete(args) => {
                let edit = &args.edit;
                client
                    .get_apk(edit.app_id(), &edit.edit_id, &args.apk_id)
                    .await?;
                client
                    .delete_apk(edit.app_id(), &edit.edit_id, &args.apk_id)
                    .await?;
                output::done(cli.format, &format!("Deleted APK {}", args.apk_id))
            }
            ApkSubcommand::UploadLarge(args) => {
                client.get_edit(args.edit.app_id(), &args.edit.edit_id).await?;
                let file_id = client
                    .upload_large_apk(args.edit.app_id(), &args.edit.edit_id, &args.artifact)
                    .await?;
                let staged = serde_json::json!({ "fileId": file_id });
                output::emit(cli.format, &staged, |_| {
                    output::success(&format!("Staged {}", style(args.artifact.display()).cyan()));
                    println!("{}", output::key_value("File ID", &file_id));
                })
            }
            ApkSubcommand::Attach { edit, file_id } => {
                client.get_edit(edit.app_id(), &edit.edit_id).await?;
                let apk = client
                    .attach_apk(edit.app_id(), &edit.edit_id, file_id)
                    .await?;
                output::emit(cli.format, &apk, |apk| {
                    output::success(&format!("Attached APK {}", style(&apk.id).cyan()));
                })
            }
        }
    }
}

fn print_apk_line(apk: &Apk) {
    let version = apk
        .version_code
        .map(|code| format!("versionCode {}", code))
        .unwrap_or_default();
    println!(
        "  {} {} {}",
        style(&apk.id).cyan(),
        apk.name.as_deref().unwrap_or(""),
        style(version).dim()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_parse_attach() {
        let cli = Cli::try_parse_from([
            "appstore", "apk", "attach", "--app-id", "A", "--edit", "E", "--file-id", "F1",
        ])
        .unwrap();

        let crate::cli::Commands::Apk(cmd) = cli.command else {
            panic!("expected apk command");
        };
        match cmd.command {
            ApkSubcommand::Attach { edit, file_id } => {
                assert_eq!(edit.app_id(), "A");
                assert_eq!(edit.edit_id, "E");
                assert_eq!(file_id, "F1");
            }
            other => panic!("unexpected subcommand: {:?}", other),
        }
    }

    #[test]
    fn test_upload_requires_artifact() {
        let result =
            Cli::try_parse_from(["appstore", "apk", "upload", "--app-id", "A", "--edit", "E"]);
        assert!(result.is_err());
    }
}
