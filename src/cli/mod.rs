//! Command-line interface definitions for the `carina` binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page.

use clap::Parser;

/// Top-level CLI for the `carina` binary.
#[derive(Debug, Parser)]
#[command(
    name = "carina",
    about = "Back up and restore Docker volumes through the carinamarina/backup image",
    arg_required_else_help = true
)]
pub(crate) enum Cli {
    /// Archive a directory from another container's volumes.
    #[command(
        name = "backup",
        about = "Archive a directory from another container's volumes"
    )]
    Backup(BackupCommand),
    /// Unpack an archive into another container's volumes.
    #[command(
        name = "restore",
        about = "Unpack an archive into another container's volumes"
    )]
    Restore(RestoreCommand),
}

/// Arguments for the `carina backup` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct BackupCommand {
    /// Container whose volumes are mounted into the work container.
    #[arg(long, value_name = "CONTAINER")]
    pub(crate) volumes_from: String,
    /// Directory inside the mounted volumes to archive.
    ///
    /// Required by the backup image; validated when the task runs so a
    /// missing value is reported alongside the other task requirements.
    #[arg(long, value_name = "PATH")]
    pub(crate) source: Option<String>,
    /// File the archive is streamed to instead of a Cloud Files upload.
    #[arg(long, value_name = "FILE")]
    pub(crate) stdout: Option<String>,
    /// Cloud Files container that receives the archive.
    #[arg(long, value_name = "NAME")]
    pub(crate) container: Option<String>,
    /// Compress the archive with gzip.
    #[arg(long)]
    pub(crate) zip: bool,
    /// Extra image option as NAME or NAME=VALUE; may repeat. Later
    /// entries override earlier ones of the same name.
    #[arg(long = "option", value_name = "NAME[=VALUE]")]
    pub(crate) options: Vec<String>,
}

/// Arguments for the `carina restore` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct RestoreCommand {
    /// Container whose volumes are mounted into the work container.
    #[arg(long, value_name = "CONTAINER")]
    pub(crate) volumes_from: String,
    /// Directory inside the mounted volumes that receives the archive
    /// contents.
    #[arg(long, value_name = "PATH")]
    pub(crate) destination: Option<String>,
    /// File the archive is read from instead of a Cloud Files download.
    #[arg(long, value_name = "FILE")]
    pub(crate) stdin: Option<String>,
    /// Cloud Files container holding the archive.
    #[arg(long, value_name = "NAME")]
    pub(crate) container: Option<String>,
    /// Decompress the archive with gzip.
    #[arg(long)]
    pub(crate) zip: bool,
    /// Extra image option as NAME or NAME=VALUE; may repeat. Later
    /// entries override earlier ones of the same name.
    #[arg(long = "option", value_name = "NAME[=VALUE]")]
    pub(crate) options: Vec<String>,
}
