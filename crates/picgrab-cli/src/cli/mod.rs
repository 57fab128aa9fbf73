//! CLI for picgrab.

mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use picgrab_core::config;
use std::path::PathBuf;

use commands::{run_checksum, run_grab_command, run_update};

/// Top-level CLI for picgrab.
#[derive(Debug, Parser)]
#[command(name = "picgrab", version)]
#[command(about = "picgrab: grab the largest version of every image on a page", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

/// Options of `picgrab grab`; unset values come from the config file.
#[derive(Debug, Args, Default, PartialEq, Eq)]
pub struct GrabArgs {
    /// Page URLs to scan for images.
    pub urls: Vec<String>,

    /// Text file with one page URL per line (blank lines ignored).
    #[arg(long, value_name = "FILE")]
    pub list: Option<PathBuf>,

    /// Output directory (default: config `output_dir`, else ./images).
    #[arg(long, short, value_name = "DIR")]
    pub out: Option<PathBuf>,

    /// Comma-separated extension allow-list, e.g. "jpg,png". Empty allows all.
    #[arg(long, value_name = "EXTS")]
    pub allow: Option<String>,

    /// Skip images smaller than N bytes.
    #[arg(long, value_name = "N")]
    pub min_bytes: Option<u64>,

    /// Also save inline data: images.
    #[arg(long)]
    pub accept_data_urls: bool,

    /// Do not derive the Referer from the page's host.
    #[arg(long)]
    pub no_auto_referer: bool,

    /// Explicit Referer for every image request.
    #[arg(long, value_name = "URL")]
    pub referer: Option<String>,

    /// Number of parallel downloads (1-32).
    #[arg(long, short, value_name = "N")]
    pub workers: Option<usize>,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download the images referenced by one or more pages.
    Grab(GrabArgs),

    /// Check for a newer release and install it.
    Update {
        /// Only report whether an update is available.
        #[arg(long)]
        check_only: bool,
    },

    /// Compute SHA-256 of a file.
    Checksum {
        /// Path to the file.
        path: PathBuf,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Grab(args) => run_grab_command(&cfg, args).await?,
            CliCommand::Update { check_only } => run_update(&cfg, check_only).await?,
            CliCommand::Checksum { path } => run_checksum(&path).await?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
