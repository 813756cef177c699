use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "roster-sort")]
#[command(about = "Sort submission files into per-submitter folders", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Match, place and convert every file in the input directory
    Organize(OrganizeArgs),
    /// Show which roster record a filename would be assigned to
    Match {
        /// Filename to match (no filesystem access)
        filename: String,
        /// Roster CSV; defaults to the configured roster
        #[arg(long)]
        roster: Option<PathBuf>,
    },
    /// Report whether the converter and unrar are available
    CheckTools,
    /// Print configuration values
    PrintConfig,
}

#[derive(Debug, Args)]
pub struct OrganizeArgs {
    /// Directory of submission files
    #[arg(long)]
    pub input: Option<PathBuf>,
    /// Output root for submitter folders
    #[arg(long)]
    pub output: Option<PathBuf>,
    /// Roster CSV with surname/first_name columns
    #[arg(long)]
    pub roster: Option<PathBuf>,
    /// Append a CSV manifest of placements here
    #[arg(long)]
    pub manifest: Option<PathBuf>,
    /// Skip the document conversion pass
    #[arg(long)]
    pub no_convert: bool,
    /// Match and report only; do not copy, extract or convert
    #[arg(long)]
    pub dry_run: bool,
}
