//! CLI argument definitions using clap
//!
//! Commands:
//! - aerotrail history --item-type <type> --item-id <id>
//! - aerotrail at --item-type <type> --item-id <id> --time <rfc3339>
//! - aerotrail verify
//!
//! Every command reads the version log given by `--log`, or the
//! `log_path` of the configuration file.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// aerotrail - inspect an append-only version log
#[derive(Parser, Debug)]
#[command(name = "aerotrail")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the version log (overrides the configuration file)
    #[arg(long, global = true)]
    pub log: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print every version of one item, oldest first
    History {
        #[arg(long)]
        item_type: String,

        #[arg(long)]
        item_id: String,
    },

    /// Print the state of one item at a point in time
    At {
        #[arg(long)]
        item_type: String,

        #[arg(long)]
        item_id: String,

        /// RFC 3339 timestamp, e.g. 2024-05-01T12:00:00Z
        #[arg(long)]
        time: String,
    },

    /// Check every line of the version log
    Verify,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
