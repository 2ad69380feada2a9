//! CLI module for aerotrail
//!
//! Provides command-line inspection of a file-backed version log:
//! - history: every version of one item
//! - at: the state of one item at a point in time
//! - verify: checksum and parse every line

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{at, history, run, run_command, verify, Config};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{write_error, write_response};
