//! Core library entry for the `taskgate` CLI.
//!
//! `taskgate` validates a dependency-gated task plan, tracks per-task status
//! in a transactional store, computes which tasks are ready, and assembles
//! delegation prompts for workers.

pub mod adapters;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod delegate;
pub mod errors;
pub mod logging;
pub mod plan;
pub mod ports;
pub mod readiness;
pub mod status;
pub mod store;
pub mod validate;

use clap::error::ErrorKind;
use clap::Parser;

/// Run the CLI with the provided arguments.
///
/// # Errors
///
/// Returns an error string when argument parsing fails or command execution fails.
pub fn run<I, T>(args: I) -> Result<(), String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = match cli::Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            return err.print().map_err(|e| e.to_string());
        }
        Err(err) => return Err(err.to_string()),
    };
    logging::init_logging(cli.global.log_level);
    commands::dispatch(&cli)
}
