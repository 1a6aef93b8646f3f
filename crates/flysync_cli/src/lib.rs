//! Shared wiring for the flysync command-line programs.
//!
//! # Responsibility
//! - Parse the flags every program accepts.
//! - Load configuration, start logging and open databases for a run.
//! - Report the outcome and map fatal errors to a non-zero exit code.

mod args;
mod bootstrap;
mod progress;
mod prompt;

pub use args::{CommonArgs, InputArgs, ReadOnlyArgs};
pub use bootstrap::{Runtime, Settings};
pub use progress::BarProgress;
pub use prompt::select_item;

use flysync_core::logging_status;
use log::error;
use rusqlite::Transaction;
use std::fmt::Display;
use std::process::ExitCode;

/// Runs a program body, logging a fatal error and exiting with status 1.
pub fn run_main(body: impl FnOnce() -> anyhow::Result<()>) -> ExitCode {
    match body() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if logging_status().is_some() {
                error!("{err:#}");
            } else {
                eprintln!("error: {err:#}");
            }
            ExitCode::FAILURE
        }
    }
}

/// Commits the run when `write` is set, otherwise rolls it back.
pub fn finish(tx: Transaction<'_>, write: bool) -> anyhow::Result<bool> {
    let committed = flysync_core::finish_run(tx, write)?;
    if committed {
        println!("Committed DB changes");
    }
    Ok(committed)
}

/// Prints a run summary to stdout.
pub fn print_report(report: &impl Display) {
    print!("{report}");
}
