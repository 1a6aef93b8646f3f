//! Deletes registry lines, or renames them when a new name is given.
//!
//! Input rows are `line` or `line<TAB>new_line`.

use clap::Parser;
use flysync_cli::{finish, print_report, run_main, BarProgress, CommonArgs, InputArgs, Runtime};
use flysync_core::config::Access;
use flysync_core::service::line_cleanup_service::LineCleanupService;
use flysync_core::{DatabaseKind, SqliteRegistryRepository};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(about = "Delete or rename lines in the registry")]
struct Cli {
    #[command(flatten)]
    input: InputArgs,
    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    run_main(|| run(&cli))
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let runtime = Runtime::init(&cli.common)?;
    let rows = cli.input.read_rows()?;
    let settings = runtime.settings();
    let mut conn = runtime.open_database(&settings, DatabaseKind::Registry, Access::Write)?;
    let tx = conn.transaction()?;
    let progress = BarProgress::new(!cli.common.debug);

    let report = LineCleanupService::new(SqliteRegistryRepository::new(&tx)).run(&rows, &progress)?;
    finish(tx, cli.common.write)?;
    print_report(&report);
    Ok(())
}
