//! Moves a cross's images and cross event to another line.
//!
//! Input rows are `cross_barcode<TAB>line<TAB>new_line`.

use clap::Parser;
use flysync_cli::{finish, print_report, run_main, BarProgress, CommonArgs, InputArgs, Runtime};
use flysync_core::config::Access;
use flysync_core::service::cross_line_service::CrossLineService;
use flysync_core::{DatabaseKind, SqliteRegistryRepository};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(about = "Change the line of crosses in the registry")]
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

    let report = CrossLineService::new(SqliteRegistryRepository::new(&tx)).run(&rows, &progress)?;
    finish(tx, cli.common.write)?;
    print_report(&report);
    Ok(())
}
