//! Corrects stock rack IDs to the majority rack of their tray quadrant.

use clap::Parser;
use flysync_cli::{finish, print_report, run_main, BarProgress, CommonArgs, Runtime};
use flysync_core::config::Access;
use flysync_core::service::rack_service::RackService;
use flysync_core::{DatabaseKind, SqliteStockRepository};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(about = "Fix rack IDs in FlyBoy")]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    run_main(|| run(&cli))
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let runtime = Runtime::init(&cli.common)?;
    let settings = runtime.settings();
    let mut conn = runtime.open_database(&settings, DatabaseKind::Stock, Access::Write)?;
    let tx = conn.transaction()?;
    let progress = BarProgress::new(!cli.common.debug);

    let today = chrono::Local::now().date_naive();
    let report = RackService::new(SqliteStockRepository::new(&tx)).run(today, &progress)?;
    finish(tx, cli.common.write)?;
    print_report(&report);
    Ok(())
}
