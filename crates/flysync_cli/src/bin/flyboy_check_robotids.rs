//! Deletes duplicate-robot-ID `StockFinder` rows whose KP ID Fly Core does not know.

use clap::Parser;
use flysync_cli::{finish, print_report, run_main, BarProgress, CommonArgs, Runtime};
use flysync_core::config::Access;
use flysync_core::service::robot_id_service::RobotIdService;
use flysync_core::{DatabaseKind, SqliteStockRepository};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(about = "Remove duplicate robot IDs from FlyBoy")]
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
    let flycore = runtime.flycore(&settings)?;
    let mut conn = runtime.open_database(&settings, DatabaseKind::Stock, Access::Write)?;
    let tx = conn.transaction()?;
    let progress = BarProgress::new(!cli.common.debug);

    let report = RobotIdService::new(SqliteStockRepository::new(&tx), flycore).run(&progress)?;
    finish(tx, cli.common.write)?;
    print_report(&report);
    Ok(())
}
