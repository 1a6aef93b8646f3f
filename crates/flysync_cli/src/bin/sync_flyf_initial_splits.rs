//! Creates initial split lines from Fly Core in the registry.

use clap::Parser;
use flysync_cli::{finish, print_report, run_main, BarProgress, CommonArgs, Runtime};
use flysync_core::config::Access;
use flysync_core::service::initial_split_service::{InitialSplitService, SplitSyncOptions};
use flysync_core::{DatabaseKind, SqliteRegistryRepository};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(about = "Sync initial splits from Fly Core to the registry")]
struct Cli {
    /// Split line to sync
    #[arg(long)]
    line: Option<String>,
    /// Also check lines already in the registry
    #[arg(long)]
    all: bool,
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
    let mut conn = runtime.open_database(&settings, DatabaseKind::Registry, Access::Write)?;
    let tx = conn.transaction()?;
    let progress = BarProgress::new(!cli.common.debug);

    let options = SplitSyncOptions {
        line: cli.line.clone(),
        all: cli.all,
    };
    let report = InitialSplitService::new(SqliteRegistryRepository::new(&tx), flycore)
        .run(&options, &progress)?;
    finish(tx, cli.common.write)?;
    print_report(&report);
    Ok(())
}
