//! Mirrors Fly Core publishing names into the registry.

use clap::Parser;
use flysync_cli::{finish, print_report, run_main, BarProgress, CommonArgs, Runtime};
use flysync_core::config::Access;
use flysync_core::service::publishing_name_service::PublishingNameService;
use flysync_core::{DatabaseKind, SqliteRegistryRepository};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(about = "Sync publishing names from Fly Core to the registry")]
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
    let mut conn = runtime.open_database(&settings, DatabaseKind::Registry, Access::Write)?;
    let tx = conn.transaction()?;
    let progress = BarProgress::new(!cli.common.debug);

    let report =
        PublishingNameService::new(SqliteRegistryRepository::new(&tx), flycore).run(&progress)?;
    finish(tx, cli.common.write)?;
    print_report(&report);
    Ok(())
}
