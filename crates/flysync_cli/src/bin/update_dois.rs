//! Refreshes DOI metadata in FlyBoy and the configuration service.

use clap::Parser;
use flysync_cli::{finish, print_report, run_main, BarProgress, CommonArgs, Runtime};
use flysync_core::config::Access;
use flysync_core::service::doi_service::{publish_documents, DoiService};
use flysync_core::{DatabaseKind, SqliteStockRepository};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(about = "Update DOI metadata")]
struct Cli {
    /// Single DOI to process
    #[arg(long)]
    doi: Option<String>,
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
    let sources = runtime.doi_sources(&settings)?;
    let config_service = runtime.config_service()?;
    let mut conn = runtime.open_database(&settings, DatabaseKind::Stock, Access::Write)?;
    let tx = conn.transaction()?;
    let progress = BarProgress::new(!cli.common.debug);

    let (mut report, pending) = DoiService::new(
        SqliteStockRepository::new(&tx),
        flycore,
        sources,
        config_service.clone(),
    )
    .sync(cli.doi.as_deref(), &progress)?;
    if finish(tx, cli.common.write)? {
        publish_documents(&config_service, &pending, &mut report, &progress)?;
    }
    print_report(&report);
    Ok(())
}
