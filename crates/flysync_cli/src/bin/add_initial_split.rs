//! Adds publishing names for the initial split lines imaged in an ALPS release.

use anyhow::bail;
use clap::Parser;
use flysync_cli::{finish, print_report, run_main, select_item, BarProgress, CommonArgs, Runtime};
use flysync_core::config::Access;
use flysync_core::service::initial_split_service::ReleaseNameService;
use flysync_core::{DatabaseKind, SqliteRegistryRepository};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(about = "Add initial split publishing names for a release")]
struct Cli {
    /// ALPS release
    #[arg(long)]
    release: Option<String>,
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
    let jacs = runtime.jacs(&settings)?;
    let mut conn = runtime.open_database(&settings, DatabaseKind::Registry, Access::Write)?;
    let tx = conn.transaction()?;
    let progress = BarProgress::new(!cli.common.debug);

    let service = ReleaseNameService::new(SqliteRegistryRepository::new(&tx), jacs);
    let release = match &cli.release {
        Some(release) => release.clone(),
        None => {
            let releases = service.available_releases()?;
            match select_item("Select a release", &releases)? {
                Some(release) => release,
                None => bail!("specify a release with --release: {}", releases.join(", ")),
            }
        }
    };
    let report = service.run(&release, &progress)?;
    drop(service);
    finish(tx, cli.common.write)?;
    print_report(&report);
    Ok(())
}
