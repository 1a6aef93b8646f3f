//! Writes the FlyStore order report as an `.xlsx` workbook.

use anyhow::Context;
use chrono::Datelike;
use clap::Parser;
use flysync_cli::{print_report, run_main, ReadOnlyArgs, Runtime};
use flysync_core::config::Access;
use flysync_core::service::input::read_rows_from_file;
use flysync_core::service::order_report_service::{write_xlsx, OrderReportService};
use flysync_core::{DatabaseKind, SqliteStockRepository};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(about = "FlyStore order report")]
struct Cli {
    /// File of robot IDs to include
    #[arg(long)]
    file: Option<PathBuf>,
    /// Report workbook
    #[arg(long, default_value = "flystore_order_report.xlsx")]
    output: PathBuf,
    #[command(flatten)]
    common: ReadOnlyArgs,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    run_main(|| run(&cli))
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let runtime = Runtime::init(&cli.common.as_common())?;
    let robot_ids = cli.file.as_deref().map(read_rows_from_file).transpose()?;
    let settings = runtime.settings();
    let conn = runtime.open_database(&settings, DatabaseKind::Stock, Access::Read)?;

    let current_year = chrono::Local::now().year();
    let report = OrderReportService::new(SqliteStockRepository::new(&conn))
        .run(robot_ids.as_deref(), current_year)?;
    write_xlsx(&report.pivot, &cli.output)
        .with_context(|| format!("failed to write {}", cli.output.display()))?;
    print_report(&report);
    println!("Wrote report to {}", cli.output.display());
    Ok(())
}
