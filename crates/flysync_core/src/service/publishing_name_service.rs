//! Mirrors Fly Core publishing names into the registry.
//!
//! # Responsibility
//! - Upsert publishing names of named stocks keyed on their Fly Core serial.
//! - Delete registry names whose serial Fly Core no longer reports.
//!
//! # Invariants
//! - Names containing line breaks are never written.
//! - Names on `IS<n>` lines are never deleted by this sync.
//! - Nothing is deleted unless every fetched row carried a serial number.

use crate::model::line::{has_initial_split_id, LineId, PublishingNameRow, SourcedPublishingName};
use crate::repo::registry_repo::RegistryStore;
use crate::rest::RecordsService;
use crate::service::{write_counter, RunProgress, SyncResult};
use log::{debug, error, info, warn};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishingNameReport {
    pub read: u64,
    pub inserted: u64,
    pub updated: u64,
    pub deleted: u64,
    pub skipped: u64,
    pub errors: u64,
}

impl Display for PublishingNameReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write_counter(f, "Publishing names read", self.read)?;
        write_counter(f, "Publishing names inserted", self.inserted)?;
        write_counter(f, "Publishing names updated", self.updated)?;
        write_counter(f, "Publishing names deleted", self.deleted)?;
        write_counter(f, "Publishing names skipped", self.skipped)?;
        write_counter(f, "Publishing names in error", self.errors)
    }
}

pub struct PublishingNameService<R: RegistryStore, S: RecordsService> {
    repo: R,
    records: S,
    line_ids: RefCell<HashMap<String, Option<LineId>>>,
}

impl<R: RegistryStore, S: RecordsService> PublishingNameService<R, S> {
    pub fn new(repo: R, records: S) -> Self {
        Self {
            repo,
            records,
            line_ids: RefCell::new(HashMap::new()),
        }
    }

    pub fn run(&self, progress: &dyn RunProgress) -> SyncResult<PublishingNameReport> {
        info!("Fetching stock names from Fly Core");
        let stocks = self.records.named_stocks()?;
        info!("Found {} named stocks in Fly Core", stocks.len());
        info!("Fetching publishing names from Fly Core");
        let rows = self.records.publishing_names()?;
        info!("Found {} publishing names in Fly Core", rows.len());

        let mut report = PublishingNameReport::default();
        let mut serials = HashSet::new();
        let mut serials_complete = true;
        progress.start("Syncing publishing names", rows.len() as u64);
        for values in &rows {
            report.read += 1;
            progress.advance();
            match PublishingNameRow::serial_of(values) {
                Some(serial) => {
                    serials.insert(serial);
                }
                None => serials_complete = false,
            }
            let row = match PublishingNameRow::from_values(values) {
                Ok(row) => row,
                Err(message) => {
                    error!("Bad publishing name row from Fly Core: {message}");
                    report.errors += 1;
                    continue;
                }
            };

            let Some(stock_name) = stocks.get(&row.parent_kp) else {
                report.skipped += 1;
                continue;
            };
            if row.has_line_break() {
                error!("{stock_name} has a publishing name with carriage returns");
                report.errors += 1;
                continue;
            }
            if *stock_name == row.name {
                report.skipped += 1;
                continue;
            }
            self.set_publishing_name(stock_name, &row, &mut report)?;
        }
        progress.finish();

        if serials_complete {
            self.delete_missing(&serials, &mut report)?;
        } else {
            warn!("Fly Core returned rows without a serial number; not deleting any names");
        }
        Ok(report)
    }

    fn set_publishing_name(
        &self,
        line: &str,
        row: &PublishingNameRow,
        report: &mut PublishingNameReport,
    ) -> SyncResult<()> {
        let Some(line_id) = self.line_id(line)? else {
            error!("Line {line} is not in the registry");
            report.errors += 1;
            return Ok(());
        };
        let name = SourcedPublishingName::from_row(row, line_id, line);
        if self.repo.has_publishing_name(line_id, &name.publishing_name)? {
            report.updated += 1;
        } else {
            info!("Publishing name {} for {line}", name.publishing_name);
            report.inserted += 1;
        }
        debug!("Publishing name {} for {line}", name.publishing_name);
        self.repo.upsert_sourced(&name)?;
        Ok(())
    }

    fn line_id(&self, line: &str) -> SyncResult<Option<LineId>> {
        if let Some(cached) = self.line_ids.borrow().get(line) {
            return Ok(*cached);
        }
        let line_id = self.repo.find_line_id(line)?;
        self.line_ids.borrow_mut().insert(line.to_string(), line_id);
        Ok(line_id)
    }

    fn delete_missing(
        &self,
        serials: &HashSet<i64>,
        report: &mut PublishingNameReport,
    ) -> SyncResult<()> {
        let registry: Vec<_> = self
            .repo
            .sourced_names()?
            .into_iter()
            .filter(|entry| !has_initial_split_id(&entry.line))
            .collect();
        info!("Found {} records in Fly Core", serials.len());
        info!("Found {} records in the registry", registry.len());

        for entry in registry {
            if serials.contains(&entry.source_id) {
                continue;
            }
            warn!(
                "{} is present in the registry but not in Fly Core",
                entry.source_id
            );
            report.deleted += self.repo.delete_by_id(entry.id)? as u64;
        }
        Ok(())
    }
}
