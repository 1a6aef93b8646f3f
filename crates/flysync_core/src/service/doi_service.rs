//! Refreshes the stock system's DOI table from Crossref and DataCite.
//!
//! # Responsibility
//! - Fetch title, first author and year for every DOI Fly Core references.
//! - Keep `doi_data` in step, removing DOIs no longer referenced.
//! - Queue changed metadata documents for the configuration service.
//!
//! # Invariants
//! - Documents are uploaded only after the stock database changes are committed.
//! - A DOI without title or author is counted as an error and never written.

use crate::model::doi::{
    ascii_title, crossref_is_complete, crossref_metadata, datacite_metadata, indexed_timestamp,
    is_in_prep, is_janelia_doi, split_raw_doi, DoiMetadata, DoiRecord,
};
use crate::repo::stock_repo::DoiRepository;
use crate::rest::{ConfigService, DoiSource, RecordsService, RestError};
use crate::service::{write_counter, RunProgress, SyncResult};
use log::{debug, error, info, warn};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// How often and how patiently incomplete Crossref records are re-fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DoiReport {
    pub found: u64,
    pub found_in_stock_db: u64,
    pub written: u64,
    pub deleted: u64,
    pub config_inserted: u64,
    pub config_updated: u64,
    pub errors: u64,
}

impl Display for DoiReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write_counter(f, "DOIs found in Fly Core", self.found)?;
        write_counter(f, "DOIs found in FlyBoy", self.found_in_stock_db)?;
        write_counter(f, "DOIs inserted/updated", self.written)?;
        write_counter(f, "DOIs deleted", self.deleted)?;
        write_counter(f, "Config documents inserted", self.config_inserted)?;
        write_counter(f, "Config documents updated", self.config_updated)?;
        write_counter(f, "Errors", self.errors)
    }
}

/// Metadata documents waiting for upload, keyed on DOI.
pub type PendingDocuments = BTreeMap<String, Value>;

pub struct DoiService<R, F, S, C>
where
    R: DoiRepository,
    F: RecordsService,
    S: DoiSource,
    C: ConfigService,
{
    repo: R,
    records: F,
    source: S,
    config: C,
    retry: RetryPolicy,
}

impl<R, F, S, C> DoiService<R, F, S, C>
where
    R: DoiRepository,
    F: RecordsService,
    S: DoiSource,
    C: ConfigService,
{
    pub fn new(repo: R, records: F, source: S, config: C) -> Self {
        Self {
            repo,
            records,
            source,
            config,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Syncs `doi_data`; a single DOI disables the back-check.
    ///
    /// Returns the report and the documents to upload once the run is committed.
    pub fn sync(
        &self,
        single_doi: Option<&str>,
        progress: &dyn RunProgress,
    ) -> SyncResult<(DoiReport, PendingDocuments)> {
        let raw_dois = match single_doi {
            Some(doi) => vec![doi.to_string()],
            None => {
                info!("Fetching DOIs from Fly Core");
                self.records.doi_list()?
            }
        };

        let mut report = DoiReport::default();
        let mut pending = PendingDocuments::new();
        let mut seen = HashSet::new();
        progress.start("Process DOIs", raw_dois.len() as u64);
        for raw in &raw_dois {
            for doi in split_raw_doi(raw) {
                if is_in_prep(&doi) {
                    continue;
                }
                self.process_doi(&doi, &mut report, &mut pending)?;
                seen.insert(doi);
            }
            progress.advance();
        }
        progress.finish();

        if single_doi.is_none() {
            self.back_check(&seen, &mut report)?;
        }
        Ok((report, pending))
    }

    fn process_doi(
        &self,
        doi: &str,
        report: &mut DoiReport,
        pending: &mut PendingDocuments,
    ) -> SyncResult<()> {
        report.found += 1;
        let metadata = if is_janelia_doi(doi) {
            let attributes = self.source.datacite_attributes(doi)?;
            let metadata = datacite_metadata(&attributes);
            pending.insert(doi.to_string(), attributes);
            metadata
        } else {
            let message = self.crossref_with_retry(doi)?;
            let metadata = crossref_metadata(&message);
            if self.needs_update(doi, &message)? {
                pending.insert(doi.to_string(), message);
            }
            metadata
        };

        let DoiMetadata {
            title,
            author,
            date,
        } = metadata;
        let Some(title) = title else {
            error!("Missing title for {doi}");
            report.errors += 1;
            return Ok(());
        };
        let Some(author) = author else {
            error!("Missing author for {doi} ({title})");
            report.errors += 1;
            return Ok(());
        };
        debug!("{doi}: {title} ({author}, {date})");

        self.repo.upsert_doi(&DoiRecord {
            doi: doi.to_string(),
            title: ascii_title(&title),
            first_author: author,
            publication_date: date,
        })?;
        report.written += 1;
        Ok(())
    }

    fn crossref_with_retry(&self, doi: &str) -> SyncResult<Value> {
        let attempts = self.retry.attempts.max(1);
        let mut message = Value::Null;
        for attempt in 1..=attempts {
            message = self.source.crossref_message(doi)?;
            if crossref_is_complete(&message) {
                break;
            }
            if attempt < attempts {
                warn!(
                    "Missing data from crossref.org: retrying ({})",
                    attempts - attempt
                );
                std::thread::sleep(self.retry.delay);
            }
        }
        Ok(message)
    }

    /// Whether the stored document's index timestamp differs from Crossref's.
    fn needs_update(&self, doi: &str, message: &Value) -> SyncResult<bool> {
        let Some(timestamp) = indexed_timestamp(message) else {
            return Ok(true);
        };
        let Some(stored) = self.config.stored_doi(doi)? else {
            return Ok(true);
        };
        Ok(indexed_timestamp(&stored) != Some(timestamp))
    }

    fn back_check(&self, seen: &HashSet<String>, report: &mut DoiReport) -> SyncResult<()> {
        for doi in self.repo.doi_list()? {
            report.found_in_stock_db += 1;
            if seen.contains(&doi) {
                continue;
            }
            warn!("Deleting {doi} from doi_data");
            self.repo.delete_doi(&doi)?;
            report.deleted += 1;
        }
        Ok(())
    }
}

/// Uploads queued documents; a rejected upload is counted and skipped.
///
/// Call only after the stock database run has been committed.
pub fn publish_documents<C: ConfigService>(
    config: &C,
    pending: &PendingDocuments,
    report: &mut DoiReport,
    progress: &dyn RunProgress,
) -> SyncResult<()> {
    progress.start("Update config", pending.len() as u64);
    for (doi, document) in pending {
        debug!("Updating {doi} in config database");
        match config.import_doi(doi, document) {
            Ok(outcome) => {
                report.config_inserted += outcome.inserted;
                report.config_updated += outcome.updated;
            }
            Err(RestError::Status { message, .. }) => {
                error!("Could not update {doi} in config database: {message}");
                report.errors += 1;
            }
            Err(err) => return Err(err.into()),
        }
        progress.advance();
    }
    progress.finish();
    Ok(())
}
