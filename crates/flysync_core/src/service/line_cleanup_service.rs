//! Deletes or renames registry lines listed in an input file.
//!
//! # Responsibility
//! - Remove lines that have no imagery, together with their dependents.
//! - Rename lines, merging into an existing line when the new name is taken.
//!
//! # Invariants
//! - Lines with behavioural sessions are never modified.
//! - A line with images is never deleted; it can only be renamed.

use crate::model::line::LineId;
use crate::repo::registry_repo::RegistryStore;
use crate::service::input::fields;
use crate::service::{write_counter, RunProgress, SyncResult};
use log::{debug, error, info, warn};
use std::fmt::{Display, Formatter};

/// Outcome counters of a cleanup run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub read: u64,
    pub deleted: u64,
    pub renamed: u64,
    pub errors: u64,
}

impl Display for CleanupReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write_counter(f, "Lines read", self.read)?;
        write_counter(f, "Lines deleted", self.deleted)?;
        write_counter(f, "Lines renamed", self.renamed)?;
        write_counter(f, "Errors", self.errors)
    }
}

/// One parsed input row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupRequest {
    pub line: String,
    pub new_name: Option<String>,
}

impl CleanupRequest {
    /// Parses `name` or `name<TAB>new_name`.
    pub fn parse(row: &str) -> Result<Self, String> {
        match fields(row).as_slice() {
            [line] => Ok(Self {
                line: (*line).to_string(),
                new_name: None,
            }),
            [line, new_name] if line == new_name => {
                Err(format!("Line name and new line name match: {line}"))
            }
            [line, new_name] => Ok(Self {
                line: (*line).to_string(),
                new_name: Some((*new_name).to_string()).filter(|name| !name.is_empty()),
            }),
            _ => Err(format!("Badly formatted row: {row}")),
        }
    }
}

pub struct LineCleanupService<R: RegistryStore> {
    repo: R,
}

impl<R: RegistryStore> LineCleanupService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Processes every input row in order.
    pub fn run(&self, rows: &[String], progress: &dyn RunProgress) -> SyncResult<CleanupReport> {
        let mut report = CleanupReport::default();
        progress.start("Processing lines", rows.len() as u64);
        for row in rows {
            self.process_row(row, &mut report)?;
            progress.advance();
        }
        progress.finish();
        Ok(report)
    }

    fn process_row(&self, row: &str, report: &mut CleanupReport) -> SyncResult<()> {
        report.read += 1;
        let request = match CleanupRequest::parse(row) {
            Ok(request) => request,
            Err(message) => {
                error!("{message}");
                report.errors += 1;
                return Ok(());
            }
        };
        debug!("Read {}", request.line);

        let ids = self.repo.find_line_ids(&request.line)?;
        let line_id = match ids.as_slice() {
            [] => {
                warn!("Line {} is not in the registry", request.line);
                report.errors += 1;
                return Ok(());
            }
            [line_id] => *line_id,
            _ => {
                error!("Line {} is in the registry more than once", request.line);
                report.errors += 1;
                return Ok(());
            }
        };
        self.process_line(line_id, &request, report)
    }

    fn process_line(
        &self,
        line_id: LineId,
        request: &CleanupRequest,
        report: &mut CleanupReport,
    ) -> SyncResult<()> {
        let line = request.line.as_str();
        let images = self.repo.count_images(line)?;
        let sessions = self.repo.count_sessions(line)?;
        if sessions > 0 {
            error!("Can't modify {line}, is annotated: {sessions}");
            report.errors += 1;
            return Ok(());
        }

        let removed = self.repo.delete_for_line(line_id)?;
        if removed > 0 {
            debug!("Deleted publishing names ({removed}) for line ID {line_id}");
        }

        match (&request.new_name, images) {
            (None, 0) => {
                debug!("Will delete {line}");
                self.delete_line(line_id)?;
                info!("Deleted {line}");
                report.deleted += 1;
            }
            (None, images) => {
                error!("Can't rename {line} ({images} images), new name is unknown");
                report.errors += 1;
            }
            (Some(new_name), _) => {
                debug!("Will rename {line} to {new_name}");
                self.rename_line(line_id, new_name)?;
                info!("Renamed {line} to {new_name}");
                report.renamed += 1;
            }
        }
        Ok(())
    }

    /// Deletes relationships, events, properties and finally the line row.
    fn delete_line(&self, line_id: LineId) -> SyncResult<()> {
        let relationships = self.repo.delete_relationships(line_id)?;
        let events = self.repo.delete_events(line_id)?;
        let properties = self.repo.delete_properties(line_id)?;
        let lines = self.repo.delete_line_row(line_id)?;
        debug!(
            "Deleted line ID {line_id}: relationships={relationships} events={events} properties={properties} lines={lines}"
        );
        Ok(())
    }

    fn rename_line(&self, line_id: LineId, new_name: &str) -> SyncResult<()> {
        match self.repo.find_line_id(new_name)? {
            Some(existing_id) => {
                debug!("New line {new_name} is already in the registry ({existing_id})");
                let relinked = self.repo.relink_images(line_id, existing_id)?;
                if relinked > 0 {
                    debug!("Changed {relinked} images from line ID {line_id} to {existing_id}");
                }
                self.delete_line(line_id)?;
            }
            None => {
                let changed = self.repo.rename_line(line_id, new_name)?;
                debug!("Changed {changed} line name to {new_name} for line ID {line_id}");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::CleanupRequest;

    #[test]
    fn request_parsing_rules() {
        assert_eq!(
            CleanupRequest::parse("JRC_1").unwrap(),
            CleanupRequest {
                line: "JRC_1".to_string(),
                new_name: None
            }
        );
        assert_eq!(
            CleanupRequest::parse("JRC_1\tJRC_2").unwrap().new_name.as_deref(),
            Some("JRC_2")
        );
        assert!(CleanupRequest::parse("JRC_1\tJRC_1").is_err());
        assert!(CleanupRequest::parse("a\tb\tc").is_err());
    }
}
