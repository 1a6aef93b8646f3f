//! Moves the images of a cross barcode from one line to another.
//!
//! # Invariants
//! - A cross is moved only when every one of its images is on the stated line.
//! - Lines with behavioural sessions are never modified.

use crate::repo::registry_repo::RegistryStore;
use crate::service::input::fields;
use crate::service::{write_counter, RunProgress, SyncResult};
use log::{debug, error, info, warn};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrossLineReport {
    pub read: u64,
    pub crosses_changed: u64,
    pub images_relinked: u64,
    pub errors: u64,
}

impl Display for CrossLineReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write_counter(f, "Rows read", self.read)?;
        write_counter(f, "Crosses changed", self.crosses_changed)?;
        write_counter(f, "Images relinked", self.images_relinked)?;
        write_counter(f, "Errors", self.errors)
    }
}

/// One `cross_barcode<TAB>line<TAB>new_line` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrossMove {
    pub cross_barcode: String,
    pub line: String,
    pub new_line: String,
}

impl CrossMove {
    pub fn parse(row: &str) -> Result<Self, String> {
        match fields(row).as_slice() {
            [_, line] => Err(format!("No new line name given for {line}")),
            [_, line, new_line] if line == new_line => {
                Err(format!("Line name and new line name match: {line}"))
            }
            [cross_barcode, line, new_line] => Ok(Self {
                cross_barcode: (*cross_barcode).to_string(),
                line: (*line).to_string(),
                new_line: (*new_line).to_string(),
            }),
            _ => Err(format!("Badly formatted line: {row}")),
        }
    }
}

pub struct CrossLineService<R: RegistryStore> {
    repo: R,
}

impl<R: RegistryStore> CrossLineService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn run(&self, rows: &[String], progress: &dyn RunProgress) -> SyncResult<CrossLineReport> {
        let mut report = CrossLineReport::default();
        progress.start("Processing crosses", rows.len() as u64);
        for row in rows {
            report.read += 1;
            match CrossMove::parse(row) {
                Ok(request) => self.process_cross(&request, &mut report)?,
                Err(message) => {
                    error!("{message}");
                    report.errors += 1;
                }
            }
            progress.advance();
        }
        progress.finish();
        Ok(report)
    }

    fn process_cross(&self, request: &CrossMove, report: &mut CrossLineReport) -> SyncResult<()> {
        let CrossMove {
            cross_barcode,
            line,
            new_line,
        } = request;
        debug!("Read {line}");

        let ids = self.repo.find_line_ids(line)?;
        let line_id = match ids.as_slice() {
            [] => {
                warn!("Line {line} is not in the registry");
                report.errors += 1;
                return Ok(());
            }
            [line_id] => *line_id,
            _ => {
                error!("Line {line} is in the registry more than once");
                report.errors += 1;
                return Ok(());
            }
        };

        let sessions = self.repo.count_sessions(line)?;
        if sessions > 0 {
            error!("Can't modify {line}, is annotated: {sessions}");
            report.errors += 1;
            return Ok(());
        }

        match self.repo.cross_type(cross_barcode)? {
            Some(cross_type) => info!("{cross_type} cross found for ID {cross_barcode}"),
            None => {
                warn!("There are no crosses associated with cross ID {cross_barcode} ({line})");
                report.errors += 1;
                return Ok(());
            }
        }

        let images = self.repo.cross_images(cross_barcode)?;
        if images.is_empty() {
            warn!("There are no images associated with cross ID {cross_barcode} ({line})");
            report.errors += 1;
            return Ok(());
        }
        if let Some(image) = images.iter().find(|image| image.line != *line) {
            error!(
                "Cross ID {cross_barcode} was loaded for line {}, but should be associated with {line}",
                image.line
            );
            report.errors += 1;
            return Ok(());
        }

        let Some(new_line_id) = self.repo.find_line_id(new_line)? else {
            error!("New line {new_line} is not in the registry");
            report.errors += 1;
            return Ok(());
        };

        let relinked = self
            .repo
            .relink_cross_images(cross_barcode, line_id, new_line_id)?;
        let events = self.repo.move_cross_events(cross_barcode, new_line_id)?;
        info!(
            "Moved cross ID {cross_barcode} from {line} to {new_line} ({relinked} images, {events} cross events)"
        );
        report.crosses_changed += 1;
        report.images_relinked += relinked as u64;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::CrossMove;

    #[test]
    fn cross_rows_need_three_distinct_fields() {
        assert!(CrossMove::parse("123\tJRC_1").is_err());
        assert!(CrossMove::parse("123\tJRC_1\tJRC_1").is_err());
        assert!(CrossMove::parse("123").is_err());
        let request = CrossMove::parse("123\tJRC_1\tJRC_2").unwrap();
        assert_eq!(request.cross_barcode, "123");
        assert_eq!(request.new_line, "JRC_2");
    }
}
