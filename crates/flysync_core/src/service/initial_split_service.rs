//! Initial split lines: registry sync from Fly Core and release publishing names.
//!
//! # Responsibility
//! - Create initial split lines with their parent relationships and properties.
//! - Repair parent relationships of existing split lines on request.
//! - Give every initial split line imaged in a release its publishing name.
//!
//! # Invariants
//! - A split is linked only when both genotype halves resolve to distinct lines.
//! - Statement failures while writing one split count as that split's error.

use crate::model::line::{is_initial_split_line, publishing_name_for_line, LineId, Split};
use crate::repo::registry_repo::RegistryStore;
use crate::repo::RepoResult;
use crate::rest::imaging::sample_id;
use crate::rest::{ImagingService, RecordsService};
use crate::service::{write_counter, RunProgress, SyncResult};
use log::{debug, error, info};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

/// Properties every new initial split line receives.
pub const INITIAL_SPLIT_PROPERTIES: [(&str, &str); 5] = [
    ("hide", "Y"),
    ("flycore_permission", "Class 3 (Written)"),
    ("flycore_project", "Split_GAL4"),
    ("flycore_project_subcat", "InitialSplits"),
    ("flycore_lab", "Fly Light"),
];

const ALIAS_PROPERTY: &str = "flycore_alias";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitSyncOptions {
    /// Only sync this split line.
    pub line: Option<String>,
    /// Also revisit lines already in the registry.
    pub all: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitSyncReport {
    pub splits: u64,
    pub read: u64,
    pub inserted: u64,
    pub skipped: u64,
    pub errors: u64,
}

impl Display for SplitSyncReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write_counter(f, "Split crosses", self.splits)?;
        write_counter(f, "Lines read", self.read)?;
        write_counter(f, "Lines inserted", self.inserted)?;
        write_counter(f, "Lines skipped", self.skipped)?;
        write_counter(f, "Lines in error", self.errors)
    }
}

pub struct InitialSplitService<R: RegistryStore, S: RecordsService> {
    repo: R,
    records: S,
}

impl<R: RegistryStore, S: RecordsService> InitialSplitService<R, S> {
    pub fn new(repo: R, records: S) -> Self {
        Self { repo, records }
    }

    pub fn run(
        &self,
        options: &SplitSyncOptions,
        progress: &dyn RunProgress,
    ) -> SyncResult<SplitSyncReport> {
        info!("Fetching initial splits from Fly Core");
        let splits = self.records.initial_splits(options.line.as_deref())?;
        info!("Found {} initial splits in Fly Core", splits.len());

        let mut report = SplitSyncReport {
            splits: splits.len() as u64,
            ..SplitSyncReport::default()
        };
        progress.start("Syncing splits", splits.len() as u64);
        for split in &splits {
            self.process_split(split, options, &mut report)?;
            progress.advance();
        }
        progress.finish();
        Ok(report)
    }

    fn process_split(
        &self,
        split: &Split,
        options: &SplitSyncOptions,
        report: &mut SplitSyncReport,
    ) -> SyncResult<()> {
        let line_id = self.repo.find_line_id(&split.line)?;
        if line_id.is_some() && !options.all {
            return Ok(());
        }
        report.read += 1;
        info!(
            "Cross barcode {}: {} {}",
            split.cross_barcode, split.line, split.genotype
        );

        let Some(parents) = self.resolve_halves(split, report)? else {
            return Ok(());
        };
        match line_id {
            Some(line_id) => self.check_existing_line(line_id, split, &parents, report)?,
            None => self.insert_split_line(split, &parents, report),
        }
        Ok(())
    }

    /// Resolves both genotype halves to line ids; `None` when the split is unusable.
    fn resolve_halves(
        &self,
        split: &Split,
        report: &mut SplitSyncReport,
    ) -> SyncResult<Option<[LineId; 2]>> {
        let halves = split.halves();
        if let [first, second] = halves.as_slice() {
            if first == second {
                error!("Duplicate split halves for {}", split.line);
                report.errors += 1;
                return Ok(None);
            }
        }

        let mut parents = BTreeSet::new();
        let mut missing = false;
        for half in &halves {
            match self.repo.find_line_id(half)? {
                Some(parent_id) => {
                    debug!("Split half {half} found ({parent_id})");
                    parents.insert(parent_id);
                }
                None => {
                    error!(
                        "Split half {half} was not found for {} ({})",
                        split.genotype, split.line
                    );
                    report.errors += 1;
                    missing = true;
                }
            }
        }
        if missing {
            return Ok(None);
        }
        let parents: Vec<LineId> = parents.into_iter().collect();
        match parents.as_slice() {
            [first, second] => Ok(Some([*first, *second])),
            _ => {
                error!(
                    "Expected two split halves for {} but genotype {} has {}",
                    split.line,
                    split.genotype,
                    parents.len()
                );
                report.errors += 1;
                Ok(None)
            }
        }
    }

    fn check_existing_line(
        &self,
        line_id: LineId,
        split: &Split,
        parents: &[LineId; 2],
        report: &mut SplitSyncReport,
    ) -> SyncResult<()> {
        let mut current = self.repo.parent_ids(&split.line)?;
        current.sort_unstable();
        if current.as_slice() == parents.as_slice() {
            debug!("Found line {} - skipping load", split.line);
            report.skipped += 1;
            return Ok(());
        }

        debug!("Changing relationships for {} ({line_id})", split.line);
        if let Err(err) = self.relink_parents(line_id, parents, &split.genotype) {
            error!("{err}");
            error!(
                "Could not update relationships for line {} ({line_id})",
                split.line
            );
            report.errors += 1;
        }
        Ok(())
    }

    fn relink_parents(&self, line_id: LineId, parents: &[LineId; 2], genotype: &str) -> RepoResult<()> {
        let removed = self.repo.delete_relationships(line_id)?;
        debug!("Deleted {removed} relationships for line ID {line_id}");
        self.create_relationships(line_id, parents)?;
        self.repo.update_property(line_id, ALIAS_PROPERTY, genotype)?;
        debug!("Updated {ALIAS_PROPERTY} ({genotype}) for line ID {line_id}");
        Ok(())
    }

    fn create_relationships(&self, line_id: LineId, parents: &[LineId; 2]) -> RepoResult<()> {
        for parent_id in parents {
            self.repo.create_child_relationship(line_id, *parent_id)?;
            debug!("Created parent/child relationship from {line_id} to {parent_id}");
        }
        Ok(())
    }

    fn insert_split_line(&self, split: &Split, parents: &[LineId; 2], report: &mut SplitSyncReport) {
        match self.write_split_line(split, parents) {
            Ok(line_id) => {
                info!("Inserted line {} ({line_id})", split.line);
                report.inserted += 1;
            }
            Err(err) => {
                error!("Could not insert line {}: {err}", split.line);
                report.errors += 1;
            }
        }
    }

    fn write_split_line(&self, split: &Split, parents: &[LineId; 2]) -> RepoResult<LineId> {
        let line_id = self.repo.insert_line(&split.line)?;
        self.create_relationships(line_id, parents)?;
        for (term, value) in INITIAL_SPLIT_PROPERTIES {
            self.repo.insert_property(line_id, term, value)?;
        }
        self.repo
            .insert_property(line_id, ALIAS_PROPERTY, &split.genotype)?;
        Ok(line_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReleaseNameReport {
    pub lines: u64,
    pub inserted: u64,
    pub errors: u64,
}

impl Display for ReleaseNameReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write_counter(f, "Lines found", self.lines)?;
        write_counter(f, "Names inserted", self.inserted)?;
        write_counter(f, "Errors", self.errors)
    }
}

/// Adds publishing names for the initial split lines imaged in a release.
pub struct ReleaseNameService<R: RegistryStore, I: ImagingService> {
    repo: R,
    imaging: I,
}

impl<R: RegistryStore, I: ImagingService> ReleaseNameService<R, I> {
    pub fn new(repo: R, imaging: I) -> Self {
        Self { repo, imaging }
    }

    /// Releases that can be passed to [`Self::run`].
    pub fn available_releases(&self) -> SyncResult<Vec<String>> {
        Ok(self.repo.release_names()?)
    }

    pub fn run(&self, release: &str, progress: &dyn RunProgress) -> SyncResult<ReleaseNameReport> {
        let lines = self.release_lines(release, progress)?;
        info!("Lines: {}", lines.len());

        let mut report = ReleaseNameReport {
            lines: lines.len() as u64,
            ..ReleaseNameReport::default()
        };
        progress.start("Inserting names", lines.len() as u64);
        for line in &lines {
            let publishing_name = publishing_name_for_line(line);
            if !self.repo.has_line_publishing_name(line, &publishing_name)? {
                match self.repo.find_line_id(line)? {
                    Some(line_id) => {
                        self.repo
                            .insert_release_name(line_id, &publishing_name, release)?;
                        debug!("Inserted {publishing_name}");
                        report.inserted += 1;
                    }
                    None => {
                        error!("Could not find {line} in line table");
                        report.errors += 1;
                    }
                }
            }
            progress.advance();
        }
        progress.finish();
        Ok(report)
    }

    /// Distinct initial split lines imaged in `release`.
    fn release_lines(&self, release: &str, progress: &dyn RunProgress) -> SyncResult<BTreeSet<String>> {
        let samples = self.imaging.release_samples(release)?;
        info!("Samples: {}", samples.len());

        let mut lines = BTreeSet::new();
        progress.start("Getting lines", samples.len() as u64);
        for sample in &samples {
            match self.imaging.sample_line(sample_id(sample))? {
                Some(line) if is_initial_split_line(&line) => {
                    lines.insert(line);
                }
                Some(_) => {}
                None => debug!("Sample {sample} has no line"),
            }
            progress.advance();
        }
        progress.finish();
        Ok(lines)
    }
}
