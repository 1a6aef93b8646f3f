//! Removes `StockFinder` rows that share a robot ID but are unknown to Fly Core.

use crate::repo::stock_repo::StockRepository;
use crate::rest::RecordsService;
use crate::service::{write_counter, RunProgress, SyncResult};
use log::{debug, error, info, warn};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RobotIdReport {
    pub robot_ids: u64,
    pub kp_ids: u64,
    pub deleted: u64,
}

impl Display for RobotIdReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write_counter(f, "Duplicate robot IDs", self.robot_ids)?;
        write_counter(f, "KP IDs checked", self.kp_ids)?;
        write_counter(f, "KP IDs deleted", self.deleted)
    }
}

pub struct RobotIdService<R: StockRepository, S: RecordsService> {
    repo: R,
    records: S,
}

impl<R: StockRepository, S: RecordsService> RobotIdService<R, S> {
    pub fn new(repo: R, records: S) -> Self {
        Self { repo, records }
    }

    pub fn run(&self, progress: &dyn RunProgress) -> SyncResult<RobotIdReport> {
        let mut report = RobotIdReport::default();
        let robot_ids = self.repo.duplicate_robot_ids()?;
        info!("Found {} duplicate robot IDs", robot_ids.len());

        progress.start("Checking robot IDs", robot_ids.len() as u64);
        for robot_id in robot_ids {
            report.robot_ids += 1;
            for row in self.repo.robot_rows(robot_id)? {
                debug!(
                    "Robot ID {} (KP {}, stock name {})",
                    row.robot_id,
                    row.kp_id,
                    row.stock_name.as_deref().unwrap_or("")
                );
                report.kp_ids += 1;
                if self.records.has_line_data(row.kp_id)? {
                    continue;
                }
                warn!("KP {} (Robot ID {}) is not in Fly Core", row.kp_id, row.robot_id);
                if self.repo.delete_stock_finder_row(row.kp_id)? > 0 {
                    report.deleted += 1;
                } else {
                    error!("Could not delete KP ID {} from StockFinder", row.kp_id);
                }
            }
            progress.advance();
        }
        progress.finish();
        Ok(report)
    }
}
