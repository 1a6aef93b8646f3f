//! Repairs stock rack IDs by majority vote within each tray quadrant.
//!
//! # Responsibility
//! - Derive, from recently flipped stocks, which rack each tray quadrant holds.
//! - Plan rack ID corrections for stocks that disagree with a clear majority.
//!
//! # Invariants
//! - Only stocks flipped within [`CANDIDATE_WINDOW_DAYS`] vote.
//! - A quadrant without a strict winner produces no update.
//! - Trays idle for [`STALE_TRAY_MONTHS`] months, or flipped today, are left alone.

use crate::model::stock::{Quadrant, RackCopy, StockRackRecord};
use crate::repo::stock_repo::StockRepository;
use crate::service::{write_counter, RunProgress, SyncResult};
use chrono::{Days, Months, NaiveDate};
use log::{debug, info, warn};
use std::collections::{BTreeMap, HashMap};
use std::fmt::{Display, Formatter};

pub const CANDIDATE_WINDOW_DAYS: u64 = 10;
pub const STALE_TRAY_MONTHS: u32 = 6;

/// Rack seen in a tray quadrant and how many recent stocks report it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RackCandidate {
    pub rack_id: String,
    pub count: u64,
}

/// Why a tray is excluded from repair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    NoRecentFlips,
    FlippedToday,
}

impl Display for IgnoreReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoRecentFlips => write!(f, "No flips to tray in last {STALE_TRAY_MONTHS} months"),
            Self::FlippedToday => write!(f, "Tray was flipped today"),
        }
    }
}

/// Planned rack ID change for one copy of a stock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RackUpdate {
    pub stock_id: i64,
    pub copy: RackCopy,
    pub from: Option<String>,
    pub to: String,
}

type QuadrantKey = (String, Quadrant);

/// Counts recent rack reports per (tray, quadrant), ordered by rack ID.
pub fn rack_candidates(
    stocks: &[StockRackRecord],
    today: NaiveDate,
) -> HashMap<QuadrantKey, Vec<RackCandidate>> {
    let since = today - Days::new(CANDIDATE_WINDOW_DAYS);
    let mut counts: BTreeMap<(String, Quadrant, String), u64> = BTreeMap::new();
    for stock in stocks {
        for copy in RackCopy::ALL {
            let view = stock.copy(copy);
            let (Some(tray), Some(quadrant), Some(flipped), Some(rack_id)) =
                (view.tray(), view.quadrant(), view.last_flipped, view.rack_id)
            else {
                continue;
            };
            if flipped < since {
                continue;
            }
            *counts
                .entry((tray.to_string(), quadrant, rack_id.to_string()))
                .or_default() += 1;
        }
    }

    let mut candidates: HashMap<QuadrantKey, Vec<RackCandidate>> = HashMap::new();
    for ((tray, quadrant, rack_id), count) in counts {
        candidates
            .entry((tray, quadrant))
            .or_default()
            .push(RackCandidate { rack_id, count });
    }
    candidates
}

/// Trays whose most recent flip is too old or is today.
pub fn ignored_trays(stocks: &[StockRackRecord], today: NaiveDate) -> HashMap<String, IgnoreReason> {
    let mut latest: HashMap<String, NaiveDate> = HashMap::new();
    for stock in stocks {
        for copy in RackCopy::ALL {
            let view = stock.copy(copy);
            let (Some(tray), Some(flipped)) = (view.tray(), view.last_flipped) else {
                continue;
            };
            latest
                .entry(tray.to_string())
                .and_modify(|date| *date = (*date).max(flipped))
                .or_insert(flipped);
        }
    }

    let cutoff = today
        .checked_sub_months(Months::new(STALE_TRAY_MONTHS))
        .unwrap_or(NaiveDate::MIN);
    latest
        .into_iter()
        .filter_map(|(tray, flipped)| {
            if flipped < cutoff {
                Some((tray, IgnoreReason::NoRecentFlips))
            } else if flipped == today {
                Some((tray, IgnoreReason::FlippedToday))
            } else {
                None
            }
        })
        .collect()
}

/// Picks the rack with the strictly highest count; ties have no winner.
pub fn choose_rack(candidates: &[RackCandidate]) -> Option<&RackCandidate> {
    let best = candidates.iter().max_by_key(|candidate| candidate.count)?;
    let tied = candidates
        .iter()
        .filter(|candidate| candidate.count == best.count)
        .count();
    (tied == 1).then_some(best)
}

fn describe(candidates: &[RackCandidate]) -> String {
    candidates
        .iter()
        .map(|candidate| format!("{}={}", candidate.rack_id, candidate.count))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Plans every rack ID correction for `stocks` as of `today`.
pub fn plan_rack_updates(stocks: &[StockRackRecord], today: NaiveDate) -> Vec<RackUpdate> {
    let candidates = rack_candidates(stocks, today);
    let ignored = ignored_trays(stocks, today);
    info!(
        "Quadrants with recent flips: {}, trays to ignore: {}",
        candidates.len(),
        ignored.len()
    );

    let mut updates = Vec::new();
    for stock in stocks {
        let mut usable = false;
        for copy in RackCopy::ALL {
            let view = stock.copy(copy);
            let (Some(tray), Some(quadrant)) = (view.tray(), view.quadrant()) else {
                continue;
            };
            usable = true;
            if let Some(reason) = ignored.get(tray) {
                debug!(
                    "Ignoring stock {} because its tray {tray} should be ignored because: {reason}",
                    stock.stock_id
                );
                continue;
            }
            let Some(options) = candidates.get(&(tray.to_string(), quadrant)) else {
                debug!(
                    "Could not find rack info for copy {copy} stock {}",
                    stock.stock_id
                );
                continue;
            };
            match choose_rack(options) {
                Some(winner) if view.rack_id != Some(winner.rack_id.as_str()) => {
                    updates.push(RackUpdate {
                        stock_id: stock.stock_id,
                        copy,
                        from: view.rack_id.map(str::to_string),
                        to: winner.rack_id.clone(),
                    });
                    debug!("Rack choices for {tray} {quadrant}: {}", describe(options));
                }
                Some(_) => {}
                None => warn!(
                    "Not updating stock {}/rack {} because there is no clear majority in the quadrant: {}",
                    stock.stock_id,
                    view.rack_id.unwrap_or("none"),
                    describe(options)
                ),
            }
        }
        if !usable {
            debug!(
                "Ignoring stock {} because it is missing a tray or rack",
                stock.stock_id
            );
        }
    }
    updates
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RackReport {
    pub stocks: u64,
    pub updates: u64,
}

impl Display for RackReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write_counter(f, "Stocks checked", self.stocks)?;
        write_counter(f, "Rack IDs updated", self.updates)
    }
}

pub struct RackService<R: StockRepository> {
    repo: R,
}

impl<R: StockRepository> RackService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn run(&self, today: NaiveDate, progress: &dyn RunProgress) -> SyncResult<RackReport> {
        let stocks = self.repo.rack_stocks()?;
        info!("Stocks: {}", stocks.len());
        let updates = plan_rack_updates(&stocks, today);

        let mut report = RackReport {
            stocks: stocks.len() as u64,
            updates: 0,
        };
        progress.start("Updating racks", updates.len() as u64);
        for update in &updates {
            self.repo
                .update_rack(update.stock_id, update.copy, &update.to)?;
            info!(
                "Changed stock id {}'s column {} from {} to {}",
                update.stock_id,
                update.copy.rack_column(),
                update.from.as_deref().unwrap_or("none"),
                update.to
            );
            report.updates += 1;
            progress.advance();
        }
        progress.finish();
        Ok(report)
    }
}
