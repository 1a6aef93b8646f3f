//! FlyStore order report: yearly order counts per stock.
//!
//! # Responsibility
//! - Pivot order history into one row per stock with one column per year.
//! - Optionally restrict the report to a list of robot IDs.
//! - Lay the pivot out as an `.xlsx` sheet with typed cells.
//!
//! # Invariants
//! - Year columns run from the earliest order year to the current year.
//! - Missing years count as zero; years after the current one are not reported.

use crate::model::stock::OrderRow;
use crate::repo::stock_repo::OrderRepository;
use crate::service::{write_counter, SyncResult};
use log::{info, warn};
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt::{Display, Formatter};
use std::path::Path;

/// Orders of one stock, keyed on year.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StockOrders {
    pub stock: String,
    pub robot_id: Option<i64>,
    pub project: Option<String>,
    pub subcat: Option<String>,
    pub genotype: Option<String>,
    pub lab_id: Option<String>,
    pub by_year: BTreeMap<i32, i64>,
}

impl StockOrders {
    fn from_row(stock: String, row: &OrderRow) -> Self {
        Self {
            stock,
            robot_id: row.robot_id,
            project: row.project.clone(),
            subcat: row.subcat.clone(),
            genotype: row.genotype.clone(),
            lab_id: row.lab_id.clone(),
            by_year: BTreeMap::new(),
        }
    }

    pub fn orders_in(&self, year: i32) -> i64 {
        self.by_year.get(&year).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderPivot {
    pub first_year: i32,
    pub last_year: i32,
    pub stocks: Vec<StockOrders>,
}

impl OrderPivot {
    pub fn years(&self) -> impl Iterator<Item = i32> {
        self.first_year..=self.last_year
    }

    pub fn total(&self, stock: &StockOrders) -> i64 {
        self.years().map(|year| stock.orders_in(year)).sum()
    }
}

fn report_key(row: &OrderRow) -> String {
    match row.stock_name.as_deref() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => row.robot_id.map(|id| id.to_string()).unwrap_or_default(),
    }
}

/// Pivots order rows per stock; the first row seen for a stock supplies its details.
pub fn pivot_orders(
    rows: &[OrderRow],
    robot_ids: Option<&HashSet<i64>>,
    current_year: i32,
) -> OrderPivot {
    let mut first_year = current_year;
    let mut stocks: BTreeMap<String, StockOrders> = BTreeMap::new();
    for row in rows {
        if let Some(ids) = robot_ids {
            if !row.robot_id.is_some_and(|id| ids.contains(&id)) {
                continue;
            }
        }
        first_year = first_year.min(row.year);
        let key = report_key(row);
        stocks
            .entry(key.clone())
            .or_insert_with(|| StockOrders::from_row(key, row))
            .by_year
            .insert(row.year, row.count);
    }
    OrderPivot {
        first_year,
        last_year: current_year,
        stocks: stocks.into_values().collect(),
    }
}

/// One spreadsheet cell of the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportCell {
    Text(String),
    Number(i64),
    Empty,
}

impl ReportCell {
    fn text(value: Option<&str>) -> Self {
        match value {
            Some(text) if !text.is_empty() => Self::Text(text.to_string()),
            _ => Self::Empty,
        }
    }
}

/// Header row: stock details, one column per year, then the total.
pub fn report_header(pivot: &OrderPivot) -> Vec<String> {
    let mut header: Vec<String> = ["Stock", "RobotID", "Project", "SubCat", "Genotype", "Lab ID"]
        .iter()
        .map(|column| column.to_string())
        .collect();
    header.extend(pivot.years().map(|year| year.to_string()));
    header.push("Total".to_string());
    header
}

/// Data rows in stock order, aligned with [`report_header`].
pub fn report_rows(pivot: &OrderPivot) -> Vec<Vec<ReportCell>> {
    pivot
        .stocks
        .iter()
        .map(|stock| {
            let mut cells = vec![
                ReportCell::text(Some(&stock.stock)),
                stock.robot_id.map_or(ReportCell::Empty, ReportCell::Number),
                ReportCell::text(stock.project.as_deref()),
                ReportCell::text(stock.subcat.as_deref()),
                ReportCell::text(stock.genotype.as_deref()),
                ReportCell::text(stock.lab_id.as_deref()),
            ];
            cells.extend(pivot.years().map(|year| ReportCell::Number(stock.orders_in(year))));
            cells.push(ReportCell::Number(pivot.total(stock)));
            cells
        })
        .collect()
}

fn build_workbook(pivot: &OrderPivot) -> Result<Workbook, XlsxError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    let bold = Format::new().set_bold();
    for (col, title) in report_header(pivot).iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, title.as_str(), &bold)?;
    }
    for (index, cells) in report_rows(pivot).iter().enumerate() {
        let row = index as u32 + 1;
        for (col, cell) in cells.iter().enumerate() {
            let col = col as u16;
            match cell {
                ReportCell::Text(text) => {
                    sheet.write_string(row, col, text.as_str())?;
                }
                ReportCell::Number(value) => {
                    sheet.write_number(row, col, *value as f64)?;
                }
                ReportCell::Empty => {}
            }
        }
    }
    sheet.set_freeze_panes(1, 0)?;
    Ok(workbook)
}

/// Writes the pivot as an `.xlsx` workbook at `path`.
pub fn write_xlsx(pivot: &OrderPivot, path: &Path) -> SyncResult<()> {
    build_workbook(pivot)?.save(path)?;
    Ok(())
}

/// The workbook `write_xlsx` would save, as bytes.
pub fn xlsx_bytes(pivot: &OrderPivot) -> SyncResult<Vec<u8>> {
    Ok(build_workbook(pivot)?.save_to_buffer()?)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderReport {
    pub robot_ids_read: u64,
    pub robot_ids_kept: u64,
    pub rows: u64,
    pub pivot: OrderPivot,
}

impl Display for OrderReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.robot_ids_read > 0 {
            write_counter(f, "Robot IDs read", self.robot_ids_read)?;
            write_counter(f, "Robot IDs with orders", self.robot_ids_kept)?;
        }
        write_counter(f, "Order rows", self.rows)?;
        write_counter(f, "Stocks reported", self.pivot.stocks.len() as u64)
    }
}

pub struct OrderReportService<R: OrderRepository> {
    repo: R,
}

impl<R: OrderRepository> OrderReportService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Builds the report, restricted to `robot_ids` when given.
    pub fn run(&self, robot_ids: Option<&[String]>, current_year: i32) -> SyncResult<OrderReport> {
        let Some(raw_ids) = robot_ids else {
            let rows = self.repo.orders_by_stock_name()?;
            info!("Found {} rows", rows.len());
            return Ok(self.report(0, None, rows, current_year));
        };

        let unique: BTreeSet<&str> = raw_ids.iter().map(|id| id.trim()).collect();
        info!("Read {} robot IDs", unique.len());
        let mut kept = HashSet::new();
        for raw in &unique {
            let Ok(robot_id) = raw.parse::<i64>() else {
                warn!("Ignoring robot ID {raw}: not a number");
                continue;
            };
            if self.repo.robot_has_orders(robot_id)? {
                kept.insert(robot_id);
            }
        }
        info!("Filtered to {} robot IDs", kept.len());
        info!("Fetching orders");
        let rows = self.repo.orders_by_robot_id()?;
        info!("Found {} rows", rows.len());
        Ok(self.report(unique.len() as u64, Some(&kept), rows, current_year))
    }

    fn report(
        &self,
        robot_ids_read: u64,
        kept: Option<&HashSet<i64>>,
        rows: Vec<OrderRow>,
        current_year: i32,
    ) -> OrderReport {
        let pivot = pivot_orders(&rows, kept, current_year);
        info!(
            "Will output {} rows for years {}-{}",
            pivot.stocks.len(),
            pivot.first_year,
            pivot.last_year
        );
        OrderReport {
            robot_ids_read,
            robot_ids_kept: kept.map_or(0, |ids| ids.len() as u64),
            rows: rows.len() as u64,
            pivot,
        }
    }
}
