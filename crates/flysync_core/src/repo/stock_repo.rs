//! Stock-system repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Read and repair rack state in the flipper table.
//! - Query and prune `StockFinder` robot IDs.
//! - Maintain the `doi_data` cache and read FlyStore order history.
//!
//! # Invariants
//! - Flip dates are stored as `YYYY-MM-DD` text; a trailing time part is ignored.
//! - Unparseable flip dates surface as `InvalidData`.

use crate::model::doi::DoiRecord;
use crate::model::stock::{OrderRow, RackCopy, RobotIdRow, StockRackRecord};
use crate::repo::{RepoError, RepoResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};

const FLIP_DATE_FORMAT: &str = "%Y-%m-%d";

/// Repository interface for rack locations and robot IDs.
pub trait StockRepository {
    /// Every stock with a rack location for either copy.
    fn rack_stocks(&self) -> RepoResult<Vec<StockRackRecord>>;
    /// Sets the rack ID of one copy of a stock.
    fn update_rack(&self, stock_id: i64, copy: RackCopy, rack_id: &str) -> RepoResult<usize>;
    /// Positive robot IDs shared by more than one `StockFinder` row.
    fn duplicate_robot_ids(&self) -> RepoResult<Vec<i64>>;
    fn robot_rows(&self, robot_id: i64) -> RepoResult<Vec<RobotIdRow>>;
    fn delete_stock_finder_row(&self, kp_id: i64) -> RepoResult<usize>;
}

/// Repository interface for the `doi_data` table.
pub trait DoiRepository {
    fn doi_list(&self) -> RepoResult<Vec<String>>;
    /// Inserts or replaces one DOI row.
    fn upsert_doi(&self, record: &DoiRecord) -> RepoResult<()>;
    fn delete_doi(&self, doi: &str) -> RepoResult<usize>;
}

/// Repository interface for FlyStore order history.
pub trait OrderRepository {
    fn robot_has_orders(&self, robot_id: i64) -> RepoResult<bool>;
    /// Yearly order counts keyed on stock name.
    fn orders_by_stock_name(&self) -> RepoResult<Vec<OrderRow>>;
    /// Yearly order counts joined on robot ID.
    fn orders_by_robot_id(&self) -> RepoResult<Vec<OrderRow>>;
}

/// SQLite-backed stock-system repository.
pub struct SqliteStockRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStockRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl StockRepository for SqliteStockRepository<'_> {
    fn rack_stocks(&self) -> RepoResult<Vec<StockRackRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                stock_id,
                genotype,
                rack_location,
                rack_location_b,
                cell,
                cell_b,
                last_flipped,
                last_flipped_b,
                rack,
                rack_b
             FROM __flipper_flystocks_stock
             WHERE rack_location IS NOT NULL OR rack_location_b IS NOT NULL
             ORDER BY stock_id;",
        )?;
        let mut rows = stmt.query([])?;
        let mut stocks = Vec::new();
        while let Some(row) = rows.next()? {
            stocks.push(parse_rack_row(row)?);
        }
        Ok(stocks)
    }

    fn update_rack(&self, stock_id: i64, copy: RackCopy, rack_id: &str) -> RepoResult<usize> {
        let sql = format!(
            "UPDATE __flipper_flystocks_stock SET {} = ?1 WHERE stock_id = ?2;",
            copy.rack_column()
        );
        let changed = self.conn.execute(&sql, params![rack_id, stock_id])?;
        Ok(changed)
    }

    fn duplicate_robot_ids(&self) -> RepoResult<Vec<i64>> {
        let mut stmt = self.conn.prepare(
            "SELECT RobotID FROM StockFinder
             WHERE RobotID IS NOT NULL AND RobotID > 0
             GROUP BY RobotID
             HAVING COUNT(1) > 1
             ORDER BY RobotID;",
        )?;
        let ids = stmt
            .query_map([], |row| row.get::<_, i64>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    fn robot_rows(&self, robot_id: i64) -> RepoResult<Vec<RobotIdRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT RobotID, __kp_UniqueID, Stock_Name FROM StockFinder
             WHERE RobotID = ?1
             ORDER BY __kp_UniqueID;",
        )?;
        let rows = stmt
            .query_map([robot_id], |row| {
                Ok(RobotIdRow {
                    robot_id: row.get(0)?,
                    kp_id: row.get(1)?,
                    stock_name: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn delete_stock_finder_row(&self, kp_id: i64) -> RepoResult<usize> {
        let changed = self
            .conn
            .execute("DELETE FROM StockFinder WHERE __kp_UniqueID = ?1;", [kp_id])?;
        Ok(changed)
    }
}

impl DoiRepository for SqliteStockRepository<'_> {
    fn doi_list(&self) -> RepoResult<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT doi FROM doi_data ORDER BY doi;")?;
        let dois = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(dois)
    }

    fn upsert_doi(&self, record: &DoiRecord) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO doi_data (doi, title, first_author, publication_date)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (doi) DO UPDATE SET
                title = excluded.title,
                first_author = excluded.first_author,
                publication_date = excluded.publication_date;",
            params![
                record.doi.as_str(),
                record.title.as_str(),
                record.first_author.as_str(),
                record.publication_date.as_str(),
            ],
        )?;
        Ok(())
    }

    fn delete_doi(&self, doi: &str) -> RepoResult<usize> {
        let changed = self
            .conn
            .execute("DELETE FROM doi_data WHERE doi = ?1;", [doi])?;
        Ok(changed)
    }
}

impl OrderRepository for SqliteStockRepository<'_> {
    fn robot_has_orders(&self, robot_id: i64) -> RepoResult<bool> {
        let exists = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM FlyStore_line_order_history_vw WHERE RobotID = ?1
            );",
            [robot_id],
            |row| row.get::<_, i64>(0),
        )?;
        Ok(exists == 1)
    }

    fn orders_by_stock_name(&self) -> RepoResult<Vec<OrderRow>> {
        self.query_orders(
            "SELECT
                loh.stock_name,
                sf.Project,
                sf.Project_SubCat,
                loh.RobotID,
                sf.Genotype_GSI_Name_PlateWell,
                sf.Lab_ID,
                CAST(strftime('%Y', loh.date_filled) AS INTEGER) AS year,
                COUNT(1) AS orders
             FROM FlyStore_line_order_history_vw loh
             LEFT OUTER JOIN StockFinder sf ON sf.Stock_Name = loh.stock_name
             WHERE loh.stock_name IS NOT NULL
               AND loh.stock_name != ''
               AND loh.stock_name != 'KEEP EMPTY'
               AND strftime('%Y', loh.date_filled) IS NOT NULL
             GROUP BY 1, 2, 3, 4, 5, 6, 7
             ORDER BY 1, 7;",
        )
    }

    fn orders_by_robot_id(&self) -> RepoResult<Vec<OrderRow>> {
        self.query_orders(
            "SELECT
                loh.stock_name,
                sf.Project,
                sf.Project_SubCat,
                loh.RobotID,
                sf.Genotype_GSI_Name_PlateWell,
                sf.Lab_ID,
                CAST(strftime('%Y', loh.date_filled) AS INTEGER) AS year,
                COUNT(1) AS orders
             FROM FlyStore_line_order_history_vw loh
             LEFT OUTER JOIN StockFinder sf ON sf.RobotID = loh.RobotID
             WHERE strftime('%Y', loh.date_filled) IS NOT NULL
             GROUP BY 1, 2, 3, 4, 5, 6, 7
             ORDER BY 4, 7;",
        )
    }
}

impl SqliteStockRepository<'_> {
    fn query_orders(&self, sql: &str) -> RepoResult<Vec<OrderRow>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(OrderRow {
                    stock_name: row.get(0)?,
                    project: row.get(1)?,
                    subcat: row.get(2)?,
                    robot_id: row.get(3)?,
                    genotype: row.get(4)?,
                    lab_id: row.get(5)?,
                    year: row.get(6)?,
                    count: row.get(7)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

fn parse_rack_row(row: &Row<'_>) -> RepoResult<StockRackRecord> {
    let stock_id: i64 = row.get("stock_id")?;
    let last_flipped_a: Option<String> = row.get("last_flipped")?;
    let last_flipped_b: Option<String> = row.get("last_flipped_b")?;

    Ok(StockRackRecord {
        stock_id,
        genotype: row.get("genotype")?,
        rack_location_a: row.get("rack_location")?,
        rack_location_b: row.get("rack_location_b")?,
        cell_a: row.get("cell")?,
        cell_b: row.get("cell_b")?,
        last_flipped_a: parse_flip_date(stock_id, last_flipped_a.as_deref())?,
        last_flipped_b: parse_flip_date(stock_id, last_flipped_b.as_deref())?,
        rack_id_a: row.get("rack")?,
        rack_id_b: row.get("rack_b")?,
    })
}

fn parse_flip_date(stock_id: i64, value: Option<&str>) -> RepoResult<Option<NaiveDate>> {
    let Some(text) = value.map(str::trim).filter(|text| !text.is_empty()) else {
        return Ok(None);
    };
    let date_part = text.get(..10).unwrap_or(text);
    NaiveDate::parse_from_str(date_part, FLIP_DATE_FORMAT)
        .map(Some)
        .map_err(|err| {
            RepoError::InvalidData(format!(
                "stock {stock_id} has invalid flip date `{text}`: {err}"
            ))
        })
}
