mod common;

use chrono::{Days, NaiveDate};
use common::stock_db;
use flysync_core::model::stock::{Quadrant, RackCopy, StockRackRecord};
use flysync_core::service::rack_service::{
    ignored_trays, plan_rack_updates, rack_candidates, IgnoreReason, RackService, RackUpdate,
};
use flysync_core::{NoProgress, SqliteStockRepository};
use pretty_assertions::assert_eq;
use rusqlite::{params, Connection};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
}

fn days_ago(days: u64) -> NaiveDate {
    today() - Days::new(days)
}

fn stock_a(stock_id: i64, location: &str, cell: i64, flipped: NaiveDate, rack: &str) -> StockRackRecord {
    StockRackRecord {
        stock_id,
        rack_location_a: Some(location.to_string()),
        cell_a: Some(cell),
        last_flipped_a: Some(flipped),
        rack_id_a: Some(rack.to_string()),
        ..StockRackRecord::default()
    }
}

#[test]
fn candidates_count_recent_flips_per_quadrant() {
    let stocks = [
        stock_a(1, "A.GR59.3.1", 3, days_ago(1), "0975"),
        stock_a(2, "A.GR59.3.2", 20, days_ago(10), "0975"),
        stock_a(3, "A.GR59.4.1", 30, days_ago(2), "1176"),
        stock_a(4, "A.GR59.3.3", 5, days_ago(11), "1176"),
    ];

    let candidates = rack_candidates(&stocks, today());

    let quadrant_a = &candidates[&("A.GR59".to_string(), Quadrant::A)];
    assert_eq!(quadrant_a.len(), 1);
    assert_eq!(quadrant_a[0].rack_id, "0975");
    assert_eq!(quadrant_a[0].count, 2);
    assert_eq!(candidates[&("A.GR59".to_string(), Quadrant::B)][0].rack_id, "1176");
}

#[test]
fn stale_and_freshly_flipped_trays_are_ignored() {
    let stocks = [
        stock_a(1, "A.GR01.1.1", 1, days_ago(200), "0001"),
        stock_a(2, "A.GR02.1.1", 1, today(), "0002"),
        stock_a(3, "A.GR03.1.1", 1, days_ago(3), "0003"),
    ];

    let ignored = ignored_trays(&stocks, today());

    assert_eq!(ignored.len(), 2);
    assert_eq!(ignored["A.GR01"], IgnoreReason::NoRecentFlips);
    assert_eq!(ignored["A.GR02"], IgnoreReason::FlippedToday);
}

#[test]
fn majority_rack_is_applied_only_with_a_strict_lead() {
    let mut stale = stock_a(4, "A.GR59.3.4", 6, days_ago(40), "1176");
    stale.rack_location_b = Some("B.GR60.1.1".to_string());
    stale.cell_b = Some(50);
    stale.last_flipped_b = Some(days_ago(40));
    stale.rack_id_b = Some("2000".to_string());
    let stocks = [
        stock_a(1, "A.GR59.3.1", 1, days_ago(1), "0975"),
        stock_a(2, "A.GR59.3.2", 2, days_ago(2), "0975"),
        stock_a(3, "A.GR59.3.3", 3, days_ago(3), "1176"),
        stale,
        stock_a(5, "B.GR59.3.1", 4, days_ago(1), "0975"),
        stock_a(6, "A.GR61.1.1", 80, days_ago(1), "3000"),
        stock_a(7, "A.GR61.1.2", 81, days_ago(2), "3001"),
    ];

    let updates = plan_rack_updates(&stocks, today());

    assert_eq!(
        updates,
        vec![
            RackUpdate {
                stock_id: 3,
                copy: RackCopy::A,
                from: Some("1176".to_string()),
                to: "0975".to_string(),
            },
            RackUpdate {
                stock_id: 4,
                copy: RackCopy::A,
                from: Some("1176".to_string()),
                to: "0975".to_string(),
            },
        ]
    );
}

fn add_flipper_stock(conn: &Connection, stock_id: i64, cell: i64, flipped: &str, rack: &str) {
    conn.execute(
        "INSERT INTO __flipper_flystocks_stock (stock_id, rack_location, cell, last_flipped, rack)
         VALUES (?1, 'A.GR70.1.1', ?2, ?3, ?4);",
        params![stock_id, cell, flipped, rack],
    )
    .unwrap();
}

#[test]
fn service_writes_planned_rack_ids() {
    let conn = stock_db();
    add_flipper_stock(&conn, 1, 1, "2024-06-14 09:30:00", "0975");
    add_flipper_stock(&conn, 2, 2, "2024-06-13", "0975");
    add_flipper_stock(&conn, 3, 3, "2024-06-12", "1176");

    let report = RackService::new(SqliteStockRepository::new(&conn))
        .run(today(), &NoProgress)
        .unwrap();

    assert_eq!(report.stocks, 3);
    assert_eq!(report.updates, 1);
    let rack: String = conn
        .query_row(
            "SELECT rack FROM __flipper_flystocks_stock WHERE stock_id = 3;",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(rack, "0975");
}
