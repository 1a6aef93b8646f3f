mod common;

use common::{add_line, count, registry_db, FakeRecords};
use flysync_core::service::publishing_name_service::{PublishingNameReport, PublishingNameService};
use flysync_core::{NoProgress, SqliteRegistryRepository};
use pretty_assertions::assert_eq;
use rusqlite::{params, Connection};
use serde_json::{json, Value};
use std::collections::HashMap;

fn add_sourced_name(conn: &Connection, line_id: i64, source_id: i64, name: &str) {
    conn.execute(
        "INSERT INTO publishing_name (line_id, source_id, publishing_name) VALUES (?1, ?2, ?3);",
        params![line_id, source_id, name],
    )
    .unwrap();
}

fn name_row(kp: &str, serial: i64, name: &str, for_publishing: &str) -> Vec<Value> {
    vec![
        json!(kp),
        json!(serial),
        json!(name),
        json!(for_publishing),
        json!("yes"),
        Value::Null,
        json!("alice"),
        Value::Null,
        json!("2020-01-01"),
    ]
}

#[test]
fn publishing_names_are_upserted_and_stale_ones_deleted() {
    let conn = registry_db();
    let ss1 = add_line(&conn, "JRC_SS00001");
    let ss2 = add_line(&conn, "JRC_SS00002");
    let is5 = add_line(&conn, "JRC_IS00005");
    add_sourced_name(&conn, ss1, 12, "MB001");
    add_sourced_name(&conn, ss2, 99, "OLD99");
    add_sourced_name(&conn, is5, 98, "IS00005");
    let records = FakeRecords {
        named_stocks: HashMap::from([
            ("kp1".to_string(), "JRC_SS00001".to_string()),
            ("kp2".to_string(), "JRC_SS00002".to_string()),
            ("kp3".to_string(), "JRC_IS00003".to_string()),
        ]),
        publishing_names: vec![
            name_row("kp1", 11, "SS00001", "Y"),
            name_row("kp1", 12, "MB001", "N"),
            name_row("kp2", 13, "JRC_SS00002", "Y"),
            name_row("kp9", 14, "X", "Y"),
            name_row("kp2", 15, "bad\nname", "Y"),
            name_row("kp3", 16, "IS3", "Y"),
            vec![json!("kp1"), json!(17)],
        ],
        ..FakeRecords::default()
    };

    let report = PublishingNameService::new(SqliteRegistryRepository::new(&conn), records)
        .run(&NoProgress)
        .unwrap();

    assert_eq!(
        report,
        PublishingNameReport {
            read: 7,
            inserted: 1,
            updated: 1,
            deleted: 1,
            skipped: 2,
            errors: 3
        }
    );
    let (for_publishing, published, label, requester, preferred): (i64, i64, i64, String, i64) =
        conn.query_row(
            "SELECT for_publishing, published, label, requester, preferred_name
             FROM publishing_name WHERE source_id = 11;",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
        )
        .unwrap();
    assert_eq!((for_publishing, published, label), (1, 1, 0));
    assert_eq!(requester, "alice");
    assert_eq!(preferred, 1);
    assert_eq!(
        count(&conn, "SELECT preferred_name FROM publishing_name WHERE source_id = 12;"),
        0
    );
    assert_eq!(count(&conn, "SELECT COUNT(1) FROM publishing_name WHERE source_id = 99;"), 0);
    assert_eq!(count(&conn, "SELECT COUNT(1) FROM publishing_name WHERE source_id = 98;"), 1);
}

fn run(conn: &Connection, records: FakeRecords) -> PublishingNameReport {
    PublishingNameService::new(SqliteRegistryRepository::new(conn), records)
        .run(&NoProgress)
        .unwrap()
}

fn kp1_stock() -> HashMap<String, String> {
    HashMap::from([("kp1".to_string(), "JRC_SS00001".to_string())])
}

#[test]
fn unsourced_name_on_the_line_takes_the_serial() {
    let conn = registry_db();
    let ss1 = add_line(&conn, "JRC_SS00001");
    conn.execute(
        "INSERT INTO publishing_name (line_id, publishing_name, notes, preferred_name)
         VALUES (?1, 'SS00001', 'ALPS 2024', 1);",
        [ss1],
    )
    .unwrap();
    let records = FakeRecords {
        named_stocks: kp1_stock(),
        publishing_names: vec![name_row("kp1", 11, "SS00001", "Y")],
        ..FakeRecords::default()
    };

    let report = run(&conn, records);

    assert_eq!((report.inserted, report.updated), (0, 1));
    assert_eq!(count(&conn, "SELECT COUNT(1) FROM publishing_name;"), 1);
    let (source_id, requester): (i64, String) = conn
        .query_row(
            "SELECT source_id, requester FROM publishing_name WHERE publishing_name = 'SS00001';",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(source_id, 11);
    assert_eq!(requester, "alice");
}

#[test]
fn renamed_serial_moves_onto_the_existing_name() {
    let conn = registry_db();
    let ss1 = add_line(&conn, "JRC_SS00001");
    add_sourced_name(&conn, ss1, 11, "MB001");
    conn.execute(
        "INSERT INTO publishing_name (line_id, publishing_name) VALUES (?1, 'MB002');",
        [ss1],
    )
    .unwrap();
    let records = FakeRecords {
        named_stocks: kp1_stock(),
        publishing_names: vec![name_row("kp1", 11, "MB002", "Y")],
        ..FakeRecords::default()
    };

    let report = run(&conn, records);

    assert_eq!(report.updated, 1);
    assert_eq!(count(&conn, "SELECT COUNT(1) FROM publishing_name;"), 1);
    assert_eq!(
        count(&conn, "SELECT COUNT(1) FROM publishing_name WHERE source_id = 11 AND publishing_name = 'MB002';"),
        1
    );
}

#[test]
fn same_name_twice_on_a_line_is_rejected_by_the_schema() {
    let conn = registry_db();
    let ss1 = add_line(&conn, "JRC_SS00001");
    add_sourced_name(&conn, ss1, 11, "MB001");

    let duplicate = conn.execute(
        "INSERT INTO publishing_name (line_id, publishing_name) VALUES (?1, 'MB001');",
        [ss1],
    );
    assert!(duplicate.is_err());
    assert!(conn.execute("INSERT INTO line (name) VALUES ('JRC_SS00001');", []).is_err());
}

#[test]
fn undecodable_row_still_protects_its_serial() {
    let conn = registry_db();
    let ss1 = add_line(&conn, "JRC_SS00001");
    add_sourced_name(&conn, ss1, 11, "MB001");
    let records = FakeRecords {
        named_stocks: kp1_stock(),
        publishing_names: vec![vec![json!("kp1"), json!(11), json!("MB001")]],
        ..FakeRecords::default()
    };

    let report = run(&conn, records);

    assert_eq!((report.errors, report.deleted), (1, 0));
    assert_eq!(count(&conn, "SELECT COUNT(1) FROM publishing_name WHERE source_id = 11;"), 1);
}

#[test]
fn row_without_serial_disables_deletion() {
    let conn = registry_db();
    let ss1 = add_line(&conn, "JRC_SS00001");
    add_sourced_name(&conn, ss1, 11, "MB001");
    let records = FakeRecords {
        named_stocks: kp1_stock(),
        publishing_names: vec![vec![json!("kp1"), Value::Null]],
        ..FakeRecords::default()
    };

    let report = run(&conn, records);

    assert_eq!((report.errors, report.deleted), (1, 0));
    assert_eq!(count(&conn, "SELECT COUNT(1) FROM publishing_name;"), 1);
}
