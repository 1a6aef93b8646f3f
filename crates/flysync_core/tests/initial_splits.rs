mod common;

use common::{add_child_of, add_image, add_line, add_property, count, registry_db, split, FakeImaging, FakeRecords};
use flysync_core::repo::registry_repo::LineRepository;
use flysync_core::service::initial_split_service::{
    InitialSplitService, ReleaseNameReport, ReleaseNameService, SplitSyncOptions, SplitSyncReport,
};
use flysync_core::{NoProgress, SqliteRegistryRepository};
use pretty_assertions::assert_eq;
use rusqlite::Connection;
use std::collections::HashMap;

fn property(conn: &Connection, line: &str, term: &str) -> Option<String> {
    conn.query_row(
        "SELECT lp.value FROM line_property lp
         JOIN line l ON l.id = lp.line_id
         JOIN cv_term t ON t.id = lp.type_id
         WHERE l.name = ?1 AND t.name = ?2;",
        [line, term],
        |row| row.get(0),
    )
    .ok()
}

#[test]
fn new_splits_are_inserted_with_parents_and_properties() {
    let conn = registry_db();
    let half1 = add_line(&conn, "JRC_HALF1");
    let half2 = add_line(&conn, "JRC_HALF2");
    let existing = add_line(&conn, "JRC_IS00004");
    add_child_of(&conn, existing, half1);
    add_child_of(&conn, existing, half2);
    let records = FakeRecords {
        splits: vec![
            split("JRC_IS00001", "JRC_HALF1-x-JRC_HALF2"),
            split("JRC_IS00002", "JRC_HALF1-x-JRC_NOPE"),
            split("JRC_IS00003", "JRC_HALF1-x-JRC_HALF1"),
            split("JRC_IS00004", "JRC_HALF1-x-JRC_HALF2"),
        ],
        ..FakeRecords::default()
    };

    let report = InitialSplitService::new(SqliteRegistryRepository::new(&conn), records)
        .run(&SplitSyncOptions::default(), &NoProgress)
        .unwrap();

    assert_eq!(
        report,
        SplitSyncReport {
            splits: 4,
            read: 3,
            inserted: 1,
            skipped: 0,
            errors: 2
        }
    );
    let repo = SqliteRegistryRepository::new(&conn);
    assert_eq!(repo.parent_ids("JRC_IS00001").unwrap(), vec![half1, half2]);
    assert_eq!(property(&conn, "JRC_IS00001", "hide").as_deref(), Some("Y"));
    assert_eq!(
        property(&conn, "JRC_IS00001", "flycore_project_subcat").as_deref(),
        Some("InitialSplits")
    );
    assert_eq!(
        property(&conn, "JRC_IS00001", "flycore_alias").as_deref(),
        Some("JRC_HALF1-x-JRC_HALF2")
    );
    assert_eq!(repo.find_line_id("JRC_IS00002").unwrap(), None);
}

#[test]
fn all_flag_repairs_existing_parents() {
    let conn = registry_db();
    let half1 = add_line(&conn, "JRC_HALF1");
    let half2 = add_line(&conn, "JRC_HALF2");
    let wrong = add_line(&conn, "JRC_HALF3");
    let stale = add_line(&conn, "JRC_IS00005");
    add_child_of(&conn, stale, half1);
    add_child_of(&conn, stale, wrong);
    add_property(&conn, stale, "flycore_alias", "JRC_HALF1-x-JRC_HALF3");
    let good = add_line(&conn, "JRC_IS00006");
    add_child_of(&conn, good, half2);
    add_child_of(&conn, good, half1);
    let records = FakeRecords {
        splits: vec![
            split("JRC_IS00005", "JRC_HALF2-x-JRC_HALF1"),
            split("JRC_IS00006", "JRC_HALF1-x-JRC_HALF2"),
        ],
        ..FakeRecords::default()
    };
    let options = SplitSyncOptions {
        line: None,
        all: true,
    };

    let report = InitialSplitService::new(SqliteRegistryRepository::new(&conn), records)
        .run(&options, &NoProgress)
        .unwrap();

    assert_eq!(report.read, 2);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.errors, 0);
    let repo = SqliteRegistryRepository::new(&conn);
    assert_eq!(repo.parent_ids("JRC_IS00005").unwrap(), vec![half1, half2]);
    assert_eq!(
        property(&conn, "JRC_IS00005", "flycore_alias").as_deref(),
        Some("JRC_HALF2-x-JRC_HALF1")
    );
}

#[test]
fn line_option_limits_the_sync_to_one_split() {
    let conn = registry_db();
    add_line(&conn, "JRC_HALF1");
    add_line(&conn, "JRC_HALF2");
    let records = FakeRecords {
        splits: vec![
            split("JRC_IS00007", "JRC_HALF1-x-JRC_HALF2"),
            split("JRC_IS00008", "JRC_HALF1-x-JRC_HALF2"),
        ],
        ..FakeRecords::default()
    };
    let options = SplitSyncOptions {
        line: Some("JRC_IS00008".to_string()),
        all: false,
    };

    let report = InitialSplitService::new(SqliteRegistryRepository::new(&conn), records)
        .run(&options, &NoProgress)
        .unwrap();

    assert_eq!(report.splits, 1);
    assert_eq!(report.inserted, 1);
    assert_eq!(count(&conn, "SELECT COUNT(1) FROM line WHERE name = 'JRC_IS00007';"), 0);
}

#[test]
fn release_lines_receive_publishing_names() {
    let conn = registry_db();
    let first = add_line(&conn, "JRC_IS10001");
    let named = add_line(&conn, "JRC_IL10003");
    conn.execute(
        "INSERT INTO publishing_name (line_id, publishing_name) VALUES (?1, 'IL10003');",
        [named],
    )
    .unwrap();
    let image = add_image(&conn, first, "image_1", None);
    conn.execute(
        "INSERT INTO image_property (image_id, type, value) VALUES (?1, 'alps_release', 'Split release 1');",
        [image],
    )
    .unwrap();
    let imaging = FakeImaging {
        releases: HashMap::from([(
            "Split release 1".to_string(),
            ["Sample#100", "Sample#101", "Sample#102", "Sample#103", "Sample#104"]
                .iter()
                .map(|sample| sample.to_string())
                .collect(),
        )]),
        sample_lines: HashMap::from([
            ("100".to_string(), "JRC_IS10001".to_string()),
            ("101".to_string(), "JRC_IS10002".to_string()),
            ("102".to_string(), "GMR_12A01".to_string()),
            ("103".to_string(), "JRC_IL10003".to_string()),
            ("104".to_string(), "JRC_IS10001".to_string()),
        ]),
    };
    let service = ReleaseNameService::new(SqliteRegistryRepository::new(&conn), imaging);

    assert_eq!(service.available_releases().unwrap(), vec!["Split release 1"]);
    let report = service.run("Split release 1", &NoProgress).unwrap();

    assert_eq!(
        report,
        ReleaseNameReport {
            lines: 3,
            inserted: 1,
            errors: 1
        }
    );
    let (name, notes, preferred): (String, String, i64) = conn
        .query_row(
            "SELECT publishing_name, notes, preferred_name FROM publishing_name WHERE line_id = ?1;",
            [first],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .unwrap();
    assert_eq!(name, "IS10001");
    assert_eq!(notes, "Split release 1");
    assert_eq!(preferred, 1);
}
