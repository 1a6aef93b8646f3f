mod common;

use common::stock_db;
use flysync_core::service::order_report_service::{
    report_header, report_rows, write_xlsx, xlsx_bytes, OrderReportService, ReportCell,
};
use flysync_core::SqliteStockRepository;
use pretty_assertions::assert_eq;
use rusqlite::{params, Connection};

fn seed(conn: &Connection) {
    conn.execute_batch(
        "INSERT INTO StockFinder (__kp_UniqueID, RobotID, Stock_Name, Project, Project_SubCat, Genotype_GSI_Name_PlateWell, Lab_ID)
         VALUES
            (1, 5001, 'SS00001', 'Split_GAL4', 'Published', 'R1-x-R2', 'FL1'),
            (2, 5002, 'SS00002', 'Split_GAL4', NULL, 'R3-x-R4', 'FL2'),
            (3, 5003, 'GMR_12A01', 'Gal4', NULL, 'R12A01', 'FL3');",
    )
    .unwrap();
    let orders: [(Option<&str>, i64, &str); 7] = [
        (Some("SS00001"), 5001, "2022-03-01"),
        (Some("SS00001"), 5001, "2022-08-11"),
        (Some("SS00001"), 5001, "2024-01-05"),
        (Some("SS00002"), 5002, "2023-02-02"),
        (Some("KEEP EMPTY"), 5003, "2023-05-05"),
        (None, 5003, "2021-05-05"),
        (Some("SS00002"), 5002, ""),
    ];
    for (stock_name, robot_id, date_filled) in orders {
        conn.execute(
            "INSERT INTO FlyStore_line_order_history (stock_name, RobotID, date_filled) VALUES (?1, ?2, NULLIF(?3, ''));",
            params![stock_name, robot_id, date_filled],
        )
        .unwrap();
    }
}

#[test]
fn report_by_stock_name_pivots_years() {
    let conn = stock_db();
    seed(&conn);

    let report = OrderReportService::new(SqliteStockRepository::new(&conn))
        .run(None, 2024)
        .unwrap();

    assert_eq!(report.pivot.first_year, 2022);
    assert_eq!(
        report_header(&report.pivot),
        vec!["Stock", "RobotID", "Project", "SubCat", "Genotype", "Lab ID", "2022", "2023", "2024", "Total"]
    );
    let rows: Vec<Vec<String>> = report_rows(&report.pivot)
        .into_iter()
        .map(|cells| cells.iter().map(cell_text).collect())
        .collect();
    assert_eq!(
        rows,
        vec![
            vec!["SS00001", "5001", "Split_GAL4", "Published", "R1-x-R2", "FL1", "2", "0", "1", "3"],
            vec!["SS00002", "5002", "Split_GAL4", "", "R3-x-R4", "FL2", "0", "1", "0", "1"],
        ]
    );
}

fn cell_text(cell: &ReportCell) -> String {
    match cell {
        ReportCell::Text(text) => text.clone(),
        ReportCell::Number(value) => value.to_string(),
        ReportCell::Empty => String::new(),
    }
}

#[test]
fn control_characters_stay_inside_one_cell() {
    let conn = stock_db();
    conn.execute(
        "INSERT INTO StockFinder (__kp_UniqueID, RobotID, Stock_Name, Project, Project_SubCat, Genotype_GSI_Name_PlateWell, Lab_ID)
         VALUES (1, 5001, 'SS00001', 'Split_GAL4', NULL, ?1, 'FL1');",
        ["R1\tR2\nR3"],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO FlyStore_line_order_history (stock_name, RobotID, date_filled)
         VALUES ('SS00001', 5001, '2024-01-05');",
        [],
    )
    .unwrap();

    let report = OrderReportService::new(SqliteStockRepository::new(&conn))
        .run(None, 2024)
        .unwrap();

    let rows = report_rows(&report.pivot);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].len(), report_header(&report.pivot).len());
    assert_eq!(rows[0][4], ReportCell::Text("R1\tR2\nR3".to_string()));

    let bytes = xlsx_bytes(&report.pivot).unwrap();
    assert!(bytes.starts_with(b"PK"));
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("flystore_order_report.xlsx");
    write_xlsx(&report.pivot, &path).unwrap();
    assert!(std::fs::metadata(&path).unwrap().len() > 0);
}

#[test]
fn report_by_robot_id_keeps_only_listed_ids_with_orders() {
    let conn = stock_db();
    seed(&conn);
    let robot_ids: Vec<String> = ["5003", "5003 ", "9999", "abc"]
        .iter()
        .map(|id| id.to_string())
        .collect();

    let report = OrderReportService::new(SqliteStockRepository::new(&conn))
        .run(Some(robot_ids.as_slice()), 2024)
        .unwrap();

    assert_eq!(report.robot_ids_read, 3);
    assert_eq!(report.robot_ids_kept, 1);
    assert_eq!(report.pivot.first_year, 2021);
    let stocks: Vec<_> = report
        .pivot
        .stocks
        .iter()
        .map(|stock| (stock.stock.as_str(), report.pivot.total(stock)))
        .collect();
    assert_eq!(stocks, vec![("5003", 1), ("KEEP EMPTY", 1)]);
}
