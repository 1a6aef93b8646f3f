#![allow(dead_code)]

use flysync_core::model::line::Split;
use flysync_core::rest::{
    ConfigService, DoiSource, ImagingService, ImportOutcome, RecordsService, RestError, RestResult,
};
use flysync_core::{open_db_in_memory, DatabaseKind};
use rusqlite::{params, Connection};
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;

pub fn registry_db() -> Connection {
    open_db_in_memory(DatabaseKind::Registry).unwrap()
}

pub fn stock_db() -> Connection {
    open_db_in_memory(DatabaseKind::Stock).unwrap()
}

pub fn add_line(conn: &Connection, name: &str) -> i64 {
    conn.execute("INSERT INTO line (name) VALUES (?1);", [name])
        .unwrap();
    conn.last_insert_rowid()
}

pub fn add_image(conn: &Connection, line_id: i64, name: &str, cross_barcode: Option<&str>) -> i64 {
    conn.execute(
        "INSERT INTO image (line_id, name, cross_barcode) VALUES (?1, ?2, ?3);",
        params![line_id, name, cross_barcode],
    )
    .unwrap();
    conn.last_insert_rowid()
}

pub fn add_property(conn: &Connection, line_id: i64, term: &str, value: &str) {
    conn.execute(
        "INSERT INTO line_property (line_id, type_id, value)
         VALUES (?1, (SELECT id FROM cv_term WHERE cv = 'line' AND name = ?2), ?3);",
        params![line_id, term, value],
    )
    .unwrap();
}

pub fn add_child_of(conn: &Connection, child: i64, parent: i64) {
    conn.execute(
        "INSERT INTO line_relationship (subject_id, object_id, type_id)
         VALUES (?1, ?2, (SELECT id FROM cv_term WHERE cv = 'line_relationship' AND name = 'child_of'));",
        params![child, parent],
    )
    .unwrap();
}

pub fn count(conn: &Connection, sql: &str) -> i64 {
    conn.query_row(sql, [], |row| row.get(0)).unwrap()
}

/// In-memory Fly Core.
#[derive(Default)]
pub struct FakeRecords {
    pub named_stocks: HashMap<String, String>,
    pub publishing_names: Vec<Vec<Value>>,
    pub splits: Vec<Split>,
    pub known_kps: HashSet<i64>,
    pub dois: Vec<String>,
}

impl RecordsService for FakeRecords {
    fn named_stocks(&self) -> RestResult<HashMap<String, String>> {
        Ok(self.named_stocks.clone())
    }

    fn publishing_names(&self) -> RestResult<Vec<Vec<Value>>> {
        Ok(self.publishing_names.clone())
    }

    fn initial_splits(&self, line: Option<&str>) -> RestResult<Vec<Split>> {
        Ok(self
            .splits
            .iter()
            .filter(|split| line.map_or(true, |line| split.line == line))
            .cloned()
            .collect())
    }

    fn has_line_data(&self, kp_id: i64) -> RestResult<bool> {
        Ok(self.known_kps.contains(&kp_id))
    }

    fn doi_list(&self) -> RestResult<Vec<String>> {
        Ok(self.dois.clone())
    }
}

pub fn split(line: &str, genotype: &str) -> Split {
    Split {
        line: line.to_string(),
        genotype: genotype.to_string(),
        cross_barcode: "3001".to_string(),
    }
}

/// In-memory imaging service: release -> sample references, sample id -> line.
#[derive(Default)]
pub struct FakeImaging {
    pub releases: HashMap<String, Vec<String>>,
    pub sample_lines: HashMap<String, String>,
}

impl ImagingService for FakeImaging {
    fn release_samples(&self, release: &str) -> RestResult<Vec<String>> {
        Ok(self.releases.get(release).cloned().unwrap_or_default())
    }

    fn sample_line(&self, sample_id: &str) -> RestResult<Option<String>> {
        Ok(self.sample_lines.get(sample_id).cloned())
    }
}

/// Crossref/DataCite fake; queued Crossref replies are served before the fixed ones.
#[derive(Default)]
pub struct FakeDoiSource {
    pub crossref: HashMap<String, Value>,
    pub crossref_queue: RefCell<VecDeque<Value>>,
    pub datacite: HashMap<String, Value>,
    pub crossref_calls: Rc<Cell<u32>>,
}

impl DoiSource for FakeDoiSource {
    fn crossref_message(&self, doi: &str) -> RestResult<Value> {
        self.crossref_calls.set(self.crossref_calls.get() + 1);
        if let Some(message) = self.crossref_queue.borrow_mut().pop_front() {
            return Ok(message);
        }
        self.crossref.get(doi).cloned().ok_or_else(|| RestError::Status {
            status: 404,
            url: format!("https://api.crossref.org/works/{doi}"),
            message: "Resource not found.".to_string(),
        })
    }

    fn datacite_attributes(&self, doi: &str) -> RestResult<Value> {
        Ok(self.datacite.get(doi).cloned().unwrap_or(Value::Null))
    }
}

/// Config service fake recording uploads; DOIs in `rejected` answer with a 400.
#[derive(Clone, Default)]
pub struct FakeConfigService {
    pub stored: HashMap<String, Value>,
    pub rejected: HashSet<String>,
    pub uploads: Rc<RefCell<Vec<String>>>,
}

impl ConfigService for FakeConfigService {
    fn stored_doi(&self, doi: &str) -> RestResult<Option<Value>> {
        Ok(self.stored.get(doi).cloned())
    }

    fn import_doi(&self, doi: &str, _document: &Value) -> RestResult<ImportOutcome> {
        if self.rejected.contains(doi) {
            return Err(RestError::Status {
                status: 400,
                url: format!("importjson/dois/{doi}"),
                message: "bad document".to_string(),
            });
        }
        self.uploads.borrow_mut().push(doi.to_string());
        let outcome = if self.stored.contains_key(doi) {
            ImportOutcome {
                inserted: 0,
                updated: 1,
            }
        } else {
            ImportOutcome {
                inserted: 1,
                updated: 0,
            }
        };
        Ok(outcome)
    }
}
