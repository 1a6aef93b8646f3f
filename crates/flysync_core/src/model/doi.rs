//! DOI records and bibliographic metadata extraction.

use deunicode::deunicode;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static DOI_SEPARATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\|\s*").expect("valid DOI separator regex"));

/// Placeholder year when a record carries no usable date.
pub const UNKNOWN_DATE: &str = "unknown";

/// Row of the stock system's `doi_data` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoiRecord {
    pub doi: String,
    pub title: String,
    pub first_author: String,
    pub publication_date: String,
}

/// Title, first author surname and publication year pulled from a metadata document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoiMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub date: String,
}

/// Splits a raw `|`-separated DOI field into individual DOIs.
pub fn split_raw_doi(raw: &str) -> Vec<String> {
    DOI_SEPARATOR_RE
        .split(raw.trim())
        .filter(|doi| !doi.is_empty())
        .map(str::to_string)
        .collect()
}

/// Placeholder entries for manuscripts that have no DOI yet.
pub fn is_in_prep(doi: &str) -> bool {
    doi.contains("in prep")
}

/// Janelia-minted DOIs are registered with DataCite, not Crossref.
pub fn is_janelia_doi(doi: &str) -> bool {
    doi.contains("janelia")
}

/// Whether a Crossref `message` has both title and author blocks.
pub fn crossref_is_complete(message: &Value) -> bool {
    message.get("title").is_some() && message.get("author").is_some()
}

/// Extracts metadata from a Crossref works `message`.
pub fn crossref_metadata(message: &Value) -> DoiMetadata {
    let title = message
        .pointer("/title/0")
        .and_then(Value::as_str)
        .map(str::to_string);
    let author = message
        .pointer("/author/0/family")
        .and_then(Value::as_str)
        .map(str::to_string);
    DoiMetadata {
        title,
        author,
        date: crossref_year(message),
    }
}

fn crossref_year(message: &Value) -> String {
    ["published-print", "published-online", "posted"]
        .iter()
        .find_map(|key| message.get(*key))
        .and_then(|block| block.pointer("/date-parts/0/0"))
        .and_then(|year| match year {
            Value::Number(number) => Some(number.to_string()),
            Value::String(text) => Some(text.clone()),
            _ => None,
        })
        .unwrap_or_else(|| UNKNOWN_DATE.to_string())
}

/// Extracts metadata from DataCite record `attributes`.
pub fn datacite_metadata(attributes: &Value) -> DoiMetadata {
    let title = attributes
        .pointer("/titles/0/title")
        .and_then(Value::as_str)
        .map(str::to_string);
    let author = attributes
        .pointer("/creators/0/familyName")
        .and_then(Value::as_str)
        .map(str::to_string);
    let date = match attributes.get("publicationYear") {
        Some(Value::Number(number)) => number.to_string(),
        Some(Value::String(text)) => text.clone(),
        _ => UNKNOWN_DATE.to_string(),
    };
    DoiMetadata {
        title,
        author,
        date,
    }
}

/// `indexed.timestamp` of a Crossref message or stored config document.
pub fn indexed_timestamp(document: &Value) -> Option<&Value> {
    document.pointer("/indexed/timestamp")
}

/// ASCII transliteration used for titles stored in `doi_data`.
pub fn ascii_title(title: &str) -> String {
    deunicode(title)
}
