//! Genetic line, split and publishing-name records.
//!
//! # Invariants
//! - Split genotypes name their parents as `<half>-x-<half>`.
//! - Initial split lines carry an `_IS<n>` or `_IL<n>` suffix component.

use super::{de_text_or_number, value_to_i64, value_to_text};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

/// Registry primary key for `line` rows.
pub type LineId = i64;

/// Separator between the two parents of a split genotype.
pub const SPLIT_HALF_SEPARATOR: &str = "-x-";

static INITIAL_SPLIT_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"_I[SL]\d+").expect("valid initial split regex"));
static LINE_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z0-9]+_").expect("valid line prefix regex"));
static IS_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"IS\d+").expect("valid IS number regex"));

/// One initial split cross as reported by the records service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Split {
    pub line: String,
    pub genotype: String,
    #[serde(default, deserialize_with = "de_text_or_number")]
    pub cross_barcode: String,
}

impl Split {
    /// Parent line names encoded in the genotype.
    pub fn halves(&self) -> Vec<&str> {
        self.genotype.split(SPLIT_HALF_SEPARATOR).collect()
    }
}

/// Image attached to a cross barcode, with the line it is currently linked to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrossImage {
    pub image_id: i64,
    pub line: String,
}

/// Returns whether `line` names an initial split (IS/IL) line.
pub fn is_initial_split_line(line: &str) -> bool {
    INITIAL_SPLIT_LINE_RE.is_match(line)
}

/// Returns whether `line` contains an `IS<n>` identifier anywhere.
pub fn has_initial_split_id(line: &str) -> bool {
    IS_NUMBER_RE.is_match(line)
}

/// Publishing name for a release line: the line name minus its lab prefix.
///
/// `JRC_IS12345` becomes `IS12345`.
pub fn publishing_name_for_line(line: &str) -> String {
    LINE_PREFIX_RE.replace(line, "").into_owned()
}

/// Short form of a line name used to decide the preferred publishing name.
///
/// Takes the second `_`-separated component when present; `IS<n>` names are
/// reported under their stable-split (`SS`) alias.
pub fn short_line_name(line: &str) -> String {
    let short = if line.contains('_') {
        line.split('_').nth(1).unwrap_or_default()
    } else {
        line
    };
    if IS_NUMBER_RE.is_match(short) {
        return short.replace("IS", "SS");
    }
    short.to_string()
}

/// Publishing-name row from the records service.
///
/// The service sends positional arrays:
/// `[parent_kp, serial, name, for_publishing, published, label, requester, notes, create_date]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishingNameRow {
    pub parent_kp: String,
    pub serial: i64,
    pub name: String,
    pub for_publishing: Option<String>,
    pub published: Option<String>,
    pub label: Option<String>,
    pub requester: Option<String>,
    pub notes: Option<String>,
    pub create_date: Option<String>,
}

impl PublishingNameRow {
    /// Decodes one positional row; returns a message describing the defect.
    pub fn from_values(values: &[Value]) -> Result<Self, String> {
        if values.len() < 9 {
            return Err(format!("expected 9 columns, got {}", values.len()));
        }
        let parent_kp = value_to_text(&values[0]).ok_or("missing parent KP")?;
        let serial = Self::serial_of(values)
            .ok_or_else(|| format!("invalid serial number {}", values[1]))?;
        Ok(Self {
            parent_kp,
            serial,
            name: value_to_text(&values[2]).unwrap_or_default(),
            for_publishing: value_to_text(&values[3]),
            published: value_to_text(&values[4]),
            label: value_to_text(&values[5]),
            requester: value_to_text(&values[6]),
            notes: value_to_text(&values[7]),
            create_date: value_to_text(&values[8]),
        })
    }

    /// Serial number of a positional row, readable even when other columns are not.
    pub fn serial_of(values: &[Value]) -> Option<i64> {
        values.get(1).and_then(value_to_i64)
    }

    /// Whether the name contains a carriage return or line feed.
    pub fn has_line_break(&self) -> bool {
        self.name.contains(['\r', '\n'])
    }
}

/// Normalized publishing-name write keyed on the records-service serial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcedPublishingName {
    pub line_id: LineId,
    pub source_id: i64,
    pub publishing_name: String,
    pub for_publishing: bool,
    pub published: bool,
    pub label: bool,
    pub requester: String,
    pub notes: String,
    pub source_create_date: String,
    pub preferred_name: bool,
}

impl SourcedPublishingName {
    /// Builds the registry write for `row` attached to `line`.
    pub fn from_row(row: &PublishingNameRow, line_id: LineId, line: &str) -> Self {
        Self {
            line_id,
            source_id: row.serial,
            publishing_name: row.name.clone(),
            for_publishing: yes_flag(row.for_publishing.as_deref()),
            published: yes_flag(row.published.as_deref()),
            label: yes_flag(row.label.as_deref()),
            requester: row.requester.clone().unwrap_or_default(),
            notes: row.notes.clone().unwrap_or_default(),
            source_create_date: row.create_date.clone().unwrap_or_default(),
            preferred_name: short_line_name(line) == row.name,
        }
    }
}

/// Registry publishing name that originated in the records service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcedNameEntry {
    pub id: i64,
    pub source_id: i64,
    pub line: String,
}

/// `Y`/`yes` style flags; anything else, including blanks, is false.
pub fn yes_flag(value: Option<&str>) -> bool {
    value
        .and_then(|text| text.chars().next())
        .is_some_and(|first| first.eq_ignore_ascii_case(&'y'))
}
