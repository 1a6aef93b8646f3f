//! Tab-separated row input for the line and cross repair jobs.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("failed to open input `{}`: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read input: {0}")]
    Read(#[from] std::io::Error),
    #[error("you must either specify a file or pass data in through STDIN")]
    NoInput,
}

/// Reads rows from `reader`, trimming trailing whitespace and dropping blank rows.
pub fn read_rows(reader: impl Read) -> Result<Vec<String>, InputError> {
    let mut rows = Vec::new();
    for line in BufReader::new(reader).lines() {
        let line = line?;
        let row = line.trim_end();
        if !row.is_empty() {
            rows.push(row.to_string());
        }
    }
    Ok(rows)
}

pub fn read_rows_from_file(path: &Path) -> Result<Vec<String>, InputError> {
    let file = File::open(path).map_err(|source| InputError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    read_rows(file)
}

/// Splits a row into its tab-separated fields.
pub fn fields(row: &str) -> Vec<&str> {
    row.split('\t').collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_trimmed_and_blank_rows_dropped() {
        let rows = read_rows("JRC_1\tJRC_2 \r\n\n  \nJRC_3\n".as_bytes()).unwrap();
        assert_eq!(rows, vec!["JRC_1\tJRC_2", "JRC_3"]);
        assert_eq!(fields(&rows[0]), vec!["JRC_1", "JRC_2"]);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = read_rows_from_file(Path::new("/nonexistent/rows.txt")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/rows.txt"));
    }
}
