//! JACS imaging service: release samples and the lines they were imaged from.

use super::{endpoint_url, RestClient, RestError, RestResult};
use serde::Deserialize;

/// Read-only view of the imaging service.
pub trait ImagingService {
    /// Sample references (`Sample#<id>`) belonging to a release.
    fn release_samples(&self, release: &str) -> RestResult<Vec<String>>;
    /// Line a sample was imaged from, if the service reports one.
    fn sample_line(&self, sample_id: &str) -> RestResult<Option<String>>;
}

#[derive(Debug, Deserialize)]
struct ReleaseEntry {
    #[serde(default)]
    children: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SampleEntry {
    line: Option<String>,
}

/// Strips the `Sample#` reference prefix.
pub fn sample_id(reference: &str) -> &str {
    reference.strip_prefix("Sample#").unwrap_or(reference)
}

/// HTTP implementation of [`ImagingService`].
pub struct JacsClient {
    rest: RestClient,
    base_url: String,
}

impl JacsClient {
    pub fn new(rest: RestClient, base_url: impl Into<String>) -> Self {
        Self {
            rest,
            base_url: base_url.into(),
        }
    }
}

impl ImagingService for JacsClient {
    fn release_samples(&self, release: &str) -> RestResult<Vec<String>> {
        let url = endpoint_url(&self.base_url, &format!("process/release/{release}"));
        let entries: Vec<ReleaseEntry> = self.rest.get_json(&url)?;
        let first = entries.into_iter().next().ok_or_else(|| RestError::Parse {
            url,
            message: "release has no process entry".to_string(),
        })?;
        Ok(first.children)
    }

    fn sample_line(&self, sample_id: &str) -> RestResult<Option<String>> {
        let url = endpoint_url(&self.base_url, &format!("data/sample?sampleId={sample_id}"));
        let entries: Vec<SampleEntry> = self.rest.get_json(&url)?;
        Ok(entries.into_iter().next().and_then(|entry| entry.line))
    }
}
