//! Crossref and DataCite metadata lookups.

use super::{endpoint_url, RestClient, RestError, RestResult};
use serde_json::Value;

/// Source of bibliographic metadata for DOIs.
pub trait DoiSource {
    /// The `message` object of a Crossref works record.
    fn crossref_message(&self, doi: &str) -> RestResult<Value>;
    /// The `data.attributes` object of a DataCite record.
    fn datacite_attributes(&self, doi: &str) -> RestResult<Value>;
}

/// HTTP implementation of [`DoiSource`].
pub struct DoiClient {
    rest: RestClient,
    crossref_url: String,
    crossref_mailto: String,
    datacite_url: String,
}

impl DoiClient {
    pub fn new(
        rest: RestClient,
        crossref_url: impl Into<String>,
        crossref_mailto: impl Into<String>,
        datacite_url: impl Into<String>,
    ) -> Self {
        Self {
            rest,
            crossref_url: crossref_url.into(),
            crossref_mailto: crossref_mailto.into(),
            datacite_url: datacite_url.into(),
        }
    }
}

impl DoiSource for DoiClient {
    fn crossref_message(&self, doi: &str) -> RestResult<Value> {
        let url = format!("{}/works/{doi}", self.crossref_url.trim_end_matches('/'));
        let headers = [("mailto", self.crossref_mailto.as_str())];
        let mut record: Value = self.rest.get_json_with_headers(&url, &headers)?;
        match record.get_mut("message") {
            Some(message) => Ok(message.take()),
            None => Err(RestError::Parse {
                url,
                message: "Crossref record has no message".to_string(),
            }),
        }
    }

    fn datacite_attributes(&self, doi: &str) -> RestResult<Value> {
        let url = endpoint_url(&self.datacite_url, doi);
        let mut record: Value = self.rest.get_json(&url)?;
        match record.pointer_mut("/data/attributes") {
            Some(attributes) => Ok(attributes.take()),
            None => Err(RestError::Parse {
                url,
                message: "DataCite record has no data.attributes".to_string(),
            }),
        }
    }
}
