//! Configuration service: shared settings and the DOI document store.
//!
//! # Invariants
//! - Every document the service returns is wrapped in a top-level `config` object.
//! - A DOI with no stored document is `None`, not an error.

use super::{endpoint_url, RestClient, RestError, RestResult};
use serde_json::Value;

/// Counts reported by the service after a document import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportOutcome {
    pub inserted: u64,
    pub updated: u64,
}

impl ImportOutcome {
    /// Reads `rest.inserted`, falling back to `rest.updated`.
    pub fn from_reply(reply: &Value) -> Self {
        let rest = reply.get("rest");
        let count = |key: &str| rest.and_then(|rest| rest.get(key)).and_then(Value::as_u64);
        match count("inserted") {
            Some(inserted) => Self {
                inserted,
                updated: 0,
            },
            None => Self {
                inserted: 0,
                updated: count("updated").unwrap_or(0),
            },
        }
    }
}

/// Document operations the DOI sync needs.
pub trait ConfigService {
    /// Stored metadata document for a DOI.
    fn stored_doi(&self, doi: &str) -> RestResult<Option<Value>>;
    /// Uploads a metadata document for a DOI.
    fn import_doi(&self, doi: &str, document: &Value) -> RestResult<ImportOutcome>;
}

/// HTTP implementation of [`ConfigService`].
#[derive(Debug, Clone)]
pub struct ConfigServiceClient {
    rest: RestClient,
    base_url: String,
}

impl ConfigServiceClient {
    pub fn new(rest: RestClient, base_url: impl Into<String>) -> Self {
        Self {
            rest,
            base_url: base_url.into(),
        }
    }

    /// Fetches `config/<name>` and unwraps its `config` object.
    pub fn section(&self, name: &str) -> RestResult<Value> {
        let url = endpoint_url(&self.base_url, &format!("config/{name}"));
        let mut document: Value = self.rest.get_json(&url)?;
        match document.get_mut("config") {
            Some(config) => Ok(config.take()),
            None => Err(RestError::Parse {
                url,
                message: "document has no config object".to_string(),
            }),
        }
    }
}

impl ConfigService for ConfigServiceClient {
    fn stored_doi(&self, doi: &str) -> RestResult<Option<Value>> {
        let url = endpoint_url(&self.base_url, &format!("config/dois/{doi}"));
        let document: Option<Value> = self.rest.get_json_optional(&url)?;
        Ok(document.and_then(|mut document| document.get_mut("config").map(Value::take)))
    }

    fn import_doi(&self, doi: &str, document: &Value) -> RestResult<ImportOutcome> {
        let url = endpoint_url(&self.base_url, &format!("importjson/dois/{doi}"));
        let entry = document.to_string();
        let reply = self.rest.post_form(&url, &[("config", entry.as_str())])?;
        Ok(ImportOutcome::from_reply(&reply))
    }
}

#[cfg(test)]
mod tests {
    use super::ImportOutcome;
    use serde_json::json;

    #[test]
    fn import_outcome_reads_inserted_before_updated() {
        assert_eq!(
            ImportOutcome::from_reply(&json!({"rest": {"inserted": 1, "updated": 4}})),
            ImportOutcome {
                inserted: 1,
                updated: 0
            }
        );
        assert_eq!(
            ImportOutcome::from_reply(&json!({"rest": {"updated": 2}})),
            ImportOutcome {
                inserted: 0,
                updated: 2
            }
        );
        assert_eq!(ImportOutcome::from_reply(&json!({})), ImportOutcome::default());
    }
}
