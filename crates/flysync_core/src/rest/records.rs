//! Fly Core records service: stocks, splits, publishing names and DOIs.

use super::{endpoint_url, RestClient, RestError, RestResult};
use crate::model::line::Split;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

/// Read-only view of the external records service.
pub trait RecordsService {
    /// Stock names keyed on the stock's KP ID.
    fn named_stocks(&self) -> RestResult<HashMap<String, String>>;
    /// Positional publishing-name rows.
    fn publishing_names(&self) -> RestResult<Vec<Vec<Value>>>;
    /// All initial splits, or only the one for `line`.
    fn initial_splits(&self, line: Option<&str>) -> RestResult<Vec<Split>>;
    /// Whether the service has line data for a stock KP ID.
    fn has_line_data(&self, kp_id: i64) -> RestResult<bool>;
    /// Raw DOI fields; each may hold several `|`-separated DOIs.
    fn doi_list(&self) -> RestResult<Vec<String>>;
}

#[derive(Debug, Deserialize)]
struct NamedStocksResponse {
    stocks: HashMap<String, NamedStock>,
}

#[derive(Debug, Deserialize)]
struct NamedStock {
    #[serde(rename = "Stock_Name")]
    stock_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PublishingNamesResponse {
    publishing: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct SplitsResponse {
    splits: Vec<Split>,
}

#[derive(Debug, Deserialize)]
struct DoiListResponse {
    dois: Vec<String>,
}

/// HTTP implementation of [`RecordsService`].
pub struct FlyCoreClient {
    rest: RestClient,
    base_url: String,
}

impl FlyCoreClient {
    pub fn new(rest: RestClient, base_url: impl Into<String>) -> Self {
        Self {
            rest,
            base_url: base_url.into(),
        }
    }

    fn url(&self, endpoint: &str) -> String {
        endpoint_url(&self.base_url, endpoint)
    }
}

impl RecordsService for FlyCoreClient {
    fn named_stocks(&self) -> RestResult<HashMap<String, String>> {
        let response: NamedStocksResponse = self.rest.get_json(&self.url("?request=named_stocks"))?;
        Ok(response
            .stocks
            .into_iter()
            .filter_map(|(kp, stock)| stock.stock_name.map(|name| (kp, name)))
            .collect())
    }

    fn publishing_names(&self) -> RestResult<Vec<Vec<Value>>> {
        let response: PublishingNamesResponse =
            self.rest.get_json(&self.url("?request=publishing_names"))?;
        Ok(response.publishing)
    }

    fn initial_splits(&self, line: Option<&str>) -> RestResult<Vec<Split>> {
        let endpoint = match line {
            Some(line) => format!("?request=initial_split;line={line}"),
            None => "?request=initial_splits".to_string(),
        };
        let response: SplitsResponse = self.rest.get_json(&self.url(&endpoint))?;
        Ok(response.splits)
    }

    fn has_line_data(&self, kp_id: i64) -> RestResult<bool> {
        let url = self.url(&format!("?request=linedata&kp={kp_id}"));
        let response: Value = self.rest.get_json(&url)?;
        if !response.is_object() {
            return Err(RestError::Parse {
                url,
                message: "expected a JSON object".to_string(),
            });
        }
        Ok(!matches!(response.get("linedata"), Some(Value::String(text)) if text.is_empty()))
    }

    fn doi_list(&self) -> RestResult<Vec<String>> {
        let response: DoiListResponse = self.rest.get_json(&self.url("?request=doilist"))?;
        Ok(response.dois)
    }
}
