//! Blocking HTTP clients for the external services a run talks to.
//!
//! # Responsibility
//! - Own one `reqwest` blocking client per run with a request timeout.
//! - Map transport failures, non-200 statuses and undecodable bodies to [`RestError`].
//!
//! # Invariants
//! - Every non-200 response is an error; callers never see a failed body as data.
//! - Endpoint paths are appended verbatim to the configured base URL.

use log::debug;
use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

pub mod config_service;
pub mod doi;
pub mod imaging;
pub mod records;

pub use config_service::{ConfigService, ConfigServiceClient, ImportOutcome};
pub use doi::{DoiClient, DoiSource};
pub use imaging::{ImagingService, JacsClient};
pub use records::{FlyCoreClient, RecordsService};

pub type RestResult<T> = Result<T, RestError>;

/// Error raised by any REST call.
#[derive(Debug, Error)]
pub enum RestError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("status {status} from {url}: {message}")]
    Status {
        status: u16,
        url: String,
        message: String,
    },
    #[error("unexpected response from {url}: {message}")]
    Parse { url: String, message: String },
    #[error("no REST endpoint configured for `{0}`")]
    MissingEndpoint(String),
}

impl RestError {
    fn parse(url: &str, message: impl Into<String>) -> Self {
        Self::Parse {
            url: url.to_string(),
            message: message.into(),
        }
    }
}

/// Shared blocking HTTP client.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: Client,
}

impl RestClient {
    pub fn new(timeout: Duration) -> RestResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("flysync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| RestError::Transport {
                url: String::new(),
                source,
            })?;
        Ok(Self { http })
    }

    /// GETs `url` and decodes the JSON body.
    pub fn get_json<T: DeserializeOwned>(&self, url: &str) -> RestResult<T> {
        self.get_json_with_headers(url, &[])
    }

    pub fn get_json_with_headers<T: DeserializeOwned>(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> RestResult<T> {
        debug!("event=rest_get module=rest url={url}");
        let mut request = self.http.get(url);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        let response = request.send().map_err(|source| RestError::Transport {
            url: url.to_string(),
            source,
        })?;
        let response = check_response(response, url)?;
        decode_json(response, url)
    }

    /// GETs `url`, treating 404 as an absent document.
    pub fn get_json_optional<T: DeserializeOwned>(&self, url: &str) -> RestResult<Option<T>> {
        debug!("event=rest_get module=rest url={url}");
        let response = self.http.get(url).send().map_err(|source| RestError::Transport {
            url: url.to_string(),
            source,
        })?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check_response(response, url)?;
        decode_json(response, url).map(Some)
    }

    /// POSTs a urlencoded form and decodes the JSON reply.
    pub fn post_form(&self, url: &str, form: &[(&str, &str)]) -> RestResult<Value> {
        debug!("event=rest_post module=rest url={url}");
        let response = self
            .http
            .post(url)
            .form(form)
            .send()
            .map_err(|source| RestError::Transport {
                url: url.to_string(),
                source,
            })?;
        let response = check_response(response, url)?;
        decode_json(response, url)
    }
}

/// Returns the response unchanged when it is a 200, otherwise a [`RestError::Status`].
///
/// The error message is the body's `rest.message` when the service sent one,
/// else the raw body text.
fn check_response(response: Response, url: &str) -> RestResult<Response> {
    let status = response.status();
    if status == StatusCode::OK {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(RestError::Status {
        status: status.as_u16(),
        url: url.to_string(),
        message: error_message(&body),
    })
}

fn decode_json<T: DeserializeOwned>(response: Response, url: &str) -> RestResult<T> {
    let body = response.text().map_err(|source| RestError::Transport {
        url: url.to_string(),
        source,
    })?;
    serde_json::from_str(&body).map_err(|err| RestError::parse(url, err.to_string()))
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .pointer("/rest/message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

/// Joins a base URL and an endpoint the way the services expect: plain concatenation.
pub(crate) fn endpoint_url(base: &str, endpoint: &str) -> String {
    format!("{base}{endpoint}")
}
