//! Layered configuration loading for flysync using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`FLYSYNC_*` prefix, `__` as separator)
//! 2. Project-level `./flysync.toml`
//! 3. User-level `~/.config/flysync/config.toml`
//! 4. Built-in defaults
//!
//! Database settings and REST endpoints that are not configured locally are
//! fetched from the configuration service through [`SettingsResolver`].
//!
//! # Environment Variable Mapping
//!
//! `FLYSYNC_CROSSREF__MAILTO` -> `crossref.mailto`,
//! `FLYSYNC_DATABASES__SAGE__DEV__WRITE__PATH` -> `databases.sage.dev.write.path`.

mod database;
mod error;
mod resolve;

pub use database::{Access, DatabaseSettings, Manifold};
pub use error::ConfigError;
pub use resolve::{SettingsResolver, SettingsSource};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

const fn default_timeout_secs() -> u64 {
    10
}

fn default_crossref_url() -> String {
    "https://api.crossref.org".to_string()
}

/// Database settings keyed on database, manifold and access level.
pub type DatabaseTable = BTreeMap<String, BTreeMap<String, BTreeMap<String, DatabaseSettings>>>;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FlysyncConfig {
    #[serde(default)]
    pub config_service: EndpointConfig,
    #[serde(default)]
    pub crossref: CrossrefConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub databases: DatabaseTable,
    #[serde(default)]
    pub rest: BTreeMap<String, EndpointConfig>,
}

/// Base URL of a REST service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct EndpointConfig {
    #[serde(default)]
    pub url: String,
}

impl EndpointConfig {
    pub fn is_configured(&self) -> bool {
        !self.url.trim().is_empty()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CrossrefConfig {
    #[serde(default = "default_crossref_url")]
    pub url: String,
    /// Contact address sent in the `mailto` header.
    #[serde(default)]
    pub mailto: String,
}

impl Default for CrossrefConfig {
    fn default() -> Self {
        Self {
            url: default_crossref_url(),
            mailto: String::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Directory for rotating log files; stderr only when unset.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl FlysyncConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    pub fn load() -> Result<Self, ConfigError> {
        Self::figment().extract().map_err(ConfigError::from)
    }

    /// Load configuration after reading a `.env` file from the current directory.
    ///
    /// A missing `.env` is fine; one that cannot be read or parsed is an error.
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => {}
            Err(err) if err.not_found() => {}
            Err(err) => return Err(ConfigError::Dotenv(err)),
        }
        Self::load()
    }

    /// Build the figment provider chain.
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        let local_path = PathBuf::from("flysync.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::prefixed("FLYSYNC_").split("__"))
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|path| path.join("flysync").join("config.toml"))
    }

    /// Locally configured settings for a database, if any.
    pub fn local_database(
        &self,
        key: &str,
        manifold: Manifold,
        access: Access,
    ) -> Option<&DatabaseSettings> {
        self.databases
            .get(key)?
            .get(manifold.as_str())?
            .get(access.as_str())
            .filter(|settings| settings.is_configured())
    }

    /// Locally configured base URL for a REST service, if any.
    pub fn local_endpoint(&self, service: &str) -> Option<&str> {
        self.rest
            .get(service)
            .filter(|endpoint| endpoint.is_configured())
            .map(|endpoint| endpoint.url.as_str())
    }
}
