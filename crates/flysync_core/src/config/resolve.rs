//! Local-first resolution of database settings and REST endpoints.
//!
//! # Invariants
//! - A locally configured value always wins over the configuration service.
//! - Each remote section is fetched at most once per resolver.

use super::{Access, ConfigError, DatabaseSettings, FlysyncConfig, Manifold};
use crate::db::DatabaseKind;
use crate::rest::{ConfigServiceClient, RestResult};
use log::debug;
use once_cell::unsync::OnceCell;
use serde_json::Value;

/// Remote store of shared configuration sections.
pub trait SettingsSource {
    /// The unwrapped `config` object of a named section.
    fn section(&self, name: &str) -> RestResult<Value>;
}

impl SettingsSource for ConfigServiceClient {
    fn section(&self, name: &str) -> RestResult<Value> {
        ConfigServiceClient::section(self, name)
    }
}

/// Resolves settings from local configuration, falling back to a remote source.
pub struct SettingsResolver<'a, S> {
    config: &'a FlysyncConfig,
    source: Option<S>,
    db_config: OnceCell<Value>,
    rest_services: OnceCell<Value>,
}

impl<'a, S: SettingsSource> SettingsResolver<'a, S> {
    pub fn new(config: &'a FlysyncConfig, source: Option<S>) -> Self {
        Self {
            config,
            source,
            db_config: OnceCell::new(),
            rest_services: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &FlysyncConfig {
        self.config
    }

    /// Connection settings for `kind` in `manifold` at `access` level.
    ///
    /// Remote documents may nest settings per access level or hold them
    /// directly under the manifold.
    pub fn database(
        &self,
        kind: DatabaseKind,
        manifold: Manifold,
        access: Access,
    ) -> Result<DatabaseSettings, ConfigError> {
        let key = kind.config_key();
        if let Some(settings) = self.config.local_database(key, manifold, access) {
            debug!("event=config_resolve module=config source=local database={key}");
            return Ok(settings.clone());
        }

        let remote = self.remote_section(&self.db_config, "db_config")?;
        let section = format!("databases.{key}.{manifold}");
        let entry = remote
            .get(key)
            .and_then(|databases| databases.get(manifold.as_str()))
            .ok_or_else(|| ConfigError::NotConfigured {
                section: section.clone(),
            })?;
        let settings_value = entry
            .get(access.as_str())
            .filter(|value| value.is_object())
            .unwrap_or(entry);
        let settings: DatabaseSettings =
            serde_json::from_value(settings_value.clone()).map_err(|err| {
                ConfigError::InvalidValue {
                    field: section.clone(),
                    reason: err.to_string(),
                }
            })?;
        if !settings.is_configured() {
            return Err(ConfigError::InvalidValue {
                field: format!("{section}.{access}.path"),
                reason: "no database path configured".to_string(),
            });
        }
        debug!("event=config_resolve module=config source=remote database={key}");
        Ok(settings)
    }

    /// Base URL for a named REST service.
    pub fn endpoint(&self, service: &str) -> Result<String, ConfigError> {
        if let Some(url) = self.config.local_endpoint(service) {
            return Ok(url.to_string());
        }
        let remote = self.remote_section(&self.rest_services, "rest_services")?;
        remote
            .get(service)
            .and_then(|entry| entry.get("url"))
            .and_then(Value::as_str)
            .filter(|url| !url.trim().is_empty())
            .map(str::to_string)
            .ok_or_else(|| ConfigError::NotConfigured {
                section: format!("rest.{service}"),
            })
    }

    fn remote_section<'s>(
        &'s self,
        cell: &'s OnceCell<Value>,
        name: &str,
    ) -> Result<&'s Value, ConfigError> {
        let source = self
            .source
            .as_ref()
            .ok_or_else(|| ConfigError::NotConfigured {
                section: "config_service".to_string(),
            })?;
        cell.get_or_try_init(|| source.section(name))
            .map_err(ConfigError::from)
    }
}
