//! Per-run setup: configuration, logging, HTTP client and database connections.

use crate::args::CommonArgs;
use anyhow::{anyhow, Context};
use flysync_core::config::{Access, FlysyncConfig, SettingsResolver};
use flysync_core::rest::{ConfigServiceClient, DoiClient, FlyCoreClient, JacsClient};
use flysync_core::{init_logging, level_for_flags, open_db, DatabaseKind, RestClient};
use log::info;
use rusqlite::Connection;

pub type Settings<'a> = SettingsResolver<'a, ConfigServiceClient>;

pub struct Runtime {
    pub args: CommonArgs,
    pub config: FlysyncConfig,
    pub rest: RestClient,
}

impl Runtime {
    pub fn init(args: &CommonArgs) -> anyhow::Result<Self> {
        let config = FlysyncConfig::load_with_dotenv().context("failed to load configuration")?;
        init_logging(
            level_for_flags(args.verbose, args.debug),
            config.logging.dir.as_deref(),
        )
        .map_err(|err| anyhow!(err))?;
        let rest = RestClient::new(config.http.timeout())?;
        Ok(Self {
            args: args.clone(),
            config,
            rest,
        })
    }

    fn config_service_client(&self) -> Option<ConfigServiceClient> {
        self.config
            .config_service
            .is_configured()
            .then(|| ConfigServiceClient::new(self.rest.clone(), &self.config.config_service.url))
    }

    /// Settings resolver for this run; each remote section is fetched at most once per resolver.
    pub fn settings(&self) -> Settings<'_> {
        SettingsResolver::new(&self.config, self.config_service_client())
    }

    pub fn config_service(&self) -> anyhow::Result<ConfigServiceClient> {
        self.config_service_client()
            .ok_or_else(|| anyhow!("config_service.url is not configured"))
    }

    /// Opens the database for `kind` in the selected manifold.
    pub fn open_database(
        &self,
        settings: &Settings<'_>,
        kind: DatabaseKind,
        access: Access,
    ) -> anyhow::Result<Connection> {
        let manifold = self.args.manifold;
        let settings = settings.database(kind, manifold, access)?;
        let path = settings
            .path
            .as_ref()
            .ok_or_else(|| anyhow!("no path configured for the {kind} database"))?;
        info!(
            "Connecting to {} {manifold} on {} as {}",
            settings.name, settings.host, settings.user
        );
        open_db(path, kind).with_context(|| format!("failed to open the {kind} database"))
    }

    pub fn flycore(&self, settings: &Settings<'_>) -> anyhow::Result<FlyCoreClient> {
        let url = settings.endpoint("flycore")?;
        Ok(FlyCoreClient::new(self.rest.clone(), url))
    }

    pub fn jacs(&self, settings: &Settings<'_>) -> anyhow::Result<JacsClient> {
        let url = settings.endpoint("jacs")?;
        Ok(JacsClient::new(self.rest.clone(), url))
    }

    pub fn doi_sources(&self, settings: &Settings<'_>) -> anyhow::Result<DoiClient> {
        let datacite = settings.endpoint("datacite")?;
        Ok(DoiClient::new(
            self.rest.clone(),
            &self.config.crossref.url,
            &self.config.crossref.mailto,
            datacite,
        ))
    }
}
