//! Database selection: environment, access level and connection settings.

use super::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;

/// Deployment environment a database belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Manifold {
    #[default]
    Prod,
    Dev,
}

impl Manifold {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Prod => "prod",
            Self::Dev => "dev",
        }
    }
}

impl Display for Manifold {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Manifold {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" => Ok(Self::Prod),
            "dev" => Ok(Self::Dev),
            other => Err(ConfigError::InvalidValue {
                field: "manifold".to_string(),
                reason: format!("expected prod|dev, got `{other}`"),
            }),
        }
    }
}

/// Whether a run only reads or also writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    Read,
    Write,
}

impl Access {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
        }
    }
}

impl Display for Access {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connection settings for one database in one manifold.
///
/// `path` is the SQLite file; `name`, `host` and `user` describe the
/// database for log output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct DatabaseSettings {
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub user: String,
}

impl DatabaseSettings {
    pub fn is_configured(&self) -> bool {
        self.path.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifold_parses_case_insensitively() {
        assert_eq!("PROD".parse::<Manifold>().unwrap(), Manifold::Prod);
        assert_eq!(" dev ".parse::<Manifold>().unwrap(), Manifold::Dev);
        assert!("staging".parse::<Manifold>().is_err());
        assert_eq!(Manifold::default(), Manifold::Prod);
    }
}
