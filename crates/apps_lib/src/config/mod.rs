//! Engine configuration

use std::fs::{create_dir_all, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use quorum_governance::parameters::GovernanceParameters;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The name of the config file in the base directory
pub const FILENAME: &str = "config.toml";

/// The prefix of environment variables overriding the config file, e.g.
/// `QUORUM__GOVERNANCE__PAGE_SIZE=20`
pub const ENV_PREFIX: &str = "QUORUM";

#[allow(missing_docs)]
#[derive(Error, Debug)]
pub enum Error {
    #[error("Error while reading config: {0}")]
    ReadError(config::ConfigError),
    #[error("Error while deserializing config: {0}")]
    DeserializationError(config::ConfigError),
    #[error("Error while writing config: {0}")]
    WriteError(std::io::Error),
    #[error("Error while serializing to toml: {0}")]
    TomlError(toml::ser::Error),
}

/// Result of a config operation
pub type Result<T> = std::result::Result<T, Error>;

/// Configuration of the governance engine
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Governance parameters
    #[serde(default)]
    pub governance: GovernanceParameters,
}

impl Config {
    /// Read the config. Keys missing from the config file, or the whole
    /// file if there is none, are filled in with default values. Variables
    /// prefixed with [`ENV_PREFIX`] override both.
    pub fn read(base_dir: impl AsRef<Path>) -> Result<Self> {
        let file_path = Self::file_path(base_dir);
        let defaults = config::Config::try_from(&Self::default())
            .map_err(Error::ReadError)?;
        let mut builder = config::Config::builder().add_source(defaults);
        if file_path.exists() {
            builder =
                builder.add_source(config::File::from(file_path.as_path()));
        }
        let config = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX).separator("__"),
            )
            .build()
            .map_err(Error::ReadError)?;
        config
            .try_deserialize()
            .map_err(Error::DeserializationError)
    }

    /// Read the config, falling back to the defaults if it cannot be read
    pub fn load_or_default(base_dir: impl AsRef<Path>) -> Self {
        let base_dir = base_dir.as_ref();
        Self::read(base_dir).unwrap_or_else(|err| {
            tracing::warn!(
                base_dir = %base_dir.display(),
                error = %err,
                "Failed to read the config, using the defaults"
            );
            Self::default()
        })
    }

    /// Write configuration to a file.
    pub fn write(&self, base_dir: impl AsRef<Path>) -> Result<()> {
        let file_path = Self::file_path(base_dir);
        if let Some(file_dir) = file_path.parent() {
            create_dir_all(file_dir).map_err(Error::WriteError)?;
        }
        let toml = toml::ser::to_string(&self).map_err(Error::TomlError)?;
        let mut file = File::create(file_path).map_err(Error::WriteError)?;
        file.write_all(toml.as_bytes()).map_err(Error::WriteError)
    }

    /// Get the file path to the config
    pub fn file_path(base_dir: impl AsRef<Path>) -> PathBuf {
        base_dir.as_ref().join(FILENAME)
    }
}

/// The platform's default directory for the config, if one is known
pub fn default_base_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "quorum")
        .map(|dirs| dirs.config_dir().to_path_buf())
}
