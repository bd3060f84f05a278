use crate::errors::{FileOperation, IoError};
use miette::Diagnostic;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

pub const CONFIG_FILE: &str = "zipctl.toml";

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("I/O error within config domain")]
    #[diagnostic(code(zipctl::config::io))]
    Io(#[from] IoError),

    #[error("Unable to parse toml file at '{path}': {source}")]
    #[diagnostic(code(zipctl::config::parse_toml), help("Review toml file"))]
    ParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Deserialize)]
pub struct StorageSettings {
    pub connection_string: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    pub storage: Option<StorageSettings>,
}
impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        let content = fs::read_to_string(path)
            .map_err(|error| IoError::new(FileOperation::Read, path.to_path_buf(), error))?;

        let parsed = toml::from_str(&content).map_err(|error| ConfigError::ParseToml {
            path: path.to_path_buf(),
            source: error,
        })?;

        Ok(parsed)
    }

    /// Loads `zipctl.toml` from the current directory; a missing file is an
    /// empty config, not an error.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Path::new(CONFIG_FILE);

        if !path.exists() {
            return Ok(Config::default());
        }

        Config::from_file(path)
    }

    pub fn connection_string(&self) -> Option<&str> {
        self.storage
            .as_ref()
            .map(|storage| storage.connection_string.as_str())
    }
}
