use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config as RConfig, File, FileFormat};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use trainlog_common::constants::{DEFAULT_BUFFER_CAPACITY, DEFAULT_INDEX_NAME};

use crate::logging;
use crate::params::{FlushFailure, ForwarderParams};

const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Config {
    pub run_name: String,
    pub index_name: String,

    #[serde(default)]
    pub extra_data: Map<String, Value>,

    #[serde(default)]
    pub url: Option<String>,

    pub buffer_capacity: usize,
    pub legacy_doc_types: bool,
    pub flush_failure: FlushFailure,

    pub log_level: String,
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Config {
    /// Installs the global subscriber with this configuration's level and
    /// optional log file.
    pub fn setup_logging(&self) -> Result<()> {
        logging::setup_logging(&self.log_level, self.log_file.as_deref())
    }

    /// Forwarder options for this configuration. A client injected later on
    /// the returned params takes precedence over `url`.
    pub fn into_params(self) -> ForwarderParams {
        ForwarderParams {
            run_name: self.run_name,
            index_name: self.index_name,
            extra_data: self.extra_data,
            url: self.url,
            es_client: None,
            buffer_capacity: self.buffer_capacity,
            legacy_doc_types: self.legacy_doc_types,
            flush_failure: self.flush_failure,
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Defaults overlaid with the TOML file at `path`. A missing file or a
    /// missing `run_name` is an error.
    pub fn load_config_file(path: &Path) -> Result<Config> {
        let mut builder = RConfig::builder();

        // set defaults, run_name has none
        builder = builder
            .set_default("index_name", DEFAULT_INDEX_NAME)?
            .set_default("buffer_capacity", DEFAULT_BUFFER_CAPACITY as u64)?
            .set_default("legacy_doc_types", false)?
            .set_default("flush_failure", "retain")?
            .set_default("log_level", DEFAULT_LOG_LEVEL)?;

        builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));

        let config: Config = builder
            .build()
            .with_context(|| format!("failed to read config file {}", path.display()))?
            .try_deserialize()
            .context("failed to parse config file")?;

        Ok(config)
    }
}
