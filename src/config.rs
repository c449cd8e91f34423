//! Pipeline configuration.
//!
//! Every value has a default matching the constants the pipelines were first
//! run with, so a missing file or a partial file both work.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub loader: LoaderConfig,
    pub store: StoreConfig,
    pub exporter: ExporterConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Site root used to resolve relative decision links
    pub base_url: String,
    /// Path of the decision listing page, relative to `base_url`
    pub listing_path: String,
    pub cursor_file: PathBuf,
    pub page_timeout_secs: u64,
    pub headless: bool,
}

impl CrawlerConfig {
    pub fn listing_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.listing_path)
    }

    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            base_url: "https://ised-isde.canada.ca".to_string(),
            listing_path: "/site/spectrum-management-telecommunications/en/spectrum-allocation/spectrum-licensing/decisions-licence-transfers-commercial-mobile-spectrum".to_string(),
            cursor_file: PathBuf::from("Backend/last_visited.json"),
            page_timeout_secs: 10,
            headless: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoaderConfig {
    pub storage_dir: PathBuf,
    pub archive_name: String,
    pub tier_count: u8,
    /// Attribute holding each area's identifier, carried down to child tiers.
    /// A name longer than a dBASE field also matches its truncated form.
    pub area_id_column: String,
}

impl LoaderConfig {
    pub fn archive_path(&self) -> PathBuf {
        self.storage_dir.join(&self.archive_name)
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from("Storage"),
            archive_name: "CanadaServiceAreas.zip".to_string(),
            tier_count: 5,
            area_id_column: "Service_Ar".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StoreConfig {
    pub database: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("Storage/canadaserviceareas.duckdb"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ExporterConfig {
    pub output_dir: PathBuf,
    /// GeoPackage `srs_id`; 0 is undefined geographic
    pub srs_id: i32,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("Storage"),
            srs_id: 0,
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from `path` when given, otherwise fall back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load_from_file(p),
            None => Ok(Self::default()),
        }
    }
}
