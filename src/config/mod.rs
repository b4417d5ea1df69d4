// Configuration management

use config::{Config as ConfigBuilder, ConfigError, Environment};
use serde::Deserialize;

/// Which persistence backend to wire up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Local,
    Remote,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_backend")]
    pub backend: BackendKind,
    #[serde(default)]
    pub local: LocalStoreConfig,
    #[serde(default)]
    pub remote: RemoteStoreConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocalStoreConfig {
    /// Path of the JSON blob file.
    #[serde(default = "default_blob_path")]
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteStoreConfig {
    #[serde(default = "default_region")]
    pub region: String,
    /// Tables are named `{table_prefix}-{collection}`.
    #[serde(default = "default_table_prefix")]
    pub table_prefix: String,
}

fn default_backend() -> BackendKind {
    BackendKind::Local
}

fn default_blob_path() -> String {
    "canteen_data.json".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_table_prefix() -> String {
    "canteen".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            local: LocalStoreConfig::default(),
            remote: RemoteStoreConfig::default(),
        }
    }
}

impl Default for LocalStoreConfig {
    fn default() -> Self {
        Self {
            path: default_blob_path(),
        }
    }
}

impl Default for RemoteStoreConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            table_prefix: default_table_prefix(),
        }
    }
}

impl Config {
    /// Load configuration from `CANTEEN`-prefixed environment variables,
    /// e.g. `CANTEEN_BACKEND=remote`, `CANTEEN_REMOTE__TABLE_PREFIX=prod`.
    pub fn from_env() -> Result<Self, ConfigError> {
        ConfigBuilder::builder()
            .add_source(Environment::with_prefix("CANTEEN").separator("__"))
            .build()?
            .try_deserialize()
    }
}
