//! Server configuration.
//!
//! Every field has a default, so the server starts without any file. Set
//! `SIMP_CONFIG` to the path of a YAML document to override some of them:
//!
//! ```yaml
//! server:
//!   port: 9000
//!   idle_timeout_secs: 30
//! files:
//!   root: ./public
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use crate::http::connection::ConnectionSettings;

pub const CONFIG_ENV: &str = "SIMP_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub files: FilesConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub address: String,
    pub port: u16,
    pub read_buffer_size: usize,
    pub max_header_size: usize,
    pub idle_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    /// Directory served by GET
    pub root: PathBuf,
    /// Where submitted forms are written
    pub data_file: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log file written next to the console output; `None` disables it
    pub access_log: Option<PathBuf>,
    /// Filter used when `RUST_LOG` is unset
    pub level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 8050,
            read_buffer_size: 2048,
            max_header_size: 64 * 1024,
            idle_timeout_secs: None,
        }
    }
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            data_file: PathBuf::from("data/info.json"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            access_log: Some(PathBuf::from("access.log")),
            level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    pub fn connection_settings(&self) -> ConnectionSettings {
        ConnectionSettings {
            read_buffer_size: self.read_buffer_size.max(1),
            max_header_size: self.max_header_size,
            idle_timeout: self.idle_timeout_secs.map(Duration::from_secs),
        }
    }
}

impl Config {
    /// Loads the file named by `SIMP_CONFIG`, or the defaults when unset.
    pub fn load() -> anyhow::Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_yaml_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_yaml_str(text: &str) -> anyhow::Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }
}
