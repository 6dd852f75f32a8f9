//! Runtime configuration.
//!
//! Configuration can be loaded from a JSON file or built from defaults and
//! overridden by CLI flags. All fields have sensible defaults so a bare
//! `linksave <page>` works against a local server.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::fetch::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use crate::interceptor::DEFAULT_CONCURRENCY;

/// Default endpoint prefix requests are addressed under.
pub const DEFAULT_ENDPOINT_PREFIX: &str = "/upload/";

/// Default save directory name, relative to the working directory.
pub const DEFAULT_SAVE_DIR: &str = "downloads";

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// The config file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON.
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        /// The config file path.
        path: PathBuf,
        /// The underlying parse error.
        #[source]
        source: serde_json::Error,
    },
}

/// Tool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Scheme and host requests are sent to, e.g. `http://localhost:8082`.
    /// Empty means the origin must come from the page URL.
    pub origin: String,

    /// Path prefix the download endpoint lives under.
    pub endpoint_prefix: String,

    /// Directory published downloads land in.
    pub save_dir: PathBuf,

    /// Directory staged payloads are written to before publication.
    /// Defaults to `.staging` inside the save directory.
    pub staging_dir: Option<PathBuf>,

    /// Maximum number of concurrent activations (1-100).
    pub concurrency: usize,

    /// HTTP connect timeout in seconds.
    pub connect_timeout_secs: u64,

    /// HTTP read timeout in seconds.
    pub read_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            origin: String::new(),
            endpoint_prefix: DEFAULT_ENDPOINT_PREFIX.to_string(),
            save_dir: PathBuf::from(DEFAULT_SAVE_DIR),
            staging_dir: None,
            concurrency: DEFAULT_CONCURRENCY,
            connect_timeout_secs: CONNECT_TIMEOUT_SECS,
            read_timeout_secs: READ_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Loads configuration from a JSON file.
    ///
    /// Missing fields fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Parse`] if it is not valid JSON.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        debug!(path = %path.display(), "loading config file");
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self = serde_json::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(config.normalized())
    }

    /// Returns a copy with origin and prefix put into canonical shape:
    /// no trailing slash on the origin, exactly one leading and one
    /// trailing slash on the prefix.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        while self.origin.ends_with('/') {
            self.origin.pop();
        }
        if !self.endpoint_prefix.starts_with('/') {
            self.endpoint_prefix.insert(0, '/');
        }
        if !self.endpoint_prefix.ends_with('/') {
            self.endpoint_prefix.push('/');
        }
        self
    }

    /// Returns the staging directory, defaulting to `.staging` inside the
    /// save directory.
    #[must_use]
    pub fn effective_staging_dir(&self) -> PathBuf {
        self.staging_dir
            .clone()
            .unwrap_or_else(|| self.save_dir.join(".staging"))
    }
}
