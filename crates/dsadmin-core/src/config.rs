//! # Settings
//!
//! Process configuration as an explicit struct handed to component
//! constructors — nothing reads ambient global state. Loaded from a TOML
//! file named on the command line (`--config`), via the `DSADMIN_CONFIG`
//! environment variable, or `./dsadmin.toml` as a fallback.
//!
//! ```toml
//! dataset_file = "/srv/erddap/datasets.xml"
//! key_file = "/srv/erddap/api-keys.csv"
//!
//! [lock]
//! max_attempts = 6
//! retry_delay_ms = 500
//! # break_stale_after_secs = 900   # opt-in, off by default
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::catalog::Catalog;
use crate::keys::KeyStore;
use crate::lock::FileLock;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "DSADMIN_CONFIG";

/// Fallback config file name, resolved against the working directory.
pub const CONFIG_FALLBACK: &str = "dsadmin.toml";

/// Configuration loading failure.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// No config path given and no fallback file present.
    #[error("no configuration file found; pass --config, set {CONFIG_ENV}, or create ./{CONFIG_FALLBACK}")]
    NotFound,

    /// The config file could not be read.
    #[error("could not read configuration file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`Settings`].
    #[error("invalid configuration in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Lock tuning, shared by both stores.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LockSettings {
    /// Acquisition attempts before giving up.
    pub max_attempts: u32,
    /// Sleep between attempts, milliseconds.
    pub retry_delay_ms: u64,
    /// Break markers older than this many seconds. Off unless set.
    pub break_stale_after_secs: Option<u64>,
}

impl Default for LockSettings {
    fn default() -> Self {
        Self {
            max_attempts: 6,
            retry_delay_ms: 500,
            break_stale_after_secs: None,
        }
    }
}

/// Process settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// The XML catalog file.
    pub dataset_file: PathBuf,
    /// The CSV credential file.
    pub key_file: PathBuf,
    /// Lock tuning.
    #[serde(default)]
    pub lock: LockSettings,
}

impl Settings {
    /// Load settings from `path`, or from [`CONFIG_ENV`], or from
    /// `./dsadmin.toml` — the first that applies.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let resolved = match path {
            Some(path) => path.to_path_buf(),
            None => match std::env::var_os(CONFIG_ENV) {
                Some(env_path) => PathBuf::from(env_path),
                None => {
                    let fallback = PathBuf::from(CONFIG_FALLBACK);
                    if !fallback.exists() {
                        return Err(SettingsError::NotFound);
                    }
                    fallback
                }
            },
        };
        Self::from_file(&resolved)
    }

    /// Load settings from a specific TOML file.
    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The catalog component, with its lock configured from these settings.
    pub fn catalog(&self) -> Catalog {
        Catalog::new(&self.dataset_file, self.file_lock(&self.dataset_file))
    }

    /// The key store component, with its lock configured from these settings.
    pub fn key_store(&self) -> KeyStore {
        KeyStore::new(&self.key_file, self.file_lock(&self.key_file))
    }

    fn file_lock(&self, target: &Path) -> FileLock {
        let lock = FileLock::new(
            target,
            self.lock.max_attempts,
            Duration::from_millis(self.lock.retry_delay_ms),
        );
        match self.lock.break_stale_after_secs {
            Some(secs) => lock.with_break_stale_after(Duration::from_secs(secs)),
            None => lock,
        }
    }
}
