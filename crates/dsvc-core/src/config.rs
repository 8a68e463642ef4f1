//! Engine configuration loaded from TOML.
//!
//! Every section and key is optional; a missing file yields the defaults.
//!
//! ```toml
//! [lock]
//! timeout_ms = 5000
//! lease_ms = 30000
//! poll_interval_ms = 25
//! backend = "sqlite_lease"
//!
//! [paging]
//! default_page_size = 10
//! max_page_size = 1000
//!
//! [logging]
//! profile = "production"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::errors::{ExError, ExErrorKind, Result};
use crate::logging_facility::Profile;

/// Top-level engine configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    #[serde(default)]
    pub lock: LockConfig,

    #[serde(default)]
    pub paging: PagingConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which lock service serializes commits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockBackend {
    /// Mutex table inside this process
    InProcess,
    /// Lease rows in the shared database; safe across processes
    #[default]
    SqliteLease,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LockConfig {
    /// How long a commit waits for the dataset lock
    #[serde(default = "default_lock_timeout_ms")]
    pub timeout_ms: u64,

    /// Lease length for the database-backed lock; an expired lease may be
    /// taken over by another process
    #[serde(default = "default_lease_ms")]
    pub lease_ms: u64,

    /// Retry interval while waiting on a database lease
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default)]
    pub backend: LockBackend,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_lock_timeout_ms(),
            lease_ms: default_lease_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            backend: LockBackend::default(),
        }
    }
}

impl LockConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn lease(&self) -> Duration {
        Duration::from_millis(self.lease_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PagingConfig {
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    #[serde(default)]
    pub profile: Profile,
}

// Serde default functions
fn default_lock_timeout_ms() -> u64 {
    5_000
}

fn default_lease_ms() -> u64 {
    30_000
}

fn default_poll_interval_ms() -> u64 {
    25
}

fn default_page_size() -> u32 {
    10
}

fn default_max_page_size() -> u32 {
    1_000
}

fn config_error(message: impl Into<String>) -> ExError {
    ExError::new(ExErrorKind::Config)
        .with_op("load_config")
        .with_message(message)
}

impl EngineConfig {
    /// Parse and validate a TOML document.
    ///
    /// # Errors
    /// `Config` for malformed TOML, unknown keys, or values failing [`Self::validate`].
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(content).map_err(|e| config_error(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, falling back to defaults when the file does not exist.
    ///
    /// # Errors
    /// `Config` when the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml_str(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file; using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(config_error(format!(
                "cannot read {}: {}",
                path.display(),
                e
            ))),
        }
    }

    /// # Errors
    /// `Config` for zero sizes/intervals or a default page size above the maximum.
    pub fn validate(&self) -> Result<()> {
        if self.paging.max_page_size == 0 {
            return Err(config_error("paging.max_page_size must be at least 1"));
        }
        if self.paging.default_page_size == 0
            || self.paging.default_page_size > self.paging.max_page_size
        {
            return Err(config_error(
                "paging.default_page_size must be between 1 and paging.max_page_size",
            ));
        }
        if self.lock.lease_ms == 0 || self.lock.poll_interval_ms == 0 {
            return Err(config_error(
                "lock.lease_ms and lock.poll_interval_ms must be positive",
            ));
        }
        Ok(())
    }
}
