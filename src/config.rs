//! Engine configuration.
//!
//! Every field has a default, so a partial JSON document only needs the
//! values it overrides.
//!
//! # Examples
//!
//! ```
//! use taskvault::config::{EngineConfig, OwnerDeadlinePolicy};
//!
//! let config = EngineConfig::from_json_str(r#"{ "reconciler": { "interval_secs": 30 } }"#)
//!     .expect("valid configuration");
//! assert_eq!(config.reconciler.interval_secs, 30);
//! assert_eq!(config.reconciler.owner_deadline_policy, OwnerDeadlinePolicy::Dispute);
//! assert_eq!(config.page_limits.default_limit, 20);
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration from {path}: {source}")]
    Read {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration document is not valid JSON for [`EngineConfig`].
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is outside its permitted range.
    #[error("invalid configuration value for {field}: {reason}")]
    Invalid {
        /// Offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: &'static str,
    },
}

/// What the reconciler does with claimed tasks whose owner deadline passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OwnerDeadlinePolicy {
    /// Move the task to `Disputed`, leaving the escrow locked.
    #[default]
    Dispute,
    /// Leave the task as it is.
    Ignore,
}

/// Page-size bounds applied to listing queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageLimits {
    /// Page size used when the caller's limit is missing or out of range.
    pub default_limit: usize,
    /// Largest page size a caller may request.
    pub max_limit: usize,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_limit: 20,
            max_limit: 100,
        }
    }
}

impl PageLimits {
    /// Clamps a caller-supplied limit.
    ///
    /// Non-positive and oversized limits fall back to the default.
    #[must_use]
    pub fn clamp_limit(&self, requested: i64) -> usize {
        usize::try_from(requested)
            .ok()
            .filter(|limit| *limit > 0 && *limit <= self.max_limit)
            .unwrap_or(self.default_limit)
    }

    /// Clamps a caller-supplied offset, mapping negative values to zero.
    #[must_use]
    pub fn clamp_offset(requested: i64) -> usize {
        usize::try_from(requested).unwrap_or(0)
    }
}

/// Reconciler scheduling settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcilerConfig {
    /// Seconds between reconciliation passes.
    pub interval_secs: u64,
    /// Longest wait for a single task's lock before skipping it.
    pub task_timeout_ms: u64,
    /// Handling of claimed tasks past their owner deadline.
    pub owner_deadline_policy: OwnerDeadlinePolicy,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            task_timeout_ms: 5_000,
            owner_deadline_policy: OwnerDeadlinePolicy::Dispute,
        }
    }
}

impl ReconcilerConfig {
    /// Returns the pass interval.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Returns the per-task lock timeout.
    #[must_use]
    pub const fn task_timeout(&self) -> Duration {
        Duration::from_millis(self.task_timeout_ms)
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum task title length in characters.
    pub max_title_chars: usize,
    /// Listing page-size bounds.
    pub page_limits: PageLimits,
    /// Reputation awarded to a claimer per approved claim.
    pub reputation_per_approval: i64,
    /// Reconciler settings.
    pub reconciler: ReconcilerConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_title_chars: 500,
            page_limits: PageLimits::default(),
            reputation_per_approval: 1,
            reconciler: ReconcilerConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Parses and validates a JSON configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and
    /// [`ConfigError::Invalid`] for out-of-range values.
    pub fn from_json_str(document: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(document)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses, and validates a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] when the file cannot be read, otherwise
    /// the errors of [`EngineConfig::from_json_str`].
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let document = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&document)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.max_title_chars == 0 {
            return Err(ConfigError::Invalid {
                field: "max_title_chars",
                reason: "must be positive",
            });
        }
        if self.page_limits.default_limit == 0 {
            return Err(ConfigError::Invalid {
                field: "page_limits.default_limit",
                reason: "must be positive",
            });
        }
        if self.page_limits.default_limit > self.page_limits.max_limit {
            return Err(ConfigError::Invalid {
                field: "page_limits.default_limit",
                reason: "must not exceed page_limits.max_limit",
            });
        }
        if self.reputation_per_approval < 0 {
            return Err(ConfigError::Invalid {
                field: "reputation_per_approval",
                reason: "must not be negative",
            });
        }
        if self.reconciler.interval_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "reconciler.interval_secs",
                reason: "must be positive",
            });
        }
        Ok(())
    }
}
