//! Configuration management for the amalgamator

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AmalgamateError, Result};

/// Epsilon substituted for a zero threshold
pub const DEFAULT_ZERO_TOLERANCE: f64 = 1e-4;

/// Prefix used for synthetic cluster names
pub const DEFAULT_NAME_PREFIX: &str = "Group";

/// File name of the reassignment table when no sink is given
pub const DEFAULT_TABLE_FILE: &str = "amalgamation_table.csv";

/// How the zero tolerance interacts with the caller's threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ToleranceMode {
    /// Substitute the tolerance only when the threshold is exactly 0
    #[default]
    ZeroOnly,

    /// Never compare with less than the tolerance
    Floor,
}

/// Parameters for one amalgamation invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Maximum distance at which two groups are directly linked
    pub threshold: f64,

    /// Epsilon used in place of an exact-zero threshold
    pub zero_tolerance: f64,

    pub tolerance_mode: ToleranceMode,

    /// Tag embedded in synthetic names, e.g. the round number
    pub iteration: String,

    pub name_prefix: String,

    /// Where the reassignment table is written; temp dir when unset
    pub table_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            threshold: 0.0,
            zero_tolerance: DEFAULT_ZERO_TOLERANCE,
            tolerance_mode: ToleranceMode::ZeroOnly,
            iteration: "1".to_string(),
            name_prefix: DEFAULT_NAME_PREFIX.to_string(),
            table_path: None,
        }
    }
}

impl Config {
    /// Create a new configuration with custom values
    pub fn new(threshold: f64, iteration: impl Into<String>, table_path: Option<PathBuf>) -> Self {
        Self {
            threshold,
            iteration: iteration.into(),
            table_path,
            ..Self::default()
        }
    }

    /// Load a configuration from a JSON file; missing fields take defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let config = serde_json::from_str(&text)?;
        Ok(config)
    }

    /// Threshold actually used for comparisons
    ///
    /// Computed distances are rarely exactly zero, so a zero threshold is
    /// widened to `zero_tolerance`. With [`ToleranceMode::Floor`] every
    /// threshold is widened to at least the tolerance. Under
    /// [`ToleranceMode::ZeroOnly`] a threshold strictly between 0 and the
    /// tolerance therefore links fewer pairs than 0 itself does.
    pub fn effective_threshold(&self) -> Result<f64> {
        if self.threshold.is_nan() || self.threshold < 0.0 {
            return Err(AmalgamateError::InvalidThreshold(self.threshold));
        }

        let effective = match self.tolerance_mode {
            ToleranceMode::ZeroOnly if self.threshold == 0.0 => self.zero_tolerance,
            ToleranceMode::ZeroOnly => self.threshold,
            ToleranceMode::Floor => self.threshold.max(self.zero_tolerance),
        };

        Ok(effective)
    }

    /// Sink for the reassignment table
    pub fn table_path(&self) -> PathBuf {
        self.table_path
            .clone()
            .unwrap_or_else(crate::storage::default_table_path)
    }
}
