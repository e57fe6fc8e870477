//! Session configuration
//!
//! Read from ~/.config/vecplane/config.json when present. Missing fields
//! fall back to defaults and out-of-range values are clamped.

use crate::pca::DEFAULT_POWER_ITERATIONS;
use crate::search::{DEFAULT_NEIGHBOR_LIMIT, DEFAULT_TREND_EPSILON};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const MIN_DIM: usize = 2;
pub const MAX_DIM: usize = 256;

/// Dimension of a fresh session when none is configured
pub const DEFAULT_DIM: usize = 8;

/// Tunables for a [`Session`](crate::Session)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Dimension of a fresh, empty session
    pub default_dim: usize,
    /// How many neighbors a similarity listing shows
    pub neighbor_limit: usize,
    /// Fixed power-iteration count per principal axis
    pub power_iterations: usize,
    /// Score change below which a neighbor's trend reads as unchanged
    pub trend_epsilon: f64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            default_dim: DEFAULT_DIM,
            neighbor_limit: DEFAULT_NEIGHBOR_LIMIT,
            power_iterations: DEFAULT_POWER_ITERATIONS,
            trend_epsilon: DEFAULT_TREND_EPSILON,
        }
    }
}

impl Config {
    /// Default location of the config file
    pub fn default_path() -> Result<PathBuf> {
        let dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("Could not find config directory".into()))?;
        Ok(dir.join("vecplane").join("config.json"))
    }

    /// Load from the default location, or defaults if no file exists
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            log::debug!("no config at {}, using defaults", path.display());
            return Ok(Config::default());
        }
        Self::load_from(&path)
    }

    /// Load from an explicit path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))?;
        log::debug!("loaded config from {}", path.display());
        Ok(config.validated())
    }

    /// Clamp every field into its usable range
    pub fn validated(mut self) -> Self {
        self.default_dim = clamp_dim(self.default_dim);
        self.power_iterations = self.power_iterations.max(1);
        if !self.trend_epsilon.is_finite() || self.trend_epsilon < 0.0 {
            self.trend_epsilon = DEFAULT_TREND_EPSILON;
        }
        self
    }
}

/// Clamp a requested dimension into [MIN_DIM, MAX_DIM]
pub fn clamp_dim(dim: usize) -> usize {
    dim.clamp(MIN_DIM, MAX_DIM)
}
