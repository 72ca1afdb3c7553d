//! Scan configuration.
//!
//! Loads/saves a TOML config; all fields have serde defaults so a partial
//! file (or none at all) is fine.

use crate::SrcmapError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tuning knobs for the scan orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Worker threads consuming the directory-walk queue.
    pub max_workers: usize,
    /// Capacity of the bounded file-path queue; the walker blocks when full.
    pub queue_capacity: usize,
    /// Page size used when a caller passes no (or a non-positive) limit.
    pub default_page_limit: usize,
    /// Root directory for zip-upload staging.
    pub dest_root: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_workers: 20,
            queue_capacity: 1000,
            default_page_limit: 100,
            dest_root: ".temp".to_string(),
        }
    }
}

impl ScanConfig {
    /// Load configuration from the given path.
    pub fn load(path: &Path) -> Result<Self, SrcmapError> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| SrcmapError::Config(e.to_string()))
    }

    /// Save configuration to the given path.
    pub fn save(&self, path: &Path) -> Result<(), SrcmapError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| SrcmapError::Config(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load from the given path, or return defaults if the file is absent.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_default()
        } else {
            Self::default()
        }
    }
}
