//! Run configuration for the tracking, detection and overlay stages.
//!
//! Defaults mirror the command-line defaults. A [`ReportConfig`] can also be
//! read from a JSON file; any field missing from the file keeps its default.
//! Validation happens once, at the boundary, before any frame is processed.

use crate::image_proc::Connectivity;
use crate::overlay::TimeIndex;
use crate::report::ReportFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("alpha must be in [0,1], got {0}")]
    AlphaOutOfRange(f64),

    #[error("time index must be an integer or 'last', got '{0}'")]
    InvalidTimeIndex(String),

    #[error("unsupported report format '{0}' (expected 'json' or 'csv')")]
    UnsupportedFormat(String),

    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Parameters of the minimal (label-array) path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Segmentation cutoff; `None` uses each frame's mean.
    pub threshold: Option<f64>,
    /// Neighbor count (4 or 8).
    pub connectivity: u32,
    /// Frames whose total foreground is below this are blanked (only when > 1).
    pub min_area: usize,
}

impl TrackingConfig {
    pub fn connectivity(&self) -> Connectivity {
        Connectivity::from_neighbors(Some(self.connectivity), 2)
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            threshold: None,
            connectivity: 4,
            min_area: 5,
        }
    }
}

/// Parameters of the detailed (per-detection) path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub threshold: f64,
    pub connectivity: u32,
    /// Components smaller than this are dropped individually.
    pub min_area: usize,
}

impl DetectionConfig {
    pub fn connectivity(&self) -> Connectivity {
        Connectivity::from_neighbors(Some(self.connectivity), 2)
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            connectivity: 4,
            min_area: 10,
        }
    }
}

/// Which frame to render and how strongly to tint its detections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub time_index: TimeIndex,
    pub alpha: f64,
}

impl OverlayConfig {
    /// Reject alpha outside `[0, 1]` (NaN included).
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(ConfigError::AlphaOutOfRange(self.alpha));
        }
        Ok(())
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            time_index: TimeIndex::Last,
            alpha: 0.4,
        }
    }
}

/// Everything the `report` command forwards to the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ReportConfig {
    pub detection: DetectionConfig,
    pub format: ReportFormat,
    pub overlay: OverlayConfig,
}

impl ReportConfig {
    /// Load a config from a JSON file. Missing fields take their defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<()> {
        self.overlay.validate()
    }
}
