//! Morphology and dynamics analysis for time-ordered intensity stacks.
//!
//! A *series* is a `T × H × W` array of intensities. Each frame is segmented
//! into a foreground mask, the mask is split into connected components, and the
//! components are either kept as labeled images ([`tracking::track`]) or
//! measured into per-detection records ([`tracking::track_objects`]). The
//! [`metrics`] module reduces either result into a summary, [`report`] writes
//! the detection table and a centroid figure, and [`overlay`] renders a single
//! frame with its detections tinted red.
//!
//! ```rust
//! use morpho::{metrics::metrics, series::Series, synth, tracking::{track, TrackingConfig}};
//!
//! let series = Series::new(synth::moving_blob(4, 64, 64, 6.0)).unwrap();
//! let tracks = track(&series, &TrackingConfig::default());
//! let summary = metrics(&tracks);
//! assert_eq!(summary.duration, 4);
//! assert_eq!(summary.events.len(), 4);
//! ```

pub mod cli;
pub mod config;
pub mod image_proc;
pub mod metrics;
pub mod overlay;
pub mod report;
pub mod series;
pub mod synth;
pub mod tracking;

use thiserror::Error;

/// Any failure raised by the analysis pipeline or its writers.
#[derive(Debug, Error)]
pub enum MorphoError {
    #[error(transparent)]
    Series(#[from] series::SeriesError),

    #[error(transparent)]
    Regions(#[from] image_proc::regions::RegionError),

    #[error(transparent)]
    Overlay(#[from] overlay::OverlayError),

    #[error(transparent)]
    Report(#[from] report::ReportError),

    #[error(transparent)]
    Config(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, MorphoError>;

pub use image_proc::label::Connectivity;
pub use metrics::{get_metrics, metrics, DetectionSummary, TrackSummary};
pub use overlay::{render_overlay, TimeIndex};
pub use series::Series;
pub use tracking::{run_pipeline, track, track_objects, DetectionTable, PipelineOutput, Tracks};
