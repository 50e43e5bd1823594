//! The `morphoctl` command surface.
//!
//! Argument parsing and the three commands live here so they can be driven
//! from tests; `src/bin/morphoctl.rs` only parses, runs and maps the outcome to
//! an exit status. Every argument is validated before the series is read, and
//! the numeric report is always written before any image output.

use crate::config::{OverlayConfig, ReportConfig, TrackingConfig};
use crate::overlay::save_overlay_png;
use crate::report::{plot_centroids, save_summary, write_table, ReportFormat};
use crate::tracking::{detection_labels, track, track_objects};
use crate::{get_metrics, metrics, synth, MorphoError, Series, TimeIndex};
use clap::{Parser, Subcommand, ValueEnum};
use log::{debug, info};
use ndarray::{Array3, ArrayD};
use ndarray_npy::{read_npy, write_npy, ReadNpyError};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Process exit status for any failure, including argument errors.
pub const EXIT_FAILURE: u8 = 2;

#[derive(Parser)]
#[command(name = "morphoctl", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Detailed per-detection report with a centroid figure
    Report {
        /// Input series (.npy, shaped T,H,W)
        series: PathBuf,

        /// Report output path
        #[arg(long, default_value = "report.json")]
        out: PathBuf,

        /// Report format: json or csv
        #[arg(long)]
        format: Option<String>,

        /// Optional summary JSON output path
        #[arg(long)]
        summary_out: Option<PathBuf>,

        /// Foreground threshold
        #[arg(long)]
        threshold: Option<f64>,

        /// Neighbor count: 4 or 8
        #[arg(long)]
        connectivity: Option<u32>,

        /// Minimum region area in pixels
        #[arg(long)]
        min_area: Option<usize>,

        /// Quick-look figure path
        #[arg(long, default_value = "report.png")]
        fig: PathBuf,

        /// Time index for the overlay: integer or 'last'
        #[arg(long)]
        fig_t: Option<String>,

        /// Overlay alpha in [0,1]
        #[arg(long)]
        alpha: Option<f64>,

        /// Optional overlay PNG of frame --fig-t
        #[arg(long)]
        overlay: Option<PathBuf>,

        /// JSON run configuration; flags override its values
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Per-frame labeling with area metrics and an optional overlay
    Track {
        /// Input series (.npy, shaped T,H,W)
        series: PathBuf,

        /// Metrics JSON output path
        #[arg(long, default_value = "summary.json")]
        out: PathBuf,

        /// Optional overlay PNG output path
        #[arg(long)]
        overlay: Option<PathBuf>,

        /// Foreground threshold (default: mean of each frame)
        #[arg(long)]
        threshold: Option<f64>,

        /// Neighbor count: 4 or 8
        #[arg(long, default_value_t = 4)]
        connectivity: u32,

        /// Frame-level minimum foreground area
        #[arg(long, default_value_t = 5)]
        min_area: usize,

        /// Overlay time index: integer or 'last'
        #[arg(long, default_value = "last")]
        t: String,

        /// Overlay alpha in [0,1]
        #[arg(long, default_value_t = 0.4)]
        alpha: f64,
    },

    /// Write a synthetic series to .npy (float32)
    Synth {
        /// Output path
        out: PathBuf,

        #[arg(long, value_enum, default_value_t = SynthKind::Blob)]
        kind: SynthKind,

        #[arg(long, default_value_t = 20)]
        frames: usize,

        #[arg(long, default_value_t = 128)]
        height: usize,

        #[arg(long, default_value_t = 128)]
        width: usize,

        /// Blob radius in pixels (blob only)
        #[arg(long, default_value_t = 10.0)]
        radius: f64,

        /// Noise seed (hotspots only)
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum SynthKind {
    /// Gaussian blob drifting across the frame
    Blob,
    /// Three static hotspots with a pulsing radius and noise
    Hotspots,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Series not found: {0}")]
    SeriesNotFound(PathBuf),

    #[error("Failed to read .npy {path}: {source}")]
    ReadNpy {
        path: PathBuf,
        #[source]
        source: ReadNpyError,
    },

    #[error("Failed to write .npy {path}: {message}")]
    WriteNpy { path: PathBuf, message: String },

    #[error(transparent)]
    Morpho(#[from] MorphoError),
}

pub type CliResult<T> = Result<T, CliError>;

/// Read a float32 or float64 `.npy` file into a validated series.
pub fn load_series(path: &Path) -> CliResult<Series> {
    if !path.exists() {
        return Err(CliError::SeriesNotFound(path.to_path_buf()));
    }

    let data: ArrayD<f64> = match read_npy::<_, ArrayD<f32>>(path) {
        Ok(data) => data.mapv(f64::from),
        Err(ReadNpyError::WrongDescriptor(_)) => {
            debug!("{} is not float32, retrying as float64", path.display());
            read_npy::<_, ArrayD<f64>>(path).map_err(|source| CliError::ReadNpy {
                path: path.to_path_buf(),
                source,
            })?
        }
        Err(source) => {
            return Err(CliError::ReadNpy {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let series = Series::from_dyn(data).map_err(MorphoError::from)?;
    info!(
        "Loaded {} with {} frame(s) of {:?}",
        path.display(),
        series.len(),
        series.frame_shape()
    );
    Ok(series)
}

fn parse<T>(value: &str) -> CliResult<T>
where
    T: std::str::FromStr<Err = crate::config::ConfigError>,
{
    value
        .parse::<T>()
        .map_err(|e| CliError::Morpho(MorphoError::from(e)))
}

#[allow(clippy::too_many_arguments)]
fn run_report(
    series_path: &Path,
    out: &Path,
    format: Option<String>,
    summary_out: Option<PathBuf>,
    threshold: Option<f64>,
    connectivity: Option<u32>,
    min_area: Option<usize>,
    fig: &Path,
    fig_t: Option<String>,
    alpha: Option<f64>,
    overlay: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> CliResult<()> {
    let mut config = match config_path {
        Some(path) => ReportConfig::load_from_file(&path).map_err(MorphoError::from)?,
        None => ReportConfig::default(),
    };
    if let Some(format) = format {
        config.format = parse::<ReportFormat>(&format)?;
    }
    if let Some(threshold) = threshold {
        config.detection.threshold = threshold;
    }
    if let Some(connectivity) = connectivity {
        config.detection.connectivity = connectivity;
    }
    if let Some(min_area) = min_area {
        config.detection.min_area = min_area;
    }
    if let Some(fig_t) = fig_t {
        config.overlay.time_index = parse::<TimeIndex>(&fig_t)?;
    }
    if let Some(alpha) = alpha {
        config.overlay.alpha = alpha;
    }
    config.validate().map_err(MorphoError::from)?;

    let series = load_series(series_path)?;

    let table = track_objects(&series, &config.detection).map_err(MorphoError::from)?;
    write_table(&table, out, config.format).map_err(MorphoError::from)?;
    info!("Report with {} row(s) written to {}", table.len(), out.display());

    if let Some(summary_out) = summary_out {
        save_summary(&get_metrics(&table), &summary_out).map_err(MorphoError::from)?;
    }

    plot_centroids(&table, fig).map_err(MorphoError::from)?;

    if let Some(overlay) = overlay {
        let labels = detection_labels(&series, &config.detection);
        save_overlay_png(
            &series,
            &labels,
            &overlay,
            config.overlay.time_index,
            config.overlay.alpha,
        )
        .map_err(MorphoError::from)?;
        println!("OK: overlay {}", overlay.display());
    }

    println!(
        "OK: detailed report {} + figure {}",
        out.display(),
        fig.display()
    );
    Ok(())
}

fn run_track(
    series_path: &Path,
    out: &Path,
    overlay: Option<PathBuf>,
    tracking: TrackingConfig,
    t: &str,
    alpha: f64,
) -> CliResult<()> {
    let overlay_config = OverlayConfig {
        time_index: parse::<TimeIndex>(t)?,
        alpha,
    };
    overlay_config.validate().map_err(MorphoError::from)?;

    let series = load_series(series_path)?;

    let tracks = track(&series, &tracking);
    save_summary(&metrics(&tracks), out).map_err(MorphoError::from)?;
    println!("OK: metrics {}", out.display());

    if let Some(overlay) = overlay {
        save_overlay_png(
            &series,
            &tracks.labels,
            &overlay,
            overlay_config.time_index,
            overlay_config.alpha,
        )
        .map_err(MorphoError::from)?;
        println!("OK: overlay {}", overlay.display());
    }
    Ok(())
}

fn run_synth(out: &Path, data: Array3<f64>) -> CliResult<()> {
    write_npy(out, &data.mapv(|v| v as f32)).map_err(|e| CliError::WriteNpy {
        path: out.to_path_buf(),
        message: e.to_string(),
    })?;
    println!("OK: synthetic series {:?} written to {}", data.dim(), out.display());
    Ok(())
}

pub fn run(cli: Cli) -> CliResult<()> {
    match cli.command {
        Commands::Report {
            series,
            out,
            format,
            summary_out,
            threshold,
            connectivity,
            min_area,
            fig,
            fig_t,
            alpha,
            overlay,
            config,
        } => run_report(
            &series,
            &out,
            format,
            summary_out,
            threshold,
            connectivity,
            min_area,
            &fig,
            fig_t,
            alpha,
            overlay,
            config,
        ),
        Commands::Track {
            series,
            out,
            overlay,
            threshold,
            connectivity,
            min_area,
            t,
            alpha,
        } => {
            let tracking = TrackingConfig {
                threshold,
                connectivity,
                min_area,
            };
            run_track(&series, &out, overlay, tracking, &t, alpha)
        }
        Commands::Synth {
            out,
            kind,
            frames,
            height,
            width,
            radius,
            seed,
        } => {
            let data = match kind {
                SynthKind::Blob => synth::moving_blob(frames, height, width, radius),
                SynthKind::Hotspots => synth::pulsing_hotspots(frames, height, width, seed),
            };
            run_synth(&out, data)
        }
    }
}

/// Exit status for the outcome of [`run`].
pub fn exit_code(result: &CliResult<()>) -> u8 {
    match result {
        Ok(()) => 0,
        Err(_) => EXIT_FAILURE,
    }
}
