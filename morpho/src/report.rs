//! Report writers: the detection table (JSON records or CSV rows), the summary
//! JSON, and a quick-look scatter figure of centroids over time.

use crate::config::ConfigError;
use crate::tracking::DetectionTable;
use log::info;
use plotters::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Column order of the detection table.
pub const COLUMNS: [&str; 7] = [
    "label",
    "area",
    "centroid-0",
    "centroid-1",
    "max_intensity",
    "mean_intensity",
    "t",
];

const FIGURE_SIZE: (u32, u32) = (800, 600);

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV serialization failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to draw figure {path}: {message}")]
    Plot { path: PathBuf, message: String },
}

pub type Result<T> = std::result::Result<T, ReportError>;

/// On-disk layout of the detection table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Array of record objects.
    #[default]
    Json,
    /// Header row followed by one delimited row per detection.
    Csv,
}

impl FromStr for ReportFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(ReportFormat::Json),
            "csv" => Ok(ReportFormat::Csv),
            _ => Err(ConfigError::UnsupportedFormat(s.to_string())),
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportFormat::Json => write!(f, "json"),
            ReportFormat::Csv => write!(f, "csv"),
        }
    }
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        })
}

fn flush(mut writer: impl Write, path: &Path) -> Result<()> {
    writer.flush().map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Write the detection table to `path` in `format`.
///
/// An empty table is written as `[]` (JSON) or a header-only file (CSV).
pub fn write_table(table: &DetectionTable, path: &Path, format: ReportFormat) -> Result<()> {
    let writer = create(path)?;
    match format {
        ReportFormat::Json => {
            let mut writer = writer;
            serde_json::to_writer_pretty(&mut writer, table)?;
            flush(writer, path)?;
        }
        ReportFormat::Csv => {
            let mut csv_writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(writer);
            csv_writer.write_record(COLUMNS)?;
            for detection in table {
                csv_writer.serialize(detection)?;
            }
            csv_writer.flush().map_err(|source| ReportError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        }
    }
    Ok(())
}

/// Write any summary mapping as pretty-printed JSON.
pub fn save_summary<T: Serialize>(summary: &T, path: &Path) -> Result<()> {
    let mut writer = create(path)?;
    serde_json::to_writer_pretty(&mut writer, summary)?;
    writer.write_all(b"\n").map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    flush(writer, path)
}

/// Scatter plot of detection centroids (column vs. row), colored by frame.
pub fn plot_centroids(table: &DetectionTable, fig_path: &Path) -> Result<()> {
    draw_centroids(table, fig_path).map_err(|e| ReportError::Plot {
        path: fig_path.to_path_buf(),
        message: e.to_string(),
    })
}

fn draw_centroids(
    table: &DetectionTable,
    fig_path: &Path,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let max_col = table.iter().map(|d| d.centroid_col).fold(1.0, f64::max);
    let max_row = table.iter().map(|d| d.centroid_row).fold(1.0, f64::max);
    let last_t = table.iter().map(|d| d.t).max().unwrap_or(0).max(1) as f64;

    let root = BitMapBackend::new(fig_path, FIGURE_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Detections over time", ("sans-serif", 24))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0.0..max_col * 1.05, 0.0..max_row * 1.05)?;

    chart
        .configure_mesh()
        .x_desc("centroid-1 (column)")
        .y_desc("centroid-0 (row)")
        .draw()?;

    chart.draw_series(table.iter().map(|d| {
        let hue = 0.7 * d.t as f64 / last_t;
        Circle::new(
            (d.centroid_col, d.centroid_row),
            4,
            HSLColor(hue, 0.9, 0.45).filled(),
        )
    }))?;

    root.present()?;
    Ok(())
}

/// Write the detection table and its centroid figure.
///
/// The table is written first, so a drawing failure never loses the report.
pub fn save_report(
    table: &DetectionTable,
    out_path: &Path,
    fig_path: &Path,
    format: ReportFormat,
) -> Result<()> {
    write_table(table, out_path, format)?;
    info!(
        "Report with {} row(s) written to {} ({format})",
        table.len(),
        out_path.display()
    );

    plot_centroids(table, fig_path)?;
    info!("Figure written to {}", fig_path.display());
    Ok(())
}
