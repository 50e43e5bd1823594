//! Region properties of labeled components.
//!
//! For every positive label in a labeled image this module measures the pixel
//! area, the centroid (mean row and column of member pixels) and the maximum
//! and mean intensity of the matching pixels in the source frame. Components
//! smaller than the configured minimum area are dropped here, so nothing
//! downstream ever sees them.

use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegionError {
    #[error("Shape mismatch: labels{labels:?} vs frame{frame:?}")]
    ShapeMismatch {
        labels: (usize, usize),
        frame: (usize, usize),
    },
}

pub type Result<T> = std::result::Result<T, RegionError>;

/// Measured properties of one connected component within one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionProps {
    /// Component id within its labeled image (not stable across frames).
    pub label: u32,
    /// Member pixel count.
    pub area: usize,
    /// Mean `(row, col)` of member pixels.
    pub centroid: (f64, f64),
    pub max_intensity: f64,
    pub mean_intensity: f64,
}

#[derive(Default)]
struct Accumulator {
    area: usize,
    row_sum: f64,
    col_sum: f64,
    intensity_sum: f64,
    intensity_max: f64,
}

/// Number of labeled (non-zero) pixels.
pub fn foreground_area(labels: ArrayView2<u32>) -> usize {
    labels.iter().filter(|&&l| l > 0).count()
}

/// Measure every component of `labels` against `frame`.
///
/// Regions are returned in ascending label order. Components whose area is
/// below `min_area` are excluded.
///
/// # Arguments
/// * `labels` - Labeled image (0 = background)
/// * `frame` - Intensity frame the labels were derived from
/// * `min_area` - Minimum pixel count for a component to be kept
///
/// # Errors
/// [`RegionError::ShapeMismatch`] when `labels` and `frame` differ in shape.
pub fn extract_regions(
    labels: ArrayView2<u32>,
    frame: ArrayView2<f64>,
    min_area: usize,
) -> Result<Vec<RegionProps>> {
    if labels.dim() != frame.dim() {
        return Err(RegionError::ShapeMismatch {
            labels: labels.dim(),
            frame: frame.dim(),
        });
    }

    let mut accumulators: BTreeMap<u32, Accumulator> = BTreeMap::new();
    for ((row, col), &label) in labels.indexed_iter() {
        if label == 0 {
            continue;
        }
        let value = frame[[row, col]];
        let acc = accumulators.entry(label).or_insert_with(|| Accumulator {
            intensity_max: f64::NEG_INFINITY,
            ..Default::default()
        });
        acc.area += 1;
        acc.row_sum += row as f64;
        acc.col_sum += col as f64;
        acc.intensity_sum += value;
        acc.intensity_max = acc.intensity_max.max(value);
    }

    Ok(accumulators
        .into_iter()
        .filter(|(_, acc)| acc.area >= min_area)
        .map(|(label, acc)| {
            let n = acc.area as f64;
            RegionProps {
                label,
                area: acc.area,
                centroid: (acc.row_sum / n, acc.col_sum / n),
                max_intensity: acc.intensity_max,
                mean_intensity: acc.intensity_sum / n,
            }
        })
        .collect())
}
