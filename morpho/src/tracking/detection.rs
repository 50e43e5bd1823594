//! Detailed path: per-component measurements collected across all frames.

use crate::config::DetectionConfig;
use crate::image_proc::regions::{extract_regions, RegionError, RegionProps};
use crate::image_proc::{connected_components, label, segment};
use crate::series::Series;
use log::{debug, info};
use ndarray::Array2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One kept connected component in one frame.
///
/// Field names follow the report columns
/// `label, area, centroid-0, centroid-1, max_intensity, mean_intensity, t`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: u32,
    pub area: usize,
    /// Centroid row.
    #[serde(rename = "centroid-0")]
    pub centroid_row: f64,
    /// Centroid column.
    #[serde(rename = "centroid-1")]
    pub centroid_col: f64,
    pub max_intensity: f64,
    pub mean_intensity: f64,
    /// Frame index.
    pub t: usize,
}

impl Detection {
    pub fn from_region(region: RegionProps, t: usize) -> Self {
        Self {
            label: region.label,
            area: region.area,
            centroid_row: region.centroid.0,
            centroid_col: region.centroid.1,
            max_intensity: region.max_intensity,
            mean_intensity: region.mean_intensity,
            t,
        }
    }
}

/// Rows of [`Detection`], ordered by frame index then label.
///
/// Frames without any kept detection contribute no rows, so an empty table is
/// a valid result.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DetectionTable {
    rows: Vec<Detection>,
}

impl DetectionTable {
    pub fn new(rows: Vec<Detection>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Detection] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Detection> {
        self.rows.iter()
    }

    /// Distinct frame indices present in the table, ascending.
    pub fn frames(&self) -> BTreeSet<usize> {
        self.rows.iter().map(|d| d.t).collect()
    }
}

impl<'a> IntoIterator for &'a DetectionTable {
    type Item = &'a Detection;
    type IntoIter = std::slice::Iter<'a, Detection>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

fn detect_frame(
    series: &Series,
    t: usize,
    config: &DetectionConfig,
) -> Result<Vec<Detection>, RegionError> {
    let frame = series.frame(t);
    let mask = segment(frame, Some(config.threshold));
    let labels = label(mask.view(), config.connectivity());
    let regions = extract_regions(labels.view(), frame, config.min_area)?;
    debug!("frame {t}: {} detection(s) kept", regions.len());

    Ok(regions
        .into_iter()
        .map(|region| Detection::from_region(region, t))
        .collect())
}

fn kept_labels(series: &Series, t: usize, config: &DetectionConfig) -> Array2<u32> {
    let mask = segment(series.frame(t), Some(config.threshold));
    let (mut labels, count) = connected_components(mask.view(), config.connectivity());

    let mut areas = vec![0usize; count as usize + 1];
    for &l in labels.iter() {
        areas[l as usize] += 1;
    }
    labels.mapv_inplace(|l| {
        if l > 0 && areas[l as usize] < config.min_area {
            0
        } else {
            l
        }
    });
    labels
}

/// Labeled images matching what [`track_objects`] reports: components below
/// `config.min_area` are zeroed, the rest keep their label ids.
///
/// Use these (not [`crate::tracking::track`]) when an overlay has to agree
/// with a detection table.
pub fn detection_labels(series: &Series, config: &DetectionConfig) -> Vec<Array2<u32>> {
    (0..series.len())
        .into_par_iter()
        .map(|t| kept_labels(series, t, config))
        .collect()
}

/// Segment, label and measure every frame of `series`.
///
/// Segmentation uses the fixed `config.threshold` (no mean fallback). Each
/// component is kept only if its own area reaches `config.min_area`.
pub fn track_objects(
    series: &Series,
    config: &DetectionConfig,
) -> Result<DetectionTable, RegionError> {
    let per_frame: Vec<Vec<Detection>> = (0..series.len())
        .into_par_iter()
        .map(|t| detect_frame(series, t, config))
        .collect::<Result<Vec<_>, RegionError>>()?;

    let table = DetectionTable::new(per_frame.into_iter().flatten().collect());
    info!(
        "Detected {} object(s) over {} frame(s) at threshold {}",
        table.len(),
        series.len(),
        config.threshold
    );
    Ok(table)
}
