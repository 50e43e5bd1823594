//! Quick-look overlay of detections on a single frame.
//!
//! The chosen frame is normalized to 8-bit grayscale with its own min/max and
//! every labeled pixel is blended toward pure red by `alpha`. Rendering works
//! on plain ndarray buffers; PNG export needs the `overlay` cargo feature
//! (enabled by default) and fails with [`OverlayError::RenderingUnavailable`]
//! without it, leaving the numeric pipeline unaffected.

use crate::config::ConfigError;
use crate::series::Series;
use log::{info, warn};
use ndarray::{Array2, Array3, ArrayView2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("No labels provided for overlay rendering")]
    EmptyLabels,

    #[error("Invalid time index {requested} for overlay (valid range 0..{len})")]
    TimeIndexOutOfRange { requested: usize, len: usize },

    #[error("Shape mismatch: frame{frame:?} vs label{labels:?}")]
    ShapeMismatch {
        frame: (usize, usize),
        labels: (usize, usize),
    },

    #[error(
        "PNG export is unavailable in this build; rebuild morpho with `--features overlay`"
    )]
    RenderingUnavailable,

    #[error("Failed to write overlay image: {0}")]
    Encode(String),
}

pub type Result<T> = std::result::Result<T, OverlayError>;

/// Frame selector for the overlay: the last frame or an explicit index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "TimeIndexRepr", into = "TimeIndexRepr")]
pub enum TimeIndex {
    #[default]
    Last,
    At(usize),
}

impl TimeIndex {
    /// Resolve against a sequence of `len` frames.
    pub fn resolve(self, len: usize) -> Result<usize> {
        let requested = match self {
            TimeIndex::Last => len.checked_sub(1).ok_or(OverlayError::EmptyLabels)?,
            TimeIndex::At(t) => t,
        };
        if requested >= len {
            return Err(OverlayError::TimeIndexOutOfRange { requested, len });
        }
        Ok(requested)
    }
}

impl FromStr for TimeIndex {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("last") {
            return Ok(TimeIndex::Last);
        }
        s.parse::<usize>()
            .map(TimeIndex::At)
            .map_err(|_| ConfigError::InvalidTimeIndex(s.to_string()))
    }
}

impl fmt::Display for TimeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeIndex::Last => write!(f, "last"),
            TimeIndex::At(t) => write!(f, "{t}"),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum TimeIndexRepr {
    Index(usize),
    Keyword(String),
}

impl TryFrom<TimeIndexRepr> for TimeIndex {
    type Error = ConfigError;

    fn try_from(repr: TimeIndexRepr) -> std::result::Result<Self, Self::Error> {
        match repr {
            TimeIndexRepr::Index(t) => Ok(TimeIndex::At(t)),
            TimeIndexRepr::Keyword(s) => s.parse(),
        }
    }
}

impl From<TimeIndex> for TimeIndexRepr {
    fn from(index: TimeIndex) -> Self {
        match index {
            TimeIndex::Last => TimeIndexRepr::Keyword("last".to_string()),
            TimeIndex::At(t) => TimeIndexRepr::Index(t),
        }
    }
}

/// Linearly map `frame` onto 0..=255 using its own NaN-ignoring min and max.
///
/// A frame with no dynamic range, or whose min/max is not finite, renders
/// entirely black.
pub fn normalize_to_gray(frame: ArrayView2<f64>) -> Array2<u8> {
    let (vmin, vmax) = frame
        .iter()
        .filter(|v| !v.is_nan())
        .fold((f64::NAN, f64::NAN), |(lo, hi), &v| (v.min(lo), v.max(hi)));

    if !vmin.is_finite() || !vmax.is_finite() || vmax <= vmin {
        warn!("Degenerate frame range [{vmin}, {vmax}]; rendering black");
        return Array2::zeros(frame.dim());
    }

    let span = vmax - vmin;
    frame.mapv(|v| (((v - vmin) / span).clamp(0.0, 1.0) * 255.0) as u8)
}

/// Render frame `t` of `series` with `labels[t] > 0` tinted red.
///
/// `alpha` is clamped into `[0, 1]`; NaN is treated as 0.
///
/// # Returns
/// An RGB raster shaped `(H, W, 3)`
///
/// # Errors
/// * [`OverlayError::EmptyLabels`] if `labels` is empty
/// * [`OverlayError::TimeIndexOutOfRange`] if `t` does not resolve into both
///   `labels` and `series`
/// * [`OverlayError::ShapeMismatch`] if the frame and its labels differ in shape
pub fn render_overlay(
    series: &Series,
    labels: &[Array2<u32>],
    t: TimeIndex,
    alpha: f64,
) -> Result<Array3<u8>> {
    if labels.is_empty() {
        return Err(OverlayError::EmptyLabels);
    }

    let t_idx = t.resolve(labels.len())?;
    if t_idx >= series.len() {
        return Err(OverlayError::TimeIndexOutOfRange {
            requested: t_idx,
            len: series.len(),
        });
    }

    let frame = series.frame(t_idx);
    let lab = &labels[t_idx];
    if frame.dim() != lab.dim() {
        return Err(OverlayError::ShapeMismatch {
            frame: frame.dim(),
            labels: lab.dim(),
        });
    }

    let alpha = if alpha.is_nan() {
        0.0
    } else {
        alpha.clamp(0.0, 1.0)
    };

    let gray = normalize_to_gray(frame);
    let (height, width) = gray.dim();
    let mut rgb = Array3::<u8>::zeros((height, width, 3));

    for ((row, col), &g) in gray.indexed_iter() {
        let g = g as f64;
        let pixel = if lab[[row, col]] > 0 {
            [
                (1.0 - alpha) * g + alpha * 255.0,
                (1.0 - alpha) * g,
                (1.0 - alpha) * g,
            ]
        } else {
            [g, g, g]
        };
        for (channel, value) in pixel.into_iter().enumerate() {
            rgb[[row, col, channel]] = value as u8;
        }
    }

    Ok(rgb)
}

/// Render an overlay and write it to `out_path` as PNG.
///
/// Nothing is written when rendering fails.
pub fn save_overlay_png(
    series: &Series,
    labels: &[Array2<u32>],
    out_path: &Path,
    t: TimeIndex,
    alpha: f64,
) -> Result<()> {
    let rgb = render_overlay(series, labels, t, alpha)?;
    write_png(&rgb, out_path)?;
    info!("Overlay for t={t} written to {}", out_path.display());
    Ok(())
}

#[cfg(feature = "overlay")]
fn write_png(rgb: &Array3<u8>, out_path: &Path) -> Result<()> {
    crate::image_proc::image::array3_to_rgb_image(rgb.view())
        .save_with_format(out_path, image::ImageFormat::Png)
        .map_err(|e| OverlayError::Encode(e.to_string()))
}

#[cfg(not(feature = "overlay"))]
fn write_png(_rgb: &Array3<u8>, _out_path: &Path) -> Result<()> {
    Err(OverlayError::RenderingUnavailable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    fn ramp_series(frames: usize) -> Series {
        Series::new(Array3::from_shape_fn((frames, 2, 2), |(_, r, c)| {
            (r * 2 + c) as f64
        }))
        .unwrap()
    }

    #[test]
    fn test_time_index_resolution() {
        assert_eq!(TimeIndex::Last.resolve(3).unwrap(), 2);
        assert_eq!(TimeIndex::At(0).resolve(3).unwrap(), 0);
        assert!(matches!(
            TimeIndex::At(5).resolve(3),
            Err(OverlayError::TimeIndexOutOfRange {
                requested: 5,
                len: 3
            })
        ));
    }

    #[test]
    fn test_time_index_parsing() {
        assert_eq!("last".parse::<TimeIndex>().unwrap(), TimeIndex::Last);
        assert_eq!(" 4 ".parse::<TimeIndex>().unwrap(), TimeIndex::At(4));
        assert!(matches!(
            "first".parse::<TimeIndex>(),
            Err(ConfigError::InvalidTimeIndex(_))
        ));
        assert!("-1".parse::<TimeIndex>().is_err());
    }

    #[test]
    fn test_time_index_serde() {
        assert_eq!(serde_json::to_string(&TimeIndex::Last).unwrap(), "\"last\"");
        assert_eq!(serde_json::to_string(&TimeIndex::At(2)).unwrap(), "2");
        let parsed: TimeIndex = serde_json::from_str("7").unwrap();
        assert_eq!(parsed, TimeIndex::At(7));
        assert!(serde_json::from_str::<TimeIndex>("\"soon\"").is_err());
    }

    #[test]
    fn test_gray_normalization() {
        let frame = arr2(&[[0.0, 1.0], [2.0, 4.0]]);
        let gray = normalize_to_gray(frame.view());
        assert_eq!(gray, arr2(&[[0, 63], [127, 255]]));
    }

    #[test]
    fn test_degenerate_frames_render_black() {
        let flat = Array2::from_elem((3, 3), 5.0);
        assert!(normalize_to_gray(flat.view()).iter().all(|&v| v == 0));

        let nan = Array2::from_elem((3, 3), f64::NAN);
        assert!(normalize_to_gray(nan.view()).iter().all(|&v| v == 0));

        let inf = arr2(&[[0.0, f64::INFINITY]]);
        assert!(normalize_to_gray(inf.view()).iter().all(|&v| v == 0));
    }

    #[test]
    fn test_blend_toward_red() {
        let series = ramp_series(3);
        let labels = vec![Array2::zeros((2, 2)); 2]
            .into_iter()
            .chain(std::iter::once(arr2(&[[0, 0], [0, 1]])))
            .collect::<Vec<_>>();

        let rgb = render_overlay(&series, &labels, TimeIndex::Last, 0.5).unwrap();

        assert_eq!(rgb.dim(), (2, 2, 3));
        // Background keeps its gray value (1/3 * 255 = 85).
        assert_eq!([rgb[[0, 1, 0]], rgb[[0, 1, 1]], rgb[[0, 1, 2]]], [85, 85, 85]);
        // 255 blended half-way toward (255, 0, 0).
        assert_eq!([rgb[[1, 1, 0]], rgb[[1, 1, 1]], rgb[[1, 1, 2]]], [255, 127, 127]);
    }

    #[test]
    fn test_alpha_is_clamped() {
        let series = ramp_series(1);
        let labels = vec![Array2::from_elem((2, 2), 1u32)];

        let over = render_overlay(&series, &labels, TimeIndex::At(0), 1.5).unwrap();
        let full = render_overlay(&series, &labels, TimeIndex::At(0), 1.0).unwrap();
        assert_eq!(over, full);
        assert!(full.outer_iter().all(|row| row
            .outer_iter()
            .all(|px| px.to_vec() == vec![255, 0, 0])));

        let under = render_overlay(&series, &labels, TimeIndex::At(0), -3.0).unwrap();
        let none = render_overlay(&series, &labels, TimeIndex::At(0), 0.0).unwrap();
        assert_eq!(under, none);
    }

    #[test]
    fn test_render_errors() {
        let series = ramp_series(3);

        assert!(matches!(
            render_overlay(&series, &[], TimeIndex::Last, 0.4),
            Err(OverlayError::EmptyLabels)
        ));

        let labels = vec![Array2::zeros((2, 2)); 3];
        assert!(matches!(
            render_overlay(&series, &labels, TimeIndex::At(5), 0.4),
            Err(OverlayError::TimeIndexOutOfRange {
                requested: 5,
                len: 3
            })
        ));

        let wide = vec![Array2::zeros((2, 1)); 3];
        assert!(matches!(
            render_overlay(&series, &wide, TimeIndex::Last, 0.4),
            Err(OverlayError::ShapeMismatch {
                frame: (2, 2),
                labels: (2, 1)
            })
        ));
    }

    #[cfg(not(feature = "overlay"))]
    #[test]
    fn test_png_export_unavailable_without_feature() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("overlay.png");
        let series = ramp_series(2);
        let labels = vec![Array2::zeros((2, 2)); 2];

        // Rendering still works; only the export is missing.
        assert!(render_overlay(&series, &labels, TimeIndex::Last, 0.4).is_ok());
        assert!(matches!(
            save_overlay_png(&series, &labels, &path, TimeIndex::Last, 0.4),
            Err(OverlayError::RenderingUnavailable)
        ));
        assert!(!path.exists());
    }
}
