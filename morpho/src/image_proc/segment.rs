//! Scalar thresholding of a single intensity frame.

use log::warn;
use ndarray::{Array2, ArrayView2};

/// Arithmetic mean of the finite values in `frame`.
///
/// NaN and ±inf are skipped. Returns `None` when the frame holds no finite
/// value at all.
pub fn finite_mean(frame: ArrayView2<f64>) -> Option<f64> {
    let (sum, count) = frame
        .iter()
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(sum, count), &v| (sum + v, count + 1));

    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Convert an intensity frame into a binary foreground mask.
///
/// A pixel is foreground iff `frame[i, j] >= threshold`, so a pixel exactly at
/// the threshold is kept. NaN pixels never compare as foreground.
///
/// When `threshold` is `None` it defaults to [`finite_mean`] of the frame. A
/// frame with no finite values has no defined mean and yields an all-background
/// mask.
///
/// # Arguments
/// * `frame` - Intensity frame
/// * `threshold` - Explicit cutoff, or `None` for the frame mean
///
/// # Returns
/// Mask with the same shape as `frame`
pub fn segment(frame: ArrayView2<f64>, threshold: Option<f64>) -> Array2<bool> {
    let cutoff = match threshold.or_else(|| finite_mean(frame)) {
        Some(cutoff) => cutoff,
        None => {
            warn!("Frame has no finite values; mean threshold undefined, mask left empty");
            return Array2::from_elem(frame.dim(), false);
        }
    };

    frame.mapv(|v| v >= cutoff)
}
