//! Synthetic intensity series for demos and tests.
//!
//! Both generators return plain `(T, H, W)` arrays with values in `[0, 1]`;
//! wrap them with [`crate::Series::new`] before running the pipeline.

use ndarray::{Array, Array2, Array3, Axis, Dimension};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};
use std::f64::consts::PI;

/// Start position `(row, col)` of the moving blob.
pub const BLOB_START: (f64, f64) = (20.0, 20.0);

/// Per-frame displacement `(row, col)` of the moving blob.
pub const BLOB_VELOCITY: (f64, f64) = (2.0, 3.0);

/// Hotspot centers `(row, col)` and radii on a 128 × 128 reference grid.
const HOTSPOTS: [((f64, f64), f64); 3] = [
    ((32.0, 40.0), 8.0),
    ((80.0, 70.0), 10.0),
    ((96.0, 24.0), 6.0),
];
const REFERENCE_SIZE: f64 = 128.0;
const PULSE_PERIOD: f64 = 6.0;
const PULSE_DEPTH: f64 = 0.1;
const NOISE_SIGMA: f64 = 0.05;

fn gaussian(d2: f64, radius: f64) -> f64 {
    (-d2 / (2.0 * radius * radius)).exp()
}

/// Rescale `values` in place so its minimum is 0 and its maximum is 1.
///
/// A constant array is shifted to 0 and left there.
fn normalize_in_place<D: Dimension>(values: &mut Array<f64, D>) {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    values.mapv_inplace(|v| v - min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max > 0.0 {
        values.mapv_inplace(|v| v / max);
    }
}

/// A single Gaussian blob of the given radius drifting diagonally across the
/// frame, normalized over the whole series.
pub fn moving_blob(frames: usize, height: usize, width: usize, radius: f64) -> Array3<f64> {
    let mut series = Array3::<f64>::zeros((frames, height, width));

    for (t, mut frame) in series.axis_iter_mut(Axis(0)).enumerate() {
        let row0 = BLOB_START.0 + BLOB_VELOCITY.0 * t as f64;
        let col0 = BLOB_START.1 + BLOB_VELOCITY.1 * t as f64;
        frame.indexed_iter_mut().for_each(|((r, c), v)| {
            let d2 = (r as f64 - row0).powi(2) + (c as f64 - col0).powi(2);
            *v = gaussian(d2, radius);
        });
    }

    normalize_in_place(&mut series);
    series
}

/// Three static hotspots whose radius pulses sinusoidally, plus Gaussian
/// noise. Every frame is normalized independently.
///
/// Hotspot positions and sizes scale with the frame size. The same `seed`
/// always yields the same series.
pub fn pulsing_hotspots(frames: usize, height: usize, width: usize, seed: u64) -> Array3<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let row_scale = height as f64 / REFERENCE_SIZE;
    let col_scale = width as f64 / REFERENCE_SIZE;
    let radius_scale = row_scale.min(col_scale);

    let mut series = Array3::<f64>::zeros((frames, height, width));

    for (t, mut frame) in series.axis_iter_mut(Axis(0)).enumerate() {
        let pulse = 1.0 + PULSE_DEPTH * (2.0 * PI * t as f64 / PULSE_PERIOD).sin();

        let mut arr = Array2::<f64>::zeros((height, width));
        for &((row, col), radius) in &HOTSPOTS {
            let (row0, col0) = (row * row_scale, col * col_scale);
            let r = radius * radius_scale * pulse;
            arr.indexed_iter_mut().for_each(|((y, x), v)| {
                let d2 = (y as f64 - row0).powi(2) + (x as f64 - col0).powi(2);
                *v += gaussian(d2, r);
            });
        }

        arr.mapv_inplace(|v| {
            let noise: f64 = StandardNormal.sample(&mut rng);
            v + NOISE_SIGMA * noise
        });
        normalize_in_place(&mut arr);

        frame.assign(&arr);
    }

    series
}
