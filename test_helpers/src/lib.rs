//! Testing infrastructure shared by the morpho unit and integration tests.
//!
//! Two concerns live here:
//!
//! - **Artifact paths**: locating the workspace root and a `test_output/`
//!   directory where tests may leave reports, figures and overlays for manual
//!   inspection.
//! - **Frame fixtures**: tiny deterministic intensity frames and series
//!   (rectangles, Gaussian spots) whose segmentation and labeling outcome is
//!   known in advance.
//!
//! # Usage
//!
//! ```rust
//! use test_helpers::{gaussian_spot_series, output_path};
//!
//! let series = gaussian_spot_series(3, 32, 32, &[(8.0, 8.0)], 2.0);
//! assert_eq!(series.dim(), (3, 32, 32));
//!
//! let overlay = output_path("overlay_smoke.png");
//! assert!(overlay.starts_with(test_helpers::get_output_dir()));
//! ```

use ndarray::{Array2, Array3};
use once_cell::sync::Lazy;
use std::env;
use std::path::{Path, PathBuf};

/// Errors raised while setting up the test environment.
#[derive(thiserror::Error, Debug)]
pub enum TestHelperError {
    #[error("Cannot determine the working directory: {0}")]
    CurrentDir(#[source] std::io::Error),

    /// No ancestor of the working directory holds a workspace manifest.
    #[error("No morpho workspace manifest above {0}")]
    WorkspaceNotFound(PathBuf),
}

fn is_workspace_manifest(manifest: &Path) -> bool {
    std::fs::read_to_string(manifest)
        .map(|content| content.lines().any(|line| line.trim() == "[workspace]"))
        .unwrap_or(false)
}

/// Nearest ancestor of the working directory whose `Cargo.toml` declares a
/// `[workspace]`. Integration tests run from the member crate, so this is where
/// shared artifacts go.
pub fn find_project_root() -> Result<PathBuf, TestHelperError> {
    let start = env::current_dir().map_err(TestHelperError::CurrentDir)?;
    let root = start
        .ancestors()
        .find(|dir| is_workspace_manifest(&dir.join("Cargo.toml")))
        .map(Path::to_path_buf);
    root.ok_or(TestHelperError::WorkspaceNotFound(start))
}

static PROJECT_ROOT: Lazy<PathBuf> =
    Lazy::new(|| find_project_root().expect("morpho tests must run inside the workspace"));

/// `<workspace>/test_output`, where tests leave overlays and figures for
/// inspection. Created on first use.
pub fn get_output_dir() -> PathBuf {
    let output_dir = PROJECT_ROOT.join("test_output");
    std::fs::create_dir_all(&output_dir).expect("cannot create test_output directory");
    output_dir
}

/// Path of an artifact inside [`get_output_dir`].
pub fn output_path<P: AsRef<Path>>(path: P) -> PathBuf {
    get_output_dir().join(path)
}

/// Frame of `background` with the half-open rectangles `(row0, col0, row1, col1)`
/// filled with `value`.
pub fn rect_frame(
    height: usize,
    width: usize,
    rects: &[(usize, usize, usize, usize)],
    value: f64,
    background: f64,
) -> Array2<f64> {
    let mut frame = Array2::from_elem((height, width), background);
    for &(r0, c0, r1, c1) in rects {
        for r in r0..r1.min(height) {
            for c in c0..c1.min(width) {
                frame[[r, c]] = value;
            }
        }
    }
    frame
}

/// Unit-amplitude Gaussian spots on a zero background.
///
/// `centers` holds `(row, col)` pairs; overlapping spots take the maximum.
pub fn gaussian_spot_frame(
    height: usize,
    width: usize,
    centers: &[(f64, f64)],
    sigma: f64,
) -> Array2<f64> {
    let two_sigma2 = 2.0 * sigma * sigma;
    Array2::from_shape_fn((height, width), |(r, c)| {
        centers
            .iter()
            .map(|&(cr, cc)| {
                let dr = r as f64 - cr;
                let dc = c as f64 - cc;
                (-(dr * dr + dc * dc) / two_sigma2).exp()
            })
            .fold(0.0, f64::max)
    })
}

/// The same Gaussian spot frame repeated `frames` times.
pub fn gaussian_spot_series(
    frames: usize,
    height: usize,
    width: usize,
    centers: &[(f64, f64)],
    sigma: f64,
) -> Array3<f64> {
    let frame = gaussian_spot_frame(height, width, centers, sigma);
    let mut series = Array3::zeros((frames, height, width));
    for mut slice in series.outer_iter_mut() {
        slice.assign(&frame);
    }
    series
}
