//! Conversions from ndarray rasters to `image` buffers.

use image::{Rgb, RgbImage};
use ndarray::ArrayView3;

/// Converts an `(height, width, 3)` RGB array to an image::RgbImage.
///
/// # Panics
/// If the last axis is not of length 3.
pub fn array3_to_rgb_image(arr: ArrayView3<u8>) -> RgbImage {
    let (height, width, channels) = arr.dim();
    assert_eq!(channels, 3, "RGB array must have 3 channels");

    RgbImage::from_fn(width as u32, height as u32, |x, y| {
        let (row, col) = (y as usize, x as usize);
        Rgb([arr[[row, col, 0]], arr[[row, col, 1]], arr[[row, col, 2]]])
    })
}
