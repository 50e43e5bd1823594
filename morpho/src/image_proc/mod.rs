//! Per-frame image processing: thresholding, connected-component labeling and
//! region measurement.
//!
//! Every function here operates on a single 2-D frame (or a single 3-D volume
//! for [`label::label_volume`]) and is free of side effects, so frames can be
//! processed in any order or in parallel.

#[cfg(feature = "overlay")]
pub mod image;
pub mod label;
pub mod regions;
pub mod segment;

pub use label::{connected_components, label, label_volume, Connectivity};
pub use regions::{extract_regions, foreground_area, RegionProps};
pub use segment::{finite_mean, segment};
