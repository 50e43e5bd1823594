//! Connected-component labeling of binary masks.
//!
//! Adjacency is expressed as a *rank*: two pixels (or voxels) are neighbors
//! when their coordinates differ by at most one along every axis and by
//! exactly one along at most `rank` axes.
//!
//! | rank | 2-D         | 3-D          |
//! |------|-------------|--------------|
//! | 1    | 4-connected | 6-connected  |
//! | 2    | 8-connected | 18-connected |
//! | 3    | 8-connected | 26-connected |
//!
//! Users specify connectivity as a raw neighbor count (4/8 or 6/18/26), which
//! [`Connectivity::from_neighbors`] maps onto a rank.
//!
//! Labels are assigned by a raster-order flood fill: the component containing
//! the first foreground pixel in row-major order gets label 1, the next new
//! component gets 2, and so on. Background is always 0.

use log::debug;
use ndarray::{Array2, Array3, ArrayView2, ArrayView3};
use serde::{Deserialize, Serialize};

/// Pixel adjacency rule used by the labeler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connectivity {
    rank: u8,
}

impl Connectivity {
    /// Edge-adjacent neighbors only (4 in 2-D, 6 in 3-D).
    pub const FACE: Connectivity = Connectivity { rank: 1 };
    /// Edge and corner neighbors in 2-D (8), or face and edge neighbors in 3-D (18).
    pub const EDGE: Connectivity = Connectivity { rank: 2 };
    /// Every neighbor in the 3×3×3 cube (26 in 3-D, 8 in 2-D).
    pub const FULL: Connectivity = Connectivity { rank: 3 };

    /// Map a user-facing neighbor count onto an adjacency rank.
    ///
    /// Counts at or below the smallest tier (4 in 2-D, 6 in 3-D) select rank 1.
    /// The other recognized counts (8 in 2-D; 18 and 26 in 3-D) select their
    /// tier. Missing or unrecognized counts fall back to rank 1.
    ///
    /// # Arguments
    /// * `count` - Requested neighbor count, if any
    /// * `ndim` - Dimensionality of the mask being labeled (2 or 3)
    pub fn from_neighbors(count: Option<u32>, ndim: usize) -> Self {
        let rank = match (ndim, count) {
            (2, Some(8)) => 2,
            (3, Some(18)) => 2,
            (3, Some(26)) => 3,
            (2, Some(c)) if c <= 4 => 1,
            (3, Some(c)) if c <= 6 => 1,
            (_, None) => 1,
            (_, Some(c)) => {
                debug!("Unrecognized connectivity {c} for {ndim}-D mask; using rank 1");
                1
            }
        };
        Self { rank }
    }

    pub fn rank(self) -> usize {
        self.rank as usize
    }

    /// Neighbor count this rank produces for an `ndim`-dimensional mask.
    pub fn neighbor_count(self, ndim: usize) -> usize {
        match ndim {
            2 => offsets_2d(self).len(),
            3 => offsets_3d(self).len(),
            _ => 2 * ndim,
        }
    }
}

impl Default for Connectivity {
    fn default() -> Self {
        Self::FACE
    }
}

fn offsets_2d(connectivity: Connectivity) -> Vec<(isize, isize)> {
    let mut offsets = Vec::with_capacity(8);
    for dr in -1isize..=1 {
        for dc in -1isize..=1 {
            let moved = (dr != 0) as usize + (dc != 0) as usize;
            if moved > 0 && moved <= connectivity.rank() {
                offsets.push((dr, dc));
            }
        }
    }
    offsets
}

fn offsets_3d(connectivity: Connectivity) -> Vec<(isize, isize, isize)> {
    let mut offsets = Vec::with_capacity(26);
    for dz in -1isize..=1 {
        for dr in -1isize..=1 {
            for dc in -1isize..=1 {
                let moved = (dz != 0) as usize + (dr != 0) as usize + (dc != 0) as usize;
                if moved > 0 && moved <= connectivity.rank() {
                    offsets.push((dz, dr, dc));
                }
            }
        }
    }
    offsets
}

/// Find connected components in a binary mask.
///
/// # Arguments
/// * `mask` - Binary mask, `true` = foreground
/// * `connectivity` - Adjacency rule
///
/// # Returns
/// The labeled image and the number of components found
pub fn connected_components(
    mask: ArrayView2<bool>,
    connectivity: Connectivity,
) -> (Array2<u32>, u32) {
    let (rows, cols) = mask.dim();
    let mut labels = Array2::zeros((rows, cols));
    let mut label_counter = 0;
    let neighbors = offsets_2d(connectivity);

    for i in 0..rows {
        for j in 0..cols {
            if !mask[[i, j]] || labels[[i, j]] != 0 {
                continue;
            }

            label_counter += 1;
            labels[[i, j]] = label_counter;
            let mut stack = vec![(i, j)];

            while let Some((y, x)) = stack.pop() {
                for &(dy, dx) in &neighbors {
                    let ny = y as isize + dy;
                    let nx = x as isize + dx;

                    if ny < 0 || ny >= rows as isize || nx < 0 || nx >= cols as isize {
                        continue;
                    }
                    let (ny, nx) = (ny as usize, nx as usize);

                    if mask[[ny, nx]] && labels[[ny, nx]] == 0 {
                        labels[[ny, nx]] = label_counter;
                        stack.push((ny, nx));
                    }
                }
            }
        }
    }

    (labels, label_counter)
}

/// Label a 2-D mask; see [`connected_components`] for the component count.
pub fn label(mask: ArrayView2<bool>, connectivity: Connectivity) -> Array2<u32> {
    connected_components(mask, connectivity).0
}

/// Label a 3-D mask with 6/18/26-connectivity (rank 1/2/3).
pub fn label_volume(mask: ArrayView3<bool>, connectivity: Connectivity) -> (Array3<u32>, u32) {
    let (depth, rows, cols) = mask.dim();
    let mut labels = Array3::zeros((depth, rows, cols));
    let mut label_counter = 0;
    let neighbors = offsets_3d(connectivity);
    let bounds = [depth as isize, rows as isize, cols as isize];

    for k in 0..depth {
        for i in 0..rows {
            for j in 0..cols {
                if !mask[[k, i, j]] || labels[[k, i, j]] != 0 {
                    continue;
                }

                label_counter += 1;
                labels[[k, i, j]] = label_counter;
                let mut stack = vec![(k, i, j)];

                while let Some((z, y, x)) = stack.pop() {
                    for &(dz, dy, dx) in &neighbors {
                        let nz = z as isize + dz;
                        let ny = y as isize + dy;
                        let nx = x as isize + dx;

                        if nz < 0 || nz >= bounds[0] || ny < 0 || ny >= bounds[1] {
                            continue;
                        }
                        if nx < 0 || nx >= bounds[2] {
                            continue;
                        }
                        let idx = [nz as usize, ny as usize, nx as usize];

                        if mask[idx] && labels[idx] == 0 {
                            labels[idx] = label_counter;
                            stack.push((idx[0], idx[1], idx[2]));
                        }
                    }
                }
            }
        }
    }

    (labels, label_counter)
}
