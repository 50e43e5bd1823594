//! Validated `T × H × W` intensity series.
//!
//! The pipeline never reads files itself; callers hand over an in-memory array
//! which is checked once here (rank 3, every axis non-empty) and is read-only
//! from then on.

use ndarray::{Array2, Array3, ArrayD, ArrayView2, ArrayView3, Axis, Ix3};
use thiserror::Error;

/// Input validation failures for a series.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SeriesError {
    #[error("Expected an array shaped (T,H,W), got {0} dimension(s)")]
    WrongRank(usize),

    #[error("Invalid dimensions {0:?}: (T,H,W) must all be > 0")]
    EmptyDimension(Vec<usize>),
}

pub type Result<T> = std::result::Result<T, SeriesError>;

/// A time-major stack of floating-point intensity frames.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    data: Array3<f64>,
}

impl Series {
    /// Wrap a `(T, H, W)` array, rejecting any zero-length axis.
    pub fn new(data: Array3<f64>) -> Result<Self> {
        let (t, h, w) = data.dim();
        if t == 0 || h == 0 || w == 0 {
            return Err(SeriesError::EmptyDimension(vec![t, h, w]));
        }
        Ok(Self { data })
    }

    /// Wrap a dynamically shaped array (as read from disk), checking the rank.
    pub fn from_dyn(data: ArrayD<f64>) -> Result<Self> {
        let ndim = data.ndim();
        let data = data
            .into_dimensionality::<Ix3>()
            .map_err(|_| SeriesError::WrongRank(ndim))?;
        Self::new(data)
    }

    /// Promote a single `(H, W)` frame to a one-frame series.
    pub fn from_frame(frame: Array2<f64>) -> Result<Self> {
        Self::new(frame.insert_axis(Axis(0)))
    }

    /// Number of frames `T`.
    pub fn len(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    /// Always false for a validated series; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Frame shape `(H, W)`.
    pub fn frame_shape(&self) -> (usize, usize) {
        let (_, h, w) = self.data.dim();
        (h, w)
    }

    /// Frame at time index `t`.
    ///
    /// # Panics
    /// If `t >= self.len()`; callers resolve indices before slicing.
    pub fn frame(&self, t: usize) -> ArrayView2<'_, f64> {
        self.data.index_axis(Axis(0), t)
    }

    pub fn frames(&self) -> impl ExactSizeIterator<Item = ArrayView2<'_, f64>> {
        self.data.outer_iter()
    }

    pub fn view(&self) -> ArrayView3<'_, f64> {
        self.data.view()
    }

    pub fn into_inner(self) -> Array3<f64> {
        self.data
    }
}
