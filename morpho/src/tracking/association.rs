//! Cross-frame association seam.
//!
//! Establishing object identity across frames (and with it birth, death, merge
//! and split events) is not implemented. The minimal path still calls an
//! [`AssociationStrategy`] once per frame, in time order, so a real matcher can
//! be substituted without touching the frame processor. The default
//! [`NoAssociation`] leaves labels untouched and marks every frame's events as
//! [`EventStatus::NotComputed`].

use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Whether the counts of an [`EventRecord`] come from an actual association.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    /// No association was performed; the counts are zero placeholders.
    NotComputed,
    /// Counts were produced by an association strategy.
    Computed,
}

/// Lifecycle event counts for one frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub t: usize,
    pub births: u32,
    pub deaths: u32,
    pub merge: u32,
    pub split: u32,
    pub status: EventStatus,
}

impl EventRecord {
    /// Placeholder record for a frame that was not associated.
    pub fn not_computed(t: usize) -> Self {
        Self {
            t,
            births: 0,
            deaths: 0,
            merge: 0,
            split: 0,
            status: EventStatus::NotComputed,
        }
    }

    pub fn is_computed(&self) -> bool {
        self.status == EventStatus::Computed
    }
}

/// Links the labels of consecutive frames.
///
/// Called for `t = 0, 1, ..., T-1` in order. `previous` is the (possibly
/// relabeled) image of frame `t - 1`, or `None` for the first frame. An
/// implementation may rewrite label ids in `current` to carry identities
/// forward; it must keep 0 as background and keep the image shape.
pub trait AssociationStrategy {
    fn associate(
        &mut self,
        t: usize,
        previous: Option<&Array2<u32>>,
        current: &mut Array2<u32>,
    ) -> EventRecord;
}

/// Treats every frame independently.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAssociation;

impl AssociationStrategy for NoAssociation {
    fn associate(
        &mut self,
        t: usize,
        _previous: Option<&Array2<u32>>,
        _current: &mut Array2<u32>,
    ) -> EventRecord {
        EventRecord::not_computed(t)
    }
}
