//! Frame processors: segment → label (→ measure) for every frame of a series.
//!
//! Two operations with distinct result types:
//!
//! - [`track`]: one labeled image per frame plus one event record per frame.
//!   Minimum-area filtering is applied to the *whole frame*: a frame whose total
//!   foreground is below `min_area` is blanked entirely.
//! - [`track_objects`]: a flat [`DetectionTable`] of measured components, with
//!   minimum-area filtering applied *per component*.
//!
//! The two filtering policies are deliberately different and belong to their
//! respective operations.
//!
//! Frames are segmented and labeled in parallel with rayon; results are always
//! collected in increasing frame order. Association (see [`association`]) then
//! runs sequentially over the ordered labels.

pub mod association;
pub mod detection;

pub use association::{AssociationStrategy, EventRecord, EventStatus, NoAssociation};
pub use detection::{detection_labels, track_objects, Detection, DetectionTable};

pub use crate::config::{DetectionConfig, TrackingConfig};

use crate::image_proc::{foreground_area, label, segment};
use crate::series::Series;
use log::{debug, info};
use ndarray::Array2;
use rayon::prelude::*;

/// Result of the minimal path: parallel per-frame sequences of length `T`.
#[derive(Debug, Clone, PartialEq)]
pub struct Tracks {
    pub labels: Vec<Array2<u32>>,
    pub events: Vec<EventRecord>,
}

impl Tracks {
    /// Number of frames processed.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

fn label_frame(series: &Series, t: usize, config: &TrackingConfig) -> Array2<u32> {
    let mask = segment(series.frame(t), config.threshold);
    let mut labels = label(mask.view(), config.connectivity());

    if config.min_area > 1 {
        let area = foreground_area(labels.view());
        if area < config.min_area {
            debug!(
                "frame {t}: foreground {area} px below min_area {}, blanked",
                config.min_area
            );
            labels.fill(0);
        }
    }
    labels
}

/// Label every frame independently, with no identity carried across frames.
///
/// Equivalent to [`track_with`] using [`NoAssociation`]: every event record is
/// a zero-count placeholder marked [`EventStatus::NotComputed`].
pub fn track(series: &Series, config: &TrackingConfig) -> Tracks {
    track_with(series, config, &mut NoAssociation)
}

/// Label every frame, then hand consecutive frames to `strategy` in time order.
pub fn track_with<S: AssociationStrategy + ?Sized>(
    series: &Series,
    config: &TrackingConfig,
    strategy: &mut S,
) -> Tracks {
    let mut labels: Vec<Array2<u32>> = (0..series.len())
        .into_par_iter()
        .map(|t| label_frame(series, t, config))
        .collect();

    let mut events = Vec::with_capacity(labels.len());
    for t in 0..labels.len() {
        let (done, rest) = labels.split_at_mut(t);
        events.push(strategy.associate(t, done.last(), &mut rest[0]));
    }

    info!(
        "Labeled {} frame(s) of {:?} (threshold {:?}, connectivity {})",
        labels.len(),
        series.frame_shape(),
        config.threshold,
        config.connectivity
    );
    Tracks { labels, events }
}

/// Which frame processor to run through [`run_pipeline`].
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineRequest {
    Tracks(TrackingConfig),
    Detections(DetectionConfig),
}

/// Output of [`run_pipeline`], tagged by the path that produced it.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutput {
    Tracks(Tracks),
    Detections(DetectionTable),
}

/// Single entry point over both frame processors.
pub fn run_pipeline(series: &Series, request: &PipelineRequest) -> crate::Result<PipelineOutput> {
    Ok(match request {
        PipelineRequest::Tracks(config) => PipelineOutput::Tracks(track(series, config)),
        PipelineRequest::Detections(config) => {
            PipelineOutput::Detections(track_objects(series, config)?)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;
    use test_helpers::rect_frame;

    fn two_square_series() -> Series {
        let mut data = Array3::zeros((3, 12, 12));
        for (t, mut slice) in data.outer_iter_mut().enumerate() {
            slice.assign(&rect_frame(12, 12, &[(t, t, t + 3, t + 3), (9, 0, 11, 2)], 1.0, 0.0));
        }
        Series::new(data).unwrap()
    }

    #[test]
    fn test_one_label_image_and_event_per_frame() {
        let series = two_square_series();
        let config = TrackingConfig {
            threshold: Some(0.5),
            connectivity: 4,
            min_area: 1,
        };

        let tracks = track(&series, &config);

        assert_eq!(tracks.len(), 3);
        assert_eq!(tracks.events.len(), 3);
        for (t, (labels, event)) in tracks.labels.iter().zip(&tracks.events).enumerate() {
            assert_eq!(labels.dim(), (12, 12));
            assert_eq!(labels.iter().copied().max(), Some(2));
            assert_eq!(*event, EventRecord::not_computed(t));
        }
    }

    #[test]
    fn test_frame_level_min_area_blanks_whole_frame() {
        // 9 + 4 = 13 foreground pixels per frame.
        let series = two_square_series();

        let keep = TrackingConfig {
            threshold: Some(0.5),
            connectivity: 4,
            min_area: 13,
        };
        let tracks = track(&series, &keep);
        // The 4-pixel square survives even though it alone is below min_area.
        assert!(tracks
            .labels
            .iter()
            .all(|l| foreground_area(l.view()) == 13));

        let blank = TrackingConfig {
            min_area: 14,
            ..keep
        };
        let tracks = track(&series, &blank);
        assert!(tracks.labels.iter().all(|l| l.iter().all(|&v| v == 0)));
    }

    #[test]
    fn test_min_area_of_one_disables_filter() {
        let series = Series::new(Array3::from_shape_fn((2, 5, 5), |(_, r, c)| {
            if r == 2 && c == 2 {
                1.0
            } else {
                0.0
            }
        }))
        .unwrap();
        let config = TrackingConfig {
            threshold: Some(0.5),
            connectivity: 4,
            min_area: 1,
        };

        let tracks = track(&series, &config);

        assert!(tracks.labels.iter().all(|l| foreground_area(l.view()) == 1));
    }

    struct CountingStrategy {
        calls: Vec<(usize, bool)>,
    }

    impl AssociationStrategy for CountingStrategy {
        fn associate(
            &mut self,
            t: usize,
            previous: Option<&Array2<u32>>,
            current: &mut Array2<u32>,
        ) -> EventRecord {
            self.calls.push((t, previous.is_some()));
            let births = current.iter().copied().max().unwrap_or(0);
            EventRecord {
                births,
                status: EventStatus::Computed,
                ..EventRecord::not_computed(t)
            }
        }
    }

    #[test]
    fn test_strategy_sees_frames_in_order() {
        let series = two_square_series();
        let mut strategy = CountingStrategy { calls: Vec::new() };

        let tracks = track_with(
            &series,
            &TrackingConfig {
                threshold: Some(0.5),
                ..Default::default()
            },
            &mut strategy,
        );

        assert_eq!(strategy.calls, vec![(0, false), (1, true), (2, true)]);
        assert!(tracks.events.iter().all(|e| e.is_computed() && e.births == 2));
    }

    #[test]
    fn test_run_pipeline_tags_output() {
        let series = two_square_series();

        let out = run_pipeline(&series, &PipelineRequest::Tracks(TrackingConfig::default())).unwrap();
        assert!(matches!(out, PipelineOutput::Tracks(ref t) if t.len() == 3));

        let out = run_pipeline(
            &series,
            &PipelineRequest::Detections(DetectionConfig {
                min_area: 1,
                ..Default::default()
            }),
        )
        .unwrap();
        assert!(matches!(out, PipelineOutput::Detections(ref d) if d.len() == 6));
    }
}
