//! Summary metrics over the outputs of the two frame processors.

use crate::image_proc::foreground_area;
use crate::tracking::{DetectionTable, EventRecord, Tracks};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Summary of the minimal path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackSummary {
    /// Mean per-frame foreground pixel count (0.0 when there are no frames).
    pub area_mean: f64,
    /// Largest per-frame foreground pixel count (0 when there are no frames).
    pub area_max: usize,
    /// Number of frames.
    pub duration: usize,
    /// Per-frame event records, passed through unchanged.
    pub events: Vec<EventRecord>,
}

/// Summary of the detailed path.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DetectionSummary {
    /// Mean number of distinct labels per frame that has detections, rounded
    /// half to even.
    pub object_count: usize,
    pub total_detections: usize,
    /// One past the largest frame index present.
    pub duration: usize,
    pub area_mean: f64,
    pub area_max: usize,
}

/// Reduce a [`Tracks`] result to per-frame area statistics.
pub fn metrics(tracks: &Tracks) -> TrackSummary {
    let areas: Vec<usize> = tracks
        .labels
        .iter()
        .map(|labels| foreground_area(labels.view()))
        .collect();

    let area_mean = if areas.is_empty() {
        0.0
    } else {
        areas.iter().sum::<usize>() as f64 / areas.len() as f64
    };

    TrackSummary {
        area_mean,
        area_max: areas.iter().copied().max().unwrap_or(0),
        duration: tracks.labels.len(),
        events: tracks.events.clone(),
    }
}

/// Reduce a [`DetectionTable`] to object counts and area statistics.
///
/// An empty table yields the all-zero [`DetectionSummary::default`]. Area
/// statistics run over every row, not per frame.
pub fn get_metrics(table: &DetectionTable) -> DetectionSummary {
    if table.is_empty() {
        return DetectionSummary::default();
    }

    let mut labels_per_frame: BTreeMap<usize, BTreeSet<u32>> = BTreeMap::new();
    for detection in table {
        labels_per_frame
            .entry(detection.t)
            .or_default()
            .insert(detection.label);
    }

    let frames = labels_per_frame.len() as f64;
    let mean_objects = labels_per_frame
        .values()
        .map(|labels| labels.len() as f64)
        .sum::<f64>()
        / frames;

    let total_area: usize = table.iter().map(|d| d.area).sum();
    let duration = labels_per_frame.keys().next_back().map_or(0, |&t| t + 1);

    DetectionSummary {
        object_count: mean_objects.round_ties_even() as usize,
        total_detections: table.len(),
        duration,
        area_mean: total_area as f64 / table.len() as f64,
        area_max: table.iter().map(|d| d.area).max().unwrap_or(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::Detection;
    use approx::assert_relative_eq;
    use ndarray::{arr2, Array2};

    fn detection(t: usize, label: u32, area: usize) -> Detection {
        Detection {
            label,
            area,
            centroid_row: 0.0,
            centroid_col: 0.0,
            max_intensity: 1.0,
            mean_intensity: 1.0,
            t,
        }
    }

    #[test]
    fn test_track_metrics() {
        let tracks = Tracks {
            labels: vec![
                arr2(&[[1, 0], [0, 0]]),
                arr2(&[[1, 1], [0, 2]]),
                Array2::zeros((2, 2)),
            ],
            events: (0..3).map(EventRecord::not_computed).collect(),
        };

        let summary = metrics(&tracks);

        assert_relative_eq!(summary.area_mean, 4.0 / 3.0);
        assert_eq!(summary.area_max, 3);
        assert_eq!(summary.duration, 3);
        assert_eq!(summary.events, tracks.events);
    }

    #[test]
    fn test_track_metrics_no_frames() {
        let summary = metrics(&Tracks {
            labels: Vec::new(),
            events: Vec::new(),
        });

        assert_eq!(summary.area_mean, 0.0);
        assert_eq!(summary.area_max, 0);
        assert_eq!(summary.duration, 0);
        assert!(summary.events.is_empty());
    }

    #[test]
    fn test_get_metrics_empty_table() {
        let summary = get_metrics(&DetectionTable::default());

        assert_eq!(
            summary,
            DetectionSummary {
                object_count: 0,
                total_detections: 0,
                duration: 0,
                area_mean: 0.0,
                area_max: 0,
            }
        );
    }

    #[test]
    fn test_get_metrics_groups_by_frame() {
        // Frame 1: two objects, frame 4: one object. Frames 0, 2, 3 are empty.
        let table = DetectionTable::new(vec![
            detection(1, 1, 10),
            detection(1, 2, 20),
            detection(4, 1, 30),
        ]);

        let summary = get_metrics(&table);

        // mean(2, 1) = 1.5 rounds half to even.
        assert_eq!(summary.object_count, 2);
        assert_eq!(summary.total_detections, 3);
        assert_eq!(summary.duration, 5);
        assert_relative_eq!(summary.area_mean, 20.0);
        assert_eq!(summary.area_max, 30);
    }

    #[test]
    fn test_object_count_ties_round_to_even() {
        // mean(3, 2) = 2.5 -> 2
        let table = DetectionTable::new(vec![
            detection(0, 1, 1),
            detection(0, 2, 1),
            detection(0, 3, 1),
            detection(1, 1, 1),
            detection(1, 2, 1),
        ]);

        assert_eq!(get_metrics(&table).object_count, 2);
    }

    #[test]
    fn test_summary_keys() {
        let json = serde_json::to_value(get_metrics(&DetectionTable::default())).unwrap();
        let keys: Vec<&str> = json
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();

        assert_eq!(keys.len(), 5);
        for key in ["object_count", "total_detections", "duration", "area_mean", "area_max"] {
            assert!(keys.contains(&key), "missing {key}");
        }
    }
}
