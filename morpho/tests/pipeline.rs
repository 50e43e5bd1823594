//! End-to-end runs of both frame processors on synthetic series.

use approx::assert_relative_eq;
use morpho::config::{DetectionConfig, TrackingConfig};
use morpho::image_proc::foreground_area;
use morpho::tracking::{run_pipeline, EventStatus, PipelineRequest};
use morpho::{get_metrics, metrics, synth, track, track_objects, PipelineOutput, Series};
use ndarray::Array3;
use test_helpers::gaussian_spot_series;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn blob_series() -> Series {
    Series::new(synth::moving_blob(20, 128, 128, 10.0)).unwrap()
}

#[test]
fn test_moving_blob_single_label_per_frame() {
    init_logging();
    let series = blob_series();
    let config = TrackingConfig {
        threshold: Some(0.5),
        connectivity: 4,
        min_area: 5,
    };

    let tracks = track(&series, &config);
    assert_eq!(tracks.labels.len(), 20);
    assert_eq!(tracks.events.len(), 20);

    for (t, labels) in tracks.labels.iter().enumerate() {
        assert_eq!(labels.dim(), (128, 128));
        assert_eq!(labels.iter().copied().max(), Some(1), "frame {t}");
        assert!(foreground_area(labels.view()) > 5, "frame {t}");
    }

    let summary = metrics(&tracks);
    assert_eq!(summary.duration, 20);
    assert!(summary.area_mean > 0.0);
    for (t, event) in summary.events.iter().enumerate() {
        assert_eq!(event.t, t);
        assert_eq!(
            (event.births, event.deaths, event.merge, event.split),
            (0, 0, 0, 0)
        );
        assert_eq!(event.status, EventStatus::NotComputed);
    }
}

#[test]
fn test_moving_blob_detections() {
    init_logging();
    let series = blob_series();

    let table = track_objects(&series, &DetectionConfig::default()).unwrap();
    assert_eq!(table.len(), 20);

    // Centroid follows the blob's (2, 3) px/frame drift
    let first = &table.rows()[0];
    let last = &table.rows()[19];
    assert_relative_eq!(first.centroid_row, 20.0, epsilon = 1e-9);
    assert_relative_eq!(first.centroid_col, 20.0, epsilon = 1e-9);
    assert_relative_eq!(last.centroid_row, 58.0, epsilon = 1e-9);
    assert_relative_eq!(last.centroid_col, 77.0, epsilon = 1e-9);

    let summary = get_metrics(&table);
    assert_eq!(summary.object_count, 1);
    assert_eq!(summary.total_detections, 20);
    assert_eq!(summary.duration, 20);
    assert!(summary.area_max >= 10);
}

#[test]
fn test_all_zero_series_is_all_foreground() {
    init_logging();
    let series = Series::new(Array3::zeros((5, 32, 32))).unwrap();

    let tracks = track(&series, &TrackingConfig::default());
    assert_eq!(tracks.labels.len(), 5);
    for labels in &tracks.labels {
        assert!(labels.iter().all(|&l| l == 1));
    }

    let summary = metrics(&tracks);
    assert_relative_eq!(summary.area_mean, 1024.0);
    assert_eq!(summary.area_max, 1024);
    assert_eq!(summary.duration, 5);
}

#[test]
fn test_no_detections_gives_zero_summary() {
    init_logging();
    let series = Series::new(Array3::zeros((4, 16, 16))).unwrap();

    let table = track_objects(&series, &DetectionConfig::default()).unwrap();
    assert!(table.is_empty());

    let summary = get_metrics(&table);
    assert_eq!(summary.object_count, 0);
    assert_eq!(summary.total_detections, 0);
    assert_eq!(summary.duration, 0);
    assert_eq!(summary.area_mean, 0.0);
    assert_eq!(summary.area_max, 0);
}

#[test]
fn test_run_pipeline_tags_output() {
    init_logging();
    let series =
        Series::new(gaussian_spot_series(3, 48, 48, &[(12.0, 12.0), (34.0, 30.0)], 4.0)).unwrap();

    let detections = run_pipeline(
        &series,
        &PipelineRequest::Detections(DetectionConfig::default()),
    )
    .unwrap();
    match detections {
        PipelineOutput::Detections(table) => {
            assert_eq!(table.len(), 6);
            assert_eq!(get_metrics(&table).object_count, 2);
        }
        other => panic!("expected detections, got {other:?}"),
    }

    let tracks = run_pipeline(&series, &PipelineRequest::Tracks(TrackingConfig::default())).unwrap();
    match tracks {
        PipelineOutput::Tracks(tracks) => {
            assert_eq!(tracks.len(), 3);
            assert_eq!(tracks.labels[0].iter().copied().max(), Some(2));
        }
        other => panic!("expected tracks, got {other:?}"),
    }
}
