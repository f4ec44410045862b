//! End-to-end tracking scenarios with in-process collaborators.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use recon_models::{
    AnalysisId, BoundingBox, DetectedPerson, FeatureVector, Frame, NodeType, Suspect, SuspectId, Timeframe,
    Video, VideoId,
};
use recon_tracking::timeline::build_events;
use recon_tracking::{
    merge, GraphBuilder, TimelineBuilder, TimelineConfig, TrackerConfig, TrackingError,
    SuspectTracker,
};
use recon_vision::{FeatureExtractor, ImageRef, PersonDetector, VisionError, VisionResult};
use tokio::sync::watch;

/// Unit vector whose cosine with `[1, 0]` is `similarity`.
fn features(similarity: f32) -> FeatureVector {
    FeatureVector::new(vec![similarity, (1.0 - similarity * similarity).max(0.0).sqrt()])
}

fn person(similarity: f32) -> DetectedPerson {
    DetectedPerson::new(BoundingBox::new(10.0, 20.0, 110.0, 320.0)).with_features(features(similarity))
}

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 5, 4, 8, 0, 0).unwrap()
}

fn video(id: &str, location: &str, start_secs: i64, frame_indices: &[u32]) -> Video {
    let v = Video::new(
        VideoId::from(id),
        location,
        base_time() + chrono::Duration::seconds(start_secs),
    );
    let frames = frame_indices
        .iter()
        .map(|&i| v.frame(i, format!("/frames/{}_frame_{:04}.jpg", id, i)))
        .collect();
    v.with_frames(frames)
}

fn suspect() -> Suspect {
    Suspect::new(SuspectId::from("suspect-1"), "/refs/suspect-1.jpg").with_features(vec![1.0, 0.0])
}

/// Detector with scripted persons per frame.
#[derive(Default)]
struct ScriptedDetector {
    persons: HashMap<String, Vec<DetectedPerson>>,
    failing: Vec<String>,
    slow: Vec<String>,
    calls: AtomicUsize,
}

impl ScriptedDetector {
    fn with(mut self, frame_id: &str, persons: Vec<DetectedPerson>) -> Self {
        self.persons.insert(frame_id.to_string(), persons);
        self
    }

    fn failing(mut self, frame_id: &str) -> Self {
        self.failing.push(frame_id.to_string());
        self
    }

    fn slow(mut self, frame_id: &str) -> Self {
        self.slow.push(frame_id.to_string());
        self
    }
}

#[async_trait]
impl PersonDetector for ScriptedDetector {
    async fn detect_persons(&self, frame: &Frame) -> VisionResult<Vec<DetectedPerson>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.slow.contains(&frame.frame_id) {
            tokio::time::sleep(Duration::from_secs(10)).await;
        }
        if self.failing.contains(&frame.frame_id) {
            return Err(VisionError::invalid_response("missing persons"));
        }
        Ok(self.persons.get(&frame.frame_id).cloned().unwrap_or_default())
    }
}

/// Extractor returning the reference features for the reference image and
/// a fixed embedding for every region.
struct FixedExtractor {
    region_similarity: Option<f32>,
}

#[async_trait]
impl FeatureExtractor for FixedExtractor {
    async fn extract_features(&self, image: &ImageRef) -> VisionResult<FeatureVector> {
        match (&image.region, self.region_similarity) {
            (None, _) => Ok(FeatureVector::new(vec![1.0, 0.0])),
            (Some(_), Some(similarity)) => Ok(features(similarity)),
            (Some(_), None) => Err(VisionError::ServiceUnavailable("extractor down".into())),
        }
    }
}

fn tracker(detector: ScriptedDetector, config: TrackerConfig) -> SuspectTracker {
    SuspectTracker::new(
        Arc::new(detector),
        Arc::new(FixedExtractor {
            region_similarity: None,
        }),
        config,
    )
}

#[tokio::test]
async fn test_two_camera_sighting_sequence() {
    let videos = vec![
        video("video-lobby", "Lobby", 0, &[0, 1, 2, 3]),
        video("video-park", "Car park", 300, &[0, 1, 2, 3]),
    ];
    let detector = ScriptedDetector::default()
        .with("video-lobby_frame_0001", vec![person(0.85), person(0.30)])
        .with("video-park_frame_0002", vec![person(0.72)])
        .with("video-park_frame_0003", vec![person(0.60)]);

    let results = tracker(detector, TrackerConfig::default())
        .track(&suspect(), &videos, None, Some(70.0))
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].video_id.as_str(), "video-lobby");
    assert_eq!(results[0].location, "Lobby");
    assert!((results[0].confidence - 85.0).abs() < 0.01);
    assert_eq!(results[0].id, "track-suspect-1-video-lobby_frame_0001-0");
    assert_eq!(results[0].video_offset, 1.0);

    assert_eq!(results[1].video_id.as_str(), "video-park");
    assert_eq!(results[1].location, "Car park");
    assert!((results[1].confidence - 72.0).abs() < 0.01);
    assert!(results[0].timestamp < results[1].timestamp);
}

#[tokio::test]
async fn test_every_result_meets_threshold() {
    let similarities = [0.95, 0.81, 0.74, 0.66, 0.52, 0.91, 0.77];
    let indices: Vec<u32> = (0..similarities.len() as u32).collect();
    let videos = vec![video("video-a", "Lobby", 0, &indices)];
    let mut detector = ScriptedDetector::default();
    for (i, s) in similarities.iter().enumerate() {
        detector = detector.with(&format!("video-a_frame_{:04}", i), vec![person(*s)]);
    }
    let tracker = tracker(detector, TrackerConfig::default());

    let loose = tracker.track(&suspect(), &videos, None, Some(60.0)).await.unwrap();
    let strict = tracker.track(&suspect(), &videos, None, Some(80.0)).await.unwrap();

    assert_eq!(loose.len(), 6);
    assert_eq!(strict.len(), 3);
    assert!(loose.iter().all(|r| r.confidence >= 60.0));
    assert!(strict.iter().all(|r| r.confidence >= 80.0));
    assert!(strict
        .iter()
        .all(|s| loose.iter().any(|l| l.id == s.id)));
    assert!(loose.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
}

#[tokio::test]
async fn test_timeframe_limits_frames() {
    let videos = vec![video("video-a", "Lobby", 0, &[0, 10, 20, 30])];
    let detector = ScriptedDetector::default()
        .with("video-a_frame_0000", vec![person(0.9)])
        .with("video-a_frame_0010", vec![person(0.9)])
        .with("video-a_frame_0020", vec![person(0.9)])
        .with("video-a_frame_0030", vec![person(0.9)]);
    let tf = Timeframe::parse("2025-05-04T08:00:05Z", "2025-05-04T08:00:20Z").unwrap();

    let results = tracker(detector, TrackerConfig::default())
        .track(&suspect(), &videos, Some(&tf), None)
        .await
        .unwrap();

    let frames: Vec<_> = results.iter().map(|r| r.frame_index).collect();
    assert_eq!(frames, vec![10, 20]);
    assert!(results.iter().all(|r| tf.contains(r.timestamp)));
}

#[tokio::test]
async fn test_nearby_sightings_merge_into_one_event() {
    let videos = vec![video("video-a", "Lobby", 0, &[0, 20, 90])];
    let detector = ScriptedDetector::default()
        .with("video-a_frame_0000", vec![person(0.8)])
        .with("video-a_frame_0020", vec![person(0.9)])
        .with("video-a_frame_0090", vec![person(0.8)]);

    let results = tracker(detector, TrackerConfig::default())
        .track(&suspect(), &videos, None, None)
        .await
        .unwrap();
    assert_eq!(results.len(), 3);

    let events = build_events(&results, &TimelineConfig::default());
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].start_time, 0.0);
    assert_eq!(events[0].end_time, 25.0);
    assert!((events[0].confidence - 90.0).abs() < 0.01);
    assert_eq!(events[0].source_result_ids.len(), 2);
    assert_eq!(events[1].start_time, 90.0);
}

#[tokio::test]
async fn test_empty_inputs_produce_empty_outputs() {
    assert!(merge(Vec::new(), 60.0).is_empty());
    assert!(GraphBuilder::new().build(&[]).nodes.is_empty());

    let timeline = TimelineBuilder::new(TimelineConfig::default())
        .build(&[], &[])
        .await;
    assert!(timeline.events.is_empty());
    assert!(timeline.degradations.is_empty());

    let videos = vec![video("video-a", "Lobby", 0, &[0, 1])];
    let results = tracker(ScriptedDetector::default(), TrackerConfig::default())
        .track(&suspect(), &videos, None, None)
        .await
        .unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn test_slow_frame_is_treated_as_empty() {
    let indices: Vec<u32> = (0..10).collect();
    let videos = vec![video("video-a", "Lobby", 0, &indices)];
    let mut detector = ScriptedDetector::default().slow("video-a_frame_0004");
    for i in 0..10 {
        detector = detector.with(&format!("video-a_frame_{:04}", i), vec![person(0.9)]);
    }
    let config = TrackerConfig {
        detection_timeout: Duration::from_millis(100),
        ..TrackerConfig::default()
    };

    let results = tracker(detector, config)
        .track(&suspect(), &videos, None, None)
        .await
        .unwrap();

    assert_eq!(results.len(), 9);
    assert!(results.iter().all(|r| r.frame_index != 4));
}

#[tokio::test]
async fn test_detection_error_skips_only_that_frame() {
    let videos = vec![video("video-a", "Lobby", 0, &[0, 1, 2])];
    let detector = ScriptedDetector::default()
        .with("video-a_frame_0000", vec![person(0.9)])
        .with("video-a_frame_0002", vec![person(0.9)])
        .failing("video-a_frame_0001");

    let results = tracker(detector, TrackerConfig::default())
        .track(&suspect(), &videos, None, None)
        .await
        .unwrap();

    let frames: Vec<_> = results.iter().map(|r| r.frame_index).collect();
    assert_eq!(frames, vec![0, 2]);
}

#[tokio::test]
async fn test_region_features_come_from_extractor() {
    let videos = vec![video("video-a", "Lobby", 0, &[0, 1])];
    let bare = DetectedPerson::new(BoundingBox::new(0.0, 0.0, 50.0, 100.0));
    let make_detector = || {
        ScriptedDetector::default()
            .with("video-a_frame_0000", vec![bare.clone()])
            .with("video-a_frame_0001", vec![bare.clone()])
    };

    let matching = SuspectTracker::new(
        Arc::new(make_detector()),
        Arc::new(FixedExtractor {
            region_similarity: Some(0.88),
        }),
        TrackerConfig::default(),
    );
    let results = matching.track(&suspect(), &videos, None, None).await.unwrap();
    assert_eq!(results.len(), 2);
    assert!((results[0].confidence - 88.0).abs() < 0.01);

    let failing = SuspectTracker::new(
        Arc::new(make_detector()),
        Arc::new(FixedExtractor {
            region_similarity: None,
        }),
        TrackerConfig::default(),
    );
    let results = failing.track(&suspect(), &videos, None, None).await.unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn test_reference_features_extracted_when_not_cached() {
    let videos = vec![video("video-a", "Lobby", 0, &[0])];
    let detector = ScriptedDetector::default().with("video-a_frame_0000", vec![person(0.93)]);
    let uncached = Suspect::new(SuspectId::from("suspect-2"), "/refs/suspect-2.jpg");

    let results = tracker(detector, TrackerConfig::default())
        .track(&uncached, &videos, None, None)
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].suspect_id.as_str(), "suspect-2");
}

#[tokio::test]
async fn test_no_videos_is_invalid() {
    let err = tracker(ScriptedDetector::default(), TrackerConfig::default())
        .track(&suspect(), &[], None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, TrackingError::InvalidArgument(_)));
}

#[tokio::test]
async fn test_threshold_out_of_range_is_invalid() {
    let videos = vec![video("video-a", "Lobby", 0, &[0])];
    let err = tracker(ScriptedDetector::default(), TrackerConfig::default())
        .track(&suspect(), &videos, None, Some(120.0))
        .await
        .unwrap_err();
    assert!(matches!(err, TrackingError::InvalidArgument(_)));
}

#[tokio::test]
async fn test_missing_reference_image_is_not_found() {
    let videos = vec![video("video-a", "Lobby", 0, &[0])];
    let detector = ScriptedDetector::default();
    let no_reference = Suspect::new(SuspectId::from("suspect-3"), "  ");
    let tracker = tracker(detector, TrackerConfig::default());

    let err = tracker
        .track(&no_reference, &videos, None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, TrackingError::NotFound(_)));
}

#[tokio::test]
async fn test_zero_reference_features_are_invalid() {
    let videos = vec![video("video-a", "Lobby", 0, &[0])];
    let zero = Suspect::new(SuspectId::from("suspect-4"), "/refs/s4.jpg").with_features(vec![0.0, 0.0]);

    let err = tracker(ScriptedDetector::default(), TrackerConfig::default())
        .track(&zero, &videos, None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, TrackingError::InvalidArgument(_)));
}

#[tokio::test]
async fn test_batch_size_does_not_change_results() {
    let indices: Vec<u32> = (0..12).collect();
    let videos = vec![
        video("video-a", "Lobby", 0, &indices),
        video("video-b", "Stairwell", 3, &indices),
    ];
    let make_detector = || {
        let mut detector = ScriptedDetector::default();
        for i in (0..12).step_by(2) {
            detector = detector
                .with(&format!("video-a_frame_{:04}", i), vec![person(0.82), person(0.91)])
                .with(&format!("video-b_frame_{:04}", i + 1), vec![person(0.75)]);
        }
        detector
    };

    let single = tracker(
        make_detector(),
        TrackerConfig {
            batch_size: 1,
            max_concurrent_detections: 1,
            ..TrackerConfig::default()
        },
    )
    .track(&suspect(), &videos, None, None)
    .await
    .unwrap();
    let wide = tracker(
        make_detector(),
        TrackerConfig {
            batch_size: 5,
            max_concurrent_detections: 16,
            ..TrackerConfig::default()
        },
    )
    .track(&suspect(), &videos, None, None)
    .await
    .unwrap();

    assert_eq!(single.len(), 18);
    assert_eq!(single, wide);
}

#[tokio::test]
async fn test_result_ids_are_scoped_to_the_run() {
    let videos = vec![video("video-a", "Lobby", 0, &[1])];
    let make_detector =
        || ScriptedDetector::default().with("video-a_frame_0001", vec![person(0.9)]);
    let other_suspect = Suspect::new(SuspectId::from("suspect-2"), "/refs/suspect-2.jpg")
        .with_features(vec![1.0, 0.0]);

    let first = tracker(make_detector(), TrackerConfig::default())
        .track(&suspect(), &videos, None, None)
        .await
        .unwrap();
    let second = tracker(make_detector(), TrackerConfig::default())
        .track(&other_suspect, &videos, None, None)
        .await
        .unwrap();
    assert_ne!(first[0].id, second[0].id);
    assert!(first[0].analysis_id.is_none());

    let run_a = AnalysisId::from("analysis-a");
    let run_b = AnalysisId::from("analysis-b");
    let in_run_a = tracker(make_detector(), TrackerConfig::default())
        .for_analysis(run_a.clone())
        .track(&suspect(), &videos, None, None)
        .await
        .unwrap();
    let in_run_b = tracker(make_detector(), TrackerConfig::default())
        .for_analysis(run_b.clone())
        .track(&suspect(), &videos, None, None)
        .await
        .unwrap();
    assert_eq!(in_run_a[0].id, "track-analysis-a-video-a_frame_0001-0");
    assert_ne!(in_run_a[0].id, in_run_b[0].id);
    assert_eq!(in_run_a[0].analysis_id.as_ref(), Some(&run_a));

    let events_a = build_events(&in_run_a, &TimelineConfig::default());
    let events_b = build_events(&in_run_b, &TimelineConfig::default());
    assert_ne!(events_a[0].id, events_b[0].id);
    assert_eq!(events_b[0].analysis_id.as_ref(), Some(&run_b));
}

#[tokio::test]
async fn test_cancellation_stops_before_next_batch() {
    let videos = vec![video("video-a", "Lobby", 0, &[0, 1, 2, 3])];
    let detector = Arc::new(ScriptedDetector::default());
    let (cancel_tx, cancel_rx) = watch::channel(false);
    cancel_tx.send(true).unwrap();

    let tracker = SuspectTracker::new(
        detector.clone(),
        Arc::new(FixedExtractor {
            region_similarity: None,
        }),
        TrackerConfig {
            batch_size: 2,
            ..TrackerConfig::default()
        },
    )
    .with_cancel(cancel_rx);

    let err = tracker
        .track(&suspect(), &videos, None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, TrackingError::Cancelled));
    assert_eq!(detector.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_videos_without_frames_are_skipped() {
    let videos = vec![
        Video::new(VideoId::from("video-raw"), "Gate", base_time()),
        video("video-a", "Lobby", 0, &[0]),
    ];
    let detector = ScriptedDetector::default().with("video-a_frame_0000", vec![person(0.9)]);

    let results = tracker(detector, TrackerConfig::default())
        .track(&suspect(), &videos, None, None)
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
}

#[tokio::test]
async fn test_results_feed_graph() {
    let videos = vec![
        video("video-lobby", "Lobby", 0, &[0]),
        video("video-park", "Car park", 120, &[0]),
    ];
    let detector = ScriptedDetector::default()
        .with(
            "video-lobby_frame_0000",
            vec![person(0.9).carrying(["Backpack"])],
        )
        .with("video-park_frame_0000", vec![person(0.8).carrying(["backpack"])]);

    let results = tracker(detector, TrackerConfig::default())
        .track(&suspect(), &videos, None, None)
        .await
        .unwrap();
    let graph = GraphBuilder::new().with_suspect(&suspect()).build(&results);

    assert_eq!(graph.nodes_of(NodeType::Location).count(), 2);
    assert_eq!(graph.nodes_of(NodeType::Object).count(), 1);
    assert_eq!(graph.edges.len(), 3);
}
