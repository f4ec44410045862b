//! Suspect tracker.
//!
//! Gathers frames from every supplied video into one time-ordered
//! sequence, runs person detection in bounded-concurrency batches, matches
//! each detected person against the suspect's reference features and keeps
//! the sightings at or above the confidence threshold.
//!
//! Failures are isolated per frame: a detection error or timeout means "no
//! detections in this frame", and a person whose features cannot be
//! obtained or compared is treated as a non-match.

use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use recon_models::tracking::sort_chronologically;
use recon_models::{
    AnalysisId, DetectedPerson, FeatureVector, Frame, Suspect, SuspectId, Timeframe,
    TrackingResult, Video,
};
use recon_vision::{FeatureExtractor, ImageRef, PersonDetector};
use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::annotate;
use crate::config::{validate_threshold, TrackerConfig};
use crate::error::{TrackerResult, TrackingError};
use crate::matcher::{confidence, similarity};
use crate::metrics as tracking_metrics;

/// A frame paired with the video it belongs to.
#[derive(Clone, Copy)]
struct FrameJob<'a> {
    video: &'a Video,
    frame: &'a Frame,
}

/// Tracks one suspect across many videos.
pub struct SuspectTracker {
    detector: Arc<dyn PersonDetector>,
    extractor: Arc<dyn FeatureExtractor>,
    config: TrackerConfig,
    analysis_id: Option<AnalysisId>,
    cancel_rx: Option<watch::Receiver<bool>>,
}

impl SuspectTracker {
    pub fn new(
        detector: Arc<dyn PersonDetector>,
        extractor: Arc<dyn FeatureExtractor>,
        config: TrackerConfig,
    ) -> Self {
        Self {
            detector,
            extractor,
            config,
            analysis_id: None,
            cancel_rx: None,
        }
    }

    /// Scope result IDs to an analysis run and tag results with it.
    ///
    /// Without a run, IDs are scoped to the suspect.
    pub fn for_analysis(mut self, analysis_id: AnalysisId) -> Self {
        self.analysis_id = Some(analysis_id);
        self
    }

    /// Stop between batches once the signal reads `true`.
    pub fn with_cancel(mut self, cancel_rx: watch::Receiver<bool>) -> Self {
        self.cancel_rx = Some(cancel_rx);
        self
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Track `suspect` across `videos`.
    ///
    /// `threshold` defaults to the configured confidence threshold; callers
    /// may loosen it for exploratory runs. The returned list is sorted by
    /// timestamp and contains only results with `confidence >= threshold`.
    ///
    /// Videos without frames are skipped. No usable frames at all yields an
    /// empty list, not an error.
    pub async fn track(
        &self,
        suspect: &Suspect,
        videos: &[Video],
        timeframe: Option<&Timeframe>,
        threshold: Option<f64>,
    ) -> TrackerResult<Vec<TrackingResult>> {
        if videos.is_empty() {
            return Err(TrackingError::invalid_argument(
                "at least one video is required",
            ));
        }
        let threshold = threshold.unwrap_or(self.config.confidence_threshold);
        validate_threshold(threshold)?;
        if let Some(tf) = timeframe {
            tf.validate()?;
        }

        let started = Instant::now();
        let reference = self.reference_features(suspect).await?;

        let jobs = gather_frames(videos, timeframe);
        if jobs.is_empty() {
            info!(suspect_id = %suspect.id, "No usable frames in {} videos", videos.len());
            return Ok(Vec::new());
        }

        let batch_size = self.config.batch_size.max(1);
        let batch_count = jobs.len().div_ceil(batch_size);
        info!(
            suspect_id = %suspect.id,
            frames = jobs.len(),
            batches = batch_count,
            threshold,
            "Starting tracking pass"
        );

        let mut results = Vec::new();
        for (batch_index, batch) in jobs.chunks(batch_size).enumerate() {
            self.check_cancelled()?;
            let batch_results = self
                .process_batch(batch, &suspect.id, &reference, threshold)
                .await;
            debug!(
                batch = batch_index + 1,
                of = batch_count,
                matches = batch_results.len(),
                "Batch complete"
            );
            results.extend(batch_results);
        }

        sort_chronologically(&mut results);
        annotate::verify_identity(&mut results, &self.config, threshold);
        annotate::detect_appearance_changes(&mut results);
        annotate::detect_behavior_patterns(&mut results, self.config.revisit_gap_secs);

        let elapsed = started.elapsed().as_secs_f64();
        tracking_metrics::record_pass(results.len(), elapsed);
        info!(
            suspect_id = %suspect.id,
            results = results.len(),
            elapsed_secs = elapsed,
            "Tracking pass complete"
        );
        Ok(results)
    }

    /// Cached reference features, or features extracted from the reference
    /// image.
    async fn reference_features(&self, suspect: &Suspect) -> TrackerResult<FeatureVector> {
        if !suspect.has_reference_image() {
            return Err(TrackingError::not_found(format!(
                "reference image for suspect {}",
                suspect.id
            )));
        }

        let features = match &suspect.features {
            Some(cached) if !cached.is_empty() => cached.clone(),
            _ => {
                let image = ImageRef::new(suspect.reference_image.clone());
                match timeout(self.config.match_timeout, self.extractor.extract_features(&image))
                    .await
                {
                    Ok(result) => result?,
                    Err(_) => {
                        return Err(TrackingError::external_service(format!(
                            "feature extraction for suspect {} timed out",
                            suspect.id
                        )))
                    }
                }
            }
        };

        if features.is_zero() || !features.norm().is_finite() {
            return Err(TrackingError::invalid_argument(format!(
                "reference features for suspect {} have zero or non-finite norm",
                suspect.id
            )));
        }
        Ok(features)
    }

    fn check_cancelled(&self) -> TrackerResult<()> {
        match &self.cancel_rx {
            Some(rx) if *rx.borrow() => {
                info!("Tracking pass cancelled at batch boundary");
                Err(TrackingError::Cancelled)
            }
            _ => Ok(()),
        }
    }

    /// Detect and match every frame of a batch concurrently.
    ///
    /// Each frame accumulates into its own list; lists are concatenated in
    /// frame order afterwards.
    async fn process_batch(
        &self,
        batch: &[FrameJob<'_>],
        suspect_id: &SuspectId,
        reference: &FeatureVector,
        threshold: f64,
    ) -> Vec<TrackingResult> {
        let mut per_frame: Vec<(usize, Vec<TrackingResult>)> =
            stream::iter(batch.iter().copied().enumerate())
                .map(|(position, job)| async move {
                    let persons = self.detect(job.frame).await;
                    let mut matches = Vec::new();
                    for (detection_index, person) in persons.iter().enumerate() {
                        if let Some(result) = self
                            .match_person(job, detection_index, person, suspect_id, reference, threshold)
                            .await
                        {
                            matches.push(result);
                        }
                    }
                    (position, matches)
                })
                .buffer_unordered(self.config.max_concurrent_detections.max(1))
                .boxed()
                .collect()
                .await;

        tracking_metrics::record_frames_processed(batch.len());
        per_frame.sort_by_key(|(position, _)| *position);
        per_frame.into_iter().flat_map(|(_, m)| m).collect()
    }

    /// Person detection with a per-call timeout; failures yield no persons.
    async fn detect(&self, frame: &Frame) -> Vec<DetectedPerson> {
        match timeout(self.config.detection_timeout, self.detector.detect_persons(frame)).await {
            Ok(Ok(persons)) => persons,
            Ok(Err(e)) => {
                warn!(frame_id = %frame.frame_id, error = %e, "Person detection failed, treating frame as empty");
                tracking_metrics::record_detection_failure("error");
                Vec::new()
            }
            Err(_) => {
                warn!(
                    frame_id = %frame.frame_id,
                    timeout_secs = self.config.detection_timeout.as_secs(),
                    "Person detection timed out, treating frame as empty"
                );
                tracking_metrics::record_detection_failure("timeout");
                Vec::new()
            }
        }
    }

    async fn match_person(
        &self,
        job: FrameJob<'_>,
        detection_index: usize,
        person: &DetectedPerson,
        suspect_id: &SuspectId,
        reference: &FeatureVector,
        threshold: f64,
    ) -> Option<TrackingResult> {
        let features = self.person_features(job.frame, person).await?;
        let score = match similarity(&features, reference) {
            Ok(score) => score,
            Err(e) => {
                debug!(frame_id = %job.frame.frame_id, detection_index, error = %e, "Rejecting feature vector");
                tracking_metrics::record_match_skipped("invalid_features");
                return None;
            }
        };

        let confidence = confidence(score);
        if confidence < threshold {
            return None;
        }

        let frame = job.frame;
        let scope = match &self.analysis_id {
            Some(id) => id.as_str(),
            None => suspect_id.as_str(),
        };
        Some(TrackingResult {
            id: format!("track-{}-{}-{}", scope, frame.frame_id, detection_index),
            analysis_id: self.analysis_id.clone(),
            suspect_id: suspect_id.clone(),
            video_id: frame.video_id.clone(),
            frame_id: frame.frame_id.clone(),
            frame_index: frame.frame_index,
            detection_index: u32::try_from(detection_index).unwrap_or(u32::MAX),
            timestamp: frame.timestamp,
            video_offset: job.video.offset_secs(frame.timestamp),
            confidence,
            bounding_box: person.bbox,
            location: job.video.location_label(),
            position: person.position.clone(),
            description: person.description.clone(),
            frame_path: frame.path.clone(),
            carrying: person.carrying.clone(),
            activities: person.activities.clone(),
            behavior_notes: Vec::new(),
            identity_flags: Vec::new(),
        })
    }

    /// Embedded features, or features extracted from the person's region.
    async fn person_features(&self, frame: &Frame, person: &DetectedPerson) -> Option<FeatureVector> {
        if let Some(features) = &person.features {
            return Some(features.clone());
        }

        let image = ImageRef::region(frame.path.clone(), person.bbox);
        match timeout(self.config.match_timeout, self.extractor.extract_features(&image)).await {
            Ok(Ok(features)) => Some(features),
            Ok(Err(e)) => {
                warn!(frame_id = %frame.frame_id, error = %e, "Feature extraction failed, treating person as non-match");
                tracking_metrics::record_match_skipped("extraction_failed");
                None
            }
            Err(_) => {
                warn!(frame_id = %frame.frame_id, "Feature extraction timed out, treating person as non-match");
                tracking_metrics::record_match_skipped("extraction_timeout");
                None
            }
        }
    }
}

/// All frames of all videos in global time order, filtered by `timeframe`.
///
/// Ties on timestamp are broken by `(video_id, frame_index)`.
fn gather_frames<'a>(videos: &'a [Video], timeframe: Option<&Timeframe>) -> Vec<FrameJob<'a>> {
    let mut jobs = Vec::new();
    for video in videos {
        if !video.has_frames() {
            warn!(video_id = %video.id, "Video has no extracted frames, skipping");
            continue;
        }
        jobs.extend(
            video
                .frames
                .iter()
                .filter(|frame| timeframe.map_or(true, |tf| tf.contains(frame.timestamp)))
                .map(|frame| FrameJob { video, frame }),
        );
    }

    jobs.sort_by(|a, b| {
        a.frame
            .timestamp
            .cmp(&b.frame.timestamp)
            .then_with(|| a.frame.video_id.cmp(&b.frame.video_id))
            .then_with(|| a.frame.frame_index.cmp(&b.frame.frame_index))
    });
    jobs
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use recon_models::VideoId;

    fn video(id: &str, start_secs: u32, frames: u32) -> Video {
        let mut v = Video::new(
            VideoId::from(id),
            "",
            Utc.with_ymd_and_hms(2025, 5, 4, 8, 0, start_secs).unwrap(),
        );
        let frames = (0..frames)
            .map(|i| v.frame(i, format!("/frames/{}_{}.jpg", id, i)))
            .collect();
        v = v.with_frames(frames);
        v
    }

    #[test]
    fn test_gather_frames_orders_globally() {
        let videos = vec![video("video-b", 0, 3), video("video-a", 1, 3), video("video-c", 0, 0)];
        let jobs = gather_frames(&videos, None);

        let order: Vec<_> = jobs.iter().map(|j| j.frame.frame_id.as_str()).collect();
        assert_eq!(
            order,
            vec![
                "video-b_frame_0000",
                "video-a_frame_0000",
                "video-b_frame_0001",
                "video-a_frame_0001",
                "video-b_frame_0002",
                "video-a_frame_0002",
            ]
        );
    }

    #[test]
    fn test_gather_frames_applies_timeframe() {
        let videos = vec![video("video-a", 0, 10)];
        let tf = Timeframe::parse("2025-05-04T08:00:03Z", "2025-05-04T08:00:05Z").unwrap();
        let jobs = gather_frames(&videos, Some(&tf));

        let indices: Vec<_> = jobs.iter().map(|j| j.frame.frame_index).collect();
        assert_eq!(indices, vec![3, 4, 5]);
    }
}
