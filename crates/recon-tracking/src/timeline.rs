//! Timeline generation: tracking results to merged, evidence-backed events.

use std::collections::HashMap;
use std::sync::Arc;

use recon_media::MediaExtractor;
use recon_models::{Degradation, TimelineEvent, TrackingResult, Video, VideoId};
use tracing::{debug, warn};

use crate::config::TimelineConfig;
use crate::describe::describe_result;
use crate::merger::merge;

/// Stage name recorded on media degradations.
pub const MEDIA_STAGE: &str = "timeline_media";

/// Merged events plus any partial-output notes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeline {
    pub events: Vec<TimelineEvent>,
    pub degradations: Vec<Degradation>,
}

/// Single-sighting event covering `clip_seconds` from the frame's offset.
pub fn event_from_result(result: &TrackingResult, clip_seconds: f64) -> TimelineEvent {
    let start_time = result.video_offset.max(0.0);
    TimelineEvent {
        id: format!("event-{}", result.id),
        analysis_id: result.analysis_id.clone(),
        suspect_id: result.suspect_id.clone(),
        video_id: result.video_id.clone(),
        timestamp: result.timestamp,
        confidence: result.confidence,
        start_time,
        end_time: start_time + clip_seconds.max(0.0),
        description: describe_result(result),
        location: result.location.clone(),
        position: result.position.clone(),
        carrying: result.carrying.clone(),
        thumbnail_ref: None,
        clip_ref: None,
        source_result_ids: vec![result.id.clone()],
    }
}

/// Convert and merge results without touching media.
pub fn build_events(results: &[TrackingResult], config: &TimelineConfig) -> Vec<TimelineEvent> {
    let events = results
        .iter()
        .map(|r| event_from_result(r, config.clip_seconds))
        .collect();
    merge(events, config.merge_gap_secs)
}

/// Builds timelines, asking a media collaborator for thumbnails and clips.
pub struct TimelineBuilder {
    media: Option<Arc<dyn MediaExtractor>>,
    config: TimelineConfig,
}

impl TimelineBuilder {
    pub fn new(config: TimelineConfig) -> Self {
        Self {
            media: None,
            config,
        }
    }

    pub fn with_media(mut self, media: Arc<dyn MediaExtractor>) -> Self {
        self.media = Some(media);
        self
    }

    pub fn config(&self) -> &TimelineConfig {
        &self.config
    }

    /// Merge results into events and attach media references.
    ///
    /// A media failure leaves the reference `None` and records a
    /// degradation; the event itself is always kept.
    pub async fn build(&self, results: &[TrackingResult], videos: &[Video]) -> Timeline {
        let mut timeline = Timeline {
            events: build_events(results, &self.config),
            degradations: Vec::new(),
        };

        let Some(media) = &self.media else {
            return timeline;
        };

        let by_id: HashMap<&VideoId, &Video> = videos.iter().map(|v| (&v.id, v)).collect();
        for event in &mut timeline.events {
            match by_id.get(&event.video_id) {
                Some(video) => {
                    materialize(media.as_ref(), event, video, &mut timeline.degradations).await
                }
                None => timeline.degradations.push(
                    Degradation::new(MEDIA_STAGE, "source video not available")
                        .with_subject(event.id.clone()),
                ),
            }
        }

        debug!(
            events = timeline.events.len(),
            degraded = timeline.degradations.len(),
            "Timeline built"
        );
        timeline
    }
}

async fn materialize(
    media: &dyn MediaExtractor,
    event: &mut TimelineEvent,
    video: &Video,
    degradations: &mut Vec<Degradation>,
) {
    match media.extract_frame(video, event.start_time).await {
        Ok(reference) => event.thumbnail_ref = Some(reference),
        Err(e) => {
            warn!(event_id = %event.id, error = %e, "Thumbnail extraction failed");
            degradations.push(
                Degradation::new(MEDIA_STAGE, format!("thumbnail unavailable: {}", e))
                    .with_subject(event.id.clone()),
            );
        }
    }

    match media
        .render_clip(video, event.start_time, event.end_time)
        .await
    {
        Ok(reference) => event.clip_ref = Some(reference),
        Err(e) => {
            warn!(event_id = %event.id, error = %e, "Clip extraction failed");
            degradations.push(
                Degradation::new(MEDIA_STAGE, format!("clip unavailable: {}", e))
                    .with_subject(event.id.clone()),
            );
        }
    }
}
