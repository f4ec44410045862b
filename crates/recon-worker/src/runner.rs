//! Analysis runner.
//!
//! Drives one analysis record from `pending` through `running` to
//! `completed` or `failed`:
//!
//! 1. load the suspect and the requested videos
//! 2. sample frames for videos that have none yet
//! 3. track the suspect and persist the tracking results
//! 4. merge results into timeline events, attaching thumbnails and clips
//! 5. build the knowledge graph
//! 6. summarize (falling back to a composed summary) and optionally narrate
//!
//! Partial output never fails the run; it is recorded as degradations on the
//! analysis record. Any hard error fails the record with the error message.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use recon_models::{
    AnalysisId, AnalysisRecord, AnalysisStatus, Degradation, Graph, Suspect, TimelineEvent, Video,
};
use recon_store::StoreError;
use recon_tracking::timeline::Timeline;
use recon_tracking::{
    fallback_summary, narrative_input, GraphBuilder, SuspectTracker, TimelineBuilder,
};
use tokio::sync::watch;
use tokio::time::timeout;
use tracing::Instrument;

use crate::context::AnalysisContext;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::AnalysisLogger;
use crate::metrics as worker_metrics;
use crate::retry::{retry_async, RetryConfig};

/// Stage name for frame sampling degradations.
pub const SAMPLING_STAGE: &str = "frame_sampling";
/// Stage name recorded when the fallback summary was used.
pub const SUMMARY_STAGE: &str = "summary";
pub const NARRATION_STAGE: &str = "narration";

/// Products of a successful run.
struct Outcome {
    timeline: Vec<TimelineEvent>,
    graph: Graph,
    summary: String,
    narration: Option<String>,
    result_count: usize,
    degradations: Vec<Degradation>,
}

/// Runs analyses against the shared collaborators.
pub struct AnalysisRunner {
    ctx: Arc<AnalysisContext>,
    cancel_rx: Option<watch::Receiver<bool>>,
}

impl AnalysisRunner {
    pub fn new(ctx: Arc<AnalysisContext>) -> Self {
        Self {
            ctx,
            cancel_rx: None,
        }
    }

    /// Stop tracking at the next batch boundary once the signal reads `true`.
    pub fn with_cancel(mut self, cancel_rx: watch::Receiver<bool>) -> Self {
        self.cancel_rx = Some(cancel_rx);
        self
    }

    /// Load an analysis by ID and run it.
    pub async fn run_by_id(&self, id: &AnalysisId) -> WorkerResult<AnalysisRecord> {
        let record = self.ctx.analyses().require(id.as_str()).await?;
        self.run(record).await
    }

    /// Run an analysis and persist its terminal state.
    ///
    /// A pending record is moved to `running` and persisted first. The
    /// returned record is `completed` or `failed`; `Err` means the record
    /// could not be started or saved.
    pub async fn run(&self, mut record: AnalysisRecord) -> WorkerResult<AnalysisRecord> {
        if record.status == AnalysisStatus::Pending {
            record.start()?;
            self.persist(&record).await?;
        }
        if record.status != AnalysisStatus::Running {
            return Err(WorkerError::analysis_failed(format!(
                "analysis {} is {}, expected running",
                record.id, record.status
            )));
        }

        let logger = AnalysisLogger::new(&record.id, "run");
        let span = logger.create_span();
        async move {
            worker_metrics::record_started();
            let started = Instant::now();
            logger.log_start(&format!(
                "suspect {} across {} videos",
                record.suspect_id,
                record.video_ids.len()
            ));

            let limit = self.ctx.config.analysis_timeout;
            let outcome = match timeout(limit, self.execute(&record, &logger)).await {
                Ok(outcome) => outcome,
                Err(_) => Err(WorkerError::Timeout(limit.as_secs())),
            };

            let elapsed = started.elapsed().as_secs_f64();
            match outcome {
                Ok(outcome) => {
                    for degradation in outcome.degradations {
                        worker_metrics::record_degradation(&degradation.stage);
                        record.degrade(degradation);
                    }
                    record.narration = outcome.narration;
                    record.complete(
                        outcome.timeline,
                        outcome.graph,
                        outcome.summary,
                        outcome.result_count,
                    )?;
                    worker_metrics::record_completed(elapsed);
                    logger.log_completion(&format!(
                        "{} results, {} events, {} degradations in {:.1}s",
                        record.tracking_result_count,
                        record.timeline.len(),
                        record.degradations.len(),
                        elapsed
                    ));
                }
                Err(e) => {
                    logger.log_error(&e.to_string());
                    record.fail(e.to_string())?;
                    worker_metrics::record_failed(elapsed);
                }
            }

            self.persist(&record).await?;
            Ok::<_, WorkerError>(record)
        }
        .instrument(span)
        .await
    }

    async fn persist(&self, record: &AnalysisRecord) -> WorkerResult<()> {
        let analyses = self.ctx.analyses();
        let config = RetryConfig::new("persist_analysis");
        let put: Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + '_>> =
            Box::pin(retry_async(&config, StoreError::is_retryable, || analyses.put(record)));
        put.await?;
        Ok(())
    }

    async fn execute(
        &self,
        record: &AnalysisRecord,
        logger: &AnalysisLogger,
    ) -> WorkerResult<Outcome> {
        let mut degradations = Vec::new();

        let suspects = self.ctx.suspects();
        let mut suspect = suspects.require(record.suspect_id.as_str()).await?;
        let videos = self
            .load_videos(record, &mut degradations, &logger.stage("frames"))
            .await?;

        let tracking_log = logger.stage("tracking");
        let mut tracker = SuspectTracker::new(
            Arc::clone(&self.ctx.detector),
            Arc::clone(&self.ctx.extractor),
            self.ctx.tracker_config.clone(),
        )
        .for_analysis(record.id.clone());
        if let Some(cancel_rx) = &self.cancel_rx {
            tracker = tracker.with_cancel(cancel_rx.clone());
        }
        let results = tracker
            .track(
                &suspect,
                &videos,
                record.timeframe.as_ref(),
                record.confidence_threshold,
            )
            .await?;
        self.ctx.tracking_results().put_all(&results).await?;
        tracking_log.log_progress(&format!("{} tracking results", results.len()));

        let mut builder = TimelineBuilder::new(self.ctx.timeline_config.clone());
        if let Some(media) = &self.ctx.media {
            builder = builder.with_media(Arc::clone(media));
        }
        let Timeline {
            events,
            degradations: media_notes,
        } = builder.build(&results, &videos).await;
        degradations.extend(media_notes);
        self.ctx.timeline_events().put_all(&events).await?;

        let graph = GraphBuilder::new().with_suspect(&suspect).build(&results);

        let input = narrative_input(
            &suspect,
            &events,
            &graph,
            &results,
            self.ctx.environment.as_ref(),
        );
        let summary_log = logger.stage("summary");
        let summary = if events.is_empty() {
            fallback_summary(&input)
        } else {
            match self.ctx.summarizer.summarize(&input).await {
                Ok(text) if !text.trim().is_empty() => text,
                Ok(_) => {
                    summary_log.log_warning("Summarizer returned no text, using fallback summary");
                    degradations.push(Degradation::new(
                        SUMMARY_STAGE,
                        "summarizer returned no text, used fallback summary",
                    ));
                    fallback_summary(&input)
                }
                Err(e) => {
                    summary_log.log_warning(&format!("Summarizer failed, using fallback: {}", e));
                    degradations.push(Degradation::new(
                        SUMMARY_STAGE,
                        format!("summarizer unavailable, used fallback summary: {}", e),
                    ));
                    fallback_summary(&input)
                }
            }
        };

        let narration = if record.options.include_narration && !events.is_empty() {
            match self
                .ctx
                .summarizer
                .narrate(&input, &record.options.language)
                .await
            {
                Ok(text) => Some(text),
                Err(e) => {
                    summary_log.log_warning(&format!("Narration failed: {}", e));
                    degradations.push(Degradation::new(
                        NARRATION_STAGE,
                        format!("narration unavailable: {}", e),
                    ));
                    None
                }
            }
        } else {
            None
        };

        self.update_last_seen(&mut suspect, &results).await?;

        Ok(Outcome {
            timeline: events,
            graph,
            summary,
            narration,
            result_count: results.len(),
            degradations,
        })
    }

    /// Load the requested videos, sampling frames for any that have none.
    ///
    /// A missing video record fails the run. A sampling failure leaves the
    /// video without frames, so the tracker skips it.
    async fn load_videos(
        &self,
        record: &AnalysisRecord,
        degradations: &mut Vec<Degradation>,
        logger: &AnalysisLogger,
    ) -> WorkerResult<Vec<Video>> {
        let repo = self.ctx.videos();
        let mut videos = Vec::with_capacity(record.video_ids.len());

        for id in &record.video_ids {
            let mut video = repo.require(id.as_str()).await?;
            if video.has_frames() {
                videos.push(video);
                continue;
            }

            resolve_source(&mut video, &self.ctx.config.video_dir);
            match self.ctx.sampler.sample(&video).await {
                Ok(sampled) if !sampled.frames.is_empty() => {
                    logger.log_progress(&format!(
                        "sampled {} frames from {} at {} fps",
                        sampled.frames.len(),
                        id,
                        sampled.sample_fps
                    ));
                    video = sampled.apply_to(video);
                    repo.put(&video).await?;
                    worker_metrics::record_video_sampled(true);
                }
                Ok(_) => {
                    logger.log_warning(&format!("no frames sampled from {}", id));
                    degradations.push(
                        Degradation::new(SAMPLING_STAGE, "no frames could be sampled")
                            .with_subject(id.to_string()),
                    );
                    worker_metrics::record_video_sampled(false);
                }
                Err(e) => {
                    logger.log_warning(&format!("frame sampling failed for {}: {}", id, e));
                    degradations.push(
                        Degradation::new(SAMPLING_STAGE, format!("frame sampling failed: {}", e))
                            .with_subject(id.to_string()),
                    );
                    worker_metrics::record_video_sampled(false);
                }
            }
            videos.push(video);
        }

        Ok(videos)
    }

    async fn update_last_seen(
        &self,
        suspect: &mut Suspect,
        results: &[recon_models::TrackingResult],
    ) -> WorkerResult<()> {
        let Some(latest) = results.iter().map(|r| r.timestamp).max() else {
            return Ok(());
        };
        if suspect.last_seen.map_or(true, |seen| latest > seen) {
            suspect.last_seen = Some(latest);
            self.ctx.suspects().put(suspect).await?;
        }
        Ok(())
    }
}

/// Resolve a relative source path against the video directory.
fn resolve_source(video: &mut Video, video_dir: &Path) {
    if let Some(path) = &video.file_path {
        if Path::new(path).is_relative() {
            video.file_path = Some(video_dir.join(path).to_string_lossy().into_owned());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use recon_models::VideoId;

    #[test]
    fn test_resolve_source() {
        let mut relative = Video::new(VideoId::from("video-1"), "Lobby", Utc::now())
            .with_file_path("lobby.mp4");
        resolve_source(&mut relative, Path::new("/data/videos"));
        assert_eq!(relative.file_path.as_deref(), Some("/data/videos/lobby.mp4"));

        let mut absolute = Video::new(VideoId::from("video-2"), "Gate", Utc::now())
            .with_file_path("/mnt/cctv/gate.mp4");
        resolve_source(&mut absolute, Path::new("/data/videos"));
        assert_eq!(absolute.file_path.as_deref(), Some("/mnt/cctv/gate.mp4"));
    }
}
