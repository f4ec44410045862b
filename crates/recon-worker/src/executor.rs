//! Analysis executor.
//!
//! Polls the store for pending analyses and runs them with bounded
//! concurrency. On shutdown it stops polling, lets in-flight analyses drain
//! for `shutdown_timeout`, then asks the survivors to cancel.
//!
//! Records left `running` longer than `analysis_timeout` by a worker that
//! died or could not save the outcome are failed on the next poll.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use recon_models::{AnalysisId, AnalysisRecord, AnalysisRequest, AnalysisStatus};
use recon_store::QueryFilter;
use tokio::sync::{watch, Mutex, Semaphore};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::context::AnalysisContext;
use crate::error::WorkerResult;
use crate::retry::FailureTracker;
use crate::runner::AnalysisRunner;

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Reason recorded on runs nobody finished.
pub const ABANDONED_MESSAGE: &str = "Analysis abandoned: no worker finished it within the analysis timeout";

/// Runs pending analyses from the store.
pub struct AnalysisExecutor {
    ctx: Arc<AnalysisContext>,
    capacity: usize,
    semaphore: Arc<Semaphore>,
    in_flight: Arc<Mutex<HashSet<AnalysisId>>>,
    shutdown: watch::Sender<bool>,
    cancel: watch::Sender<bool>,
    worker_name: String,
}

impl AnalysisExecutor {
    pub fn new(ctx: Arc<AnalysisContext>) -> Self {
        let capacity = ctx.config.max_concurrent_analyses.max(1);
        let (shutdown, _) = watch::channel(false);
        let (cancel, _) = watch::channel(false);

        Self {
            ctx,
            capacity,
            semaphore: Arc::new(Semaphore::new(capacity)),
            in_flight: Arc::new(Mutex::new(HashSet::new())),
            shutdown,
            cancel,
            worker_name: format!("worker-{}", Uuid::new_v4()),
        }
    }

    /// Validate a request and store it as a pending analysis.
    pub async fn submit(&self, request: AnalysisRequest) -> WorkerResult<AnalysisRecord> {
        request.validate_request()?;
        let record = AnalysisRecord::new(AnalysisId::new(), request);
        self.ctx.analyses().put(&record).await?;
        info!(
            analysis_id = %record.id,
            suspect_id = %record.suspect_id,
            videos = record.video_ids.len(),
            "Analysis submitted"
        );
        Ok(record)
    }

    /// Poll until shutdown is signalled, then drain.
    pub async fn run(&self) -> WorkerResult<()> {
        info!(
            "Starting analysis executor '{}' with {} max concurrent analyses",
            self.worker_name, self.capacity
        );

        let mut shutdown_rx = self.shutdown.subscribe();
        let mut interval = tokio::time::interval(self.ctx.config.poll_interval.max(MIN_POLL_INTERVAL));
        let mut failures = FailureTracker::new(3);

        loop {
            if *shutdown_rx.borrow_and_update() {
                info!("Shutdown signal received, stopping executor");
                break;
            }
            tokio::select! {
                _ = shutdown_rx.changed() => {}
                _ = interval.tick() => {
                    match self.tick().await {
                        Ok(started) => {
                            failures.record_success();
                            if started > 0 {
                                debug!("Started {} analyses", started);
                            }
                        }
                        Err(e) => {
                            if failures.record_failure() {
                                warn!("Failed to poll for pending analyses: {}", e);
                            }
                        }
                    }
                }
            }
        }

        self.drain().await;
        info!("Analysis executor stopped");
        Ok(())
    }

    async fn tick(&self) -> WorkerResult<usize> {
        let recovered = self.recover_stale().await?;
        if recovered > 0 {
            info!("Failed {} abandoned analyses", recovered);
        }
        self.poll_once().await
    }

    /// Fail `running` records that are not running here and were started
    /// more than `analysis_timeout` ago.
    ///
    /// Returns the number of records failed.
    pub async fn recover_stale(&self) -> WorkerResult<usize> {
        let max_age = chrono::Duration::from_std(self.ctx.config.analysis_timeout)
            .unwrap_or_else(|_| chrono::Duration::days(365));
        let analyses = self.ctx.analyses();
        let filter = QueryFilter::all().eq("status", AnalysisStatus::Running.as_str());

        let mut recovered = 0;
        for record in analyses.query(&filter).await? {
            if self.in_flight.lock().await.contains(&record.id) {
                continue;
            }
            // Re-read so a run that just finished is not overwritten.
            let Some(mut current) = analyses.get(record.id.as_str()).await? else {
                continue;
            };
            if !current.is_stale(Utc::now(), max_age) {
                continue;
            }

            current.fail(ABANDONED_MESSAGE)?;
            analyses.put(&current).await?;
            warn!(
                analysis_id = %current.id,
                started_at = ?current.started_at,
                "Failed abandoned analysis"
            );
            recovered += 1;
        }
        Ok(recovered)
    }

    /// Start as many pending analyses as there are free slots.
    ///
    /// Returns the number of analyses started.
    pub async fn poll_once(&self) -> WorkerResult<usize> {
        let available = self.semaphore.available_permits();
        if available == 0 {
            return Ok(0);
        }

        let filter = QueryFilter::all()
            .eq("status", AnalysisStatus::Pending.as_str())
            .limit(available);
        let pending = self.ctx.analyses().query(&filter).await?;

        let mut started = 0;
        for record in pending {
            if !self.in_flight.lock().await.insert(record.id.clone()) {
                continue;
            }
            let Ok(permit) = Arc::clone(&self.semaphore).try_acquire_owned() else {
                self.in_flight.lock().await.remove(&record.id);
                break;
            };

            let runner = AnalysisRunner::new(Arc::clone(&self.ctx)).with_cancel(self.cancel.subscribe());
            let in_flight = Arc::clone(&self.in_flight);
            tokio::spawn(async move {
                let _permit = permit;
                let id = record.id.clone();
                if let Err(e) = runner.run(record).await {
                    error!(analysis_id = %id, "Analysis could not be run: {}", e);
                }
                in_flight.lock().await.remove(&id);
            });
            started += 1;
        }

        Ok(started)
    }

    /// Wait until no analysis is running.
    pub async fn wait_idle(&self) {
        while self.semaphore.available_permits() < self.capacity {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }

    async fn drain(&self) {
        let timeout = self.ctx.config.shutdown_timeout;
        info!("Waiting for in-flight analyses to complete...");
        if tokio::time::timeout(timeout, self.wait_idle()).await.is_ok() {
            return;
        }

        warn!(
            "In-flight analyses still running after {:?}, cancelling",
            timeout
        );
        self.cancel.send_replace(true);
        if tokio::time::timeout(timeout, self.wait_idle()).await.is_err() {
            warn!("Some analyses did not stop before shutdown");
        }
    }

    /// Signal shutdown.
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    pub fn worker_name(&self) -> &str {
        &self.worker_name
    }
}
