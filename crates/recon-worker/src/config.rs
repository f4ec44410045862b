//! Worker configuration.

use std::path::PathBuf;
use std::time::Duration;

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Maximum analyses running at once
    pub max_concurrent_analyses: usize,
    /// How often the store is polled for pending analyses
    pub poll_interval: Duration,
    /// Upper bound on a single analysis run
    pub analysis_timeout: Duration,
    /// How long in-flight analyses may drain after shutdown is requested
    pub shutdown_timeout: Duration,
    /// Work directory; sampled frames go under `{work_dir}/frames`
    pub work_dir: PathBuf,
    /// Directory holding uploaded source footage
    pub video_dir: PathBuf,
    /// Optional JSON file describing the monitored site
    pub environment_file: Option<PathBuf>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_analyses: 2,
            poll_interval: Duration::from_secs(5),
            analysis_timeout: Duration::from_secs(3600),
            shutdown_timeout: Duration::from_secs(30),
            work_dir: PathBuf::from("/tmp/recon"),
            video_dir: PathBuf::from("./videos"),
            environment_file: None,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_concurrent_analyses: env_or(
                "WORKER_MAX_ANALYSES",
                defaults.max_concurrent_analyses,
            )
            .max(1),
            poll_interval: Duration::from_secs(env_or(
                "WORKER_POLL_INTERVAL_SECS",
                defaults.poll_interval.as_secs(),
            )),
            analysis_timeout: Duration::from_secs(env_or(
                "WORKER_ANALYSIS_TIMEOUT",
                defaults.analysis_timeout.as_secs(),
            )),
            shutdown_timeout: Duration::from_secs(env_or(
                "WORKER_SHUTDOWN_TIMEOUT",
                defaults.shutdown_timeout.as_secs(),
            )),
            work_dir: std::env::var("WORKER_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            video_dir: std::env::var("VIDEO_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.video_dir),
            environment_file: std::env::var("ENVIRONMENT_CONTEXT_FILE")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
        }
    }

    pub fn frames_dir(&self) -> PathBuf {
        self.work_dir.join("frames")
    }
}
