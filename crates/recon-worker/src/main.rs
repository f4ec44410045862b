//! Suspect analysis worker binary.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use recon_media::{check_ffmpeg, FfmpegMediaExtractor, FfmpegRunner, MediaExtractor};
use recon_store::StoreConfig;
use recon_tracking::{TimelineConfig, TrackerConfig};
use recon_vision::VisionClient;
use recon_worker::{
    load_environment, AnalysisContext, AnalysisExecutor, FfmpegFrameSampler, WorkerConfig,
};

/// Upper bound on a single thumbnail or clip render.
const MEDIA_TIMEOUT_SECS: u64 = 120;

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,recon=info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

fn init_metrics() -> anyhow::Result<()> {
    let Some(port) = std::env::var("METRICS_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
    else {
        return Ok(());
    };
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .context("failed to install Prometheus exporter")?;
    info!("Serving metrics on {}", addr);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider (required for TLS/HTTPS)
    let _ = rustls::crypto::ring::default_provider().install_default();

    dotenvy::dotenv().ok();
    init_tracing();
    info!("Starting recon-worker");
    init_metrics()?;

    let config = WorkerConfig::from_env();
    info!("Worker config: {:?}", config);

    let tracker_config = TrackerConfig::from_env();
    tracker_config
        .validate()
        .context("invalid tracker configuration")?;
    let timeline_config = TimelineConfig::from_env();

    let store_config = StoreConfig::from_env().context("invalid store configuration")?;
    let store = recon_store::connect(&store_config).context("failed to open record store")?;

    let vision = Arc::new(VisionClient::from_env().context("failed to create vision client")?);
    match vision.health_check().await {
        Ok(true) => info!("Vision service is healthy"),
        Ok(false) => warn!("Vision service reports unhealthy; analyses may degrade"),
        Err(e) => warn!("Vision service health check failed: {}", e),
    }

    let media: Option<Arc<dyn MediaExtractor>> = match check_ffmpeg() {
        Ok(path) => {
            info!("Using ffmpeg at {}", path.display());
            Some(Arc::new(
                FfmpegMediaExtractor::new(timeline_config.media_dir.clone())
                    .with_runner(FfmpegRunner::new().with_timeout(MEDIA_TIMEOUT_SECS)),
            ))
        }
        Err(e) => {
            warn!("Timeline thumbnails and clips disabled: {}", e);
            None
        }
    };

    let environment = match &config.environment_file {
        Some(path) => Some(load_environment(path).await?),
        None => None,
    };

    let ctx = Arc::new(AnalysisContext {
        sampler: Arc::new(
            FfmpegFrameSampler::new(config.frames_dir())
                .with_runner(FfmpegRunner::new().with_timeout(config.analysis_timeout.as_secs())),
        ),
        config,
        tracker_config,
        timeline_config,
        store,
        detector: vision.clone(),
        extractor: vision.clone(),
        summarizer: vision,
        media,
        environment,
    });

    let executor = Arc::new(AnalysisExecutor::new(ctx));
    let signal_executor = Arc::clone(&executor);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal");
            signal_executor.shutdown();
        }
    });

    executor.run().await?;
    info!("Worker shutdown complete");
    Ok(())
}
