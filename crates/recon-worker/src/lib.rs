//! Suspect analysis worker.
//!
//! This crate provides:
//! - The analysis runner (pending → running → completed | failed)
//! - A polling executor with bounded concurrency and graceful shutdown
//! - Frame sampling for unprocessed footage
//! - Structured analysis logging, retry helpers and metrics

pub mod config;
pub mod context;
pub mod error;
pub mod executor;
pub mod logging;
pub mod metrics;
pub mod retry;
pub mod runner;
pub mod sampling;

pub use config::WorkerConfig;
pub use context::{load_environment, AnalysisContext};
pub use error::{WorkerError, WorkerResult};
pub use executor::AnalysisExecutor;
pub use logging::AnalysisLogger;
pub use runner::AnalysisRunner;
pub use sampling::{FfmpegFrameSampler, FrameSampler};
