//! Process-wide `tracing` subscriber setup

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;

use crate::config::LoggingConfig;
use crate::error::{Error, Result};

/// Install the global subscriber described by `config`.
///
/// `RUST_LOG` overrides `config.level` when set. The returned guard flushes
/// the file writer on drop and must be held for the life of the process.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let env_filter = tracing_subscriber::filter::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::filter::EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| tracing_subscriber::filter::EnvFilter::new("info"));

    let use_json = config.format == "json";

    let console_layer: Box<dyn tracing_subscriber::Layer<_> + Send + Sync> = if use_json {
        Box::new(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .json(),
        )
    } else {
        Box::new(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        )
    };

    let mut guard = None;
    let file_layer: Option<Box<dyn tracing_subscriber::Layer<_> + Send + Sync>> =
        if let Some(ref log_file) = config.file {
            let file_appender = tracing_appender::rolling::daily(
                log_file.parent().unwrap_or_else(|| std::path::Path::new(".")),
                log_file
                    .file_name()
                    .unwrap_or_else(|| std::ffi::OsStr::new("kestrel.log")),
            );
            let (non_blocking, worker_guard) = tracing_appender::non_blocking(file_appender);
            guard = Some(worker_guard);

            if use_json {
                Some(Box::new(
                    tracing_subscriber::fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false)
                        .json(),
                ))
            } else {
                Some(Box::new(
                    tracing_subscriber::fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false),
                ))
            }
        } else {
            None
        };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| Error::Config(format!("failed to install tracing subscriber: {}", e)))?;

    Ok(guard)
}
