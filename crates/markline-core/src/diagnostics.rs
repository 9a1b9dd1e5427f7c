use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use chrono::{DateTime, Utc};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use crate::config::MarklineConfig;

pub const DEFAULT_FILTER: &str = "info,markline_core=debug,markline_cli=debug";

pub struct TelemetryGuard {
    pub session_id: Uuid,
    log_file: Option<PathBuf>,
    _file_guard: Option<WorkerGuard>,
}

impl TelemetryGuard {
    #[must_use]
    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }
}

pub fn init_from_config(
    config: &MarklineConfig,
    log_dir_override: Option<&Path>,
) -> anyhow::Result<TelemetryGuard> {
    let diagnostics = &config.diagnostics;
    let log_dir = diagnostics
        .file_logging
        .then(|| log_dir_override.unwrap_or(config.paths.logs_dir.as_path()));
    init_tracing_with_options(
        log_dir,
        &diagnostics.trace_file_prefix,
        &diagnostics.rust_log_filter,
    )
}

/// Installs a compact stderr layer, plus a JSON file layer when `log_dir` is
/// given. `RUST_LOG` overrides `default_filter` when set.
pub fn init_tracing_with_options(
    log_dir: Option<&Path>,
    file_prefix: &str,
    default_filter: &str,
) -> anyhow::Result<TelemetryGuard> {
    let session_id = Uuid::new_v4();

    let mut log_file = None;
    let mut file_guard = None;
    let file_layer = match log_dir {
        Some(log_dir) => {
            fs::create_dir_all(log_dir).with_context(|| {
                format!("failed to create log directory: {}", log_dir.display())
            })?;
            let file_name = log_file_name(file_prefix, Utc::now());
            let file_appender = tracing_appender::rolling::never(log_dir, &file_name);
            let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
            log_file = Some(log_dir.join(file_name));
            file_guard = Some(guard);
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_writer(file_writer),
            )
        }
        None => None,
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let console_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .with_target(true);

    if let Err(error) = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
    {
        warn!(?error, "global tracing subscriber already initialized");
    } else {
        info!(%session_id, log_file = ?log_file, "tracing initialized");
    }

    Ok(TelemetryGuard {
        session_id,
        log_file,
        _file_guard: file_guard,
    })
}

fn log_file_name(prefix: &str, started_at: DateTime<Utc>) -> String {
    format!("{prefix}-{}.log", started_at.format("%Y%m%d-%H%M%S"))
}
