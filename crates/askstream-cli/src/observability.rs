use std::path::{Path, PathBuf};

use anyhow::Context as _;
use once_cell::sync::OnceCell;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

static INIT: OnceCell<()> = OnceCell::new();

fn parse_bool_env(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" | "enabled" => Some(true),
        "0" | "false" | "no" | "off" | "disabled" => Some(false),
        _ => None,
    }
}

fn observability_enabled() -> bool {
    match std::env::var("ASKSTREAM_OBSERVABILITY") {
        Ok(value) => parse_bool_env(&value).unwrap_or(true),
        Err(_) => true,
    }
}

fn resolve_env_filter(default_level: &str) -> tracing_subscriber::EnvFilter {
    if let Ok(level) = std::env::var("ASKSTREAM_LOG_LEVEL")
        && let Ok(filter) = tracing_subscriber::EnvFilter::try_new(level)
    {
        return filter;
    }
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level))
}

/// Splits a JSONL log path into the directory to create and the file name.
fn log_file_target(path: &Path) -> anyhow::Result<(PathBuf, String)> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("creating log directory {}", dir.display()))?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("askstream.logs.jsonl")
        .to_string();
    Ok((dir, file_name))
}

/// Initialize logging once per process.
///
/// Environment variables:
/// - `ASKSTREAM_OBSERVABILITY`: optional enable/disable flag (default enabled).
/// - `ASKSTREAM_LOG_LEVEL`: optional level/filter override (`info`, `askstream=debug`, ...).
/// - `ASKSTREAM_JSON_LOG_PATH`: optional log file path. If set, logs are JSONL in that file.
///   If unset, logs go to stderr; stdout carries the answer.
/// - `RUST_LOG`: fallback filter.
///
/// Fails when the log file's directory cannot be created.
pub fn init_observability(default_level: &str) -> anyhow::Result<()> {
    INIT.get_or_try_init(|| -> anyhow::Result<()> {
        if !observability_enabled() {
            return Ok(());
        }

        let env_filter = resolve_env_filter(default_level);
        if let Ok(path_raw) = std::env::var("ASKSTREAM_JSON_LOG_PATH") {
            let (dir, file_name) = log_file_target(Path::new(&path_raw))?;
            let writer = tracing_appender::rolling::never(dir, file_name);
            let json_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_target(true)
                .with_writer(writer);
            let _ = tracing_subscriber::registry()
                .with(env_filter)
                .with(json_layer)
                .try_init();
        } else {
            let console_layer = tracing_subscriber::fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr);
            let _ = tracing_subscriber::registry()
                .with(env_filter)
                .with(console_layer)
                .try_init();
        }
        Ok(())
    })?;
    Ok(())
}
