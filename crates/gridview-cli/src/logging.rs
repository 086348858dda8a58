// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! File-only tracing output. The terminal belongs to the TUI, so nothing is
//! ever written to stdout or stderr. The log rotates at 10 MB and keeps one
//! rotated file.

use crate::config::Config;
use anyhow::{Context, Result};
use rolling_file::{BasicRollingFileAppender, RollingConditionBasic};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const LOG_FILTER_ENV: &str = "GRIDVIEW_LOG";

const LOG_MAX_BYTES: u64 = 10 * 1024 * 1024;
const LOG_ROTATED_FILES: usize = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub enabled: bool,
    pub directive: String,
    pub file: PathBuf,
}

impl LogSettings {
    pub fn from_config(config: &Config) -> Result<Self> {
        let env_directive = env::var(LOG_FILTER_ENV).ok();
        Ok(Self {
            enabled: config.log_enabled(),
            directive: resolve_directive(env_directive.as_deref(), config.log_level()),
            file: config.log_file()?,
        })
    }
}

/// The environment variable wins over the configured level when set.
fn resolve_directive(env_directive: Option<&str>, configured: &str) -> String {
    match env_directive.map(str::trim) {
        Some(directive) if !directive.is_empty() => directive.to_owned(),
        _ => configured.to_owned(),
    }
}

fn open_appender(path: &Path) -> Result<BasicRollingFileAppender> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create log directory {}", parent.display()))?;
    }
    BasicRollingFileAppender::new(
        path,
        RollingConditionBasic::new().max_size(LOG_MAX_BYTES),
        LOG_ROTATED_FILES,
    )
    .with_context(|| format!("open log file {}", path.display()))
}

/// Installs the global subscriber. The returned guard flushes buffered
/// events on drop and must live as long as the process.
pub fn init(settings: &LogSettings) -> Result<Option<WorkerGuard>> {
    if !settings.enabled {
        return Ok(None);
    }

    let filter = EnvFilter::try_new(&settings.directive).with_context(|| {
        format!(
            "invalid log filter {:?}; check {LOG_FILTER_ENV} or [log].level",
            settings.directive
        )
    })?;
    let appender = open_appender(&settings.file)?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(file_layer)
        .with(filter)
        .try_init()
        .context("install log subscriber")?;

    tracing::info!(
        log_file = %settings.file.display(),
        filter = %settings.directive,
        "gridview logging initialized"
    );
    Ok(Some(guard))
}

#[cfg(test)]
mod tests {
    use super::{LogSettings, init, open_appender, resolve_directive};
    use anyhow::Result;
    use std::fs;
    use std::io::Write;

    #[test]
    fn env_directive_overrides_configured_level() {
        assert_eq!(resolve_directive(Some("debug"), "info"), "debug");
        assert_eq!(resolve_directive(Some("  "), "warn"), "warn");
        assert_eq!(resolve_directive(None, "info"), "info");
    }

    #[test]
    fn disabled_logging_touches_nothing() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let file = temp.path().join("nested").join("gridview.log");
        let settings = LogSettings {
            enabled: false,
            directive: "info".to_owned(),
            file: file.clone(),
        };

        assert!(init(&settings)?.is_none());
        assert!(!file.exists());
        Ok(())
    }

    #[test]
    fn invalid_directive_is_reported() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let settings = LogSettings {
            enabled: true,
            directive: "gridview=loud".to_owned(),
            file: temp.path().join("gridview.log"),
        };

        let error = init(&settings).expect_err("bad directive should fail");
        assert!(error.to_string().contains("invalid log filter"));
        Ok(())
    }

    #[test]
    fn appender_creates_log_directory_and_writes() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("nested").join("gridview.log");

        let mut appender = open_appender(&path)?;
        writeln!(appender, "report loaded")?;
        appender.flush()?;

        assert!(fs::read_to_string(&path)?.contains("report loaded"));
        Ok(())
    }
}
