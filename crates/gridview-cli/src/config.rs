// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use gridview_app::{Column, DEFAULT_COLUMNS};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

pub const APP_NAME: &str = "gridview";
const CONFIG_VERSION: i64 = 1;
const CONFIG_PATH_ENV: &str = "GRIDVIEW_CONFIG_PATH";
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub report: Report,
    #[serde(default)]
    pub ui: Ui,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            report: Report::default(),
            ui: Ui::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Report {
    pub source: Option<String>,
    pub timeout: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Ui {
    pub columns: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    pub enabled: Option<bool>,
    pub level: Option<String>,
    pub file: Option<String>,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            enabled: Some(true),
            level: Some(DEFAULT_LOG_LEVEL.to_owned()),
            file: None,
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set {CONFIG_PATH_ENV} to the config file")
        })?;
        Ok(config_root.join(APP_NAME).join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} has no version; add `version = {CONFIG_VERSION}` at the top",
                    path.display()
                )
            })?;
        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {version} in {}; expected version = {CONFIG_VERSION}",
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(source) = &self.report.source
            && source.trim().is_empty()
        {
            bail!(
                "report.source in {} must not be empty; remove it or give a path or URL",
                path.display()
            );
        }

        if let Some(timeout) = &self.report.timeout {
            let parsed = parse_duration(timeout)?;
            if parsed.is_zero() {
                bail!(
                    "report.timeout in {} must be positive, got {timeout}",
                    path.display()
                );
            }
        }

        if let Some(columns) = &self.ui.columns {
            parse_columns(columns).with_context(|| format!("ui.columns in {}", path.display()))?;
        }

        if let Some(level) = &self.log.level {
            EnvFilter::try_new(level)
                .with_context(|| format!("log.level {level:?} in {}", path.display()))?;
        }

        if let Some(file) = &self.log.file
            && file.trim().is_empty()
        {
            bail!("log.file in {} must not be empty", path.display());
        }

        Ok(())
    }

    pub fn report_source(&self) -> Option<&str> {
        self.report.source.as_deref().map(str::trim)
    }

    /// `None` means no timeout.
    pub fn report_timeout(&self) -> Result<Option<Duration>> {
        self.report
            .timeout
            .as_deref()
            .map(parse_duration)
            .transpose()
    }

    pub fn columns(&self) -> Result<Vec<Column>> {
        match &self.ui.columns {
            Some(columns) => parse_columns(columns),
            None => Ok(DEFAULT_COLUMNS.to_vec()),
        }
    }

    pub fn log_enabled(&self) -> bool {
        self.log.enabled.unwrap_or(true)
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_file(&self) -> Result<PathBuf> {
        if let Some(file) = &self.log.file {
            return Ok(PathBuf::from(file));
        }
        let data_root = dirs::data_dir()
            .ok_or_else(|| anyhow!("cannot resolve data directory; set [log].file explicitly"))?;
        Ok(data_root.join(APP_NAME).join("gridview.log"))
    }

    pub fn example_config(path: &Path) -> String {
        let columns = DEFAULT_COLUMNS
            .iter()
            .map(|column| format!("\"{}\"", column.as_str()))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "# gridview config\n# Place this file at: {}\n\nversion = {CONFIG_VERSION}\n\n[report]\n# Path or http(s) URL of a results.json report. The REPORT argument wins.\n# source = \"results.json\"\n# Optional. No timeout when unset.\n# timeout = \"30s\"\n\n[ui]\ncolumns = [{columns}]\n\n[log]\nenabled = true\n# GRIDVIEW_LOG overrides this filter.\nlevel = \"{DEFAULT_LOG_LEVEL}\"\n# Optional. Default is the platform data dir (for example ~/.local/share/gridview/gridview.log)\n# file = \"/absolute/path/to/gridview.log\"\n",
            path.display(),
        )
    }
}

fn parse_columns(raw: &[String]) -> Result<Vec<Column>> {
    if raw.is_empty() {
        bail!("at least one column is required");
    }

    let mut columns = Vec::with_capacity(raw.len());
    for name in raw {
        let column = Column::parse(name.trim()).ok_or_else(|| {
            let known = DEFAULT_COLUMNS
                .iter()
                .map(|column| column.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            anyhow!("unknown column {name:?}; choose from {known}")
        })?;
        if columns.contains(&column) {
            bail!("column {name:?} is listed more than once");
        }
        columns.push(column);
    }
    Ok(columns)
}

fn parse_duration(raw: &str) -> Result<Duration> {
    let raw = raw.trim();
    let (digits, scale): (&str, fn(u64) -> Duration) = if let Some(value) = raw.strip_suffix("ms")
    {
        (value, Duration::from_millis)
    } else if let Some(value) = raw.strip_suffix('s') {
        (value, Duration::from_secs)
    } else if let Some(value) = raw.strip_suffix('m') {
        (value, |mins| Duration::from_secs(mins.saturating_mul(60)))
    } else {
        bail!("invalid duration {raw:?}; use <N>ms, <N>s or <N>m (for example 500ms or 30s)");
    };

    let amount: u64 = digits
        .parse()
        .with_context(|| format!("invalid timeout duration {raw:?}"))?;
    Ok(scale(amount))
}
