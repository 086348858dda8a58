// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Context;
use gridview_app::{RawResultRecord, ReportIndex};
use reqwest::blocking::Client as HttpClient;
use std::fmt;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

/// Where a report comes from: a file on disk or an HTTP(S) URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportSource {
    File(PathBuf),
    Http(Url),
}

impl ReportSource {
    pub fn parse(raw: &str) -> Result<Self, ReportError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(invalid_source(raw, "source must not be empty"));
        }

        let url = match Url::parse(trimmed) {
            Ok(url) => url,
            Err(_) => return Ok(Self::File(PathBuf::from(trimmed))),
        };
        match url.scheme() {
            "http" | "https" => Ok(Self::Http(url)),
            "file" => url
                .to_file_path()
                .map(Self::File)
                .map_err(|()| invalid_source(raw, "file URL has no local path")),
            // Windows drive letters parse as one-letter schemes.
            scheme if scheme.len() == 1 => Ok(Self::File(PathBuf::from(trimmed))),
            scheme => Err(invalid_source(
                raw,
                &format!("unsupported scheme {scheme:?}; use a file path or an http(s) URL"),
            )),
        }
    }
}

impl fmt::Display for ReportSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Http(url) => write!(f, "{url}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportErrorKind {
    Load,
    Parse,
}

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("invalid report source {raw:?}: {reason}")]
    InvalidSource { raw: String, reason: String },

    #[error("cannot read report {path}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot reach {url}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("server returned {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("report {location} is not a JSON array of test results")]
    Parse {
        location: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ReportError {
    pub fn kind(&self) -> ReportErrorKind {
        match self {
            Self::Parse { .. } => ReportErrorKind::Parse,
            Self::InvalidSource { .. }
            | Self::ReadFile { .. }
            | Self::Request { .. }
            | Self::Status { .. } => ReportErrorKind::Load,
        }
    }
}

fn invalid_source(raw: &str, reason: &str) -> ReportError {
    ReportError::InvalidSource {
        raw: raw.to_owned(),
        reason: reason.to_owned(),
    }
}

#[derive(Debug, Clone)]
pub struct Loader {
    http: HttpClient,
    timeout: Option<Duration>,
}

impl Loader {
    /// `timeout` of `None` waits for the server indefinitely.
    pub fn new(timeout: Option<Duration>) -> anyhow::Result<Self> {
        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;
        Ok(Self { http, timeout })
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn fetch(&self, source: &ReportSource) -> Result<String, ReportError> {
        match source {
            ReportSource::File(path) => {
                fs::read_to_string(path).map_err(|source| ReportError::ReadFile {
                    path: path.clone(),
                    source,
                })
            }
            ReportSource::Http(url) => {
                let response = self
                    .http
                    .get(url.clone())
                    .send()
                    .map_err(|source| ReportError::Request {
                        url: url.to_string(),
                        source,
                    })?;

                let status = response.status();
                if !status.is_success() {
                    return Err(ReportError::Status {
                        url: url.to_string(),
                        status: status.as_u16(),
                    });
                }

                response.text().map_err(|source| ReportError::Request {
                    url: url.to_string(),
                    source,
                })
            }
        }
    }

    pub fn load(&self, source: &ReportSource) -> Result<ReportIndex, ReportError> {
        info!(%source, "loading report");
        let raw = self.fetch(source)?;
        debug!(%source, bytes = raw.len(), "report fetched");

        let records = parse_report(&raw, &source.to_string())?;
        let index = ReportIndex::build(records);

        let duplicates = index.duplicate_names();
        if !duplicates.is_empty() {
            warn!(
                count = duplicates.len(),
                names = ?duplicates,
                "duplicate test names in report; the last record wins"
            );
        }
        info!(
            %source,
            functions = index.function_count(),
            tests = index.row_count(),
            failed = index.failed_row_count(),
            "report loaded"
        );
        Ok(index)
    }
}

pub fn parse_report(raw: &str, location: &str) -> Result<Vec<RawResultRecord>, ReportError> {
    serde_json::from_str(raw).map_err(|source| ReportError::Parse {
        location: location.to_owned(),
        source,
    })
}
