// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use gridview_app::ReportIndex;
use gridview_loader::{Loader, ReportSource, parse_report};
use gridview_tui::{InternalEvent, ReportRuntime};
use std::sync::mpsc::Sender;
use std::thread;
use tracing::{info, warn};

/// Loads a report from disk or over HTTP. The TUI gets its report from a
/// background thread so the first frame never waits on the network.
pub struct LoaderRuntime {
    loader: Loader,
    source: ReportSource,
}

impl LoaderRuntime {
    pub fn new(loader: Loader, source: ReportSource) -> Self {
        Self { loader, source }
    }
}

impl ReportRuntime for LoaderRuntime {
    fn source_label(&self) -> String {
        self.source.to_string()
    }

    fn load_report(&mut self) -> Result<ReportIndex> {
        Ok(self.loader.load(&self.source)?)
    }

    fn spawn_report_load(&mut self, tx: Sender<InternalEvent>) -> Result<()> {
        let loader = self.loader.clone();
        let source = self.source.clone();
        thread::Builder::new()
            .name("report-load".to_owned())
            .spawn(move || {
                let outcome = loader.load(&source).map_err(|error| {
                    let message = format!("{:#}", anyhow::Error::new(error));
                    warn!(%source, error = %message, "background report load failed");
                    message
                });
                if tx.send(InternalEvent::ReportLoaded(outcome)).is_err() {
                    info!(%source, "report arrived after the UI closed");
                }
            })
            .context("spawn report load thread")?;
        Ok(())
    }
}

/// Serves the generated demo report from memory.
pub struct DemoRuntime {
    raw: String,
}

impl DemoRuntime {
    pub fn new() -> Result<Self> {
        Ok(Self {
            raw: gridview_testkit::demo_report_json()?,
        })
    }
}

impl ReportRuntime for DemoRuntime {
    fn source_label(&self) -> String {
        "demo".to_owned()
    }

    fn load_report(&mut self) -> Result<ReportIndex> {
        let records = parse_report(&self.raw, "demo")?;
        Ok(ReportIndex::build(records))
    }
}
