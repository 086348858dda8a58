// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;
mod summary;

use anyhow::{Context, Result, anyhow, bail};
use config::Config;
use gridview_app::{AppState, Column};
use gridview_loader::{Loader, ReportSource};
use gridview_tui::ReportRuntime;
use logging::LogSettings;
use runtime::{DemoRuntime, LoaderRuntime};
use std::env;
use std::io;
use std::path::PathBuf;
use tracing::info;

fn main() {
    match run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(error) => {
            eprintln!("{error:#}");
            std::process::exit(1);
        }
    }
}

/// Returns false when `--summary` saw a failing test.
fn run() -> Result<bool> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(true);
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(true);
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(true);
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `gridview --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;
    let _log_guard = logging::init(&LogSettings::from_config(&config)?)?;
    let columns = config.columns()?;

    if options.demo {
        let mut runtime = DemoRuntime::new()?;
        return launch(&mut runtime, &options, columns);
    }

    let raw_source = options
        .report
        .as_deref()
        .or_else(|| config.report_source())
        .ok_or_else(|| {
            anyhow!(
                "no report given; pass a path or URL to results.json, or set [report].source in {}",
                options.config_path.display()
            )
        })?;
    let source = ReportSource::parse(raw_source)?;
    let loader = Loader::new(config.report_timeout()?).with_context(|| {
        format!(
            "invalid [report] config in {}; fix the timeout value",
            options.config_path.display()
        )
    })?;
    let mut runtime = LoaderRuntime::new(loader, source);
    launch(&mut runtime, &options, columns)
}

fn launch<R: ReportRuntime>(
    runtime: &mut R,
    options: &CliOptions,
    columns: Vec<Column>,
) -> Result<bool> {
    if options.check_only {
        let index = runtime.load_report()?;
        println!(
            "{}: {} functions, {} tests, {} failed",
            runtime.source_label(),
            index.function_count(),
            index.row_count(),
            index.failed_row_count()
        );
        return Ok(true);
    }

    if options.summary {
        let index = runtime.load_report()?;
        let counts = summary::write_summary(&index, &mut io::stdout().lock())
            .context("write summary")?;
        info!(
            passed = counts.passed,
            total = counts.total,
            "summary printed"
        );
        return Ok(counts.all_passed());
    }

    let mut state = AppState::default();
    gridview_tui::run_app(&mut state, runtime, columns)?;
    Ok(true)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    report: Option<String>,
    print_config_path: bool,
    print_example: bool,
    demo: bool,
    check_only: bool,
    summary: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        report: None,
        print_config_path: false,
        print_example: false,
        demo: false,
        check_only: false,
        summary: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--summary" => {
                options.summary = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            flag if flag.starts_with('-') => {
                bail!("unknown argument {flag:?}; run with --help to see supported options");
            }
            report => {
                if let Some(previous) = &options.report {
                    bail!("only one report can be shown at a time; got {previous:?} and {report:?}");
                }
                options.report = Some(report.to_owned());
            }
        }
    }

    if options.demo && options.report.is_some() {
        bail!("--demo cannot be combined with a REPORT argument");
    }

    Ok(options)
}

fn print_help() {
    println!("gridview [OPTIONS] [REPORT]");
    println!("  REPORT                   Path or http(s) URL of a results.json report");
    println!("  --config <path>          Use a specific config path");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a config template");
    println!("  --demo                   Browse a generated demo report (in-memory)");
    println!("  --check                  Load and validate the report, then exit");
    println!("  --summary                Print pass/fail per test; exit 1 on any failure");
    println!("  --help                   Show this help");
}
