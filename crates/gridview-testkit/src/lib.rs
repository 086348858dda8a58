// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use gridview_app::{RawResultRecord, ReportIndex};
use serde_json::{Value, json};
use std::path::PathBuf;

const MODULES: [&str; 5] = ["calculator", "strings", "geometry", "inventory", "parsing"];

const FUNCTION_NAMES: [&str; 10] = [
    "add",
    "divide",
    "reverse",
    "area",
    "lookup",
    "tokenize",
    "normalize",
    "merge",
    "scale",
    "checksum",
];

const ARG_NAMES: [&str; 6] = ["x", "y", "count", "text", "width", "key"];

const WORDS: [&str; 16] = [
    "alpha", "bravo", "delta", "echo", "grid", "tensor", "matrix", "vector", "token", "buffer",
    "widget", "sample", "record", "result", "module", "value",
];

const EXCEPTIONS: [&str; 5] = [
    "ZeroDivisionError",
    "ValueError",
    "TypeError",
    "KeyError",
    "IndexError",
];

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }

    fn chance(&mut self, one_in: usize) -> bool {
        self.int_n(one_in) == 0
    }
}

/// Generates plausible `results.json` reports. The same seed always yields
/// the same report.
#[derive(Debug, Clone)]
pub struct ReportFaker {
    rng: DeterministicRng,
}

impl ReportFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
        }
    }

    pub fn report(&mut self, functions: usize, tests_per_function: usize) -> Vec<Value> {
        let mut records = Vec::with_capacity(functions * tests_per_function);
        for function_index in 0..functions {
            let module = MODULES[function_index % MODULES.len()];
            let function = format!(
                "{module}.{}",
                FUNCTION_NAMES[(function_index / MODULES.len() + function_index)
                    % FUNCTION_NAMES.len()]
            );
            for test_index in 0..tests_per_function {
                records.push(self.record(module, &function, test_index));
            }
        }
        records
    }

    pub fn record(&mut self, module: &str, function: &str, index: usize) -> Value {
        let failed = self.rng.chance(5);
        let raises = if failed && self.rng.chance(2) {
            Value::from(self.pick(&EXCEPTIONS))
        } else {
            Value::Null
        };
        let result = if failed && !raises.is_null() {
            Value::Null
        } else {
            self.result_value()
        };

        let mut args = serde_json::Map::new();
        let arg_count = 1 + self.rng.int_n(3);
        for _ in 0..arg_count {
            let name = self.pick(&ARG_NAMES);
            let value = if self.rng.chance(2) {
                Value::from(self.rng.int_n(200) as i64 - 50)
            } else {
                Value::from(self.pick(&WORDS))
            };
            args.insert(name.to_owned(), value);
        }

        let mut metrics = serde_json::Map::new();
        metrics.insert(
            "@timeit".to_owned(),
            json!([format!("{}.{:02} ms", self.rng.int_n(40), self.rng.int_n(100))]),
        );
        if self.rng.chance(3) {
            metrics.insert(
                "@length".to_owned(),
                json!([self.rng.int_n(500).to_string()]),
            );
        }

        let err = if failed {
            format!("{function} did not return the expected value\n")
        } else {
            String::new()
        };

        let success = if failed { "false" } else { "true" };
        json!({
            "name": format!("{function}.{index}"),
            "function": function,
            "filename": format!("{module}.py"),
            "module": module,
            "success": success,
            "params": {"args": Value::Object(args)},
            "raises": raises,
            "result": result,
            "metrics": Value::Object(metrics),
            "out": [format!("running {function}\n")],
            "err": err,
        })
    }

    fn result_value(&mut self) -> Value {
        match self.rng.int_n(4) {
            0 => Value::from(self.rng.int_n(10_000) as i64),
            1 => Value::from(self.pick(&WORDS)),
            2 => {
                // Long enough to exercise the grid's result truncation.
                let words = (0..20)
                    .map(|_| self.pick(&WORDS))
                    .collect::<Vec<_>>()
                    .join(" ");
                Value::from(words)
            }
            _ => Value::Bool(self.rng.chance(2)),
        }
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }
}

/// The report used by `--demo`.
pub fn demo_report_json() -> Result<String> {
    let records = ReportFaker::new(7).report(8, 6);
    serde_json::to_string_pretty(&records).context("serialize demo report")
}

/// One passing and one failing test of the same function.
pub fn scenario_report() -> Value {
    json!([
        {"name": "t1", "function": "f", "module": "m", "success": "true",
         "params": {"args": []}, "raises": null, "result": "ok",
         "metrics": {}, "out": "", "err": ""},
        {"name": "t2", "function": "f", "module": "m", "success": "false",
         "params": {"args": []}, "raises": "Err", "result": "bad",
         "metrics": {}, "out": "", "err": ""},
    ])
}

pub fn records(report: Value) -> Result<Vec<RawResultRecord>> {
    serde_json::from_value(report).context("decode report fixture")
}

pub fn sample_index(seed: u64) -> Result<ReportIndex> {
    let report = Value::Array(ReportFaker::new(seed).report(4, 5));
    Ok(ReportIndex::build(records(report)?))
}

pub fn temp_report_path(report: &Value) -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let path = dir.path().join("results.json");
    let body = serde_json::to_string_pretty(report).context("serialize report fixture")?;
    std::fs::write(&path, body).with_context(|| format!("write {}", path.display()))?;
    Ok((dir, path))
}
