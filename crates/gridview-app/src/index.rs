// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{FunctionSummary, RawResultRecord, RowRecord};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionGroup {
    pub summary: FunctionSummary,
    pub rows: Arc<[RowRecord]>,
}

/// Reshaped report: the flat test map plus the per-function lookup and
/// sidebar, both in first-seen order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportIndex {
    tests: HashMap<String, RawResultRecord>,
    groups: Vec<FunctionGroup>,
    positions: HashMap<String, usize>,
    duplicate_names: Vec<String>,
}

impl ReportIndex {
    pub fn build(records: Vec<RawResultRecord>) -> Self {
        let mut tests = HashMap::with_capacity(records.len());
        let mut summaries: Vec<FunctionSummary> = Vec::new();
        let mut rows: Vec<Vec<RowRecord>> = Vec::new();
        let mut positions = HashMap::new();
        let mut duplicate_names = Vec::new();

        for record in records {
            let row = RowRecord::from_raw(&record);

            let position = match positions.get(&record.function) {
                Some(position) => *position,
                None => {
                    let position = summaries.len();
                    positions.insert(record.function.clone(), position);
                    summaries.push(FunctionSummary {
                        name: record.function.clone(),
                        success: record.success,
                    });
                    rows.push(Vec::new());
                    position
                }
            };

            // Failure is sticky for the rest of the pass.
            if !record.success {
                summaries[position].success = false;
            }
            rows[position].push(row);

            if let Some(previous) = tests.insert(record.name.clone(), record) {
                duplicate_names.push(previous.name);
            }
        }

        let groups = summaries
            .into_iter()
            .zip(rows)
            .map(|(summary, rows)| FunctionGroup {
                summary,
                rows: Arc::from(rows),
            })
            .collect();

        Self {
            tests,
            groups,
            positions,
            duplicate_names,
        }
    }

    pub fn lookup(&self, function: &str) -> Option<&Arc<[RowRecord]>> {
        self.group(function).map(|group| &group.rows)
    }

    pub fn summary(&self, function: &str) -> Option<&FunctionSummary> {
        self.group(function).map(|group| &group.summary)
    }

    pub fn sidebar(&self) -> impl Iterator<Item = &FunctionSummary> {
        self.groups.iter().map(|group| &group.summary)
    }

    pub fn groups(&self) -> &[FunctionGroup] {
        &self.groups
    }

    pub fn initial_function(&self) -> Option<&str> {
        self.groups
            .first()
            .map(|group| group.summary.name.as_str())
    }

    pub fn test(&self, name: &str) -> Option<&RawResultRecord> {
        self.tests.get(name)
    }

    pub fn function_count(&self) -> usize {
        self.groups.len()
    }

    pub fn row_count(&self) -> usize {
        self.groups.iter().map(|group| group.rows.len()).sum()
    }

    pub fn failed_row_count(&self) -> usize {
        self.groups
            .iter()
            .flat_map(|group| group.rows.iter())
            .filter(|row| !row.success)
            .count()
    }

    /// Names that appeared more than once; the last record won.
    pub fn duplicate_names(&self) -> &[String] {
        &self.duplicate_names
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    fn group(&self, function: &str) -> Option<&FunctionGroup> {
        self.positions
            .get(function)
            .and_then(|position| self.groups.get(*position))
    }
}

#[cfg(test)]
mod tests {
    use super::ReportIndex;
    use crate::{FunctionSummary, RawResultRecord};
    use anyhow::Result;
    use serde_json::json;

    fn records(value: serde_json::Value) -> Result<Vec<RawResultRecord>> {
        Ok(serde_json::from_value(value)?)
    }

    fn record(name: &str, function: &str, success: &str) -> serde_json::Value {
        json!({
            "name": name,
            "function": function,
            "module": "m",
            "success": success,
            "params": {"args": []},
            "raises": null,
            "result": format!("result of {name}"),
            "metrics": {},
            "out": "",
            "err": "",
        })
    }

    #[test]
    fn failing_record_downgrades_function_summary() -> Result<()> {
        let index = ReportIndex::build(records(json!([
            {"name": "t1", "function": "f", "module": "m", "success": "true",
             "params": {"args": []}, "raises": null, "result": "ok",
             "metrics": {}, "out": "", "err": ""},
            {"name": "t2", "function": "f", "module": "m", "success": "false",
             "params": {"args": []}, "raises": "Err", "result": "bad",
             "metrics": {}, "out": "", "err": ""},
        ]))?);

        let rows = index.lookup("f").expect("lookup entry for f");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "t1");
        assert_eq!(rows[1].name, "t2");
        assert_eq!(rows[1].raises.as_deref(), Some("Err"));
        assert_eq!(
            index.summary("f"),
            Some(&FunctionSummary {
                name: "f".to_owned(),
                success: false,
            })
        );
        assert_eq!(index.initial_function(), Some("f"));
        Ok(())
    }

    #[test]
    fn empty_report_builds_empty_indexes() {
        let index = ReportIndex::build(Vec::new());
        assert!(index.is_empty());
        assert_eq!(index.sidebar().count(), 0);
        assert_eq!(index.initial_function(), None);
        assert_eq!(index.row_count(), 0);
    }

    #[test]
    fn failure_is_sticky_wherever_it_appears() -> Result<()> {
        for failing in 0..4 {
            let list = (0..4)
                .map(|position| {
                    let success = if position == failing { "false" } else { "true" };
                    record(&format!("t{position}"), "f", success)
                })
                .collect::<Vec<_>>();
            let index = ReportIndex::build(records(serde_json::Value::Array(list))?);
            assert_eq!(
                index.summary("f").map(|summary| summary.success),
                Some(false),
                "failing record at {failing}"
            );
        }
        Ok(())
    }

    #[test]
    fn all_passing_function_stays_successful() -> Result<()> {
        let index = ReportIndex::build(records(json!([
            record("t1", "f", "true"),
            record("t2", "f", "true"),
        ]))?);
        assert_eq!(index.summary("f").map(|summary| summary.success), Some(true));
        Ok(())
    }

    #[test]
    fn groups_keep_first_seen_order() -> Result<()> {
        let index = ReportIndex::build(records(json!([
            record("b1", "beta", "true"),
            record("a1", "alpha", "false"),
            record("b2", "beta", "true"),
            record("c1", "gamma", "true"),
        ]))?);

        let names = index
            .sidebar()
            .map(|summary| summary.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["beta", "alpha", "gamma"]);
        assert_eq!(index.initial_function(), Some("beta"));
        assert_eq!(index.lookup("beta").map(|rows| rows.len()), Some(2));
        assert_eq!(index.function_count(), 3);
        assert_eq!(index.row_count(), 4);
        assert_eq!(index.failed_row_count(), 1);
        Ok(())
    }

    #[test]
    fn duplicate_names_keep_last_record_and_every_row() -> Result<()> {
        let mut second = record("dup", "f", "false");
        second["result"] = json!("second");
        let index = ReportIndex::build(records(json!([record("dup", "f", "true"), second]))?);

        assert_eq!(index.duplicate_names(), ["dup".to_owned()]);
        assert_eq!(
            index.test("dup").map(|raw| raw.result_text()),
            Some("second".to_owned())
        );
        assert_eq!(index.lookup("f").map(|rows| rows.len()), Some(2));
        Ok(())
    }

    #[test]
    fn unknown_function_lookup_is_none() {
        let index = ReportIndex::build(Vec::new());
        assert!(index.lookup("missing").is_none());
        assert!(index.test("missing").is_none());
    }
}
