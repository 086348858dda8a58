// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use gridview_app::{ReportIndex, RowRecord, value_text};
use serde_json::Value;
use std::collections::HashSet;
use std::io::{self, Write};

const RULE_WIDTH: usize = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryCounts {
    pub passed: usize,
    pub total: usize,
}

impl SummaryCounts {
    pub fn all_passed(self) -> bool {
        self.passed == self.total
    }
}

/// Prints one status line per row, then the metrics table (once per test
/// name) and the pass count, in report order.
pub fn write_summary(index: &ReportIndex, out: &mut impl Write) -> io::Result<SummaryCounts> {
    let rule = "_".repeat(RULE_WIDTH);
    writeln!(out, "{:<30} {:<30} {:<30}", "Name", "Status", "Summary")?;
    writeln!(out, "{rule}")?;

    let rows = index
        .groups()
        .iter()
        .flat_map(|group| group.rows.iter())
        .collect::<Vec<_>>();

    let mut counts = SummaryCounts {
        passed: 0,
        total: 0,
    };
    for row in &rows {
        counts.total += 1;
        if row.success {
            counts.passed += 1;
        }
        let status = if row.success { "success" } else { "failure" };
        writeln!(
            out,
            "{:<30} {:<30} {:<30}",
            row.name,
            status,
            summary_note(row)
        )?;
    }

    let mut seen = HashSet::new();
    let metric_lines = rows
        .iter()
        .filter(|row| seen.insert(row.name.as_str()))
        .filter_map(|row| index.test(&row.name))
        .flat_map(|record| {
            record
                .metrics
                .iter()
                .map(move |(metric, value)| (record.name.as_str(), metric, metric_text(value)))
        })
        .collect::<Vec<_>>();
    if !metric_lines.is_empty() {
        writeln!(out, "\n{rule}")?;
    }
    for (name, metric, value) in metric_lines {
        writeln!(out, "{name:<30} {metric:<30} {value:<30}")?;
    }

    writeln!(out, "\n{}/{} tests passed", counts.passed, counts.total)?;
    Ok(counts)
}

fn summary_note(row: &RowRecord) -> String {
    match &row.raises {
        Some(raises) if !row.success => format!("raises {raises}"),
        _ => row.result.clone(),
    }
}

/// Metric values are usually lists of strings; show them pipe-joined.
fn metric_text(value: &Value) -> String {
    match value {
        Value::Array(items) => items.iter().map(value_text).collect::<Vec<_>>().join("|"),
        other => value_text(other),
    }
}

#[cfg(test)]
mod tests {
    use super::{metric_text, write_summary};
    use anyhow::Result;
    use gridview_app::ReportIndex;
    use gridview_testkit::{records, scenario_report};
    use serde_json::json;

    fn render(index: &ReportIndex) -> Result<(String, super::SummaryCounts)> {
        let mut out = Vec::new();
        let counts = write_summary(index, &mut out)?;
        Ok((String::from_utf8(out)?, counts))
    }

    #[test]
    fn scenario_summary_lists_each_test_and_count() -> Result<()> {
        let index = ReportIndex::build(records(scenario_report())?);
        let (text, counts) = render(&index)?;

        assert_eq!(counts.passed, 1);
        assert_eq!(counts.total, 2);
        assert!(!counts.all_passed());

        let lines = text.lines().collect::<Vec<_>>();
        assert!(lines[0].starts_with("Name"));
        assert_eq!(lines[1], "_".repeat(120));
        assert!(lines[2].starts_with("t1"));
        assert!(lines[2].contains("success"));
        assert!(lines[2].contains("ok"));
        assert!(lines[3].starts_with("t2"));
        assert!(lines[3].contains("failure"));
        assert!(lines[3].contains("raises Err"));
        assert!(text.ends_with("\n1/2 tests passed\n"));
        Ok(())
    }

    #[test]
    fn metrics_are_listed_after_the_status_table() -> Result<()> {
        let index = ReportIndex::build(records(json!([
            {"name": "t1", "function": "f", "success": "true",
             "metrics": {"@timeit": ["0.10 ms", "0.12 ms"], "@length": 4}},
        ]))?);
        let (text, counts) = render(&index)?;

        assert!(counts.all_passed());
        let timeit = text
            .lines()
            .find(|line| line.contains("@timeit"))
            .expect("timeit metric line");
        assert!(timeit.starts_with("t1"));
        assert!(timeit.contains("0.10 ms|0.12 ms"));
        assert!(text.lines().any(|line| line.contains("@length") && line.contains('4')));
        Ok(())
    }

    #[test]
    fn duplicate_names_print_metrics_once() -> Result<()> {
        let index = ReportIndex::build(records(json!([
            {"name": "t1", "function": "f", "success": "true",
             "metrics": {"@timeit": ["1 ms"]}},
            {"name": "t1", "function": "f", "success": "false",
             "metrics": {"@timeit": ["2 ms"]}},
        ]))?);
        let (text, counts) = render(&index)?;

        assert_eq!(counts.total, 2);
        let metric_lines = text
            .lines()
            .filter(|line| line.contains("@timeit"))
            .collect::<Vec<_>>();
        assert_eq!(metric_lines.len(), 1);
        assert!(metric_lines[0].contains("2 ms"));
        Ok(())
    }

    #[test]
    fn empty_report_passes_trivially() -> Result<()> {
        let (text, counts) = render(&ReportIndex::default())?;
        assert!(counts.all_passed());
        assert!(text.ends_with("\n0/0 tests passed\n"));
        assert!(!text.contains("\n\n_"));
        Ok(())
    }

    #[test]
    fn metric_text_joins_lists() {
        assert_eq!(metric_text(&json!(["a", 1, true])), "a|1|true");
        assert_eq!(metric_text(&json!("plain")), "plain");
        assert_eq!(metric_text(&json!(null)), "");
    }
}
