// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{RawResultRecord, success_label, value_text};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailView {
    pub header: String,
    pub body: String,
}

/// Formats one test for the detail modal. The result is shown in full, not
/// the truncated grid slug.
pub fn describe(record: &RawResultRecord) -> DetailView {
    let mut lines = vec![
        format!("out: {}", record.out),
        format!("err: {}", record.err),
        "metrics:".to_owned(),
    ];
    lines.extend(
        record
            .metrics
            .iter()
            .map(|(name, value)| format!("{name}: {}", value_text(value))),
    );
    lines.push(String::new());
    lines.push(format!(
        "raises: {}",
        record.raises.as_deref().unwrap_or_default()
    ));
    lines.push(format!("success: {}", success_label(record.success)));
    lines.push(format!("result: {}", record.result_text()));

    DetailView {
        header: record.name.clone(),
        body: lines.join("\n"),
    }
}
