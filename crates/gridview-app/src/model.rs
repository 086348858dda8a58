// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;

/// Maximum number of characters of a result kept on a grid row.
pub const RESULT_SLUG_CHARS: usize = 79;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Column {
    Module,
    Name,
    Success,
    Args,
    Raises,
    Result,
}

impl Column {
    pub const ALL: [Self; 6] = [
        Self::Module,
        Self::Name,
        Self::Success,
        Self::Args,
        Self::Raises,
        Self::Result,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Module => "module",
            Self::Name => "name",
            Self::Success => "success",
            Self::Args => "args",
            Self::Raises => "raises",
            Self::Result => "result",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "module" => Some(Self::Module),
            "name" => Some(Self::Name),
            "success" => Some(Self::Success),
            "args" | "params" => Some(Self::Args),
            "raises" => Some(Self::Raises),
            "result" => Some(Self::Result),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub const fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Asc => ordering,
            Self::Desc => ordering.reverse(),
        }
    }
}

/// One element of a `results.json` report as written by the test runner.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawResultRecord {
    pub name: String,
    pub function: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub module: String,
    #[serde(deserialize_with = "deserialize_success")]
    pub success: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub params: Params,
    #[serde(default)]
    pub raises: Option<String>,
    #[serde(default)]
    pub result: Value,
    #[serde(default, deserialize_with = "null_as_default")]
    pub metrics: Map<String, Value>,
    #[serde(default, deserialize_with = "deserialize_output")]
    pub out: String,
    #[serde(default, deserialize_with = "deserialize_output")]
    pub err: String,
}

impl RawResultRecord {
    pub fn result_text(&self) -> String {
        value_text(&self.result)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Params {
    #[serde(default)]
    pub args: Value,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SuccessField {
    Flag(bool),
    Text(String),
}

fn deserialize_success<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match SuccessField::deserialize(deserializer)? {
        SuccessField::Flag(value) => Ok(value),
        SuccessField::Text(value) => match value.as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(D::Error::custom(format!(
                "success must be \"true\" or \"false\", got {other:?}"
            ))),
        },
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CapturedOutput {
    Text(String),
    Lines(Vec<String>),
}

fn deserialize_output<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let output = Option::<CapturedOutput>::deserialize(deserializer)?;
    Ok(match output {
        Some(CapturedOutput::Text(text)) => text,
        Some(CapturedOutput::Lines(lines)) => lines.concat(),
        None => String::new(),
    })
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Renders a JSON value the way the grid and detail view show it.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

pub fn truncate_chars(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}

/// Upper-cases the first character and leaves the rest untouched.
pub fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub const fn success_label(success: bool) -> &'static str {
    if success { "true" } else { "false" }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowRecord {
    pub module: String,
    pub name: String,
    pub success: bool,
    pub params: Value,
    pub raises: Option<String>,
    pub result: String,
}

impl RowRecord {
    pub fn from_raw(raw: &RawResultRecord) -> Self {
        Self {
            module: raw.module.clone(),
            name: raw.name.clone(),
            success: raw.success,
            params: raw.params.args.clone(),
            raises: raw.raises.clone(),
            result: truncate_chars(&raw.result_text(), RESULT_SLUG_CHARS),
        }
    }

    pub fn cell(&self, column: Column) -> CellValue<'_> {
        match column {
            Column::Module => CellValue::Text(&self.module),
            Column::Name => CellValue::Text(&self.name),
            Column::Success => CellValue::Flag(self.success),
            Column::Args => CellValue::Json(&self.params),
            Column::Raises => match &self.raises {
                Some(raises) => CellValue::Text(raises),
                None => CellValue::Missing,
            },
            Column::Result => CellValue::Text(&self.result),
        }
    }

    /// `needle` must already be lower-cased.
    pub fn matches_filter(&self, needle: &str) -> bool {
        Column::ALL
            .iter()
            .any(|column| self.cell(*column).display().to_lowercase().contains(needle))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellValue<'a> {
    Text(&'a str),
    Flag(bool),
    Json(&'a Value),
    Missing,
}

impl CellValue<'_> {
    pub fn display(&self) -> String {
        match self {
            Self::Text(value) => (*value).to_owned(),
            Self::Flag(value) => success_label(*value).to_owned(),
            Self::Json(value) => value_text(value),
            Self::Missing => String::new(),
        }
    }

    /// Total order over cells. Missing sorts first; JSON values order by type
    /// before value.
    pub fn cmp_value(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Text(left), Self::Text(right)) => left.cmp(right),
            (Self::Flag(left), Self::Flag(right)) => left.cmp(right),
            (Self::Json(left), Self::Json(right)) => cmp_json(left, right),
            (Self::Missing, Self::Missing) => Ordering::Equal,
            _ => self.rank().cmp(&other.rank()),
        }
    }

    const fn rank(&self) -> u8 {
        match self {
            Self::Missing => 0,
            Self::Flag(_) => 1,
            Self::Json(_) => 2,
            Self::Text(_) => 3,
        }
    }
}

const fn json_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// null < bool < number < string < array < object; containers compare
/// element by element.
pub fn cmp_json(left: &Value, right: &Value) -> Ordering {
    match (left, right) {
        (Value::Bool(left), Value::Bool(right)) => left.cmp(right),
        (Value::Number(left), Value::Number(right)) => {
            let left = left.as_f64().unwrap_or(f64::NAN);
            let right = right.as_f64().unwrap_or(f64::NAN);
            left.total_cmp(&right)
        }
        (Value::String(left), Value::String(right)) => left.cmp(right),
        (Value::Array(left), Value::Array(right)) => left
            .iter()
            .zip(right)
            .map(|(left, right)| cmp_json(left, right))
            .find(|ordering| ordering.is_ne())
            .unwrap_or_else(|| left.len().cmp(&right.len())),
        (Value::Object(left), Value::Object(right)) => left
            .iter()
            .zip(right)
            .map(|((left_key, left), (right_key, right))| {
                left_key.cmp(right_key).then_with(|| cmp_json(left, right))
            })
            .find(|ordering| ordering.is_ne())
            .unwrap_or_else(|| left.len().cmp(&right.len())),
        _ => json_rank(left).cmp(&json_rank(right)),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSummary {
    pub name: String,
    pub success: bool,
}
