//! Human readable rendering of query results.

use std::fmt;

use chrono::DateTime;
use serde_json::{Map, Value};

use crate::scroll::display_width;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimePrecision {
    Seconds,
    Milliseconds,
    Microseconds,
    Nanoseconds,
}

impl TimePrecision {
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim() {
            "s" => Some(Self::Seconds),
            "ms" => Some(Self::Milliseconds),
            "us" => Some(Self::Microseconds),
            "ns" => Some(Self::Nanoseconds),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Seconds => "s",
            Self::Milliseconds => "ms",
            Self::Microseconds => "us",
            Self::Nanoseconds => "ns",
        }
    }

    fn units_per_second(self) -> i64 {
        match self {
            Self::Seconds => 1,
            Self::Milliseconds => 1_000,
            Self::Microseconds => 1_000_000,
            Self::Nanoseconds => 1_000_000_000,
        }
    }

    /// Formats a database timestamp as a UTC date, or `None` when out of range.
    pub fn format_timestamp(self, ts: i64) -> Option<String> {
        let per_second = self.units_per_second();
        let secs = ts.div_euclid(per_second);
        let nanos = ts.rem_euclid(per_second) * (1_000_000_000 / per_second);
        let date = DateTime::from_timestamp(secs, u32::try_from(nanos).ok()?)?;
        let pattern = match self {
            Self::Seconds => "%Y-%m-%d %H:%M:%S",
            Self::Milliseconds => "%Y-%m-%d %H:%M:%S%.3f",
            Self::Microseconds => "%Y-%m-%d %H:%M:%S%.6f",
            Self::Nanoseconds => "%Y-%m-%d %H:%M:%S%.9f",
        };
        Some(date.format(pattern).to_string())
    }
}

impl fmt::Display for TimePrecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Renders a result map as display lines.
///
/// Recognised shapes are messages, help text, `calc` timestamps, column
/// tables, `data` name/value tables, plain counters and series points.
/// Anything else falls back to indented JSON.
pub fn format_result(value: &Value, precision: Option<TimePrecision>) -> Vec<String> {
    let Some(object) = value.as_object() else {
        return pretty(value);
    };
    if let Some(text) = object.get("success_msg").and_then(Value::as_str) {
        return text.lines().map(str::to_string).collect();
    }
    if let Some(text) = object.get("help").and_then(Value::as_str) {
        return text.lines().map(str::to_string).collect();
    }
    if let Some(calc) = object.get("calc").and_then(Value::as_i64) {
        return vec![match precision.and_then(|p| p.format_timestamp(calc)) {
            Some(date) => format!("{calc}  ({date} UTC)"),
            None => calc.to_string(),
        }];
    }
    if let Some(lines) = column_table(object) {
        return lines;
    }
    if let Some(lines) = data_table(object) {
        return lines;
    }
    series_or_counters(object, precision).unwrap_or_else(|| pretty(value))
}

/// `{"columns": [...], "<collection>": [[...], ...]}` as returned by list queries.
fn column_table(object: &Map<String, Value>) -> Option<Vec<String>> {
    let columns = object.get("columns")?.as_array()?;
    let rows = object
        .iter()
        .find(|(key, value)| key.as_str() != "columns" && value.is_array())?
        .1
        .as_array()?;
    let header = columns.iter().map(cell).collect();
    let body = rows
        .iter()
        .map(|row| match row.as_array() {
            Some(items) => items.iter().map(cell).collect(),
            None => vec![cell(row)],
        })
        .collect();
    Some(table(header, body))
}

/// `{"data": [{"name": .., "value": ..}, ...]}` as returned by show queries.
fn data_table(object: &Map<String, Value>) -> Option<Vec<String>> {
    let data = object.get("data")?.as_array()?;
    let body = data
        .iter()
        .map(|item| {
            let item = item.as_object()?;
            Some(vec![cell(item.get("name")?), cell(item.get("value")?)])
        })
        .collect::<Option<Vec<_>>>()?;
    Some(table(vec!["name".into(), "value".into()], body))
}

fn series_or_counters(
    object: &Map<String, Value>,
    precision: Option<TimePrecision>,
) -> Option<Vec<String>> {
    if object.is_empty() {
        return None;
    }
    let mut lines = Vec::new();
    for (key, value) in object {
        match value {
            Value::Number(number) => lines.push(format!("{key}: {number}")),
            Value::Array(points) => {
                lines.push(format!("{key}:"));
                for point in points {
                    let pair = point.as_array().filter(|pair| pair.len() == 2)?;
                    let ts = pair[0].as_i64()?;
                    let when = precision
                        .and_then(|p| p.format_timestamp(ts))
                        .unwrap_or_else(|| ts.to_string());
                    lines.push(format!("  {when}  {}", cell(&pair[1])));
                }
            }
            _ => return None,
        }
    }
    Some(lines)
}

fn cell(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn table(header: Vec<String>, body: Vec<Vec<String>>) -> Vec<String> {
    let columns = body
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(header.len()))
        .max()
        .unwrap_or(0);
    let mut widths = vec![0; columns];
    for row in std::iter::once(&header).chain(&body) {
        for (idx, text) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(display_width(text));
        }
    }
    let render = |row: &[String]| {
        let mut line = String::new();
        for (idx, width) in widths.iter().enumerate() {
            let text = row.get(idx).map(String::as_str).unwrap_or("");
            if idx > 0 {
                line.push_str("  ");
            }
            line.push_str(text);
            line.push_str(&" ".repeat(width.saturating_sub(display_width(text))));
        }
        line.trim_end().to_string()
    };
    let separator: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let mut lines = vec![render(&header), render(&separator)];
    lines.extend(body.iter().map(|row| render(row)));
    lines
}

fn pretty(value: &Value) -> Vec<String> {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|_| value.to_string())
        .lines()
        .map(str::to_string)
        .collect()
}
