//! Conversion of source values into typed node properties.
//!
//! Source values come from front matter and are represented as
//! [`serde_json::Value`]. [`convert`] is total: any value that cannot be
//! represented as the requested [`TargetType`] yields `None`, and the caller
//! omits the property instead of failing the record.

use crate::mapping::TargetType;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A converted node property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    /// Normalized `YYYY-MM-DD`.
    Date(String),
    /// Normalized UTC `YYYY-MM-DDTHH:MM:SS.mmmZ`.
    DateTime(String),
    String(String),
    StringList(Vec<String>),
}

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Convert `value` into `target`, or `None` when the combination is not
/// supported.
pub fn convert(value: &Value, target: TargetType) -> Option<PropertyValue> {
    match target {
        TargetType::Boolean => to_bool(value).map(PropertyValue::Boolean),
        TargetType::Integer => to_integer(value).map(PropertyValue::Integer),
        TargetType::Float => to_float(value).map(PropertyValue::Float),
        TargetType::Date => {
            to_timestamp(value).map(|ts| PropertyValue::Date(ts.format("%Y-%m-%d").to_string()))
        }
        TargetType::Datetime => to_timestamp(value)
            .map(|ts| PropertyValue::DateTime(ts.to_rfc3339_opts(SecondsFormat::Millis, true))),
        TargetType::String => to_display_string(value).map(PropertyValue::String),
        TargetType::ListString => to_string_list(value).map(PropertyValue::StringList),
    }
}

fn to_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn to_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(i),
            None => n.as_f64().and_then(floor_to_i64),
        },
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| parse_finite(s).and_then(floor_to_i64))
        }
        _ => None,
    }
}

fn floor_to_i64(f: f64) -> Option<i64> {
    let floored = f.floor();
    // i64::MAX as f64 rounds up to 2^63, which is already out of range
    if floored.is_finite() && floored >= i64::MIN as f64 && floored < i64::MAX as f64 {
        Some(floored as i64)
    } else {
        None
    }
}

fn to_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => parse_finite(s.trim()),
        _ => None,
    }
}

fn parse_finite(s: &str) -> Option<f64> {
    if s.is_empty() {
        return None;
    }
    s.parse::<f64>().ok().filter(|f| f.is_finite())
}

fn to_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_timestamp(s.trim()),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => None,
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}

fn to_display_string(value: &Value) -> Option<String> {
    match value {
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(scalar_to_string)
                .collect::<Vec<_>>()
                .join(", "),
        ),
        Value::Object(_) | Value::Null => None,
        scalar => scalar_to_string(scalar),
    }
}

fn to_string_list(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Array(items) => Some(items.iter().filter_map(scalar_to_string).collect()),
        Value::Object(_) | Value::Null => None,
        scalar => scalar_to_string(scalar).map(|s| vec![s]),
    }
}
