// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde_json::{Map, Value};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;

const TIMESTAMP_KEYS: [&str; 3] = ["ts", "time", "timestamp"];
const LEVEL_KEYS: [&str; 3] = ["level", "lvl", "severity"];
const MESSAGE_KEYS: [&str; 2] = ["msg", "message"];

/// Core columns pulled out of one input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CoreFields {
    pub timestamp: Option<String>,
    pub level: Option<String>,
    pub message: Option<String>,
}

pub(crate) fn core_fields(line: &str) -> CoreFields {
    let Ok(Value::Object(object)) = serde_json::from_str::<Value>(line) else {
        return CoreFields {
            timestamp: None,
            level: None,
            message: Some(line.to_owned()),
        };
    };
    CoreFields {
        timestamp: first_of(&object, &TIMESTAMP_KEYS).and_then(timestamp_text),
        level: first_of(&object, &LEVEL_KEYS).and_then(scalar_text),
        message: first_of(&object, &MESSAGE_KEYS).and_then(scalar_text),
    }
}

fn first_of<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| object.get(*key))
}

/// Stores timestamps as fixed-width UTC text so that text order matches
/// time order. Strings that do not parse are kept verbatim.
pub(crate) fn timestamp_text(value: &Value) -> Option<String> {
    let parsed = match value {
        Value::String(text) => match OffsetDateTime::parse(text, &Rfc3339) {
            Ok(parsed) => parsed,
            Err(_) => return Some(text.clone()),
        },
        Value::Number(number) => {
            let seconds = number.as_f64()?;
            let whole = seconds.floor();
            let nanos = whole as i128 * 1_000_000_000 + ((seconds - whole) * 1e9).round() as i128;
            OffsetDateTime::from_unix_timestamp_nanos(nanos).ok()?
        }
        _ => return None,
    };
    normalize_timestamp(parsed)
}

pub(crate) fn normalize_timestamp(value: OffsetDateTime) -> Option<String> {
    value
        .to_offset(time::UtcOffset::UTC)
        .format(format_description!(
            "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:6]Z"
        ))
        .ok()
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}
