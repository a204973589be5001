// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{FieldKind, FieldValue};
use anyhow::{Context, Result};
use time::format_description::OwnedFormatItem;

/// Turns a field value into grid text according to a column's format hint.
/// Only timestamp columns interpret the hint; it is a `time` format
/// description such as `[hour]:[minute]:[second]`.
#[derive(Debug, Clone)]
pub struct ValueFormatter {
    timestamp: Option<OwnedFormatItem>,
}

impl ValueFormatter {
    pub fn plain() -> Self {
        Self { timestamp: None }
    }

    pub fn for_column(kind: FieldKind, format: Option<&str>) -> Result<Self> {
        let timestamp = match (kind, format) {
            (FieldKind::Timestamp, Some(format)) if !format.trim().is_empty() => Some(
                time::format_description::parse_owned::<1>(format)
                    .with_context(|| format!("invalid timestamp format {format:?}"))?,
            ),
            _ => None,
        };
        Ok(Self { timestamp })
    }

    pub fn format(&self, value: &FieldValue) -> String {
        match (value, &self.timestamp) {
            (FieldValue::Timestamp(at), Some(items)) => {
                at.format(items).unwrap_or_else(|_| value.raw_text())
            }
            (FieldValue::Real(number), _) => format_real(*number),
            _ => value.raw_text(),
        }
    }
}

fn format_real(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

/// Cuts `text` to at most `width` characters, marking the cut with an
/// ellipsis.
pub fn truncate_to_width(text: &str, width: usize) -> String {
    let count = text.chars().count();
    if count <= width {
        return text.to_owned();
    }
    if width == 0 {
        return String::new();
    }
    let mut out = text.chars().take(width - 1).collect::<String>();
    out.push('…');
    out
}
