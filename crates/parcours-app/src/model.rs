// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::FilterNode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordId(i64);

impl RecordId {
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// Abstract input event. The grid consumes the navigation variants; all
/// others are routed to the focused cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Up,
    Down,
    Left,
    Right,
    Top,
    Bottom,
    PageUp,
    PageDown,
    Char(char),
    Backspace,
    Delete,
    Home,
    End,
}

impl Input {
    pub const fn is_navigation(self) -> bool {
        matches!(
            self,
            Self::Up
                | Self::Down
                | Self::Left
                | Self::Right
                | Self::Top
                | Self::Bottom
                | Self::PageUp
                | Self::PageDown
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Integer,
    Real,
    Text,
    Timestamp,
    Other,
}

impl FieldKind {
    /// Maps a declared SQL column type onto a field kind, using the same
    /// substring rules SQLite applies for column affinity.
    pub fn from_declared_type(declared: &str) -> Self {
        let upper = declared.trim().to_ascii_uppercase();
        if upper.contains("TIMESTAMP") || upper.contains("DATETIME") {
            Self::Timestamp
        } else if upper.contains("INT") {
            Self::Integer
        } else if upper.contains("CHAR") || upper.contains("CLOB") || upper.contains("TEXT") {
            Self::Text
        } else if upper.contains("REAL") || upper.contains("FLOA") || upper.contains("DOUB") {
            Self::Real
        } else {
            Self::Other
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Real => "real",
            Self::Text => "text",
            Self::Timestamp => "timestamp",
            Self::Other => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub kind: FieldKind,
}

impl Field {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Timestamp(OffsetDateTime),
}

impl FieldValue {
    /// Unformatted text form. Used as the literal when a filter is opened on
    /// a cell, so it has to round-trip through the store.
    pub fn raw_text(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Integer(value) => value.to_string(),
            Self::Real(value) => value.to_string(),
            Self::Text(value) => value.clone(),
            Self::Timestamp(value) => value
                .format(&Rfc3339)
                .unwrap_or_else(|_| value.unix_timestamp().to_string()),
        }
    }

    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: RecordId,
    pub values: Vec<FieldValue>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub field: String,
    #[serde(default)]
    pub descending: bool,
}

impl Sort {
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Grid,
    Detail,
    FilterEdit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnConfig {
    pub field: String,
    pub width: usize,
    pub format: Option<String>,
    /// Promoted but not shown in the grid.
    pub hidden: bool,
    /// Left in the raw record: never promoted, never shown.
    pub demote: bool,
    /// Value holds a JSON-encoded string that the detail view expands.
    pub json: bool,
}

impl ColumnConfig {
    pub fn new(field: impl Into<String>, width: usize) -> Self {
        Self {
            field: field.into(),
            width,
            format: None,
            hidden: false,
            demote: false,
            json: false,
        }
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub const fn is_displayed(&self) -> bool {
        !self.hidden && !self.demote
    }
}

pub const DEFAULT_TIMESTAMP_FORMAT: &str = "[hour]:[minute]:[second].[subsecond digits:3]";

#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub columns: Vec<ColumnConfig>,
    pub filter: Option<FilterNode>,
    pub sorts: Vec<Sort>,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            columns: vec![
                ColumnConfig::new("timestamp", 12).with_format(DEFAULT_TIMESTAMP_FORMAT),
                ColumnConfig::new("level", 7),
                ColumnConfig::new("message", 80),
            ],
            filter: None,
            sorts: Vec::new(),
        }
    }
}

impl Layout {
    /// Columns that should exist in the store but do not yet.
    pub fn fields_to_promote(&self, fields: &[Field]) -> Vec<String> {
        let known = fields
            .iter()
            .map(|field| field.name.as_str())
            .collect::<BTreeSet<_>>();
        let mut seen = BTreeSet::new();
        self.columns
            .iter()
            .filter(|column| !column.demote)
            .filter(|column| !known.contains(column.field.as_str()))
            .filter(|column| seen.insert(column.field.as_str()))
            .map(|column| column.field.clone())
            .collect()
    }

    pub fn displayed_columns(&self) -> impl Iterator<Item = &ColumnConfig> {
        self.columns.iter().filter(|column| column.is_displayed())
    }

    pub fn json_fields(&self) -> BTreeSet<String> {
        self.columns
            .iter()
            .filter(|column| column.json)
            .map(|column| column.field.clone())
            .collect()
    }
}
