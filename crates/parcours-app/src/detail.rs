// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{Input, RecordId};
use anyhow::{Context, Result, bail};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Rows above the record text: the title line.
pub const DETAIL_HEADER_ROWS: usize = 1;

/// A record as the store keeps it before promotion: the decoded JSON object.
pub type RawRecord = Map<String, Value>;

/// Replaces every string value of a `json` field with the JSON it encodes.
pub fn expand_json_fields(
    mut record: RawRecord,
    json_fields: &BTreeSet<String>,
) -> Result<RawRecord> {
    for field in json_fields {
        let Some(value) = record.get_mut(field) else {
            continue;
        };
        let decoded = match value {
            Value::String(encoded) => serde_json::from_str::<Value>(encoded)
                .with_context(|| format!("field {field} does not hold valid JSON"))?,
            Value::Null => continue,
            _ => bail!("field {field} is marked json but is not a string"),
        };
        *value = decoded;
    }
    Ok(record)
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DetailView {
    record_id: Option<RecordId>,
    lines: Vec<String>,
    scroll: usize,
    height: usize,
    loading: bool,
}

impl DetailView {
    pub fn request(&mut self, id: RecordId) {
        self.record_id = Some(id);
        self.lines.clear();
        self.scroll = 0;
        self.loading = true;
    }

    /// Returns false when the record is not the one most recently requested.
    pub fn apply_record(
        &mut self,
        id: RecordId,
        record: RawRecord,
        json_fields: &BTreeSet<String>,
    ) -> Result<bool> {
        if self.record_id != Some(id) {
            return Ok(false);
        }
        self.loading = false;
        let expanded = expand_json_fields(record, json_fields)?;
        let pretty = serde_json::to_string_pretty(&Value::Object(expanded))
            .context("render record as JSON")?;
        self.lines = pretty.lines().map(str::to_owned).collect();
        self.scroll = 0;
        Ok(true)
    }

    pub fn fail(&mut self, message: &str) {
        self.loading = false;
        self.lines = vec![format!("error: {message}")];
        self.scroll = 0;
    }

    pub fn resize(&mut self, height: usize) {
        self.height = height;
        self.scroll = self.scroll.min(self.max_scroll());
    }

    pub fn handle_input(&mut self, input: Input) {
        let page = self.height.max(1);
        self.scroll = match input {
            Input::Up => self.scroll.saturating_sub(1),
            Input::Down => self.scroll + 1,
            Input::PageUp => self.scroll.saturating_sub(page),
            Input::PageDown => self.scroll + page,
            Input::Top | Input::Home => 0,
            Input::Bottom | Input::End => self.max_scroll(),
            _ => self.scroll,
        }
        .min(self.max_scroll());
    }

    pub fn record_id(&self) -> Option<RecordId> {
        self.record_id
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn visible_lines(&self) -> &[String] {
        let end = (self.scroll + self.height.max(1)).min(self.lines.len());
        &self.lines[self.scroll.min(end)..end]
    }

    fn max_scroll(&self) -> usize {
        self.lines.len().saturating_sub(self.height.max(1))
    }
}
