// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use parcours_app::{
    ColumnConfig, CompareOp, FieldKind, FilterNode, Layout, LogicOp, Sort, ValueFormatter,
};
use serde::Deserialize;
use std::fs;
use std::path::Path;

const DEFAULT_COLUMN_WIDTH: usize = 20;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct LayoutFile {
    #[serde(default)]
    columns: Vec<ColumnEntry>,
    filter: Option<FilterEntry>,
    #[serde(default)]
    sort: Vec<Sort>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct ColumnEntry {
    field: String,
    width: Option<usize>,
    format: Option<String>,
    #[serde(default)]
    hidden: bool,
    #[serde(default)]
    demote: bool,
    #[serde(default)]
    json: bool,
}

/// One node of `[filter]`. Logic nodes carry `children`; comparisons carry
/// `field` and `value`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct FilterEntry {
    op: String,
    field: Option<String>,
    value: Option<toml::Value>,
    #[serde(default = "enabled_by_default")]
    enabled: bool,
    #[serde(default)]
    children: Vec<FilterEntry>,
}

fn enabled_by_default() -> bool {
    true
}

/// Reads a layout file. A missing file yields the built-in layout.
pub fn load_layout(path: &Path) -> Result<Layout> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no layout file; using default layout");
        return Ok(Layout::default());
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read layout file {}", path.display()))?;
    parse_layout(&raw).with_context(|| format!("load layout {}", path.display()))
}

pub fn parse_layout(raw: &str) -> Result<Layout> {
    let file: LayoutFile = toml::from_str(raw).context("parse TOML layout")?;
    if file.columns.is_empty() {
        bail!(
            "layout defines no [[columns]]; add at least one column or remove the file to use the default layout"
        );
    }

    let columns = file
        .columns
        .into_iter()
        .map(column_config)
        .collect::<Result<Vec<_>>>()?;
    let filter = file
        .filter
        .map(|entry| filter_node(entry, "filter"))
        .transpose()?;
    if let Some(filter) = &filter {
        filter.validate().context("invalid [filter]")?;
    }

    Ok(Layout {
        columns,
        filter,
        sorts: file.sort,
    })
}

fn column_config(entry: ColumnEntry) -> Result<ColumnConfig> {
    if entry.field.trim().is_empty() {
        bail!("a [[columns]] entry has an empty field name");
    }
    let width = entry.width.unwrap_or(DEFAULT_COLUMN_WIDTH);
    if width == 0 {
        bail!("column {} has width 0; use a positive width", entry.field);
    }
    if let Some(format) = &entry.format {
        ValueFormatter::for_column(FieldKind::Timestamp, Some(format.as_str()))
            .with_context(|| format!("column {} has an unusable format", entry.field))?;
    }
    Ok(ColumnConfig {
        field: entry.field,
        width,
        format: entry.format,
        hidden: entry.hidden,
        demote: entry.demote,
        json: entry.json,
    })
}

fn filter_node(entry: FilterEntry, location: &str) -> Result<FilterNode> {
    if let Some(logic) = LogicOp::parse(&entry.op) {
        if entry.field.is_some() || entry.value.is_some() {
            bail!("{location}: {} takes children, not field/value", logic.as_str());
        }
        let children = entry
            .children
            .into_iter()
            .enumerate()
            .map(|(index, child)| filter_node(child, &format!("{location}.children[{index}]")))
            .collect::<Result<Vec<_>>>()?;
        return Ok(FilterNode::logic(logic, children).with_enabled(entry.enabled));
    }

    let op = CompareOp::parse(&entry.op).ok_or_else(|| {
        let known = CompareOp::ALL
            .iter()
            .map(|op| op.symbol())
            .collect::<Vec<_>>()
            .join(", ");
        anyhow!(
            "{location}: unknown operator {:?}; use and, or, not, or one of {known}",
            entry.op
        )
    })?;
    if !entry.children.is_empty() {
        bail!("{location}: comparison {} cannot have children", op.symbol());
    }
    let field = entry
        .field
        .ok_or_else(|| anyhow!("{location}: comparison needs a field"))?;
    let value = entry
        .value
        .ok_or_else(|| anyhow!("{location}: comparison on {field} needs a value"))?;
    Ok(FilterNode::compare(field, op, literal_text(&value)?).with_enabled(entry.enabled))
}

fn literal_text(value: &toml::Value) -> Result<String> {
    let text = match value {
        toml::Value::String(text) => text.clone(),
        toml::Value::Integer(number) => number.to_string(),
        toml::Value::Float(number) => number.to_string(),
        toml::Value::Boolean(flag) => flag.to_string(),
        toml::Value::Datetime(datetime) => datetime.to_string(),
        toml::Value::Array(_) | toml::Value::Table(_) => {
            bail!("filter values must be strings, numbers, booleans or datetimes")
        }
    };
    Ok(text)
}

pub fn example_layout() -> &'static str {
    r#"# parcours layout
# Columns are shown left to right. Fields that are not core columns
# (timestamp, level, message) are pulled out of each JSON line on load.

[[columns]]
field = "timestamp"
width = 12
format = "[hour]:[minute]:[second].[subsecond digits:3]"

[[columns]]
field = "level"
width = 7

[[columns]]
field = "service"
width = 10

[[columns]]
field = "status"
width = 6

[[columns]]
field = "message"
width = 60

# Shown in the detail view with its JSON string expanded.
[[columns]]
field = "context"
width = 30
hidden = true
json = true

# Default filter, applied on start and on `f`. Each entry of a top-level
# "and" becomes one row of the filter editor.
[filter]
op = "and"

[[filter.children]]
op = "!="
field = "level"
value = "debug"

# Disabled entries start switched off in the filter editor.
[[filter.children]]
op = "not"
enabled = false

[[filter.children.children]]
op = "contains"
field = "route"
value = "/healthz"

[[sort]]
field = "timestamp"
descending = false
"#
}
