// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{Field, FilterNode, Layout, RawRecord, Record, RecordId, Sort};
use anyhow::{Context, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewInfo {
    pub fields: Vec<Field>,
    /// Rows matching the current predicate.
    pub total: usize,
}

/// Queryable record store behind the grid. Every call may fail; failures
/// are reported, never retried.
pub trait DataStore {
    fn name(&self) -> &str;
    fn get_view(&mut self) -> Result<ViewInfo>;
    fn get_page(&mut self, offset: usize, size: usize) -> Result<Vec<Record>>;
    fn get_record(&mut self, id: RecordId) -> Result<RawRecord>;
    fn set_view(&mut self, filter: Option<&FilterNode>, sorts: &[Sort]) -> Result<()>;
    fn promote_field(&mut self, name: &str) -> Result<()>;
}

/// Promotes every layout column missing from the store, then reads the view.
pub fn sync_layout<S: DataStore + ?Sized>(store: &mut S, layout: &Layout) -> Result<ViewInfo> {
    let view = store.get_view().context("read view before promotion")?;
    let missing = layout.fields_to_promote(&view.fields);
    if missing.is_empty() {
        return Ok(view);
    }
    for field in &missing {
        tracing::info!(field = %field, "promoting layout field");
        store
            .promote_field(field)
            .with_context(|| format!("promote field {field}"))?;
    }
    store.get_view().context("read view after promotion")
}
