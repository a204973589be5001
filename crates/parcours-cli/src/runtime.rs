// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::layout::load_layout;
use anyhow::{Context, Result};
use parcours_app::{DataStore, FilterEditor, Layout, ViewInfo, sync_layout};
use std::path::PathBuf;

/// Reloads the layout from the file it was first read from.
pub struct LayoutRuntime {
    layout_path: PathBuf,
}

impl LayoutRuntime {
    pub fn new(layout_path: PathBuf) -> Self {
        Self { layout_path }
    }
}

impl parcours_tui::AppRuntime for LayoutRuntime {
    fn load_layout(&mut self) -> Result<Layout> {
        load_layout(&self.layout_path)
    }
}

/// Brings a freshly loaded store in line with the layout: promotes its
/// columns, then applies its default filter and sorts.
pub fn prepare_store<S: DataStore + ?Sized>(store: &mut S, layout: &Layout) -> Result<ViewInfo> {
    sync_layout(store, layout).context("promote layout columns")?;
    let filter = FilterEditor::new(layout.filter.as_ref()).apply();
    store
        .set_view(filter.as_ref(), &layout.sorts)
        .context("apply layout filter; fix [filter] or [[sort]] in the layout file")?;
    store.get_view()
}
