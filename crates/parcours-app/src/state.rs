// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{
    ColumnConfig, DETAIL_HEADER_ROWS, DetailView, FilterEditor, FilterNode, Input, Layout, Page,
    PageRequest, Pager, RawRecord, RecordId, Screen, Sort, ViewInfo,
};
use anyhow::Result;

/// Rows reserved at the bottom of the screen for the footer.
pub const FOOTER_ROWS: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutPurpose {
    Columns,
    Filter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOperation {
    Page(PageRequest),
    Record,
    View,
    Columns,
    Layout,
}

impl StoreOperation {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Page(_) => "page fetch",
            Self::Record => "record fetch",
            Self::View => "filter",
            Self::Columns => "column reload",
            Self::Layout => "layout load",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppMsg {
    Resize { width: u16, height: u16 },
    Input(Input),
    OpenFilterOnCell,
    OpenFilterEditor,
    ApplyFilter,
    ShowDetail,
    Back,
    ReloadColumns,
    ReloadFilter,
    Quit,
    LayoutLoaded { layout: Layout, purpose: LayoutPurpose },
    ColumnsLoaded(ViewInfo),
    ViewApplied(ViewInfo),
    PageLoaded(Page),
    RecordLoaded { id: RecordId, record: RawRecord },
    StoreFailed { operation: StoreOperation, message: String },
}

impl AppMsg {
    /// Messages that come straight from a key press, as opposed to results
    /// arriving from the store or the runtime.
    pub const fn is_key_action(&self) -> bool {
        matches!(
            self,
            Self::Input(_)
                | Self::OpenFilterOnCell
                | Self::OpenFilterEditor
                | Self::ApplyFilter
                | Self::ShowDetail
                | Self::Back
                | Self::ReloadColumns
                | Self::ReloadFilter
                | Self::Quit
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    FetchPage(PageRequest),
    FetchRecord(RecordId),
    SetView {
        filter: Option<FilterNode>,
        sorts: Vec<Sort>,
    },
    SyncLayout(Layout),
    ReloadLayout(LayoutPurpose),
    Quit,
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub screen: Screen,
    pub status_line: Option<String>,
    source: String,
    layout: Layout,
    pager: Pager,
    detail: DetailView,
    editor: FilterEditor,
    /// Columns from a reloaded layout, waiting on the store to promote them.
    pending_columns: Option<Vec<ColumnConfig>>,
}

impl AppState {
    pub fn new(source: impl Into<String>, layout: Layout, view: ViewInfo) -> Result<Self> {
        let pager = Pager::new(&layout, view)?;
        let editor = FilterEditor::new(layout.filter.as_ref());
        Ok(Self {
            screen: Screen::Grid,
            status_line: None,
            source: source.into(),
            layout,
            pager,
            detail: DetailView::default(),
            editor,
            pending_columns: None,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn pager(&self) -> &Pager {
        &self.pager
    }

    pub fn detail(&self) -> &DetailView {
        &self.detail
    }

    pub fn editor(&self) -> &FilterEditor {
        &self.editor
    }

    pub fn footer_left(&self) -> &str {
        &self.source
    }

    /// One-based position of the cursor over the total row count.
    pub fn footer_right(&self) -> String {
        let current = self.pager.selected_row().map_or(0, |row| row + 1);
        format!("{current}/{}", self.pager.total())
    }

    pub fn update(&mut self, msg: AppMsg) -> Vec<Effect> {
        if msg.is_key_action() {
            self.status_line = None;
        }
        match msg {
            AppMsg::Resize { width, height } => {
                self.resize(usize::from(width), usize::from(height))
            }
            AppMsg::Input(input) => self.handle_input(input),
            AppMsg::OpenFilterOnCell => self.open_filter_on_cell(),
            AppMsg::OpenFilterEditor => {
                if self.screen == Screen::Grid {
                    self.screen = Screen::FilterEdit;
                }
                Vec::new()
            }
            AppMsg::ApplyFilter => self.apply_filter(),
            AppMsg::ShowDetail => self.show_detail(),
            AppMsg::Back => {
                self.screen = Screen::Grid;
                Vec::new()
            }
            AppMsg::ReloadColumns => vec![Effect::ReloadLayout(LayoutPurpose::Columns)],
            AppMsg::ReloadFilter => vec![Effect::ReloadLayout(LayoutPurpose::Filter)],
            AppMsg::Quit => vec![Effect::Quit],
            AppMsg::LayoutLoaded { layout, purpose } => self.layout_loaded(layout, purpose),
            AppMsg::ColumnsLoaded(view) => self.columns_loaded(view),
            AppMsg::ViewApplied(view) => {
                self.set_status(format!("{} matching records", view.total));
                self.pager
                    .reset(view.total)
                    .map(Effect::FetchPage)
                    .into_iter()
                    .collect()
            }
            AppMsg::PageLoaded(page) => {
                self.pager.apply_page(page);
                Vec::new()
            }
            AppMsg::RecordLoaded { id, record } => {
                let json_fields = self.layout.json_fields();
                if let Err(error) = self.detail.apply_record(id, record, &json_fields) {
                    let message = format!("{error:#}");
                    self.detail.fail(&message);
                    self.set_status(message);
                }
                Vec::new()
            }
            AppMsg::StoreFailed { operation, message } => {
                tracing::warn!(operation = operation.as_str(), %message, "store call failed");
                match operation {
                    StoreOperation::Page(request) => {
                        self.pager.fail_page(request);
                    }
                    StoreOperation::Record => self.detail.fail(&message),
                    StoreOperation::Columns => self.pending_columns = None,
                    StoreOperation::View | StoreOperation::Layout => {}
                }
                self.set_status(format!("{} failed: {message}", operation.as_str()));
                Vec::new()
            }
        }
    }

    fn resize(&mut self, width: usize, height: usize) -> Vec<Effect> {
        let panel_rows = height.saturating_sub(FOOTER_ROWS);
        self.detail
            .resize(panel_rows.saturating_sub(DETAIL_HEADER_ROWS));
        self.pager
            .resize(width, panel_rows)
            .map(Effect::FetchPage)
            .into_iter()
            .collect()
    }

    fn handle_input(&mut self, input: Input) -> Vec<Effect> {
        match self.screen {
            Screen::Grid => self
                .pager
                .handle_input(input)
                .map(Effect::FetchPage)
                .into_iter()
                .collect(),
            Screen::Detail => {
                self.detail.handle_input(input);
                Vec::new()
            }
            Screen::FilterEdit => {
                self.editor.handle_input(input);
                Vec::new()
            }
        }
    }

    fn open_filter_on_cell(&mut self) -> Vec<Effect> {
        if self.screen != Screen::Grid {
            return Vec::new();
        }
        match self.pager.selected_cell() {
            Some((field, value)) => {
                self.editor.open_on(&field, &value);
                self.screen = Screen::FilterEdit;
            }
            None => self.set_status("no cell selected".to_owned()),
        }
        Vec::new()
    }

    fn apply_filter(&mut self) -> Vec<Effect> {
        if self.screen != Screen::FilterEdit {
            return Vec::new();
        }
        self.screen = Screen::Grid;
        let filter = self.editor.apply();
        tracing::info!(
            filter = filter.as_ref().map(FilterNode::describe).as_deref().unwrap_or("none"),
            "applying filter"
        );
        vec![Effect::SetView {
            filter,
            sorts: self.layout.sorts.clone(),
        }]
    }

    fn show_detail(&mut self) -> Vec<Effect> {
        if self.screen != Screen::Grid {
            return Vec::new();
        }
        let Some(id) = self.pager.selected_record().map(|record| record.id) else {
            self.set_status("no record selected".to_owned());
            return Vec::new();
        };
        self.detail.request(id);
        self.screen = Screen::Detail;
        vec![Effect::FetchRecord(id)]
    }

    fn layout_loaded(&mut self, layout: Layout, purpose: LayoutPurpose) -> Vec<Effect> {
        match purpose {
            LayoutPurpose::Columns => {
                let mut candidate = self.layout.clone();
                candidate.columns = layout.columns.clone();
                self.pending_columns = Some(layout.columns);
                vec![Effect::SyncLayout(candidate)]
            }
            LayoutPurpose::Filter => {
                self.layout.filter = layout.filter;
                self.layout.sorts = layout.sorts;
                self.editor = FilterEditor::new(self.layout.filter.as_ref());
                vec![Effect::SetView {
                    filter: self.editor.apply(),
                    sorts: self.layout.sorts.clone(),
                }]
            }
        }
    }

    fn columns_loaded(&mut self, view: ViewInfo) -> Vec<Effect> {
        let mut candidate = self.layout.clone();
        if let Some(columns) = self.pending_columns.take() {
            candidate.columns = columns;
        }
        match self.pager.set_columns(&candidate, view) {
            Ok(request) => {
                self.layout = candidate;
                self.set_status("columns reloaded".to_owned());
                request.map(Effect::FetchPage).into_iter().collect()
            }
            Err(error) => {
                self.set_status(format!("column reload failed: {error:#}"));
                Vec::new()
            }
        }
    }

    fn set_status(&mut self, message: String) {
        self.status_line = Some(message);
    }
}

#[cfg(test)]
mod tests {
    use super::{AppMsg, AppState, Effect, LayoutPurpose, StoreOperation};
    use crate::{
        ColumnConfig, CompareOp, Field, FieldKind, FieldValue, FilterNode, Input, Layout, Page,
        PageRequest, Record, RecordId, Screen, Sort, ViewInfo,
    };
    use serde_json::json;

    fn view(total: usize) -> ViewInfo {
        ViewInfo {
            fields: vec![
                Field::new("id", FieldKind::Integer),
                Field::new("level", FieldKind::Text),
                Field::new("message", FieldKind::Text),
            ],
            total,
        }
    }

    fn layout() -> Layout {
        Layout {
            columns: vec![ColumnConfig::new("level", 6), ColumnConfig::new("message", 30)],
            filter: None,
            sorts: vec![Sort::descending("id")],
        }
    }

    fn page(request: PageRequest, total: usize) -> Page {
        let end = (request.offset + request.size).min(total);
        let records = (request.offset..end)
            .map(|index| Record {
                id: RecordId::new(index as i64 + 1),
                values: vec![
                    FieldValue::Integer(index as i64 + 1),
                    FieldValue::Text((if index % 2 == 0 { "info" } else { "error" }).to_owned()),
                    FieldValue::Text(format!("message {index}")),
                ],
            })
            .collect();
        Page { request, records }
    }

    fn fetched(effects: Vec<Effect>) -> PageRequest {
        match effects.as_slice() {
            [Effect::FetchPage(request)] => *request,
            other => panic!("expected one page fetch, got {other:?}"),
        }
    }

    fn started(total: usize) -> AppState {
        let mut state = AppState::new("app.log", layout(), view(total)).expect("state");
        let request = fetched(state.update(AppMsg::Resize {
            width: 80,
            height: 13,
        }));
        assert_eq!(request.size, 10);
        state.update(AppMsg::PageLoaded(page(request, total)));
        state
    }

    #[test]
    fn footer_shows_one_based_position() {
        let mut state = started(50);
        assert_eq!(state.footer_left(), "app.log");
        assert_eq!(state.footer_right(), "1/50");
        state.update(AppMsg::Input(Input::Down));
        assert_eq!(state.footer_right(), "2/50");
    }

    #[test]
    fn grid_boundary_requests_next_window() {
        let mut state = started(50);
        for _ in 0..9 {
            assert!(state.update(AppMsg::Input(Input::Down)).is_empty());
        }
        let request = fetched(state.update(AppMsg::Input(Input::Down)));
        assert_eq!(request.offset, 1);
    }

    #[test]
    fn filter_on_cell_then_apply_resets_the_window() {
        let mut state = started(50);
        state.update(AppMsg::Input(Input::PageDown));
        state.update(AppMsg::Input(Input::Down));

        assert!(state.update(AppMsg::OpenFilterOnCell).is_empty());
        assert_eq!(state.screen, Screen::FilterEdit);
        assert_eq!(state.editor().entries().len(), 1);

        let effects = state.update(AppMsg::ApplyFilter);
        assert_eq!(state.screen, Screen::Grid);
        assert_eq!(
            effects,
            vec![Effect::SetView {
                filter: Some(FilterNode::compare("level", CompareOp::Eq, "error")),
                sorts: vec![Sort::descending("id")],
            }]
        );

        let request = fetched(state.update(AppMsg::ViewApplied(view(25))));
        assert_eq!(request.offset, 0);
        assert_eq!(state.status_line.as_deref(), Some("25 matching records"));
        state.update(AppMsg::PageLoaded(page(request, 25)));
        assert_eq!(state.footer_right(), "1/25");
    }

    #[test]
    fn detail_fetches_the_selected_record() {
        let mut state = started(50);
        state.update(AppMsg::Input(Input::Down));
        let effects = state.update(AppMsg::ShowDetail);
        assert_eq!(effects, vec![Effect::FetchRecord(RecordId::new(2))]);
        assert_eq!(state.screen, Screen::Detail);

        let stale = json!({"msg": "old"}).as_object().cloned().expect("object");
        state.update(AppMsg::RecordLoaded {
            id: RecordId::new(1),
            record: stale,
        });
        assert!(state.detail().is_loading());

        let record = json!({"msg": "hello"}).as_object().cloned().expect("object");
        state.update(AppMsg::RecordLoaded {
            id: RecordId::new(2),
            record,
        });
        assert!(!state.detail().is_loading());
        assert!(state.detail().lines().iter().any(|line| line.contains("hello")));

        state.update(AppMsg::Back);
        assert_eq!(state.screen, Screen::Grid);
    }

    #[test]
    fn store_failure_sets_status_until_next_key() {
        let mut state = started(50);
        state.update(AppMsg::StoreFailed {
            operation: StoreOperation::View,
            message: "disk gone".to_owned(),
        });
        assert_eq!(
            state.status_line.as_deref(),
            Some("filter failed: disk gone")
        );
        assert_eq!(state.footer_right(), "1/50");

        state.update(AppMsg::Input(Input::Right));
        assert_eq!(state.status_line, None);
    }

    #[test]
    fn failed_page_fetch_keeps_the_place_on_screen() {
        let mut state = started(100);
        for _ in 0..9 {
            state.update(AppMsg::Input(Input::Down));
        }
        let request = fetched(state.update(AppMsg::Input(Input::Down)));
        assert_eq!(request.offset, 1);

        state.update(AppMsg::StoreFailed {
            operation: StoreOperation::Page(request),
            message: "disk gone".to_owned(),
        });
        assert_eq!(
            state.status_line.as_deref(),
            Some("page fetch failed: disk gone")
        );
        assert_eq!(state.footer_right(), "10/100");
        assert_eq!(state.pager().pending(), None);
        assert_eq!(
            state.pager().selected_record().map(|record| record.id),
            Some(RecordId::new(10))
        );

        let retry = fetched(state.update(AppMsg::Input(Input::Down)));
        assert_eq!(retry.offset, 1);
        state.update(AppMsg::PageLoaded(page(retry, 100)));
        assert_eq!(state.footer_right(), "11/100");
        assert_eq!(
            state.pager().selected_record().map(|record| record.id),
            Some(RecordId::new(11))
        );
    }

    #[test]
    fn column_reload_round_trip() {
        let mut state = started(50);
        assert_eq!(
            state.update(AppMsg::ReloadColumns),
            vec![Effect::ReloadLayout(LayoutPurpose::Columns)]
        );

        let mut reloaded = layout();
        reloaded.columns = vec![ColumnConfig::new("message", 40)];
        let effects = state.update(AppMsg::LayoutLoaded {
            layout: reloaded,
            purpose: LayoutPurpose::Columns,
        });
        let Some(Effect::SyncLayout(synced)) = effects.first() else {
            panic!("expected layout sync, got {effects:?}");
        };
        assert_eq!(synced.columns.len(), 1);

        let request = fetched(state.update(AppMsg::ColumnsLoaded(view(50))));
        assert_eq!(request.offset, 0);
        state.update(AppMsg::PageLoaded(page(request, 50)));
        assert_eq!(state.pager().column_specs().len(), 1);
        assert_eq!(state.layout().columns.len(), 1);
    }

    #[test]
    fn bad_column_reload_keeps_current_columns() {
        let mut state = started(50);
        let mut reloaded = layout();
        reloaded.columns = vec![ColumnConfig::new("service", 10)];
        state.update(AppMsg::LayoutLoaded {
            layout: reloaded,
            purpose: LayoutPurpose::Columns,
        });
        assert!(state.update(AppMsg::ColumnsLoaded(view(50))).is_empty());
        assert!(
            state
                .status_line
                .as_deref()
                .is_some_and(|status| status.contains("column reload failed"))
        );
        assert_eq!(state.pager().column_specs().len(), 2);
        assert_eq!(state.layout().columns, layout().columns);
    }

    #[test]
    fn failed_column_sync_keeps_current_layout() {
        let mut state = started(50);
        let mut reloaded = layout();
        reloaded.columns = vec![ColumnConfig {
            json: true,
            ..ColumnConfig::new("message", 40)
        }];
        state.update(AppMsg::LayoutLoaded {
            layout: reloaded,
            purpose: LayoutPurpose::Columns,
        });
        assert_eq!(state.layout().columns, layout().columns);

        state.update(AppMsg::StoreFailed {
            operation: StoreOperation::Columns,
            message: "locked".to_owned(),
        });
        assert_eq!(state.layout().columns, layout().columns);
        assert!(state.layout().json_fields().is_empty());

        state.update(AppMsg::ColumnsLoaded(view(50)));
        assert_eq!(state.layout().columns, layout().columns);
        assert_eq!(state.pager().column_specs().len(), 2);
    }

    #[test]
    fn filter_reload_reseeds_editor_and_sets_view() {
        let mut state = started(50);
        let mut reloaded = layout();
        reloaded.filter = Some(FilterNode::compare("level", CompareOp::Ne, "debug"));
        let effects = state.update(AppMsg::LayoutLoaded {
            layout: reloaded.clone(),
            purpose: LayoutPurpose::Filter,
        });
        assert_eq!(
            effects,
            vec![Effect::SetView {
                filter: reloaded.filter.clone(),
                sorts: reloaded.sorts.clone(),
            }]
        );
        assert_eq!(state.editor().entries().len(), 1);
    }

    #[test]
    fn filter_editor_inputs_stay_in_the_editor() {
        let mut state = started(50);
        state.update(AppMsg::OpenFilterEditor);
        assert_eq!(state.screen, Screen::FilterEdit);
        assert!(state.update(AppMsg::Input(Input::PageDown)).is_empty());
        assert_eq!(state.pager().offset(), 0);
        assert_eq!(
            state.update(AppMsg::ApplyFilter),
            vec![Effect::SetView {
                filter: None,
                sorts: vec![Sort::descending("id")],
            }]
        );
    }

    #[test]
    fn quit_is_an_effect() {
        let mut state = started(5);
        assert_eq!(state.update(AppMsg::Quit), vec![Effect::Quit]);
    }
}
