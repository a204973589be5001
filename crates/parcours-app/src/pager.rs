// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Windowed view over a store that holds more rows than fit on screen.
//!
//! The pager keeps one page of records as a [`Board`]. When the cursor runs
//! off the page the board raises a [`Boundary`], the pager moves its offset
//! and hands back a [`PageRequest`] for the caller to fetch. Results that do
//! not answer the latest request are dropped.

use crate::{
    Board, BoardEvent, Boundary, CellValue, ColumnSpec, Cursor, Field, FieldValue, Input, Layout,
    Record, Row, ValueFormatter, ViewInfo,
};
use anyhow::{Result, bail};

/// Rows taken by the column header and its rule.
pub const HEADER_ROWS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub offset: usize,
    pub size: usize,
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub request: PageRequest,
    pub records: Vec<Record>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    /// Rows swapped into the existing board.
    Applied,
    /// Board built from scratch.
    Rebuilt,
    /// Page had no rows; the grid is empty.
    Empty,
    /// Response did not match the outstanding request.
    Stale,
}

#[derive(Debug, Clone)]
struct DisplayColumn {
    field_index: usize,
    spec: ColumnSpec,
    formatter: ValueFormatter,
}

#[derive(Debug, Clone)]
pub struct Pager {
    offset: usize,
    /// Offset of the rows on screen; `offset` runs ahead of it while a fetch
    /// is outstanding.
    applied_offset: usize,
    total: usize,
    display_rows: usize,
    width: usize,
    records: Vec<Record>,
    board: Option<Board>,
    columns: Vec<DisplayColumn>,
    fields: Vec<Field>,
    scrolling_down: bool,
    generation: u64,
    pending: Option<PageRequest>,
}

impl Pager {
    pub fn new(layout: &Layout, view: ViewInfo) -> Result<Self> {
        let columns = resolve_columns(layout, &view.fields)?;
        Ok(Self {
            offset: 0,
            applied_offset: 0,
            total: view.total,
            display_rows: 0,
            width: usize::MAX,
            records: Vec::new(),
            board: None,
            columns,
            fields: view.fields,
            scrolling_down: false,
            generation: 0,
            pending: None,
        })
    }

    pub fn page_size(&self) -> usize {
        self.display_rows.saturating_sub(HEADER_ROWS)
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn board(&self) -> Option<&Board> {
        self.board.as_ref()
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn column_specs(&self) -> Vec<ColumnSpec> {
        self.columns.iter().map(|column| column.spec.clone()).collect()
    }

    pub fn pending(&self) -> Option<PageRequest> {
        self.pending
    }

    /// Absolute index of the row under the cursor.
    pub fn selected_row(&self) -> Option<usize> {
        self.board
            .as_ref()
            .map(|board| self.offset + board.cursor().row)
    }

    pub fn selected_record(&self) -> Option<&Record> {
        let board = self.board.as_ref()?;
        self.records.get(board.cursor().row)
    }

    /// Field name and raw value of the cell under the cursor.
    pub fn selected_cell(&self) -> Option<(String, String)> {
        let board = self.board.as_ref()?;
        let column = self.columns.get(board.cursor().col)?;
        let field = self.fields.get(column.field_index)?;
        Some((field.name.clone(), board.current_cell().current_value()))
    }

    pub fn resize(&mut self, width: usize, display_rows: usize) -> Option<PageRequest> {
        self.width = width;
        self.display_rows = display_rows;
        self.board = self.board.take().map(|board| board.with_width(width));
        let size = self.page_size();
        if size == 0 {
            return None;
        }
        self.clamp_full_page(size);
        self.request()
    }

    pub fn handle_input(&mut self, input: Input) -> Option<PageRequest> {
        let board = self.board.take()?;
        let (board, event) = board.handle_input(input);
        self.board = Some(board);
        match event {
            Some(BoardEvent::Boundary(boundary)) => self.on_boundary(boundary),
            _ => None,
        }
    }

    pub fn on_boundary(&mut self, boundary: Boundary) -> Option<PageRequest> {
        let size = self.page_size();
        if size == 0 {
            return None;
        }
        self.scrolling_down = false;
        match boundary {
            Boundary::Down => {
                if self.offset + size < self.total {
                    self.offset += 1;
                    self.scrolling_down = true;
                    self.clamp_full_page(size);
                    return self.request();
                }
            }
            Boundary::Up => {
                if self.offset > 0 {
                    self.offset -= 1;
                    return self.request();
                }
            }
            Boundary::PageDown => {
                if self.offset + size < self.total {
                    self.offset += size;
                    self.scrolling_down = true;
                    self.clamp_full_page(size);
                    return self.request();
                }
                self.board = self.board.take().map(|board| board.jump_last_row());
            }
            Boundary::PageUp => {
                if self.offset > 0 {
                    self.offset = self.offset.saturating_sub(size);
                    return self.request();
                }
                self.board = self.board.take().map(|board| board.jump_first_row());
            }
            Boundary::Top => {
                if self.offset != 0 {
                    self.offset = 0;
                    return self.request();
                }
            }
            Boundary::Bottom => {
                let last = self.total.saturating_sub(size);
                if last != self.offset {
                    self.offset = last;
                    self.scrolling_down = true;
                    return self.request();
                }
            }
        }
        None
    }

    pub fn apply_page(&mut self, page: Page) -> PageOutcome {
        if self.pending != Some(page.request) {
            tracing::debug!(
                offset = page.request.offset,
                generation = page.request.generation,
                "discarding stale page"
            );
            return PageOutcome::Stale;
        }
        self.pending = None;
        self.applied_offset = page.request.offset;
        self.records = page.records;
        let rows = self.rows_for_records();
        if rows.is_empty() {
            self.board = None;
            return PageOutcome::Empty;
        }
        if let Some(board) = &self.board {
            match board.replace(rows.clone()) {
                Ok(board) => {
                    self.board = Some(board);
                    return PageOutcome::Applied;
                }
                Err(error) => tracing::debug!(%error, "rebuilding board"),
            }
        }
        self.rebuild(rows)
    }

    /// Gives up on a request the store could not serve. When it is the
    /// outstanding one the window goes back to the rows still on screen, so
    /// the next move starts from there. Returns whether it was outstanding.
    pub fn fail_page(&mut self, request: PageRequest) -> bool {
        if self.pending != Some(request) {
            tracing::debug!(
                offset = request.offset,
                generation = request.generation,
                "ignoring failure of a superseded page"
            );
            return false;
        }
        self.pending = None;
        self.offset = self.applied_offset;
        self.scrolling_down = false;
        true
    }

    /// Switches to new columns or fields. Cached rows are dropped and the
    /// current offset is fetched again under a new generation.
    pub fn set_columns(
        &mut self,
        layout: &Layout,
        view: ViewInfo,
    ) -> Result<Option<PageRequest>> {
        let columns = resolve_columns(layout, &view.fields)?;
        self.columns = columns;
        self.fields = view.fields;
        self.total = view.total;
        self.records.clear();
        self.board = None;
        self.scrolling_down = false;
        self.generation += 1;
        let size = self.page_size();
        if size == 0 {
            return Ok(None);
        }
        self.clamp_full_page(size);
        Ok(self.request())
    }

    /// Starts over at the first row, after the store switched to a new view.
    pub fn reset(&mut self, total: usize) -> Option<PageRequest> {
        self.offset = 0;
        self.total = total;
        self.scrolling_down = false;
        self.generation += 1;
        self.board = self.board.take().map(|board| board.jump_first_row());
        self.request()
    }

    fn request(&mut self) -> Option<PageRequest> {
        let size = self.page_size();
        if size == 0 {
            return None;
        }
        let request = PageRequest {
            offset: self.offset,
            size,
            generation: self.generation,
        };
        tracing::debug!(offset = request.offset, size, "requesting page");
        self.pending = Some(request);
        Some(request)
    }

    fn clamp_full_page(&mut self, size: usize) {
        if self.offset + size > self.total {
            self.offset = self.total.saturating_sub(size);
        }
    }

    fn rows_for_records(&self) -> Vec<Row> {
        self.records
            .iter()
            .map(|record| {
                self.columns
                    .iter()
                    .map(|column| {
                        let value = record
                            .values
                            .get(column.field_index)
                            .cloned()
                            .unwrap_or(FieldValue::Null);
                        let text = column.formatter.format(&value);
                        CellValue::value(value, text)
                    })
                    .collect()
            })
            .collect()
    }

    fn rebuild(&mut self, rows: Vec<Row>) -> PageOutcome {
        let row = if self.scrolling_down { rows.len() - 1 } else { 0 };
        let col = self
            .board
            .as_ref()
            .map_or(0, |board| board.cursor().col)
            .min(self.columns.len().saturating_sub(1));
        match Board::new(rows, self.column_specs(), Cursor::new(row, col)) {
            Ok(board) => {
                self.board = Some(board.with_width(self.width));
                PageOutcome::Rebuilt
            }
            Err(error) => {
                tracing::warn!(%error, "page does not fit the column layout");
                self.board = None;
                PageOutcome::Empty
            }
        }
    }
}

fn resolve_columns(layout: &Layout, fields: &[Field]) -> Result<Vec<DisplayColumn>> {
    let mut columns = Vec::new();
    for column in layout.displayed_columns() {
        let Some(field_index) = fields.iter().position(|field| field.name == column.field) else {
            bail!(
                "column {} is not a field of the store; promote it or mark it demote = true",
                column.field
            );
        };
        let formatter =
            ValueFormatter::for_column(fields[field_index].kind, column.format.as_deref())?;
        columns.push(DisplayColumn {
            field_index,
            spec: ColumnSpec::new(column.field.clone(), column.width),
            formatter,
        });
    }
    if columns.is_empty() {
        bail!("layout has no visible columns");
    }
    Ok(columns)
}
