// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Cursor and viewport model over a fixed set of rows.
//!
//! A [`Board`] is a value: every operation returns a new board and leaves the
//! receiver untouched. Rows are shared behind an [`Arc`] so snapshots are
//! cheap; editing a cell clones the row sequence first.

use crate::{CellEvent, CellValue, Input};
use std::ops::Range;
use std::sync::Arc;

/// Blank columns drawn to the right of every column.
pub const COLUMN_GUTTER: usize = 1;

pub type Row = Vec<CellValue>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    pub width: usize,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, width: usize) -> Self {
        Self {
            name: name.into(),
            width,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    pub row: usize,
    pub col: usize,
}

impl Cursor {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Raised when navigation reaches past what the board holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    Up,
    Down,
    PageUp,
    PageDown,
    Top,
    Bottom,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedCellEvent {
    pub row: usize,
    pub col: usize,
    pub event: CellEvent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardEvent {
    Boundary(Boundary),
    Cell(TaggedCellEvent),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeError {
    NoRows,
    NoColumns,
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },
    CursorOutOfBounds {
        cursor: Cursor,
        rows: usize,
        columns: usize,
    },
}

impl std::fmt::Display for ShapeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoRows => f.write_str("board needs at least one row"),
            Self::NoColumns => f.write_str("board needs at least one column"),
            Self::RaggedRow {
                row,
                expected,
                actual,
            } => write!(f, "row {row} has {actual} cells, expected {expected}"),
            Self::CursorOutOfBounds {
                cursor,
                rows,
                columns,
            } => write!(
                f,
                "cursor ({}, {}) outside {rows}x{columns} board",
                cursor.row, cursor.col
            ),
        }
    }
}

impl std::error::Error for ShapeError {}

#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    rows: Arc<[Row]>,
    columns: Arc<[ColumnSpec]>,
    cursor: Cursor,
    col_offset: usize,
    width: usize,
}

impl Board {
    pub fn new(
        rows: Vec<Row>,
        columns: Vec<ColumnSpec>,
        cursor: Cursor,
    ) -> Result<Self, ShapeError> {
        check_shape(&rows, columns.len(), cursor)?;
        Ok(Self {
            rows: rows.into(),
            columns: columns.into(),
            cursor,
            col_offset: 0,
            width: usize::MAX,
        })
    }

    /// Swaps in new rows, keeping cursor, columns and viewport.
    pub fn replace(&self, rows: Vec<Row>) -> Result<Self, ShapeError> {
        check_shape(&rows, self.columns.len(), self.cursor)?;
        Ok(Self {
            rows: rows.into(),
            ..self.clone()
        })
    }

    pub fn with_width(&self, width: usize) -> Self {
        Self {
            width,
            ..self.clone()
        }
        .adjust_offset_for_cursor()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn col_offset(&self) -> usize {
        self.col_offset
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn current_cell(&self) -> &CellValue {
        &self.rows[self.cursor.row][self.cursor.col]
    }

    pub fn current_column(&self) -> &ColumnSpec {
        &self.columns[self.cursor.col]
    }

    pub fn move_up(&self) -> (Self, Option<Boundary>) {
        if self.cursor.row == 0 {
            return (self.clone(), Some(Boundary::Up));
        }
        (self.with_row(self.cursor.row - 1), None)
    }

    pub fn move_down(&self) -> (Self, Option<Boundary>) {
        if self.cursor.row + 1 >= self.rows.len() {
            return (self.clone(), Some(Boundary::Down));
        }
        (self.with_row(self.cursor.row + 1), None)
    }

    pub fn move_left(&self) -> Self {
        if self.cursor.col == 0 {
            return self.clone();
        }
        self.with_col(self.cursor.col - 1)
    }

    pub fn move_right(&self) -> Self {
        if self.cursor.col + 1 >= self.columns.len() {
            return self.clone();
        }
        self.with_col(self.cursor.col + 1)
    }

    pub fn move_to_top(&self) -> (Self, Option<Boundary>) {
        (self.jump_first_row(), Some(Boundary::Top))
    }

    pub fn move_to_bottom(&self) -> (Self, Option<Boundary>) {
        (self.jump_last_row(), Some(Boundary::Bottom))
    }

    pub fn page_up(&self) -> (Self, Option<Boundary>) {
        (self.clone(), Some(Boundary::PageUp))
    }

    pub fn page_down(&self) -> (Self, Option<Boundary>) {
        (self.clone(), Some(Boundary::PageDown))
    }

    pub fn jump_first_row(&self) -> Self {
        self.with_row(0)
    }

    pub fn jump_last_row(&self) -> Self {
        self.with_row(self.rows.len() - 1)
    }

    /// Half-open range of columns that fit in the width budget, starting at
    /// the leftmost visible column. Never empty while columns remain.
    pub fn visible_columns(&self) -> Range<usize> {
        let start = self.col_offset.min(self.columns.len());
        let mut used = 0usize;
        let mut end = start;
        for column in &self.columns[start..] {
            let needed = used.saturating_add(column.width.saturating_add(COLUMN_GUTTER));
            if needed > self.width && end > start {
                break;
            }
            used = needed;
            end += 1;
        }
        start..end
    }

    /// Scrolls the viewport the least amount that brings the cursor column
    /// into view.
    pub fn adjust_offset_for_cursor(&self) -> Self {
        let mut board = self.clone();
        if board.cursor.col < board.col_offset {
            board.col_offset = board.cursor.col;
            return board;
        }
        while board.cursor.col >= board.visible_columns().end && board.col_offset < board.cursor.col
        {
            board.col_offset += 1;
        }
        board
    }

    pub fn handle_input(&self, input: Input) -> (Self, Option<BoardEvent>) {
        let (board, boundary) = match input {
            Input::Up => self.move_up(),
            Input::Down => self.move_down(),
            Input::Left => (self.move_left(), None),
            Input::Right => (self.move_right(), None),
            Input::Top => self.move_to_top(),
            Input::Bottom => self.move_to_bottom(),
            Input::PageUp => self.page_up(),
            Input::PageDown => self.page_down(),
            _ => return self.route_to_cell(input),
        };
        (board, boundary.map(BoardEvent::Boundary))
    }

    fn route_to_cell(&self, input: Input) -> (Self, Option<BoardEvent>) {
        let Cursor { row, col } = self.cursor;
        let mut cell = self.rows[row][col].clone();
        let event = cell.handle_input(input);
        let board = if cell == self.rows[row][col] {
            self.clone()
        } else {
            let mut rows = self.rows.to_vec();
            rows[row][col] = cell;
            Self {
                rows: rows.into(),
                ..self.clone()
            }
        };
        let event = event.map(|event| BoardEvent::Cell(TaggedCellEvent { row, col, event }));
        (board, event)
    }

    fn with_row(&self, row: usize) -> Self {
        Self {
            cursor: Cursor::new(row, self.cursor.col),
            ..self.clone()
        }
    }

    fn with_col(&self, col: usize) -> Self {
        Self {
            cursor: Cursor::new(self.cursor.row, col),
            ..self.clone()
        }
        .adjust_offset_for_cursor()
    }
}

fn check_shape(rows: &[Row], columns: usize, cursor: Cursor) -> Result<(), ShapeError> {
    if rows.is_empty() {
        return Err(ShapeError::NoRows);
    }
    if columns == 0 {
        return Err(ShapeError::NoColumns);
    }
    if let Some((row, cells)) = rows
        .iter()
        .enumerate()
        .find(|(_, cells)| cells.len() != columns)
    {
        return Err(ShapeError::RaggedRow {
            row,
            expected: columns,
            actual: cells.len(),
        });
    }
    if cursor.row >= rows.len() || cursor.col >= columns {
        return Err(ShapeError::CursorOutOfBounds {
            cursor,
            rows: rows.len(),
            columns,
        });
    }
    Ok(())
}
