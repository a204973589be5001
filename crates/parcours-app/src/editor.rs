// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{
    Board, BoardEvent, CellEvent, CellValue, ColumnSpec, CompareOp, Cursor, FilterKind,
    FilterNode, Input, LogicOp, Row, TaggedCellEvent, combine_enabled,
};

pub const TOGGLE_COL: usize = 0;
pub const FIELD_COL: usize = 1;
pub const OP_COL: usize = 2;
pub const VALUE_COL: usize = 3;
pub const DELETE_COL: usize = 4;

pub const DELETE_KEY: char = 'd';
const VALUE_MAX_LEN: usize = 200;

const EDITOR_COLUMNS: [(&str, usize); 5] = [
    ("on", 3),
    ("field", 18),
    ("op", 8),
    ("value", 32),
    ("", 5),
];

/// Editable list of filter entries, presented as a board with one row per
/// entry. Edits change the entries only; [`FilterEditor::apply`] produces
/// the predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterEditor {
    entries: Vec<FilterNode>,
    board: Option<Board>,
}

impl Default for FilterEditor {
    fn default() -> Self {
        Self::new(None)
    }
}

impl FilterEditor {
    /// Seeds the entries from a default filter. A top-level AND is split
    /// into its children so each can be toggled on its own.
    pub fn new(seed: Option<&FilterNode>) -> Self {
        let entries = match seed {
            None => Vec::new(),
            Some(FilterNode {
                kind:
                    FilterKind::Logic {
                        op: LogicOp::And,
                        children,
                    },
                enabled,
            }) => children
                .iter()
                .cloned()
                .map(|child| {
                    let on = child.enabled && *enabled;
                    child.with_enabled(on)
                })
                .collect(),
            Some(node) => vec![node.clone()],
        };
        let mut editor = Self {
            entries,
            board: None,
        };
        editor.rebuild(Cursor::default());
        editor
    }

    pub fn entries(&self) -> &[FilterNode] {
        &self.entries
    }

    pub fn board(&self) -> Option<&Board> {
        self.board.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Appends an enabled `field = value` entry and focuses its operator.
    pub fn open_on(&mut self, field: &str, value: &str) {
        self.entries
            .push(FilterNode::compare(field, CompareOp::Eq, value));
        let row = self.entries.len() - 1;
        self.rebuild(Cursor::new(row, OP_COL));
    }

    pub fn apply(&self) -> Option<FilterNode> {
        combine_enabled(&self.entries)
    }

    pub fn handle_input(&mut self, input: Input) {
        let Some(board) = self.board.take() else {
            return;
        };
        let (board, event) = board.handle_input(input);
        self.board = Some(board);
        if let Some(BoardEvent::Cell(event)) = event {
            self.apply_cell_event(event);
        }
    }

    fn apply_cell_event(&mut self, tagged: TaggedCellEvent) {
        let TaggedCellEvent { row, col, event } = tagged;
        let Some(entry) = self.entries.get_mut(row) else {
            return;
        };
        match (col, event) {
            (TOGGLE_COL, CellEvent::Toggled(on)) => entry.enabled = on,
            (OP_COL, CellEvent::ChoiceChanged { index, .. }) => {
                if let FilterKind::Compare { op, .. } = &mut entry.kind {
                    *op = CompareOp::from_index(index);
                }
            }
            (VALUE_COL, CellEvent::TextChanged(text)) => {
                if let FilterKind::Compare { value, .. } = &mut entry.kind {
                    *value = text;
                }
            }
            (DELETE_COL, CellEvent::Pressed) => {
                self.entries.remove(row);
                let next = row.min(self.entries.len().saturating_sub(1));
                self.rebuild(Cursor::new(next, DELETE_COL));
            }
            _ => {}
        }
    }

    fn rebuild(&mut self, cursor: Cursor) {
        let rows = self.entries.iter().map(entry_row).collect::<Vec<Row>>();
        let columns = EDITOR_COLUMNS
            .iter()
            .map(|(name, width)| ColumnSpec::new(*name, *width))
            .collect::<Vec<_>>();
        let cursor = Cursor::new(cursor.row.min(rows.len().saturating_sub(1)), cursor.col);
        self.board = Board::new(rows, columns, cursor).ok();
    }
}

fn entry_row(entry: &FilterNode) -> Row {
    let (field, op, value) = match &entry.kind {
        FilterKind::Compare { field, op, value } => (
            CellValue::label(field.clone()),
            CellValue::choice(
                CompareOp::ALL.iter().map(|op| op.symbol()),
                op.index(),
            ),
            CellValue::text(value.clone(), VALUE_MAX_LEN),
        ),
        FilterKind::Logic { op, .. } => (
            CellValue::label(entry.describe()),
            CellValue::label(op.as_str()),
            CellValue::label(""),
        ),
    };
    vec![
        CellValue::Toggle(entry.enabled),
        field,
        op,
        value,
        CellValue::button("del", DELETE_KEY),
    ]
}
