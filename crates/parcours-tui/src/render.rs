// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use parcours_app::{
    AppState, Board, COLUMN_GUTTER, CellValue, DetailView, FOOTER_ROWS, FilterEditor, Screen,
    truncate_to_width,
};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Text};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table};

const EDIT_MARK: char = '▏';
const RULE: &str = "─";

pub fn render(frame: &mut ratatui::Frame<'_>, state: &AppState) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(FOOTER_ROWS as u16),
        ])
        .split(frame.area());

    match state.screen {
        Screen::Detail => render_detail(frame, layout[0], state.detail()),
        Screen::Grid | Screen::FilterEdit => render_grid(frame, layout[0], state),
    }
    render_footer(frame, layout[1], state);

    if state.screen == Screen::FilterEdit {
        let area = centered_rect(80, 60, frame.area());
        frame.render_widget(Clear, area);
        render_filter_editor(frame, area, state.editor());
    }
}

fn render_grid(frame: &mut ratatui::Frame<'_>, area: Rect, state: &AppState) {
    let Some(board) = state.pager().board() else {
        let text = if state.pager().total() == 0 {
            "no matching records"
        } else {
            "loading…"
        };
        let empty = Paragraph::new(text).style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, area);
        return;
    };
    frame.render_widget(board_table(board, false), area);
}

/// Board rows as a table over the columns that fit, with the cursor cell
/// highlighted. Editable cells show their edit cursor when focused.
fn board_table(board: &Board, show_edit_cursor: bool) -> Table<'static> {
    let visible = board.visible_columns();
    let columns = &board.columns()[visible.clone()];
    let widths = columns
        .iter()
        .map(|column| Constraint::Length(clamp_u16(column.width)))
        .collect::<Vec<_>>();

    let header = Row::new(columns.iter().map(|column| {
        Cell::from(Text::from(vec![
            Line::from(truncate_to_width(&column.name, column.width)),
            Line::from(RULE.repeat(column.width)),
        ]))
        .style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
    }))
    .height(2);

    let cursor = board.cursor();
    let rows = board
        .rows()
        .iter()
        .enumerate()
        .map(|(row_index, row)| {
            let selected_row = row_index == cursor.row;
            let cells = visible
                .clone()
                .map(|col_index| {
                    let focused = selected_row && col_index == cursor.col;
                    let width = board.columns()[col_index].width;
                    let text = cell_text(&row[col_index], width, focused && show_edit_cursor);
                    let mut style = Style::default();
                    if selected_row {
                        style = style.bg(Color::DarkGray);
                    }
                    if focused {
                        style = Style::default()
                            .fg(Color::Black)
                            .bg(Color::Cyan)
                            .add_modifier(Modifier::BOLD);
                    }
                    Cell::from(text).style(style)
                })
                .collect::<Vec<_>>();
            Row::new(cells)
        })
        .collect::<Vec<_>>();

    Table::new(rows, widths)
        .header(header)
        .column_spacing(clamp_u16(COLUMN_GUTTER))
}

pub fn cell_text(cell: &CellValue, width: usize, show_edit_cursor: bool) -> String {
    let mut text = cell.render();
    if show_edit_cursor && let Some(cursor) = cell.edit_cursor() {
        let offset = text
            .char_indices()
            .nth(cursor)
            .map_or(text.len(), |(offset, _)| offset);
        text.insert(offset, EDIT_MARK);
    }
    truncate_to_width(&text, width)
}

fn render_detail(frame: &mut ratatui::Frame<'_>, area: Rect, detail: &DetailView) {
    let mut lines = vec![Line::from(detail_title(detail)).style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )];
    lines.extend(
        detail
            .visible_lines()
            .iter()
            .map(|line| Line::from(line.clone())),
    );
    frame.render_widget(Paragraph::new(lines), area);
}

pub fn detail_title(detail: &DetailView) -> String {
    let Some(id) = detail.record_id() else {
        return "record".to_owned();
    };
    if detail.is_loading() {
        return format!("record {} (loading…)", id.get());
    }
    let total = detail.lines().len();
    if total == 0 {
        return format!("record {}", id.get());
    }
    let first = detail.scroll() + 1;
    let last = detail.scroll() + detail.visible_lines().len();
    format!("record {}  lines {first}-{last} of {total}", id.get())
}

fn render_filter_editor(frame: &mut ratatui::Frame<'_>, area: Rect, editor: &FilterEditor) {
    let block = Block::default()
        .title("filter: enter apply · esc back · space toggle · +/- op · d delete")
        .borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    match editor.board() {
        Some(board) => frame.render_widget(board_table(board, true), inner),
        None => frame.render_widget(
            Paragraph::new(filter_editor_empty_text()).style(Style::default().fg(Color::DarkGray)),
            inner,
        ),
    }
}

pub fn filter_editor_empty_text() -> &'static str {
    "no filter entries; go back and press c on a cell to add one"
}

/// Footer line for a given width: the status message when there is one,
/// otherwise the source on the left and the position on the right.
pub fn footer_text(state: &AppState, width: usize) -> String {
    if let Some(status) = &state.status_line {
        return truncate_to_width(status, width);
    }
    let left = state.footer_left();
    let right = state.footer_right();
    let right_len = right.chars().count();
    let left = truncate_to_width(left, width.saturating_sub(right_len + 1));
    let gap = width.saturating_sub(left.chars().count() + right_len).max(1);
    format!("{left}{}{right}", " ".repeat(gap))
}

fn render_footer(frame: &mut ratatui::Frame<'_>, area: Rect, state: &AppState) {
    if let Some(status) = &state.status_line {
        let widget = Paragraph::new(status.clone()).style(Style::default().fg(Color::Yellow));
        frame.render_widget(widget, area);
        return;
    }
    let style = Style::default().fg(Color::Gray);
    frame.render_widget(
        Paragraph::new(state.footer_left().to_owned()).style(style),
        area,
    );
    frame.render_widget(
        Paragraph::new(state.footer_right())
            .style(style)
            .alignment(Alignment::Right),
        area,
    );
}

fn clamp_u16(value: usize) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
