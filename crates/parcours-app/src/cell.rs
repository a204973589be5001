// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{FieldValue, Input};

pub const DEFAULT_TEXT_MAX_LEN: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Label(String),
    Toggle(bool),
    Choice {
        options: Vec<String>,
        selected: usize,
    },
    Text {
        value: String,
        /// Cursor position in characters, not bytes.
        cursor: usize,
        max_len: usize,
    },
    Button {
        label: String,
        key: char,
    },
    Value {
        value: FieldValue,
        text: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellEvent {
    Toggled(bool),
    ChoiceChanged { index: usize, option: String },
    TextChanged(String),
    Pressed,
}

impl CellValue {
    pub fn label(text: impl Into<String>) -> Self {
        Self::Label(text.into())
    }

    pub fn choice<I, S>(options: I, selected: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let options = options.into_iter().map(Into::into).collect::<Vec<_>>();
        let selected = if selected < options.len() { selected } else { 0 };
        Self::Choice { options, selected }
    }

    pub fn text(value: impl Into<String>, max_len: usize) -> Self {
        let max_len = if max_len == 0 {
            DEFAULT_TEXT_MAX_LEN
        } else {
            max_len
        };
        let value = value.into().chars().take(max_len).collect::<String>();
        let cursor = value.chars().count();
        Self::Text {
            value,
            cursor,
            max_len,
        }
    }

    pub fn button(label: impl Into<String>, key: char) -> Self {
        Self::Button {
            label: label.into(),
            key,
        }
    }

    pub fn value(value: FieldValue, text: impl Into<String>) -> Self {
        Self::Value {
            value,
            text: text.into(),
        }
    }

    pub fn render(&self) -> String {
        match self {
            Self::Label(text) => text.clone(),
            Self::Toggle(on) => (if *on { "[x]" } else { "[ ]" }).to_owned(),
            Self::Choice { options, selected } => options
                .get(*selected)
                .cloned()
                .unwrap_or_else(|| "?".to_owned()),
            Self::Text { value, .. } => value.clone(),
            Self::Button { label, .. } => format!("[{label}]"),
            Self::Value { text, .. } => text.clone(),
        }
    }

    /// The value the cell stands for, as opposed to how it is drawn.
    pub fn current_value(&self) -> String {
        match self {
            Self::Label(text) => text.clone(),
            Self::Toggle(on) => on.to_string(),
            Self::Choice { options, selected } => {
                options.get(*selected).cloned().unwrap_or_default()
            }
            Self::Text { value, .. } => value.clone(),
            Self::Button { label, .. } => label.clone(),
            Self::Value { value, .. } => value.raw_text(),
        }
    }

    /// Character index of the edit cursor, for cells that have one.
    pub fn edit_cursor(&self) -> Option<usize> {
        match self {
            Self::Text { cursor, .. } => Some(*cursor),
            _ => None,
        }
    }

    pub fn handle_input(&mut self, input: Input) -> Option<CellEvent> {
        match self {
            Self::Label(_) | Self::Value { .. } => None,
            Self::Toggle(on) => match input {
                Input::Char(' ' | 't') => {
                    *on = !*on;
                    Some(CellEvent::Toggled(*on))
                }
                _ => None,
            },
            Self::Choice { options, selected } => {
                let delta = match input {
                    Input::Char(' ' | '+' | '>') => 1,
                    Input::Char('-' | '<') => -1,
                    _ => return None,
                };
                if options.is_empty() {
                    return None;
                }
                let len = options.len() as isize;
                *selected = (*selected as isize + delta).rem_euclid(len) as usize;
                Some(CellEvent::ChoiceChanged {
                    index: *selected,
                    option: options[*selected].clone(),
                })
            }
            Self::Text {
                value,
                cursor,
                max_len,
            } => edit_text(value, cursor, *max_len, input),
            Self::Button { key, .. } => match input {
                Input::Char(pressed) if pressed == *key => Some(CellEvent::Pressed),
                _ => None,
            },
        }
    }
}

fn edit_text(
    value: &mut String,
    cursor: &mut usize,
    max_len: usize,
    input: Input,
) -> Option<CellEvent> {
    let len = value.chars().count();
    *cursor = (*cursor).min(len);
    match input {
        Input::Char(ch) => {
            if len >= max_len || ch.is_control() {
                return None;
            }
            value.insert(byte_offset(value, *cursor), ch);
            *cursor += 1;
        }
        Input::Backspace => {
            if *cursor == 0 {
                return None;
            }
            *cursor -= 1;
            value.remove(byte_offset(value, *cursor));
        }
        Input::Delete => {
            if *cursor >= len {
                return None;
            }
            value.remove(byte_offset(value, *cursor));
        }
        Input::Home => {
            *cursor = 0;
            return None;
        }
        Input::End => {
            *cursor = len;
            return None;
        }
        _ => return None,
    }
    Some(CellEvent::TextChanged(value.clone()))
}

fn byte_offset(value: &str, char_index: usize) -> usize {
    value
        .char_indices()
        .nth(char_index)
        .map_or(value.len(), |(offset, _)| offset)
}

#[cfg(test)]
mod tests {
    use super::{CellEvent, CellValue};
    use crate::{FieldValue, Input};

    #[test]
    fn toggle_flips_on_space() {
        let mut cell = CellValue::Toggle(false);
        assert_eq!(
            cell.handle_input(Input::Char(' ')),
            Some(CellEvent::Toggled(true))
        );
        assert_eq!(cell.render(), "[x]");
        assert_eq!(cell.handle_input(Input::Char('x')), None);
        assert_eq!(cell.current_value(), "true");
    }

    #[test]
    fn choice_wraps_in_both_directions() {
        let mut cell = CellValue::choice(["=", "!=", ">"], 0);
        assert_eq!(
            cell.handle_input(Input::Char('-')),
            Some(CellEvent::ChoiceChanged {
                index: 2,
                option: ">".to_owned(),
            })
        );
        assert_eq!(
            cell.handle_input(Input::Char(' ')),
            Some(CellEvent::ChoiceChanged {
                index: 0,
                option: "=".to_owned(),
            })
        );
    }

    #[test]
    fn choice_clamps_out_of_range_selection() {
        let cell = CellValue::choice(["a", "b"], 9);
        assert_eq!(cell.render(), "a");
    }

    #[test]
    fn text_edits_at_cursor_and_respects_max_len() {
        let mut cell = CellValue::text("ac", 3);
        cell.handle_input(Input::Home);
        cell.handle_input(Input::Delete);
        assert_eq!(cell.current_value(), "c");
        assert_eq!(
            cell.handle_input(Input::Char('b')),
            Some(CellEvent::TextChanged("bc".to_owned()))
        );
        cell.handle_input(Input::End);
        cell.handle_input(Input::Char('d'));
        assert_eq!(cell.handle_input(Input::Char('e')), None);
        assert_eq!(cell.current_value(), "bcd");
    }

    #[test]
    fn text_backspace_handles_multibyte_characters() {
        let mut cell = CellValue::text("café", 0);
        assert_eq!(
            cell.handle_input(Input::Backspace),
            Some(CellEvent::TextChanged("caf".to_owned()))
        );
        assert_eq!(cell.edit_cursor(), Some(3));
    }

    #[test]
    fn button_fires_only_on_its_key() {
        let mut cell = CellValue::button("del", 'd');
        assert_eq!(cell.handle_input(Input::Char('x')), None);
        assert_eq!(cell.handle_input(Input::Char('d')), Some(CellEvent::Pressed));
        assert_eq!(cell.render(), "[del]");
    }

    #[test]
    fn value_cells_report_raw_text_but_render_formatted() {
        let mut cell = CellValue::value(FieldValue::Integer(1500), "1.5k");
        assert_eq!(cell.handle_input(Input::Char('x')), None);
        assert_eq!(cell.render(), "1.5k");
        assert_eq!(cell.current_value(), "1500");
    }
}
