// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use parcours_app::{AppMsg, Input, Screen};

pub fn msg_for_key(screen: Screen, key: KeyEvent) -> Option<AppMsg> {
    if is_ctrl(key, 'c') {
        return Some(AppMsg::Quit);
    }
    match screen {
        Screen::Grid => grid_msg_for_key(key),
        Screen::Detail => detail_msg_for_key(key),
        Screen::FilterEdit => filter_msg_for_key(key),
    }
}

fn grid_msg_for_key(key: KeyEvent) -> Option<AppMsg> {
    if let Some(input) = scroll_input_for_key(key) {
        return Some(AppMsg::Input(input));
    }
    let msg = match key.code {
        KeyCode::Char('h') | KeyCode::Left => AppMsg::Input(Input::Left),
        KeyCode::Char('l') | KeyCode::Right => AppMsg::Input(Input::Right),
        KeyCode::Char('c') => AppMsg::OpenFilterOnCell,
        KeyCode::Char('F') => AppMsg::OpenFilterEditor,
        KeyCode::Char('r') => AppMsg::ReloadColumns,
        KeyCode::Char('f') => AppMsg::ReloadFilter,
        KeyCode::Char('q') => AppMsg::Quit,
        KeyCode::Enter => AppMsg::ShowDetail,
        KeyCode::Esc => AppMsg::Back,
        _ => return None,
    };
    Some(msg)
}

fn detail_msg_for_key(key: KeyEvent) -> Option<AppMsg> {
    if let Some(input) = scroll_input_for_key(key) {
        return Some(AppMsg::Input(input));
    }
    match key.code {
        KeyCode::Esc => Some(AppMsg::Back),
        KeyCode::Char('q') => Some(AppMsg::Quit),
        _ => None,
    }
}

/// Everything printable goes to the focused cell, so the editor has no
/// letter shortcuts.
fn filter_msg_for_key(key: KeyEvent) -> Option<AppMsg> {
    let input = match key.code {
        KeyCode::Enter => return Some(AppMsg::ApplyFilter),
        KeyCode::Esc => return Some(AppMsg::Back),
        KeyCode::Up => Input::Up,
        KeyCode::Down => Input::Down,
        KeyCode::Left | KeyCode::BackTab => Input::Left,
        KeyCode::Right | KeyCode::Tab => Input::Right,
        KeyCode::PageUp => Input::PageUp,
        KeyCode::PageDown => Input::PageDown,
        KeyCode::Home => Input::Home,
        KeyCode::End => Input::End,
        KeyCode::Backspace => Input::Backspace,
        KeyCode::Delete => Input::Delete,
        KeyCode::Char(ch)
            if !key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            Input::Char(ch)
        }
        _ => return None,
    };
    Some(AppMsg::Input(input))
}

/// Vertical movement shared by the grid and the detail view.
fn scroll_input_for_key(key: KeyEvent) -> Option<Input> {
    if is_ctrl(key, 'd') {
        return Some(Input::PageDown);
    }
    if is_ctrl(key, 'u') {
        return Some(Input::PageUp);
    }
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => Some(Input::Down),
        KeyCode::Char('k') | KeyCode::Up => Some(Input::Up),
        KeyCode::Char('g') | KeyCode::Home => Some(Input::Top),
        KeyCode::Char('G') | KeyCode::End => Some(Input::Bottom),
        KeyCode::PageUp => Some(Input::PageUp),
        KeyCode::PageDown => Some(Input::PageDown),
        _ => None,
    }
}

fn is_ctrl(key: KeyEvent, ch: char) -> bool {
    key.code == KeyCode::Char(ch) && key.modifiers.contains(KeyModifiers::CONTROL)
}
