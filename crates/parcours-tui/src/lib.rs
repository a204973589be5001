// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod keymap;
mod render;
mod worker;

pub use keymap::msg_for_key;
pub use render::{detail_title, footer_text};
pub use worker::{StoreRequest, execute_request, spawn_store_worker};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use parcours_app::{AppMsg, AppState, DataStore, Effect, Layout, LayoutPurpose, StoreOperation};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::collections::VecDeque;
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

/// Work the event loop does outside the store.
pub trait AppRuntime {
    /// Reads the layout file again.
    fn load_layout(&mut self) -> Result<Layout>;
}

pub fn run_app<S, R>(state: &mut AppState, store: S, runtime: &mut R) -> Result<()>
where
    S: DataStore + Send + 'static,
    R: AppRuntime,
{
    let (results_tx, results_rx) = mpsc::channel();
    let (requests, worker) = spawn_store_worker(store, results_tx)?;

    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let result = event_loop(&mut terminal, state, runtime, &requests, &results_rx);

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;

    drop(requests);
    if worker.join().is_err() {
        tracing::error!("store worker panicked");
    }
    result
}

fn event_loop<B, R>(
    terminal: &mut Terminal<B>,
    state: &mut AppState,
    runtime: &mut R,
    requests: &Sender<StoreRequest>,
    results: &Receiver<AppMsg>,
) -> Result<()>
where
    B: ratatui::backend::Backend,
    R: AppRuntime,
{
    let size = terminal.size().context("read terminal size")?;
    dispatch(
        state,
        runtime,
        requests,
        AppMsg::Resize {
            width: size.width,
            height: size.height,
        },
    );

    loop {
        if drain_results(state, runtime, requests, results) {
            return Ok(());
        }

        terminal
            .draw(|frame| render::render(frame, state))
            .context("draw frame")?;

        let has_event = event::poll(Duration::from_millis(120)).context("poll event")?;
        if !has_event {
            continue;
        }
        let msg = match event::read().context("read event")? {
            Event::Key(key) if key.kind != KeyEventKind::Release => {
                msg_for_key(state.screen, key)
            }
            Event::Resize(width, height) => Some(AppMsg::Resize { width, height }),
            _ => None,
        };
        if let Some(msg) = msg
            && dispatch(state, runtime, requests, msg)
        {
            return Ok(());
        }
    }
}

/// Applies every store result that has arrived. Returns true on quit.
pub fn drain_results<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    requests: &Sender<StoreRequest>,
    results: &Receiver<AppMsg>,
) -> bool {
    while let Ok(msg) = results.try_recv() {
        if dispatch(state, runtime, requests, msg) {
            return true;
        }
    }
    false
}

/// Runs one message through the state and carries out its effects. Store
/// effects go to the worker; layout reloads run here and feed their result
/// straight back in. Returns true on quit.
pub fn dispatch<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    requests: &Sender<StoreRequest>,
    msg: AppMsg,
) -> bool {
    let mut queue = VecDeque::from([msg]);
    while let Some(msg) = queue.pop_front() {
        for effect in state.update(msg) {
            match effect {
                Effect::Quit => return true,
                Effect::ReloadLayout(purpose) => queue.push_back(reload_layout(runtime, purpose)),
                other => {
                    let Some(request) = StoreRequest::from_effect(other) else {
                        continue;
                    };
                    let operation = request.operation();
                    if requests.send(request).is_err() {
                        queue.push_back(AppMsg::StoreFailed {
                            operation,
                            message: "store worker is not running".to_owned(),
                        });
                    }
                }
            }
        }
    }
    false
}

fn reload_layout<R: AppRuntime>(runtime: &mut R, purpose: LayoutPurpose) -> AppMsg {
    match runtime.load_layout() {
        Ok(layout) => {
            tracing::info!(?purpose, columns = layout.columns.len(), "layout reloaded");
            AppMsg::LayoutLoaded { layout, purpose }
        }
        Err(error) => AppMsg::StoreFailed {
            operation: StoreOperation::Layout,
            message: format!("{error:#}"),
        },
    }
}
