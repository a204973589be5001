// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use parcours_app::{
    AppMsg, AppState, ColumnConfig, CompareOp, DataStore, FilterNode, Input, Layout, Screen,
    StoreOperation, sync_layout,
};
use parcours_db::Store;
use parcours_testkit::{LogFaker, fixture_lines};
use parcours_tui::{AppRuntime, StoreRequest, dispatch, footer_text, spawn_store_worker};
use std::io::Cursor;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::JoinHandle;
use std::time::Duration;

struct FixedRuntime {
    layout: Layout,
}

impl AppRuntime for FixedRuntime {
    fn load_layout(&mut self) -> Result<Layout> {
        Ok(self.layout.clone())
    }
}

struct Harness {
    state: AppState,
    runtime: FixedRuntime,
    requests: Sender<StoreRequest>,
    results: Receiver<AppMsg>,
    worker: JoinHandle<()>,
}

impl Harness {
    fn start(lines: &[String], layout: Layout, width: u16, height: u16) -> Result<Self> {
        let mut store = Store::open_memory()?;
        store.load_reader("app.log", Cursor::new(lines.join("\n")))?;
        let view = sync_layout(&mut store, &layout)?;
        let state = AppState::new(store.name(), layout.clone(), view)?;
        let (results_tx, results) = mpsc::channel();
        let (requests, worker) = spawn_store_worker(store, results_tx)?;
        let mut harness = Self {
            state,
            runtime: FixedRuntime { layout },
            requests,
            results,
            worker,
        };
        harness.send(AppMsg::Resize { width, height });
        harness.pump(1)?;
        Ok(harness)
    }

    fn send(&mut self, msg: AppMsg) {
        assert!(!dispatch(&mut self.state, &mut self.runtime, &self.requests, msg));
    }

    /// Waits for `count` store results and feeds each back in.
    fn pump(&mut self, count: usize) -> Result<()> {
        for _ in 0..count {
            let msg = self.results.recv_timeout(Duration::from_secs(5))?;
            self.send(msg);
        }
        Ok(())
    }

    fn stop(self) {
        drop(self.requests);
        self.worker.join().expect("store worker exits cleanly");
    }
}

fn fixture_layout() -> Layout {
    Layout {
        columns: vec![
            ColumnConfig::new("level", 7),
            ColumnConfig::new("message", 30),
            ColumnConfig::new("service", 10),
        ],
        ..Layout::default()
    }
}

#[test]
fn first_page_arrives_after_resize() -> Result<()> {
    let harness = Harness::start(&fixture_lines(), fixture_layout(), 80, 8)?;
    let board = harness.state.pager().board().expect("board");
    assert_eq!(board.row_count(), 5);
    assert_eq!(board.rows()[0][2].render(), "api");
    assert_eq!(harness.state.footer_right(), "1/6");
    harness.stop();
    Ok(())
}

#[test]
fn filter_on_cell_narrows_the_grid_then_detail_shows_the_record() -> Result<()> {
    let mut harness = Harness::start(&fixture_lines(), fixture_layout(), 80, 8)?;

    harness.send(AppMsg::Input(Input::Down));
    harness.send(AppMsg::OpenFilterOnCell);
    assert_eq!(harness.state.screen, Screen::FilterEdit);
    harness.send(AppMsg::ApplyFilter);
    harness.pump(2)?;

    assert_eq!(harness.state.screen, Screen::Grid);
    assert_eq!(harness.state.pager().total(), 2);
    assert_eq!(
        harness.state.status_line.as_deref(),
        Some("2 matching records")
    );
    let board = harness.state.pager().board().expect("board");
    let levels = board
        .rows()
        .iter()
        .map(|row| row[0].render())
        .collect::<Vec<_>>();
    assert_eq!(levels, vec!["error", "error"]);

    harness.send(AppMsg::ShowDetail);
    assert_eq!(harness.state.screen, Screen::Detail);
    harness.pump(1)?;
    let detail = harness.state.detail();
    assert!(!detail.is_loading());
    assert!(
        detail
            .lines()
            .iter()
            .any(|line| line.contains("\"msg\": \"it's broken\"")),
        "{:?}",
        detail.lines()
    );

    harness.send(AppMsg::Back);
    assert_eq!(footer_text(&harness.state, 20), "app.log          1/2");
    harness.stop();
    Ok(())
}

#[test]
fn paging_through_a_large_log_keeps_full_pages() -> Result<()> {
    let lines = LogFaker::new(5).lines(300);
    let mut harness = Harness::start(&lines, Layout::default(), 120, 23)?;
    let page_size = harness.state.pager().page_size();
    assert_eq!(page_size, 20);

    for _ in 0..20 {
        harness.send(AppMsg::Input(Input::PageDown));
        if harness.state.pager().pending().is_some() {
            harness.pump(1)?;
        }
    }
    harness.send(AppMsg::Input(Input::Bottom));
    if harness.state.pager().pending().is_some() {
        harness.pump(1)?;
    }
    let pager = harness.state.pager();
    assert_eq!(pager.offset(), 280);
    assert_eq!(pager.board().expect("board").row_count(), page_size);

    harness.send(AppMsg::Input(Input::Top));
    harness.pump(1)?;
    assert_eq!(harness.state.pager().offset(), 0);
    assert_eq!(harness.state.footer_right(), "1/300");
    harness.stop();
    Ok(())
}

#[test]
fn unknown_filter_field_is_reported_and_grid_is_kept() -> Result<()> {
    let mut harness = Harness::start(&fixture_lines(), fixture_layout(), 80, 8)?;
    harness.runtime.layout.filter = Some(FilterNode::compare("region", CompareOp::Eq, "eu"));

    harness.send(AppMsg::ReloadFilter);
    harness.pump(1)?;
    let status = harness.state.status_line.clone().unwrap_or_default();
    assert!(
        status.starts_with(&format!("{} failed:", StoreOperation::View.as_str())),
        "{status}"
    );
    assert!(status.contains("unknown field region"), "{status}");
    assert_eq!(harness.state.pager().total(), 6);
    assert_eq!(harness.state.pager().board().expect("board").row_count(), 5);
    harness.stop();
    Ok(())
}
