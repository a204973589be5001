// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use parcours_app::{
    AppMsg, DataStore, Effect, FilterNode, Layout, Page, PageRequest, RecordId, Sort,
    StoreOperation, sync_layout,
};
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};

/// Work for the thread that owns the store.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreRequest {
    FetchPage(PageRequest),
    FetchRecord(RecordId),
    SetView {
        filter: Option<FilterNode>,
        sorts: Vec<Sort>,
    },
    SyncLayout(Layout),
}

impl StoreRequest {
    /// The store call behind an effect, if it has one.
    pub fn from_effect(effect: Effect) -> Option<Self> {
        match effect {
            Effect::FetchPage(request) => Some(Self::FetchPage(request)),
            Effect::FetchRecord(id) => Some(Self::FetchRecord(id)),
            Effect::SetView { filter, sorts } => Some(Self::SetView { filter, sorts }),
            Effect::SyncLayout(layout) => Some(Self::SyncLayout(layout)),
            Effect::ReloadLayout(_) | Effect::Quit => None,
        }
    }

    pub const fn operation(&self) -> StoreOperation {
        match self {
            Self::FetchPage(request) => StoreOperation::Page(*request),
            Self::FetchRecord(_) => StoreOperation::Record,
            Self::SetView { .. } => StoreOperation::View,
            Self::SyncLayout(_) => StoreOperation::Columns,
        }
    }
}

/// Moves the store onto its own thread. Requests are served in the order
/// they were sent and each one produces exactly one message on `results`.
/// The thread ends when the request sender is dropped.
pub fn spawn_store_worker<S>(
    store: S,
    results: Sender<AppMsg>,
) -> Result<(Sender<StoreRequest>, JoinHandle<()>)>
where
    S: DataStore + Send + 'static,
{
    let (request_tx, request_rx) = mpsc::channel::<StoreRequest>();
    let handle = thread::Builder::new()
        .name("parcours-store".to_owned())
        .spawn(move || {
            let mut store = store;
            while let Ok(request) = request_rx.recv() {
                let msg = execute_request(&mut store, request);
                if results.send(msg).is_err() {
                    break;
                }
            }
            tracing::debug!("store worker stopped");
        })
        .context("spawn store worker thread")?;
    Ok((request_tx, handle))
}

pub fn execute_request<S: DataStore + ?Sized>(store: &mut S, request: StoreRequest) -> AppMsg {
    let operation = request.operation();
    let outcome = match request {
        StoreRequest::FetchPage(request) => {
            tracing::debug!(
                offset = request.offset,
                size = request.size,
                generation = request.generation,
                "fetching page"
            );
            store
                .get_page(request.offset, request.size)
                .map(|records| AppMsg::PageLoaded(Page { request, records }))
        }
        StoreRequest::FetchRecord(id) => store
            .get_record(id)
            .map(|record| AppMsg::RecordLoaded { id, record }),
        StoreRequest::SetView { filter, sorts } => store
            .set_view(filter.as_ref(), &sorts)
            .and_then(|()| store.get_view())
            .map(AppMsg::ViewApplied),
        StoreRequest::SyncLayout(layout) => {
            sync_layout(store, &layout).map(AppMsg::ColumnsLoaded)
        }
    };
    outcome.unwrap_or_else(|error| AppMsg::StoreFailed {
        operation,
        message: format!("{error:#}"),
    })
}
