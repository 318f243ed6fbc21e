//! Per-widget asynchronous data lifecycle.
//!
//! The orchestrator owns a runtime-state map keyed by widget id and a table
//! of per-widget fetch functions. A refresh issues one independent tokio
//! task per resident id — no sequential awaiting, arbitrary completion
//! order, each widget's failure localized to its own tile.
//!
//! The store watcher re-issues fetches for every resident id on every
//! layout mutation (add, remove, resize and reorder all count); that
//! full-reload behavior is part of the contract, not an accident.
//!
//! Concurrency policy: **last-resolved-wins**. There is no cancellation and
//! no request-generation ordering; when two fetches for one id overlap, the
//! one that resolves last determines the final state even if it was issued
//! first. Removing an id from the layout does not cancel its in-flight
//! fetch — a late resolution lands in an unreachable map entry and is
//! harmless.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use crate::layout::LayoutStore;
use crate::registry::WidgetRegistry;
use crate::WidgetRuntimeState;

/// Future returned by a widget fetch function.
///
/// `Err` carries the failure message. A successful `Value` shaped as
/// `{"error": message}` is the accepted alternative failure encoding and is
/// treated identically to `Err`.
pub type FetchFuture = BoxFuture<'static, Result<Value, String>>;

/// One asynchronous fetch function per widget id; no arguments.
pub type FetchFn = Arc<dyn Fn() -> FetchFuture + Send + Sync>;

/// Errors from orchestrator construction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrchestratorError {
    /// The fetch table has no handler for a catalogue widget. Raised at
    /// construction so a missing handler can never become a silent runtime
    /// default.
    #[error("No fetch function registered for widget: {0}")]
    MissingFetcher(String),
}

/// Orchestrates independent fetches and tracks per-widget runtime state.
///
/// Cheap to clone; clones share the runtime-state map.
#[derive(Clone)]
pub struct DataOrchestrator {
    fetchers: Arc<HashMap<String, FetchFn>>,
    states: Arc<RwLock<HashMap<String, WidgetRuntimeState>>>,
}

impl std::fmt::Debug for DataOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataOrchestrator")
            .field("fetchers", &self.fetchers.len())
            .finish()
    }
}

impl DataOrchestrator {
    /// Creates an orchestrator over a fetch table, validated against the
    /// catalogue: every registry id must have a fetcher.
    pub fn new(
        fetchers: HashMap<String, FetchFn>,
        registry: &WidgetRegistry,
    ) -> Result<Self, OrchestratorError> {
        for def in registry.definitions() {
            if !fetchers.contains_key(def.id) {
                return Err(OrchestratorError::MissingFetcher(def.id.to_string()));
            }
        }
        Ok(Self {
            fetchers: Arc::new(fetchers),
            states: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    /// Issues one concurrent fetch per unique id.
    ///
    /// Marks each id `loading` (prior payload/error stay visible until the
    /// new fetch resolves), then spawns the fetches without waiting on each
    /// other. Returns the task handles so tests and shutdown paths can await
    /// completion; hosts normally drop them.
    ///
    /// Ids without a fetcher — dangling layout entries — are skipped
    /// silently, matching the render-time treatment of dangling references.
    pub async fn refresh<I, S>(&self, ids: I) -> Vec<JoinHandle<()>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut unique: Vec<String> = Vec::new();
        for id in ids {
            let id = id.as_ref();
            if !unique.iter().any(|u| u == id) {
                unique.push(id.to_string());
            }
        }

        let mut handles = Vec::with_capacity(unique.len());
        {
            let mut states = self.states.write().await;
            for id in &unique {
                if !self.fetchers.contains_key(id) {
                    tracing::debug!("No fetcher for widget '{}', skipping", id);
                    continue;
                }
                let previous = states.get(id.as_str()).cloned();
                states.insert(id.clone(), WidgetRuntimeState::begin(previous.as_ref()));
            }
        }

        for id in unique {
            let Some(fetcher) = self.fetchers.get(&id) else {
                continue;
            };
            let fut = fetcher();
            let states = Arc::clone(&self.states);
            handles.push(tokio::spawn(async move {
                let state = match fut.await {
                    Ok(value) => match error_payload(&value) {
                        Some(message) => {
                            tracing::debug!("Widget '{}' returned error payload: {}", id, message);
                            WidgetRuntimeState::failed(message)
                        }
                        None => WidgetRuntimeState::ready(value),
                    },
                    Err(message) => {
                        tracing::debug!("Widget '{}' fetch failed: {}", id, message);
                        WidgetRuntimeState::failed(message)
                    }
                };
                // Last resolution wins, even for an id no longer resident.
                states.write().await.insert(id, state);
            }));
        }
        handles
    }

    /// Spawns a task that re-fetches all resident widgets on every layout
    /// mutation.
    ///
    /// A lagged receiver resynchronizes from the store's current resident
    /// set; the task ends when the store is dropped.
    pub fn spawn_watcher(&self, store: &LayoutStore) -> JoinHandle<()> {
        let mut rx = store.subscribe();
        let store = store.clone();
        let orchestrator = self.clone();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(change) => {
                        orchestrator.refresh(change.ids).await;
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(missed)) => {
                        tracing::debug!("Layout watcher lagged by {} changes, resyncing", missed);
                        let ids = store.resident_ids().await;
                        orchestrator.refresh(ids).await;
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    /// Runtime state for one widget; `None` if no fetch was ever issued.
    pub async fn runtime_state(&self, id: &str) -> Option<WidgetRuntimeState> {
        self.states.read().await.get(id).cloned()
    }
}

/// Extracts the message from the `{"error": message}` failure encoding.
fn error_payload(value: &Value) -> Option<String> {
    value
        .as_object()
        .and_then(|obj| obj.get("error"))
        .and_then(|e| e.as_str())
        .map(|s| s.to_string())
}
