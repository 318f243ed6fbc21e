//! Widget layout and data orchestration engine for the operations dashboard.
//!
//! This crate is the in-process core behind a personalized dashboard: an
//! ordered, persisted selection of widgets ("the layout"), a per-widget
//! asynchronous data lifecycle, a drag-based reorder protocol, and the
//! catalogue filtering that backs the "add widget" picker.
//!
//! It deliberately owns no surface of its own — no CLI, no network port, no
//! rendering. The hosting page constructs a [`LayoutStore`] around an
//! injected [`storage::LayoutStorage`] port, a [`DataOrchestrator`] around a
//! fetch-function table, and consults [`WidgetRuntimeState`] to decide the
//! loading / error / content switch for each tile. Visual edit mode is the
//! host's flag: the drag controller and mutating affordances are only wired
//! while it is on.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Logging initialization helper for embedding hosts.
pub mod logging;

/// Static widget catalogue: definitions, categories, lookups.
pub mod registry;

/// Injected persistence port for the serialized layout blob.
pub mod storage;

/// The ordered layout model and its store.
pub mod layout;

/// Per-widget asynchronous fetch lifecycle.
pub mod orchestrator;

/// Three-message drag reorder protocol.
pub mod reorder;

/// Catalogue derivation for the "add widget" picker.
pub mod picker;

pub use layout::{LayoutChanged, LayoutStore};
pub use orchestrator::{DataOrchestrator, FetchFn, FetchFuture, OrchestratorError};
pub use picker::PickerEntry;
pub use registry::{CategoryFilter, WidgetCategory, WidgetDefinition, WidgetRegistry};
pub use reorder::DragReorderController;

/// Tile footprint of a widget in the dashboard grid.
///
/// The persisted layout format and the catalogue's default sizes both use
/// the lowercase string form (`"small"`, `"wide"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetSize {
    Small,
    Medium,
    Large,
    Wide,
    Tall,
    Full,
}

impl Default for WidgetSize {
    /// Fallback size used when an id has no catalogue definition.
    fn default() -> Self {
        WidgetSize::Medium
    }
}

impl fmt::Display for WidgetSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WidgetSize::Small => "small",
            WidgetSize::Medium => "medium",
            WidgetSize::Large => "large",
            WidgetSize::Wide => "wide",
            WidgetSize::Tall => "tall",
            WidgetSize::Full => "full",
        };
        write!(f, "{}", s)
    }
}

/// One resident widget in the layout: which widget, at what size.
///
/// `widget_id` references a [`WidgetDefinition`] by id but is allowed to
/// dangle — an id with no matching definition is skipped at render time,
/// never an error. The size is independently mutable and need not equal the
/// definition's default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutEntry {
    /// Stable widget identifier; `id` in the persisted format.
    #[serde(rename = "id")]
    pub widget_id: String,
    /// Current tile size for this entry.
    pub size: WidgetSize,
}

impl LayoutEntry {
    pub fn new(widget_id: impl Into<String>, size: WidgetSize) -> Self {
        Self {
            widget_id: widget_id.into(),
            size,
        }
    }
}

/// Transient per-widget load state. Not persisted; exists only while a fetch
/// has been issued for that id.
///
/// A record is superseded, not cleared, whenever a new fetch starts: the
/// previous `data`/`error` stay visible under `loading = true` until the new
/// fetch resolves.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WidgetRuntimeState {
    /// A fetch for this id is in flight.
    pub loading: bool,
    /// Opaque payload from the widget's last successful fetch.
    pub data: Option<serde_json::Value>,
    /// Message from the widget's last failed fetch.
    pub error: Option<String>,
}

impl WidgetRuntimeState {
    /// State at fetch issue time: loading, prior payload/error retained.
    pub(crate) fn begin(previous: Option<&WidgetRuntimeState>) -> Self {
        Self {
            loading: true,
            data: previous.and_then(|s| s.data.clone()),
            error: previous.and_then(|s| s.error.clone()),
        }
    }

    /// State after a successful resolution.
    pub(crate) fn ready(data: serde_json::Value) -> Self {
        Self {
            loading: false,
            data: Some(data),
            error: None,
        }
    }

    /// State after a failed resolution. `data` is left unset so stale
    /// content cannot render next to the error text.
    pub(crate) fn failed(message: String) -> Self {
        Self {
            loading: false,
            data: None,
            error: Some(message),
        }
    }

    /// The tri-state switch a host consults when rendering a tile.
    pub fn content(&self) -> ContentState<'_> {
        if let Some(msg) = &self.error {
            ContentState::Error(msg)
        } else if let Some(data) = &self.data {
            ContentState::Ready(data)
        } else {
            ContentState::Loading
        }
    }
}

/// What a tile should show: a spinner, an error message, or content.
///
/// When a widget's fetch failed, content must not be shown for it — only the
/// error text. Other widgets are unaffected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContentState<'a> {
    Loading,
    Error(&'a str),
    Ready(&'a serde_json::Value),
}

/// Errors surfaced by layout mutations.
///
/// This is the only store condition that reaches the user: everything else
/// (missing persisted layout, invalid drops, absent-id removals) is absorbed
/// silently per the dashboard's error contract.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// `add` was called for a widget already resident in the layout.
    #[error("Widget already on the dashboard: {0}")]
    DuplicateWidget(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn widget_size_serializes_lowercase() {
        let s = serde_json::to_string(&WidgetSize::Wide).expect("serialize");
        assert_eq!(s, "\"wide\"");
        let back: WidgetSize = serde_json::from_str("\"tall\"").expect("deserialize");
        assert_eq!(back, WidgetSize::Tall);
    }

    #[test]
    fn widget_size_display_matches_wire_form() {
        for (size, s) in [
            (WidgetSize::Small, "small"),
            (WidgetSize::Medium, "medium"),
            (WidgetSize::Large, "large"),
            (WidgetSize::Wide, "wide"),
            (WidgetSize::Tall, "tall"),
            (WidgetSize::Full, "full"),
        ] {
            assert_eq!(size.to_string(), s);
        }
    }

    #[test]
    fn layout_entry_uses_id_field_on_the_wire() {
        let entry = LayoutEntry::new("overview", WidgetSize::Wide);
        let json = serde_json::to_value(&entry).expect("serialize");
        assert_eq!(json, json!({"id": "overview", "size": "wide"}));
    }

    #[test]
    fn layout_entry_round_trips() {
        let entry = LayoutEntry::new("stockAlerts", WidgetSize::Medium);
        let blob = serde_json::to_string(&entry).expect("serialize");
        let back: LayoutEntry = serde_json::from_str(&blob).expect("deserialize");
        assert_eq!(back, entry);
    }

    #[test]
    fn runtime_state_begin_retains_previous_payload() {
        let prev = WidgetRuntimeState::ready(json!({"count": 3}));
        let state = WidgetRuntimeState::begin(Some(&prev));
        assert!(state.loading);
        assert_eq!(state.data, Some(json!({"count": 3})));
        assert!(state.error.is_none());
    }

    #[test]
    fn runtime_state_begin_without_history_is_bare_loading() {
        let state = WidgetRuntimeState::begin(None);
        assert!(state.loading);
        assert!(state.data.is_none());
        assert!(state.error.is_none());
    }

    #[test]
    fn runtime_state_failed_clears_data() {
        let state = WidgetRuntimeState::failed("boom".to_string());
        assert!(!state.loading);
        assert!(state.data.is_none());
        assert_eq!(state.error.as_deref(), Some("boom"));
    }

    #[test]
    fn content_state_error_wins_over_stale_data() {
        // A superseded record can briefly carry both; error must gate content.
        let state = WidgetRuntimeState {
            loading: true,
            data: Some(json!(1)),
            error: Some("down".to_string()),
        };
        assert_eq!(state.content(), ContentState::Error("down"));
    }

    #[test]
    fn content_state_loading_when_nothing_resolved() {
        let state = WidgetRuntimeState::begin(None);
        assert_eq!(state.content(), ContentState::Loading);
    }

    #[test]
    fn duplicate_error_display_names_the_widget() {
        let err = LayoutError::DuplicateWidget("overview".to_string());
        assert!(err.to_string().contains("overview"));
    }
}
