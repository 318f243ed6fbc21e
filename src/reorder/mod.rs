//! Drag-based reordering as a three-message protocol.
//!
//! The controller translates a pointer drag into exactly one layout
//! mutation: `begin_drag` and `hover_over` only record advisory state for
//! visual feedback, and `drop` delegates once to
//! [`LayoutStore::reorder`](crate::LayoutStore::reorder). The protocol is
//! independent of any platform drag API, so tests drive it with direct
//! calls.
//!
//! Edit-mode gating belongs to the host: construct the controller when edit
//! mode turns on and drop it when it turns off. Outside edit mode no drag
//! input is wired at all, so no drag affordance can appear.

use crate::layout::LayoutStore;

/// Translates a drag gesture into one `reorder` per completed drop.
#[derive(Debug)]
pub struct DragReorderController {
    store: LayoutStore,
    dragging: Option<String>,
    hover: Option<String>,
}

impl DragReorderController {
    pub fn new(store: LayoutStore) -> Self {
        Self {
            store,
            dragging: None,
            hover: None,
        }
    }

    /// Marks `widget_id` as the carried entry. Advisory only; no mutation.
    pub fn begin_drag(&mut self, widget_id: &str) {
        self.dragging = Some(widget_id.to_string());
        self.hover = None;
    }

    /// Records the prospective drop target. Advisory only; no mutation.
    pub fn hover_over(&mut self, widget_id: &str) {
        self.hover = Some(widget_id.to_string());
    }

    /// Completes the drag: clears advisory state and delegates exactly once
    /// to the store's reorder. Invalid drops are the store's silent no-op.
    pub async fn drop(&mut self, dragged: &str, target: &str) {
        self.dragging = None;
        self.hover = None;
        self.store.reorder(dragged, target).await;
    }

    /// Abandons the drag without mutating the layout (pointer left the
    /// grid, or edit mode ended mid-drag).
    pub fn cancel(&mut self) {
        self.dragging = None;
        self.hover = None;
    }

    /// Currently carried widget id, if a drag is in progress.
    pub fn dragging(&self) -> Option<&str> {
        self.dragging.as_deref()
    }

    /// Current drop-target candidate, for highlight affordances.
    pub fn hover_target(&self) -> Option<&str> {
        self.hover.as_deref()
    }
}
