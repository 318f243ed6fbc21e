//! Catalogue derivation for the "add widget" picker.
//!
//! The picker list is a pure function of the registry, a category filter and
//! the current layout's id set: catalogue entries in declaration order, each
//! annotated with whether it is already on the dashboard. [`select`] is the
//! picker's commit path — selecting an already-active entry is ignored,
//! anything else appends the widget to the layout.

use std::collections::HashSet;

use crate::layout::LayoutStore;
use crate::registry::{CategoryFilter, WidgetDefinition, WidgetRegistry};
use crate::LayoutError;

/// One picker row: a catalogue entry plus its residency flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerEntry<'a> {
    pub definition: &'a WidgetDefinition,
    /// Whether the widget is already on the dashboard. Active entries are
    /// rendered disabled and selecting them does nothing.
    pub already_active: bool,
}

/// Derives the picker list: filtered by category (or all), catalogue order,
/// annotated against the given resident id set.
pub fn picker_entries<'a>(
    registry: &'a WidgetRegistry,
    filter: CategoryFilter,
    active_ids: &HashSet<String>,
) -> Vec<PickerEntry<'a>> {
    registry
        .list_by_category(filter)
        .into_iter()
        .map(|definition| PickerEntry {
            already_active: active_ids.contains(definition.id),
            definition,
        })
        .collect()
}

/// Commits a picker selection.
///
/// Returns `Ok(false)` without touching the layout when the widget is
/// already resident (the selection is ignored) and `Ok(true)` after a
/// successful add; the host closes the picker on `Ok(true)`. The
/// [`LayoutError::DuplicateWidget`] branch is only reachable when a second
/// writer races the residency check.
pub async fn select(store: &LayoutStore, widget_id: &str) -> Result<bool, LayoutError> {
    if store.contains(widget_id).await {
        return Ok(false);
    }
    store.add(widget_id).await?;
    Ok(true)
}
