//! Layout store: the ordered widget selection, its persistence, and change
//! notifications.
//!
//! The store wraps the layout in `Arc<RwLock<_>>` for safe access from the
//! host and any background tasks, and carries a broadcast channel so the
//! data orchestrator can react to every layout mutation. Each mutating
//! operation persists the whole serialized sequence synchronously before
//! returning, then notifies subscribers; no-ops (duplicate add, invalid
//! drop, absent-id remove/resize) do neither.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};

use crate::registry::WidgetRegistry;
use crate::storage::LayoutStorage;
use crate::{LayoutEntry, LayoutError, WidgetSize};

/// Capacity of the change-notification channel. Generous for bursty edit
/// sessions; a lagged subscriber resynchronizes from the current layout.
const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Notification sent after every layout mutation.
///
/// Carries the resident id set as a single unit: any mutation — add, remove,
/// resize or reorder — produces one message, even when membership did not
/// change. Subscribers re-fetch every listed id (full-reload semantics).
#[derive(Debug, Clone)]
pub struct LayoutChanged {
    /// Unique widget ids resident in the layout at mutation time, in order.
    pub ids: Vec<String>,
}

/// The documented default layout: nine entries used whenever no valid
/// persisted layout exists.
pub fn default_layout() -> Vec<LayoutEntry> {
    vec![
        LayoutEntry::new("overview", WidgetSize::Wide),
        LayoutEntry::new("measureStatus", WidgetSize::Small),
        LayoutEntry::new("productionStatus", WidgetSize::Small),
        LayoutEntry::new("assemblyStatus", WidgetSize::Small),
        LayoutEntry::new("tasksSummary", WidgetSize::Small),
        LayoutEntry::new("stockAlerts", WidgetSize::Medium),
        LayoutEntry::new("weeklySummary", WidgetSize::Medium),
        LayoutEntry::new("financialSummary", WidgetSize::Medium),
        LayoutEntry::new("recentActivities", WidgetSize::Large),
    ]
}

/// Thread-safe store for the dashboard layout.
///
/// Invariant: no two entries share a `widget_id`. The invariant is enforced
/// on load (first occurrence wins) and by every mutation.
///
/// # Example
///
/// ```
/// use ops_dashboard::storage::MemoryStorage;
/// use ops_dashboard::{LayoutStore, WidgetRegistry};
///
/// #[tokio::main]
/// async fn main() {
///     let store = LayoutStore::new(WidgetRegistry::new(), Box::new(MemoryStorage::new()));
///     assert_eq!(store.len().await, 9); // default layout
///     store.remove("overview").await;
///     assert_eq!(store.len().await, 8);
/// }
/// ```
#[derive(Clone)]
pub struct LayoutStore {
    inner: Arc<Inner>,
}

struct Inner {
    entries: RwLock<Vec<LayoutEntry>>,
    storage: Box<dyn LayoutStorage>,
    registry: WidgetRegistry,
    change_tx: broadcast::Sender<LayoutChanged>,
}

impl std::fmt::Debug for LayoutStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutStore")
            .field("subscriber_count", &self.inner.change_tx.receiver_count())
            .finish()
    }
}

impl LayoutStore {
    /// Creates a store, loading the layout from the injected storage port.
    ///
    /// A missing or malformed blob silently becomes the default layout; that
    /// recovery is never surfaced.
    pub fn new(registry: WidgetRegistry, storage: Box<dyn LayoutStorage>) -> Self {
        let entries = load_or_default(storage.as_ref());
        let (change_tx, _rx) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                entries: RwLock::new(entries),
                storage,
                registry,
                change_tx,
            }),
        }
    }

    /// Subscribes to layout change notifications.
    ///
    /// Every mutation produces one [`LayoutChanged`] carrying the resident
    /// id set at that moment.
    pub fn subscribe(&self) -> broadcast::Receiver<LayoutChanged> {
        self.inner.change_tx.subscribe()
    }

    /// Appends a widget at the end of the layout, sized by its catalogue
    /// default.
    ///
    /// Returns [`LayoutError::DuplicateWidget`] — the one store condition
    /// shown to the user — when the id is already resident; the layout is
    /// left pointwise unchanged and nothing is persisted or broadcast.
    pub async fn add(&self, widget_id: &str) -> Result<(), LayoutError> {
        let mut entries = self.inner.entries.write().await;
        if entries.iter().any(|e| e.widget_id == widget_id) {
            return Err(LayoutError::DuplicateWidget(widget_id.to_string()));
        }
        let size = self.inner.registry.default_size(widget_id);
        entries.push(LayoutEntry::new(widget_id, size));
        self.persist_and_notify(&entries);
        Ok(())
    }

    /// Removes the entry for `widget_id`; silent no-op when absent.
    pub async fn remove(&self, widget_id: &str) {
        let mut entries = self.inner.entries.write().await;
        let before = entries.len();
        entries.retain(|e| e.widget_id != widget_id);
        if entries.len() == before {
            return;
        }
        self.persist_and_notify(&entries);
    }

    /// Updates the size of the entry for `widget_id` in place; silent no-op
    /// when absent. A resize broadcasts even though membership is unchanged.
    pub async fn resize(&self, widget_id: &str, size: WidgetSize) {
        let mut entries = self.inner.entries.write().await;
        let Some(entry) = entries.iter_mut().find(|e| e.widget_id == widget_id) else {
            return;
        };
        entry.size = size;
        self.persist_and_notify(&entries);
    }

    /// Moves the `dragged` entry to the position currently occupied by
    /// `target`, so it ends up immediately before the (shifted) target.
    ///
    /// Invalid drops — identical ids, or either id absent — are silently
    /// ignored and the layout is unchanged.
    pub async fn reorder(&self, dragged: &str, target: &str) {
        if dragged == target {
            return;
        }
        let mut entries = self.inner.entries.write().await;
        let Some(from) = entries.iter().position(|e| e.widget_id == dragged) else {
            return;
        };
        if !entries.iter().any(|e| e.widget_id == target) {
            return;
        }
        let moved = entries.remove(from);
        // The target's index after removal is where the dragged entry lands.
        let to = entries
            .iter()
            .position(|e| e.widget_id == target)
            .expect("target present under write lock");
        entries.insert(to, moved);
        self.persist_and_notify(&entries);
    }

    /// Replaces the whole sequence with the default layout.
    pub async fn reset(&self) {
        let mut entries = self.inner.entries.write().await;
        *entries = default_layout();
        self.persist_and_notify(&entries);
    }

    /// A snapshot of the current layout, in render order.
    pub async fn entries(&self) -> Vec<LayoutEntry> {
        self.inner.entries.read().await.clone()
    }

    /// The resident widget ids, in layout order.
    pub async fn resident_ids(&self) -> Vec<String> {
        self.inner
            .entries
            .read()
            .await
            .iter()
            .map(|e| e.widget_id.clone())
            .collect()
    }

    /// Whether `widget_id` is resident in the layout.
    pub async fn contains(&self, widget_id: &str) -> bool {
        self.inner
            .entries
            .read()
            .await
            .iter()
            .any(|e| e.widget_id == widget_id)
    }

    /// Number of resident widgets.
    pub async fn len(&self) -> usize {
        self.inner.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.entries.read().await.is_empty()
    }

    /// Persist the full sequence, then notify subscribers. Called with the
    /// write lock held so the saved blob and the broadcast id set can never
    /// interleave with another mutation.
    fn persist_and_notify(&self, entries: &[LayoutEntry]) {
        match serde_json::to_string(entries) {
            Ok(blob) => {
                if let Err(e) = self.inner.storage.store(&blob) {
                    tracing::warn!("Failed to persist layout: {}", e);
                }
            }
            Err(e) => {
                tracing::warn!("Failed to serialize layout: {}", e);
            }
        }
        let change = LayoutChanged {
            ids: entries.iter().map(|e| e.widget_id.clone()).collect(),
        };
        match self.inner.change_tx.send(change) {
            Ok(count) => {
                tracing::trace!("Layout change sent to {} subscribers", count);
            }
            Err(_) => {
                tracing::debug!("No subscribers for layout change broadcast");
            }
        }
    }
}

/// Deserialize the saved layout, falling back to the default on any trouble.
fn load_or_default(storage: &dyn LayoutStorage) -> Vec<LayoutEntry> {
    let Some(blob) = storage.load() else {
        tracing::debug!("No saved layout, using default");
        return default_layout();
    };
    match serde_json::from_str::<Vec<LayoutEntry>>(&blob) {
        Ok(entries) => dedup_entries(entries),
        Err(e) => {
            tracing::debug!("Malformed saved layout ({}), using default", e);
            default_layout()
        }
    }
}

/// Drops later duplicates so the uniqueness invariant holds from
/// construction, even for a hand-edited blob.
fn dedup_entries(entries: Vec<LayoutEntry>) -> Vec<LayoutEntry> {
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter(|e| seen.insert(e.widget_id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use std::sync::Arc as StdArc;

    fn test_store() -> LayoutStore {
        LayoutStore::new(WidgetRegistry::new(), Box::new(MemoryStorage::new()))
    }

    /// Store plus a handle on its storage slot, to inspect persisted blobs.
    fn test_store_with_slot() -> (LayoutStore, StdArc<MemoryStorage>) {
        let slot = StdArc::new(MemoryStorage::new());
        let store = LayoutStore::new(WidgetRegistry::new(), Box::new(SharedSlot(slot.clone())));
        (store, slot)
    }

    struct SharedSlot(StdArc<MemoryStorage>);

    impl LayoutStorage for SharedSlot {
        fn load(&self) -> Option<String> {
            self.0.load()
        }
        fn store(&self, blob: &str) -> Result<(), crate::storage::StorageError> {
            self.0.store(blob)
        }
    }

    async fn ids(store: &LayoutStore) -> Vec<String> {
        store.resident_ids().await
    }

    #[tokio::test]
    async fn empty_storage_yields_default_layout() {
        let store = test_store();
        assert_eq!(store.entries().await, default_layout());
    }

    #[tokio::test]
    async fn malformed_storage_yields_default_layout() {
        let storage = MemoryStorage::with_blob("not json at all {{{");
        let store = LayoutStore::new(WidgetRegistry::new(), Box::new(storage));
        assert_eq!(store.entries().await, default_layout());
    }

    #[tokio::test]
    async fn valid_storage_round_trips_exactly() {
        let saved = vec![
            LayoutEntry::new("overview", WidgetSize::Full),
            LayoutEntry::new("stockAlerts", WidgetSize::Small),
        ];
        let blob = serde_json::to_string(&saved).expect("serialize");
        let store = LayoutStore::new(WidgetRegistry::new(), Box::new(MemoryStorage::with_blob(blob)));
        assert_eq!(store.entries().await, saved);
    }

    #[tokio::test]
    async fn duplicate_ids_in_saved_blob_keep_first_occurrence() {
        let blob = r#"[
            {"id": "overview", "size": "wide"},
            {"id": "tasksSummary", "size": "small"},
            {"id": "overview", "size": "large"}
        ]"#;
        let store = LayoutStore::new(WidgetRegistry::new(), Box::new(MemoryStorage::with_blob(blob)));
        let entries = store.entries().await;
        assert_eq!(ids(&store).await, vec!["overview", "tasksSummary"]);
        assert_eq!(entries[0].size, WidgetSize::Wide);
    }

    #[tokio::test]
    async fn add_appends_with_registry_default_size() {
        let store = test_store();
        store.reset().await;
        store.remove("recentActivities").await;
        store.add("recentActivities").await.expect("add");
        let entries = store.entries().await;
        let last = entries.last().expect("non-empty");
        assert_eq!(last.widget_id, "recentActivities");
        assert_eq!(last.size, WidgetSize::Large);
    }

    #[tokio::test]
    async fn add_duplicate_errors_and_leaves_layout_unchanged() {
        let store = test_store();
        let before = store.entries().await;
        let err = store.add("overview").await.expect_err("duplicate");
        assert_eq!(err, LayoutError::DuplicateWidget("overview".to_string()));
        assert_eq!(store.entries().await, before);
    }

    #[tokio::test]
    async fn add_unknown_id_falls_back_to_medium() {
        let store = test_store();
        store.add("ghostWidget").await.expect("add");
        let entries = store.entries().await;
        let last = entries.last().expect("non-empty");
        assert_eq!(last.widget_id, "ghostWidget");
        assert_eq!(last.size, WidgetSize::Medium);
    }

    #[tokio::test]
    async fn remove_deletes_matching_entry() {
        let store = test_store();
        store.remove("overview").await;
        assert!(!store.contains("overview").await);
        assert_eq!(store.len().await, 8);
    }

    #[tokio::test]
    async fn remove_absent_id_is_a_silent_noop() {
        let store = test_store();
        let before = store.entries().await;
        store.remove("nonexistent").await;
        assert_eq!(store.entries().await, before);
    }

    #[tokio::test]
    async fn resize_updates_size_in_place() {
        let store = test_store();
        store.resize("overview", WidgetSize::Large).await;
        let entries = store.entries().await;
        assert_eq!(entries[0].widget_id, "overview");
        assert_eq!(entries[0].size, WidgetSize::Large);
        // Everything else untouched.
        assert_eq!(entries[1..], default_layout()[1..]);
    }

    #[tokio::test]
    async fn resize_absent_id_is_a_silent_noop() {
        let store = test_store();
        let before = store.entries().await;
        store.resize("nonexistent", WidgetSize::Full).await;
        assert_eq!(store.entries().await, before);
    }

    #[tokio::test]
    async fn reorder_moves_dragged_before_target() {
        let blob = serde_json::to_string(&vec![
            LayoutEntry::new("A", WidgetSize::Small),
            LayoutEntry::new("B", WidgetSize::Small),
            LayoutEntry::new("C", WidgetSize::Small),
        ])
        .expect("serialize");
        let store = LayoutStore::new(WidgetRegistry::new(), Box::new(MemoryStorage::with_blob(blob)));
        store.reorder("C", "A").await;
        assert_eq!(ids(&store).await, vec!["C", "A", "B"]);
    }

    #[tokio::test]
    async fn reorder_forward_lands_before_shifted_target() {
        let blob = serde_json::to_string(&vec![
            LayoutEntry::new("A", WidgetSize::Small),
            LayoutEntry::new("B", WidgetSize::Small),
            LayoutEntry::new("C", WidgetSize::Small),
            LayoutEntry::new("D", WidgetSize::Small),
        ])
        .expect("serialize");
        let store = LayoutStore::new(WidgetRegistry::new(), Box::new(MemoryStorage::with_blob(blob)));
        store.reorder("A", "C").await;
        assert_eq!(ids(&store).await, vec!["B", "A", "C", "D"]);
    }

    #[tokio::test]
    async fn reorder_same_id_is_a_silent_noop() {
        let store = test_store();
        let before = store.entries().await;
        store.reorder("overview", "overview").await;
        assert_eq!(store.entries().await, before);
    }

    #[tokio::test]
    async fn reorder_with_absent_id_is_a_silent_noop() {
        let store = test_store();
        let before = store.entries().await;
        store.reorder("nonexistent", "overview").await;
        store.reorder("overview", "nonexistent").await;
        assert_eq!(store.entries().await, before);
    }

    #[tokio::test]
    async fn reset_restores_the_nine_default_entries() {
        let store = test_store();
        store.remove("overview").await;
        store.resize("stockAlerts", WidgetSize::Full).await;
        store.reset().await;
        assert_eq!(store.entries().await, default_layout());
        assert_eq!(store.len().await, 9);
    }

    #[tokio::test]
    async fn every_mutation_persists_before_returning() {
        let (store, slot) = test_store_with_slot();

        store.remove("overview").await;
        let saved: Vec<LayoutEntry> =
            serde_json::from_str(&slot.load().expect("persisted")).expect("parse");
        assert_eq!(saved, store.entries().await);

        store.resize("stockAlerts", WidgetSize::Tall).await;
        let saved: Vec<LayoutEntry> =
            serde_json::from_str(&slot.load().expect("persisted")).expect("parse");
        assert_eq!(saved, store.entries().await);

        store.reorder("tasksSummary", "measureStatus").await;
        let saved: Vec<LayoutEntry> =
            serde_json::from_str(&slot.load().expect("persisted")).expect("parse");
        assert_eq!(saved, store.entries().await);
    }

    #[tokio::test]
    async fn noop_mutations_do_not_persist() {
        let (store, slot) = test_store_with_slot();
        let _ = store.add("overview").await; // duplicate
        store.remove("nonexistent").await;
        store.reorder("overview", "overview").await;
        assert!(slot.load().is_none(), "no-ops must not write the slot");
    }

    #[tokio::test]
    async fn persisted_layout_reloads_element_for_element() {
        let (store, slot) = test_store_with_slot();
        store.resize("overview", WidgetSize::Full).await;
        store.remove("weeklySummary").await;
        let expected = store.entries().await;

        let reloaded = LayoutStore::new(
            WidgetRegistry::new(),
            Box::new(MemoryStorage::with_blob(slot.load().expect("persisted"))),
        );
        assert_eq!(reloaded.entries().await, expected);
    }

    #[tokio::test]
    async fn mutations_broadcast_the_resident_id_set() {
        let store = test_store();
        let mut rx = store.subscribe();

        store.remove("overview").await;
        let change = rx.recv().await.expect("change");
        assert!(!change.ids.contains(&"overview".to_string()));
        assert_eq!(change.ids.len(), 8);

        // Resize changes no membership but still broadcasts.
        store.resize("stockAlerts", WidgetSize::Full).await;
        let change = rx.recv().await.expect("change");
        assert_eq!(change.ids.len(), 8);
    }

    #[tokio::test]
    async fn noop_mutations_do_not_broadcast() {
        let store = test_store();
        let mut rx = store.subscribe();
        let _ = store.add("overview").await;
        store.reorder("overview", "overview").await;
        store.remove("nonexistent").await;
        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn uniqueness_invariant_holds_under_mixed_operations() {
        let store = test_store();
        let _ = store.add("overview").await;
        store.remove("stockAlerts").await;
        let _ = store.add("stockAlerts").await;
        let _ = store.add("stockAlerts").await;
        store.reorder("stockAlerts", "overview").await;
        store.resize("overview", WidgetSize::Tall).await;
        store.reorder("tasksSummary", "recentActivities").await;

        let all = ids(&store).await;
        let unique: HashSet<_> = all.iter().collect();
        assert_eq!(unique.len(), all.len(), "duplicate widget id in layout");
    }

    #[tokio::test]
    async fn clone_shares_state() {
        let store = test_store();
        let cloned = store.clone();
        store.remove("overview").await;
        assert!(!cloned.contains("overview").await);
    }
}
