//! Static widget catalogue.
//!
//! The registry is the immutable list of widget kinds the dashboard knows
//! about: id, title, icon, category, default size, color tag and
//! description. It is defined once at construction and never mutated — a
//! pure lookup surface with no failure modes.
//!
//! Declaration order is significant: it is the order the picker presents
//! catalogue entries in, regardless of category filtering.

use std::fmt;

use crate::WidgetSize;

/// Immutable catalogue metadata for one widget kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetDefinition {
    /// Stable string key; referenced by layout entries and the fetch table.
    pub id: &'static str,
    /// Human-readable title shown in the tile header and the picker.
    pub title: &'static str,
    /// Icon name for the tile header and picker row.
    pub icon: &'static str,
    /// Catalogue category for picker filtering.
    pub category: WidgetCategory,
    /// Tile size used when the widget is first added.
    pub default_size: WidgetSize,
    /// Accent color tag for the tile chrome.
    pub color: &'static str,
    /// One-line description shown in the picker.
    pub description: &'static str,
}

/// Picker filter categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetCategory {
    General,
    Production,
    Tasks,
    Inventory,
    Finance,
    Activity,
}

impl fmt::Display for WidgetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WidgetCategory::General => "general",
            WidgetCategory::Production => "production",
            WidgetCategory::Tasks => "tasks",
            WidgetCategory::Inventory => "inventory",
            WidgetCategory::Finance => "finance",
            WidgetCategory::Activity => "activity",
        };
        write!(f, "{}", s)
    }
}

/// Category filter for catalogue listings: everything, or one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryFilter {
    /// The "all" sentinel: every definition, unfiltered.
    All,
    /// Only definitions in the given category.
    Only(WidgetCategory),
}

impl CategoryFilter {
    fn matches(self, category: WidgetCategory) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(c) => c == category,
        }
    }
}

/// All categories, in the order the picker's filter chips show them.
const CATEGORIES: &[WidgetCategory] = &[
    WidgetCategory::General,
    WidgetCategory::Production,
    WidgetCategory::Tasks,
    WidgetCategory::Inventory,
    WidgetCategory::Finance,
    WidgetCategory::Activity,
];

/// The fixed widget catalogue.
///
/// # Example
///
/// ```
/// use ops_dashboard::{CategoryFilter, WidgetRegistry};
///
/// let registry = WidgetRegistry::new();
/// assert!(registry.lookup("overview").is_some());
/// assert!(registry.lookup("nonexistent").is_none());
/// let all = registry.list_by_category(CategoryFilter::All);
/// assert_eq!(all.len(), 9);
/// ```
#[derive(Debug, Clone)]
pub struct WidgetRegistry {
    definitions: Vec<WidgetDefinition>,
}

impl WidgetRegistry {
    /// Builds the catalogue with the built-in widget definitions.
    pub fn new() -> Self {
        let definitions = vec![
            WidgetDefinition {
                id: "overview",
                title: "Plant Overview",
                icon: "layout-grid",
                category: WidgetCategory::General,
                default_size: WidgetSize::Wide,
                color: "blue",
                description: "Key figures across the whole plant at a glance",
            },
            WidgetDefinition {
                id: "measureStatus",
                title: "Measurement Status",
                icon: "gauge",
                category: WidgetCategory::Production,
                default_size: WidgetSize::Small,
                color: "teal",
                description: "Open and completed measurement orders",
            },
            WidgetDefinition {
                id: "productionStatus",
                title: "Production Status",
                icon: "factory",
                category: WidgetCategory::Production,
                default_size: WidgetSize::Small,
                color: "indigo",
                description: "Running and queued production orders",
            },
            WidgetDefinition {
                id: "assemblyStatus",
                title: "Assembly Status",
                icon: "wrench",
                category: WidgetCategory::Production,
                default_size: WidgetSize::Small,
                color: "cyan",
                description: "Assembly line progress and blockers",
            },
            WidgetDefinition {
                id: "tasksSummary",
                title: "Task Summary",
                icon: "check-square",
                category: WidgetCategory::Tasks,
                default_size: WidgetSize::Small,
                color: "green",
                description: "Open, overdue and recently completed tasks",
            },
            WidgetDefinition {
                id: "stockAlerts",
                title: "Stock Alerts",
                icon: "alert-triangle",
                category: WidgetCategory::Inventory,
                default_size: WidgetSize::Medium,
                color: "amber",
                description: "Materials at or below their reorder level",
            },
            WidgetDefinition {
                id: "weeklySummary",
                title: "Weekly Summary",
                icon: "calendar",
                category: WidgetCategory::General,
                default_size: WidgetSize::Medium,
                color: "violet",
                description: "This week's output compared to plan",
            },
            WidgetDefinition {
                id: "financialSummary",
                title: "Financial Summary",
                icon: "dollar-sign",
                category: WidgetCategory::Finance,
                default_size: WidgetSize::Medium,
                color: "emerald",
                description: "Revenue, costs and margin for the period",
            },
            WidgetDefinition {
                id: "recentActivities",
                title: "Recent Activities",
                icon: "activity",
                category: WidgetCategory::Activity,
                default_size: WidgetSize::Large,
                color: "slate",
                description: "Latest bookings, status changes and sign-offs",
            },
        ];
        Self { definitions }
    }

    /// Look up a definition by id.
    pub fn lookup(&self, id: &str) -> Option<&WidgetDefinition> {
        self.definitions.iter().find(|d| d.id == id)
    }

    /// Whether the catalogue has a definition for `id`.
    pub fn contains(&self, id: &str) -> bool {
        self.lookup(id).is_some()
    }

    /// List definitions matching the filter, in declaration order.
    pub fn list_by_category(&self, filter: CategoryFilter) -> Vec<&WidgetDefinition> {
        self.definitions
            .iter()
            .filter(|d| filter.matches(d.category))
            .collect()
    }

    /// All definitions, in declaration order.
    pub fn definitions(&self) -> &[WidgetDefinition] {
        &self.definitions
    }

    /// The category list for the picker's filter chips.
    pub fn categories(&self) -> &'static [WidgetCategory] {
        CATEGORIES
    }

    /// Default size for an id, falling back for dangling references.
    pub fn default_size(&self, id: &str) -> WidgetSize {
        self.lookup(id).map(|d| d.default_size).unwrap_or_default()
    }
}

impl Default for WidgetRegistry {
    fn default() -> Self {
        Self::new()
    }
}
