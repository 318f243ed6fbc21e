//! The ordered layout model and its store.
//!
//! The layout is the user's ordered, persisted selection of widgets with a
//! per-widget size. All mutation goes through [`LayoutStore`]; nothing else
//! assigns the sequence directly.

mod store;

pub use store::{default_layout, LayoutChanged, LayoutStore};
