//! Read-only views over collection state.
//!
//! [`CollectionSnapshot`] is the single canonical view. The pull surface is
//! `Collection::snapshot`, the push surface is `Collection::changes`, and
//! both hand out the same snapshot type; neither owns any state.

mod snapshot;

use serde::{Deserialize, Serialize};

pub use snapshot::CollectionSnapshot;

/// Flat busy/size summary of a snapshot, for UI bindings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewFlags {
    pub len: usize,
    pub total_count_fetched: Option<u64>,
    pub is_creating: bool,
    pub is_reading: bool,
    pub is_updating: bool,
    pub is_deleting: bool,
    pub is_refreshing: bool,
    pub is_saving: bool,
    pub is_mutating: bool,
    pub is_processing: bool,
}
