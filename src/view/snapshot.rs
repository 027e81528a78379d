use std::collections::HashSet;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

use super::ViewFlags;
use crate::comparator::Comparator;
use crate::state::CollectionState;

/// Immutable view of a collection at one point in time.
pub struct CollectionSnapshot<T> {
    state: CollectionState<T>,
    comparator: Comparator<T>,
}

impl<T> Clone for CollectionSnapshot<T> {
    fn clone(&self) -> Self {
        CollectionSnapshot {
            state: self.state.clone(),
            comparator: self.comparator.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for CollectionSnapshot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionSnapshot")
            .field("items", &self.state.items)
            .field("total_count_fetched", &self.state.total_count_fetched)
            .field("lifecycle", &self.state.lifecycle)
            .finish_non_exhaustive()
    }
}

impl<T> CollectionSnapshot<T> {
    pub(crate) fn new(state: CollectionState<T>, comparator: Comparator<T>) -> Self {
        CollectionSnapshot { state, comparator }
    }

    pub fn items(&self) -> &[T] {
        &self.state.items
    }

    pub fn len(&self) -> usize {
        self.state.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.items.is_empty()
    }

    pub fn total_count_fetched(&self) -> Option<u64> {
        self.state.total_count_fetched
    }

    pub fn is_creating(&self) -> bool {
        self.state.lifecycle.is_creating()
    }

    pub fn is_reading(&self) -> bool {
        self.state.lifecycle.is_reading()
    }

    pub fn is_updating(&self) -> bool {
        self.state.lifecycle.is_updating()
    }

    pub fn is_deleting(&self) -> bool {
        self.state.lifecycle.is_deleting()
    }

    pub fn is_refreshing(&self) -> bool {
        self.state.lifecycle.is_refreshing()
    }

    pub fn is_saving(&self) -> bool {
        self.state.lifecycle.is_saving()
    }

    pub fn is_mutating(&self) -> bool {
        self.state.lifecycle.is_mutating()
    }

    pub fn is_processing(&self) -> bool {
        self.state.lifecycle.is_processing()
    }

    pub fn updating_items(&self) -> &[T] {
        self.state.lifecycle.updating()
    }

    pub fn deleting_items(&self) -> &[T] {
        self.state.lifecycle.deleting()
    }

    pub fn refreshing_items(&self) -> &[T] {
        self.state.lifecycle.refreshing()
    }

    pub fn unique_status(&self, status: &str) -> Option<&T> {
        self.state.unique_statuses.get(status)
    }

    pub fn flags(&self) -> ViewFlags {
        let lifecycle = &self.state.lifecycle;
        ViewFlags {
            len: self.len(),
            total_count_fetched: self.total_count_fetched(),
            is_creating: lifecycle.is_creating(),
            is_reading: lifecycle.is_reading(),
            is_updating: lifecycle.is_updating(),
            is_deleting: lifecycle.is_deleting(),
            is_refreshing: lifecycle.is_refreshing(),
            is_saving: lifecycle.is_saving(),
            is_mutating: lifecycle.is_mutating(),
            is_processing: lifecycle.is_processing(),
        }
    }
}

impl<T: Serialize + Clone> CollectionSnapshot<T> {
    pub fn is_item_updating(&self, item: &T) -> bool {
        self.state.lifecycle.is_item_updating(item, &self.comparator)
    }

    pub fn is_item_deleting(&self, item: &T) -> bool {
        self.state.lifecycle.is_item_deleting(item, &self.comparator)
    }

    pub fn is_item_refreshing(&self, item: &T) -> bool {
        self.state.lifecycle.is_item_refreshing(item, &self.comparator)
    }

    pub fn is_item_mutating(&self, item: &T) -> bool {
        self.state.lifecycle.is_item_mutating(item, &self.comparator)
    }

    pub fn is_item_processing(&self, item: &T) -> bool {
        self.state.lifecycle.is_item_processing(item, &self.comparator)
    }

    /// Statuses set on `item`, empty when it has none.
    pub fn item_statuses(&self, item: &T) -> HashSet<String> {
        self.state
            .item_statuses
            .iter()
            .find(|(holder, _)| self.comparator.equal(holder, item))
            .map(|(_, statuses)| statuses.clone())
            .unwrap_or_default()
    }

    pub fn has_unique_status(&self, status: &str, item: &T) -> bool {
        self.unique_status(status)
            .is_some_and(|holder| self.comparator.equal(holder, item))
    }

    /// The held item matching `descriptor`.
    pub fn get_item(&self, descriptor: &T) -> Option<&T> {
        self.comparator
            .position(descriptor, &self.state.items)
            .map(|index| &self.state.items[index])
    }

    /// First held item whose serialized `field` equals `value`.
    pub fn get_item_by_field(&self, field: &str, value: &Value) -> Option<&T> {
        self.state.items.iter().find(|item| {
            serde_json::to_value(item)
                .ok()
                .is_some_and(|serialized| serialized.get(field) == Some(value))
        })
    }
}
