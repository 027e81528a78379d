//! Busy-state bookkeeping for in-flight operations.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::comparator::Comparator;

/// Kinds of operations whose progress is tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
    Refresh,
}

impl Operation {
    pub fn name(self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::Refresh => "refresh",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Busy markers for one collection.
///
/// Create and read are counted so overlapping operations keep the flag raised
/// until the last one finishes. Item sets are deduplicated by comparator.
#[derive(Debug)]
pub struct Lifecycle<T> {
    creating: usize,
    reading: usize,
    updating: Arc<Vec<T>>,
    deleting: Arc<Vec<T>>,
    refreshing: Arc<Vec<T>>,
}

impl<T> Clone for Lifecycle<T> {
    fn clone(&self) -> Self {
        Lifecycle {
            creating: self.creating,
            reading: self.reading,
            updating: Arc::clone(&self.updating),
            deleting: Arc::clone(&self.deleting),
            refreshing: Arc::clone(&self.refreshing),
        }
    }
}

impl<T> Default for Lifecycle<T> {
    fn default() -> Self {
        Lifecycle {
            creating: 0,
            reading: 0,
            updating: Arc::new(Vec::new()),
            deleting: Arc::new(Vec::new()),
            refreshing: Arc::new(Vec::new()),
        }
    }
}

impl<T> Lifecycle<T> {
    pub fn is_creating(&self) -> bool {
        self.creating > 0
    }

    pub fn is_reading(&self) -> bool {
        self.reading > 0
    }

    pub fn updating(&self) -> &[T] {
        &self.updating
    }

    pub fn deleting(&self) -> &[T] {
        &self.deleting
    }

    pub fn refreshing(&self) -> &[T] {
        &self.refreshing
    }

    pub fn is_updating(&self) -> bool {
        !self.updating.is_empty()
    }

    pub fn is_deleting(&self) -> bool {
        !self.deleting.is_empty()
    }

    pub fn is_refreshing(&self) -> bool {
        !self.refreshing.is_empty()
    }

    pub fn is_saving(&self) -> bool {
        self.is_creating() || self.is_updating()
    }

    pub fn is_mutating(&self) -> bool {
        self.is_saving() || self.is_deleting()
    }

    pub fn is_processing(&self) -> bool {
        self.is_mutating() || self.is_reading() || self.is_refreshing()
    }

    fn items_mut(&mut self, operation: Operation) -> Option<&mut Arc<Vec<T>>> {
        match operation {
            Operation::Create | Operation::Read => None,
            Operation::Update => Some(&mut self.updating),
            Operation::Delete => Some(&mut self.deleting),
            Operation::Refresh => Some(&mut self.refreshing),
        }
    }
}

impl<T: Serialize + Clone> Lifecycle<T> {
    /// Marks `items` (or the whole collection) as busy with `operation`.
    pub fn mark(&mut self, operation: Operation, items: &[T], comparator: &Comparator<T>) {
        match operation {
            Operation::Create => self.creating += 1,
            Operation::Read => self.reading += 1,
            _ => {
                if let Some(set) = self.items_mut(operation) {
                    *set = Arc::new(comparator.union(set.as_slice(), items));
                }
            }
        }
    }

    /// Removes every comparator match of `items` from the busy set.
    pub fn clear(&mut self, operation: Operation, items: &[T], comparator: &Comparator<T>) {
        match operation {
            Operation::Create => self.creating = self.creating.saturating_sub(1),
            Operation::Read => self.reading = self.reading.saturating_sub(1),
            _ => {
                if let Some(set) = self.items_mut(operation) {
                    if !set.is_empty() {
                        *set = Arc::new(comparator.without(set.as_slice(), items));
                    }
                }
            }
        }
    }

    pub fn is_item_updating(&self, item: &T, comparator: &Comparator<T>) -> bool {
        comparator.has_item_in(item, &self.updating)
    }

    pub fn is_item_deleting(&self, item: &T, comparator: &Comparator<T>) -> bool {
        comparator.has_item_in(item, &self.deleting)
    }

    pub fn is_item_refreshing(&self, item: &T, comparator: &Comparator<T>) -> bool {
        comparator.has_item_in(item, &self.refreshing)
    }

    pub fn is_item_mutating(&self, item: &T, comparator: &Comparator<T>) -> bool {
        self.is_item_updating(item, comparator) || self.is_item_deleting(item, comparator)
    }

    pub fn is_item_processing(&self, item: &T, comparator: &Comparator<T>) -> bool {
        self.is_processing()
            && (self.is_item_refreshing(item, comparator) || self.is_item_mutating(item, comparator))
    }
}
