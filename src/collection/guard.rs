use std::sync::Arc;

use super::{Inner, Item};
use crate::lifecycle::Operation;

/// Releases a busy marker when dropped.
///
/// Held by the operation future, so the marker is cleared when the
/// operation finishes, fails, or the future is dropped before completion.
pub(crate) struct BusyGuard<T: Item> {
    inner: Arc<Inner<T>>,
    operation: Operation,
    items: Vec<T>,
}

impl<T: Item> BusyGuard<T> {
    pub(crate) fn new(inner: Arc<Inner<T>>, operation: Operation, items: Vec<T>) -> Self {
        BusyGuard {
            inner,
            operation,
            items,
        }
    }
}

impl<T: Item> Drop for BusyGuard<T> {
    fn drop(&mut self) {
        let operation = self.operation;
        let items = std::mem::take(&mut self.items);
        self.inner
            .publish(|state, comparator| state.lifecycle.clear(operation, &items, comparator));
    }
}
