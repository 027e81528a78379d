use std::collections::HashSet;

use super::{Collection, Item};

impl<T: Item> Collection<T> {
    /// Gives `status` (e.g. "selected") to `item`, taking it from whichever
    /// item held it before. With `active == false` the status is removed, but
    /// only when `item` is its current holder.
    pub fn set_unique_status(&self, status: &str, item: T, active: bool) {
        self.inner.publish(|state, comparator| {
            state.set_unique_status(status, item, active, comparator)
        });
    }

    pub fn delete_unique_status(&self, status: &str) {
        self.inner
            .publish(|state, _| state.delete_unique_status(status));
    }

    pub fn unique_status(&self, status: &str) -> Option<T> {
        self.inner
            .read_state(|state| state.unique_statuses.get(status).cloned())
    }

    pub fn has_unique_status(&self, status: &str, item: &T) -> bool {
        self.snapshot().has_unique_status(status, item)
    }

    /// Adds `status` to the statuses `item` holds.
    pub fn set_item_status(&self, item: T, status: &str) {
        self.inner
            .publish(|state, comparator| state.set_item_status(item, status, comparator));
    }

    pub fn delete_item_status(&self, item: &T, status: &str) {
        self.inner
            .publish(|state, comparator| state.delete_item_status(item, status, comparator));
    }

    pub fn item_statuses(&self, item: &T) -> HashSet<String> {
        self.snapshot().item_statuses(item)
    }
}
