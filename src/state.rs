use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;

use crate::comparator::Comparator;
use crate::lifecycle::Lifecycle;

/// Everything a collection owns. Cloning is cheap: every collection-valued
/// field is an `Arc` that is replaced, never mutated, on change.
#[derive(Debug)]
pub(crate) struct CollectionState<T> {
    pub(crate) items: Arc<Vec<T>>,
    pub(crate) total_count_fetched: Option<u64>,
    pub(crate) lifecycle: Lifecycle<T>,
    pub(crate) unique_statuses: Arc<HashMap<String, T>>,
    pub(crate) item_statuses: Arc<Vec<(T, HashSet<String>)>>,
}

impl<T> Clone for CollectionState<T> {
    fn clone(&self) -> Self {
        CollectionState {
            items: Arc::clone(&self.items),
            total_count_fetched: self.total_count_fetched,
            lifecycle: self.lifecycle.clone(),
            unique_statuses: Arc::clone(&self.unique_statuses),
            item_statuses: Arc::clone(&self.item_statuses),
        }
    }
}

impl<T> Default for CollectionState<T> {
    fn default() -> Self {
        CollectionState {
            items: Arc::new(Vec::new()),
            total_count_fetched: None,
            lifecycle: Lifecycle::default(),
            unique_statuses: Arc::new(HashMap::new()),
            item_statuses: Arc::new(Vec::new()),
        }
    }
}

impl<T: Serialize + Clone> CollectionState<T> {
    pub(crate) fn set_items(&mut self, items: Vec<T>) {
        self.items = Arc::new(items);
    }

    pub(crate) fn reset(&mut self) {
        self.items = Arc::new(Vec::new());
        self.total_count_fetched = None;
    }

    /// Gives `status` to `item`; with `active == false` takes it away, but
    /// only if `item` is the current holder.
    pub(crate) fn set_unique_status(
        &mut self,
        status: &str,
        item: T,
        active: bool,
        comparator: &Comparator<T>,
    ) {
        if !active {
            let holds = self
                .unique_statuses
                .get(status)
                .is_some_and(|holder| comparator.equal(holder, &item));
            if holds {
                self.delete_unique_status(status);
            }
            return;
        }
        let mut statuses = (*self.unique_statuses).clone();
        statuses.insert(status.to_string(), item);
        self.unique_statuses = Arc::new(statuses);
    }

    pub(crate) fn delete_unique_status(&mut self, status: &str) {
        if self.unique_statuses.contains_key(status) {
            let mut statuses = (*self.unique_statuses).clone();
            statuses.remove(status);
            self.unique_statuses = Arc::new(statuses);
        }
    }

    pub(crate) fn set_item_status(&mut self, item: T, status: &str, comparator: &Comparator<T>) {
        let mut statuses = (*self.item_statuses).clone();
        match statuses
            .iter()
            .position(|(holder, _)| comparator.equal(holder, &item))
        {
            Some(index) => {
                statuses[index].1.insert(status.to_string());
            }
            None => statuses.push((item, HashSet::from([status.to_string()]))),
        }
        self.item_statuses = Arc::new(statuses);
    }

    pub(crate) fn delete_item_status(&mut self, item: &T, status: &str, comparator: &Comparator<T>) {
        let Some(index) = self
            .item_statuses
            .iter()
            .position(|(holder, set)| set.contains(status) && comparator.equal(holder, item))
        else {
            return;
        };
        let mut statuses = (*self.item_statuses).clone();
        statuses[index].1.remove(status);
        if statuses[index].1.is_empty() {
            statuses.remove(index);
        }
        self.item_statuses = Arc::new(statuses);
    }
}
