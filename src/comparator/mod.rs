//! Identity comparison for (possibly partial) items.
//!
//! Two representations denote the same entity when the configured
//! [`FieldGroup`]s say so, or when a custom predicate does. Field groups are
//! evaluated against the serde serialization of each item, so a field that
//! is skipped during serialization is not "owned" by that item.

mod fields;

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

pub use fields::{default_id_fields, equal_values, is_empty_value, FieldGroup};

type Predicate<T> = Arc<dyn Fn(&T, &T) -> bool + Send + Sync>;

/// Decides whether two items denote the same logical entity.
pub enum Comparator<T> {
    Fields(Vec<FieldGroup>),
    Custom(Predicate<T>),
}

impl<T> Clone for Comparator<T> {
    fn clone(&self) -> Self {
        match self {
            Comparator::Fields(groups) => Comparator::Fields(groups.clone()),
            Comparator::Custom(predicate) => Comparator::Custom(Arc::clone(predicate)),
        }
    }
}

impl<T> fmt::Debug for Comparator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Comparator::Fields(groups) => f.debug_tuple("Fields").field(groups).finish(),
            Comparator::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl<T> Default for Comparator<T> {
    fn default() -> Self {
        Comparator::Fields(default_id_fields())
    }
}

impl<T> Comparator<T> {
    pub fn fields<I, G>(groups: I) -> Self
    where
        I: IntoIterator<Item = G>,
        G: Into<FieldGroup>,
    {
        Comparator::Fields(groups.into_iter().map(Into::into).collect())
    }

    pub fn custom<F>(predicate: F) -> Self
    where
        F: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        Comparator::Custom(Arc::new(predicate))
    }
}

impl<T: Serialize> Comparator<T> {
    /// Returns true when `a` and `b` are the same entity.
    ///
    /// The same reference is always equal to itself.
    pub fn equal(&self, a: &T, b: &T) -> bool {
        if std::ptr::eq(a, b) {
            return true;
        }
        match self {
            Comparator::Fields(groups) => equal_by_fields(a, b, groups),
            Comparator::Custom(predicate) => predicate(a, b),
        }
    }

    /// Compares with an explicit set of field groups, ignoring the
    /// configured comparator.
    pub fn equal_by(&self, a: &T, b: &T, groups: &[FieldGroup]) -> bool {
        std::ptr::eq(a, b) || equal_by_fields(a, b, groups)
    }

    /// Serializes `items` once for repeated comparisons against each other
    /// or against another prepared set.
    pub fn prepare<'a>(&'a self, items: &'a [T]) -> Prepared<'a, T> {
        let values = match self {
            Comparator::Fields(_) => items
                .iter()
                .map(|item| serde_json::to_value(item).ok())
                .collect(),
            Comparator::Custom(_) => Vec::new(),
        };
        Prepared {
            comparator: self,
            items,
            values,
        }
    }

    pub fn position(&self, item: &T, list: &[T]) -> Option<usize> {
        self.prepare(std::slice::from_ref(item))
            .position_in(0, &self.prepare(list))
    }

    pub fn has_item_in(&self, item: &T, list: &[T]) -> bool {
        self.position(item, list).is_some()
    }

    /// Union of `list` and `additions`, skipping additions already present.
    pub fn union(&self, list: &[T], additions: &[T]) -> Vec<T>
    where
        T: Clone,
    {
        let existing = self.prepare(list);
        let added = self.prepare(additions);
        let mut merged = list.to_vec();
        let mut accepted: Vec<usize> = Vec::new();
        for index in 0..added.len() {
            let present = added.position_in(index, &existing).is_some()
                || accepted
                    .iter()
                    .any(|&earlier| added.equal(index, &added, earlier));
            if !present {
                accepted.push(index);
                merged.push(additions[index].clone());
            }
        }
        merged
    }

    /// `list` without every item matching any of `removals`.
    pub fn without(&self, list: &[T], removals: &[T]) -> Vec<T>
    where
        T: Clone,
    {
        self.filter(list, removals, false)
    }

    /// Items of `list` matching any of `filters`.
    pub fn matching(&self, list: &[T], filters: &[T]) -> Vec<T>
    where
        T: Clone,
    {
        self.filter(list, filters, true)
    }

    fn filter(&self, list: &[T], filters: &[T], keep_matches: bool) -> Vec<T>
    where
        T: Clone,
    {
        let candidates = self.prepare(list);
        let filters = self.prepare(filters);
        list.iter()
            .enumerate()
            .filter(|(index, _)| candidates.position_in(*index, &filters).is_some() == keep_matches)
            .map(|(_, item)| item.clone())
            .collect()
    }
}

/// Items serialized once by a [`Comparator`], see [`Comparator::prepare`].
///
/// Both sides of a comparison must come from the same comparator.
pub struct Prepared<'a, T> {
    comparator: &'a Comparator<T>,
    items: &'a [T],
    // Empty for custom comparators; `None` where serialization failed.
    values: Vec<Option<Value>>,
}

impl<'a, T: Serialize> Prepared<'a, T> {
    pub fn items(&self) -> &'a [T] {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Same as [`Comparator::equal`] on `self[index]` and
    /// `other[other_index]`, in that order.
    pub fn equal(&self, index: usize, other: &Prepared<'_, T>, other_index: usize) -> bool {
        let (a, b) = (&self.items[index], &other.items[other_index]);
        if std::ptr::eq(a, b) {
            return true;
        }
        match self.comparator {
            Comparator::Fields(groups) => {
                match (self.values.get(index), other.values.get(other_index)) {
                    (Some(Some(a)), Some(Some(b))) => equal_values(a, b, groups),
                    _ => false,
                }
            }
            Comparator::Custom(predicate) => predicate(a, b),
        }
    }

    /// First index of `other` whose item equals `self[index]`.
    pub fn position_in(&self, index: usize, other: &Prepared<'_, T>) -> Option<usize> {
        (0..other.len()).find(|&other_index| self.equal(index, other, other_index))
    }
}

fn equal_by_fields<T: Serialize>(a: &T, b: &T, groups: &[FieldGroup]) -> bool {
    match (serde_json::to_value(a), serde_json::to_value(b)) {
        (Ok(a), Ok(b)) => equal_values(&a, &b, groups),
        _ => false,
    }
}
