//! Upsert and duplicate detection over ordered item lists.
//!
//! Every function here either succeeds completely or leaves its input
//! untouched; nothing is partially applied.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::comparator::{Comparator, Prepared};
use crate::error::DuplicateOrigin;

/// A duplicate found while merging, with the item that triggered it.
#[derive(Debug, Clone, PartialEq)]
pub struct Conflict<T> {
    pub origin: DuplicateOrigin,
    pub item: T,
}

/// Duplicate groups keyed by first occurrence, then by duplicate index.
pub type DuplicateReport<T> = BTreeMap<usize, BTreeMap<usize, T>>;

/// Appends `item`, or replaces its single match in place.
///
/// Two or more matches mean `list` is already inconsistent; `list` is left
/// as is and the conflict is returned.
pub fn upsert_one<T>(item: T, list: &mut Vec<T>, comparator: &Comparator<T>) -> Result<(), Conflict<T>>
where
    T: Serialize,
{
    let (first, second) = {
        let incoming = comparator.prepare(std::slice::from_ref(&item));
        let existing = comparator.prepare(list);
        let mut matches = (0..existing.len()).filter(|&index| incoming.equal(0, &existing, index));
        (matches.next(), matches.next())
    };

    match (first, second) {
        (None, _) => {
            list.push(item);
            Ok(())
        }
        (Some(index), None) => {
            list[index] = item;
            Ok(())
        }
        (Some(_), Some(_)) => Err(Conflict {
            origin: DuplicateOrigin::List,
            item,
        }),
    }
}

/// First item equal to an earlier item of the same batch.
pub fn has_duplicates<'a, T>(items: &'a [T], comparator: &Comparator<T>) -> Option<&'a T>
where
    T: Serialize,
{
    first_duplicate(&comparator.prepare(items)).map(|index| &items[index])
}

fn first_duplicate<T: Serialize>(batch: &Prepared<'_, T>) -> Option<usize> {
    (1..batch.len()).find(|&index| (0..index).any(|earlier| batch.equal(earlier, batch, index)))
}

fn batch_conflict<T: Serialize + Clone>(batch: &Prepared<'_, T>) -> Result<(), Conflict<T>> {
    match first_duplicate(batch) {
        Some(index) => Err(Conflict {
            origin: DuplicateOrigin::Batch,
            item: batch.items()[index].clone(),
        }),
        None => Ok(()),
    }
}

/// Where a merged entry comes from while upserting a batch.
#[derive(Clone, Copy)]
enum Slot {
    Existing(usize),
    Batch(usize),
}

/// Upserts a whole batch into a copy of `list`.
///
/// The batch is rejected before touching anything when it contains internal
/// duplicates ([`DuplicateOrigin::Batch`]); a collision with items already in
/// `list` rejects it as [`DuplicateOrigin::Existing`]. Batch items are upserted
/// in order, each one against the entries left by the previous ones.
pub fn upsert_many<T>(items: Vec<T>, list: &[T], comparator: &Comparator<T>) -> Result<Vec<T>, Conflict<T>>
where
    T: Serialize + Clone,
{
    let batch = comparator.prepare(&items);
    batch_conflict(&batch)?;
    let existing = comparator.prepare(list);

    let mut slots: Vec<Slot> = (0..list.len()).map(Slot::Existing).collect();
    for index in 0..batch.len() {
        let (first, second) = {
            let mut matches = slots
                .iter()
                .enumerate()
                .filter(|(_, slot)| match **slot {
                    Slot::Existing(other) => batch.equal(index, &existing, other),
                    Slot::Batch(other) => batch.equal(index, &batch, other),
                })
                .map(|(position, _)| position);
            (matches.next(), matches.next())
        };
        match (first, second) {
            (None, _) => slots.push(Slot::Batch(index)),
            (Some(position), None) => slots[position] = Slot::Batch(index),
            (Some(_), Some(_)) => {
                return Err(Conflict {
                    origin: DuplicateOrigin::Existing,
                    item: items[index].clone(),
                })
            }
        }
    }

    Ok(slots
        .into_iter()
        .map(|slot| match slot {
            Slot::Existing(index) => list[index].clone(),
            Slot::Batch(index) => items[index].clone(),
        })
        .collect())
}

/// Appends new items, rejecting any that match each other or `list`.
pub fn append_new<T>(items: Vec<T>, list: &[T], comparator: &Comparator<T>) -> Result<Vec<T>, Conflict<T>>
where
    T: Serialize + Clone,
{
    let batch = comparator.prepare(&items);
    batch_conflict(&batch)?;
    let existing = comparator.prepare(list);
    if let Some(index) = (0..batch.len()).find(|&index| batch.position_in(index, &existing).is_some()) {
        return Err(Conflict {
            origin: DuplicateOrigin::Existing,
            item: items[index].clone(),
        });
    }

    let mut merged = Vec::with_capacity(list.len() + items.len());
    merged.extend_from_slice(list);
    merged.extend(items);
    Ok(merged)
}

/// Full duplicate report, or `None` when there is nothing to report.
pub fn get_duplicates<T>(items: &[T], comparator: &Comparator<T>) -> Option<DuplicateReport<T>>
where
    T: Serialize + Clone,
{
    if items.len() < 2 {
        return None;
    }

    let prepared = comparator.prepare(items);
    let mut report: DuplicateReport<T> = BTreeMap::new();
    let mut seen = vec![false; items.len()];

    for first in 0..items.len() {
        if seen[first] {
            continue;
        }
        for index in first + 1..items.len() {
            if !seen[index] && prepared.equal(first, &prepared, index) {
                seen[index] = true;
                report
                    .entry(first)
                    .or_default()
                    .insert(index, items[index].clone());
            }
        }
    }

    if report.is_empty() {
        None
    } else {
        Some(report)
    }
}
