use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::error::{CategorizationError, Result};
use crate::keeper::{RecordKeeper, Slot};
use crate::record::Record;

// ------------- SortPredicate -------------
type Less<R> = dyn Fn(&R, &R) -> std::result::Result<bool, String> + Send + Sync;

/// A strict "less than" between records, used to order the working view.
///
/// Two predicates are the same predicate only when they are clones of each
/// other; replacing a predicate with a fresh one always rebuilds the view.
pub struct SortPredicate<R>(Arc<Less<R>>);

impl<R: 'static> SortPredicate<R> {
    pub fn new<F>(less: F) -> Self
    where
        F: Fn(&R, &R) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(move |a, b| Ok(less(a, b))))
    }
    /// A comparator that may fail. A failure aborts the operation that
    /// was ordering the view and leaves the categorization as it was.
    pub fn fallible<F, E>(less: F) -> Self
    where
        F: Fn(&R, &R) -> std::result::Result<bool, E> + Send + Sync + 'static,
        E: fmt::Display,
    {
        Self(Arc::new(move |a, b| less(a, b).map_err(|e| e.to_string())))
    }
    pub fn by_key<K, F>(key: F) -> Self
    where
        K: Ord,
        F: Fn(&R) -> K + Send + Sync + 'static,
    {
        Self::new(move |a, b| key(a) < key(b))
    }
    pub fn descending_by_key<K, F>(key: F) -> Self
    where
        K: Ord,
        F: Fn(&R) -> K + Send + Sync + 'static,
    {
        Self::new(move |a, b| key(a) > key(b))
    }
}

impl<R> SortPredicate<R> {
    pub fn is_less(&self, a: &R, b: &R) -> Result<bool> {
        (self.0)(a, b).map_err(CategorizationError::Comparator)
    }
    pub fn same(&self, other: &SortPredicate<R>) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<R> Clone for SortPredicate<R> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<R> fmt::Debug for SortPredicate<R> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "SortPredicate")
    }
}

// ------------- Entry -------------
// One row of the working view: a kept record and the subcategory group it
// is shown under (always 0 unless the view is grouped by subcategory).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct Entry {
    pub slot: Slot,
    pub group: u32,
}

impl Entry {
    pub fn new(slot: Slot, group: u32) -> Self {
        Self { slot, group }
    }
}

// ------------- Comparator -------------
pub(crate) enum Comparator<'a, R> {
    Unsorted,
    Natural,
    Predicate(&'a SortPredicate<R>),
}

impl<'a, R> Comparator<'a, R> {
    pub fn select(sorted: bool, predicate: Option<&'a SortPredicate<R>>) -> Self {
        match (sorted, predicate) {
            (false, _) => Comparator::Unsorted,
            (true, None) => Comparator::Natural,
            (true, Some(predicate)) => Comparator::Predicate(predicate),
        }
    }
}

// ------------- ViewOrder -------------
/// The total order of the working view: subcategory group first (when the
/// view is grouped), then the comparator (when sorted), then master order.
/// Master order makes ties stable and keeps unsorted views in the order
/// records were added.
pub(crate) struct ViewOrder<'a, R: Record> {
    keeper: &'a RecordKeeper<R>,
    comparator: Comparator<'a, R>,
    grouped: bool,
}

impl<'a, R: Record> ViewOrder<'a, R> {
    pub fn new(keeper: &'a RecordKeeper<R>, comparator: Comparator<'a, R>, grouped: bool) -> Self {
        Self {
            keeper,
            comparator,
            grouped,
        }
    }
    /// `true` when `a` belongs strictly before `b`.
    pub fn precedes(&self, a: Entry, b: Entry) -> Result<bool> {
        if self.grouped && a.group != b.group {
            return Ok(a.group < b.group);
        }
        if a.slot != b.slot {
            let (x, y) = (&self.keeper[a.slot], &self.keeper[b.slot]);
            match &self.comparator {
                Comparator::Unsorted => (),
                Comparator::Natural => match x.cmp(y) {
                    Ordering::Less => return Ok(true),
                    Ordering::Greater => return Ok(false),
                    Ordering::Equal => (),
                },
                Comparator::Predicate(predicate) => {
                    if predicate.is_less(x, y)? {
                        return Ok(true);
                    }
                    if predicate.is_less(y, x)? {
                        return Ok(false);
                    }
                }
            }
        }
        Ok(self.keeper.order(a.slot) < self.keeper.order(b.slot))
    }
    /// First position `i` in an ordered `rows` with `entry` preceding
    /// `rows[i]`, i.e. the insertion point after every row equal to it.
    pub fn insertion_point(&self, rows: &[Entry], entry: Entry) -> Result<usize> {
        let (mut low, mut high) = (0, rows.len());
        while low < high {
            let middle = low + (high - low) / 2;
            if self.precedes(entry, rows[middle])? {
                high = middle;
            } else {
                low = middle + 1;
            }
        }
        Ok(low)
    }
    /// Sorts `rows` into view order. On a comparator failure the error is
    /// returned and `rows` is left untouched.
    pub fn sort(&self, rows: &mut Vec<Entry>) -> Result<()> {
        if !self.grouped && matches!(self.comparator, Comparator::Unsorted) {
            rows.sort_by_key(|e| self.keeper.order(e.slot));
            return Ok(());
        }
        *rows = self.merge_sort(rows)?;
        Ok(())
    }
    // A comparator that fails or is not a strict weak order must not be
    // handed to the standard sorts, which may panic on such input.
    fn merge_sort(&self, rows: &[Entry]) -> Result<Vec<Entry>> {
        if rows.len() <= 1 {
            return Ok(rows.to_vec());
        }
        let (left, right) = rows.split_at(rows.len() / 2);
        let (left, right) = (self.merge_sort(left)?, self.merge_sort(right)?);
        let mut merged = Vec::with_capacity(rows.len());
        let (mut i, mut j) = (0, 0);
        while i < left.len() && j < right.len() {
            if self.precedes(right[j], left[i])? {
                merged.push(right[j]);
                j += 1;
            } else {
                merged.push(left[i]);
                i += 1;
            }
        }
        merged.extend_from_slice(&left[i..]);
        merged.extend_from_slice(&right[j..]);
        Ok(merged)
    }
    pub fn is_ordered(&self, rows: &[Entry]) -> Result<bool> {
        for pair in rows.windows(2) {
            if self.precedes(pair[1], pair[0])? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
