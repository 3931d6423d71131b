use std::collections::HashMap;

// the selected rows are few small integers, kept as a compressed bitmap
use roaring::RoaringBitmap;

use crate::keeper::SlotHasher;
use crate::order::Entry;

/// Indices of working-view rows selected by the presentation layer.
///
/// The engine keeps every selected index attached to the row it pointed at:
/// when rows are inserted, removed or moved the indices follow them, and a
/// selected row that leaves the view leaves the selection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    indices: RoaringBitmap,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn contains(&self, index: usize) -> bool {
        u32::try_from(index).is_ok_and(|i| self.indices.contains(i))
    }
    pub fn len(&self) -> usize {
        self.indices.len() as usize
    }
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.indices.iter().map(|i| i as usize)
    }
    pub fn to_vec(&self) -> Vec<usize> {
        self.iter().collect()
    }
    // no view has more rows than a u32 can count, so larger indices are
    // never rows
    pub(crate) fn insert(&mut self, index: usize) {
        if let Ok(index) = u32::try_from(index) {
            self.indices.insert(index);
        }
    }
    pub(crate) fn clear(&mut self) {
        self.indices.clear();
    }
    /// Translates the selection from `old` rows to `new` rows through the
    /// identity of each row.
    pub(crate) fn reconcile(&self, old: &[Entry], new: &[Entry]) -> Selection {
        let mut reconciled = Selection::new();
        if self.is_empty() {
            return reconciled;
        }
        let positions: HashMap<Entry, usize, SlotHasher> =
            new.iter().enumerate().map(|(i, e)| (*e, i)).collect();
        for index in self.iter() {
            if let Some(position) = old.get(index).and_then(|e| positions.get(e)) {
                reconciled.insert(*position);
            }
        }
        reconciled
    }
}

impl FromIterator<usize> for Selection {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut selection = Selection::new();
        for index in iter {
            selection.insert(index);
        }
        selection
    }
}
