//! Incremental maintenance of the working view.
//!
//! Every mutation here touches only the rows of the records it changes and
//! reports what it did as a sequence of [`Delta`]s. The rows it produces are
//! the rows a full recomputation would produce, in the same order.

use roaring::RoaringBitmap;
use tracing::{debug, trace, warn};

use crate::categorization::Categorization;
use crate::change::{Delta, ViewChange};
use crate::derive::Scope;
use crate::error::{CategorizationError, Result};
use crate::keeper::Slot;
use crate::order::{Comparator, Entry, ViewOrder};
use crate::record::Record;

// ------------- Checkpoint -------------
// Enough of the state before an upsert batch to put it back: upserts only
// append to the master collection, merge kept records and rearrange rows.
struct Checkpoint<R> {
    items: usize,
    view: Vec<Entry>,
    next_order: u64,
    undo: Vec<Undo<R>>,
}

enum Undo<R> {
    Merged(Slot, R),
    Kept(Slot),
}

impl<R: Record> Categorization<R> {
    /// Adds a record. A record whose identity is already present is merged
    /// into the kept one instead, exactly like [`Categorization::update_item`].
    pub fn insert_item(&mut self, record: R) -> Result<ViewChange> {
        self.transact("insert_item", false, |c, checkpoint, deltas| {
            c.upsert(record, checkpoint, deltas)
        })
    }
    /// Merges a record into the kept one with the same identity, or adds it
    /// when the identity is new.
    pub fn update_item(&mut self, record: R) -> Result<ViewChange> {
        self.transact("update_item", false, |c, checkpoint, deltas| {
            c.upsert(record, checkpoint, deltas)
        })
    }
    /// Upserts a batch in order. Either every record is applied or, on the
    /// first failure, none is. A batch that rearranges a large share of the
    /// view is reported as a reset.
    pub fn update_items(&mut self, records: impl IntoIterator<Item = R>) -> Result<ViewChange> {
        self.transact("update_items", true, |c, checkpoint, deltas| {
            for record in records {
                c.upsert(record, checkpoint, deltas)?;
            }
            Ok(())
        })
    }
    /// Removes every record matching `predicate` from the master collection
    /// and the view.
    pub fn remove_items(&mut self, predicate: impl Fn(&R) -> bool) -> Result<ViewChange> {
        let doomed: RoaringBitmap = self
            .items
            .iter()
            .copied()
            .filter(|slot| predicate(&self.keeper[*slot]))
            .collect();
        self.remove_slots("remove_items", doomed)
    }
    pub fn remove_item(&mut self, key: &R::Key) -> Result<ViewChange> {
        let doomed: RoaringBitmap = self.keeper.slot_of(key).into_iter().collect();
        self.remove_slots("remove_item", doomed)
    }
    /// Moves the row at `from` so that it lands before the row currently at
    /// `to` (`to == view_len()` moves it to the end).
    pub fn move_item(&mut self, from: usize, to: usize) -> Result<ViewChange> {
        self.move_items([from], to)
    }
    /// Moves a set of rows, keeping their relative order, to the place
    /// before the row currently at `to`. Only unsorted, ungrouped views can
    /// be rearranged by hand; the master collection follows the new order.
    pub fn move_items(&mut self, indices: impl IntoIterator<Item = usize>, to: usize) -> Result<ViewChange> {
        let len = self.view.len();
        let mut moved: Vec<usize> = indices.into_iter().collect();
        moved.sort_unstable();
        moved.dedup();
        if let Some(index) = moved.iter().copied().find(|i| *i >= len) {
            return Err(CategorizationError::IndexOutOfRange { index, len });
        }
        if to > len {
            return Err(CategorizationError::IndexOutOfRange { index: to, len });
        }
        let destination = to - moved.iter().filter(|i| **i < to).count();
        let rest: Vec<Entry> = self
            .view
            .iter()
            .enumerate()
            .filter(|(i, _)| moved.binary_search(i).is_err())
            .map(|(_, entry)| *entry)
            .collect();
        let mut target = Vec::with_capacity(len);
        target.extend_from_slice(&rest[..destination]);
        target.extend(moved.iter().map(|i| self.view[*i]));
        target.extend_from_slice(&rest[destination..]);
        if target == self.view {
            return Ok(ViewChange::none());
        }
        self.ensure_manual_order()?;

        let previous = self.view.clone();
        let deltas = moves_between(&mut self.view, &target);
        self.realign_items();
        Ok(self.finish("move_items", previous, deltas, false))
    }

    // ------------- internals -------------
    fn ensure_manual_order(&self) -> Result<()> {
        if self.sorted {
            return Err(CategorizationError::Reorder(
                "rows of a sorted view cannot be moved".to_string(),
            ));
        }
        if self.selected().is_some_and(|c| c.is_sorted_by_subcategories()) {
            return Err(CategorizationError::Reorder(
                "rows of a view grouped by subcategory cannot be moved".to_string(),
            ));
        }
        Ok(())
    }

    fn transact<F>(&mut self, operation: &'static str, batch: bool, apply: F) -> Result<ViewChange>
    where
        F: FnOnce(&mut Self, &mut Checkpoint<R>, &mut Vec<Delta>) -> Result<()>,
    {
        let mut checkpoint = Checkpoint {
            items: self.items.len(),
            view: self.view.clone(),
            next_order: self.keeper.next_order(),
            undo: Vec::new(),
        };
        let mut deltas = Vec::new();
        if let Err(e) = apply(self, &mut checkpoint, &mut deltas) {
            self.roll_back(checkpoint);
            warn!(operation, error = %e, "operation rolled back");
            return Err(e);
        }
        Ok(self.finish(operation, checkpoint.view, deltas, batch))
    }

    fn roll_back(&mut self, checkpoint: Checkpoint<R>) {
        for undo in checkpoint.undo.into_iter().rev() {
            match undo {
                Undo::Merged(slot, previous) => self.keeper.restore(slot, previous),
                Undo::Kept(slot) => {
                    self.keeper.release(slot);
                }
            }
        }
        self.items.truncate(checkpoint.items);
        self.keeper.rewind_order(checkpoint.next_order);
        self.view = checkpoint.view;
    }

    fn finish(&mut self, operation: &'static str, previous: Vec<Entry>, deltas: Vec<Delta>, batch: bool) -> ViewChange {
        self.selection = self.selection.reconcile(&previous, &self.view);
        debug!(operation, deltas = deltas.len(), rows = self.view.len(), "working view updated");
        if batch && self.settings.collapses(deltas.len(), previous.len()) {
            debug!(operation, "reporting batch as a reset");
            return self.note(ViewChange::Reset);
        }
        self.note(ViewChange::Deltas(deltas))
    }

    fn upsert(&mut self, record: R, checkpoint: &mut Checkpoint<R>, deltas: &mut Vec<Delta>) -> Result<()> {
        match self.keeper.slot_of(&record.key()) {
            Some(slot) => {
                let previous = self.keeper.merge(slot, record)?;
                checkpoint.undo.push(Undo::Merged(slot, previous));
                trace!(slot, "record merged");
                self.settle(slot, true, deltas)
            }
            None => {
                let (slot, _) = self.keeper.keep(record);
                checkpoint.undo.push(Undo::Kept(slot));
                self.items.push(slot);
                trace!(slot, "record kept");
                self.settle(slot, false, deltas)
            }
        }
    }

    // Brings the rows of one record in line with the view order after the
    // record was added or merged.
    fn settle(&mut self, slot: Slot, merged: bool, deltas: &mut Vec<Delta>) -> Result<()> {
        let scope = Scope::new(&self.filter, self.selected_category.map(|i| &self.categories[i]));
        let order = ViewOrder::new(
            &self.keeper,
            Comparator::select(self.sorted, self.sort_predicate.as_ref()),
            scope.is_grouped(),
        );
        let wanted = scope.groups(&self.keeper[slot]);

        for index in (0..self.view.len()).rev() {
            let entry = self.view[index];
            if entry.slot == slot && !wanted.contains(&entry.group) {
                self.view.remove(index);
                deltas.push(Delta::Removed { index });
                trace!(slot, index, "row removed");
            }
        }
        for group in wanted {
            let entry = Entry::new(slot, group);
            match self.view.iter().position(|e| *e == entry) {
                Some(from) => {
                    self.view.remove(from);
                    let to = order.insertion_point(&self.view, entry)?;
                    self.view.insert(to, entry);
                    if from != to {
                        deltas.push(Delta::Moved { from, to });
                        trace!(slot, from, to, "row moved");
                    }
                    if merged {
                        deltas.push(Delta::Replaced { index: to });
                    }
                }
                None => {
                    let index = order.insertion_point(&self.view, entry)?;
                    self.view.insert(index, entry);
                    deltas.push(Delta::Inserted { index });
                    trace!(slot, index, "row inserted");
                }
            }
        }
        Ok(())
    }

    fn remove_slots(&mut self, operation: &'static str, doomed: RoaringBitmap) -> Result<ViewChange> {
        if doomed.is_empty() {
            return Ok(ViewChange::none());
        }
        let previous = self.view.clone();
        let deltas: Vec<Delta> = (0..self.view.len())
            .rev()
            .filter(|i| doomed.contains(self.view[*i].slot))
            .map(|index| Delta::Removed { index })
            .collect();
        self.view.retain(|entry| !doomed.contains(entry.slot));
        self.items.retain(|slot| !doomed.contains(*slot));
        for slot in &doomed {
            self.keeper.release(slot);
        }
        debug!(operation, removed = doomed.len(), "records removed");
        Ok(self.finish(operation, previous, deltas, true))
    }

    // After a manual move the master collection takes on the order of the
    // view: the positions held by shown records are refilled in view order.
    fn realign_items(&mut self) {
        let shown: RoaringBitmap = self.view.iter().map(|entry| entry.slot).collect();
        let mut rows = self.view.iter();
        for slot in self.items.iter_mut() {
            if shown.contains(*slot) {
                if let Some(entry) = rows.next() {
                    *slot = entry.slot;
                }
            }
        }
        self.keeper.renumber(&self.items);
    }
}

// Turns `rows` into `target` (a permutation of it) one move at a time,
// fixing position after position from the front.
fn moves_between(rows: &mut Vec<Entry>, target: &[Entry]) -> Vec<Delta> {
    let mut deltas = Vec::new();
    for (to, wanted) in target.iter().enumerate() {
        if rows[to] == *wanted {
            continue;
        }
        if let Some(from) = rows[to..].iter().position(|e| e == wanted).map(|p| p + to) {
            let entry = rows.remove(from);
            rows.insert(to, entry);
            deltas.push(Delta::Moved { from, to });
        }
    }
    deltas
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(slots: &[u32]) -> Vec<Entry> {
        slots.iter().map(|s| Entry::new(*s, 0)).collect()
    }

    #[test]
    fn moves_replay_to_target() {
        let mut current = rows(&[0, 1, 2, 3, 4]);
        let target = rows(&[3, 0, 1, 4, 2]);
        let deltas = moves_between(&mut current, &target);
        assert_eq!(current, target);
        let mut replayed: Vec<u32> = vec![0, 1, 2, 3, 4];
        assert!(ViewChange::Deltas(deltas).replay(&mut replayed, |_| u32::MAX));
        assert_eq!(replayed, vec![3, 0, 1, 4, 2]);
    }

    #[test]
    fn identical_rows_need_no_moves() {
        let mut current = rows(&[5, 6]);
        assert!(moves_between(&mut current, &rows(&[5, 6])).is_empty());
    }
}
