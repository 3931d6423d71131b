use std::collections::HashSet;
use std::ops::Index;

// used to keep the one-to-one mapping between identities and their slots
use bimap::BiMap;

use core::hash::BuildHasherDefault;
use seahash::SeaHasher;

use crate::error::{CategorizationError, Result};
use crate::record::Record;

// ------------- Slot -------------
pub type Slot = u32;

pub type SlotHasher = BuildHasherDefault<SeaHasher>;

#[derive(Debug, Default)]
pub struct SlotGenerator {
    lower_bound: Slot,
    retained: HashSet<Slot, SlotHasher>,
    released: Vec<Slot>,
}

impl SlotGenerator {
    pub fn new() -> Self {
        Self::default()
    }
    // Released slots are handed out again before the lower bound grows,
    // so the arena never has more holes than records that were removed.
    pub fn generate(&mut self) -> Slot {
        let slot = self.released.pop().unwrap_or_else(|| {
            self.lower_bound += 1;
            self.lower_bound - 1
        });
        self.retained.insert(slot);
        slot
    }
    pub fn release(&mut self, slot: Slot) {
        if self.retained.remove(&slot) {
            self.released.push(slot);
        }
    }
    pub fn check(&self, slot: Slot) -> bool {
        self.retained.contains(&slot)
    }
    pub fn len(&self) -> usize {
        self.retained.len()
    }
}

// ------------- Kept record -------------
// The order is the record's position in the master collection, expressed
// as a number that only needs to grow; ties in the view fall back to it.
#[derive(Debug, Clone)]
struct Kept<R> {
    record: R,
    order: u64,
}

// ------------- RecordKeeper -------------
/// Owns every record exactly once. The master collection and the working
/// view only hold [`Slot`]s into the keeper, so a merge done here is seen
/// through both of them.
#[derive(Debug)]
pub struct RecordKeeper<R: Record> {
    kept: Vec<Option<Kept<R>>>,
    lookup: BiMap<R::Key, Slot>,
    generator: SlotGenerator,
    next_order: u64,
}

impl<R: Record> RecordKeeper<R> {
    pub fn new() -> Self {
        Self {
            kept: Vec::new(),
            lookup: BiMap::new(),
            generator: SlotGenerator::new(),
            next_order: 0,
        }
    }
    /// Keeps a record under a fresh slot, or returns the slot already
    /// holding its identity together with `true` (nothing is merged then).
    pub fn keep(&mut self, record: R) -> (Slot, bool) {
        let key = record.key();
        if let Some(slot) = self.lookup.get_by_left(&key) {
            return (*slot, true);
        }
        let slot = self.generator.generate();
        let kept = Kept {
            record,
            order: self.next_order,
        };
        self.next_order += 1;
        let position = slot as usize;
        if position >= self.kept.len() {
            self.kept.resize_with(position + 1, || None);
        }
        self.kept[position] = Some(kept);
        self.lookup.insert(key, slot);
        (slot, false)
    }
    /// Merges `record` into the one kept at `slot` and hands back the
    /// previous version. A merge that alters the identity is undone.
    pub fn merge(&mut self, slot: Slot, record: R) -> Result<R> {
        let kept = self.kept_mut(slot)?;
        let previous = kept.record.clone();
        let key = previous.key();
        kept.record.merge(record);
        if kept.record.key() != key {
            kept.record = previous;
            return Err(CategorizationError::IdentityChanged(format!("{:?}", key)));
        }
        Ok(previous)
    }
    // puts back a version handed out by merge
    pub fn restore(&mut self, slot: Slot, record: R) {
        if let Ok(kept) = self.kept_mut(slot) {
            kept.record = record;
        }
    }
    pub fn release(&mut self, slot: Slot) -> Option<R> {
        let kept = self.kept.get_mut(slot as usize)?.take()?;
        self.lookup.remove_by_right(&slot);
        self.generator.release(slot);
        Some(kept.record)
    }
    pub fn slot_of(&self, key: &R::Key) -> Option<Slot> {
        self.lookup.get_by_left(key).copied()
    }
    pub fn get(&self, slot: Slot) -> Option<&R> {
        self.kept
            .get(slot as usize)
            .and_then(|k| k.as_ref())
            .map(|k| &k.record)
    }
    pub fn order(&self, slot: Slot) -> u64 {
        self.kept
            .get(slot as usize)
            .and_then(|k| k.as_ref())
            .map_or(u64::MAX, |k| k.order)
    }
    /// Renumbers the master order after the master collection was
    /// rearranged, so that `slots[i]` gets order `i`.
    pub fn renumber(&mut self, slots: &[Slot]) {
        for (position, slot) in slots.iter().enumerate() {
            if let Some(Some(kept)) = self.kept.get_mut(*slot as usize) {
                kept.order = position as u64;
            }
        }
        self.next_order = slots.len() as u64;
    }
    pub fn next_order(&self) -> u64 {
        self.next_order
    }
    pub fn rewind_order(&mut self, next_order: u64) {
        self.next_order = next_order;
    }
    pub fn len(&self) -> usize {
        self.lookup.len()
    }
    pub fn is_empty(&self) -> bool {
        self.lookup.len() == 0
    }
    fn kept_mut(&mut self, slot: Slot) -> Result<&mut Kept<R>> {
        self.kept
            .get_mut(slot as usize)
            .and_then(|k| k.as_mut())
            .ok_or_else(|| CategorizationError::Invariant(format!("slot {slot} is not kept")))
    }
}

impl<R: Record> Default for RecordKeeper<R> {
    fn default() -> Self {
        Self::new()
    }
}

// Slots held by the master collection and the view are always live, so
// indexing by them is an invariant of the engine rather than a user input.
impl<R: Record> Index<Slot> for RecordKeeper<R> {
    type Output = R;
    fn index(&self, slot: Slot) -> &R {
        match self.get(slot) {
            Some(record) => record,
            None => panic!("slot {slot} is not kept"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
    struct Note {
        id: u32,
        text: String,
    }

    impl Record for Note {
        type Key = u32;
        fn key(&self) -> u32 {
            self.id
        }
        fn merge(&mut self, other: Self) {
            self.id = other.id;
            self.text = other.text;
        }
    }

    fn note(id: u32, text: &str) -> Note {
        Note { id, text: text.to_string() }
    }

    #[test]
    fn released_slots_are_reused() {
        let mut generator = SlotGenerator::new();
        let a = generator.generate();
        let b = generator.generate();
        assert_eq!((a, b), (0, 1));
        generator.release(a);
        assert!(!generator.check(a));
        assert_eq!(generator.generate(), a);
        assert_eq!(generator.len(), 2);
    }

    #[test]
    fn keeping_an_existing_identity_returns_its_slot() {
        let mut keeper = RecordKeeper::new();
        let (slot, previously_kept) = keeper.keep(note(7, "first"));
        assert!(!previously_kept);
        let (again, previously_kept) = keeper.keep(note(7, "second"));
        assert!(previously_kept);
        assert_eq!(slot, again);
        assert_eq!(keeper[slot].text, "first");
        assert_eq!(keeper.len(), 1);
    }

    #[test]
    fn merge_rejects_identity_changes() {
        let mut keeper = RecordKeeper::new();
        let (slot, _) = keeper.keep(note(1, "a"));
        let err = keeper.merge(slot, note(2, "b")).unwrap_err();
        assert!(matches!(err, CategorizationError::IdentityChanged(_)));
        assert_eq!(keeper[slot], note(1, "a"));
        let previous = keeper.merge(slot, note(1, "c")).unwrap();
        assert_eq!(previous.text, "a");
        assert_eq!(keeper[slot].text, "c");
    }

    #[test]
    fn release_forgets_identity() {
        let mut keeper = RecordKeeper::new();
        let (slot, _) = keeper.keep(note(3, "x"));
        assert_eq!(keeper.release(slot), Some(note(3, "x")));
        assert_eq!(keeper.slot_of(&3), None);
        assert!(keeper.is_empty());
    }
}
