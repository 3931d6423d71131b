//! Derivation of the working view from the master collection.

use crate::category::{Category, Predicate};
use crate::error::Result;
use crate::keeper::{RecordKeeper, Slot};
use crate::order::{Entry, ViewOrder};
use crate::record::Record;

// ------------- Scope -------------
/// What a view shows: the user filter combined with a category (none means
/// every record passes the category test).
pub(crate) struct Scope<'a, R> {
    filter: &'a Predicate<R>,
    category: Option<&'a Category<R>>,
}

impl<'a, R> Scope<'a, R> {
    pub fn new(filter: &'a Predicate<R>, category: Option<&'a Category<R>>) -> Self {
        Self { filter, category }
    }
    pub fn is_grouped(&self) -> bool {
        self.category.is_some_and(|c| c.is_sorted_by_subcategories())
    }
    /// The groups under which `record` appears in the view; empty when the
    /// record is filtered out. Ungrouped views use the single group 0.
    pub fn groups(&self, record: &R) -> Vec<u32> {
        if !self.filter.test(record) {
            return Vec::new();
        }
        match self.category {
            Some(category) if self.is_grouped() => category.groups(record),
            Some(category) if !category.evaluate(record) => Vec::new(),
            _ => vec![0],
        }
    }
}

/// Full derivation: select every record of `items` the scope admits, then
/// bring the rows into view order. A record grouped under several
/// subcategories yields one row per group, and without duplicates only its
/// first group, which is where the first occurrence would sit.
pub(crate) fn derive<R: Record>(
    keeper: &RecordKeeper<R>,
    items: &[Slot],
    scope: &Scope<'_, R>,
    order: &ViewOrder<'_, R>,
) -> Result<Vec<Entry>> {
    let mut rows = Vec::new();
    for slot in items {
        for group in scope.groups(&keeper[*slot]) {
            rows.push(Entry::new(*slot, group));
        }
    }
    order.sort(&mut rows)?;
    Ok(rows)
}
