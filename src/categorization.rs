use std::collections::HashSet;

use tracing::{debug, warn};

use crate::category::{Categories, Category, CategoryRef, Predicate};
use crate::change::ViewChange;
use crate::derive::{Scope, derive};
use crate::error::{CategorizationError, Result};
use crate::keeper::{RecordKeeper, Slot, SlotHasher};
use crate::order::{Comparator, Entry, SortPredicate, ViewOrder};
use crate::record::Record;
use crate::selection::Selection;
use crate::settings::Settings;

// ------------- Categorization -------------
/// The engine: a master collection of records, a list of categories, and
/// the working view derived from both.
///
/// Every mutation returns a [`ViewChange`] describing how the working view
/// changed. A mutation that fails leaves the categorization exactly as it
/// was before the call.
pub struct Categorization<R: Record> {
    pub(crate) keeper: RecordKeeper<R>,
    pub(crate) items: Vec<Slot>,
    pub(crate) view: Vec<Entry>,
    pub(crate) categories: Categories<R>,
    pub(crate) selected_category: Option<usize>,
    pub(crate) filter: Predicate<R>,
    pub(crate) sort_predicate: Option<SortPredicate<R>>,
    pub(crate) sorted: bool,
    pub(crate) selection: Selection,
    pub(crate) settings: Settings,
    // every non-empty change made while this is set, in order
    pub(crate) journal: Option<Vec<ViewChange>>,
}

impl<R: Record> Categorization<R> {
    pub fn new(items: Vec<R>, categories: Vec<Category<R>>) -> Result<Self> {
        Self::with_settings(items, categories, None, Settings::default())
    }
    pub fn with_filter(items: Vec<R>, categories: Vec<Category<R>>, filter: Predicate<R>) -> Result<Self> {
        Self::with_settings(items, categories, Some(filter), Settings::default())
    }
    /// Fails when category titles are not unique or the settings are invalid.
    /// Records sharing an identity are merged into the first of them.
    pub fn with_settings(
        items: Vec<R>,
        categories: Vec<Category<R>>,
        filter: Option<Predicate<R>>,
        settings: Settings,
    ) -> Result<Self> {
        settings.validate()?;
        let categories = Categories::new(categories)?;
        let (keeper, items) = keep_all(items)?;
        let mut categorization = Self {
            keeper,
            items,
            view: Vec::new(),
            categories,
            selected_category: None,
            filter: filter.unwrap_or_else(Predicate::always),
            sort_predicate: None,
            sorted: settings.sorted,
            selection: Selection::new(),
            settings,
            journal: None,
        };
        categorization.view = categorization.derive_view()?;
        debug!(
            items = categorization.items.len(),
            categories = categorization.categories.len(),
            rows = categorization.view.len(),
            "categorization created"
        );
        Ok(categorization)
    }

    // ------------- derivation -------------
    pub(crate) fn selected(&self) -> Option<&Category<R>> {
        self.selected_category.map(|i| &self.categories[i])
    }
    pub(crate) fn derive_view(&self) -> Result<Vec<Entry>> {
        let scope = Scope::new(&self.filter, self.selected());
        let order = ViewOrder::new(
            &self.keeper,
            Comparator::select(self.sorted, self.sort_predicate.as_ref()),
            scope.is_grouped(),
        );
        derive(&self.keeper, &self.items, &scope, &order)
    }
    // swaps in a freshly derived view, carrying the selection over
    pub(crate) fn install(&mut self, view: Vec<Entry>) {
        self.selection = self.selection.reconcile(&self.view, &view);
        self.view = view;
    }
    pub(crate) fn note(&mut self, change: ViewChange) -> ViewChange {
        if let Some(journal) = self.journal.as_mut() {
            if !change.is_empty() {
                journal.push(change.clone());
            }
        }
        change
    }
    /// Rebuilds the working view from scratch.
    pub fn recompute(&mut self) -> Result<ViewChange> {
        let view = self.derive_view()?;
        self.install(view);
        debug!(rows = self.view.len(), "working view recomputed");
        Ok(self.note(ViewChange::Reset))
    }
    // rebuild after a configuration change, undoing the change on failure
    fn rederive_or(&mut self, undo: impl FnOnce(&mut Self)) -> Result<ViewChange> {
        match self.derive_view() {
            Ok(view) => {
                self.install(view);
                debug!(rows = self.view.len(), "working view rebuilt");
                Ok(self.note(ViewChange::Reset))
            }
            Err(e) => {
                undo(self);
                warn!(error = %e, "rebuilding the working view failed, configuration kept");
                Err(e)
            }
        }
    }

    // ------------- configuration -------------
    /// Replaces the master collection. Selected rows stay selected when
    /// the new records still show a row with the same identity and group.
    pub fn set_items(&mut self, records: Vec<R>) -> Result<ViewChange> {
        let (keeper, items) = keep_all(records)?;
        // slots of the new keeper say nothing about the old rows, keys do
        let selected: HashSet<(R::Key, u32), SlotHasher> = self
            .selection
            .iter()
            .filter_map(|index| self.view.get(index))
            .map(|entry| (self.keeper[entry.slot].key(), entry.group))
            .collect();
        let keeper = std::mem::replace(&mut self.keeper, keeper);
        let items = std::mem::replace(&mut self.items, items);
        let selection = std::mem::take(&mut self.selection);
        let change = self.rederive_or(move |c| {
            c.keeper = keeper;
            c.items = items;
            c.selection = selection;
        })?;
        self.selection = self
            .view
            .iter()
            .enumerate()
            .filter(|(_, entry)| selected.contains(&(self.keeper[entry.slot].key(), entry.group)))
            .map(|(index, _)| index)
            .collect();
        Ok(change)
    }
    pub fn set_filter(&mut self, filter: Predicate<R>) -> Result<ViewChange> {
        let previous = std::mem::replace(&mut self.filter, filter);
        self.rederive_or(move |c| c.filter = previous)
    }
    pub fn clear_filter(&mut self) -> Result<ViewChange> {
        self.set_filter(Predicate::always())
    }
    pub fn select_category<'a>(&mut self, category: impl Into<CategoryRef<'a>>) -> Result<ViewChange> {
        let index = self.categories.resolve(category.into())?;
        self.set_selected_category(Some(index))
    }
    pub fn clear_category_selection(&mut self) -> Result<ViewChange> {
        self.set_selected_category(None)
    }
    fn set_selected_category(&mut self, index: Option<usize>) -> Result<ViewChange> {
        if index == self.selected_category {
            return Ok(ViewChange::none());
        }
        let previous = std::mem::replace(&mut self.selected_category, index);
        self.rederive_or(move |c| c.selected_category = previous)
    }
    pub fn set_sort_predicate(&mut self, predicate: Option<SortPredicate<R>>) -> Result<ViewChange> {
        let unchanged = match (&self.sort_predicate, &predicate) {
            (None, None) => true,
            (Some(current), Some(new)) => current.same(new),
            _ => false,
        };
        if unchanged {
            return Ok(ViewChange::none());
        }
        let previous = std::mem::replace(&mut self.sort_predicate, predicate);
        self.rederive_or(move |c| c.sort_predicate = previous)
    }
    pub fn set_sorted(&mut self, sorted: bool) -> Result<ViewChange> {
        if sorted == self.sorted {
            return Ok(ViewChange::none());
        }
        self.sorted = sorted;
        self.rederive_or(move |c| c.sorted = !sorted)
    }
    /// Replaces the category list. The selected category stays selected
    /// when the new list has a category with the same title.
    pub fn set_categories(&mut self, categories: Vec<Category<R>>) -> Result<ViewChange> {
        let categories = Categories::new(categories)?;
        let selected = self
            .selected()
            .and_then(|c| categories.position(c.title()));
        let previous = std::mem::replace(&mut self.categories, categories);
        let previous_selected = std::mem::replace(&mut self.selected_category, selected);
        self.rederive_or(move |c| {
            c.categories = previous;
            c.selected_category = previous_selected;
        })
    }

    // ------------- queries -------------
    pub fn len(&self) -> usize {
        self.items.len()
    }
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
    /// The master collection, in master order.
    pub fn items(&self) -> impl Iterator<Item = &R> + '_ {
        self.items.iter().map(|slot| &self.keeper[*slot])
    }
    pub fn get(&self, key: &R::Key) -> Option<&R> {
        self.keeper.slot_of(key).and_then(|slot| self.keeper.get(slot))
    }
    pub fn contains(&self, key: &R::Key) -> bool {
        self.keeper.slot_of(key).is_some()
    }
    pub fn view_len(&self) -> usize {
        self.view.len()
    }
    pub fn view_is_empty(&self) -> bool {
        self.view.is_empty()
    }
    /// The working view, row by row.
    pub fn working_view(&self) -> impl Iterator<Item = &R> + '_ {
        self.view.iter().map(|entry| &self.keeper[entry.slot])
    }
    pub fn view_item(&self, index: usize) -> Option<&R> {
        self.view.get(index).map(|entry| &self.keeper[entry.slot])
    }
    /// First row showing the record with this identity.
    pub fn index_in_view(&self, key: &R::Key) -> Option<usize> {
        let slot = self.keeper.slot_of(key)?;
        self.view.iter().position(|entry| entry.slot == slot)
    }
    /// Checks the working view against a from-scratch derivation and the
    /// view order.
    pub fn verify(&self) -> Result<bool> {
        let scope = Scope::new(&self.filter, self.selected());
        let order = ViewOrder::new(
            &self.keeper,
            Comparator::select(self.sorted, self.sort_predicate.as_ref()),
            scope.is_grouped(),
        );
        Ok(order.is_ordered(&self.view)? && self.derive_view()? == self.view)
    }

    pub fn categories(&self) -> &[Category<R>] {
        self.categories.as_slice()
    }
    pub fn category<'a>(&self, category: impl Into<CategoryRef<'a>>) -> Option<&Category<R>> {
        let index = self.categories.resolve(category.into()).ok()?;
        self.categories.get(index)
    }
    pub fn category_index(&self, title: &str) -> Option<usize> {
        self.categories.position(title)
    }
    pub fn selected_category(&self) -> Option<&Category<R>> {
        self.selected()
    }
    pub fn selected_category_index(&self) -> Option<usize> {
        self.selected_category
    }
    pub fn filter(&self) -> &Predicate<R> {
        &self.filter
    }
    pub fn sort_predicate(&self) -> Option<&SortPredicate<R>> {
        self.sort_predicate.as_ref()
    }
    pub fn is_sorted(&self) -> bool {
        self.sorted
    }
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The records of a category under the current filter and sorting,
    /// whatever category is selected.
    pub fn items_for_category<'a>(&self, category: impl Into<CategoryRef<'a>>) -> Result<Vec<&R>> {
        let index = self.categories.resolve(category.into())?;
        let scope = Scope::new(&self.filter, Some(&self.categories[index]));
        let order = ViewOrder::new(
            &self.keeper,
            Comparator::select(self.sorted, self.sort_predicate.as_ref()),
            scope.is_grouped(),
        );
        let rows = derive(&self.keeper, &self.items, &scope, &order)?;
        Ok(rows.iter().map(|entry| &self.keeper[entry.slot]).collect())
    }
    pub fn number_of_items_in_category<'a>(&self, category: impl Into<CategoryRef<'a>>) -> Result<usize> {
        let index = self.categories.resolve(category.into())?;
        Ok(self.count_rows(index))
    }
    fn count_rows(&self, index: usize) -> usize {
        let scope = Scope::new(&self.filter, Some(&self.categories[index]));
        self.items
            .iter()
            .map(|slot| scope.groups(&self.keeper[*slot]).len())
            .sum()
    }
    /// A category is visible when it is always visible or has any records.
    pub fn is_visible_category<'a>(&self, category: impl Into<CategoryRef<'a>>) -> Result<bool> {
        let index = self.categories.resolve(category.into())?;
        Ok(self.is_visible(index))
    }
    fn is_visible(&self, index: usize) -> bool {
        self.categories[index].is_always_visible() || self.count_rows(index) > 0
    }
    /// Visible categories by sort index, ties in declared order.
    pub fn visible_categories(&self) -> Vec<&Category<R>> {
        let mut visible: Vec<&Category<R>> = (0..self.categories.len())
            .filter(|i| self.is_visible(*i))
            .map(|i| &self.categories[i])
            .collect();
        visible.sort_by_key(|c| c.sort_index());
        visible
    }
    pub fn number_of_visible_categories(&self) -> usize {
        (0..self.categories.len()).filter(|i| self.is_visible(*i)).count()
    }

    // ------------- selection -------------
    pub fn selection(&self) -> &Selection {
        &self.selection
    }
    /// Replaces the selection; every index must name a row of the view.
    pub fn set_selection(&mut self, indices: impl IntoIterator<Item = usize>) -> Result<()> {
        let indices: Vec<usize> = indices.into_iter().collect();
        if let Some(index) = indices.iter().copied().find(|i| *i >= self.view.len()) {
            return Err(CategorizationError::IndexOutOfRange {
                index,
                len: self.view.len(),
            });
        }
        self.selection = indices.into_iter().collect();
        Ok(())
    }
    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }
    pub fn selected_items(&self) -> Vec<&R> {
        self.selection
            .iter()
            .filter_map(|index| self.view_item(index))
            .collect()
    }
}

// Keeps records in order, merging later duplicates of an identity into the
// first one.
fn keep_all<R: Record>(records: Vec<R>) -> Result<(RecordKeeper<R>, Vec<Slot>)> {
    let mut keeper = RecordKeeper::new();
    let mut items = Vec::with_capacity(records.len());
    for record in records {
        match keeper.slot_of(&record.key()) {
            Some(slot) => {
                keeper.merge(slot, record)?;
            }
            None => {
                let (slot, _) = keeper.keep(record);
                items.push(slot);
            }
        }
    }
    Ok((keeper, items))
}
