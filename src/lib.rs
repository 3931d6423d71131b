//! Categorization – an incrementally maintained, categorized view over a collection of records.
//!
//! A [`Categorization`] owns a *master collection* of records and a list of
//! [`Category`]s. From those it derives the *working view*: the records that
//! pass the user filter and the selected category, in view order. The view
//! is kept up to date incrementally: inserting, updating, removing or moving
//! records touches only the affected rows and reports what happened as a
//! [`ViewChange`], a sequence of row-level [`Delta`]s a presentation layer
//! can replay (or a reset, when the view was rebuilt as a whole).
//!
//! * A [`Record`] has an identity (its key), a natural order and an in-place
//!   merge. Records with the same key are the same logical record.
//! * A [`Category`] is either a named predicate or a compound of
//!   subcategories. A compound category may group the view by subcategory,
//!   and may show a record once per matching subcategory.
//! * The view order is subcategory group (when grouped), then the sort
//!   predicate or natural order (when sorted), then master order.
//!
//! ## Modules
//! * [`categorization`] – The engine: construction, configuration, queries.
//! * [`category`] – Categories, predicates and category lookup by title or index.
//! * [`change`] – [`Delta`] and [`ViewChange`], the change stream of the view.
//! * [`keeper`] – The record arena: every record is kept once and referenced by slot.
//! * [`order`] – Sort predicates and the total order of the working view.
//! * [`selection`] – The selected rows, carried along as the view changes.
//! * [`settings`] – Tunables loaded through the `config` crate.
//! * [`interface`] – [`SharedCategorization`], thread-safe access with change subscriptions.
//!
//! ## Failures
//! Every fallible operation returns [`error::Result`]. An operation that fails
//! (a comparator error, an identity-changing merge, an out-of-range index)
//! leaves the categorization exactly as it was before the call.
//!
//! ## Quick Start
//! ```
//! use categorization::{Categorization, Category, Delta, Record, ViewChange};
//!
//! #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
//! struct Task { priority: u8, id: u32, done: bool }
//!
//! impl Record for Task {
//!     type Key = u32;
//!     fn key(&self) -> u32 { self.id }
//!     fn merge(&mut self, other: Self) {
//!         self.priority = other.priority;
//!         self.done = other.done;
//!     }
//! }
//!
//! let tasks = vec![
//!     Task { priority: 2, id: 1, done: false },
//!     Task { priority: 1, id: 2, done: true },
//! ];
//! let open = Category::new("Open", |t: &Task| !t.done);
//! let mut tasks = Categorization::new(tasks, vec![open]).unwrap();
//! tasks.select_category("Open").unwrap();
//! assert_eq!(tasks.view_len(), 1);
//! let change = tasks.insert_item(Task { priority: 0, id: 3, done: false }).unwrap();
//! assert_eq!(change, ViewChange::Deltas(vec![Delta::Inserted { index: 1 }]));
//! ```

pub mod categorization;
pub mod category;
pub mod change;
mod derive;
pub mod error;
mod incremental;
pub mod interface;
pub mod keeper;
pub mod order;
pub mod record;
pub mod selection;
pub mod settings;

pub use categorization::Categorization;
pub use category::{Category, CategoryKind, CategoryRef, Predicate};
pub use change::{Delta, ViewChange};
pub use error::{CategorizationError, Result};
pub use interface::SharedCategorization;
pub use order::SortPredicate;
pub use record::Record;
pub use selection::Selection;
pub use settings::Settings;
