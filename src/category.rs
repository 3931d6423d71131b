use std::collections::HashMap;
use std::fmt;
use std::ops::Index;
use std::sync::Arc;

use crate::error::{CategorizationError, Result};
use crate::keeper::SlotHasher;

// ------------- Predicate -------------
type Test<R> = dyn Fn(&R) -> bool + Send + Sync;

/// A boolean test over records. Cheap to clone.
pub struct Predicate<R>(Arc<Test<R>>);

impl<R> Predicate<R> {
    pub fn new<F>(test: F) -> Self
    where
        F: Fn(&R) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(test))
    }
    pub fn always() -> Self
    where
        R: 'static,
    {
        Self::new(|_| true)
    }
    pub fn test(&self, record: &R) -> bool {
        (self.0)(record)
    }
}

impl<R> Clone for Predicate<R> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<R> fmt::Debug for Predicate<R> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Predicate")
    }
}

// ------------- Category -------------
pub enum CategoryKind<R> {
    Simple(Predicate<R>),
    Compound {
        subcategories: Vec<Category<R>>,
        sorted_by_subcategories: bool,
        allowing_duplicates: bool,
    },
}

impl<R> Clone for CategoryKind<R> {
    fn clone(&self) -> Self {
        match self {
            CategoryKind::Simple(predicate) => CategoryKind::Simple(predicate.clone()),
            CategoryKind::Compound {
                subcategories,
                sorted_by_subcategories,
                allowing_duplicates,
            } => CategoryKind::Compound {
                subcategories: subcategories.clone(),
                sorted_by_subcategories: *sorted_by_subcategories,
                allowing_duplicates: *allowing_duplicates,
            },
        }
    }
}

/// A titled test that selects records for display, together with its
/// display metadata. Compound categories OR together their subcategories.
///
/// Categories are immutable once built; the builder-style methods consume
/// and return the category.
pub struct Category<R> {
    title: String,
    sort_index: i32,
    always_visible: bool,
    kind: CategoryKind<R>,
}

impl<R> Category<R> {
    pub fn new<F>(title: impl Into<String>, test: F) -> Self
    where
        F: Fn(&R) -> bool + Send + Sync + 'static,
    {
        Self::with_predicate(title, Predicate::new(test))
    }
    pub fn with_predicate(title: impl Into<String>, predicate: Predicate<R>) -> Self {
        Self {
            title: title.into(),
            sort_index: 0,
            always_visible: false,
            kind: CategoryKind::Simple(predicate),
        }
    }
    pub fn compound(title: impl Into<String>, subcategories: Vec<Category<R>>) -> Self {
        Self {
            title: title.into(),
            sort_index: 0,
            always_visible: false,
            kind: CategoryKind::Compound {
                subcategories,
                sorted_by_subcategories: false,
                allowing_duplicates: false,
            },
        }
    }
    pub fn with_sort_index(mut self, sort_index: i32) -> Self {
        self.sort_index = sort_index;
        self
    }
    pub fn always_visible(mut self) -> Self {
        self.always_visible = true;
        self
    }
    // no effect on simple categories
    pub fn sorted_by_subcategories(mut self, sorted: bool) -> Self {
        if let CategoryKind::Compound {
            sorted_by_subcategories,
            ..
        } = &mut self.kind
        {
            *sorted_by_subcategories = sorted;
        }
        self
    }
    // no effect on simple categories
    pub fn allowing_duplicates(mut self, allowing: bool) -> Self {
        if let CategoryKind::Compound {
            allowing_duplicates,
            ..
        } = &mut self.kind
        {
            *allowing_duplicates = allowing;
        }
        self
    }
    pub fn title(&self) -> &str {
        &self.title
    }
    pub fn sort_index(&self) -> i32 {
        self.sort_index
    }
    pub fn is_always_visible(&self) -> bool {
        self.always_visible
    }
    pub fn kind(&self) -> &CategoryKind<R> {
        &self.kind
    }
    pub fn is_compound(&self) -> bool {
        matches!(self.kind, CategoryKind::Compound { .. })
    }
    pub fn subcategories(&self) -> &[Category<R>] {
        match &self.kind {
            CategoryKind::Simple(_) => &[],
            CategoryKind::Compound { subcategories, .. } => subcategories,
        }
    }
    pub fn is_sorted_by_subcategories(&self) -> bool {
        matches!(
            self.kind,
            CategoryKind::Compound {
                sorted_by_subcategories: true,
                ..
            }
        )
    }
    pub fn is_allowing_duplicates(&self) -> bool {
        matches!(
            self.kind,
            CategoryKind::Compound {
                allowing_duplicates: true,
                ..
            }
        )
    }
    /// Evaluates the category against a record. For a compound category
    /// this is the OR of its subcategories, taken in declared order.
    pub fn evaluate(&self, record: &R) -> bool {
        match &self.kind {
            CategoryKind::Simple(predicate) => predicate.test(record),
            CategoryKind::Compound { subcategories, .. } => {
                subcategories.iter().any(|sub| sub.evaluate(record))
            }
        }
    }
    /// The subcategory groups a record is shown under when the category
    /// groups its view by subcategory. Without duplicates only the first
    /// matching group is returned.
    pub(crate) fn groups(&self, record: &R) -> Vec<u32> {
        let mut groups = Vec::new();
        if let CategoryKind::Compound {
            subcategories,
            allowing_duplicates,
            ..
        } = &self.kind
        {
            for (group, sub) in subcategories.iter().enumerate() {
                if sub.evaluate(record) {
                    groups.push(group as u32);
                    if !allowing_duplicates {
                        break;
                    }
                }
            }
        }
        groups
    }
}

impl<R> Clone for Category<R> {
    fn clone(&self) -> Self {
        Self {
            title: self.title.clone(),
            sort_index: self.sort_index,
            always_visible: self.always_visible,
            kind: self.kind.clone(),
        }
    }
}

impl<R> fmt::Debug for Category<R> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Category")
            .field("title", &self.title)
            .field("sort_index", &self.sort_index)
            .field("always_visible", &self.always_visible)
            .field("compound", &self.is_compound())
            .field("subcategories", &self.subcategories().len())
            .finish()
    }
}

impl<R> fmt::Display for Category<R> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_compound() {
            let titles: Vec<&str> = self.subcategories().iter().map(|c| c.title()).collect();
            write!(f, "{} [{}]", self.title, titles.join(" | "))
        } else {
            write!(f, "{}", self.title)
        }
    }
}

// ------------- CategoryRef -------------
/// Names a category either by its position or by its title.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryRef<'a> {
    Index(usize),
    Title(&'a str),
}

impl From<usize> for CategoryRef<'_> {
    fn from(index: usize) -> Self {
        CategoryRef::Index(index)
    }
}

impl<'a> From<&'a str> for CategoryRef<'a> {
    fn from(title: &'a str) -> Self {
        CategoryRef::Title(title)
    }
}

impl<'a> From<&'a String> for CategoryRef<'a> {
    fn from(title: &'a String) -> Self {
        CategoryRef::Title(title.as_str())
    }
}

impl fmt::Display for CategoryRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CategoryRef::Index(index) => write!(f, "#{}", index),
            CategoryRef::Title(title) => write!(f, "'{}'", title),
        }
    }
}

// ------------- Categories -------------
/// The ordered category list of a categorization, with title lookup.
pub struct Categories<R> {
    list: Vec<Category<R>>,
    titles: HashMap<String, usize, SlotHasher>,
}

impl<R> Categories<R> {
    /// Fails when two categories share a title, since titles are the lookup key.
    pub fn new(list: Vec<Category<R>>) -> Result<Self> {
        let mut titles = HashMap::<String, usize, SlotHasher>::default();
        for (index, category) in list.iter().enumerate() {
            if titles.insert(category.title.clone(), index).is_some() {
                return Err(CategorizationError::DuplicateCategory {
                    title: category.title.clone(),
                });
            }
        }
        Ok(Self { list, titles })
    }
    pub fn resolve(&self, category: CategoryRef<'_>) -> Result<usize> {
        match category {
            CategoryRef::Index(index) if index < self.list.len() => Ok(index),
            CategoryRef::Title(title) => self
                .titles
                .get(title)
                .copied()
                .ok_or_else(|| CategorizationError::UnknownCategory(category.to_string())),
            CategoryRef::Index(_) => Err(CategorizationError::UnknownCategory(category.to_string())),
        }
    }
    pub fn position(&self, title: &str) -> Option<usize> {
        self.titles.get(title).copied()
    }
    pub fn get(&self, index: usize) -> Option<&Category<R>> {
        self.list.get(index)
    }
    pub fn as_slice(&self) -> &[Category<R>] {
        &self.list
    }
    pub fn len(&self) -> usize {
        self.list.len()
    }
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }
}

impl<R> Index<usize> for Categories<R> {
    type Output = Category<R>;
    fn index(&self, index: usize) -> &Category<R> {
        &self.list[index]
    }
}
