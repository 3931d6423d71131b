// Shared fixtures for the integration tests.
#![allow(dead_code)]

use categorization::{Categorization, Category, Record, SortPredicate};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Item {
    pub value: i64,
    pub name: String,
}

impl Record for Item {
    type Key = String;
    fn key(&self) -> String {
        self.name.clone()
    }
    fn merge(&mut self, other: Self) {
        self.value = other.value;
    }
}

pub fn item(name: &str, value: i64) -> Item {
    Item {
        value,
        name: name.to_string(),
    }
}

pub fn by_value() -> SortPredicate<Item> {
    SortPredicate::by_key(|i: &Item| i.value)
}

pub fn above(title: &str, threshold: i64) -> Category<Item> {
    Category::new(title, move |i: &Item| i.value > threshold)
}

/// Names in the working view, row by row.
pub fn names(c: &Categorization<Item>) -> Vec<String> {
    c.working_view().map(|i| i.name.clone()).collect()
}

/// Names in the master collection.
pub fn master(c: &Categorization<Item>) -> Vec<String> {
    c.items().map(|i| i.name.clone()).collect()
}

pub fn strings(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

pub fn assert_consistent(c: &Categorization<Item>) {
    assert!(c.verify().expect("view derivable"), "working view drifted from recompute");
}
