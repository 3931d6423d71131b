mod common;

use categorization::{Categorization, Category, Delta, ViewChange};
use common::{above, assert_consistent, by_value, item, master, names, strings};

fn abc() -> Vec<common::Item> {
    vec![item("A", 3), item("B", 1), item("C", 2)]
}

#[test]
fn sorted_ascending() {
    let mut c = Categorization::new(abc(), vec![]).expect("created");
    assert_eq!(names(&c), strings(&["A", "B", "C"]));
    c.set_sort_predicate(Some(by_value())).expect("predicate set");
    let change = c.set_sorted(true).expect("sorted");
    assert!(change.is_reset());
    assert_eq!(names(&c), strings(&["B", "C", "A"]));
    assert_consistent(&c);
}

#[test]
fn natural_order_is_the_fallback() {
    let mut c = Categorization::new(abc(), vec![]).expect("created");
    c.set_sorted(true).expect("sorted");
    assert!(c.sort_predicate().is_none());
    assert_eq!(names(&c), strings(&["B", "C", "A"]));
}

#[test]
fn category_unsorted_keeps_master_order() {
    let mut c = Categorization::new(abc(), vec![above("big", 1)]).expect("created");
    c.select_category("big").expect("selected");
    assert_eq!(names(&c), strings(&["A", "C"]));
    assert_consistent(&c);
}

#[test]
fn update_repositions_in_sorted_view() {
    let mut c = Categorization::new(abc(), vec![]).expect("created");
    c.set_sort_predicate(Some(by_value())).expect("predicate set");
    c.set_sorted(true).expect("sorted");
    let change = c.update_item(item("B", 5)).expect("updated");
    assert_eq!(
        change,
        ViewChange::Deltas(vec![Delta::Moved { from: 0, to: 2 }, Delta::Replaced { index: 2 }])
    );
    assert_eq!(names(&c), strings(&["C", "A", "B"]));
    assert_eq!(c.get(&"B".to_string()).expect("kept").value, 5);
    assert_consistent(&c);
}

#[test]
fn compound_grouped_without_duplicates() {
    let bands = Category::compound(
        "bands",
        vec![
            Category::new("low", |i: &common::Item| i.value <= 1),
            Category::new("high", |i: &common::Item| i.value >= 2),
        ],
    )
    .sorted_by_subcategories(true);
    let mut c = Categorization::new(abc(), vec![bands]).expect("created");
    c.select_category("bands").expect("selected");
    assert_eq!(names(&c), strings(&["B", "A", "C"]));
    assert_consistent(&c);
}

#[test]
fn move_items_to_contiguous_destination() {
    let records = vec![item("P", 0), item("Q", 0), item("R", 0), item("S", 0)];
    let mut c = Categorization::new(records, vec![]).expect("created");
    let change = c.move_items([0, 2], 3).expect("moved");
    assert_eq!(change, ViewChange::Deltas(vec![Delta::Moved { from: 1, to: 0 }]));
    assert_eq!(names(&c), strings(&["Q", "P", "R", "S"]));
    // the master collection follows the manual order
    assert_eq!(master(&c), strings(&["Q", "P", "R", "S"]));
    assert_consistent(&c);
}

#[test]
fn inserting_an_existing_identity_merges() {
    let mut c = Categorization::new(abc(), vec![]).expect("created");
    let change = c.insert_item(item("A", 9)).expect("merged");
    assert_eq!(change, ViewChange::Deltas(vec![Delta::Replaced { index: 0 }]));
    assert_eq!(c.len(), 3);
    assert_eq!(c.get(&"A".to_string()).expect("kept").value, 9);
}

#[test]
fn recompute_is_idempotent() {
    let mut c = Categorization::new(abc(), vec![above("big", 1)]).expect("created");
    c.select_category(0usize).expect("selected");
    c.set_sorted(true).expect("sorted");
    let before = names(&c);
    assert!(c.recompute().expect("recomputed").is_reset());
    assert!(c.recompute().expect("recomputed").is_reset());
    assert_eq!(names(&c), before);
}
