mod common;

use categorization::{Categorization, CategorizationError, Category, Predicate};
use common::{by_value, item, Item};

fn sorted_abc() -> Categorization<Item> {
    let mut c = Categorization::new(vec![item("A", 3), item("B", 1), item("C", 2)], vec![])
        .expect("created");
    c.set_sort_predicate(Some(by_value())).expect("predicate set");
    c.set_sorted(true).expect("sorted");
    c
}

fn selected_names(c: &Categorization<Item>) -> Vec<&str> {
    c.selected_items().iter().map(|i| i.name.as_str()).collect()
}

#[test]
fn selection_follows_a_repositioned_row() {
    let mut c = sorted_abc();
    c.set_selection([0]).expect("selected");
    assert_eq!(selected_names(&c), vec!["B"]);
    c.update_item(item("B", 5)).expect("updated");
    assert_eq!(c.selection().to_vec(), vec![2]);
    assert_eq!(selected_names(&c), vec!["B"]);
}

#[test]
fn insertion_shifts_selected_rows() {
    let mut c = sorted_abc();
    c.set_selection([1, 2]).expect("selected");
    c.insert_item(item("Z", 0)).expect("inserted");
    assert_eq!(c.selection().to_vec(), vec![2, 3]);
    assert_eq!(selected_names(&c), vec!["C", "A"]);
}

#[test]
fn removed_rows_leave_the_selection() {
    let mut c = sorted_abc();
    c.set_selection([0, 2]).expect("selected");
    c.remove_items(|i| i.name == "B").expect("removed");
    assert_eq!(c.selection().to_vec(), vec![1]);
    assert_eq!(selected_names(&c), vec!["A"]);
}

#[test]
fn recompute_keeps_surviving_rows_selected() {
    let mut c = sorted_abc();
    c.set_selection([0, 1, 2]).expect("selected");
    c.set_filter(Predicate::new(|i: &Item| i.name != "C")).expect("filtered");
    assert_eq!(selected_names(&c), vec!["B", "A"]);
    c.set_sorted(false).expect("unsorted");
    assert_eq!(selected_names(&c), vec!["A", "B"]);
    assert_eq!(c.selection().len(), 2);
}

#[test]
fn manual_moves_carry_the_selection() {
    let mut c = Categorization::new(vec![item("P", 0), item("Q", 0), item("R", 0)], vec![])
        .expect("created");
    c.set_selection([0]).expect("selected");
    c.move_item(0, 3).expect("moved");
    assert_eq!(c.selection().to_vec(), vec![2]);
    assert_eq!(selected_names(&c), vec!["P"]);
}

#[test]
fn out_of_range_selection_is_rejected() {
    let mut c = sorted_abc();
    c.set_selection([1]).expect("selected");
    let err = c.set_selection([0, 3]).unwrap_err();
    assert_eq!(err, CategorizationError::IndexOutOfRange { index: 3, len: 3 });
    assert_eq!(c.selection().to_vec(), vec![1]);
    c.clear_selection();
    assert!(c.selection().is_empty());
    assert!(c.selected_items().is_empty());
}

#[cfg(target_pointer_width = "64")]
#[test]
fn indices_beyond_u32_are_rejected_not_wrapped() {
    let mut c = Categorization::new(vec![item("A", 1), item("B", 2)], vec![]).expect("created");
    let err = c.set_selection([1usize << 32]).unwrap_err();
    assert_eq!(err, CategorizationError::IndexOutOfRange { index: 1 << 32, len: 2 });
    assert!(c.selection().is_empty());
}

#[test]
fn replaced_items_keep_the_selection_by_identity() {
    let mut c = Categorization::new(vec![item("A", 1), item("B", 2)], vec![]).expect("created");
    c.set_selection([1]).expect("selected");
    c.set_items(vec![item("Z", 0), item("A", 1), item("B", 7)])
        .expect("replaced");
    assert_eq!(c.selection().to_vec(), vec![2]);
    assert_eq!(selected_names(&c), vec!["B"]);
    assert_eq!(c.selected_items()[0].value, 7);

    c.set_items(vec![item("A", 1)]).expect("replaced");
    assert!(c.selection().is_empty());
}

#[test]
fn replaced_items_keep_the_selected_group() {
    let bands = Category::compound(
        "bands",
        vec![
            Category::new("small", |i: &Item| i.value < 10),
            Category::new("odd", |i: &Item| i.value % 2 == 1),
        ],
    )
    .sorted_by_subcategories(true)
    .allowing_duplicates(true);
    let mut c = Categorization::new(vec![item("A", 3), item("B", 4)], vec![bands]).expect("created");
    c.select_category("bands").expect("selected");
    // A under small, B under small, A under odd
    c.set_selection([2]).expect("selected");
    c.set_items(vec![item("Z", 1), item("A", 3), item("B", 4)])
        .expect("replaced");
    // Z, A, B under small, then Z, A under odd
    assert_eq!(c.view_len(), 5);
    assert_eq!(c.selection().to_vec(), vec![4]);
    assert_eq!(selected_names(&c), vec!["A"]);
}
