use std::hint::black_box;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};

use categorization::{Categorization, Category, Record, SortPredicate};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct Reading {
    value: u64,
    id: u64,
}

impl Record for Reading {
    type Key = u64;
    fn key(&self) -> u64 {
        self.id
    }
    fn merge(&mut self, other: Self) {
        self.value = other.value;
    }
}

// cheap deterministic spread of values
fn scramble(i: u64) -> u64 {
    i.wrapping_mul(0x9E37_79B9_7F4A_7C15) % 1_000_003
}

fn readings(n: u64) -> Vec<Reading> {
    (0..n)
        .map(|id| Reading {
            value: scramble(id),
            id,
        })
        .collect()
}

fn build(n: u64) -> Categorization<Reading> {
    let categories = vec![
        Category::new("Even", |r: &Reading| r.value % 2 == 0),
        Category::compound(
            "Bands",
            vec![
                Category::new("Low", |r: &Reading| r.value < 300_000),
                Category::new("Mid", |r: &Reading| r.value < 700_000),
                Category::new("High", |r: &Reading| r.value >= 700_000),
            ],
        )
        .sorted_by_subcategories(true)
        .allowing_duplicates(true),
    ];
    let mut categorization = match Categorization::new(readings(n), categories) {
        Ok(categorization) => categorization,
        Err(e) => panic!("{e}"),
    };
    let sorting = categorization
        .set_sort_predicate(Some(SortPredicate::by_key(|r: &Reading| r.value)))
        .and_then(|_| categorization.set_sorted(true));
    if let Err(e) = sorting {
        panic!("{e}");
    }
    categorization
}

pub fn criterion_benchmark(c: &mut Criterion) {
    for n in [1_000u64, 100_000] {
        let base = build(n);
        let mut even = build(n);
        let _ = even.select_category("Even");
        let mut bands = build(n);
        let _ = bands.select_category("Bands");

        c.bench_function(&format!("recompute {n}"), |b| {
            b.iter_batched_ref(
                || build(n),
                |c| black_box(c.recompute()),
                BatchSize::LargeInput,
            )
        });
        c.bench_function(&format!("insert sorted {n}"), |b| {
            let mut next = n;
            b.iter(|| {
                next += 1;
                let _ = black_box(even.insert_item(Reading {
                    value: scramble(next),
                    id: next,
                }));
            })
        });
        c.bench_function(&format!("update grouped {n}"), |b| {
            let mut round = 0u64;
            b.iter(|| {
                round += 1;
                let _ = black_box(bands.update_item(Reading {
                    value: scramble(round + n),
                    id: round % n,
                }));
            })
        });
        c.bench_function(&format!("count category {n}"), |b| {
            b.iter(|| black_box(base.number_of_items_in_category("Even")))
        });
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
