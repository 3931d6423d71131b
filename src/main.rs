//! Walks a small task list through the categorization engine and prints the
//! change stream as JSON lines.
//!
//! Usage: `categorization [settings-file]`; `CATEGORIZATION_*` environment
//! variables override the file.

use std::error::Error;
use std::path::PathBuf;

use tracing::info;
use tracing_subscriber::EnvFilter;

use categorization::{
    Categorization, Category, Record, Settings, SharedCategorization, SortPredicate, ViewChange,
};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct Task {
    priority: u8,
    id: u32,
    title: String,
    done: bool,
}

impl Record for Task {
    type Key = u32;
    fn key(&self) -> u32 {
        self.id
    }
    fn merge(&mut self, other: Self) {
        self.priority = other.priority;
        self.title = other.title;
        self.done = other.done;
    }
}

fn task(id: u32, priority: u8, title: &str, done: bool) -> Task {
    Task {
        priority,
        id,
        title: title.to_string(),
        done,
    }
}

fn report(step: &str, change: &ViewChange, view: &[Task]) {
    let titles: Vec<&str> = view.iter().map(|t| t.title.as_str()).collect();
    println!(
        "{}",
        serde_json::json!({ "step": step, "change": change, "view": titles })
    );
}

fn main() -> Result<(), Box<dyn Error>> {
    let path = std::env::args().nth(1).map(PathBuf::from);
    let settings = Settings::load(path.as_deref())?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&settings.log_filter)?)
        .init();
    info!(?settings, "settings loaded");

    let tasks = vec![
        task(1, 2, "write report", false),
        task(2, 1, "book flights", true),
        task(3, 3, "fix the sink", false),
        task(4, 1, "call the bank", false),
    ];
    let categories = vec![
        Category::new("Open", |t: &Task| !t.done).with_sort_index(0),
        Category::new("Done", |t: &Task| t.done).with_sort_index(1),
        Category::compound(
            "By urgency",
            vec![
                Category::new("Urgent", |t: &Task| t.priority <= 1),
                Category::new("Later", |t: &Task| t.priority > 1),
            ],
        )
        .sorted_by_subcategories(true)
        .with_sort_index(2)
        .always_visible(),
    ];
    let shared = SharedCategorization::new(Categorization::with_settings(
        tasks,
        categories,
        None,
        settings,
    )?);

    let change = shared.mutate(|c| c.select_category("Open"))?;
    report("select open", &change, &shared.view()?);
    let change = shared.mutate(|c| {
        c.set_sort_predicate(Some(SortPredicate::by_key(|t: &Task| t.priority)))?;
        c.set_sorted(true)
    })?;
    report("sort by priority", &change, &shared.view()?);
    let change = shared.insert_item(task(5, 0, "renew passport", false))?;
    report("add task", &change, &shared.view()?);
    let change = shared.update_item(task(1, 2, "write report", true))?;
    report("finish task", &change, &shared.view()?);
    let change = shared.mutate(|c| c.select_category("By urgency"))?;
    report("group by urgency", &change, &shared.view()?);
    let change = shared.mutate(|c| c.remove_items(|t| t.done))?;
    report("drop finished", &change, &shared.view()?);

    let visible = shared.read(|c| {
        c.visible_categories()
            .iter()
            .map(|c| c.title().to_string())
            .collect::<Vec<_>>()
    })?;
    info!(?visible, "visible categories");
    Ok(())
}
