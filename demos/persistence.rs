//! Persistence example for id-registry.
//!
//! Registers entries, saves the id assignments, and restores them in a second
//! "run" where the entries are registered in a different order.
//!
//! Run with: `cargo run --example persistence` (logs at debug level)

use id_registry::{impl_entry, set_trace_callback, ApplyStep, Completed, Handler, Registry};

#[derive(Debug, Clone)]
struct Recipe {
    id: i32,
}
impl_entry!(Recipe);

struct Recipes;

impl Handler<Recipe> for Recipes {
    fn min_id(&self) -> i32 {
        0
    }

    fn max_id(&self) -> i32 {
        1_000
    }

    fn user_min_id(&self) -> i32 {
        100
    }

    fn apply(&mut self, _entries: Vec<Recipe>) -> Box<dyn ApplyStep> {
        Box::new(Completed)
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();
    set_trace_callback(|event| println!("[registry-trace] {event}"));

    let dir = std::env::temp_dir().join("id-registry-persistence-demo");

    let mut first = Registry::new("recipes", Recipes);
    first.load(&dir);
    for name in ["bread", "cake", "pie"] {
        if let Err(err) = first.register(name, Recipe { id: 0 }) {
            eprintln!("{err}");
        }
    }
    if first.save(&dir).wait().is_none() {
        eprintln!("save failed, see log");
        return;
    }

    let mut second = Registry::new("recipes", Recipes);
    second.load(&dir);
    for name in ["pie", "soup", "bread", "cake"] {
        match second.register(name, Recipe { id: 0 }) {
            Ok(id) => println!("{name:>6} -> {id}"),
            Err(err) => eprintln!("{err}"),
        }
    }
}
