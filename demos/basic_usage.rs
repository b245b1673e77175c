//! Basic usage example for id-registry.
//!
//! Demonstrates:
//! - Seeding vanilla entries with fixed ids
//! - Registering caller entries and reading back their ids
//! - Driving the init and apply phases one step at a time
//!
//! Run with: `cargo run --example basic_usage`

use id_registry::{impl_entry, steps, ApplyStep, Handler, InitStep, Registry, Step};

#[derive(Debug, Clone)]
struct Item {
    id: i32,
    label: String,
}
impl_entry!(Item);

fn item(label: &str) -> Item {
    Item {
        id: 0,
        label: label.to_string(),
    }
}

struct ItemHandler;

impl Handler<Item> for ItemHandler {
    fn min_id(&self) -> i32 {
        0
    }

    fn max_id(&self) -> i32 {
        10_000
    }

    fn user_min_id(&self) -> i32 {
        5_000
    }

    fn on_register(&mut self, name: &str, id: i32, _entry: &Item) {
        println!("   handler: {name} -> {id}");
    }

    fn init(&mut self) -> Box<dyn InitStep<Item, Self>> {
        let mut pending = vec!["compass", "map"].into_iter();
        Box::new(move |registry: &mut Registry<Item, Self>| match pending.next() {
            Some(name) => {
                if let Err(err) = registry.register(name, item(name)) {
                    eprintln!("   init failed: {err}");
                }
                Step::Pending
            }
            None => Step::Complete,
        })
    }

    fn apply(&mut self, entries: Vec<Item>) -> Box<dyn ApplyStep> {
        Box::new(steps(
            entries
                .into_iter()
                .map(|entry| println!("   applying {} (#{})", entry.label, entry.id)),
        ))
    }
}

fn main() {
    println!("=== id-registry: Basic Usage ===\n");

    let mut items = Registry::new("items", ItemHandler);

    // -------------------------------------------------------------------------
    // 1. Seed vanilla entries
    // -------------------------------------------------------------------------
    println!("1. Seeding vanilla items...");

    for (id, label) in [(1, "stick"), (2, "rope")] {
        let mut entry = item(label);
        entry.id = id;
        items
            .register_vanilla(label, entry)
            .expect("vanilla ids are unique");
    }

    // -------------------------------------------------------------------------
    // 2. Register caller entries
    // -------------------------------------------------------------------------
    println!("\n2. Registering items...");

    let lantern = items.register("lantern", item("lantern")).expect("fresh key");
    println!("   lantern has id {lantern}");

    match items.register("lantern", item("lantern")) {
        Ok(_) => unreachable!(),
        Err(err) => println!("   second registration rejected: {err}"),
    }

    // -------------------------------------------------------------------------
    // 3. Lifecycle, one step per "frame"
    // -------------------------------------------------------------------------
    println!("\n3. Running init...");
    items.begin_init().expect("no phase running");
    let mut frame = 0;
    while items.resume() == Step::Pending {
        frame += 1;
        println!("   frame {frame}");
    }

    println!("\n4. Running apply...");
    items.run_apply().expect("no phase running");

    println!("\n5. Lookups...");
    println!("   id 1 -> {:?}", items.get_by_id(1).map(|i| &i.label));
    println!("   map -> {:?}", items.id_of("map"));

    println!("\n=== Done ===");
}
