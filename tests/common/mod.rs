//! Shared entry and handler types for the integration tests.

#![allow(dead_code)]

use id_registry::{impl_entry, steps, ApplyStep, Bounds, Handler, InitStep, Registry, Step};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub id: i32,
    pub hardness: u8,
}
impl_entry!(Block);

pub fn block(hardness: u8) -> Block {
    Block { id: -1, hardness }
}

pub fn vanilla(id: i32, hardness: u8) -> Block {
    Block { id, hardness }
}

/// Handler that records every notification and applied entry.
pub struct BlockHandler {
    pub bounds: Bounds,
    pub game_dependent: bool,
    pub init_names: Vec<&'static str>,
    pub log: Arc<Mutex<Vec<String>>>,
    pub applied: Arc<Mutex<Vec<i32>>>,
}

impl BlockHandler {
    pub fn new(bounds: Bounds) -> Self {
        Self {
            bounds,
            game_dependent: false,
            init_names: Vec::new(),
            log: Arc::default(),
            applied: Arc::default(),
        }
    }

    /// `min_id = 0`, `user_min_id = 100`, `max_id = 105`.
    pub fn small() -> Self {
        Self::new(Bounds::new(0, 100, 105))
    }

    pub fn wide() -> Self {
        Self::new(Bounds::new(0, 1_000, 100_000))
    }

    pub fn game_dependent(mut self) -> Self {
        self.game_dependent = true;
        self
    }

    pub fn registering(mut self, names: &[&'static str]) -> Self {
        self.init_names = names.to_vec();
        self
    }
}

impl Handler<Block> for BlockHandler {
    fn min_id(&self) -> i32 {
        self.bounds.min_id
    }

    fn max_id(&self) -> i32 {
        self.bounds.max_id
    }

    fn user_min_id(&self) -> i32 {
        self.bounds.user_min_id
    }

    fn is_game_dependent(&self) -> bool {
        self.game_dependent
    }

    fn on_register(&mut self, name: &str, id: i32, _entry: &Block) {
        self.log.lock().unwrap().push(format!("register {name} {id}"));
    }

    fn on_unregister(&mut self, name: &str, id: i32) {
        self.log.lock().unwrap().push(format!("unregister {name} {id}"));
    }

    fn init(&mut self) -> Box<dyn InitStep<Block, Self>> {
        let mut names = self.init_names.clone().into_iter();
        Box::new(move |registry: &mut Registry<Block, Self>| match names.next() {
            Some(name) => {
                registry
                    .register(name, block(1))
                    .expect("init registration failed");
                Step::Pending
            }
            None => Step::Complete,
        })
    }

    fn apply(&mut self, entries: Vec<Block>) -> Box<dyn ApplyStep> {
        let applied = Arc::clone(&self.applied);
        Box::new(steps(
            entries
                .into_iter()
                .map(move |entry| applied.lock().unwrap().push(entry.id)),
        ))
    }
}

pub type Blocks = Registry<Block, BlockHandler>;
