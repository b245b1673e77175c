//! Contracts between a registry and the domain code around it.

use crate::lifecycle::{ApplyStep, Completed, InitStep};

/// A record that can carry a registry-assigned id.
///
/// Identity for the registry is the name an entry is registered under, not
/// this id. Use [`impl_entry!`](crate::impl_entry) for structs with an `i32`
/// id field.
pub trait Entry {
    fn id(&self) -> i32;
    fn set_id(&mut self, id: i32);
}

/// Id range policy of a registry.
///
/// Ids in `[min_id, user_min_id)` are reserved for vanilla entries, ids in
/// `[user_min_id, max_id)` are allocated to caller registrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub min_id: i32,
    pub user_min_id: i32,
    pub max_id: i32,
}

impl Bounds {
    pub const fn new(min_id: i32, user_min_id: i32, max_id: i32) -> Self {
        Self {
            min_id,
            user_min_id,
            max_id,
        }
    }

    pub fn contains(&self, id: i32) -> bool {
        self.min_id <= id && id < self.max_id
    }

    pub fn is_user_id(&self, id: i32) -> bool {
        self.user_min_id <= id && id < self.max_id
    }
}

/// Domain side of a registry: id bounds, register/unregister side effects and
/// the work done in the two lifecycle phases.
///
/// The registry calls `on_register` and `on_unregister` synchronously, before
/// the corresponding registry operation returns.
pub trait Handler<E>: Sized {
    fn min_id(&self) -> i32;

    fn max_id(&self) -> i32;

    fn user_min_id(&self) -> i32;

    /// Whether the registry's ids belong to a single game/world rather than
    /// the whole installation. Selects the persistence directory.
    fn is_game_dependent(&self) -> bool {
        false
    }

    fn on_register(&mut self, _name: &str, _id: i32, _entry: &E) {}

    fn on_unregister(&mut self, _name: &str, _id: i32) {}

    /// Work for the init phase. It may register entries through the registry
    /// it is resumed with.
    fn init(&mut self) -> Box<dyn InitStep<E, Self>> {
        Box::new(Completed)
    }

    /// Work for the apply phase over a snapshot of every registered entry.
    fn apply(&mut self, entries: Vec<E>) -> Box<dyn ApplyStep>;

    fn bounds(&self) -> Bounds {
        Bounds::new(self.min_id(), self.user_min_id(), self.max_id())
    }
}
