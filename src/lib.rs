//! # Id Registry
//!
//! A persistent keyed registry: every named entry of a type family gets a
//! stable `i32` id that survives process restarts.
//!
//! Entries are registered by name; the registry allocates ids, keeps a
//! bidirectional name <-> id index, notifies a [`Handler`] of changes, and
//! drives the handler through a cooperative two-phase lifecycle (init, then
//! apply). Only the id assignments are persisted. Entries are re-registered
//! on every run and get their previous ids back.
//!
//! ## Quick Start
//!
//! ```rust
//! use id_registry::{impl_entry, steps, ApplyStep, Handler, Registry};
//!
//! #[derive(Clone)]
//! struct Item {
//!     id: i32,
//! }
//! impl_entry!(Item);
//!
//! struct Items;
//!
//! impl Handler<Item> for Items {
//!     fn min_id(&self) -> i32 { 0 }
//!     fn max_id(&self) -> i32 { 10_000 }
//!     fn user_min_id(&self) -> i32 { 5_000 }
//!     fn apply(&mut self, entries: Vec<Item>) -> Box<dyn ApplyStep> {
//!         Box::new(steps(entries))
//!     }
//! }
//!
//! let dir = std::env::temp_dir().join("id-registry-doc");
//!
//! let mut items = Registry::new("items", Items);
//! items.load(&dir);
//! let id = items.register("lantern", Item { id: 0 }).unwrap();
//! items.run_init().unwrap();
//! items.run_apply().unwrap();
//! items.save_blocking(&dir).unwrap();
//!
//! let mut next_run = Registry::new("items", Items);
//! next_run.load(&dir);
//! assert_eq!(next_run.register("lantern", Item { id: 0 }), Ok(id));
//! ```
//!
//! ## Main Types
//!
//! - [`Registry`] - allocation, lookups, lifecycle and persistence
//! - [`Handler`] / [`Entry`] - the contracts domain code implements
//! - [`IdMap`] - the bidirectional name <-> id index
//! - [`RegistrySet`] - drives and persists registries of different types together
//! - [`set_trace_callback`] - observe [`RegistryEvent`]s programmatically

mod codec;
mod id_map;
mod lifecycle;
mod macros;
mod persist;
mod registry;
mod registry_error;
mod registry_event;
mod registry_handler;
mod registry_set;

pub use codec::{decode, encode, Decoded, FORMAT_VERSION};
pub use id_map::{Conflict, IdMap};
pub use lifecycle::{steps, ApplyStep, Completed, InitStep, IterSteps, LifecycleState, Phase, Step};
pub use persist::{registry_file, PendingLoad, PersistTask, REGISTRY_FILE_EXTENSION};
pub use registry::Registry;
pub use registry_error::{DecodeError, PersistError, RegistryError};
pub use registry_event::{clear_trace_callback, set_trace_callback, RegistryEvent, TraceCallback};
pub use registry_handler::{Bounds, Entry, Handler};
pub use registry_set::{DynRegistry, PersistDirs, RegistrySet};
