//! The keyed registry.
//!
//! A [`Registry`] hands out stable integer ids to named entries, keeps a
//! bidirectional name <-> id index next to the entry store, and forwards the
//! two lifecycle phases to its [`Handler`].
//!
//! # Examples
//!
//! ```
//! use id_registry::{impl_entry, steps, ApplyStep, Handler, Registry};
//!
//! #[derive(Clone)]
//! struct Block {
//!     id: i32,
//! }
//! impl_entry!(Block);
//!
//! struct Blocks;
//!
//! impl Handler<Block> for Blocks {
//!     fn min_id(&self) -> i32 { 0 }
//!     fn max_id(&self) -> i32 { 4096 }
//!     fn user_min_id(&self) -> i32 { 1000 }
//!     fn apply(&mut self, entries: Vec<Block>) -> Box<dyn ApplyStep> {
//!         Box::new(steps(entries))
//!     }
//! }
//!
//! let mut blocks = Registry::new("blocks", Blocks);
//! blocks.register_vanilla("stone", Block { id: 1 }).unwrap();
//! let id = blocks.register("marble", Block { id: 0 }).unwrap();
//!
//! assert_eq!(id, 1000);
//! assert_eq!(blocks.get("marble").map(|b| b.id), Some(1000));
//! assert_eq!(blocks.get_by_id(1).map(|b| b.id), Some(1));
//! ```

use std::collections::HashMap;

use crate::lifecycle::{ApplyStep, InitStep, LifecycleState, Phase, Step};
use crate::registry_event::emit_event;
use crate::{Bounds, Entry, Handler, IdMap, RegistryError, RegistryEvent};

enum ActivePhase<E, H> {
    Init(Box<dyn InitStep<E, H>>),
    Apply(Box<dyn ApplyStep>),
}

impl<E, H> ActivePhase<E, H> {
    fn phase(&self) -> Phase {
        match self {
            ActivePhase::Init(_) => Phase::Init,
            ActivePhase::Apply(_) => Phase::Apply,
        }
    }
}

/// Named entries with stable integer ids.
///
/// A registry has a single logical owner: every mutation takes `&mut self`
/// and there is no internal locking.
pub struct Registry<E, H> {
    name: String,
    handler: H,
    ids: IdMap,
    entries: HashMap<String, E>,
    cursor: i32,
    phase: Option<ActivePhase<E, H>>,
    state: LifecycleState,
}

impl<E: Entry, H: Handler<E>> Registry<E, H> {
    pub fn new(name: impl Into<String>, handler: H) -> Self {
        let cursor = handler.user_min_id();
        Self {
            name: name.into(),
            handler,
            ids: IdMap::new(),
            entries: HashMap::new(),
            cursor,
            phase: None,
            state: LifecycleState::Uninitialized,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    pub fn bounds(&self) -> Bounds {
        self.handler.bounds()
    }

    pub fn min_id(&self) -> i32 {
        self.handler.min_id()
    }

    pub fn max_id(&self) -> i32 {
        self.handler.max_id()
    }

    pub fn user_min_id(&self) -> i32 {
        self.handler.user_min_id()
    }

    pub fn is_game_dependent(&self) -> bool {
        self.handler.is_game_dependent()
    }

    /// Registers a caller entry and returns the id written into it.
    ///
    /// A name that already holds an id (for example restored by
    /// [`load`](Self::load)) keeps it. Otherwise the next free id at or above
    /// the allocation cursor is taken; ids are never handed out twice while
    /// the registry lives, even after [`unregister`](Self::unregister).
    ///
    /// # Errors
    ///
    /// - [`RegistryError::DuplicateKey`] if `name` already has an entry
    /// - [`RegistryError::IdSpaceExhausted`] if no free id remains below `max_id`
    ///
    /// The registry is unchanged on error.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        mut entry: E,
    ) -> Result<i32, RegistryError> {
        let name = name.into();
        if self.entries.contains_key(&name) {
            return Err(self.duplicate_key(name));
        }

        let id = match self.ids.id_of(&name) {
            Some(id) => id,
            None => {
                let id = self.allocate_id()?;
                let bound = self.ids.insert(name.clone(), id);
                debug_assert!(bound.is_ok(), "allocated id {id} was already bound");
                id
            }
        };

        entry.set_id(id);
        tracing::info!(registry = %self.name, key = %name, id, "registered entry");
        emit_event(RegistryEvent::Register {
            registry: self.name.clone(),
            name: name.clone(),
            id,
        });
        self.entries.insert(name.clone(), entry);
        if let Some(entry) = self.entries.get(&name) {
            self.handler.on_register(&name, id, entry);
        }
        Ok(id)
    }

    /// Seeds an entry whose id is fixed by the entry itself.
    ///
    /// If the id is currently bound to another name, that binding is evicted
    /// and the id moves to `name`: freshly supplied vanilla data wins over a
    /// persisted mapping. An entry registered under the evicted name is
    /// dropped. The handler is not called for either name.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::DuplicateKey`] if `name` already has an entry
    /// - [`RegistryError::IdOutOfRange`] if the id lies outside `[min_id, max_id)`
    pub fn register_vanilla(
        &mut self,
        name: impl Into<String>,
        entry: E,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        if self.entries.contains_key(&name) {
            return Err(self.duplicate_key(name));
        }
        let id = entry.id();
        if !self.bounds().contains(id) {
            return Err(RegistryError::IdOutOfRange {
                registry: self.name.clone(),
                name,
                id,
            });
        }

        let previous = match self.ids.name_of(id) {
            Some(bound) if bound != name => Some(bound.to_owned()),
            _ => None,
        };
        if let Some(previous) = previous {
            tracing::warn!(
                registry = %self.name,
                id,
                key = %name,
                previous = %previous,
                "vanilla entry takes over an id bound to a different key"
            );
            self.ids.remove_by_id(id);
            // An entry cannot outlive its id binding.
            self.entries.remove(&previous);
            emit_event(RegistryEvent::Rebind {
                registry: self.name.clone(),
                id,
                previous,
                name: name.clone(),
            });
        }
        if let Some(stale) = self.ids.id_of(&name).filter(|&bound| bound != id) {
            tracing::debug!(
                registry = %self.name,
                key = %name,
                stale,
                id,
                "dropping stale id of vanilla key"
            );
            self.ids.remove_by_name(&name);
        }
        if !self.ids.contains_name(&name) {
            let bound = self.ids.insert(name.clone(), id);
            debug_assert!(bound.is_ok(), "id {id} still bound after eviction");
        }

        self.cursor = self.cursor.max(id + 1);
        emit_event(RegistryEvent::RegisterVanilla {
            registry: self.name.clone(),
            name: name.clone(),
            id,
        });
        self.entries.insert(name, entry);
        Ok(())
    }

    /// Removes `name` from both maps.
    ///
    /// Returns `true` only if both an id binding and an entry were removed. The
    /// handler is notified whenever an id binding existed, even if there was
    /// no entry (an id reserved by a previous load).
    pub fn unregister(&mut self, name: &str) -> bool {
        let Some(id) = self.ids.remove_by_name(name) else {
            return false;
        };
        let removed = self.entries.remove(name).is_some();
        tracing::info!(registry = %self.name, key = %name, id, removed, "unregistered key");
        emit_event(RegistryEvent::Unregister {
            registry: self.name.clone(),
            name: name.to_owned(),
            id,
        });
        self.handler.on_unregister(name, id);
        removed
    }

    pub fn get(&self, name: &str) -> Option<&E> {
        self.entries.get(name)
    }

    /// Resolves id -> name -> entry. `None` if either hop misses.
    pub fn get_by_id(&self, id: i32) -> Option<&E> {
        let name = self.ids.name_of(id)?;
        self.entries.get(name)
    }

    /// Whether `name` has a registered entry. Reserved ids without an entry
    /// do not count.
    pub fn contains_key(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Id bound to `name`, including ids reserved by a load but not yet
    /// claimed by a registration.
    pub fn id_of(&self, name: &str) -> Option<i32> {
        self.ids.id_of(name)
    }

    pub fn ids(&self) -> &IdMap {
        &self.ids
    }

    /// Registered `(name, entry)` pairs in arbitrary order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &E)> + '_ {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn duplicate_key(&self, name: String) -> RegistryError {
        RegistryError::DuplicateKey {
            registry: self.name.clone(),
            name,
        }
    }

    fn allocate_id(&mut self) -> Result<i32, RegistryError> {
        let max_id = self.handler.max_id();
        let mut candidate = self.cursor;
        while candidate < max_id {
            if !self.ids.contains_id(candidate) {
                self.cursor = candidate + 1;
                return Ok(candidate);
            }
            candidate += 1;
        }
        tracing::warn!(registry = %self.name, max_id, "id space exhausted");
        Err(RegistryError::IdSpaceExhausted {
            registry: self.name.clone(),
            max_id,
        })
    }

    /// Drops every id binding and entry. The allocation cursor is kept.
    pub(crate) fn clear(&mut self) {
        self.ids.clear();
        self.entries.clear();
    }

    pub(crate) fn replace_ids(&mut self, ids: IdMap) {
        self.entries.clear();
        self.ids = ids;
    }

    // --------------------------------------------------------------------------------------------
    // Lifecycle
    // --------------------------------------------------------------------------------------------

    /// Last phase boundary crossed. Informational only.
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Phase currently in flight, if any.
    pub fn active_phase(&self) -> Option<Phase> {
        self.phase.as_ref().map(ActivePhase::phase)
    }

    /// Starts the init phase. Drive it with [`resume`](Self::resume).
    ///
    /// # Errors
    ///
    /// [`RegistryError::PhaseInProgress`] if a phase has not completed yet.
    pub fn begin_init(&mut self) -> Result<(), RegistryError> {
        self.ensure_idle()?;
        self.mark_started(Phase::Init);
        let steps = self.handler.init();
        self.phase = Some(ActivePhase::Init(steps));
        Ok(())
    }

    /// Starts the apply phase over a snapshot of every registered entry,
    /// ordered by id. Entries registered afterwards are not part of it.
    ///
    /// Call after init has completed; this is not checked.
    ///
    /// # Errors
    ///
    /// [`RegistryError::PhaseInProgress`] if a phase has not completed yet.
    pub fn begin_apply(&mut self) -> Result<(), RegistryError>
    where
        E: Clone,
    {
        self.ensure_idle()?;
        let mut snapshot: Vec<E> = self.entries.values().cloned().collect();
        snapshot.sort_by_key(|entry| entry.id());
        self.mark_started(Phase::Apply);
        let steps = self.handler.apply(snapshot);
        self.phase = Some(ActivePhase::Apply(steps));
        Ok(())
    }

    /// Forwards one step of the active phase.
    ///
    /// Returns [`Step::Complete`] once the phase has finished, and also when
    /// no phase is active.
    pub fn resume(&mut self) -> Step {
        let Some(mut active) = self.phase.take() else {
            return Step::Complete;
        };
        let step = match &mut active {
            ActivePhase::Init(steps) => InitStep::resume(steps.as_mut(), self),
            ActivePhase::Apply(steps) => ApplyStep::resume(steps.as_mut()),
        };
        match step {
            Step::Pending => self.phase = Some(active),
            Step::Complete => self.mark_finished(active.phase()),
        }
        step
    }

    /// Runs the init phase to completion without yielding to a driver.
    pub fn run_init(&mut self) -> Result<(), RegistryError> {
        self.begin_init()?;
        while !self.resume().is_complete() {}
        Ok(())
    }

    /// Runs the apply phase to completion without yielding to a driver.
    pub fn run_apply(&mut self) -> Result<(), RegistryError>
    where
        E: Clone,
    {
        self.begin_apply()?;
        while !self.resume().is_complete() {}
        Ok(())
    }

    fn ensure_idle(&self) -> Result<(), RegistryError> {
        match self.active_phase() {
            Some(phase) => Err(RegistryError::PhaseInProgress {
                registry: self.name.clone(),
                phase,
            }),
            None => Ok(()),
        }
    }

    fn mark_started(&mut self, phase: Phase) {
        tracing::info!(registry = %self.name, %phase, "phase started");
        emit_event(RegistryEvent::PhaseStarted {
            registry: self.name.clone(),
            phase,
        });
        self.state = LifecycleState::started(phase);
    }

    fn mark_finished(&mut self, phase: Phase) {
        tracing::info!(registry = %self.name, %phase, "phase finished");
        emit_event(RegistryEvent::PhaseFinished {
            registry: self.name.clone(),
            phase,
        });
        self.state = LifecycleState::finished(phase);
    }
}

// ------------------------------------------------------------------------------------------------
// Tests
// ------------------------------------------------------------------------------------------------
