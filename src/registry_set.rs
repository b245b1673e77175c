//! Driving many registries of different entry types together.

use std::path::{Path, PathBuf};

use crate::lifecycle::{LifecycleState, Phase, Step};
use crate::persist::PersistTask;
use crate::{Entry, Handler, Registry, RegistryError};

/// Object-safe view of a [`Registry`], independent of its entry and handler
/// types.
pub trait DynRegistry {
    fn name(&self) -> &str;

    fn is_game_dependent(&self) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn state(&self) -> LifecycleState;

    fn active_phase(&self) -> Option<Phase>;

    fn begin_init(&mut self) -> Result<(), RegistryError>;

    fn begin_apply(&mut self) -> Result<(), RegistryError>;

    fn resume(&mut self) -> Step;

    fn load(&mut self, dir: &Path);

    fn save(&self, dir: &Path) -> PersistTask<()>;
}

impl<E, H> DynRegistry for Registry<E, H>
where
    E: Entry + Clone,
    H: Handler<E>,
{
    fn name(&self) -> &str {
        Registry::name(self)
    }

    fn is_game_dependent(&self) -> bool {
        Registry::is_game_dependent(self)
    }

    fn len(&self) -> usize {
        Registry::len(self)
    }

    fn state(&self) -> LifecycleState {
        Registry::state(self)
    }

    fn active_phase(&self) -> Option<Phase> {
        Registry::active_phase(self)
    }

    fn begin_init(&mut self) -> Result<(), RegistryError> {
        Registry::begin_init(self)
    }

    fn begin_apply(&mut self) -> Result<(), RegistryError> {
        Registry::begin_apply(self)
    }

    fn resume(&mut self) -> Step {
        Registry::resume(self)
    }

    fn load(&mut self, dir: &Path) {
        Registry::load(self, dir)
    }

    fn save(&self, dir: &Path) -> PersistTask<()> {
        Registry::save(self, dir)
    }
}

/// Where a [`RegistrySet`] keeps its files.
///
/// Game-dependent registries persist under `game`, everything else under
/// `global`. Without a game directory, game-dependent registries are neither
/// saved nor loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistDirs {
    pub global: PathBuf,
    pub game: Option<PathBuf>,
}

impl PersistDirs {
    pub fn new(global: impl Into<PathBuf>) -> Self {
        Self {
            global: global.into(),
            game: None,
        }
    }

    pub fn with_game(mut self, game: impl Into<PathBuf>) -> Self {
        self.game = Some(game.into());
        self
    }

    pub fn dir_for(&self, game_dependent: bool) -> Option<&Path> {
        if game_dependent {
            self.game.as_deref()
        } else {
            Some(&self.global)
        }
    }
}

/// An ordered collection of registries driven through the lifecycle and
/// persisted together.
#[derive(Default)]
pub struct RegistrySet {
    registries: Vec<Box<dyn DynRegistry>>,
}

impl RegistrySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a registry.
    ///
    /// # Errors
    ///
    /// [`RegistryError::DuplicateKey`] if a registry with the same name is
    /// already present, since both would persist to the same file.
    pub fn add<R: DynRegistry + 'static>(&mut self, registry: R) -> Result<(), RegistryError> {
        if self.get(registry.name()).is_some() {
            return Err(RegistryError::DuplicateKey {
                registry: "registry set".to_owned(),
                name: registry.name().to_owned(),
            });
        }
        self.registries.push(Box::new(registry));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&dyn DynRegistry> {
        self.registries
            .iter()
            .find(|r| r.name() == name)
            .map(|r| r.as_ref())
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut (dyn DynRegistry + 'static)> {
        self.registries
            .iter_mut()
            .find(|r| r.name() == name)
            .map(|r| r.as_mut())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.registries.iter().map(|r| r.name())
    }

    pub fn len(&self) -> usize {
        self.registries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registries.is_empty()
    }

    /// Starts the init phase of every registry.
    ///
    /// # Errors
    ///
    /// [`RegistryError::PhaseInProgress`] if any registry is still in a phase;
    /// no registry is started in that case.
    pub fn begin_init(&mut self) -> Result<(), RegistryError> {
        self.ensure_idle()?;
        self.registries.iter_mut().try_for_each(|r| r.begin_init())
    }

    /// Starts the apply phase of every registry. Same rules as
    /// [`begin_init`](Self::begin_init).
    pub fn begin_apply(&mut self) -> Result<(), RegistryError> {
        self.ensure_idle()?;
        self.registries.iter_mut().try_for_each(|r| r.begin_apply())
    }

    /// Forwards one step to every registry that still has work, in insertion
    /// order. Complete once no registry is pending.
    pub fn resume(&mut self) -> Step {
        let mut step = Step::Complete;
        for registry in &mut self.registries {
            if registry.resume() == Step::Pending {
                step = Step::Pending;
            }
        }
        step
    }

    pub fn run_init(&mut self) -> Result<(), RegistryError> {
        self.begin_init()?;
        while !self.resume().is_complete() {}
        Ok(())
    }

    pub fn run_apply(&mut self) -> Result<(), RegistryError> {
        self.begin_apply()?;
        while !self.resume().is_complete() {}
        Ok(())
    }

    /// Loads every registry from its directory. Failures are logged per
    /// registry and never stop the others.
    pub fn load(&mut self, dirs: &PersistDirs) {
        for registry in &mut self.registries {
            match dirs.dir_for(registry.is_game_dependent()) {
                Some(dir) => registry.load(dir),
                None => {
                    tracing::debug!(
                        registry = %registry.name(),
                        "no game directory, skipping load"
                    );
                }
            }
        }
    }

    /// Starts a background save of every registry.
    pub fn save(&self, dirs: &PersistDirs) -> Vec<PersistTask<()>> {
        self.registries
            .iter()
            .filter_map(|registry| match dirs.dir_for(registry.is_game_dependent()) {
                Some(dir) => Some(registry.save(dir)),
                None => {
                    tracing::debug!(
                        registry = %registry.name(),
                        "no game directory, skipping save"
                    );
                    None
                }
            })
            .collect()
    }

    /// Saves every registry and waits. Returns how many saves succeeded.
    pub fn save_and_wait(&self, dirs: &PersistDirs) -> usize {
        self.save(dirs)
            .into_iter()
            .filter_map(PersistTask::wait)
            .count()
    }

    fn ensure_idle(&self) -> Result<(), RegistryError> {
        for registry in &self.registries {
            if let Some(phase) = registry.active_phase() {
                return Err(RegistryError::PhaseInProgress {
                    registry: registry.name().to_owned(),
                    phase,
                });
            }
        }
        Ok(())
    }
}
