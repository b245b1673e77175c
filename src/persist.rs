//! Saving and loading id assignments.
//!
//! Each registry persists to `<dir>/<name>.regist`. Failures never reach the
//! caller as errors: they are logged, and a corrupt file resets the registry
//! to empty and is deleted so the next run starts fresh.
//!
//! Preconditions that no lock enforces: do not load into a registry while a
//! background load for it is pending, and do not run two saves of the same
//! registry to the same directory at once.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

use crate::codec::{self, Decoded, FORMAT_VERSION};
use crate::registry_event::emit_event;
use crate::{DecodeError, Entry, Handler, IdMap, PersistError, Registry, RegistryEvent};

pub const REGISTRY_FILE_EXTENSION: &str = "regist";

/// Path of the file a registry named `name` persists to inside `dir`.
pub fn registry_file(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.{REGISTRY_FILE_EXTENSION}"))
}

/// Handle to persistence work running on a worker thread.
///
/// Dropping the handle detaches the worker; its outcome is still logged.
#[must_use = "dropping a PersistTask detaches it; call `wait` to block until it finishes"]
pub struct PersistTask<T> {
    registry: String,
    worker: Worker<T>,
}

enum Worker<T> {
    Running(JoinHandle<Result<T, PersistError>>),
    /// The thread could not be spawned; the work never ran.
    NotStarted(io::Error),
}

impl<T: Send + 'static> PersistTask<T> {
    /// Runs `work` on a thread named `registry-<name>`.
    fn spawn<F>(registry: String, work: F) -> Self
    where
        F: FnOnce() -> Result<T, PersistError> + Send + 'static,
    {
        tracing::trace!(registry = %registry, "registry.persist.spawn");
        let spawned = thread::Builder::new()
            .name(format!("registry-{registry}"))
            .spawn(work);
        let worker = match spawned {
            Ok(handle) => Worker::Running(handle),
            Err(err) => {
                tracing::error!(
                    registry = %registry,
                    error = %err,
                    "failed to spawn registry persistence worker"
                );
                Worker::NotStarted(err)
            }
        };
        Self { registry, worker }
    }
}

impl<T> PersistTask<T> {
    pub fn is_finished(&self) -> bool {
        match &self.worker {
            Worker::Running(handle) => handle.is_finished(),
            Worker::NotStarted(_) => true,
        }
    }

    /// Blocks until the worker is done.
    ///
    /// # Errors
    ///
    /// The worker's own error, [`PersistError::Io`] if the worker thread
    /// could not be spawned, or [`PersistError::WorkerPanicked`].
    pub fn join(self) -> Result<T, PersistError> {
        match self.worker {
            Worker::Running(handle) => handle.join().unwrap_or_else(|_| {
                Err(PersistError::WorkerPanicked {
                    registry: self.registry,
                })
            }),
            Worker::NotStarted(err) => Err(PersistError::Io(err)),
        }
    }

    /// Blocks until the worker is done, returning `None` if it failed. The
    /// failure has already been logged.
    pub fn wait(self) -> Option<T> {
        let registry = self.registry.clone();
        match self.join() {
            Ok(value) => Some(value),
            Err(err @ PersistError::WorkerPanicked { .. }) => {
                tracing::error!(
                    registry = %registry,
                    error = %err,
                    "registry persistence worker failed"
                );
                None
            }
            Err(_) => None,
        }
    }
}

/// What reading a registry file produced, before it is applied.
pub(crate) enum LoadOutcome {
    Missing,
    Decoded(Decoded),
    Corrupt(DecodeError),
    Failed(io::Error),
}

/// A load whose file is being read and decoded on a worker thread.
///
/// Finish it with [`Registry::finish_load`].
#[must_use = "a pending load does nothing until passed to `Registry::finish_load`"]
pub struct PendingLoad {
    path: PathBuf,
    task: PersistTask<LoadOutcome>,
}

impl PendingLoad {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

fn read_file(path: &Path) -> LoadOutcome {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return LoadOutcome::Missing,
        Err(err) => return LoadOutcome::Failed(err),
    };
    match codec::decode(&bytes) {
        Ok(decoded) => LoadOutcome::Decoded(decoded),
        Err(err) => LoadOutcome::Corrupt(err),
    }
}

fn write_file(registry: &str, ids: &IdMap, path: &Path) -> Result<(), PersistError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    // Truncates in place; a crash mid-write is recovered by the corrupt-file path on load.
    fs::write(path, codec::encode(ids))?;
    tracing::debug!(
        registry = %registry,
        path = %path.display(),
        count = ids.len(),
        "saved registry ids"
    );
    emit_event(RegistryEvent::Saved {
        registry: registry.to_owned(),
        count: ids.len(),
    });
    Ok(())
}

impl<E: Entry, H: Handler<E>> Registry<E, H> {
    pub fn file_path(&self, dir: impl AsRef<Path>) -> PathBuf {
        registry_file(dir.as_ref(), self.name())
    }

    /// Writes the current id assignments on the calling thread.
    ///
    /// # Errors
    ///
    /// [`PersistError::Io`] if the directory or file cannot be written.
    pub fn save_blocking(&self, dir: impl AsRef<Path>) -> Result<(), PersistError> {
        let path = self.file_path(dir);
        write_file(self.name(), self.ids(), &path).inspect_err(|err| {
            tracing::warn!(
                registry = %self.name(),
                path = %path.display(),
                error = %err,
                "failed to save registry ids"
            );
        })
    }

    /// Snapshots the id assignments and writes them on a worker thread.
    ///
    /// The registry can be used again as soon as this returns.
    pub fn save(&self, dir: impl AsRef<Path>) -> PersistTask<()> {
        let path = self.file_path(dir);
        let registry = self.name().to_owned();
        let ids = self.ids().clone();
        PersistTask::spawn(registry.clone(), move || {
            write_file(&registry, &ids, &path).inspect_err(|err| {
                tracing::warn!(
                    registry = %registry,
                    path = %path.display(),
                    error = %err,
                    "failed to save registry ids"
                );
            })
        })
    }

    /// Restores id assignments saved by a previous run.
    ///
    /// A missing file leaves the registry untouched. Otherwise all bindings
    /// and entries are replaced by the file's id assignments. A file that
    /// fails to decode resets the registry to empty and is deleted.
    pub fn load(&mut self, dir: impl AsRef<Path>) {
        let path = self.file_path(dir);
        let outcome = read_file(&path);
        self.apply_load(&path, outcome);
    }

    /// Starts reading and decoding the registry file on a worker thread.
    pub fn begin_load(&self, dir: impl AsRef<Path>) -> PendingLoad {
        let path = self.file_path(dir);
        let worker_path = path.clone();
        let task =
            PersistTask::spawn(self.name().to_owned(), move || Ok(read_file(&worker_path)));
        PendingLoad { path, task }
    }

    /// Waits for a [`begin_load`](Self::begin_load) and applies its result
    /// with the same rules as [`load`](Self::load).
    pub fn finish_load(&mut self, pending: PendingLoad) {
        let PendingLoad { path, task } = pending;
        if let Some(outcome) = task.wait() {
            self.apply_load(&path, outcome);
        }
    }

    fn apply_load(&mut self, path: &Path, outcome: LoadOutcome) {
        match outcome {
            LoadOutcome::Missing => {
                tracing::debug!(
                    registry = %self.name(),
                    path = %path.display(),
                    "no saved registry ids"
                );
            }
            LoadOutcome::Failed(err) => {
                tracing::warn!(
                    registry = %self.name(),
                    path = %path.display(),
                    error = %err,
                    "failed to read registry ids, keeping current state"
                );
            }
            LoadOutcome::Decoded(decoded) => {
                if !decoded.is_known_version() {
                    tracing::warn!(
                        registry = %self.name(),
                        version = decoded.version,
                        latest = FORMAT_VERSION,
                        "unknown registry file version, decoded with the latest layout"
                    );
                }
                let ids = self.in_bounds(decoded.ids);
                let count = ids.len();
                self.replace_ids(ids);
                tracing::debug!(
                    registry = %self.name(),
                    path = %path.display(),
                    count,
                    "loaded registry ids"
                );
                emit_event(RegistryEvent::Loaded {
                    registry: self.name().to_owned(),
                    count,
                });
            }
            LoadOutcome::Corrupt(err) => {
                tracing::warn!(
                    registry = %self.name(),
                    path = %path.display(),
                    error = %err,
                    "corrupt registry file, starting fresh"
                );
                self.clear();
                if let Err(err) = fs::remove_file(path) {
                    tracing::debug!(
                        registry = %self.name(),
                        error = %err,
                        "could not delete corrupt registry file"
                    );
                }
                emit_event(RegistryEvent::Reset {
                    registry: self.name().to_owned(),
                });
            }
        }
    }

    /// Drops loaded ids the handler's bounds no longer allow.
    fn in_bounds(&self, mut ids: IdMap) -> IdMap {
        let bounds = self.bounds();
        let rejected: Vec<i32> = ids
            .iter()
            .map(|(_, id)| id)
            .filter(|&id| !bounds.contains(id))
            .collect();
        for id in rejected {
            if let Some(name) = ids.remove_by_id(id) {
                tracing::warn!(
                    registry = %self.name(),
                    key = %name,
                    id,
                    "dropping saved id outside registry bounds"
                );
            }
        }
        ids
    }
}
