//! Registry events and the process-wide trace callback.
//!
//! Every event is also written to `tracing`; the callback exists for callers
//! that want to observe registry activity programmatically (tests, editors,
//! debug overlays).

use std::fmt;
use std::sync::{Arc, LazyLock, Mutex};

use crate::Phase;

/// Events emitted by registries during operations.
///
/// The `Clone` derive allows callbacks to store or forward events if needed.
///
/// # Examples
///
/// ```rust
/// use id_registry::RegistryEvent;
///
/// let event = RegistryEvent::Register {
///     registry: "items".into(),
///     name: "sword".into(),
///     id: 100,
/// };
/// assert_eq!(event.to_string(), "items: register { name: sword, id: 100 }");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEvent {
    /// A caller entry received an id.
    Register { registry: String, name: String, id: i32 },

    /// A vanilla entry was seeded with its own id.
    RegisterVanilla { registry: String, name: String, id: i32 },

    /// A vanilla entry took over an id previously bound to another name.
    Rebind {
        registry: String,
        id: i32,
        previous: String,
        name: String,
    },

    /// An id binding was removed.
    Unregister { registry: String, name: String, id: i32 },

    PhaseStarted { registry: String, phase: Phase },

    PhaseFinished { registry: String, phase: Phase },

    /// Id assignments were restored from disk.
    Loaded { registry: String, count: usize },

    /// Id assignments were written to disk.
    Saved { registry: String, count: usize },

    /// A corrupt file was discarded and the registry reset to empty.
    Reset { registry: String },
}

impl fmt::Display for RegistryEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryEvent::Register { registry, name, id } => {
                write!(f, "{registry}: register {{ name: {name}, id: {id} }}")
            }
            RegistryEvent::RegisterVanilla { registry, name, id } => {
                write!(f, "{registry}: register_vanilla {{ name: {name}, id: {id} }}")
            }
            RegistryEvent::Rebind {
                registry,
                id,
                previous,
                name,
            } => write!(
                f,
                "{registry}: rebind {{ id: {id}, previous: {previous}, name: {name} }}"
            ),
            RegistryEvent::Unregister { registry, name, id } => {
                write!(f, "{registry}: unregister {{ name: {name}, id: {id} }}")
            }
            RegistryEvent::PhaseStarted { registry, phase } => {
                write!(f, "{registry}: {phase} started")
            }
            RegistryEvent::PhaseFinished { registry, phase } => {
                write!(f, "{registry}: {phase} finished")
            }
            RegistryEvent::Loaded { registry, count } => {
                write!(f, "{registry}: loaded {{ count: {count} }}")
            }
            RegistryEvent::Saved { registry, count } => {
                write!(f, "{registry}: saved {{ count: {count} }}")
            }
            RegistryEvent::Reset { registry } => write!(f, "{registry}: reset"),
        }
    }
}

impl RegistryEvent {
    /// Name of the registry that emitted the event.
    pub fn registry(&self) -> &str {
        match self {
            RegistryEvent::Register { registry, .. }
            | RegistryEvent::RegisterVanilla { registry, .. }
            | RegistryEvent::Rebind { registry, .. }
            | RegistryEvent::Unregister { registry, .. }
            | RegistryEvent::PhaseStarted { registry, .. }
            | RegistryEvent::PhaseFinished { registry, .. }
            | RegistryEvent::Loaded { registry, .. }
            | RegistryEvent::Saved { registry, .. }
            | RegistryEvent::Reset { registry } => registry,
        }
    }
}

/// Type alias for the user-supplied tracing callback.
///
/// It must be thread-safe because saves run on worker threads.
pub type TraceCallback = dyn Fn(&RegistryEvent) + Send + Sync + 'static;

static TRACE_CALLBACK: LazyLock<Mutex<Option<Arc<TraceCallback>>>> =
    LazyLock::new(|| Mutex::new(None));

/// Sets a callback invoked for every event of every registry in the process.
///
/// # Example
/// ```rust
/// use id_registry::set_trace_callback;
///
/// set_trace_callback(|event| println!("[registry-trace] {event}"));
/// # id_registry::clear_trace_callback();
/// ```
pub fn set_trace_callback(callback: impl Fn(&RegistryEvent) + Send + Sync + 'static) {
    let mut guard = TRACE_CALLBACK.lock().unwrap_or_else(|p| p.into_inner());
    *guard = Some(Arc::new(callback));
}

/// Clears the tracing callback.
pub fn clear_trace_callback() {
    let mut guard = TRACE_CALLBACK.lock().unwrap_or_else(|p| p.into_inner());
    *guard = None;
}

/// Invokes the current callback, if any.
///
/// The callback is cloned out of the lock before it runs, so it may itself
/// touch registries without deadlocking.
pub(crate) fn emit_event(event: RegistryEvent) {
    let callback = TRACE_CALLBACK
        .lock()
        .unwrap_or_else(|p| p.into_inner())
        .clone();
    if let Some(callback) = callback {
        callback(&event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_registry_event_display() {
        let event = RegistryEvent::Unregister {
            registry: "items".into(),
            name: "sword".into(),
            id: 3,
        };
        assert_eq!(event.to_string(), "items: unregister { name: sword, id: 3 }");

        let event = RegistryEvent::Rebind {
            registry: "items".into(),
            id: 3,
            previous: "old".into(),
            name: "new".into(),
        };
        assert_eq!(
            event.to_string(),
            "items: rebind { id: 3, previous: old, name: new }"
        );

        let event = RegistryEvent::PhaseStarted {
            registry: "items".into(),
            phase: Phase::Apply,
        };
        assert_eq!(event.to_string(), "items: apply started");

        let event = RegistryEvent::Reset {
            registry: "items".into(),
        };
        assert_eq!(event.to_string(), "items: reset");
    }

    #[test]
    #[serial]
    fn test_trace_callback_invoked_and_cleared() {
        static COUNT: AtomicUsize = AtomicUsize::new(0);
        // Other unit tests emit concurrently, so only count our own registry.
        set_trace_callback(|e| {
            if e.registry() == "trace-probe" {
                COUNT.fetch_add(1, Ordering::SeqCst);
            }
        });

        emit_event(RegistryEvent::Reset {
            registry: "trace-probe".into(),
        });
        assert_eq!(COUNT.load(Ordering::SeqCst), 1);

        clear_trace_callback();
        emit_event(RegistryEvent::Reset {
            registry: "trace-probe".into(),
        });
        assert_eq!(COUNT.load(Ordering::SeqCst), 1);
    }
}
