//! Cooperative two-phase lifecycle primitives.
//!
//! A phase is a resumable sequence of steps. Each call to `resume` runs one
//! step up to its next yield point and reports whether more work remains; the
//! external driver decides when to resume again (for example once per frame).

use std::fmt;

use crate::Registry;

/// Outcome of resuming a phase once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The phase yielded and wants to be resumed later.
    Pending,
    /// The phase has run to completion.
    Complete,
}

impl Step {
    pub fn is_complete(self) -> bool {
        self == Step::Complete
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Init,
    Apply,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Init => f.write_str("init"),
            Phase::Apply => f.write_str("apply"),
        }
    }
}

/// Last lifecycle boundary a registry has crossed.
///
/// Ordering is the driver's responsibility; the registry only records it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    #[default]
    Uninitialized,
    Initializing,
    Initialized,
    Applying,
    Applied,
}

impl LifecycleState {
    pub(crate) fn started(phase: Phase) -> Self {
        match phase {
            Phase::Init => LifecycleState::Initializing,
            Phase::Apply => LifecycleState::Applying,
        }
    }

    pub(crate) fn finished(phase: Phase) -> Self {
        match phase {
            Phase::Init => LifecycleState::Initialized,
            Phase::Apply => LifecycleState::Applied,
        }
    }
}

/// One resumable unit of init work.
///
/// Receives the registry so the handler can register entries while it runs.
pub trait InitStep<E, H> {
    fn resume(&mut self, registry: &mut Registry<E, H>) -> Step;
}

impl<E, H, F> InitStep<E, H> for F
where
    F: FnMut(&mut Registry<E, H>) -> Step,
{
    fn resume(&mut self, registry: &mut Registry<E, H>) -> Step {
        self(registry)
    }
}

/// One resumable unit of apply work over a frozen entry snapshot.
pub trait ApplyStep {
    fn resume(&mut self) -> Step;
}

impl<F> ApplyStep for F
where
    F: FnMut() -> Step,
{
    fn resume(&mut self) -> Step {
        self()
    }
}

/// A phase with no work.
#[derive(Debug, Clone, Copy, Default)]
pub struct Completed;

impl<E, H> InitStep<E, H> for Completed {
    fn resume(&mut self, _registry: &mut Registry<E, H>) -> Step {
        Step::Complete
    }
}

impl ApplyStep for Completed {
    fn resume(&mut self) -> Step {
        Step::Complete
    }
}

/// Turns an iterator into an apply phase that yields once per item.
///
/// ```rust
/// use id_registry::{steps, ApplyStep, Step};
///
/// let mut seen = Vec::new();
/// let mut phase = steps(vec![1, 2].into_iter().map(|n| seen.push(n)));
/// assert_eq!(phase.resume(), Step::Pending);
/// assert_eq!(phase.resume(), Step::Pending);
/// assert_eq!(phase.resume(), Step::Complete);
/// drop(phase);
/// assert_eq!(seen, vec![1, 2]);
/// ```
pub fn steps<I: IntoIterator>(iter: I) -> IterSteps<I::IntoIter> {
    IterSteps {
        iter: iter.into_iter(),
    }
}

#[derive(Debug)]
pub struct IterSteps<I> {
    iter: I,
}

impl<I: Iterator> ApplyStep for IterSteps<I> {
    fn resume(&mut self) -> Step {
        match self.iter.next() {
            Some(_) => Step::Pending,
            None => Step::Complete,
        }
    }
}
