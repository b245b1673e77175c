use std::io;

use thiserror::Error;

use crate::Phase;

/// Errors reported to the caller of a registry operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("registry {registry}: key {name:?} already exists")]
    DuplicateKey { registry: String, name: String },

    #[error("registry {registry}: id space exhausted (max id {max_id})")]
    IdSpaceExhausted { registry: String, max_id: i32 },

    #[error("registry {registry}: id {id} of {name:?} is outside the registry bounds")]
    IdOutOfRange {
        registry: String,
        name: String,
        id: i32,
    },

    #[error("registry {registry}: {phase} phase still in progress")]
    PhaseInProgress { registry: String, phase: Phase },
}

/// Malformed persistence data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unexpected end of data")]
    UnexpectedEof,

    #[error("negative entry count {0}")]
    NegativeCount(i32),

    #[error("string is not valid UTF-8")]
    InvalidUtf8,

    #[error("string length prefix overflows")]
    VarintOverflow,

    #[error("name {0:?} appears more than once")]
    DuplicateName(String),

    #[error("id {0} appears more than once")]
    DuplicateId(i32),
}

/// Failures of save and load. These are logged, never propagated by the
/// registry's own persistence entry points.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("corrupt registry file: {0}")]
    Corrupt(#[from] DecodeError),

    #[error("persistence worker for registry {registry} panicked")]
    WorkerPanicked { registry: String },
}
