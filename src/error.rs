//! Error taxonomy shared by the model, store, and generation layers.
//!
//! Every variant maps to a stable `kind()` string so callers (CLI, HTTP) can
//! report a structured reason instead of free text.
use crate::validate::Violation;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = ShiftError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ShiftError {
    #[error("{what} {key:?} already exists")]
    DuplicateKey { what: &'static str, key: String },

    #[error("unknown {what} {key:?}")]
    UnknownKey { what: &'static str, key: String },

    #[error("role {role:?} appears more than once in {requirement}.{tier}")]
    DuplicateEntry {
        requirement: String,
        tier: String,
        role: String,
    },

    #[error("{list} reorder is not a permutation of the current keys: {detail}")]
    InvalidPermutation { list: String, detail: String },

    #[error("year must be a four-digit positive integer (got {0})")]
    InvalidYear(i64),

    #[error("unrecognized month token {0:?}")]
    InvalidMonth(String),

    #[error("requirement {key:?}: {detail}")]
    InvalidBand { key: String, detail: String },

    #[error("work constraint {worker_type}: {detail}")]
    InvalidConstraint { worker_type: String, detail: String },

    #[error("invalid name {name:?}: {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("document failed validation with {} blocking violation(s)", .0.len())]
    ValidationFailed(Vec<Violation>),

    #[error("{what} {name:?} not found")]
    NotFound { what: &'static str, name: String },

    #[error("no staged run matches token {0:?}")]
    NotStaged(String),

    #[error("a generation run is already in progress")]
    Busy,

    #[error("engine step {step} failed (exit {}): {}", exit_label(.exit_code), .stderr.trim())]
    EngineFailed {
        step: usize,
        exit_code: Option<i32>,
        stderr: String,
        stdout: String,
    },

    #[error("malformed document: {0}")]
    Schema(#[from] serde_json::Error),

    #[error("{context} {}: {source}", .path.display())]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "none".to_string(),
    }
}

impl ShiftError {
    /// Stable identifier used in JSON error bodies and CLI output.
    pub fn kind(&self) -> &'static str {
        match self {
            ShiftError::DuplicateKey { .. } => "DuplicateKey",
            ShiftError::UnknownKey { .. } => "UnknownKey",
            ShiftError::DuplicateEntry { .. } => "DuplicateEntry",
            ShiftError::InvalidPermutation { .. } => "InvalidPermutation",
            ShiftError::InvalidYear(_) => "InvalidYear",
            ShiftError::InvalidMonth(_) => "InvalidMonth",
            ShiftError::InvalidBand { .. } => "InvalidBand",
            ShiftError::InvalidConstraint { .. } => "InvalidConstraint",
            ShiftError::InvalidName { .. } => "InvalidName",
            ShiftError::ValidationFailed(_) => "ValidationFailed",
            ShiftError::NotFound { .. } => "NotFound",
            ShiftError::NotStaged(_) => "NotStaged",
            ShiftError::Busy => "Busy",
            ShiftError::EngineFailed { .. } => "EngineFailed",
            ShiftError::Schema(_) => "Schema",
            ShiftError::Io { .. } => "Io",
        }
    }

    pub(crate) fn io(context: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ShiftError::Io {
            context,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn unknown(what: &'static str, key: &str) -> Self {
        ShiftError::UnknownKey {
            what,
            key: key.to_string(),
        }
    }

    pub(crate) fn duplicate(what: &'static str, key: &str) -> Self {
        ShiftError::DuplicateKey {
            what,
            key: key.to_string(),
        }
    }

    pub(crate) fn not_found(what: &'static str, name: &str) -> Self {
        ShiftError::NotFound {
            what,
            name: name.to_string(),
        }
    }
}
