//! Error types for the massif storage engine.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StorageError>;

/// All failure conditions surfaced by the storage engine.
///
/// Callers are expected to match on variants, not message text. In
/// particular `LogEmpty` and `MassifFull` drive the normal append state
/// machine and are not faults.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A read or write was attempted before a log was selected.
    #[error("no log selected; call select_log first")]
    LogNotSelected,

    /// A resolved storage path could not be opened.
    #[error("object does not exist at {path}")]
    ObjectDoesNotExist { path: PathBuf },

    /// The massif index resolved to a path pair, but the half required
    /// for this operation was never discovered or written.
    #[error("{what} not available for massif index {massif_index}")]
    ObjectNotAvailable {
        massif_index: u32,
        what: &'static str,
    },

    /// No massifs have been discovered for the selected log. Drives
    /// first-massif creation rather than surfacing to users.
    #[error("log is empty")]
    LogEmpty,

    /// The overfill guard tripped: committing this context would exceed
    /// the maximum MMR size for its massif index. The caller must roll
    /// to the next massif.
    #[error("massif {massif_index} is full: {first_index} + {count} exceeds max mmr size {max_mmr_size}")]
    MassifFull {
        massif_index: u32,
        first_index: u64,
        count: u64,
        max_mmr_size: u64,
    },

    /// A massif header or checkpoint payload could not be decoded.
    #[error("decode failed for {what}: {reason}")]
    Decode { what: &'static str, reason: String },

    /// Create-exclusive open failed because the target already exists.
    /// Two writers both believed they were creating the same massif.
    #[error("concurrent create detected for {path}")]
    ConcurrentCreate { path: PathBuf },

    /// A required option was missing or invalid at construction.
    #[error("invalid options: {reason}")]
    InvalidOptions { reason: String },

    /// An object kind was passed to an operation that does not handle it.
    #[error("invalid object kind {kind:?} for {operation}")]
    InvalidObjectKind {
        kind: crate::types::ObjectKind,
        operation: &'static str,
    },

    /// A storage path did not contain a recognizable log identifier.
    #[error("could not identify log id in path: {path}")]
    LogIdNotFound { path: PathBuf },

    /// Fewer bytes were written than requested.
    #[error("short write to {path}: wrote {written} of {expected} bytes")]
    ShortWrite {
        path: PathBuf,
        written: usize,
        expected: usize,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// True when the underlying cause is a missing file or directory.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::ObjectDoesNotExist { .. } => true,
            Self::Io(err) => err.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}
