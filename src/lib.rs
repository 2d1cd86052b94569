#![deny(clippy::all, clippy::pedantic)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![allow(clippy::module_name_repetitions)]
//
// Strategic lint exceptions - these are allowed project-wide for pragmatic reasons:
//
// Documentation lints: Many internal/self-documenting functions don't need extensive docs.
// Public APIs should still have proper documentation.
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
//
// Cast safety: All casts in this codebase are bounded by real-world constraints
// (massif heights, file sizes, byte offsets). Using try_into() everywhere would
// add complexity without safety benefits in our use case.
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_lossless)]
//
// Return value wrapping: Many functions use Result for consistency even when they
// currently can't fail, allowing future error conditions to be added without breaking API.
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::return_self_not_must_use)] // Builder patterns don't need must_use on every method
#![allow(clippy::must_use_candidate)]

//! Filesystem-backed storage for append-only merkle logs.
//!
//! A log grows in fixed-capacity chunks called massifs, each a single
//! file holding a slice of an ever-growing merkle mountain range, with
//! a signed checkpoint file sealing each massif's state. This crate
//! owns the file layout, the directory schema, per-log caching, and
//! the append protocol; hashing and signature verification stay with
//! the caller's merkle and crypto libraries.

/// The merklelog-fs crate version (matches `Cargo.toml`).
pub const MERKLELOG_FS_VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod constants;
pub mod error;
pub mod io;
pub mod mmr;
pub mod store;
pub mod types;

pub use error::{Result, StorageError};
pub use store::{CachingStore, MassifCommitter, StoreOptions};
pub use types::{
    Checkpoint, LogId, MassifContext, MassifStart, MmrState, ObjectKind, SignedMessage,
    VerifiedContext,
};
