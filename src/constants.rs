//! Format constants shared across the storage engine.

/// Size in bytes of the fixed massif start header at the front of every
/// massif file.
pub const START_HEADER_SIZE: usize = 32;

/// Width in bytes of a single log entry (an MMR node hash).
pub const LOG_ENTRY_BYTES: usize = 32;

/// Current version of the massif start header layout.
pub const START_HEADER_VERSION: u8 = 1;

/// Current version of the checkpoint MMR state payload.
pub const MMR_STATE_VERSION: u16 = 1;

/// Default massif height. A massif of height 14 holds 8192 leaves.
pub const DEFAULT_MASSIF_HEIGHT: u8 = 14;

/// Largest usable massif height. Leaf counts are computed as
/// `1 << (height - 1)` in u64, so anything above this shifts out of
/// range.
pub const MAX_MASSIF_HEIGHT: u8 = 63;

/// Default commitment epoch recorded in new massif start headers.
pub const DEFAULT_COMMITMENT_EPOCH: u32 = 1;

/// Default file extension for massif data files.
pub const DEFAULT_MASSIF_EXT: &str = ".log";

/// Default file extension for checkpoint (seal) files.
pub const DEFAULT_SEAL_EXT: &str = ".sth";

/// Directory name under `<root>/log/<uuid>/` holding massif files.
pub const MASSIFS_DIR_NAME: &str = "massifs";

/// Directory name under `<root>/log/<uuid>/` holding checkpoint files.
pub const CHECKPOINTS_DIR_NAME: &str = "checkpoints";

/// Path segment introducing the log identifier.
pub const LOG_ID_PREFIX: &str = "log";

/// Legacy path segment some deployments used before the neutral `log/`
/// organization was adopted. Still recognized when parsing paths.
pub const LEGACY_LOG_ID_PREFIX: &str = "tenant";

/// Default permission bits for created massif and checkpoint files.
pub const DEFAULT_FILE_MODE: u32 = 0o644;

/// Default permission bits for created directories.
pub const DEFAULT_DIR_MODE: u32 = 0o755;

/// Width of the zero-padded decimal index in massif and checkpoint file
/// names, e.g. `0000000000000001.log`.
pub const STORAGE_NAME_INDEX_WIDTH: usize = 16;
