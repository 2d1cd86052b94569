//! Typed configuration for the caching store and committer.
//!
//! Every recognized option is a named field with a builder setter, so a
//! misapplied option is a compile error rather than a silently ignored
//! runtime probe.

use std::path::PathBuf;
use std::sync::Arc;

use crate::constants::{
    DEFAULT_COMMITMENT_EPOCH, DEFAULT_DIR_MODE, DEFAULT_FILE_MODE, DEFAULT_MASSIF_EXT,
    DEFAULT_MASSIF_HEIGHT, DEFAULT_SEAL_EXT, MAX_MASSIF_HEIGHT,
};
use crate::error::{Result, StorageError};
use crate::store::dirlist::{DirLister, OsDirLister};
use crate::store::opener::{FileReadOpener, FileWriteOpener, ReadOpener, WriteOpener};
use crate::types::LogId;

/// Configuration for a [`CachingStore`](crate::store::CachingStore).
#[derive(Clone)]
pub struct StoreOptions {
    /// Directory the `log/<uuid>/...` schema lives under.
    pub root_dir: Option<PathBuf>,
    /// Create `root_dir` at init when it does not exist; otherwise it
    /// must already exist and be a directory.
    pub create_root_dir: bool,
    /// Massif height; a massif holds `1 << (height - 1)` leaves.
    pub massif_height: u8,
    /// Commitment epoch stamped into new massif start headers.
    pub commitment_epoch: u32,
    /// Suffix for massif data files, e.g. `.log`.
    pub massif_ext: String,
    /// Suffix for checkpoint files, e.g. `.sth`.
    pub seal_ext: String,
    /// Explicit single massif file, bypassing the directory scan for
    /// the "exactly one file" deployment mode.
    pub massif_file: Option<PathBuf>,
    /// Explicit single checkpoint file, as `massif_file`.
    pub checkpoint_file: Option<PathBuf>,
    /// Permission bits for created files (unix only).
    pub file_mode: u32,
    /// Permission bits for created directories (unix only).
    pub dir_mode: u32,
    /// Log to select at construction time.
    pub log_id: Option<LogId>,
    pub read_opener: Arc<dyn ReadOpener>,
    pub write_opener: Arc<dyn WriteOpener>,
    pub dir_lister: Arc<dyn DirLister>,
}

impl std::fmt::Debug for StoreOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreOptions")
            .field("root_dir", &self.root_dir)
            .field("create_root_dir", &self.create_root_dir)
            .field("massif_height", &self.massif_height)
            .field("commitment_epoch", &self.commitment_epoch)
            .field("massif_ext", &self.massif_ext)
            .field("seal_ext", &self.seal_ext)
            .field("massif_file", &self.massif_file)
            .field("checkpoint_file", &self.checkpoint_file)
            .field("log_id", &self.log_id)
            .finish_non_exhaustive()
    }
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            root_dir: None,
            create_root_dir: false,
            massif_height: DEFAULT_MASSIF_HEIGHT,
            commitment_epoch: DEFAULT_COMMITMENT_EPOCH,
            massif_ext: DEFAULT_MASSIF_EXT.to_string(),
            seal_ext: DEFAULT_SEAL_EXT.to_string(),
            massif_file: None,
            checkpoint_file: None,
            file_mode: DEFAULT_FILE_MODE,
            dir_mode: DEFAULT_DIR_MODE,
            log_id: None,
            read_opener: Arc::new(FileReadOpener),
            write_opener: Arc::new(FileWriteOpener::default()),
            dir_lister: Arc::new(OsDirLister),
        }
    }
}

impl StoreOptions {
    /// Start a fluent builder for `StoreOptions`.
    #[must_use]
    pub fn builder() -> StoreOptionsBuilder {
        StoreOptionsBuilder::default()
    }

    /// Check the configuration is usable before any storage is touched.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.massif_height == 0 || self.massif_height > MAX_MASSIF_HEIGHT {
            return Err(StorageError::InvalidOptions {
                reason: format!(
                    "massif height {} outside 1..={MAX_MASSIF_HEIGHT}",
                    self.massif_height
                ),
            });
        }
        if let Some(root) = &self.root_dir {
            if !self.create_root_dir && !root.is_dir() {
                return Err(StorageError::InvalidOptions {
                    reason: format!("root dir {} is not an accessible directory", root.display()),
                });
            }
        }
        for (name, file) in [
            ("massif file", &self.massif_file),
            ("checkpoint file", &self.checkpoint_file),
        ] {
            if let Some(path) = file {
                if !path.is_file() {
                    return Err(StorageError::InvalidOptions {
                        reason: format!("{name} {} is not an accessible file", path.display()),
                    });
                }
            }
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct StoreOptionsBuilder {
    inner: StoreOptions,
    custom_write_opener: bool,
}

impl StoreOptionsBuilder {
    #[must_use]
    pub fn root_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.inner.root_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn create_root_dir(mut self, create: bool) -> Self {
        self.inner.create_root_dir = create;
        self
    }

    #[must_use]
    pub fn massif_height(mut self, height: u8) -> Self {
        self.inner.massif_height = height;
        self
    }

    #[must_use]
    pub fn commitment_epoch(mut self, epoch: u32) -> Self {
        self.inner.commitment_epoch = epoch;
        self
    }

    pub fn massif_ext(mut self, ext: impl Into<String>) -> Self {
        self.inner.massif_ext = ext.into();
        self
    }

    pub fn seal_ext(mut self, ext: impl Into<String>) -> Self {
        self.inner.seal_ext = ext.into();
        self
    }

    #[must_use]
    pub fn massif_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.inner.massif_file = Some(path.into());
        self
    }

    #[must_use]
    pub fn checkpoint_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.inner.checkpoint_file = Some(path.into());
        self
    }

    #[must_use]
    pub fn file_mode(mut self, mode: u32) -> Self {
        self.inner.file_mode = mode;
        self
    }

    #[must_use]
    pub fn dir_mode(mut self, mode: u32) -> Self {
        self.inner.dir_mode = mode;
        self
    }

    #[must_use]
    pub fn log_id(mut self, log_id: LogId) -> Self {
        self.inner.log_id = Some(log_id);
        self
    }

    #[must_use]
    pub fn read_opener(mut self, opener: Arc<dyn ReadOpener>) -> Self {
        self.inner.read_opener = opener;
        self
    }

    #[must_use]
    pub fn write_opener(mut self, opener: Arc<dyn WriteOpener>) -> Self {
        self.inner.write_opener = opener;
        self.custom_write_opener = true;
        self
    }

    #[must_use]
    pub fn dir_lister(mut self, lister: Arc<dyn DirLister>) -> Self {
        self.inner.dir_lister = lister;
        self
    }

    /// Finish the builder. When no custom write opener was supplied,
    /// the default file opener is constructed with the configured
    /// `file_mode` so the permission setting always takes effect.
    #[must_use]
    pub fn build(mut self) -> StoreOptions {
        if !self.custom_write_opener {
            self.inner.write_opener = Arc::new(FileWriteOpener::new(self.inner.file_mode));
        }
        self.inner
    }
}
