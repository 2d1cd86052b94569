//! The caching store: log selection, directory-scan population, lazy
//! decode, and the read/write entry points beneath the committer.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{Result, StorageError};
use crate::io::{checkpoint as checkpoint_codec, start as start_codec};
use crate::store::cache::{LogCache, Memo};
use crate::store::dirlist::SuffixDirLister;
use crate::store::opener::{ensure_dir, read_all, read_n, write_and_close};
use crate::store::options::StoreOptions;
use crate::store::paths::{PrefixProvider, object_path};
use crate::types::{Checkpoint, LogId, MassifStart, ObjectKind, VerifiedContext};
use crate::{constants::START_HEADER_SIZE, mmr};

/// Discovers, indexes, and lazily materializes massif and checkpoint
/// files for one selected log at a time.
///
/// Owns a [`LogCache`] per log identifier ever selected; switching logs
/// swaps which cache is current without discarding the others. Not
/// internally synchronized: one logical owner at a time.
#[derive(Debug)]
pub struct CachingStore {
    pub(crate) opts: StoreOptions,
    pub(crate) selected: Option<LogId>,
    pub(crate) logs: HashMap<LogId, LogCache>,
}

impl CachingStore {
    /// Validate options, create the root directory when requested, and
    /// preselect `opts.log_id` when provided.
    pub fn new(opts: StoreOptions) -> Result<Self> {
        opts.validate()?;

        if opts.create_root_dir {
            if let Some(root) = &opts.root_dir {
                ensure_dir(root, opts.dir_mode)?;
            }
        }

        let mut store = Self {
            opts,
            selected: None,
            logs: HashMap::new(),
        };
        if let Some(log_id) = store.opts.log_id {
            store.select_log(log_id)?;
        }
        Ok(store)
    }

    #[must_use]
    pub fn options(&self) -> &StoreOptions {
        &self.opts
    }

    #[must_use]
    pub fn selected_log(&self) -> Option<LogId> {
        self.selected
    }

    /// Make `log_id` the current log, creating and populating its cache
    /// on first selection. Selecting the already-selected log is a
    /// no-op.
    pub fn select_log(&mut self, log_id: LogId) -> Result<()> {
        if self.selected == Some(log_id) && self.logs.contains_key(&log_id) {
            return Ok(());
        }
        self.selected = Some(log_id);
        if self.logs.contains_key(&log_id) {
            return Ok(());
        }
        self.logs.insert(log_id, LogCache::new());
        self.populate_cache()
    }

    /// Scan the configured directories (and single-file overrides) for
    /// the selected log, indexing every massif and checkpoint found.
    ///
    /// Massif files are indexed by reading only the fixed-size start
    /// header; checkpoints are small and are fully decoded. A missing
    /// directory contributes zero files; any other listing or decode
    /// failure aborts population with the cache unchanged for the
    /// failed entry onward.
    pub fn populate_cache(&mut self) -> Result<()> {
        let log_id = self.selected.ok_or(StorageError::LogNotSelected)?;

        let mut massif_paths = Vec::new();
        let mut checkpoint_paths = Vec::new();

        if self.opts.root_dir.is_some() {
            let massifs_dir = self.prefix(log_id, ObjectKind::MassifData)?;
            let checkpoints_dir = self.prefix(log_id, ObjectKind::Checkpoint)?;

            massif_paths = self.list_tolerating_missing(&massifs_dir, &self.opts.massif_ext)?;
            checkpoint_paths = self.list_tolerating_missing(&checkpoints_dir, &self.opts.seal_ext)?;
        }

        if let Some(path) = &self.opts.massif_file {
            massif_paths.push(path.clone());
        }
        if let Some(path) = &self.opts.checkpoint_file {
            checkpoint_paths.push(path.clone());
        }

        tracing::debug!(
            log.id = %log_id,
            massifs.found = massif_paths.len(),
            checkpoints.found = checkpoint_paths.len(),
            "populating log cache"
        );

        for path in massif_paths {
            let header = read_n(self.opts.read_opener.as_ref(), &path, START_HEADER_SIZE)?;
            let start = start_codec::decode(&header)?;
            let cache = self.selected_cache_mut()?;
            cache.record_data_path(start.massif_index, path.clone());
            cache.starts.insert(path, Memo::Decoded(start));
        }

        let height = self.opts.massif_height;
        for path in checkpoint_paths {
            let data = read_all(self.opts.read_opener.as_ref(), &path)?;
            let checkpoint = checkpoint_codec::decode(&data)?;
            let massif_index = checkpoint.massif_index(height);
            let cache = self.selected_cache_mut()?;
            cache.record_checkpoint_path(massif_index, path.clone());
            cache.checkpoint_data.insert(path.clone(), data);
            cache.checkpoints.insert(path, Memo::Decoded(checkpoint));
        }
        Ok(())
    }

    /// The decoded start header for the massif at `massif_index`,
    /// reading only the file header if nothing is cached yet.
    pub fn get_start(&mut self, massif_index: u32) -> Result<MassifStart> {
        let path = self.data_path(massif_index)?;

        let cache = self.selected_cache()?;
        if let Some(start) = cache.starts.get(&path).and_then(Memo::decoded) {
            return Ok(*start);
        }
        if let Some(data) = cache.massif_data.get(&path) {
            let start = start_codec::decode(data)?;
            self.selected_cache_mut()?
                .starts
                .insert(path, Memo::Decoded(start));
            return Ok(start);
        }

        let header = read_n(self.opts.read_opener.as_ref(), &path, START_HEADER_SIZE)?;
        let start = start_codec::decode(&header)?;
        self.selected_cache_mut()?
            .starts
            .insert(path, Memo::Decoded(start));
        Ok(start)
    }

    /// The full byte image of the massif at `massif_index`, read from
    /// storage and cached on first use.
    pub fn get_data(&mut self, massif_index: u32) -> Result<Vec<u8>> {
        let path = self.data_path(massif_index)?;

        if let Some(data) = self.selected_cache()?.massif_data.get(&path) {
            return Ok(data.clone());
        }

        let data = read_all(self.opts.read_opener.as_ref(), &path)?;
        let start = start_codec::decode(&data)?;
        let cache = self.selected_cache_mut()?;
        cache.massif_data.insert(path.clone(), data.clone());
        cache.starts.insert(path, Memo::Decoded(start));
        Ok(data)
    }

    /// The decoded checkpoint for `massif_index`. Fails with
    /// `ObjectNotAvailable` when no checkpoint path is known for the
    /// index; use [`get`](Self::get) when absence is expected.
    pub fn get_checkpoint(&mut self, massif_index: u32) -> Result<Checkpoint> {
        let path = self.checkpoint_path(massif_index)?;

        let cache = self.selected_cache()?;
        if let Some(checkpoint) = cache.checkpoints.get(&path).and_then(Memo::decoded) {
            return Ok(checkpoint.clone());
        }
        if let Some(data) = cache.checkpoint_data.get(&path) {
            let checkpoint = checkpoint_codec::decode(data)?;
            self.selected_cache_mut()?
                .checkpoints
                .insert(path, Memo::Decoded(checkpoint.clone()));
            return Ok(checkpoint);
        }

        let data = read_all(self.opts.read_opener.as_ref(), &path)?;
        let checkpoint = checkpoint_codec::decode(&data)?;
        let cache = self.selected_cache_mut()?;
        cache.checkpoint_data.insert(path.clone(), data);
        cache
            .checkpoints
            .insert(path, Memo::Decoded(checkpoint.clone()));
        Ok(checkpoint)
    }

    /// Data, start, and checkpoint for one massif together. A missing
    /// checkpoint is not an error; a massif may legitimately have no
    /// seal yet.
    pub fn get(
        &mut self,
        massif_index: u32,
    ) -> Result<(Vec<u8>, MassifStart, Option<Checkpoint>)> {
        let data = self.get_data(massif_index)?;
        let start = self.get_start(massif_index)?;

        let has_checkpoint = self
            .selected_cache()?
            .paths(massif_index)
            .is_some_and(|p| p.checkpoint.is_some());
        let checkpoint = if has_checkpoint {
            Some(self.get_checkpoint(massif_index)?)
        } else {
            None
        };
        Ok((data, start, checkpoint))
    }

    /// The head (largest observed) index for the given object kind, or
    /// `LogEmpty` when none has been observed.
    pub fn head_index(&self, kind: ObjectKind) -> Result<u32> {
        let cache = self.selected_cache()?;
        let extent = match kind {
            ObjectKind::MassifStart | ObjectKind::MassifData => &cache.massif_extent,
            ObjectKind::Checkpoint => &cache.seal_extent,
            ObjectKind::MassifsPrefix | ObjectKind::CheckpointsPrefix => {
                return Err(StorageError::InvalidObjectKind {
                    kind,
                    operation: "head_index",
                });
            }
        };
        if extent.is_empty() {
            return Err(StorageError::LogEmpty);
        }
        Ok(extent.head)
    }

    /// The raw cached bytes for a massif, without touching storage.
    /// `None` when the full image was never read or written.
    #[must_use]
    pub fn massif_data(&self, massif_index: u32) -> Option<&[u8]> {
        let cache = self.selected_cache().ok()?;
        let path = cache.paths(massif_index)?.data.as_ref()?;
        cache.massif_data.get(path).map(Vec::as_slice)
    }

    /// The raw cached checkpoint bytes, without touching storage.
    #[must_use]
    pub fn checkpoint_data(&self, massif_index: u32) -> Option<&[u8]> {
        let cache = self.selected_cache().ok()?;
        let path = cache.paths(massif_index)?.checkpoint.as_ref()?;
        cache.checkpoint_data.get(path).map(Vec::as_slice)
    }

    /// The (first, head) extent for the given kind; `(0, 0)` when no
    /// log is selected or nothing has been observed.
    #[must_use]
    pub fn extents(&self, kind: ObjectKind) -> (u32, u32) {
        let Ok(cache) = self.selected_cache() else {
            return (0, 0);
        };
        match kind {
            ObjectKind::MassifStart | ObjectKind::MassifData => cache.massif_extent.normalized(),
            ObjectKind::Checkpoint => cache.seal_extent.normalized(),
            ObjectKind::MassifsPrefix | ObjectKind::CheckpointsPrefix => (0, 0),
        }
    }

    /// Unconditional overwrite of one object. The caller owns any
    /// consistency checks against prior content; this performs none.
    ///
    /// Massif payloads are header-decoded first so a malformed image is
    /// rejected before anything touches storage.
    pub fn put(&mut self, massif_index: u32, kind: ObjectKind, data: &[u8]) -> Result<()> {
        self.selected.ok_or(StorageError::LogNotSelected)?;

        match kind {
            ObjectKind::MassifStart | ObjectKind::MassifData => {
                let start = start_codec::decode(data)?;
                let path = self.resolve_data_path(massif_index)?;
                let writer = self.opts.write_opener.open_create_or_truncate(&path)?;
                write_and_close(writer, &path, data)?;

                tracing::debug!(massif.index = massif_index, path = %path.display(), "put massif");
                let cache = self.selected_cache_mut()?;
                cache.record_data_path(massif_index, path.clone());
                cache.put_massif_data(&path, data.to_vec());
                cache.starts.insert(path, Memo::Decoded(start));
                Ok(())
            }
            ObjectKind::Checkpoint => {
                let path = self.resolve_checkpoint_path(massif_index)?;
                let writer = self.opts.write_opener.open_create_or_truncate(&path)?;
                write_and_close(writer, &path, data)?;

                tracing::debug!(massif.index = massif_index, path = %path.display(), "put checkpoint");
                let cache = self.selected_cache_mut()?;
                cache.record_checkpoint_path(massif_index, path.clone());
                // decode is deferred until the next get_checkpoint
                cache.put_checkpoint_data(&path, data.to_vec());
                Ok(())
            }
            ObjectKind::MassifsPrefix | ObjectKind::CheckpointsPrefix => {
                Err(StorageError::InvalidObjectKind {
                    kind,
                    operation: "put",
                })
            }
        }
    }

    /// Commit a massif together with its checkpoint: the two-file
    /// durable write protocol.
    ///
    /// Both files are opened before either is written so path and
    /// permission failures surface without a half-committed pair. The
    /// massif data is written before its seal: an interruption between
    /// the writes leaves any previously committed checkpoint attesting
    /// on-disk data at least as fresh as itself, never staler. The
    /// cache is updated only after both writes succeed.
    pub fn replace_verified(&mut self, vc: &VerifiedContext) -> Result<()> {
        self.selected.ok_or(StorageError::LogNotSelected)?;
        let massif_index = vc.start.massif_index;

        let data_path = self.resolve_data_path(massif_index)?;
        let checkpoint_path = self.resolve_checkpoint_path(massif_index)?;

        let data_writer = self.opts.write_opener.open_create_or_truncate(&data_path)?;
        let checkpoint_writer = self
            .opts
            .write_opener
            .open_create_or_truncate(&checkpoint_path)?;

        write_and_close(data_writer, &data_path, &vc.data)?;
        let checkpoint_bytes = checkpoint_codec::encode_signed(&vc.signed_message)?;
        write_and_close(checkpoint_writer, &checkpoint_path, &checkpoint_bytes)?;

        tracing::debug!(
            massif.index = massif_index,
            mmr.size = vc.mmr_state.mmr_size,
            "replaced verified massif and checkpoint"
        );

        let cache = self.selected_cache_mut()?;
        cache.record_data_path(massif_index, data_path.clone());
        cache.put_massif_data(&data_path, vc.data.clone());
        cache.starts.insert(data_path, Memo::Decoded(vc.start));

        cache.record_checkpoint_path(massif_index, checkpoint_path.clone());
        cache.put_checkpoint_data(&checkpoint_path, checkpoint_bytes);
        cache.checkpoints.insert(
            checkpoint_path,
            Memo::Decoded(Checkpoint {
                mmr_state: vc.mmr_state.clone(),
                signed_message: vc.signed_message.clone(),
            }),
        );
        Ok(())
    }

    // ------------------------------------------------------------------
    // path resolution

    pub(crate) fn prefix(&self, log_id: LogId, kind: ObjectKind) -> Result<PathBuf> {
        let root = self
            .opts
            .root_dir
            .as_ref()
            .ok_or_else(|| StorageError::InvalidOptions {
                reason: "no root dir configured for path derivation".to_string(),
            })?;
        PrefixProvider::new(root).prefix(log_id, kind)
    }

    /// The known data path for `massif_index`, or a freshly derived one
    /// with its directory created.
    pub(crate) fn resolve_data_path(&mut self, massif_index: u32) -> Result<PathBuf> {
        let log_id = self.selected.ok_or(StorageError::LogNotSelected)?;
        if let Some(path) = self
            .selected_cache()?
            .paths(massif_index)
            .and_then(|p| p.data.clone())
        {
            return Ok(path);
        }
        let prefix = self.prefix(log_id, ObjectKind::MassifData)?;
        ensure_dir(&prefix, self.opts.dir_mode)?;
        Ok(object_path(&prefix, massif_index, &self.opts.massif_ext))
    }

    /// The known checkpoint path for `massif_index`, or a freshly
    /// derived one with its directory created.
    pub(crate) fn resolve_checkpoint_path(&mut self, massif_index: u32) -> Result<PathBuf> {
        let log_id = self.selected.ok_or(StorageError::LogNotSelected)?;
        if let Some(path) = self
            .selected_cache()?
            .paths(massif_index)
            .and_then(|p| p.checkpoint.clone())
        {
            return Ok(path);
        }
        let prefix = self.prefix(log_id, ObjectKind::Checkpoint)?;
        ensure_dir(&prefix, self.opts.dir_mode)?;
        Ok(object_path(&prefix, massif_index, &self.opts.seal_ext))
    }

    fn data_path(&self, massif_index: u32) -> Result<PathBuf> {
        self.selected_cache()?
            .paths(massif_index)
            .and_then(|p| p.data.clone())
            .ok_or(StorageError::ObjectNotAvailable {
                massif_index,
                what: "massif data path",
            })
    }

    fn checkpoint_path(&self, massif_index: u32) -> Result<PathBuf> {
        self.selected_cache()?
            .paths(massif_index)
            .and_then(|p| p.checkpoint.clone())
            .ok_or(StorageError::ObjectNotAvailable {
                massif_index,
                what: "checkpoint path",
            })
    }

    pub(crate) fn selected_cache(&self) -> Result<&LogCache> {
        self.selected
            .and_then(|id| self.logs.get(&id))
            .ok_or(StorageError::LogNotSelected)
    }

    pub(crate) fn selected_cache_mut(&mut self) -> Result<&mut LogCache> {
        let id = self.selected.ok_or(StorageError::LogNotSelected)?;
        self.logs.get_mut(&id).ok_or(StorageError::LogNotSelected)
    }

    fn list_tolerating_missing(&self, dir: &Path, suffix: &str) -> Result<Vec<PathBuf>> {
        let lister = SuffixDirLister::new(self.opts.dir_lister.as_ref(), suffix);
        match crate::store::dirlist::DirLister::list_files(&lister, dir) {
            Ok(paths) => Ok(paths),
            Err(err) if err.is_not_found() => Ok(Vec::new()),
            Err(err) => Err(err),
        }
    }

    /// Sanity bound on MMR growth for the configured height; exposed
    /// for callers that size buffers ahead of a commit.
    #[must_use]
    pub fn max_mmr_size_for(&self, massif_index: u32) -> u64 {
        mmr::max_mmr_size_for_massif(self.opts.massif_height, massif_index)
    }
}
