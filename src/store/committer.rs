//! Append coordination for the native massif format.
//!
//! The committer decides, from the current head of the selected log,
//! whether the next batch of leaves extends the head massif in place or
//! begins a new one, and performs the write with the create semantics
//! that detect concurrent first-writers.

use crate::error::{Result, StorageError};
use crate::io::start as start_codec;
use crate::mmr;
use crate::store::cache::Memo;
use crate::store::caching::CachingStore;
use crate::store::opener::write_and_close;
use crate::types::{MassifContext, MassifStart, ObjectKind, initial_massif_data};

/// Appends massifs to the selected log of a [`CachingStore`].
pub struct MassifCommitter {
    store: CachingStore,
}

impl MassifCommitter {
    #[must_use]
    pub fn new(store: CachingStore) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn store(&self) -> &CachingStore {
        &self.store
    }

    #[must_use]
    pub fn store_mut(&mut self) -> &mut CachingStore {
        &mut self.store
    }

    /// The context new leaves should be appended to.
    ///
    /// Three cases: an empty log yields a creating context for massif
    /// zero; a head massif with spare capacity is returned as-is for
    /// in-place extension; a full head massif yields a creating context
    /// for the next index, carrying the first-entry offset forward.
    pub fn get_append_context(&mut self) -> Result<MassifContext> {
        let head = match self.store.head_index(ObjectKind::MassifData) {
            Ok(head) => head,
            Err(StorageError::LogEmpty) => return Ok(self.create_first_context()),
            Err(err) => return Err(err),
        };

        let mut mc = self.get_massif_context(head)?;
        let height = mc.start.massif_height;
        if mc.occupied() < mmr::tree_size(height) {
            return Ok(mc);
        }
        mc.start_next_massif();
        mc.creating = true;
        Ok(mc)
    }

    /// Durably write the context's byte image and fold it into the
    /// cache.
    ///
    /// A creating context is written create-exclusive so a concurrent
    /// creator of the same massif surfaces as `ConcurrentCreate`
    /// instead of silently clobbering its data; an extending context
    /// overwrites in place. Contexts that grew past the massif's MMR
    /// capacity are rejected before anything is written.
    pub fn commit_context(&mut self, mc: &mut MassifContext) -> Result<()> {
        let massif_index = mc.start.massif_index;
        let height = mc.start.massif_height;

        let max_mmr_size = mmr::max_mmr_size_for_massif(height, massif_index);
        if mc.start.first_index + mc.count() > max_mmr_size {
            return Err(StorageError::MassifFull {
                massif_index,
                first_index: mc.start.first_index,
                count: mc.count(),
                max_mmr_size,
            });
        }

        let path = self.store.resolve_data_path(massif_index)?;
        let opener = &self.store.opts.write_opener;
        let writer = if mc.creating {
            opener.open_create_exclusive(&path)?
        } else {
            opener.open_create_or_truncate(&path)?
        };
        write_and_close(writer, &path, &mc.data)?;

        tracing::debug!(
            massif.index = massif_index,
            massif.creating = mc.creating,
            entries = mc.count(),
            path = %path.display(),
            "committed massif"
        );

        let cache = self.store.selected_cache_mut()?;
        cache.record_data_path(massif_index, path.clone());
        cache.put_massif_data(&path, mc.data.clone());
        cache.starts.insert(path, Memo::Decoded(mc.start));
        mc.creating = false;
        Ok(())
    }

    /// A context for the massif at `massif_index`, loaded through the
    /// cache.
    pub fn get_massif_context(&mut self, massif_index: u32) -> Result<MassifContext> {
        let data = self.store.get_data(massif_index)?;
        let start = start_codec::decode(&data)?;
        Ok(MassifContext {
            start,
            data,
            creating: false,
        })
    }

    /// The context for the current head massif, or `LogEmpty`.
    pub fn get_head_context(&mut self) -> Result<MassifContext> {
        let head = self.store.head_index(ObjectKind::MassifData)?;
        self.get_massif_context(head)
    }

    fn create_first_context(&self) -> MassifContext {
        let opts = self.store.options();
        let start = MassifStart::new(opts.commitment_epoch, opts.massif_height, 0, 0);
        MassifContext {
            data: initial_massif_data(&start),
            start,
            creating: true,
        }
    }
}
