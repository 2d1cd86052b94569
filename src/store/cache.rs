//! Per-log in-memory index and byte cache.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::types::{Checkpoint, MassifStart};

/// Storage locations known for one massif index.
///
/// The two halves are discovered and written independently; either may
/// be set first. Once `data` is set it is never cleared.
#[derive(Debug, Clone, Default)]
pub struct MassifStoragePaths {
    pub data: Option<PathBuf>,
    pub checkpoint: Option<PathBuf>,
}

/// A decoded-cache entry over the raw byte maps.
///
/// Map-absent means the path was never decoded; `Stale` means the raw
/// bytes were replaced and the old decode discarded; `Decoded` is a
/// usable value. Overwrites store `Stale` rather than a placeholder
/// value so a deferred decode can never observe a half-valid object.
#[derive(Debug, Clone)]
pub enum Memo<T> {
    Stale,
    Decoded(T),
}

impl<T> Memo<T> {
    pub fn decoded(&self) -> Option<&T> {
        match self {
            Self::Stale => None,
            Self::Decoded(value) => Some(value),
        }
    }
}

/// An inclusive (first, head) index range, tracked monotonically.
///
/// The empty sentinel is `first = u32::MAX, head = 0`; observing any
/// index collapses it to a real range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extent {
    pub first: u32,
    pub head: u32,
}

impl Default for Extent {
    fn default() -> Self {
        Self {
            first: u32::MAX,
            head: 0,
        }
    }
}

impl Extent {
    pub fn observe(&mut self, massif_index: u32) {
        if massif_index < self.first {
            self.first = massif_index;
        }
        if massif_index > self.head {
            self.head = massif_index;
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.first > self.head && self.first == u32::MAX
    }

    /// The user-facing (first, head) pair; the empty sentinel reads as
    /// `(0, 0)`.
    #[must_use]
    pub fn normalized(&self) -> (u32, u32) {
        if self.is_empty() {
            (0, 0)
        } else {
            (self.first, self.head)
        }
    }
}

/// The cache for exactly one selected log: path index, raw bytes, and
/// lazily decoded values, with independent massif and seal extents.
///
/// Mutated only by the owning [`CachingStore`](super::CachingStore) and
/// [`MassifCommitter`](super::MassifCommitter); concurrent access needs
/// external mutual exclusion.
#[derive(Debug, Default)]
pub struct LogCache {
    pub(crate) massif_paths: HashMap<u32, MassifStoragePaths>,
    pub(crate) massif_data: HashMap<PathBuf, Vec<u8>>,
    pub(crate) starts: HashMap<PathBuf, Memo<MassifStart>>,
    pub(crate) checkpoint_data: HashMap<PathBuf, Vec<u8>>,
    pub(crate) checkpoints: HashMap<PathBuf, Memo<Checkpoint>>,
    pub(crate) massif_extent: Extent,
    pub(crate) seal_extent: Extent,
}

impl LogCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the data path for a massif index, extending the massif
    /// extent.
    pub(crate) fn record_data_path(&mut self, massif_index: u32, path: PathBuf) {
        self.massif_paths.entry(massif_index).or_default().data = Some(path);
        self.massif_extent.observe(massif_index);
    }

    /// Record the checkpoint path for a massif index, extending the
    /// seal extent. The massif extent is untouched; the two file sets
    /// can be disjoint.
    pub(crate) fn record_checkpoint_path(&mut self, massif_index: u32, path: PathBuf) {
        self.massif_paths.entry(massif_index).or_default().checkpoint = Some(path);
        self.seal_extent.observe(massif_index);
    }

    pub(crate) fn paths(&self, massif_index: u32) -> Option<&MassifStoragePaths> {
        self.massif_paths.get(&massif_index)
    }

    /// Store raw massif bytes, invalidating any stale decoded start for
    /// the path.
    pub(crate) fn put_massif_data(&mut self, path: &PathBuf, data: Vec<u8>) {
        self.massif_data.insert(path.clone(), data);
        if let Some(memo) = self.starts.get_mut(path) {
            *memo = Memo::Stale;
        }
    }

    /// Store raw checkpoint bytes, invalidating any stale decoded
    /// checkpoint for the path.
    pub(crate) fn put_checkpoint_data(&mut self, path: &PathBuf, data: Vec<u8>) {
        self.checkpoint_data.insert(path.clone(), data);
        if let Some(memo) = self.checkpoints.get_mut(path) {
            *memo = Memo::Stale;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MassifStart;

    #[test]
    fn extent_starts_empty_and_grows_monotonically() {
        let mut extent = Extent::default();
        assert!(extent.is_empty());
        assert_eq!(extent.normalized(), (0, 0));

        for index in [5u32, 2, 9, 7] {
            extent.observe(index);
        }
        assert_eq!(extent.normalized(), (2, 9));

        // re-observing inside the range changes nothing
        extent.observe(5);
        assert_eq!(extent.normalized(), (2, 9));
    }

    #[test]
    fn extents_are_independent() {
        let mut cache = LogCache::new();
        cache.record_checkpoint_path(3, "/logs/checkpoints/3.sth".into());

        assert!(cache.massif_extent.is_empty());
        assert_eq!(cache.seal_extent.normalized(), (3, 3));

        cache.record_data_path(1, "/logs/massifs/1.log".into());
        assert_eq!(cache.massif_extent.normalized(), (1, 1));
        assert_eq!(cache.seal_extent.normalized(), (3, 3));
    }

    #[test]
    fn path_halves_set_independently() {
        let mut cache = LogCache::new();
        cache.record_checkpoint_path(0, "/c/0.sth".into());
        cache.record_data_path(0, "/m/0.log".into());

        let paths = cache.paths(0).expect("paths");
        assert_eq!(paths.data.as_deref(), Some(std::path::Path::new("/m/0.log")));
        assert_eq!(
            paths.checkpoint.as_deref(),
            Some(std::path::Path::new("/c/0.sth"))
        );
    }

    #[test]
    fn raw_overwrite_marks_decode_stale() {
        let mut cache = LogCache::new();
        let path = PathBuf::from("/m/0.log");
        cache
            .starts
            .insert(path.clone(), Memo::Decoded(MassifStart::new(0, 2, 0, 0)));

        cache.put_massif_data(&path, vec![1, 2, 3]);
        assert!(cache.starts.get(&path).expect("memo").decoded().is_none());
    }
}
