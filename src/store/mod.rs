//! Filesystem storage for massif logs: path schema, directory
//! discovery, the per-log cache, and the append committer.

pub mod cache;
pub mod caching;
pub mod committer;
pub mod dirlist;
pub mod opener;
pub mod options;
pub mod paths;

pub use cache::{Extent, LogCache, MassifStoragePaths, Memo};
pub use caching::CachingStore;
pub use committer::MassifCommitter;
pub use dirlist::{DirLister, OsDirLister, SuffixDirLister};
pub use opener::{FileReadOpener, FileWriteOpener, ReadOpener, WriteOpener};
pub use options::{StoreOptions, StoreOptionsBuilder};
pub use paths::{PrefixProvider, object_path, storage_name};
