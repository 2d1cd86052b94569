//! Object addressing: the deterministic, invertible mapping between a
//! log identifier plus object kind and filesystem locations.
//!
//! Schema:
//!
//! ```text
//! <root>/log/<uuid>/massifs/<index:016>.log
//! <root>/log/<uuid>/checkpoints/<index:016>.sth
//! ```

use std::path::{Component, Path, PathBuf};

use crate::constants::{
    CHECKPOINTS_DIR_NAME, LEGACY_LOG_ID_PREFIX, LOG_ID_PREFIX, MASSIFS_DIR_NAME,
    STORAGE_NAME_INDEX_WIDTH,
};
use crate::error::{Result, StorageError};
use crate::types::{LogId, ObjectKind};

/// Maps log identifiers and object kinds to directory prefixes under a
/// fixed root, and recovers the identifier from a concrete path.
#[derive(Debug, Clone)]
pub struct PrefixProvider {
    pub root: PathBuf,
}

impl PrefixProvider {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory prefix holding objects of the given kind for the
    /// given log.
    pub fn prefix(&self, log_id: LogId, kind: ObjectKind) -> Result<PathBuf> {
        let leaf_dir = match kind {
            ObjectKind::MassifStart | ObjectKind::MassifData | ObjectKind::MassifsPrefix => {
                MASSIFS_DIR_NAME
            }
            ObjectKind::Checkpoint | ObjectKind::CheckpointsPrefix => CHECKPOINTS_DIR_NAME,
        };
        Ok(self
            .root
            .join(LOG_ID_PREFIX)
            .join(log_id.to_string())
            .join(leaf_dir))
    }

    /// The full storage path for the object of the given kind at the
    /// given massif index.
    pub fn storage_path(
        &self,
        log_id: LogId,
        massif_index: u32,
        kind: ObjectKind,
        ext: &str,
    ) -> Result<PathBuf> {
        match kind {
            ObjectKind::MassifStart | ObjectKind::MassifData | ObjectKind::Checkpoint => Ok(
                object_path(&self.prefix(log_id, kind)?, massif_index, ext),
            ),
            ObjectKind::MassifsPrefix | ObjectKind::CheckpointsPrefix => {
                Err(StorageError::InvalidObjectKind {
                    kind,
                    operation: "storage_path",
                })
            }
        }
    }

    /// Recover the log identifier from a storage path containing a
    /// `log/<uuid>/` segment, or the legacy `tenant/<uuid>/` form.
    pub fn log_id_from_path(&self, path: &Path) -> Result<LogId> {
        for prefix in [LOG_ID_PREFIX, LEGACY_LOG_ID_PREFIX] {
            if let Some(id) = parse_prefixed_log_id(prefix, path) {
                return Ok(id);
            }
        }
        Err(StorageError::LogIdNotFound {
            path: path.to_path_buf(),
        })
    }
}

/// File name for the object at the given index, e.g.
/// `0000000000000007.log`.
#[must_use]
pub fn storage_name(massif_index: u32, ext: &str) -> String {
    format!("{massif_index:0w$}{ext}", w = STORAGE_NAME_INDEX_WIDTH)
}

/// Join a directory prefix and a formatted object name.
#[must_use]
pub fn object_path(prefix: &Path, massif_index: u32, ext: &str) -> PathBuf {
    prefix.join(storage_name(massif_index, ext))
}

fn parse_prefixed_log_id(prefix: &str, path: &Path) -> Option<LogId> {
    let mut components = path.components();
    while let Some(component) = components.next() {
        if component != Component::Normal(std::ffi::OsStr::new(prefix)) {
            continue;
        }
        if let Some(Component::Normal(next)) = components.next() {
            if let Some(id) = next.to_str().and_then(|s| s.parse().ok()) {
                return Some(id);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_roundtrips_log_id_for_every_kind() {
        let provider = PrefixProvider::new("/tmp/mlogs");
        let id = LogId::random();
        for kind in [
            ObjectKind::MassifStart,
            ObjectKind::MassifData,
            ObjectKind::Checkpoint,
            ObjectKind::MassifsPrefix,
            ObjectKind::CheckpointsPrefix,
        ] {
            let prefix = provider.prefix(id, kind).expect("prefix");
            let full = prefix.join("0000000000000000.log");
            let recovered = provider.log_id_from_path(&full).expect("recover");
            assert_eq!(recovered, id, "kind {kind:?}");
        }
    }

    #[test]
    fn legacy_tenant_prefix_recognized() {
        let provider = PrefixProvider::new("/tmp/mlogs");
        let id = LogId::random();
        let path = PathBuf::from(format!("/data/tenant/{id}/massifs/0000000000000003.log"));
        assert_eq!(provider.log_id_from_path(&path).expect("recover"), id);
    }

    #[test]
    fn unrecognized_path_reports_log_id_not_found() {
        let provider = PrefixProvider::new("/tmp/mlogs");
        let err = provider
            .log_id_from_path(Path::new("/data/other/thing.log"))
            .expect_err("no id");
        assert!(matches!(err, StorageError::LogIdNotFound { .. }));
    }

    #[test]
    fn non_uuid_segment_after_prefix_is_skipped() {
        let provider = PrefixProvider::new("/tmp/mlogs");
        let err = provider
            .log_id_from_path(Path::new("/data/log/not-a-uuid/massifs/x.log"))
            .expect_err("invalid uuid");
        assert!(matches!(err, StorageError::LogIdNotFound { .. }));
    }

    #[test]
    fn storage_names_are_zero_padded() {
        assert_eq!(storage_name(7, ".log"), "0000000000000007.log");
        assert_eq!(storage_name(12345, ".sth"), "0000000000012345.sth");
    }

    #[test]
    fn storage_path_rejects_prefix_kinds() {
        let provider = PrefixProvider::new("/tmp/mlogs");
        let err = provider
            .storage_path(LogId::random(), 0, ObjectKind::MassifsPrefix, ".log")
            .expect_err("prefix kind");
        assert!(matches!(err, StorageError::InvalidObjectKind { .. }));
    }
}
