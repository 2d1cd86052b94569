//! Directory enumeration for cache population.

use std::path::{Path, PathBuf};

use crate::error::Result;

/// Lists the regular files in a single directory, non-recursive.
///
/// A missing directory surfaces as `io::ErrorKind::NotFound`; cache
/// population treats that as "zero files" rather than a fault.
pub trait DirLister: Send + Sync {
    fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>>;
}

/// The std::fs backed lister used outside tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsDirLister;

impl DirLister for OsDirLister {
    fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut found = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                found.push(entry.path());
            }
        }
        found.sort();
        Ok(found)
    }
}

/// Decorator restricting a base lister's results to one file suffix.
pub struct SuffixDirLister<'a> {
    base: &'a dyn DirLister,
    suffix: String,
}

impl<'a> SuffixDirLister<'a> {
    #[must_use]
    pub fn new(base: &'a dyn DirLister, suffix: impl Into<String>) -> Self {
        Self {
            base,
            suffix: suffix.into(),
        }
    }
}

impl DirLister for SuffixDirLister<'_> {
    fn list_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        Ok(self
            .base
            .list_files(dir)?
            .into_iter()
            .filter(|p| p.to_string_lossy().ends_with(&self.suffix))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn lists_files_not_directories() {
        let dir = tempdir().expect("tmp");
        std::fs::write(dir.path().join("a.log"), b"a").expect("write a");
        std::fs::write(dir.path().join("b.sth"), b"b").expect("write b");
        std::fs::create_dir(dir.path().join("sub")).expect("mkdir");

        let found = OsDirLister.list_files(dir.path()).expect("list");
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|p| p.is_file()));
    }

    #[test]
    fn suffix_filter_restricts_results() {
        let dir = tempdir().expect("tmp");
        std::fs::write(dir.path().join("0.log"), b"m").expect("write");
        std::fs::write(dir.path().join("0.sth"), b"s").expect("write");
        std::fs::write(dir.path().join("notes.txt"), b"n").expect("write");

        let base = OsDirLister;
        let found = SuffixDirLister::new(&base, ".log")
            .list_files(dir.path())
            .expect("list");
        assert_eq!(found.len(), 1);
        assert!(found[0].to_string_lossy().ends_with("0.log"));
    }

    #[test]
    fn missing_directory_reports_not_found() {
        let dir = tempdir().expect("tmp");
        let err = OsDirLister
            .list_files(&dir.path().join("absent"))
            .expect_err("missing");
        assert!(err.is_not_found());
    }
}
