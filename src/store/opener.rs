//! Scoped read and write primitives over massif and checkpoint files.
//!
//! The traits exist so tests and alternative deployments can substitute
//! the byte-stream layer; the default impls are thin std::fs wrappers.
//! Handles are released on every exit path by drop semantics, with an
//! explicit flush before success is reported.

use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::constants::DEFAULT_FILE_MODE;
use crate::error::{Result, StorageError};

/// Opens a path for reading.
pub trait ReadOpener: Send + Sync {
    fn open(&self, path: &Path) -> Result<Box<dyn Read>>;
}

/// Opens a path for writing with either create-exclusive or
/// create-or-truncate semantics.
pub trait WriteOpener: Send + Sync {
    /// Fails with [`StorageError::ConcurrentCreate`] if the path already
    /// exists. Used only when establishing a brand-new massif so that
    /// concurrent-create races are detected instead of silently
    /// overwriting.
    fn open_create_exclusive(&self, path: &Path) -> Result<Box<dyn Write>>;

    /// Creates or empties the file. Every non-creating write uses this,
    /// because the engine always persists the full byte image of a
    /// massif, never a delta.
    fn open_create_or_truncate(&self, path: &Path) -> Result<Box<dyn Write>>;
}

/// Default read opener backed by `std::fs::File`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileReadOpener;

impl ReadOpener for FileReadOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn Read>> {
        let file = File::open(path).map_err(|err| map_open_err(err, path))?;
        Ok(Box::new(file))
    }
}

/// Default write opener backed by `std::fs::OpenOptions`.
#[derive(Debug, Clone, Copy)]
pub struct FileWriteOpener {
    pub file_mode: u32,
}

impl Default for FileWriteOpener {
    fn default() -> Self {
        Self {
            file_mode: DEFAULT_FILE_MODE,
        }
    }
}

impl FileWriteOpener {
    #[must_use]
    pub fn new(file_mode: u32) -> Self {
        Self { file_mode }
    }

    fn options(&self) -> OpenOptions {
        let mut opts = OpenOptions::new();
        opts.write(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            opts.mode(self.file_mode);
        }
        opts
    }
}

impl WriteOpener for FileWriteOpener {
    fn open_create_exclusive(&self, path: &Path) -> Result<Box<dyn Write>> {
        let mut opts = self.options();
        opts.create_new(true);
        let file = opts.open(path).map_err(|err| {
            if err.kind() == std::io::ErrorKind::AlreadyExists {
                StorageError::ConcurrentCreate {
                    path: path.to_path_buf(),
                }
            } else {
                StorageError::Io(err)
            }
        })?;
        Ok(Box::new(file))
    }

    fn open_create_or_truncate(&self, path: &Path) -> Result<Box<dyn Write>> {
        let mut opts = self.options();
        opts.create(true).truncate(true);
        Ok(Box::new(opts.open(path)?))
    }
}

/// Write the full payload and release the handle.
///
/// The handle is dropped whether or not the write succeeds; a short
/// write is surfaced as [`StorageError::ShortWrite`].
pub fn write_and_close(mut w: Box<dyn Write>, path: &Path, data: &[u8]) -> Result<()> {
    let written = write_fully(&mut *w, data)?;
    if written != data.len() {
        return Err(StorageError::ShortWrite {
            path: path.to_path_buf(),
            written,
            expected: data.len(),
        });
    }
    w.flush()?;
    Ok(())
}

fn write_fully(w: &mut dyn Write, data: &[u8]) -> Result<usize> {
    let mut written = 0;
    while written < data.len() {
        match w.write(&data[written..]) {
            Ok(0) => break,
            Ok(n) => written += n,
            Err(err) if err.kind() == std::io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err.into()),
        }
    }
    Ok(written)
}

/// Read exactly `n` bytes from the head of the path. Used for
/// header-only massif discovery reads.
pub fn read_n(opener: &dyn ReadOpener, path: &Path, n: usize) -> Result<Vec<u8>> {
    let mut reader = opener.open(path)?;
    let mut buf = vec![0u8; n];
    reader.read_exact(&mut buf).map_err(|err| {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            StorageError::Decode {
                what: "massif start",
                reason: format!("{} is shorter than {n} bytes", path.display()),
            }
        } else {
            StorageError::Io(err)
        }
    })?;
    Ok(buf)
}

/// Read the entire file at the path.
pub fn read_all(opener: &dyn ReadOpener, path: &Path) -> Result<Vec<u8>> {
    let mut reader = opener.open(path)?;
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    Ok(buf)
}

fn map_open_err(err: std::io::Error, path: &Path) -> StorageError {
    if err.kind() == std::io::ErrorKind::NotFound {
        StorageError::ObjectDoesNotExist {
            path: path.to_path_buf(),
        }
    } else {
        StorageError::Io(err)
    }
}

/// Create a directory and its parents, applying the configured mode on
/// platforms that support it.
pub fn ensure_dir(dir: &Path, dir_mode: u32) -> Result<PathBuf> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        std::fs::DirBuilder::new()
            .recursive(true)
            .mode(dir_mode)
            .create(dir)?;
    }
    #[cfg(not(unix))]
    {
        let _ = dir_mode;
        std::fs::create_dir_all(dir)?;
    }
    Ok(dir.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn create_exclusive_detects_existing_file() {
        let dir = tempdir().expect("tmp");
        let path = dir.path().join("0000000000000000.log");
        let opener = FileWriteOpener::default();

        let first = opener.open_create_exclusive(&path).expect("first create");
        write_and_close(first, &path, b"massif zero").expect("write");

        let err = match opener.open_create_exclusive(&path) {
            Ok(_) => panic!("second create must fail"),
            Err(e) => e,
        };
        assert!(matches!(err, StorageError::ConcurrentCreate { .. }));
    }

    #[test]
    fn create_or_truncate_replaces_content() {
        let dir = tempdir().expect("tmp");
        let path = dir.path().join("x.log");
        let opener = FileWriteOpener::default();

        write_and_close(
            opener.open_create_or_truncate(&path).expect("open"),
            &path,
            b"long original content",
        )
        .expect("write one");
        write_and_close(
            opener.open_create_or_truncate(&path).expect("reopen"),
            &path,
            b"short",
        )
        .expect("write two");

        assert_eq!(std::fs::read(&path).expect("read"), b"short");
    }

    #[test]
    fn missing_file_reports_does_not_exist() {
        let dir = tempdir().expect("tmp");
        let err = match FileReadOpener.open(&dir.path().join("absent.log")) {
            Ok(_) => panic!("missing"),
            Err(e) => e,
        };
        assert!(matches!(err, StorageError::ObjectDoesNotExist { .. }));
    }

    #[test]
    fn read_n_rejects_short_files() {
        let dir = tempdir().expect("tmp");
        let path = dir.path().join("short.log");
        std::fs::write(&path, b"tiny").expect("write");
        let err = read_n(&FileReadOpener, &path, 32).expect_err("short");
        assert!(matches!(err, StorageError::Decode { .. }));
    }
}
