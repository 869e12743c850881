use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Ensure output directory exists; create if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::OutputDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    }
    Ok(())
}

/// Streams an artifact into a temp file next to `target`, then renames it into place.
///
/// Dropping an unfinished download removes the temp file, so a failed transfer
/// never leaves a truncated artifact behind.
pub struct AtomicDownload {
    target: PathBuf,
    tmp: NamedTempFile,
    written: u64,
}

impl AtomicDownload {
    pub fn create(target: &Path) -> Result<Self, PersistError> {
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        ensure_output_dir(&dir)?;
        let tmp = NamedTempFile::new_in(&dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
        Ok(Self {
            target: target.to_path_buf(),
            tmp,
            written: 0,
        })
    }

    pub fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), PersistError> {
        self.tmp.write_all(chunk)?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    /// Flushes and renames into place, replacing an existing file.
    pub fn finish(mut self) -> Result<PathBuf, PersistError> {
        self.tmp.flush()?;
        self.tmp.as_file_mut().sync_all()?;
        if self.target.exists() {
            fs::remove_file(&self.target)?;
        }
        self.tmp
            .persist(&self.target)
            .map_err(|e| PersistError::Io(e.error))?;
        Ok(self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn creates_missing_output_dir() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("nested").join("results.xlsx");

        let mut download = AtomicDownload::create(&target).unwrap();
        download.write_chunk(b"abc").unwrap();
        download.write_chunk(b"def").unwrap();
        assert_eq!(download.written(), 6);
        let path = download.finish().unwrap();

        assert_eq!(path, target);
        assert_eq!(fs::read(&target).unwrap(), b"abcdef");
    }

    #[test]
    fn finish_replaces_existing_file() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("results.xlsx");
        fs::write(&target, "old").unwrap();

        let mut download = AtomicDownload::create(&target).unwrap();
        download.write_chunk(b"new").unwrap();
        download.finish().unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "new");
    }

    #[test]
    fn abandoned_download_leaves_nothing() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("results.xlsx");

        let mut download = AtomicDownload::create(&target).unwrap();
        download.write_chunk(b"partial").unwrap();
        drop(download);

        assert!(!target.exists());
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);
    }

    #[test]
    fn parent_that_is_a_file_is_rejected() {
        let temp = TempDir::new().unwrap();
        let file_path = temp.path().join("not_a_dir");
        fs::write(&file_path, "x").unwrap();

        let result = AtomicDownload::create(&file_path.join("results.xlsx"));
        assert!(matches!(result, Err(PersistError::OutputDir(_))));
    }
}
