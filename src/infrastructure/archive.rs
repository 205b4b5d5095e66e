//! Temporary project archives
//!
//! The archiver produces a compressed snapshot of a local directory in a
//! temporary location and hands back a handle whose cleanup runs exactly once,
//! whether the subsequent upload succeeds or fails. If no artifact can be
//! produced the whole check aborts before any network call.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Errors while producing the temporary archive.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("project path does not exist or is not a directory: {0}")]
    PathMissing(PathBuf),

    #[error("i/o error while archiving: {0}")]
    Io(#[from] io::Error),

    #[error("zip write error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("archive task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// A temporary archive artifact with scoped cleanup.
///
/// Cleanup runs exactly once: either through [`release`](Self::release) or,
/// if the handle is dropped without it, through `Drop`.
pub struct ArchiveHandle {
    path: PathBuf,
    cleanup: Option<Box<dyn FnOnce() + Send>>,
}

impl ArchiveHandle {
    pub fn new(path: PathBuf, cleanup: Box<dyn FnOnce() + Send>) -> Self {
        Self {
            path,
            cleanup: Some(cleanup),
        }
    }

    /// Location of the archive artifact.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the artifact now.
    pub fn release(mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            cleanup();
        }
    }
}

impl Drop for ArchiveHandle {
    fn drop(&mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            cleanup();
        }
    }
}

impl std::fmt::Debug for ArchiveHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveHandle")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Produces a temporary compressed snapshot of a directory.
#[async_trait]
pub trait Archiver: Send + Sync {
    async fn archive(&self, dir: &Path) -> Result<ArchiveHandle, ArchiveError>;
}

/// Deflate zip archiver writing into a temp file.
pub struct ZipArchiver;

#[async_trait]
impl Archiver for ZipArchiver {
    async fn archive(&self, dir: &Path) -> Result<ArchiveHandle, ArchiveError> {
        if !dir.is_dir() {
            return Err(ArchiveError::PathMissing(dir.to_path_buf()));
        }

        let root = dir.to_path_buf();
        // Compression is CPU-bound and uses blocking file i/o.
        let temp_path = tokio::task::spawn_blocking(move || write_zip(&root)).await??;

        debug!(path = %temp_path.display(), "project archive written");
        let cleanup_path = temp_path.clone();
        Ok(ArchiveHandle::new(
            temp_path,
            Box::new(move || {
                let _ = fs::remove_file(&cleanup_path);
            }),
        ))
    }
}

fn write_zip(root: &Path) -> Result<PathBuf, ArchiveError> {
    let temp = tempfile::Builder::new()
        .prefix("sastlink-")
        .suffix(".zip")
        .tempfile()?;
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut writer = ZipWriter::new(temp.as_file());

    for entry in WalkDir::new(root).min_depth(1) {
        let entry = entry.map_err(|e| ArchiveError::Io(e.into()))?;
        let relative = entry
            .path()
            .strip_prefix(root)
            .expect("walkdir yields paths under root")
            .to_string_lossy()
            .replace('\\', "/");

        if entry.file_type().is_dir() {
            writer.add_directory(relative, options)?;
        } else if entry.file_type().is_file() {
            writer.start_file(relative, options)?;
            let mut file = fs::File::open(entry.path())?;
            io::copy(&mut file, &mut writer)?;
        }
        // Symlinks and special files are skipped; the server only needs
        // regular source files.
    }

    writer.finish()?;
    // Persist past the NamedTempFile guard; the ArchiveHandle owns deletion.
    let (_file, path) = temp.keep().map_err(|e| ArchiveError::Io(e.error))?;
    Ok(path)
}
