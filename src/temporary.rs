//! Per-job temporary output files.
//!
//! Each extraction job writes the decoder's JPEG to its own file named
//! `thumbnail-<nanoseconds>-<random>.jpg`. The file is created exclusively,
//! so two jobs can never share one even when their timestamps coincide, and
//! it is removed when the job ends whether or not the decoder succeeded.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tempfile::{Builder, TempPath};

use crate::error::ThumbnailError;

const PREFIX: &str = "thumbnail-";
const SUFFIX: &str = ".jpg";
const RANDOM_LENGTH: usize = 9;

/// An exclusively owned temporary file that is deleted on drop.
///
/// Call [`cleanup`](TemporaryOutput::cleanup) to delete it explicitly and
/// have a failed deletion logged; a plain drop deletes it silently.
#[derive(Debug)]
pub(crate) struct TemporaryOutput {
    path: TempPath,
}

impl TemporaryOutput {
    /// Create a new empty file inside `directory`.
    pub(crate) fn create_in(directory: &Path) -> Result<Self, ThumbnailError> {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos())
            .unwrap_or_default();
        let prefix = format!("{PREFIX}{nanos}-");

        let file = Builder::new()
            .prefix(&prefix)
            .suffix(SUFFIX)
            .rand_bytes(RANDOM_LENGTH)
            .tempfile_in(directory)
            .map_err(|source| ThumbnailError::TemporaryFile {
                path: directory.to_path_buf(),
                source,
            })?;

        Ok(Self {
            path: file.into_temp_path(),
        })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole file.
    pub(crate) fn read(&self) -> Result<Vec<u8>, ThumbnailError> {
        fs::read(&self.path).map_err(|source| ThumbnailError::TemporaryFile {
            path: self.path.to_path_buf(),
            source,
        })
    }

    /// Delete the file, logging instead of failing if that is not possible.
    pub(crate) fn cleanup(self) {
        let path: PathBuf = self.path.to_path_buf();
        if let Err(error) = self.path.close() {
            log::warn!(
                "Failed to remove temporary thumbnail {}: {error}",
                path.display()
            );
        }
    }
}
