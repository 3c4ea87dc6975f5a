//! Error types for the `vidthumb` crate.
//!
//! This module defines [`ThumbnailError`], the unified error type returned by
//! all fallible operations in the crate, and [`FailureKind`], the coarse
//! classification a presentation layer uses to decide what to tell the user.
//!
//! Failures are never cached. A request that failed because the decoder was
//! missing succeeds on a later call once the decoder is installed.

use std::{io::Error as IoError, path::PathBuf};

use image::ImageError;
use thiserror::Error;

/// The unified error type for all `vidthumb` operations.
///
/// Every public method that can fail returns `Result<T, ThumbnailError>`.
/// Variants carry enough context to diagnose the problem without needing
/// additional logging at the call site.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ThumbnailError {
    /// The decoder executable could not be located or executed.
    #[error("Video decoder `{program}` is not available: {reason}")]
    ToolNotFound {
        /// Program name or path that was spawned.
        program: String,
        /// Underlying reason the spawn failed.
        reason: String,
    },

    /// The decoder ran but could not produce a frame for this input.
    #[error("Failed to decode a thumbnail from {path}: {reason}")]
    DecodeError {
        /// Video path that was passed to the decoder.
        path: PathBuf,
        /// Decoder diagnostics (tail of its stderr) or a short description.
        reason: String,
    },

    /// The source video no longer exists.
    #[error("Video file not found: {path}")]
    SourceNotFound {
        /// Video path that was requested.
        path: PathBuf,
    },

    /// The per-job temporary artifact could not be created or read back.
    #[error("Temporary thumbnail file {path} failed: {source}")]
    TemporaryFile {
        /// Location of the temporary artifact.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: IoError,
    },

    /// An I/O error occurred while listing or moving files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate while decoding a payload.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),

    /// The operation was cancelled via a [`CancellationToken`](crate::CancellationToken)
    /// or its worker was torn down before finishing.
    #[error("Operation cancelled")]
    Cancelled,
}

/// Coarse classification of a [`ThumbnailError`].
///
/// A user interface renders [`FailureKind::ToolNotFound`] as "install the
/// decoder" and [`FailureKind::Decode`] as "no thumbnail for this file".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// No decoder is available on this host.
    ToolNotFound,
    /// The decoder could not handle this particular file.
    Decode,
    /// The file disappeared before it could be decoded.
    SourceNotFound,
    /// Anything else (listing, moving, cancellation).
    Other,
}

impl ThumbnailError {
    /// Classify this error for presentation purposes.
    ///
    /// Temporary-file failures count as decode failures: the caller cannot
    /// do anything different about them.
    pub fn kind(&self) -> FailureKind {
        match self {
            ThumbnailError::ToolNotFound { .. } => FailureKind::ToolNotFound,
            ThumbnailError::DecodeError { .. } | ThumbnailError::TemporaryFile { .. } => {
                FailureKind::Decode
            }
            ThumbnailError::SourceNotFound { .. } => FailureKind::SourceNotFound,
            ThumbnailError::IoError(_)
            | ThumbnailError::ImageError(_)
            | ThumbnailError::Cancelled => FailureKind::Other,
        }
    }

    /// Returns `true` if the decoder executable is missing.
    pub fn is_tool_not_found(&self) -> bool {
        self.kind() == FailureKind::ToolNotFound
    }

    pub(crate) fn decode(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        ThumbnailError::DecodeError {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
