//! Thumbnailer configuration.
//!
//! [`ThumbnailerOptions`] is a builder that threads the decoder program,
//! temporary directory, concurrency bound, and batch progress settings into
//! a [`Thumbnailer`](crate::Thumbnailer) without polluting every function
//! signature.
//!
//! The output geometry and encoding are fixed constants (see
//! [`THUMBNAIL_WIDTH`](crate::THUMBNAIL_WIDTH)) and are not
//! configurable.
//!
//! # Example
//!
//! ```no_run
//! use vidthumb::{CancellationToken, FfmpegLogLevel, ThumbnailerOptions};
//!
//! let token = CancellationToken::new();
//! let options = ThumbnailerOptions::from_env()
//!     .with_log_level(FfmpegLogLevel::Quiet)
//!     .with_max_concurrent_jobs(4)
//!     .with_cancellation(token.clone());
//! ```

use std::env;
use std::ffi::OsString;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use crate::ffmpeg::{DEFAULT_PROGRAM, FfmpegExtractor, FfmpegLogLevel, PROGRAM_ENV_VAR};
use crate::progress::{CancellationToken, NoOpProgress, ProgressCallback};

/// Configuration for a [`Thumbnailer`](crate::Thumbnailer).
///
/// All fields have sensible defaults: `ffmpeg` from `PATH`, the system
/// temporary directory, one concurrent job per available CPU, no progress
/// callback and no cancellation.
#[derive(Clone)]
pub struct ThumbnailerOptions {
    pub(crate) program: OsString,
    pub(crate) log_level: FfmpegLogLevel,
    pub(crate) temporary_directory: PathBuf,
    pub(crate) max_concurrent_jobs: usize,
    pub(crate) progress: Arc<dyn ProgressCallback>,
    pub(crate) cancellation: Option<CancellationToken>,
    pub(crate) batch_size: u64,
}

impl Debug for ThumbnailerOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ThumbnailerOptions")
            .field("program", &self.program)
            .field("log_level", &self.log_level)
            .field("temporary_directory", &self.temporary_directory)
            .field("max_concurrent_jobs", &self.max_concurrent_jobs)
            .field("has_cancellation", &self.cancellation.is_some())
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

impl Default for ThumbnailerOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ThumbnailerOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self {
            program: OsString::from(DEFAULT_PROGRAM),
            log_level: FfmpegLogLevel::default(),
            temporary_directory: env::temp_dir(),
            max_concurrent_jobs: default_concurrency(),
            progress: Arc::new(NoOpProgress),
            cancellation: None,
            batch_size: 1,
        }
    }

    /// Default options, with the decoder program taken from the
    /// `VIDTHUMB_FFMPEG` environment variable when it is set and non-empty.
    pub fn from_env() -> Self {
        let options = Self::new();
        match env::var_os(PROGRAM_ENV_VAR) {
            Some(program) if !program.is_empty() => options.with_program(program),
            _ => options,
        }
    }

    /// Set the decoder executable (bare name resolved on `PATH`, or a path).
    #[must_use]
    pub fn with_program(mut self, program: impl Into<OsString>) -> Self {
        self.program = program.into();
        self
    }

    /// Set the decoder's own console verbosity.
    #[must_use]
    pub fn with_log_level(mut self, level: FfmpegLogLevel) -> Self {
        self.log_level = level;
        self
    }

    /// Set where per-job temporary files are written.
    #[must_use]
    pub fn with_temporary_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.temporary_directory = directory.into();
        self
    }

    /// Bound how many decoder processes batch and async generation run at
    /// once. Clamped to a minimum of 1.
    ///
    /// Direct calls to [`Thumbnailer::generate`](crate::Thumbnailer::generate)
    /// from the caller's own threads are not limited by this value.
    #[must_use]
    pub fn with_max_concurrent_jobs(mut self, jobs: usize) -> Self {
        self.max_concurrent_jobs = jobs.max(1);
        self
    }

    /// Attach a progress callback for batch generation.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Attach a cancellation token for batch and stream generation.
    ///
    /// When the token is cancelled, videos not yet started resolve to
    /// [`ThumbnailError::Cancelled`](crate::ThumbnailError::Cancelled).
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Set how often the progress callback fires.
    ///
    /// A value of 1 means every video; 10 means every 10th video.
    /// Clamped to a minimum of 1.
    #[must_use]
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// The configured concurrency bound.
    pub fn max_concurrent_jobs(&self) -> usize {
        self.max_concurrent_jobs
    }

    /// Build the production extractor these options describe.
    pub(crate) fn extractor(&self) -> FfmpegExtractor {
        FfmpegExtractor::new(self.program.clone()).with_log_level(self.log_level)
    }

    /// Returns `true` if cancellation has been requested.
    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }
}

fn default_concurrency() -> usize {
    thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(4)
}
