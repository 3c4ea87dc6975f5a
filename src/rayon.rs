//! Batch generation on the rayon thread pool.
//!
//! [`Thumbnailer::generate_all_parallel`] is the rayon counterpart of
//! [`Thumbnailer::generate_all`]. Concurrency is bounded by the rayon pool
//! (size it with `RAYON_NUM_THREADS` or a custom pool via `install`)
//! rather than by `max_concurrent_jobs`.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use ::rayon::iter::{IntoParallelIterator, ParallelIterator};

use crate::batch::BatchResult;
use crate::error::ThumbnailError;
use crate::generator::Thumbnailer;
use crate::progress::ProgressTracker;

impl Thumbnailer {
    /// Generate thumbnails for every path in `videos` across rayon threads.
    ///
    /// Results are returned in input order. Cancellation and progress
    /// behave as in [`generate_all`](Thumbnailer::generate_all).
    pub fn generate_all_parallel<I, P>(&self, videos: I) -> Vec<BatchResult>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let videos: Vec<PathBuf> = videos
            .into_iter()
            .map(|video| video.as_ref().to_path_buf())
            .collect();

        let tracker = Mutex::new(ProgressTracker::new(
            self.options.progress.clone(),
            Some(videos.len() as u64),
            self.options.batch_size,
        ));

        let results: Vec<BatchResult> = videos
            .into_par_iter()
            .map(|video| {
                let result = if self.options.is_cancelled() {
                    Err(ThumbnailError::Cancelled)
                } else {
                    self.generate(&video)
                };
                tracker
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .advance(&video, result.is_ok());
                (video, result)
            })
            .collect();

        tracker
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .finish();
        results
    }
}
