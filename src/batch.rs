//! Bounded concurrent generation for many videos.
//!
//! A directory view asks for every visible thumbnail at once. This module
//! provides [`Thumbnailer::generate_all`], which runs those requests on a
//! small pool of scoped worker threads so that at most
//! [`max_concurrent_jobs`](crate::ThumbnailerOptions::with_max_concurrent_jobs)
//! decoder processes exist at a time. Workers pull the next path from a
//! shared counter; there is no ordering between videos and one failure
//! never affects another video's result.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::{Mutex, PoisonError};
use std::thread;

use crate::error::ThumbnailError;
use crate::generator::Thumbnailer;
use crate::progress::ProgressTracker;
use crate::thumbnail::Thumbnail;

/// One entry of a batch result: the requested path and its outcome.
pub type BatchResult = (PathBuf, Result<Thumbnail, ThumbnailError>);

impl Thumbnailer {
    /// Generate thumbnails for every path in `videos`.
    ///
    /// Returns one entry per input, in input order. Cached videos resolve
    /// without spawning anything. Progress is reported through the options'
    /// callback; once the options' cancellation token fires, videos that
    /// have not started yet resolve to [`ThumbnailError::Cancelled`].
    ///
    /// # Example
    ///
    /// ```no_run
    /// use vidthumb::Thumbnailer;
    ///
    /// let thumbnailer = Thumbnailer::new();
    /// for (path, result) in thumbnailer.generate_all(["a.mp4", "b.webm", "c.mkv"]) {
    ///     match result {
    ///         Ok(thumbnail) => println!("{}: {} bytes", path.display(), thumbnail.len()),
    ///         Err(error) => println!("{}: {error}", path.display()),
    ///     }
    /// }
    /// ```
    pub fn generate_all<I, P>(&self, videos: I) -> Vec<BatchResult>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let videos: Vec<PathBuf> = videos
            .into_iter()
            .map(|video| video.as_ref().to_path_buf())
            .collect();
        if videos.is_empty() {
            return Vec::new();
        }

        let workers = self.options.max_concurrent_jobs.min(videos.len());
        log::debug!(
            "Generating {} thumbnails on {workers} workers",
            videos.len()
        );

        let next = AtomicUsize::new(0);
        let tracker = Mutex::new(ProgressTracker::new(
            self.options.progress.clone(),
            Some(videos.len() as u64),
            self.options.batch_size,
        ));
        let (sender, receiver) = mpsc::channel();

        thread::scope(|scope| {
            for _ in 0..workers {
                let sender = sender.clone();
                let (next, tracker, videos) = (&next, &tracker, &videos);
                scope.spawn(move || {
                    loop {
                        let index = next.fetch_add(1, Ordering::Relaxed);
                        let Some(video) = videos.get(index) else {
                            break;
                        };

                        let result = if self.options.is_cancelled() {
                            Err(ThumbnailError::Cancelled)
                        } else {
                            self.generate(video)
                        };

                        tracker
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .advance(video, result.is_ok());
                        if sender.send((index, result)).is_err() {
                            break;
                        }
                    }
                });
            }
        });
        drop(sender);

        tracker
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .finish();

        let mut outcomes: Vec<Option<Result<Thumbnail, ThumbnailError>>> =
            videos.iter().map(|_| None).collect();
        for (index, result) in receiver {
            outcomes[index] = Some(result);
        }

        videos
            .into_iter()
            .zip(outcomes)
            .map(|(video, outcome)| (video, outcome.unwrap_or(Err(ThumbnailError::Cancelled))))
            .collect()
    }
}
