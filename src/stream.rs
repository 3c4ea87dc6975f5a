//! Async thumbnail generation.
//!
//! This module provides [`ThumbnailFuture`] for awaiting a single thumbnail
//! and [`ThumbnailStream`] for receiving a whole directory's thumbnails as
//! they complete.
//!
//! Both use `tokio::task::spawn_blocking` internally: the decoder process
//! is waited on from a dedicated blocking thread, so a slow video never
//! stalls the async runtime or any other request.
//!
//! # Example
//!
//! ```no_run
//! use tokio_stream::StreamExt;
//!
//! use vidthumb::{Thumbnailer, ThumbnailError};
//!
//! # async fn example() -> Result<(), ThumbnailError> {
//! let thumbnailer = Thumbnailer::new();
//! let first = thumbnailer.generate_async("a.mp4").await?;
//!
//! let mut stream = thumbnailer.thumbnail_stream(["b.mp4", "c.mkv"]);
//! while let Some((path, result)) = stream.next().await {
//!     println!("{}: {:?}", path.display(), result.map(|t| t.len()));
//! }
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::sync::Semaphore;
use tokio::sync::mpsc::Receiver;
use tokio::task::JoinHandle;
use tokio_stream::Stream;

use crate::batch::BatchResult;
use crate::error::ThumbnailError;
use crate::generator::Thumbnailer;
use crate::thumbnail::Thumbnail;

/// Default bounded-channel capacity for [`ThumbnailStream`].
const DEFAULT_CHANNEL_CAPACITY: usize = 16;

/// A future that resolves to one thumbnail.
///
/// Created via [`Thumbnailer::generate_async`]. The generation runs on a
/// blocking thread; dropping the future does not stop it, and a finished
/// generation still lands in the cache.
pub struct ThumbnailFuture {
    handle: JoinHandle<Result<Thumbnail, ThumbnailError>>,
}

impl Future for ThumbnailFuture {
    type Output = Result<Thumbnail, ThumbnailError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.handle)
            .poll(cx)
            .map(|result| result.unwrap_or_else(|_| Err(ThumbnailError::Cancelled)))
    }
}

/// A stream of `(path, result)` pairs in completion order.
///
/// Implements [`tokio_stream::Stream`]. At most `max_concurrent_jobs`
/// videos are generated at once. Dropping the stream stops further videos
/// from starting; jobs already running finish and populate the cache.
pub struct ThumbnailStream {
    receiver: Receiver<BatchResult>,
    #[allow(dead_code)]
    handle: JoinHandle<()>,
}

impl Stream for ThumbnailStream {
    type Item = BatchResult;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

impl Thumbnailer {
    /// Generate the thumbnail for `video` without blocking the runtime.
    ///
    /// A cached thumbnail resolves without running the decoder.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn generate_async<P: AsRef<Path>>(&self, video: P) -> ThumbnailFuture {
        let video = video.as_ref().to_path_buf();
        let thumbnailer = self.clone();
        let cached = self.cached(&video);
        let handle = match cached {
            Some(thumbnail) => tokio::spawn(async move { Ok(thumbnail) }),
            None => tokio::task::spawn_blocking(move || thumbnailer.generate(&video)),
        };
        ThumbnailFuture { handle }
    }

    /// Generate thumbnails for `videos` concurrently, yielding each result
    /// as soon as it is ready.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn thumbnail_stream<I, P>(&self, videos: I) -> ThumbnailStream
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let videos: Vec<PathBuf> = videos
            .into_iter()
            .map(|video| video.as_ref().to_path_buf())
            .collect();
        let capacity = DEFAULT_CHANNEL_CAPACITY.max(self.options.max_concurrent_jobs);
        let (sender, receiver) = tokio::sync::mpsc::channel(capacity);
        let semaphore = Arc::new(Semaphore::new(self.options.max_concurrent_jobs));
        let thumbnailer = self.clone();

        let handle = tokio::spawn(async move {
            for video in videos {
                if sender.is_closed() {
                    break;
                }
                if thumbnailer.options.is_cancelled() {
                    if sender.send((video, Err(ThumbnailError::Cancelled))).await.is_err() {
                        break;
                    }
                    continue;
                }
                if let Some(thumbnail) = thumbnailer.cached(&video) {
                    if sender.send((video, Ok(thumbnail))).await.is_err() {
                        break;
                    }
                    continue;
                }

                let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
                    break;
                };
                if sender.is_closed() {
                    break;
                }
                let job_thumbnailer = thumbnailer.clone();
                let job_sender = sender.clone();
                tokio::task::spawn_blocking(move || {
                    let result = job_thumbnailer.generate(&video);
                    drop(permit);
                    // The receiver may have been dropped.
                    let _ = job_sender.blocking_send((video, result));
                });
            }
        });

        ThumbnailStream { receiver, handle }
    }
}
