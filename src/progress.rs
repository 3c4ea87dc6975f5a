//! Progress reporting and cancellation for batch generation.
//!
//! This module provides [`ProgressCallback`] for monitoring a batch,
//! [`CancellationToken`] for cooperative cancellation, and [`ProgressInfo`]
//! for progress snapshots.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use vidthumb::{ProgressCallback, ProgressInfo, Thumbnailer, ThumbnailerOptions};
//!
//! struct PrintProgress;
//!
//! impl ProgressCallback for PrintProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         if let Some(pct) = info.percentage {
//!             println!("{pct:.1}% complete ({} failed)", info.failed);
//!         }
//!     }
//! }
//!
//! let options = ThumbnailerOptions::new().with_progress(Arc::new(PrintProgress));
//! let thumbnailer = Thumbnailer::with_options(options);
//! let results = thumbnailer.generate_all(["a.mp4", "b.mkv"]);
//! ```

use std::path::{Path, PathBuf};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::time::{Duration, Instant};

/// A snapshot of batch progress.
///
/// Delivered to [`ProgressCallback::on_progress`] at a cadence controlled
/// by [`ThumbnailerOptions::with_batch_size`](crate::ThumbnailerOptions::with_batch_size).
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// How many videos have been processed so far (hits, misses and failures).
    pub current: u64,
    /// Total videos in the batch.
    pub total: Option<u64>,
    /// How many of the processed videos failed.
    pub failed: u64,
    /// Completion percentage (0.0 – 100.0), if `total` is known.
    pub percentage: Option<f32>,
    /// Wall-clock time elapsed since the batch started.
    pub elapsed: Duration,
    /// Estimated time remaining, based on current throughput.
    pub estimated_remaining: Option<Duration>,
    /// The video that completed most recently.
    pub current_path: Option<PathBuf>,
}

/// Trait for receiving progress updates during batch generation.
///
/// Implementations must be [`Send`] and [`Sync`] because callbacks are
/// invoked from worker threads.
///
/// Progress callbacks are **infallible**: they observe but cannot halt
/// the batch. Use [`CancellationToken`] for cooperative cancellation.
pub trait ProgressCallback: Send + Sync {
    /// Called at regular intervals during a batch.
    fn on_progress(&self, info: &ProgressInfo);
}

/// A no-op implementation that discards all progress notifications.
///
/// This is the default when no callback is configured.
pub(crate) struct NoOpProgress;

impl ProgressCallback for NoOpProgress {
    fn on_progress(&self, _info: &ProgressInfo) {}
}

/// Cooperative cancellation token backed by an [`AtomicBool`].
///
/// Clone this token and share it between threads; call
/// [`cancel`](CancellationToken::cancel) from any thread to stop a batch
/// from starting further jobs. Jobs already running finish normally.
///
/// # Example
///
/// ```
/// use vidthumb::CancellationToken;
///
/// let token = CancellationToken::new();
/// assert!(!token.is_cancelled());
///
/// token.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new, non-cancelled token.
    pub fn new() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request cancellation.
    ///
    /// All clones of this token will observe the cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Check whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Internal helper that tracks progress timing and emits callbacks.
pub(crate) struct ProgressTracker {
    callback: Arc<dyn ProgressCallback>,
    total: Option<u64>,
    current: u64,
    failed: u64,
    batch_size: u64,
    start_time: Instant,
    items_since_last_report: u64,
}

impl ProgressTracker {
    pub(crate) fn new(callback: Arc<dyn ProgressCallback>, total: Option<u64>, batch_size: u64) -> Self {
        Self {
            callback,
            total,
            current: 0,
            failed: 0,
            batch_size: batch_size.max(1),
            start_time: Instant::now(),
            items_since_last_report: 0,
        }
    }

    /// Record one completed video and fire the callback if the batch
    /// threshold is reached.
    pub(crate) fn advance(&mut self, path: &Path, succeeded: bool) {
        self.current += 1;
        if !succeeded {
            self.failed += 1;
        }
        self.items_since_last_report += 1;

        if self.items_since_last_report >= self.batch_size {
            self.report(Some(path));
            self.items_since_last_report = 0;
        }
    }

    /// Emit a final report unless the last advance already did.
    pub(crate) fn finish(&mut self) {
        if self.items_since_last_report > 0 || self.current == 0 {
            self.report(None);
            self.items_since_last_report = 0;
        }
    }

    fn report(&self, path: Option<&Path>) {
        let elapsed = self.start_time.elapsed();

        let percentage = self
            .total
            .filter(|&t| t > 0)
            .map(|t| (self.current as f32 / t as f32) * 100.0);

        let estimated_remaining = if self.current > 0 {
            self.total.map(|t| {
                let remaining = t.saturating_sub(self.current);
                let per_item = elapsed / self.current as u32;
                per_item * remaining as u32
            })
        } else {
            None
        };

        let info = ProgressInfo {
            current: self.current,
            total: self.total,
            failed: self.failed,
            percentage,
            elapsed,
            estimated_remaining,
            current_path: path.map(Path::to_path_buf),
        };

        self.callback.on_progress(&info);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct Recording {
        infos: Mutex<Vec<ProgressInfo>>,
    }

    impl ProgressCallback for Recording {
        fn on_progress(&self, info: &ProgressInfo) {
            self.infos.lock().unwrap().push(info.clone());
        }
    }

    #[test]
    fn reports_every_batch_and_final() {
        let recording = Arc::new(Recording::default());
        let mut tracker = ProgressTracker::new(recording.clone(), Some(5), 2);
        for index in 0..5 {
            tracker.advance(Path::new("a.mp4"), index != 3);
        }
        tracker.finish();

        let infos = recording.infos.lock().unwrap();
        let currents: Vec<u64> = infos.iter().map(|info| info.current).collect();
        assert_eq!(currents, vec![2, 4, 5]);
        assert_eq!(infos.last().unwrap().failed, 1);
        assert_eq!(infos.last().unwrap().percentage, Some(100.0));
    }

    #[test]
    fn finish_does_not_duplicate_last_report() {
        let recording = Arc::new(Recording::default());
        let mut tracker = ProgressTracker::new(recording.clone(), Some(2), 1);
        tracker.advance(Path::new("a.mp4"), true);
        tracker.advance(Path::new("b.mp4"), true);
        tracker.finish();
        assert_eq!(recording.infos.lock().unwrap().len(), 2);
    }
}
