//! The cache-backed thumbnail generator.
//!
//! [`Thumbnailer`] answers "give me the thumbnail for this video" by checking
//! its [`ThumbnailCache`] first and only running the decoder on a miss. A
//! request moves through these steps:
//!
//! 1. cache lookup; a hit returns immediately with no process spawned;
//! 2. a fresh, exclusively owned temporary JPEG path is created;
//! 3. the [`FrameExtractor`] decodes the first frame into it;
//! 4. the file is read back and the temporary file removed;
//! 5. on success the thumbnail is cached and returned, on failure the error
//!    is returned and the cache is left untouched.
//!
//! Nothing is retried automatically. Calling [`generate`](Thumbnailer::generate)
//! again is the retry, and it succeeds once the underlying problem (for
//! example a missing decoder) has been fixed.
//!
//! Concurrent calls for different videos run fully in parallel. Two
//! concurrent calls for the same uncached video may both run the decoder;
//! both produce the same bytes and whichever finishes last wins the cache
//! slot.

use std::path::Path;
use std::sync::Arc;

use crate::cache::ThumbnailCache;
use crate::configuration::ThumbnailerOptions;
use crate::error::ThumbnailError;
use crate::ffmpeg::FrameExtractor;
use crate::temporary::TemporaryOutput;
use crate::thumbnail::Thumbnail;

/// Generates and caches one thumbnail per video path.
///
/// `Thumbnailer` is cheap to clone; clones share the same cache, extractor
/// and options, so one instance can be handed to every worker thread.
///
/// # Example
///
/// ```no_run
/// use vidthumb::{FailureKind, Thumbnailer};
///
/// let thumbnailer = Thumbnailer::new();
/// match thumbnailer.generate("holiday.mov") {
///     Ok(thumbnail) => println!("{} bytes", thumbnail.len()),
///     Err(error) if error.kind() == FailureKind::ToolNotFound => {
///         eprintln!("install FFmpeg to see thumbnails");
///     }
///     Err(error) => eprintln!("no thumbnail: {error}"),
/// }
///
/// // Later requests for the same path are served from memory.
/// let again = thumbnailer.cached("holiday.mov");
/// ```
#[derive(Clone)]
pub struct Thumbnailer {
    cache: Arc<ThumbnailCache>,
    extractor: Arc<dyn FrameExtractor>,
    pub(crate) options: Arc<ThumbnailerOptions>,
}

impl Default for Thumbnailer {
    fn default() -> Self {
        Self::new()
    }
}

impl Thumbnailer {
    /// Create a thumbnailer with default options and an empty cache.
    pub fn new() -> Self {
        Self::with_options(ThumbnailerOptions::new())
    }

    /// Create a thumbnailer with the given options and an empty cache.
    pub fn with_options(options: ThumbnailerOptions) -> Self {
        let extractor = options.extractor();
        Self {
            cache: Arc::new(ThumbnailCache::new()),
            extractor: Arc::new(extractor),
            options: Arc::new(options),
        }
    }

    /// Replace the frame extractor.
    ///
    /// The options' program and log level only configure the default
    /// FFmpeg extractor and are ignored by a custom one.
    #[must_use]
    pub fn with_extractor<E: FrameExtractor + 'static>(mut self, extractor: E) -> Self {
        self.extractor = Arc::new(extractor);
        self
    }

    /// Use `cache` instead of a private one, so several thumbnailers can
    /// share results.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<ThumbnailCache>) -> Self {
        self.cache = cache;
        self
    }

    /// The cache backing this thumbnailer.
    pub fn cache(&self) -> &Arc<ThumbnailCache> {
        &self.cache
    }

    /// The options this thumbnailer was built with.
    pub fn options(&self) -> &ThumbnailerOptions {
        &self.options
    }

    /// Return the thumbnail for `video`, generating it on a cache miss.
    ///
    /// Blocks the calling thread while the decoder runs. Other threads
    /// calling `generate` at the same time are not blocked.
    ///
    /// # Errors
    ///
    /// - [`ThumbnailError::ToolNotFound`] if the decoder is not installed;
    /// - [`ThumbnailError::DecodeError`] if it cannot decode this file, or
    ///   produced an empty image;
    /// - [`ThumbnailError::SourceNotFound`] if the file does not exist;
    /// - [`ThumbnailError::TemporaryFile`] if the temporary JPEG could not
    ///   be created or read back.
    pub fn generate<P: AsRef<Path>>(&self, video: P) -> Result<Thumbnail, ThumbnailError> {
        let video = video.as_ref();
        if let Some(thumbnail) = self.cache.get(video) {
            log::debug!("Thumbnail cache hit for {}", video.display());
            return Ok(thumbnail);
        }

        log::debug!("Thumbnail cache miss for {}", video.display());
        let thumbnail = self.extract(video).inspect_err(|error| match error {
            ThumbnailError::TemporaryFile { path, source } => log::warn!(
                "Temporary file {} failed for {}: {source}",
                path.display(),
                video.display()
            ),
            other => log::debug!("No thumbnail for {}: {other}", video.display()),
        })?;

        self.cache.put(video, thumbnail.clone());
        Ok(thumbnail)
    }

    /// Non-blocking cache probe: the thumbnail for `video` if one has
    /// already been generated.
    pub fn cached<P: AsRef<Path>>(&self, video: P) -> Option<Thumbnail> {
        self.cache.get(video)
    }

    /// Returns `true` if a thumbnail for `video` is cached.
    pub fn is_cached<P: AsRef<Path>>(&self, video: P) -> bool {
        self.cache.contains(video)
    }

    /// Forget every cached thumbnail.
    pub fn clear_cache(&self) {
        log::debug!("Clearing {} cached thumbnails", self.cache.len());
        self.cache.clear();
    }

    /// Check that the configured FFmpeg program can be started, returning
    /// its version banner.
    ///
    /// This probes the program named in the options even when a custom
    /// extractor has been installed.
    ///
    /// # Errors
    ///
    /// Returns [`ThumbnailError::ToolNotFound`] if it cannot.
    pub fn check_decoder(&self) -> Result<String, ThumbnailError> {
        self.options.extractor().check_available()
    }

    fn extract(&self, video: &Path) -> Result<Thumbnail, ThumbnailError> {
        let output = TemporaryOutput::create_in(&self.options.temporary_directory)?;
        let result = self
            .extractor
            .extract(video, output.path())
            .and_then(|()| output.read());
        output.cleanup();

        let bytes = result.map_err(|error| classify_missing_source(video, error))?;
        if bytes.is_empty() {
            return Err(ThumbnailError::decode(video, "decoder produced no image"));
        }
        Ok(Thumbnail::from_jpeg(bytes))
    }
}

/// A decode failure for a file that no longer exists is reported as
/// [`ThumbnailError::SourceNotFound`].
fn classify_missing_source(video: &Path, error: ThumbnailError) -> ThumbnailError {
    match error {
        ThumbnailError::DecodeError { .. } if matches!(video.try_exists(), Ok(false)) => {
            ThumbnailError::SourceNotFound {
                path: video.to_path_buf(),
            }
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::error::FailureKind;

    struct FixedBytes {
        bytes: Vec<u8>,
        calls: AtomicUsize,
    }

    impl FrameExtractor for FixedBytes {
        fn extract(&self, _video: &Path, output: &Path) -> Result<(), ThumbnailError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            fs::write(output, &self.bytes).map_err(ThumbnailError::from)
        }
    }

    struct AlwaysFails;

    impl FrameExtractor for AlwaysFails {
        fn extract(&self, video: &Path, _output: &Path) -> Result<(), ThumbnailError> {
            Err(ThumbnailError::decode(video, "Invalid data found when processing input"))
        }
    }

    fn thumbnailer_in(directory: &Path) -> Thumbnailer {
        Thumbnailer::with_options(
            ThumbnailerOptions::new().with_temporary_directory(directory),
        )
    }

    #[test]
    fn hit_skips_extractor() {
        let directory = tempfile::tempdir().expect("Failed to create temp dir");
        let extractor = Arc::new(FixedBytes {
            bytes: vec![0xFF, 0xD8, 0xFF, 0xD9],
            calls: AtomicUsize::new(0),
        });
        let thumbnailer = thumbnailer_in(directory.path()).with_extractor(Arc::clone(&extractor));
        thumbnailer.cache().put("seen.mp4", Thumbnail::from_jpeg(vec![1, 2, 3]));

        let thumbnail = thumbnailer.generate("seen.mp4").unwrap();
        assert_eq!(thumbnail.as_bytes(), &[1, 2, 3]);
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn empty_output_is_decode_error_and_not_cached() {
        let directory = tempfile::tempdir().expect("Failed to create temp dir");
        let video = directory.path().join("blank.mp4");
        fs::write(&video, b"").unwrap();
        let thumbnailer = thumbnailer_in(directory.path()).with_extractor(FixedBytes {
            bytes: Vec::new(),
            calls: AtomicUsize::new(0),
        });

        let error = thumbnailer.generate(&video).unwrap_err();
        assert_eq!(error.kind(), FailureKind::Decode);
        assert!(!thumbnailer.is_cached(&video));
    }

    #[test]
    fn decode_failure_on_missing_file_is_source_not_found() {
        let directory = tempfile::tempdir().expect("Failed to create temp dir");
        let thumbnailer = thumbnailer_in(directory.path()).with_extractor(AlwaysFails);
        let missing = directory.path().join("deleted.mp4");

        let error = thumbnailer.generate(&missing).unwrap_err();
        assert!(matches!(error, ThumbnailError::SourceNotFound { .. }), "{error}");
        assert_eq!(error.kind(), FailureKind::SourceNotFound);
    }

    #[test]
    fn decode_failure_on_existing_file_stays_decode_error() {
        let directory = tempfile::tempdir().expect("Failed to create temp dir");
        let video = directory.path().join("corrupt.mp4");
        fs::write(&video, b"not a video").unwrap();
        let thumbnailer = thumbnailer_in(directory.path()).with_extractor(AlwaysFails);

        let error = thumbnailer.generate(&video).unwrap_err();
        assert!(matches!(error, ThumbnailError::DecodeError { .. }), "{error}");
    }
}
