//! # vidthumb
//!
//! Cache-backed video thumbnails for file-browser style grids.
//!
//! `vidthumb` turns a video path into a fixed-size JPEG poster frame by
//! running the `ffmpeg` command-line tool once per video and remembering
//! the result for the rest of the process. It is built for the moment a
//! folder is opened and every visible video needs a thumbnail at once:
//! requests run concurrently, cache hits cost nothing, and a missing
//! decoder is an ordinary, recoverable error rather than a startup failure.
//!
//! ## Quick Start
//!
//! ### Generate a Thumbnail
//!
//! ```no_run
//! use vidthumb::Thumbnailer;
//!
//! let thumbnailer = Thumbnailer::new();
//! let thumbnail = thumbnailer.generate("clips/intro.mp4").unwrap();
//! let url = thumbnail.to_data_url(); // data:image/jpeg;base64,...
//! ```
//!
//! ### Tell "no decoder" Apart from "bad file"
//!
//! ```no_run
//! use vidthumb::{FailureKind, Thumbnailer};
//!
//! let thumbnailer = Thumbnailer::new();
//! if let Err(error) = thumbnailer.generate("clips/broken.mkv") {
//!     match error.kind() {
//!         FailureKind::ToolNotFound => println!("Install FFmpeg to see previews"),
//!         _ => println!("No preview for this file: {error}"),
//!     }
//! }
//! ```
//!
//! ### Thumbnail a Whole Folder
//!
//! ```no_run
//! use vidthumb::{Thumbnailer, ThumbnailerOptions, read_directory};
//!
//! let listing = read_directory("/home/me/Videos").unwrap();
//! let thumbnailer = Thumbnailer::with_options(
//!     ThumbnailerOptions::from_env().with_max_concurrent_jobs(4),
//! );
//! let results = thumbnailer.generate_all(listing.videos.iter().map(|video| &video.path));
//! ```
//!
//! ## Output
//!
//! Every thumbnail is a [`THUMBNAIL_WIDTH`] × [`THUMBNAIL_HEIGHT`] JPEG at
//! FFmpeg quality [`JPEG_QUALITY`]: the first frame scaled to fit without
//! distortion and centred on black bars.
//!
//! ## Caching
//!
//! The [`ThumbnailCache`] lives as long as the process, keeps one entry per
//! exact path string, and never evicts. There is no LRU or TTL; call
//! [`Thumbnailer::clear_cache`] to start over. Failures are never cached.
//!
//! ### Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `async` | `ThumbnailFuture` and `ThumbnailStream` via Tokio |
//! | `rayon` | `generate_all_parallel()` on the rayon thread pool |
//! | `full` | Enables all of the above |
//!
//! ## Requirements
//!
//! The `ffmpeg` executable must be on `PATH` (or configured through
//! [`ThumbnailerOptions::with_program`] / `VIDTHUMB_FFMPEG`) at the time a
//! thumbnail is generated. It does not need to be present at build time.

pub mod batch;
pub mod cache;
pub mod configuration;
pub mod error;
pub mod ffmpeg;
pub mod generator;
pub mod library;
pub mod progress;
#[cfg(feature = "rayon")]
mod rayon;
#[cfg(feature = "async")]
pub mod stream;
mod temporary;
pub mod thumbnail;

pub use batch::BatchResult;
pub use cache::ThumbnailCache;
pub use configuration::ThumbnailerOptions;
pub use error::{FailureKind, ThumbnailError};
pub use ffmpeg::{FfmpegExtractor, FfmpegLogLevel, FrameExtractor};
pub use generator::Thumbnailer;
pub use library::{
    DirectoryEntry, DirectoryListing, VIDEO_EXTENSIONS, VideoEntry, is_video_file, move_file,
    parent_directory, read_directory,
};
pub use progress::{CancellationToken, ProgressCallback, ProgressInfo};
#[cfg(feature = "async")]
pub use stream::{ThumbnailFuture, ThumbnailStream};
pub use thumbnail::{
    DATA_URL_PREFIX, JPEG_QUALITY, LetterboxRegion, THUMBNAIL_HEIGHT, THUMBNAIL_WIDTH, Thumbnail,
};
