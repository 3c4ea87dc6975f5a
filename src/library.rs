//! Directory browsing helpers.
//!
//! A thumbnail grid is fed by a directory listing: the subdirectories to
//! navigate into and the video files to preview. [`read_directory`] builds
//! that listing, [`parent_directory`] supports "go up", and [`move_file`]
//! implements dropping a video onto a folder.
//!
//! # Example
//!
//! ```no_run
//! use vidthumb::{Thumbnailer, ThumbnailError, read_directory};
//!
//! let listing = read_directory("/home/me/Videos")?;
//! let thumbnailer = Thumbnailer::new();
//! let results = thumbnailer.generate_all(listing.videos.iter().map(|video| &video.path));
//! # Ok::<(), ThumbnailError>(())
//! ```

use std::cmp::Reverse;
use std::fs;
use std::io::{Error as IoError, ErrorKind};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::ThumbnailError;

/// File extensions (lower case, without the dot) recognised as video.
pub const VIDEO_EXTENSIONS: [&str; 8] = ["mp4", "webm", "avi", "mov", "mkv", "flv", "wmv", "m4v"];

/// Returns `true` if `path` has one of the [`VIDEO_EXTENSIONS`], in any case.
pub fn is_video_file<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| {
            VIDEO_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(extension))
        })
}

/// A subdirectory inside a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// Final path component.
    pub name: String,
    /// Full path.
    pub path: PathBuf,
}

/// A video file inside a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoEntry {
    /// Final path component.
    pub name: String,
    /// Full path; this is the key thumbnails are cached under.
    pub path: PathBuf,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time, when the platform reports one.
    pub modified: Option<SystemTime>,
    /// Creation time, when the platform reports one.
    pub created: Option<SystemTime>,
}

impl VideoEntry {
    /// The timestamp used for ordering: modification time, falling back to
    /// creation time.
    pub fn sort_time(&self) -> Option<SystemTime> {
        self.modified.or(self.created)
    }
}

/// The contents of one directory, ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryListing {
    /// The directory that was read.
    pub path: PathBuf,
    /// Subdirectories, sorted by name.
    pub subdirectories: Vec<DirectoryEntry>,
    /// Video files, most recently modified first.
    pub videos: Vec<VideoEntry>,
}

/// List the subdirectories and video files directly inside `directory`.
///
/// Files without a video extension are left out. Entries whose metadata
/// cannot be read (for example a file deleted while listing) are skipped
/// and logged rather than failing the whole listing.
///
/// # Errors
///
/// Returns [`ThumbnailError::IoError`] if the directory itself cannot be
/// read.
pub fn read_directory<P: AsRef<Path>>(directory: P) -> Result<DirectoryListing, ThumbnailError> {
    let directory = directory.as_ref();
    let mut subdirectories = Vec::new();
    let mut videos = Vec::new();

    for entry in fs::read_dir(directory)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(error) => {
                log::warn!("Skipping entry in {}: {error}", directory.display());
                continue;
            }
        };
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();

        // Follows symlinks, so a link to a folder lists as a folder.
        let metadata = match fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(error) => {
                log::warn!("Skipping {}: {error}", path.display());
                continue;
            }
        };

        if metadata.is_dir() {
            subdirectories.push(DirectoryEntry { name, path });
        } else if metadata.is_file() && is_video_file(&path) {
            videos.push(VideoEntry {
                name,
                path,
                size: metadata.len(),
                modified: metadata.modified().ok(),
                created: metadata.created().ok(),
            });
        }
    }

    subdirectories.sort_by(|a, b| a.name.cmp(&b.name));
    videos.sort_by_key(|video| Reverse(video.sort_time()));

    log::debug!(
        "Listed {}: {} folders, {} videos",
        directory.display(),
        subdirectories.len(),
        videos.len()
    );

    Ok(DirectoryListing {
        path: directory.to_path_buf(),
        subdirectories,
        videos,
    })
}

/// The parent of `directory`, or `None` at a filesystem root.
pub fn parent_directory<P: AsRef<Path>>(directory: P) -> Option<PathBuf> {
    directory
        .as_ref()
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map(Path::to_path_buf)
}

/// Move `source` into `destination_directory`, keeping its file name.
///
/// Returns the new path. Moving a file onto the folder it is already in is
/// a no-op. Thumbnails are keyed by path, so the moved file gets a fresh
/// thumbnail under its new path on the next request.
///
/// # Errors
///
/// Returns [`ThumbnailError::IoError`] if `source` has no file name, if a
/// different file with the same name already exists in the destination, or
/// if the rename fails (for example across filesystems).
pub fn move_file<P, Q>(source: P, destination_directory: Q) -> Result<PathBuf, ThumbnailError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let source = source.as_ref();
    let file_name = source.file_name().ok_or_else(|| {
        IoError::new(
            ErrorKind::InvalidInput,
            format!("{} has no file name", source.display()),
        )
    })?;
    let destination = destination_directory.as_ref().join(file_name);

    if destination == source {
        return Ok(destination);
    }
    if destination.try_exists()? {
        return Err(IoError::new(
            ErrorKind::AlreadyExists,
            format!("{} already exists", destination.display()),
        )
        .into());
    }

    fs::rename(source, &destination)?;
    log::debug!("Moved {} to {}", source.display(), destination.display());
    Ok(destination)
}
