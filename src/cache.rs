//! Process-lifetime thumbnail cache.
//!
//! [`ThumbnailCache`] maps a video path to the thumbnail generated for it.
//! Entries are created on the first successful generation, never mutated
//! in place, and never evicted: the cache only shrinks through
//! [`clear`](ThumbnailCache::clear) or process exit. Growth is unbounded,
//! which suits a single interactive browsing session.
//!
//! Keys are the exact path as given, compared byte-for-byte on its
//! [`OsStr`] form. `clips/a.mp4` and `clips//a.mp4` are different keys even
//! though they name the same file.

use std::collections::HashMap;
use std::ffi::{OsStr, OsString};
use std::path::Path;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::thumbnail::Thumbnail;

/// A thread-safe map from video path to [`Thumbnail`].
///
/// Reads take a shared lock and writes an exclusive one; neither is held
/// across any decoding work, so lookups never wait on a running decoder.
/// Payloads are inserted whole, so a reader racing a writer for the same
/// key sees either the old state or the complete new thumbnail.
///
/// # Example
///
/// ```
/// use vidthumb::{Thumbnail, ThumbnailCache};
///
/// let cache = ThumbnailCache::new();
/// assert!(cache.get("movie.mp4").is_none());
///
/// cache.put("movie.mp4", Thumbnail::from_jpeg(vec![0xFF, 0xD8]));
/// assert!(cache.contains("movie.mp4"));
///
/// cache.clear();
/// assert!(cache.is_empty());
/// ```
#[derive(Debug, Default)]
pub struct ThumbnailCache {
    entries: RwLock<HashMap<OsString, Thumbnail>>,
}

impl ThumbnailCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the thumbnail for `path`.
    pub fn get<P: AsRef<Path>>(&self, path: P) -> Option<Thumbnail> {
        self.read().get(key(path.as_ref())).cloned()
    }

    /// Returns `true` if a thumbnail is cached for `path`.
    pub fn contains<P: AsRef<Path>>(&self, path: P) -> bool {
        self.read().contains_key(key(path.as_ref()))
    }

    /// Insert or overwrite the thumbnail for `path`.
    pub fn put<P: AsRef<Path>>(&self, path: P, thumbnail: Thumbnail) {
        self.write()
            .insert(key(path.as_ref()).to_os_string(), thumbnail);
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.write().clear();
    }

    /// Number of cached thumbnails.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // A panic while holding the lock cannot leave a half-inserted entry, so
    // a poisoned map is still consistent.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<OsString, Thumbnail>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<OsString, Thumbnail>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn key(path: &Path) -> &OsStr {
    path.as_os_str()
}
