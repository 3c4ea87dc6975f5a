//! The thumbnail payload and its fixed output geometry.
//!
//! Every thumbnail produced by this crate is a baseline JPEG of exactly
//! [`THUMBNAIL_WIDTH`] × [`THUMBNAIL_HEIGHT`] pixels: the first frame of the
//! video scaled to fit inside that box with its aspect ratio preserved, then
//! centred on a black canvas. [`Thumbnail`] wraps the encoded bytes and
//! hands them out as raw bytes, a base64 data URL, or decoded pixels.

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::Path;
use std::sync::Arc;

use base64::{Engine, engine::general_purpose::STANDARD};
use image::{DynamicImage, ImageFormat};

use crate::error::ThumbnailError;

/// Output width in pixels.
pub const THUMBNAIL_WIDTH: u32 = 320;

/// Output height in pixels (a 9:16 portrait box).
pub const THUMBNAIL_HEIGHT: u32 = 568;

/// JPEG quality on FFmpeg's `-q:v` scale, where 1 is best and 31 is worst.
pub const JPEG_QUALITY: u8 = 2;

/// Prefix of every data URL produced by [`Thumbnail::to_data_url`].
pub const DATA_URL_PREFIX: &str = "data:image/jpeg;base64,";

/// An encoded JPEG thumbnail.
///
/// Cloning is cheap: the bytes are shared behind an [`Arc`], so handing the
/// same cached thumbnail to many callers never copies the image. The bytes
/// are immutable once constructed.
///
/// # Example
///
/// ```no_run
/// use vidthumb::{Thumbnailer, ThumbnailError};
///
/// let thumbnailer = Thumbnailer::new();
/// let thumbnail = thumbnailer.generate("clips/intro.mp4")?;
/// let url = thumbnail.to_data_url();
/// assert!(url.starts_with("data:image/jpeg;base64,"));
/// # Ok::<(), ThumbnailError>(())
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Thumbnail {
    bytes: Arc<[u8]>,
}

impl Thumbnail {
    /// Wrap already-encoded JPEG bytes.
    ///
    /// No validation is performed; use [`decode`](Thumbnail::decode) to
    /// check that the bytes form a readable image.
    pub fn from_jpeg(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// The encoded JPEG bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Size of the encoded payload in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` if the payload holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Standard (padded) base64 encoding of the JPEG bytes.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    /// A `data:image/jpeg;base64,…` URL suitable for an `<img src>`.
    pub fn to_data_url(&self) -> String {
        let encoded_len = self.bytes.len().div_ceil(3) * 4;
        let mut url = String::with_capacity(DATA_URL_PREFIX.len() + encoded_len);
        url.push_str(DATA_URL_PREFIX);
        STANDARD.encode_string(&self.bytes, &mut url);
        url
    }

    /// Decode the payload into pixels.
    ///
    /// # Errors
    ///
    /// Returns [`ThumbnailError::ImageError`] if the bytes are not a valid
    /// JPEG.
    pub fn decode(&self) -> Result<DynamicImage, ThumbnailError> {
        Ok(image::load_from_memory_with_format(
            &self.bytes,
            ImageFormat::Jpeg,
        )?)
    }

    /// Decode the payload and return its `(width, height)`.
    ///
    /// # Errors
    ///
    /// Same as [`decode`](Thumbnail::decode).
    pub fn dimensions(&self) -> Result<(u32, u32), ThumbnailError> {
        let image = self.decode()?;
        Ok((image.width(), image.height()))
    }

    /// Write the encoded bytes to `path` unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`ThumbnailError::IoError`] if the file cannot be written.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ThumbnailError> {
        std::fs::write(path, &self.bytes)?;
        Ok(())
    }
}

impl Debug for Thumbnail {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Thumbnail")
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl From<Vec<u8>> for Thumbnail {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from_jpeg(bytes)
    }
}

/// Where the scaled picture lands inside the output canvas.
///
/// Everything outside this rectangle is black padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LetterboxRegion {
    /// Left edge of the picture.
    pub x: u32,
    /// Top edge of the picture.
    pub y: u32,
    /// Scaled picture width.
    pub width: u32,
    /// Scaled picture height.
    pub height: u32,
}

impl LetterboxRegion {
    /// Compute the placement of a `source_width` × `source_height` frame.
    ///
    /// Mirrors the decoder's `force_original_aspect_ratio=decrease` scaling
    /// followed by centred padding. A 1920×1080 frame becomes a 320×180
    /// band at `y = 194`.
    pub fn for_source(source_width: u32, source_height: u32) -> Self {
        let (width, height) = fit_within(source_width, source_height);
        Self {
            x: (THUMBNAIL_WIDTH - width) / 2,
            y: (THUMBNAIL_HEIGHT - height) / 2,
            width,
            height,
        }
    }

    /// Returns `true` if the pixel at `(x, y)` belongs to the picture.
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }
}

/// Fit a frame inside the output box preserving aspect ratio.
fn fit_within(width: u32, height: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (THUMBNAIL_WIDTH, THUMBNAIL_HEIGHT);
    }
    let width_for_full_height = rescale(THUMBNAIL_HEIGHT, width, height);
    let height_for_full_width = rescale(THUMBNAIL_WIDTH, height, width);
    (
        width_for_full_height.clamp(1, THUMBNAIL_WIDTH),
        height_for_full_width.clamp(1, THUMBNAIL_HEIGHT),
    )
}

/// `value * numerator / denominator`, rounded to nearest.
fn rescale(value: u32, numerator: u32, denominator: u32) -> u32 {
    let scaled = (value as u64 * numerator as u64 + denominator as u64 / 2) / denominator as u64;
    scaled.min(u32::MAX as u64) as u32
}
