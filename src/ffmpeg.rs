//! External FFmpeg invocation.
//!
//! Thumbnails are produced by running the `ffmpeg` command-line tool once per
//! cache miss. This module owns everything about that process: the argument
//! list, the decoder's own log verbosity, and the translation of spawn
//! failures and non-zero exits into [`ThumbnailError`] values.
//!
//! The video path always travels as a single argument of an argument list.
//! No shell is involved, so file names containing spaces, quotes, `$` or
//! `;` reach the decoder untouched.
//!
//! The [`FrameExtractor`] trait is the seam between the generator and the
//! decoder. [`FfmpegExtractor`] is the production implementation; tests and
//! embedders can substitute their own.
//!
//! # Example
//!
//! ```no_run
//! use vidthumb::{FfmpegExtractor, FfmpegLogLevel, ThumbnailError};
//!
//! let extractor = FfmpegExtractor::new("ffmpeg").with_log_level(FfmpegLogLevel::Quiet);
//! let version = extractor.check_available()?;
//! println!("using {version}");
//! # Ok::<(), ThumbnailError>(())
//! ```

use std::ffi::{OsStr, OsString};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::io::ErrorKind;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use std::str::FromStr;
use std::sync::Arc;

use crate::error::ThumbnailError;
use crate::thumbnail::{JPEG_QUALITY, THUMBNAIL_HEIGHT, THUMBNAIL_WIDTH};

/// Program spawned when no other decoder is configured.
pub const DEFAULT_PROGRAM: &str = "ffmpeg";

/// Environment variable consulted by
/// [`ThumbnailerOptions::from_env`](crate::ThumbnailerOptions::from_env).
pub const PROGRAM_ENV_VAR: &str = "VIDTHUMB_FFMPEG";

/// How many trailing stderr lines are kept in a decode error.
const STDERR_TAIL_LINES: usize = 3;

/// FFmpeg console verbosity, forwarded as `-loglevel`.
///
/// This controls what the decoder process prints to its stderr, which in
/// turn is what ends up in [`ThumbnailError::DecodeError`] reasons. It does
/// **not** affect Rust-side `log` crate output.
///
/// # Ordering (most verbose → most quiet)
///
/// `Trace` > `Debug` > `Verbose` > `Info` > `Warning` > `Error` > `Fatal` > `Panic` > `Quiet`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FfmpegLogLevel {
    /// Print no output at all.
    Quiet,
    /// Only log conditions after which the process aborts.
    Panic,
    /// Only log unrecoverable errors.
    Fatal,
    /// Log recoverable errors. This is the default.
    #[default]
    Error,
    /// Log warnings.
    Warning,
    /// Log informational messages.
    Info,
    /// Log verbose informational messages.
    Verbose,
    /// Log debugging messages.
    Debug,
    /// Extremely verbose tracing output.
    Trace,
}

impl FfmpegLogLevel {
    /// The value passed after `-loglevel`.
    pub fn as_arg(self) -> &'static str {
        match self {
            FfmpegLogLevel::Quiet => "quiet",
            FfmpegLogLevel::Panic => "panic",
            FfmpegLogLevel::Fatal => "fatal",
            FfmpegLogLevel::Error => "error",
            FfmpegLogLevel::Warning => "warning",
            FfmpegLogLevel::Info => "info",
            FfmpegLogLevel::Verbose => "verbose",
            FfmpegLogLevel::Debug => "debug",
            FfmpegLogLevel::Trace => "trace",
        }
    }
}

impl Display for FfmpegLogLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_arg())
    }
}

impl FromStr for FfmpegLogLevel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "quiet" => Ok(FfmpegLogLevel::Quiet),
            "panic" => Ok(FfmpegLogLevel::Panic),
            "fatal" => Ok(FfmpegLogLevel::Fatal),
            "error" => Ok(FfmpegLogLevel::Error),
            "warning" | "warn" => Ok(FfmpegLogLevel::Warning),
            "info" => Ok(FfmpegLogLevel::Info),
            "verbose" => Ok(FfmpegLogLevel::Verbose),
            "debug" => Ok(FfmpegLogLevel::Debug),
            "trace" => Ok(FfmpegLogLevel::Trace),
            other => Err(format!("unknown FFmpeg log level: {other}")),
        }
    }
}

/// Decodes one representative frame of a video into a JPEG file.
///
/// Implementations must be [`Send`] and [`Sync`]: one extractor serves every
/// concurrent generation job.
pub trait FrameExtractor: Send + Sync {
    /// Write the first frame of `video`, scaled and padded to the thumbnail
    /// box, as a JPEG at `output`.
    ///
    /// `output` already exists (empty) and belongs exclusively to this call.
    ///
    /// # Errors
    ///
    /// [`ThumbnailError::ToolNotFound`] if the decoder cannot be started,
    /// [`ThumbnailError::DecodeError`] if it fails on this input.
    fn extract(&self, video: &Path, output: &Path) -> Result<(), ThumbnailError>;
}

/// A shared extractor, so callers can keep a handle to one they installed.
impl<E: FrameExtractor + ?Sized> FrameExtractor for Arc<E> {
    fn extract(&self, video: &Path, output: &Path) -> Result<(), ThumbnailError> {
        (**self).extract(video, output)
    }
}

/// [`FrameExtractor`] backed by the `ffmpeg` executable.
#[derive(Debug, Clone)]
pub struct FfmpegExtractor {
    program: OsString,
    log_level: FfmpegLogLevel,
}

impl Default for FfmpegExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRAM)
    }
}

impl FfmpegExtractor {
    /// Use `program` (a bare name resolved on `PATH`, or a full path).
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            log_level: FfmpegLogLevel::default(),
        }
    }

    /// Set the decoder's console verbosity.
    #[must_use]
    pub fn with_log_level(mut self, level: FfmpegLogLevel) -> Self {
        self.log_level = level;
        self
    }

    /// The program that will be spawned.
    pub fn program(&self) -> &OsStr {
        &self.program
    }

    /// The full argument list for one extraction.
    ///
    /// Seeks to the very start so zero-length and single-frame clips still
    /// yield a frame, decodes exactly one frame, fits it inside the box
    /// without distortion, pads it with centred black bars, and encodes it
    /// at [`JPEG_QUALITY`].
    pub fn arguments(&self, video: &Path, output: &Path) -> Vec<OsString> {
        let mut arguments: Vec<OsString> = [
            "-hide_banner",
            "-nostdin",
            "-loglevel",
            self.log_level.as_arg(),
            "-y",
            "-ss",
            "0",
            "-i",
        ]
        .into_iter()
        .map(OsString::from)
        .collect();
        arguments.push(file_url(video));
        arguments.extend(
            [
                "-frames:v".to_string(),
                "1".to_string(),
                "-vf".to_string(),
                scale_pad_filter(),
                "-q:v".to_string(),
                JPEG_QUALITY.to_string(),
                "-f".to_string(),
                "image2".to_string(),
            ]
            .into_iter()
            .map(OsString::from),
        );
        arguments.push(file_url(output));
        arguments
    }

    /// Run `<program> -version` and return the first line it prints.
    ///
    /// # Errors
    ///
    /// Returns [`ThumbnailError::ToolNotFound`] if the program cannot be
    /// spawned or does not behave like FFmpeg.
    pub fn check_available(&self) -> Result<String, ThumbnailError> {
        let output = Command::new(&self.program)
            .arg("-version")
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .map_err(|error| self.tool_not_found(error.to_string()))?;

        if !output.status.success() {
            return Err(self.tool_not_found(format!("`-version` exited with {}", output.status)));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.lines().next().unwrap_or_default().trim().to_string())
    }

    fn run(&self, video: &Path, output: &Path) -> Result<Output, ThumbnailError> {
        let arguments = self.arguments(video, output);
        log::debug!(
            "Spawning {} for {}",
            self.program.to_string_lossy(),
            video.display()
        );
        Command::new(&self.program)
            .args(&arguments)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|error| match error.kind() {
                ErrorKind::NotFound | ErrorKind::PermissionDenied => {
                    self.tool_not_found(error.to_string())
                }
                _ => ThumbnailError::decode(video, format!("failed to run decoder: {error}")),
            })
    }

    fn tool_not_found(&self, reason: String) -> ThumbnailError {
        ThumbnailError::ToolNotFound {
            program: self.program.to_string_lossy().into_owned(),
            reason,
        }
    }
}

impl FrameExtractor for FfmpegExtractor {
    fn extract(&self, video: &Path, output: &Path) -> Result<(), ThumbnailError> {
        let result = self.run(video, output)?;
        if result.status.success() {
            return Ok(());
        }

        let tail = stderr_tail(&result.stderr);
        let reason = if tail.is_empty() {
            format!("decoder exited with {}", result.status)
        } else {
            format!("decoder exited with {}: {tail}", result.status)
        };
        Err(ThumbnailError::decode(video, reason))
    }
}

/// The `-vf` filter graph: fit inside the box, then centre on black.
pub(crate) fn scale_pad_filter() -> String {
    format!(
        "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2:color=black",
        w = THUMBNAIL_WIDTH,
        h = THUMBNAIL_HEIGHT,
    )
}

/// Prefix a path with FFmpeg's `file:` protocol so that names containing a
/// colon are never read as another protocol.
fn file_url(path: &Path) -> OsString {
    let mut url = OsString::from("file:");
    url.push(path.as_os_str());
    url
}

/// Last few non-empty stderr lines joined into one string.
fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("; ")
}
