use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::{Value, json};
use vidthumb::{
    FailureKind, FfmpegLogLevel, ProgressCallback, ProgressInfo, Thumbnail, ThumbnailError,
    Thumbnailer, ThumbnailerOptions, VideoEntry, move_file, read_directory,
};

const CLI_AFTER_HELP: &str = "Examples:\n  vidthumb thumbnail clip.mp4 --out clip.jpg\n  vidthumb scan ~/Videos --out thumbs --progress\n  vidthumb list ~/Videos --json\n  vidthumb move clip.mp4 ~/Videos/archive\n  vidthumb check\n  vidthumb completions zsh > _vidthumb";

const INSTALL_HINT: &str =
    "install FFmpeg and make sure `ffmpeg` is on PATH, or pass --ffmpeg / set VIDTHUMB_FFMPEG";

#[derive(Debug, Parser)]
#[command(
    name = "vidthumb",
    version,
    about = "Generate cached 320x568 video thumbnails with FFmpeg",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show additional logging output.
    #[arg(long)]
    verbose: bool,

    /// Show a progress bar where supported.
    #[arg(long)]
    progress: bool,

    /// Allow overwriting existing output files.
    #[arg(long)]
    overwrite: bool,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long)]
    log_level: Option<String>,

    /// FFmpeg executable to run instead of `ffmpeg` from PATH.
    #[arg(long)]
    ffmpeg: Option<String>,

    /// Maximum number of FFmpeg processes to run at once.
    #[arg(long)]
    threads: Option<usize>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Generate the thumbnail for one video.
    #[command(
        about = "Generate one thumbnail",
        after_help = "Examples:\n  vidthumb thumbnail clip.mp4 --out clip.jpg\n  vidthumb thumbnail clip.mp4 --data-url"
    )]
    Thumbnail {
        /// Input video path.
        input: PathBuf,
        /// Output JPEG path.
        #[arg(long)]
        out: Option<PathBuf>,
        /// Print the thumbnail as a base64 data URL.
        #[arg(long)]
        data_url: bool,
    },

    /// Thumbnail every video in a directory.
    #[command(
        about = "Thumbnail a directory",
        after_help = "Examples:\n  vidthumb scan ~/Videos\n  vidthumb scan ~/Videos --out thumbs --progress\n  vidthumb scan ~/Videos --json"
    )]
    Scan {
        /// Directory to scan (not recursive).
        directory: PathBuf,
        /// Directory to write `<video file name>.jpg` files into.
        #[arg(long)]
        out: Option<PathBuf>,
        /// Output results as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// List the folders and videos in a directory.
    #[command(about = "List a directory", visible_alias = "ls")]
    List {
        directory: PathBuf,
        #[arg(long)]
        json: bool,
    },

    /// Move a video into another folder.
    #[command(about = "Move a video", visible_alias = "mv")]
    Move {
        source: PathBuf,
        destination: PathBuf,
    },

    /// Check that FFmpeg can be started.
    #[command(about = "Check for FFmpeg")]
    Check,

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn kind_label(kind: FailureKind) -> &'static str {
    match kind {
        FailureKind::ToolNotFound => "tool_not_found",
        FailureKind::Decode => "decode_error",
        FailureKind::SourceNotFound => "not_found",
        FailureKind::Other => "other",
    }
}

/// Output name for a scanned video: the full file name plus `.jpg`, so
/// `a.mp4` and `a.mkv` never share a thumbnail.
fn thumbnail_file_name(video: &Path) -> String {
    let name = video
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "thumbnail".to_string());
    format!("{name}.jpg")
}

fn save_into(
    out: &Path,
    video: &Path,
    thumbnail: &Thumbnail,
    overwrite: bool,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let target = out.join(thumbnail_file_name(video));
    ensure_writable_path(&target, overwrite)?;
    thumbnail.save(&target)?;
    Ok(target)
}

/// The JSON record for one scanned video. `Err` carries the record of a
/// video that failed to generate or to save; neither stops the scan.
fn scan_entry(
    path: &Path,
    result: Result<Thumbnail, ThumbnailError>,
    out: Option<&Path>,
    overwrite: bool,
) -> Result<Value, Value> {
    let failure = |kind: &str, error: String| {
        json!({
            "path": path.display().to_string(),
            "ok": false,
            "kind": kind,
            "error": error,
        })
    };

    let thumbnail = result.map_err(|error| failure(kind_label(error.kind()), error.to_string()))?;
    let saved = match out {
        Some(out) => Some(
            save_into(out, path, &thumbnail, overwrite)
                .map_err(|error| failure(kind_label(FailureKind::Other), error.to_string()))?,
        ),
        None => None,
    };

    Ok(json!({
        "path": path.display().to_string(),
        "ok": true,
        "bytes": thumbnail.len(),
        "saved": saved.map(|target| target.display().to_string()),
    }))
}

fn unix_seconds(time: Option<SystemTime>) -> Option<u64> {
    time.and_then(|time| time.duration_since(UNIX_EPOCH).ok())
        .map(|elapsed| elapsed.as_secs())
}

fn video_json(video: &VideoEntry) -> Value {
    json!({
        "name": video.name,
        "path": video.path.display().to_string(),
        "size": video.size,
        "modified": unix_seconds(video.modified),
        "created": unix_seconds(video.created),
    })
}

fn ensure_writable_path(path: &Path, overwrite: bool) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() {
        if overwrite {
            eprintln!(
                "{} {}",
                "warning:".yellow().bold(),
                format!("overwriting {}", path.display()).yellow()
            );
        } else {
            return Err(format!(
                "output already exists: {} (use --overwrite to replace)",
                path.display()
            )
            .into());
        }
    }
    Ok(())
}

fn base_options(global: &GlobalOptions) -> Result<ThumbnailerOptions, Box<dyn std::error::Error>> {
    let mut options = ThumbnailerOptions::from_env();

    if let Some(program) = &global.ffmpeg {
        options = options.with_program(program);
    }

    if let Some(level) = &global.log_level {
        let parsed: FfmpegLogLevel = level.parse()?;
        options = options.with_log_level(parsed);
    }

    if let Some(threads) = global.threads {
        if threads == 0 {
            return Err("--threads must be at least 1".into());
        }
        options = options.with_max_concurrent_jobs(threads);
    }

    Ok(options)
}

struct BarProgress {
    bar: ProgressBar,
}

impl ProgressCallback for BarProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.bar.set_position(info.current);
        if let Some(path) = &info.current_path {
            self.bar
                .set_message(path.file_name().unwrap_or_default().to_string_lossy().into_owned());
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let options = base_options(&cli.global)?;

    match cli.command {
        Commands::Thumbnail {
            input,
            out,
            data_url,
        } => {
            if out.is_none() && !data_url {
                return Err("pass --out <file.jpg>, --data-url, or both".into());
            }
            if let Some(path) = &out {
                ensure_writable_path(path, cli.global.overwrite)?;
            }

            let thumbnailer = Thumbnailer::with_options(options);
            let thumbnail = thumbnailer.generate(&input)?;

            if let Some(path) = out {
                thumbnail.save(&path)?;
                println!("{} {}", "saved".green().bold(), path.display());
            }
            if data_url {
                println!("{}", thumbnail.to_data_url());
            }
        }
        Commands::Scan {
            directory,
            out,
            json,
        } => {
            let listing = read_directory(&directory)?;
            if let Some(out) = &out {
                fs::create_dir_all(out)?;
            }

            let progress_bar = if cli.global.progress {
                let pb = ProgressBar::new(listing.videos.len() as u64);
                let style = ProgressStyle::with_template(
                    "{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}",
                )?;
                pb.set_style(style.progress_chars("##-"));
                Some(pb)
            } else {
                None
            };

            let options = match &progress_bar {
                Some(bar) => options.with_progress(Arc::new(BarProgress { bar: bar.clone() })),
                None => options,
            };
            let thumbnailer = Thumbnailer::with_options(options);
            let results =
                thumbnailer.generate_all(listing.videos.iter().map(|video| &video.path));

            if let Some(pb) = progress_bar {
                pb.finish_with_message("done");
            }

            let mut generated = 0_usize;
            let mut entries = Vec::with_capacity(results.len());
            for (path, result) in results {
                match scan_entry(&path, result, out.as_deref(), cli.global.overwrite) {
                    Ok(entry) => {
                        generated += 1;
                        if cli.global.verbose && !json {
                            eprintln!("thumbnailed {} ({} bytes)", path.display(), entry["bytes"]);
                        }
                        entries.push(entry);
                    }
                    Err(entry) => {
                        if !json {
                            eprintln!(
                                "{} {}: {}",
                                "failed".red().bold(),
                                path.display(),
                                entry["error"].as_str().unwrap_or_default()
                            );
                        }
                        entries.push(entry);
                    }
                }
            }

            if json {
                let payload = json!({
                    "directory": listing.path.display().to_string(),
                    "generated": generated,
                    "failed": entries.len() - generated,
                    "videos": entries,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!(
                    "{} {}",
                    "success:".green().bold(),
                    format!(
                        "Generated {generated} of {} thumbnail(s) in {}",
                        entries.len(),
                        directory.display()
                    )
                    .green()
                );
            }
        }
        Commands::List { directory, json } => {
            let listing = read_directory(&directory)?;
            if json {
                let payload = json!({
                    "path": listing.path.display().to_string(),
                    "subdirectories": listing.subdirectories.iter().map(|entry| json!({
                        "name": entry.name,
                        "path": entry.path.display().to_string(),
                    })).collect::<Vec<_>>(),
                    "videos": listing.videos.iter().map(video_json).collect::<Vec<_>>(),
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                for entry in &listing.subdirectories {
                    println!("{}/", entry.name.blue().bold());
                }
                for video in &listing.videos {
                    println!("{}  {} bytes", video.name, video.size);
                }
            }
        }
        Commands::Move {
            source,
            destination,
        } => {
            let moved = move_file(&source, &destination)?;
            println!("{} {}", "moved".green().bold(), moved.display());
        }
        Commands::Check => {
            let thumbnailer = Thumbnailer::with_options(options);
            let version = thumbnailer.check_decoder()?;
            println!("{} {}", "found".green().bold(), version);
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "vidthumb", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("error: {error}");
        if error
            .downcast_ref::<ThumbnailError>()
            .is_some_and(ThumbnailError::is_tool_not_found)
        {
            eprintln!("{} {}", "hint:".yellow().bold(), INSTALL_HINT);
        }
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::{kind_label, scan_entry, thumbnail_file_name, unix_seconds};
    use std::fs;
    use std::path::Path;
    use std::time::{Duration, UNIX_EPOCH};

    use vidthumb::{FailureKind, Thumbnail, ThumbnailError};

    #[test]
    fn thumbnail_names_keep_the_extension() {
        assert_eq!(thumbnail_file_name(Path::new("/v/holiday.mp4")), "holiday.mp4.jpg");
        assert_eq!(thumbnail_file_name(Path::new("a.b.mkv")), "a.b.mkv.jpg");
        assert_eq!(thumbnail_file_name(Path::new("/")), "thumbnail.jpg");
        assert_ne!(
            thumbnail_file_name(Path::new("a.mp4")),
            thumbnail_file_name(Path::new("a.mkv"))
        );
    }

    #[test]
    fn same_stem_videos_are_saved_separately() {
        let out = tempfile::tempdir().expect("Failed to create temp dir");
        let mp4 = scan_entry(
            Path::new("vids/a.mp4"),
            Ok(Thumbnail::from_jpeg(vec![1])),
            Some(out.path()),
            false,
        )
        .unwrap();
        let mkv = scan_entry(
            Path::new("vids/a.mkv"),
            Ok(Thumbnail::from_jpeg(vec![2])),
            Some(out.path()),
            false,
        )
        .unwrap();

        assert_ne!(mp4["saved"], mkv["saved"]);
        assert_eq!(fs::read(out.path().join("a.mp4.jpg")).unwrap(), [1]);
        assert_eq!(fs::read(out.path().join("a.mkv.jpg")).unwrap(), [2]);
    }

    #[test]
    fn save_failure_is_recorded_not_fatal() {
        let out = tempfile::tempdir().expect("Failed to create temp dir");
        fs::write(out.path().join("a.mp4.jpg"), b"existing").unwrap();

        let entry = scan_entry(
            Path::new("vids/a.mp4"),
            Ok(Thumbnail::from_jpeg(vec![1])),
            Some(out.path()),
            false,
        )
        .unwrap_err();

        assert_eq!(entry["ok"], false);
        assert_eq!(entry["kind"], "other");
        assert!(entry["error"].as_str().unwrap().contains("already exists"));
        assert_eq!(fs::read(out.path().join("a.mp4.jpg")).unwrap(), b"existing");
    }

    #[test]
    fn generation_failure_keeps_its_kind() {
        let entry = scan_entry(
            Path::new("vids/gone.mp4"),
            Err(ThumbnailError::SourceNotFound {
                path: "vids/gone.mp4".into(),
            }),
            None,
            false,
        )
        .unwrap_err();
        assert_eq!(entry["kind"], "not_found");
    }

    #[test]
    fn kind_labels_are_distinct() {
        assert_ne!(
            kind_label(FailureKind::ToolNotFound),
            kind_label(FailureKind::Decode)
        );
        assert_eq!(kind_label(FailureKind::SourceNotFound), "not_found");
    }

    #[test]
    fn unix_seconds_handles_missing_time() {
        assert_eq!(unix_seconds(None), None);
        assert_eq!(
            unix_seconds(Some(UNIX_EPOCH + Duration::from_secs(75))),
            Some(75)
        );
    }
}
