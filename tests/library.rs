//! Directory listing and file moving integration tests.

use std::fs::{self, File};
use std::path::Path;
use std::time::{Duration, SystemTime};

use vidthumb::{
    FailureKind, ThumbnailError, is_video_file, move_file, parent_directory, read_directory,
};

fn touch(path: &Path, age: Duration) {
    let file = File::create(path).expect("Failed to create file");
    file.set_modified(SystemTime::now() - age)
        .expect("Failed to set modification time");
}

#[test]
fn listing_separates_folders_and_videos() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    fs::create_dir(directory.path().join("zeta")).unwrap();
    fs::create_dir(directory.path().join("alpha")).unwrap();
    touch(&directory.path().join("clip.mp4"), Duration::ZERO);
    touch(&directory.path().join("notes.txt"), Duration::ZERO);
    touch(&directory.path().join("LOUD.MKV"), Duration::ZERO);

    let listing = read_directory(directory.path()).unwrap();

    let folders: Vec<&str> = listing
        .subdirectories
        .iter()
        .map(|entry| entry.name.as_str())
        .collect();
    assert_eq!(folders, ["alpha", "zeta"]);

    let mut videos: Vec<&str> = listing.videos.iter().map(|video| video.name.as_str()).collect();
    videos.sort_unstable();
    assert_eq!(videos, ["LOUD.MKV", "clip.mp4"]);
    assert!(listing.videos.iter().all(|video| is_video_file(&video.path)));
}

#[test]
fn videos_are_listed_newest_first() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    touch(&directory.path().join("old.mp4"), Duration::from_secs(3_600));
    touch(&directory.path().join("new.webm"), Duration::from_secs(10));
    touch(&directory.path().join("middle.mov"), Duration::from_secs(600));

    let listing = read_directory(directory.path()).unwrap();

    let names: Vec<&str> = listing.videos.iter().map(|video| video.name.as_str()).collect();
    assert_eq!(names, ["new.webm", "middle.mov", "old.mp4"]);
}

#[test]
fn video_entries_carry_size() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    fs::write(directory.path().join("clip.avi"), vec![0_u8; 1234]).unwrap();

    let listing = read_directory(directory.path()).unwrap();

    assert_eq!(listing.videos.len(), 1);
    assert_eq!(listing.videos[0].size, 1234);
    assert!(listing.videos[0].sort_time().is_some());
}

#[test]
fn missing_directory_is_io_error() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let error = read_directory(directory.path().join("absent")).unwrap_err();
    assert!(matches!(error, ThumbnailError::IoError(_)), "{error}");
    assert_eq!(error.kind(), FailureKind::Other);
}

#[test]
fn parent_of_listing_path() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let child = directory.path().join("child");
    assert_eq!(parent_directory(&child).as_deref(), Some(directory.path()));
}

// ── Moving ─────────────────────────────────────────────────────────

#[test]
fn move_keeps_file_name() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let archive = directory.path().join("archive");
    fs::create_dir(&archive).unwrap();
    let source = directory.path().join("clip.mp4");
    fs::write(&source, b"frames").unwrap();

    let moved = move_file(&source, &archive).unwrap();

    assert_eq!(moved, archive.join("clip.mp4"));
    assert!(!source.exists());
    assert_eq!(fs::read(&moved).unwrap(), b"frames");
}

#[test]
fn move_into_same_folder_is_a_no_op() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let source = directory.path().join("clip.mp4");
    fs::write(&source, b"frames").unwrap();

    let moved = move_file(&source, directory.path()).unwrap();

    assert_eq!(moved, source);
    assert!(source.exists());
}

#[test]
fn move_refuses_to_overwrite() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let archive = directory.path().join("archive");
    fs::create_dir(&archive).unwrap();
    let source = directory.path().join("clip.mp4");
    fs::write(&source, b"new").unwrap();
    fs::write(archive.join("clip.mp4"), b"old").unwrap();

    let error = move_file(&source, &archive).unwrap_err();

    assert!(matches!(error, ThumbnailError::IoError(_)), "{error}");
    assert!(source.exists());
    assert_eq!(fs::read(archive.join("clip.mp4")).unwrap(), b"old");
}
