//! Benchmarks for cache hits, cache misses and payload encoding.
//!
//! Run with: cargo bench
//!
//! The FFmpeg benchmark synthesises its own input and is skipped when
//! `ffmpeg` is not on `PATH`.

use std::{
    fs,
    hint::black_box,
    path::Path,
    process::{Command, Stdio},
};

use criterion::Criterion;
use vidthumb::{FrameExtractor, Thumbnail, ThumbnailError, Thumbnailer, ThumbnailerOptions};

/// Writes a fixed payload, standing in for the decoder.
struct FixedPayload(Vec<u8>);

impl FrameExtractor for FixedPayload {
    fn extract(&self, _video: &Path, output: &Path) -> Result<(), ThumbnailError> {
        fs::write(output, &self.0)?;
        Ok(())
    }
}

fn ffmpeg_available() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|status| status.success())
}

fn benchmark_cache(criterion: &mut Criterion) {
    let directory = tempfile::tempdir().unwrap();
    let thumbnailer = Thumbnailer::with_options(
        ThumbnailerOptions::new().with_temporary_directory(directory.path()),
    )
    .with_extractor(FixedPayload(vec![0xAB; 24 * 1024]));
    thumbnailer.generate("/videos/hot.mp4").unwrap();

    criterion.bench_function("generate (cache hit)", |bencher| {
        bencher.iter(|| thumbnailer.generate(black_box("/videos/hot.mp4")).unwrap());
    });

    criterion.bench_function("generate (cache miss, in-process extractor)", |bencher| {
        bencher.iter(|| {
            thumbnailer.clear_cache();
            thumbnailer.generate(black_box("/videos/cold.mp4")).unwrap()
        });
    });

    let batch: Vec<String> = (0..64).map(|index| format!("/videos/{index}.mp4")).collect();
    criterion.bench_function("generate_all 64 (cache miss)", |bencher| {
        bencher.iter(|| {
            thumbnailer.clear_cache();
            thumbnailer.generate_all(black_box(&batch))
        });
    });
}

fn benchmark_data_url(criterion: &mut Criterion) {
    let thumbnail = Thumbnail::from_jpeg(vec![0x5A; 24 * 1024]);

    criterion.bench_function("to_data_url (24 KiB)", |bencher| {
        bencher.iter(|| black_box(&thumbnail).to_data_url());
    });
}

fn benchmark_ffmpeg(criterion: &mut Criterion) {
    if !ffmpeg_available() {
        eprintln!("Skipping benchmark: ffmpeg not found");
        return;
    }

    let directory = tempfile::tempdir().unwrap();
    let video = directory.path().join("sample.mp4");
    let status = Command::new("ffmpeg")
        .args(["-hide_banner", "-loglevel", "error", "-y", "-f", "lavfi", "-i"])
        .arg("testsrc=size=1280x720:rate=25:duration=2")
        .args(["-c:v", "mpeg4"])
        .arg(&video)
        .stdin(Stdio::null())
        .status()
        .unwrap();
    if !status.success() {
        eprintln!("Skipping benchmark: fixture generation failed");
        return;
    }

    let thumbnailer = Thumbnailer::with_options(
        ThumbnailerOptions::new().with_temporary_directory(directory.path()),
    );

    let mut group = criterion.benchmark_group("ffmpeg");
    group.sample_size(20);
    group.bench_function("generate 1280x720 (cache miss)", |bencher| {
        bencher.iter(|| {
            thumbnailer.clear_cache();
            thumbnailer.generate(&video).unwrap()
        });
    });
    group.finish();
}

criterion::criterion_group!(
    benches,
    benchmark_cache,
    benchmark_data_url,
    benchmark_ffmpeg,
);
criterion::criterion_main!(benches);
