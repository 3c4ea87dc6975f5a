//! Rayon batch generation integration tests (requires the `rayon` feature).

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use vidthumb::{
    FrameExtractor, ProgressCallback, ProgressInfo, ThumbnailError, Thumbnailer,
    ThumbnailerOptions,
};

#[derive(Default)]
struct Echo {
    calls: Arc<AtomicUsize>,
}

impl FrameExtractor for Echo {
    fn extract(&self, video: &Path, output: &Path) -> Result<(), ThumbnailError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        fs::write(output, video.as_os_str().as_encoded_bytes())?;
        Ok(())
    }
}

#[derive(Default)]
struct LastCount {
    current: Mutex<u64>,
}

impl ProgressCallback for LastCount {
    fn on_progress(&self, info: &ProgressInfo) {
        let mut current = self.current.lock().unwrap();
        *current = (*current).max(info.current);
    }
}

#[test]
fn parallel_results_match_inputs() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let progress = Arc::new(LastCount::default());
    let extractor = Echo::default();
    let calls = Arc::clone(&extractor.calls);
    let thumbnailer = Thumbnailer::with_options(
        ThumbnailerOptions::new()
            .with_temporary_directory(directory.path())
            .with_progress(progress.clone()),
    )
    .with_extractor(extractor);
    let inputs: Vec<String> = (0..20).map(|index| format!("/videos/{index}.mov")).collect();

    let results = thumbnailer.generate_all_parallel(&inputs);

    assert_eq!(results.len(), inputs.len());
    for (input, (path, result)) in inputs.iter().zip(&results) {
        assert_eq!(path, Path::new(input));
        assert_eq!(result.as_ref().unwrap().as_bytes(), input.as_bytes());
    }
    assert_eq!(calls.load(Ordering::SeqCst), 20);
    assert_eq!(*progress.current.lock().unwrap(), 20);

    thumbnailer.generate_all_parallel(&inputs);
    assert_eq!(calls.load(Ordering::SeqCst), 20);
}
