// SPDX-License-Identifier: MPL-2.0
//! Weight provisioning against a stub fetcher.

use std::cell::Cell;
use std::fs;
use std::path::Path;

use photo_restore::application::port::FetchError;
use photo_restore::config::{self, ModelsConfig};
use photo_restore::paths::resolve_weights_dir_with_env;
use photo_restore::provision::{
    ensure_detector, ensure_weights, ensure_weights_with, FACE_DETECTOR_FILE, FACE_RESTORER_FILE,
    UPSCALER_FILE,
};
use tempfile::tempdir;

#[test]
fn test_first_run_fetches_two_then_nothing() {
    let dir = tempdir().expect("Failed to create temporary directory");
    let weights = dir.path().join("weights");
    let fetches = Cell::new(0);
    let fetcher = |_: &str, destination: &Path| -> Result<u64, FetchError> {
        fetches.set(fetches.get() + 1);
        fs::write(destination, b"model")?;
        Ok(5)
    };

    let (face, upscaler) = ensure_weights(&weights, &fetcher).expect("first provisioning");
    assert_eq!(fetches.get(), 2);
    assert!(face.ends_with(FACE_RESTORER_FILE));
    assert!(upscaler.ends_with(UPSCALER_FILE));
    assert_eq!(fs::read(&face).expect("face model"), b"model");

    ensure_weights(&weights, &fetcher).expect("second provisioning");
    assert_eq!(fetches.get(), 2);

    ensure_detector(&weights, &ModelsConfig::default(), &fetcher).expect("detector");
    assert_eq!(fetches.get(), 3);
    assert!(weights.join(FACE_DETECTOR_FILE).is_file());
}

#[test]
fn test_settings_file_drives_urls_and_directory() {
    let dir = tempdir().expect("Failed to create temporary directory");
    let settings_path = dir.path().join("settings.toml");
    let weights = dir.path().join("cache");
    fs::write(
        &settings_path,
        format!(
            "[weights]\ndir = {:?}\n\n[models]\nupscaler_url = \"https://mirror.example/esrgan.onnx\"\n",
            weights.display().to_string()
        ),
    )
    .expect("Failed to write settings");

    let settings = config::load_from_path(&settings_path).expect("settings parse");
    let resolved = resolve_weights_dir_with_env(None, None, &settings);
    assert_eq!(resolved, weights);

    let urls = std::cell::RefCell::new(Vec::new());
    let fetcher = |url: &str, destination: &Path| -> Result<u64, FetchError> {
        urls.borrow_mut().push(url.to_string());
        fs::write(destination, b"model")?;
        Ok(5)
    };
    ensure_weights_with(&resolved, &settings.models, &fetcher).expect("provisioning");

    let urls = urls.into_inner();
    assert_eq!(urls.len(), 2);
    assert_eq!(urls[0], ModelsConfig::default().face_restorer_url());
    assert_eq!(urls[1], "https://mirror.example/esrgan.onnx");
}

#[test]
fn test_interrupted_download_is_retried_next_run() {
    let dir = tempdir().expect("Failed to create temporary directory");
    let broken = |_: &str, destination: &Path| -> Result<u64, FetchError> {
        fs::write(destination, b"partial")?;
        Err(FetchError::Transport("connection reset".to_string()))
    };
    assert!(ensure_weights(dir.path(), &broken).is_err());
    assert!(!dir.path().join(FACE_RESTORER_FILE).exists());

    let fetches = Cell::new(0);
    let working = |_: &str, destination: &Path| -> Result<u64, FetchError> {
        fetches.set(fetches.get() + 1);
        fs::write(destination, b"model")?;
        Ok(5)
    };
    ensure_weights(dir.path(), &working).expect("retry succeeds");
    assert_eq!(fetches.get(), 2);
}
