// SPDX-License-Identifier: MPL-2.0
//! Model weight provisioning.
//!
//! Model files live flat in a weights directory under fixed names. A file that
//! exists is trusted as is: there is no checksum and no expiry. A missing file
//! is fetched once through the injected [`Fetcher`] into `<filename>.part` and
//! renamed into place only after the fetch succeeded and produced bytes, so an
//! interrupted download never looks complete.

use std::fs;
use std::path::{Path, PathBuf};

use crate::application::port::Fetcher;
use crate::config::ModelsConfig;
use crate::error::ProvisionError;

/// File name of the face restoration model.
pub const FACE_RESTORER_FILE: &str = "GFPGANv1.4.onnx";

/// File name of the super-resolution model.
pub const UPSCALER_FILE: &str = "RealESRGAN_x2plus.onnx";

/// File name of the face detection model.
pub const FACE_DETECTOR_FILE: &str = "face_detection_yunet_2023mar.onnx";

const PARTIAL_SUFFIX: &str = ".part";

/// A model the pipeline needs: display name, file name and download URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    pub name: &'static str,
    pub filename: &'static str,
    pub url: String,
}

impl ModelSpec {
    /// GFPGAN v1.4.
    #[must_use]
    pub fn face_restorer(models: &ModelsConfig) -> Self {
        Self {
            name: "GFPGAN v1.4",
            filename: FACE_RESTORER_FILE,
            url: models.face_restorer_url().to_string(),
        }
    }

    /// Real-ESRGAN x2plus.
    #[must_use]
    pub fn upscaler(models: &ModelsConfig) -> Self {
        Self {
            name: "Real-ESRGAN x2plus",
            filename: UPSCALER_FILE,
            url: models.upscaler_url().to_string(),
        }
    }

    /// YuNet 2023mar.
    #[must_use]
    pub fn face_detector(models: &ModelsConfig) -> Self {
        Self {
            name: "YuNet face detector",
            filename: FACE_DETECTOR_FILE,
            url: models.face_detector_url().to_string(),
        }
    }

    /// Final location of this model inside `directory`.
    #[must_use]
    pub fn path_in(&self, directory: &Path) -> PathBuf {
        directory.join(self.filename)
    }

    fn partial_path_in(&self, directory: &Path) -> PathBuf {
        directory.join(format!("{}{PARTIAL_SUFFIX}", self.filename))
    }
}

/// Makes sure the face restorer and upscaler weights exist, using the default
/// download URLs.
///
/// # Errors
///
/// Returns a [`ProvisionError`] if the directory cannot be created or a fetch
/// fails.
pub fn ensure_weights(
    directory: &Path,
    fetcher: &dyn Fetcher,
) -> Result<(PathBuf, PathBuf), ProvisionError> {
    ensure_weights_with(directory, &ModelsConfig::default(), fetcher)
}

/// Like [`ensure_weights`], with URLs taken from `models`.
///
/// The face restorer is handled first, then the upscaler. Returns
/// `(face_restorer_path, upscaler_path)`.
///
/// # Errors
///
/// Returns a [`ProvisionError`] if the directory cannot be created or a fetch
/// fails.
pub fn ensure_weights_with(
    directory: &Path,
    models: &ModelsConfig,
    fetcher: &dyn Fetcher,
) -> Result<(PathBuf, PathBuf), ProvisionError> {
    let face = ensure_model(directory, &ModelSpec::face_restorer(models), fetcher)?;
    let upscaler = ensure_model(directory, &ModelSpec::upscaler(models), fetcher)?;
    Ok((face, upscaler))
}

/// Makes sure the face detector weights exist.
///
/// # Errors
///
/// Returns a [`ProvisionError`] if the directory cannot be created or the fetch
/// fails.
pub fn ensure_detector(
    directory: &Path,
    models: &ModelsConfig,
    fetcher: &dyn Fetcher,
) -> Result<PathBuf, ProvisionError> {
    ensure_model(directory, &ModelSpec::face_detector(models), fetcher)
}

/// Makes sure a single model file exists in `directory`, fetching it if absent.
///
/// # Errors
///
/// Returns a [`ProvisionError`] if the directory cannot be created, the fetch
/// fails or produces nothing, or the finished file cannot be moved into place.
/// The `.part` file is removed on every error path.
pub fn ensure_model(
    directory: &Path,
    spec: &ModelSpec,
    fetcher: &dyn Fetcher,
) -> Result<PathBuf, ProvisionError> {
    fs::create_dir_all(directory).map_err(|source| ProvisionError::CreateDir {
        path: directory.to_path_buf(),
        source,
    })?;

    let target = spec.path_in(directory);
    if target.exists() {
        tracing::debug!(model = spec.name, path = %target.display(), "model present");
        return Ok(target);
    }

    println!("Downloading {} weights...", spec.name);
    let partial = spec.partial_path_in(directory);
    let result = fetch_into_place(spec, fetcher, &partial, &target);
    if result.is_err() && partial.exists() {
        if let Err(e) = fs::remove_file(&partial) {
            tracing::warn!(path = %partial.display(), error = %e, "failed to remove partial download");
        }
    }
    result.map(|()| target)
}

fn fetch_into_place(
    spec: &ModelSpec,
    fetcher: &dyn Fetcher,
    partial: &Path,
    target: &Path,
) -> Result<(), ProvisionError> {
    let reported = fetcher
        .fetch(&spec.url, partial)
        .map_err(|source| ProvisionError::Fetch {
            name: spec.name,
            url: spec.url.clone(),
            source,
        })?;

    let on_disk = fs::metadata(partial).map_or(0, |m| m.len());
    if reported == 0 || on_disk == 0 {
        return Err(ProvisionError::EmptyDownload { name: spec.name });
    }

    fs::rename(partial, target).map_err(|source| ProvisionError::Finalize {
        path: target.to_path_buf(),
        source,
    })?;
    tracing::info!(model = spec.name, bytes = on_disk, path = %target.display(), "model ready");
    Ok(())
}
