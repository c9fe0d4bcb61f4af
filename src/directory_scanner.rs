// SPDX-License-Identifier: MPL-2.0
//! Directory scanner module for finding input photographs.
//!
//! Only the regular files directly inside the input directory are considered;
//! subdirectories are not descended into. Files are kept when their extension
//! is one of [`IMAGE_EXTENSIONS`](crate::media::IMAGE_EXTENSIONS), compared
//! case-insensitively, and returned sorted by file name.

use crate::error::Result;
use crate::media;
use std::path::{Path, PathBuf};

/// Lists the supported images directly under `directory`, sorted by name.
///
/// An empty result is not an error.
///
/// # Errors
///
/// Returns an error if the directory cannot be read.
pub fn scan_inputs(directory: &Path) -> Result<Vec<PathBuf>> {
    let mut inputs = Vec::new();

    for entry in std::fs::read_dir(directory)? {
        let entry = entry?;
        let path = entry.path();

        if path.is_file() && media::is_supported_image(&path) {
            inputs.push(path);
        }
    }

    sort_by_file_name(&mut inputs);
    Ok(inputs)
}

fn sort_by_file_name(paths: &mut [PathBuf]) {
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
}
