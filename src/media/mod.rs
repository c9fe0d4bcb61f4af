// SPDX-License-Identifier: MPL-2.0
//! Frame type and classical image operations.
//!
//! # Channel Order Convention
//!
//! Every image travelling through the pipeline is a [`Frame`]: an
//! `image::RgbImage`, 8 bits per channel, **RGB** order, row-major. All
//! functions in this module take and return that layout. Engines that want
//! something else (normalized floats, BGR, NCHW) convert at their own entry
//! and exit; see [`crate::infrastructure::onnx`].

pub mod codec;
pub mod colour;
pub mod denoise;
pub mod lab;
pub mod sampling;
pub mod sharpen;

use std::path::Path;

pub use codec::{load_frame, save_jpeg};
pub use colour::correct_colour;
pub use denoise::{denoise, denoise_colored};
pub use sharpen::unsharp_mask;

/// The pipeline's image buffer: RGB, 8 bits per channel.
pub type Frame = image_rs::RgbImage;

pub mod extensions {
    /// Input extensions accepted by the pipeline (compared case-insensitively).
    pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];
}

pub use extensions::IMAGE_EXTENSIONS;

/// Checks if a path has a supported input image extension.
pub fn is_supported_image<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_image_formats() {
        assert!(is_supported_image("photo.jpg"));
        assert!(is_supported_image("photo.jpeg"));
        assert!(is_supported_image("photo.png"));
    }

    #[test]
    fn test_case_insensitivity() {
        assert!(is_supported_image("PHOTO.JPG"));
        assert!(is_supported_image("scan.Png"));
        assert!(is_supported_image("old.JPEG"));
    }

    #[test]
    fn test_detect_unsupported_format() {
        assert!(!is_supported_image("scan.bmp"));
        assert!(!is_supported_image("notes.txt"));
        assert!(!is_supported_image("README"));
        assert!(!is_supported_image("archive.jpg.zip"));
    }

    #[test]
    fn test_path_with_directories() {
        assert!(is_supported_image("/home/user/scans/1974/beach.jpg"));
    }
}
