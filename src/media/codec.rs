// SPDX-License-Identifier: MPL-2.0
//! Decoding inputs into frames and encoding results as JPEG.

use super::Frame;
use crate::error::{Error, Result};
use image_rs::codecs::jpeg::JpegEncoder;
use image_rs::{ExtendedColorType, ImageEncoder, ImageReader};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

/// Decodes an image file into an RGB frame.
///
/// The format is detected from the file content, not the extension. Alpha is
/// dropped and grayscale is expanded to three channels.
///
/// # Errors
///
/// Returns [`Error::Decode`] if the file cannot be opened or decoded.
pub fn load_frame<P: AsRef<Path>>(path: P) -> Result<Frame> {
    let path = path.as_ref();
    let decode_error = |source| Error::Decode {
        path: path.to_path_buf(),
        source,
    };

    let reader = ImageReader::open(path)
        .map_err(|e| decode_error(image_rs::ImageError::IoError(e)))?
        .with_guessed_format()
        .map_err(|e| decode_error(image_rs::ImageError::IoError(e)))?;
    let image = reader.decode().map_err(decode_error)?;
    Ok(image.to_rgb8())
}

/// Encodes `frame` as JPEG and writes it to `path`, replacing any existing file.
///
/// The parent directory is created if missing.
///
/// # Errors
///
/// Returns [`Error::EncodeWrite`] if the directory or file cannot be written
/// or encoding fails.
pub fn save_jpeg<P: AsRef<Path>>(frame: &Frame, path: P, quality: u8) -> Result<()> {
    let path = path.as_ref();
    let write_error = |reason: String| Error::EncodeWrite {
        path: path.to_path_buf(),
        reason,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| write_error(e.to_string()))?;
    }

    let file = File::create(path).map_err(|e| write_error(e.to_string()))?;
    let mut writer = BufWriter::new(file);
    JpegEncoder::new_with_quality(&mut writer, quality)
        .write_image(
            frame.as_raw(),
            frame.width(),
            frame.height(),
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| write_error(e.to_string()))?;

    writer
        .into_inner()
        .map_err(|e| write_error(e.error().to_string()))?
        .sync_all()
        .map_err(|e| write_error(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OUTPUT_JPEG_QUALITY;
    use image_rs::{Rgb, Rgba, RgbaImage};
    use tempfile::tempdir;

    #[test]
    fn save_then_load_keeps_dimensions() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("out.jpg");
        let frame = Frame::from_pixel(10, 6, Rgb([128, 128, 128]));

        save_jpeg(&frame, &path, OUTPUT_JPEG_QUALITY).expect("save");
        let loaded = load_frame(&path).expect("load");
        assert_eq!(loaded.dimensions(), (10, 6));
        let centre = loaded.get_pixel(5, 3);
        assert!((i32::from(centre[0]) - 128).abs() <= 2);
    }

    #[test]
    fn save_overwrites_existing_file() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("out.jpg");
        fs::write(&path, b"stale").expect("write stale file");

        save_jpeg(&Frame::new(4, 4), &path, OUTPUT_JPEG_QUALITY).expect("save");
        assert_eq!(load_frame(&path).expect("load").dimensions(), (4, 4));
    }

    #[test]
    fn load_drops_alpha_channel() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("alpha.png");
        RgbaImage::from_pixel(3, 3, Rgba([10, 20, 30, 0]))
            .save(&path)
            .expect("write png");

        let loaded = load_frame(&path).expect("load");
        assert_eq!(loaded.get_pixel(1, 1), &Rgb([10, 20, 30]));
    }

    #[test]
    fn load_rejects_garbage() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("broken.jpg");
        fs::write(&path, b"definitely not a jpeg").expect("write garbage");

        assert!(matches!(load_frame(&path), Err(Error::Decode { .. })));
    }

    #[test]
    fn load_missing_file_is_decode_error() {
        let dir = tempdir().expect("tempdir");
        assert!(matches!(
            load_frame(dir.path().join("missing.png")),
            Err(Error::Decode { .. })
        ));
    }

    #[test]
    fn save_into_file_path_parent_fails() {
        let dir = tempdir().expect("tempdir");
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"file, not dir").expect("write blocker");

        let result = save_jpeg(&Frame::new(2, 2), blocker.join("out.jpg"), 95);
        assert!(matches!(result, Err(Error::EncodeWrite { .. })));
    }
}
