// SPDX-License-Identifier: MPL-2.0
//! `GFPGAN` face restoration adapter implementing the [`FaceRestorer`] trait.
//!
//! For every face found by [`YuNetDetector`], the adapter:
//! 1. fits a similarity transform from the five landmarks to [`FFHQ_TEMPLATE`]
//! 2. cuts out the aligned 512x512 crop
//! 3. runs `GFPGAN` on it (NCHW, RGB, values normalised to `-1.0..=1.0`)
//! 4. blends the restored crop back into the frame
//!
//! Faces are restored against the original frame, and all pastes land on one
//! output copy, so overlapping faces do not feed into each other.
//!
//! [`FaceRestorer`]: crate::application::port::FaceRestorer

mod align;
mod detect;

use std::path::Path;

use image_rs::imageops::{self, FilterType};
use ort::session::Session;

use super::session::{first_input_name, load_session, run_single};
use super::tensor::{frame_to_nchw, nchw_to_frame, ChannelOrder};
use crate::application::port::{EngineError, FaceRestorer, ProcessorCapabilities};
use crate::config::FaceConfig;
use crate::media::Frame;

pub use align::{feather_weight, paste_face, warp_face, Similarity, FACE_SIZE, FFHQ_TEMPLATE};
pub use detect::{
    BoundingBox, FaceDetection, YuNetDetector, DETECTION_SIZE, NMS_THRESHOLD, SCORE_THRESHOLD,
};

/// Which faces to restore and how the input is laid out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FaceRestoreOptions {
    /// Restore only the face closest to the frame centre.
    pub only_center_face: bool,
    /// The input already is a single aligned face crop; skip detection.
    pub aligned: bool,
}

impl From<FaceConfig> for FaceRestoreOptions {
    fn from(config: FaceConfig) -> Self {
        Self {
            only_center_face: config.only_center_face,
            aligned: config.aligned,
        }
    }
}

/// ONNX-based face restorer using `GFPGAN` v1.4 and a `YuNet` detector.
pub struct OnnxFaceRestorer {
    detector: YuNetDetector,
    session: Session,
    input_name: String,
    options: FaceRestoreOptions,
}

impl OnnxFaceRestorer {
    /// Loads the restoration and detection models.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::ModelLoadFailed`] if either model cannot be loaded.
    pub fn load(
        restorer_path: &Path,
        detector_path: &Path,
        options: FaceRestoreOptions,
    ) -> Result<Self, EngineError> {
        let session = load_session(restorer_path)?;
        let input_name = first_input_name(&session);
        let detector = YuNetDetector::load(detector_path)?;
        tracing::info!(
            model = %restorer_path.display(),
            detector = %detector_path.display(),
            only_center_face = options.only_center_face,
            "face restorer loaded"
        );
        Ok(Self {
            detector,
            session,
            input_name,
            options,
        })
    }

    /// Runs `GFPGAN` on one `FACE_SIZE` crop.
    fn restore_crop(&mut self, crop: &Frame) -> Result<Frame, EngineError> {
        let tensor = frame_to_nchw(crop, ChannelOrder::Rgb, |v| {
            (f32::from(v) / 255.0 - 0.5) / 0.5
        });
        let output = run_single(&mut self.session, &self.input_name, &tensor)?;
        nchw_to_frame(&output.shape, &output.data, |v| {
            (v.clamp(-1.0, 1.0) + 1.0) / 2.0 * 255.0
        })
    }

    /// Restores an input that is already an aligned face crop of any size.
    fn restore_aligned_input(&mut self, frame: &Frame) -> Result<Frame, EngineError> {
        let (width, height) = frame.dimensions();
        if (width, height) == (FACE_SIZE, FACE_SIZE) {
            return self.restore_crop(frame);
        }
        let crop = imageops::resize(frame, FACE_SIZE, FACE_SIZE, FilterType::Lanczos3);
        let restored = self.restore_crop(&crop)?;
        Ok(imageops::resize(&restored, width, height, FilterType::Lanczos3))
    }
}

impl FaceRestorer for OnnxFaceRestorer {
    fn restore(&mut self, frame: &Frame) -> Result<Frame, EngineError> {
        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            return Err(EngineError::UnsupportedInput {
                width,
                height,
                reason: "empty frame".to_string(),
            });
        }
        if self.options.aligned {
            return self.restore_aligned_input(frame);
        }

        let mut faces = self.detector.detect(frame)?;
        if self.options.only_center_face {
            faces = select_center_face(faces, width, height).into_iter().collect();
        }
        if faces.is_empty() {
            tracing::debug!("no faces detected");
            return Ok(frame.clone());
        }

        let mut output = frame.clone();
        for (index, face) in faces.iter().enumerate() {
            let Some(transform) = Similarity::estimate(&face.landmarks, &FFHQ_TEMPLATE) else {
                tracing::warn!(index, "degenerate face landmarks, face left as is");
                continue;
            };
            let Some(crop) = warp_face(frame, &transform) else {
                tracing::warn!(index, "face transform is not invertible, face left as is");
                continue;
            };
            let restored = self.restore_crop(&crop)?;
            paste_face(&mut output, &restored, &transform);
            tracing::debug!(index, score = face.score, "face restored");
        }
        Ok(output)
    }

    fn capabilities(&self) -> ProcessorCapabilities {
        ProcessorCapabilities::new("GFPGAN v1.4")
    }
}

/// Keeps the detection whose box centre is nearest the frame centre.
pub(crate) fn select_center_face(
    faces: Vec<FaceDetection>,
    width: u32,
    height: u32,
) -> Option<FaceDetection> {
    #[allow(clippy::cast_precision_loss)]
    let centre = [width as f32 / 2.0, height as f32 / 2.0];
    let distance = |face: &FaceDetection| {
        let [x, y] = face.bbox.center();
        (x - centre[0]).hypot(y - centre[1])
    };
    faces
        .into_iter()
        .min_by(|a, b| distance(a).total_cmp(&distance(b)))
}
