// SPDX-License-Identifier: MPL-2.0
//! `YuNet` face detector.
//!
//! The frame is scaled so that its longer side is [`DETECTION_SIZE`] and placed
//! in the top-left corner of a black `DETECTION_SIZE` square. The network takes
//! that square as NCHW **BGR** with raw `0.0..=255.0` values, and produces, per
//! stride (8, 16, 32), a grid of class scores, objectness scores, box offsets
//! and five landmark offsets. Detections are mapped back to frame coordinates.

use std::path::Path;

use image_rs::imageops::{self, FilterType};
use ort::session::Session;

use super::super::session::{first_input_name, load_session, run, OutputTensor};
use super::super::tensor::{frame_to_nchw, ChannelOrder};
use crate::application::port::EngineError;
use crate::media::Frame;

/// Side of the square canvas fed to the detector.
pub const DETECTION_SIZE: u32 = 640;

/// Minimum `sqrt(class * objectness)` for a detection to be kept.
pub const SCORE_THRESHOLD: f32 = 0.9;

/// Overlap above which the weaker of two detections is suppressed.
pub const NMS_THRESHOLD: f32 = 0.3;

const STRIDES: [usize; 3] = [8, 16, 32];

/// Axis-aligned box, top-left corner plus size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    #[must_use]
    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    #[must_use]
    pub fn center(&self) -> [f32; 2] {
        [self.x + self.width / 2.0, self.y + self.height / 2.0]
    }

    /// Intersection over union.
    #[must_use]
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = (self.x + self.width).min(other.x + other.width);
        let bottom = (self.y + self.height).min(other.y + other.height);
        let intersection = (right - left).max(0.0) * (bottom - top).max(0.0);
        let union = self.area() + other.area() - intersection;
        if union <= 0.0 {
            0.0
        } else {
            intersection / union
        }
    }
}

/// One detected face.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceDetection {
    pub bbox: BoundingBox,
    /// Left eye, right eye, nose tip, left and right mouth corners.
    pub landmarks: [[f32; 2]; 5],
    pub score: f32,
}

impl FaceDetection {
    fn scaled(mut self, factor: f32) -> Self {
        self.bbox.x *= factor;
        self.bbox.y *= factor;
        self.bbox.width *= factor;
        self.bbox.height *= factor;
        for point in &mut self.landmarks {
            point[0] *= factor;
            point[1] *= factor;
        }
        self
    }
}

/// ONNX-based `YuNet` detector.
pub struct YuNetDetector {
    session: Session,
    input_name: String,
}

impl YuNetDetector {
    /// Loads the detector model.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::ModelLoadFailed`] if the model cannot be loaded.
    pub fn load(model_path: &Path) -> Result<Self, EngineError> {
        let session = load_session(model_path)?;
        let input_name = first_input_name(&session);
        Ok(Self {
            session,
            input_name,
        })
    }

    /// Detects faces in `frame`, strongest first.
    ///
    /// # Errors
    ///
    /// Returns an [`EngineError`] if inference fails or the outputs do not
    /// have the expected layout.
    pub fn detect(&mut self, frame: &Frame) -> Result<Vec<FaceDetection>, EngineError> {
        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            return Ok(Vec::new());
        }

        let (canvas, factor) = letterbox(frame);
        let tensor = frame_to_nchw(&canvas, ChannelOrder::Bgr, f32::from);
        let outputs = run(&mut self.session, &self.input_name, &tensor)?;

        let size = DETECTION_SIZE as usize;
        let candidates = decode(&outputs, size, size, SCORE_THRESHOLD)?;
        let kept = non_max_suppression(candidates, NMS_THRESHOLD);
        tracing::debug!(faces = kept.len(), "face detection done");

        Ok(kept.into_iter().map(|d| d.scaled(1.0 / factor)).collect())
    }
}

/// Scales `frame` onto the detector canvas; returns the canvas and the factor
/// applied to frame coordinates.
fn letterbox(frame: &Frame) -> (Frame, f32) {
    let (width, height) = frame.dimensions();
    #[allow(clippy::cast_precision_loss)]
    let factor = DETECTION_SIZE as f32 / width.max(height) as f32;
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let scaled_size = |len: u32| ((len as f32 * factor).round() as u32).clamp(1, DETECTION_SIZE);

    let resized = imageops::resize(
        frame,
        scaled_size(width),
        scaled_size(height),
        FilterType::Triangle,
    );
    let mut canvas = Frame::new(DETECTION_SIZE, DETECTION_SIZE);
    imageops::replace(&mut canvas, &resized, 0, 0);
    (canvas, factor)
}

fn find_output<'a>(
    outputs: &'a [OutputTensor],
    name: &str,
    expected: usize,
) -> Result<&'a OutputTensor, EngineError> {
    let output = outputs
        .iter()
        .find(|o| o.name == name)
        .ok_or_else(|| EngineError::PostprocessingFailed(format!("missing output {name}")))?;
    if output.data.len() < expected {
        return Err(EngineError::PostprocessingFailed(format!(
            "output {name} has {} values, expected {expected}",
            output.data.len()
        )));
    }
    Ok(output)
}

/// Decodes the raw per-stride outputs into candidate detections in canvas
/// coordinates.
pub(crate) fn decode(
    outputs: &[OutputTensor],
    canvas_width: usize,
    canvas_height: usize,
    score_threshold: f32,
) -> Result<Vec<FaceDetection>, EngineError> {
    let mut detections = Vec::new();

    for stride in STRIDES {
        let cols = canvas_width / stride;
        let rows = canvas_height / stride;
        let cells = rows * cols;

        let cls = find_output(outputs, &format!("cls_{stride}"), cells)?;
        let obj = find_output(outputs, &format!("obj_{stride}"), cells)?;
        let bbox = find_output(outputs, &format!("bbox_{stride}"), cells * 4)?;
        let kps = find_output(outputs, &format!("kps_{stride}"), cells * 10)?;

        #[allow(clippy::cast_precision_loss)]
        let s = stride as f32;
        for row in 0..rows {
            for col in 0..cols {
                let idx = row * cols + col;
                let score =
                    (cls.data[idx].clamp(0.0, 1.0) * obj.data[idx].clamp(0.0, 1.0)).sqrt();
                if score < score_threshold {
                    continue;
                }

                #[allow(clippy::cast_precision_loss)]
                let (c, r) = (col as f32, row as f32);
                let b = &bbox.data[idx * 4..idx * 4 + 4];
                let cx = (c + b[0]) * s;
                let cy = (r + b[1]) * s;
                let w = b[2].exp() * s;
                let h = b[3].exp() * s;

                let k = &kps.data[idx * 10..idx * 10 + 10];
                let landmarks =
                    std::array::from_fn(|n| [(k[2 * n] + c) * s, (k[2 * n + 1] + r) * s]);

                detections.push(FaceDetection {
                    bbox: BoundingBox {
                        x: cx - w / 2.0,
                        y: cy - h / 2.0,
                        width: w,
                        height: h,
                    },
                    landmarks,
                    score,
                });
            }
        }
    }
    Ok(detections)
}

/// Greedy non-maximum suppression; the result is ordered by descending score.
pub(crate) fn non_max_suppression(
    mut candidates: Vec<FaceDetection>,
    iou_threshold: f32,
) -> Vec<FaceDetection> {
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
    let mut kept: Vec<FaceDetection> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if kept
            .iter()
            .all(|k| k.bbox.iou(&candidate.bbox) <= iou_threshold)
        {
            kept.push(candidate);
        }
    }
    kept
}
