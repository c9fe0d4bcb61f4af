// SPDX-License-Identifier: MPL-2.0
//! AI processing port definitions.
//!
//! This module defines the [`FaceRestorer`] and [`Upscaler`] traits that the
//! restoration pipeline drives, plus the shared [`EngineError`].
//!
//! # Design Notes
//!
//! - Both traits exchange [`Frame`]s (RGB, 8 bits per channel); adapters that need
//!   another channel order or value range convert at their own boundary
//! - Methods take `&mut self` because an ONNX session run mutates the session;
//!   the pipeline is sequential, so no locking is involved
//! - Model downloading is not part of the port; see [`crate::provision`]

use crate::media::Frame;
use thiserror::Error;

// =============================================================================
// EngineError
// =============================================================================

/// Errors that can occur while loading or running an inference engine.
#[derive(Error, Debug, Clone)]
pub enum EngineError {
    /// The model file could not be loaded into a session.
    #[error("Failed to load model: {0}")]
    ModelLoadFailed(String),

    /// The input frame cannot be processed by the model.
    #[error("Unsupported input {width}x{height}: {reason}")]
    UnsupportedInput {
        width: u32,
        height: u32,
        reason: String,
    },

    /// Converting the frame into a tensor failed.
    #[error("Preprocessing failed: {0}")]
    PreprocessingFailed(String),

    /// The session run failed.
    #[error("Inference failed: {0}")]
    InferenceFailed(String),

    /// The output tensor could not be turned back into a frame.
    #[error("Postprocessing failed: {0}")]
    PostprocessingFailed(String),
}

// =============================================================================
// ProcessorCapabilities
// =============================================================================

/// Describes an engine for logging and sanity checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorCapabilities {
    /// Human-readable model name (e.g. "GFPGAN v1.4").
    pub name: &'static str,

    /// Trained upscale factor of the network, `None` for size-preserving models.
    pub scale_factor: Option<u32>,
}

impl ProcessorCapabilities {
    /// Capabilities of a model that keeps the frame size.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            scale_factor: None,
        }
    }

    /// Capabilities of an upscaling model.
    #[must_use]
    pub const fn upscaler(name: &'static str, scale_factor: u32) -> Self {
        Self {
            name,
            scale_factor: Some(scale_factor),
        }
    }
}

// =============================================================================
// Engine traits
// =============================================================================

/// Restores faces inside a full photograph.
///
/// Implementations detect faces anywhere in the frame, restore every one of
/// them and paste the results back into the original geometry. The returned
/// frame always has the same dimensions as the input; a frame without faces
/// comes back unchanged.
pub trait FaceRestorer {
    /// Restores all faces in `frame`.
    ///
    /// # Errors
    ///
    /// Returns an [`EngineError`] if detection or restoration fails.
    fn restore(&mut self, frame: &Frame) -> Result<Frame, EngineError>;

    /// Returns the capabilities of this engine.
    fn capabilities(&self) -> ProcessorCapabilities;
}

/// Super-resolves a frame.
///
/// `outscale` is the requested output factor and is independent of the
/// network's trained factor: the result is always exactly
/// `width * outscale` by `height * outscale`.
pub trait Upscaler {
    /// Upscales `frame` by `outscale`.
    ///
    /// # Errors
    ///
    /// Returns an [`EngineError`] if inference fails or the frame is unusable.
    fn upscale(&mut self, frame: &Frame, outscale: u32) -> Result<Frame, EngineError>;

    /// Returns the capabilities of this engine.
    fn capabilities(&self) -> ProcessorCapabilities;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_error_display() {
        let err = EngineError::ModelLoadFailed("bad protobuf".to_string());
        assert_eq!(err.to_string(), "Failed to load model: bad protobuf");

        let err = EngineError::UnsupportedInput {
            width: 0,
            height: 12,
            reason: "empty frame".to_string(),
        };
        let display = err.to_string();
        assert!(display.contains("0x12"));
        assert!(display.contains("empty frame"));
    }

    #[test]
    fn processor_capabilities_basic() {
        let caps = ProcessorCapabilities::new("GFPGAN v1.4");
        assert_eq!(caps.name, "GFPGAN v1.4");
        assert!(caps.scale_factor.is_none());
    }

    #[test]
    fn processor_capabilities_upscaler() {
        let caps = ProcessorCapabilities::upscaler("Real-ESRGAN x2plus", 2);
        assert_eq!(caps.scale_factor, Some(2));
    }

    // Mock implementation for testing
    struct MockUpscaler;

    impl Upscaler for MockUpscaler {
        fn upscale(&mut self, frame: &Frame, outscale: u32) -> Result<Frame, EngineError> {
            Ok(image_rs::imageops::resize(
                frame,
                frame.width() * outscale,
                frame.height() * outscale,
                image_rs::imageops::FilterType::Nearest,
            ))
        }

        fn capabilities(&self) -> ProcessorCapabilities {
            ProcessorCapabilities::upscaler("Mock", 1)
        }
    }

    #[test]
    fn upscaler_trait_object_scales_dimensions() {
        let mut upscaler: Box<dyn Upscaler> = Box::new(MockUpscaler);
        let frame = Frame::new(7, 5);
        let result = upscaler.upscale(&frame, 4).expect("mock upscale");
        assert_eq!(result.dimensions(), (28, 20));
    }
}
