// SPDX-License-Identifier: MPL-2.0
//! `Real-ESRGAN` upscale adapter implementing the [`Upscaler`] trait.
//!
//! The network sees a reflect-padded copy of the frame: [`PRE_PAD`] pixels are
//! added on the right and bottom edges, then more until both sides are a
//! multiple of the model's stride. The output is cropped back to exactly
//! `width * net_scale` by `height * net_scale` and, when the caller asks for a
//! different factor, resampled with Lanczos3.
//!
//! Tensor layout is NCHW, RGB, values in `0.0..=1.0` on both sides.
//!
//! [`Upscaler`]: crate::application::port::Upscaler

use std::path::Path;

use image_rs::imageops::{self, FilterType};
use ort::session::Session;

use super::session::{first_input_name, load_session, run_single};
use super::tensor::{frame_to_nchw, nchw_to_frame, ChannelOrder};
use crate::application::port::{EngineError, ProcessorCapabilities, Upscaler};
use crate::media::sampling::pad_reflect;
use crate::media::Frame;

/// Reflect padding added before inference to hide border artefacts.
pub const PRE_PAD: u32 = 10;

/// ONNX-based upscaler for the `Real-ESRGAN` family.
pub struct OnnxUpscaler {
    session: Session,
    input_name: String,
    net_scale: u32,
}

impl OnnxUpscaler {
    /// Loads the model at `model_path`, trained for `net_scale`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::ModelLoadFailed`] if the file is missing, is not
    /// a valid model, or `net_scale` is zero.
    pub fn load(model_path: &Path, net_scale: u32) -> Result<Self, EngineError> {
        if net_scale == 0 {
            return Err(EngineError::ModelLoadFailed(
                "network scale must be at least 1".to_string(),
            ));
        }
        let session = load_session(model_path)?;
        let input_name = first_input_name(&session);
        tracing::info!(net_scale, model = %model_path.display(), "upscaler loaded");
        Ok(Self {
            session,
            input_name,
            net_scale,
        })
    }
}

impl Upscaler for OnnxUpscaler {
    fn upscale(&mut self, frame: &Frame, outscale: u32) -> Result<Frame, EngineError> {
        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 || outscale == 0 {
            return Err(EngineError::UnsupportedInput {
                width,
                height,
                reason: format!("cannot upscale by {outscale}"),
            });
        }

        let (right, bottom) = network_padding(width, height, self.net_scale);
        let padded = pad_reflect(frame, right, bottom);
        let tensor = frame_to_nchw(&padded, ChannelOrder::Rgb, |v| f32::from(v) / 255.0);

        let output = run_single(&mut self.session, &self.input_name, &tensor)?;
        let raw = nchw_to_frame(&output.shape, &output.data, |v| v * 255.0)?;

        finish_output(&raw, width, height, self.net_scale, outscale)
    }

    fn capabilities(&self) -> ProcessorCapabilities {
        ProcessorCapabilities::upscaler("Real-ESRGAN", self.net_scale)
    }
}

/// Right and bottom padding for a `width` x `height` input.
///
/// `Real-ESRGAN` downsamples internally by `4 / net_scale` for the x2 and x1
/// variants, so the padded size must be divisible by that factor.
#[must_use]
pub fn network_padding(width: u32, height: u32, net_scale: u32) -> (u32, u32) {
    let modulus = match net_scale {
        2 => 2,
        1 => 4,
        _ => 1,
    };
    let pad_to = |len: u32| {
        let padded = len + PRE_PAD;
        PRE_PAD + (modulus - padded % modulus) % modulus
    };
    (pad_to(width), pad_to(height))
}

/// Crops the raw network output to the unpadded region and resamples it to
/// the requested factor.
///
/// # Errors
///
/// Returns [`EngineError::PostprocessingFailed`] if the output is smaller than
/// the expected crop.
pub fn finish_output(
    raw: &Frame,
    width: u32,
    height: u32,
    net_scale: u32,
    outscale: u32,
) -> Result<Frame, EngineError> {
    let (crop_w, crop_h) = (width * net_scale, height * net_scale);
    if raw.width() < crop_w || raw.height() < crop_h {
        return Err(EngineError::PostprocessingFailed(format!(
            "network output {}x{} is smaller than expected {crop_w}x{crop_h}",
            raw.width(),
            raw.height()
        )));
    }

    let cropped = imageops::crop_imm(raw, 0, 0, crop_w, crop_h).to_image();
    if outscale == net_scale {
        return Ok(cropped);
    }
    Ok(imageops::resize(
        &cropped,
        width * outscale,
        height * outscale,
        FilterType::Lanczos3,
    ))
}
