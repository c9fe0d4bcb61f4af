// SPDX-License-Identifier: MPL-2.0
//! Unsharp masking to restore micro-contrast after upscaling.

use super::Frame;
use crate::config::{SHARPEN_BLURRED_WEIGHT, SHARPEN_ORIGINAL_WEIGHT, SHARPEN_SIGMA};
use image_rs::imageops;

/// Sharpens `frame` with the pipeline's fixed parameters.
///
/// `out = 1.15 * frame - 0.15 * gaussian(frame, sigma = 1.0)`, saturated.
#[must_use]
pub fn unsharp_mask(frame: &Frame) -> Frame {
    unsharp_mask_with(
        frame,
        SHARPEN_SIGMA,
        SHARPEN_ORIGINAL_WEIGHT,
        SHARPEN_BLURRED_WEIGHT,
    )
}

/// Weighted combination of `frame` and its Gaussian blur.
///
/// Results are rounded and saturated to `0..=255`; they never wrap.
#[must_use]
pub fn unsharp_mask_with(
    frame: &Frame,
    sigma: f32,
    original_weight: f32,
    blurred_weight: f32,
) -> Frame {
    if frame.width() == 0 || frame.height() == 0 {
        return frame.clone();
    }
    let blurred = imageops::blur(frame, sigma);
    add_weighted(frame, original_weight, &blurred, blurred_weight)
}

/// `saturate(round(a * alpha + b * beta))`, pixel by pixel.
fn add_weighted(a: &Frame, alpha: f32, b: &Frame, beta: f32) -> Frame {
    let mut out = Frame::new(a.width(), a.height());
    for ((dst, src_a), src_b) in out.pixels_mut().zip(a.pixels()).zip(b.pixels()) {
        for c in 0..3 {
            let value = f32::from(src_a[c]) * alpha + f32::from(src_b[c]) * beta;
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            {
                dst[c] = value.round().clamp(0.0, 255.0) as u8;
            }
        }
    }
    out
}
