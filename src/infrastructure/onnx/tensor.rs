// SPDX-License-Identifier: MPL-2.0
//! Conversions between [`Frame`]s and NCHW float tensors.
//!
//! Every adapter decides its own value range and channel order; these helpers
//! only move samples between layouts.

use ndarray::Array4;

use crate::application::port::EngineError;
use crate::media::sampling::to_rgb8;
use crate::media::Frame;

/// Channel order of a model's colour planes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChannelOrder {
    Rgb,
    Bgr,
}

impl ChannelOrder {
    /// Index into an RGB pixel for tensor plane `plane`.
    fn source_channel(self, plane: usize) -> usize {
        match self {
            ChannelOrder::Rgb => plane,
            ChannelOrder::Bgr => 2 - plane,
        }
    }
}

/// Builds a `(1, 3, height, width)` tensor from `frame`, mapping each 8-bit
/// sample through `normalize`.
pub(crate) fn frame_to_nchw(
    frame: &Frame,
    order: ChannelOrder,
    normalize: impl Fn(u8) -> f32,
) -> Array4<f32> {
    let (width, height) = frame.dimensions();
    let mut tensor = Array4::<f32>::zeros((1, 3, height as usize, width as usize));

    for (x, y, pixel) in frame.enumerate_pixels() {
        for plane in 0..3 {
            tensor[[0, plane, y as usize, x as usize]] =
                normalize(pixel.0[order.source_channel(plane)]);
        }
    }
    tensor
}

/// Turns a `(1, 3, height, width)` RGB output back into a frame.
///
/// `denormalize` maps a raw output value to the `0..=255` range; the result is
/// then rounded and clamped.
pub(crate) fn nchw_to_frame(
    shape: &[usize],
    data: &[f32],
    denormalize: impl Fn(f32) -> f32,
) -> Result<Frame, EngineError> {
    if shape.len() != 4 {
        return Err(EngineError::PostprocessingFailed(format!(
            "Expected 4D tensor, got {}D",
            shape.len()
        )));
    }
    if shape[0] != 1 || shape[1] != 3 {
        return Err(EngineError::PostprocessingFailed(format!(
            "Expected a single RGB image, got shape {shape:?}"
        )));
    }

    let (height, width) = (shape[2], shape[3]);
    let channel_size = height * width;
    if data.len() < 3 * channel_size {
        return Err(EngineError::PostprocessingFailed(format!(
            "Output has {} values, shape {shape:?} needs {}",
            data.len(),
            3 * channel_size
        )));
    }

    let width_u32 = u32::try_from(width)
        .map_err(|_| EngineError::PostprocessingFailed("Image width too large".to_string()))?;
    let height_u32 = u32::try_from(height)
        .map_err(|_| EngineError::PostprocessingFailed("Image height too large".to_string()))?;

    Ok(Frame::from_fn(width_u32, height_u32, |x, y| {
        let idx = y as usize * width + x as usize;
        to_rgb8([
            denormalize(data[idx]),
            denormalize(data[channel_size + idx]),
            denormalize(data[2 * channel_size + idx]),
        ])
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image_rs::Rgb;

    fn sample_frame() -> Frame {
        let mut frame = Frame::new(3, 2);
        frame.put_pixel(0, 0, Rgb([255, 0, 10]));
        frame.put_pixel(2, 1, Rgb([1, 2, 3]));
        frame
    }

    #[test]
    fn rgb_tensor_has_nchw_shape_and_order() {
        let tensor = frame_to_nchw(&sample_frame(), ChannelOrder::Rgb, |v| f32::from(v) / 255.0);
        assert_eq!(tensor.shape(), &[1, 3, 2, 3]);
        assert!((tensor[[0, 0, 0, 0]] - 1.0).abs() < f32::EPSILON);
        assert!((tensor[[0, 2, 0, 0]] - 10.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn bgr_tensor_swaps_outer_planes() {
        let tensor = frame_to_nchw(&sample_frame(), ChannelOrder::Bgr, f32::from);
        assert!((tensor[[0, 0, 1, 2]] - 3.0).abs() < f32::EPSILON);
        assert!((tensor[[0, 1, 1, 2]] - 2.0).abs() < f32::EPSILON);
        assert!((tensor[[0, 2, 1, 2]] - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn tensor_back_to_frame() {
        let frame = sample_frame();
        let tensor = frame_to_nchw(&frame, ChannelOrder::Rgb, |v| f32::from(v) / 255.0);
        let data: Vec<f32> = tensor.iter().copied().collect();
        let back = nchw_to_frame(tensor.shape(), &data, |v| v * 255.0).expect("valid tensor");
        assert_eq!(back, frame);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let data = [2.0, -1.0, 0.5];
        let frame = nchw_to_frame(&[1, 3, 1, 1], &data, |v| v * 255.0).expect("valid tensor");
        assert_eq!(frame.get_pixel(0, 0), &Rgb([255, 0, 128]));
    }

    #[test]
    fn wrong_rank_is_rejected() {
        let result = nchw_to_frame(&[3, 4, 4], &[0.0; 48], |v| v);
        assert!(matches!(result, Err(EngineError::PostprocessingFailed(_))));
    }

    #[test]
    fn short_buffer_is_rejected() {
        let result = nchw_to_frame(&[1, 3, 2, 2], &[0.0; 5], |v| v);
        assert!(matches!(result, Err(EngineError::PostprocessingFailed(_))));
    }
}
