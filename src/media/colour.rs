// SPDX-License-Identifier: MPL-2.0
//! Gentle global colour-cast correction in Lab space.
//!
//! The mean of each chroma channel is pulled toward neutral by a fraction of its
//! deviation. This is a partial correction, not a white balance: with the default
//! strength of 0.12 an orange cast is reduced, never removed.

use super::lab::LabImage;
use super::Frame;
use crate::config::CHROMA_NEUTRAL;

/// How far the mean of an unshifted chroma channel can move away from neutral
/// through the Lab to RGB to Lab round trip.
pub const UNSHIFTED_DRIFT: f64 = 1.0;

/// Integer shift applied to one chroma channel.
///
/// The fractional part is truncated toward zero, so the shift never exceeds the
/// deviation and the mean cannot overshoot neutral.
#[allow(clippy::cast_possible_truncation)]
fn chroma_shift(mean: f64, strength: f32) -> i32 {
    (-(mean - f64::from(CHROMA_NEUTRAL)) * f64::from(strength)) as i32
}

/// Adds `shift` to channel `channel` of every pixel, saturating at 0 and 255.
fn shift_channel(lab: &mut LabImage, channel: usize, shift: i32) {
    if shift == 0 {
        return;
    }
    for pixel in lab.pixels_mut() {
        let shifted = (i32::from(pixel[channel]) + shift).clamp(0, 255);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        {
            pixel[channel] = shifted as u8;
        }
    }
}

/// Shifts the a and b channels of `lab` toward neutral.
///
/// Returns the `(a, b)` shifts that were applied.
pub fn neutralize_chroma(lab: &mut LabImage, strength: f32) -> (i32, i32) {
    let a_shift = chroma_shift(lab.channel_mean(1), strength);
    let b_shift = chroma_shift(lab.channel_mean(2), strength);
    shift_channel(lab, 1, a_shift);
    shift_channel(lab, 2, b_shift);
    (a_shift, b_shift)
}

/// Reduces the global colour cast of `frame`.
///
/// When the computed shifts are both zero (including `strength == 0`) the input
/// is returned unchanged, without a Lab round trip.
///
/// The shifted image goes back through 8-bit RGB, so a chroma channel whose own
/// shift was zero can still drift away from neutral, by less than
/// [`UNSHIFTED_DRIFT`], when the other channel moved.
#[must_use]
pub fn correct_colour(frame: &Frame, strength: f32) -> Frame {
    let mut lab = LabImage::from_frame(frame);
    let (a_shift, b_shift) = neutralize_chroma(&mut lab, strength);
    if a_shift == 0 && b_shift == 0 {
        return frame.clone();
    }
    tracing::debug!(a_shift, b_shift, "colour cast corrected");
    lab.to_frame()
}
