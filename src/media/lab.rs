// SPDX-License-Identifier: MPL-2.0
//! 8-bit CIE L*a*b* representation of a frame.
//!
//! Channels are scaled the way common 8-bit image libraries store Lab:
//! - `L` in `0..=255` maps to lightness `0..=100`
//! - `a` and `b` are offset by 128, so a neutral grey has chroma `(128, 128)`
//!
//! Conversion assumes sRGB primaries with a D65 white point.

use super::Frame;

const WHITE_X: f32 = 0.950_456;
const WHITE_Z: f32 = 1.088_754;
const EPSILON: f32 = 0.008_856;
const KAPPA: f32 = 903.3;
const F_OFFSET: f32 = 16.0 / 116.0;
const F_LINEAR_SLOPE: f32 = 7.787;

/// A frame converted to 8-bit Lab, one `[L, a, b]` triple per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabImage {
    width: u32,
    height: u32,
    pixels: Vec<[u8; 3]>,
}

impl LabImage {
    /// Converts an RGB frame to Lab.
    #[must_use]
    pub fn from_frame(frame: &Frame) -> Self {
        let lut = srgb_to_linear_lut();
        let pixels = frame.pixels().map(|p| rgb_to_lab8(p.0, &lut)).collect();
        Self {
            width: frame.width(),
            height: frame.height(),
            pixels,
        }
    }

    /// Converts back to an RGB frame.
    #[must_use]
    pub fn to_frame(&self) -> Frame {
        let mut raw = Vec::with_capacity(self.pixels.len() * 3);
        for lab in &self.pixels {
            raw.extend_from_slice(&lab8_to_rgb(*lab));
        }
        Frame::from_raw(self.width, self.height, raw)
            .unwrap_or_else(|| Frame::new(self.width, self.height))
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub fn pixels(&self) -> &[[u8; 3]] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [[u8; 3]] {
        &mut self.pixels
    }

    /// Mean value of channel `channel` (0 = L, 1 = a, 2 = b).
    ///
    /// Returns 0 for an empty image.
    #[must_use]
    pub fn channel_mean(&self, channel: usize) -> f64 {
        if self.pixels.is_empty() {
            return 0.0;
        }
        let sum: u64 = self.pixels.iter().map(|p| u64::from(p[channel])).sum();
        #[allow(clippy::cast_precision_loss)]
        let mean = sum as f64 / self.pixels.len() as f64;
        mean
    }
}

/// Builds the sRGB decoding table for 8-bit values.
fn srgb_to_linear_lut() -> [f32; 256] {
    let mut lut = [0.0_f32; 256];
    for (value, slot) in lut.iter_mut().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let c = value as f32 / 255.0;
        *slot = if c <= 0.040_45 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        };
    }
    lut
}

fn linear_to_srgb(c: f32) -> f32 {
    let c = c.clamp(0.0, 1.0);
    if c <= 0.003_130_8 {
        12.92 * c
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

fn lab_f(t: f32) -> f32 {
    if t > EPSILON {
        t.cbrt()
    } else {
        F_LINEAR_SLOPE * t + F_OFFSET
    }
}

fn lab_f_inverse(f: f32) -> f32 {
    let cubed = f * f * f;
    if cubed > EPSILON {
        cubed
    } else {
        (f - F_OFFSET) / F_LINEAR_SLOPE
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn saturate_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// Converts one RGB pixel to 8-bit Lab.
fn rgb_to_lab8(rgb: [u8; 3], lut: &[f32; 256]) -> [u8; 3] {
    let r = lut[usize::from(rgb[0])];
    let g = lut[usize::from(rgb[1])];
    let b = lut[usize::from(rgb[2])];

    let x = (0.412_453 * r + 0.357_580 * g + 0.180_423 * b) / WHITE_X;
    let y = 0.212_671 * r + 0.715_160 * g + 0.072_169 * b;
    let z = (0.019_334 * r + 0.119_193 * g + 0.950_227 * b) / WHITE_Z;

    let fx = lab_f(x);
    let fy = lab_f(y);
    let fz = lab_f(z);

    let l = if y > EPSILON {
        116.0 * fy - 16.0
    } else {
        KAPPA * y
    };
    let a = 500.0 * (fx - fy);
    let bb = 200.0 * (fy - fz);

    [
        saturate_u8(l * 255.0 / 100.0),
        saturate_u8(a + 128.0),
        saturate_u8(bb + 128.0),
    ]
}

/// Converts one 8-bit Lab pixel back to RGB.
fn lab8_to_rgb(lab: [u8; 3]) -> [u8; 3] {
    let l = f32::from(lab[0]) * 100.0 / 255.0;
    let a = f32::from(lab[1]) - 128.0;
    let bb = f32::from(lab[2]) - 128.0;

    let (y, fy) = if l > KAPPA * EPSILON {
        let fy = (l + 16.0) / 116.0;
        (fy * fy * fy, fy)
    } else {
        let y = l / KAPPA;
        (y, F_LINEAR_SLOPE * y + F_OFFSET)
    };

    let x = lab_f_inverse(fy + a / 500.0) * WHITE_X;
    let z = lab_f_inverse(fy - bb / 200.0) * WHITE_Z;

    let r = 3.240_479 * x - 1.537_150 * y - 0.498_535 * z;
    let g = -0.969_256 * x + 1.875_991 * y + 0.041_556 * z;
    let b = 0.055_648 * x - 0.204_043 * y + 1.057_311 * z;

    [
        saturate_u8(linear_to_srgb(r) * 255.0),
        saturate_u8(linear_to_srgb(g) * 255.0),
        saturate_u8(linear_to_srgb(b) * 255.0),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use image_rs::Rgb;

    #[test]
    fn grey_has_neutral_chroma() {
        let frame = Frame::from_pixel(4, 4, Rgb([128, 128, 128]));
        let lab = LabImage::from_frame(&frame);
        for pixel in lab.pixels() {
            assert_eq!(pixel[1], 128);
            assert_eq!(pixel[2], 128);
        }
    }

    #[test]
    fn black_and_white_lightness_extremes() {
        let lut = srgb_to_linear_lut();
        assert_eq!(rgb_to_lab8([0, 0, 0], &lut), [0, 128, 128]);
        assert_eq!(rgb_to_lab8([255, 255, 255], &lut)[0], 255);
    }

    #[test]
    fn warm_colour_has_positive_a_and_b() {
        let lut = srgb_to_linear_lut();
        let lab = rgb_to_lab8([200, 150, 100], &lut);
        assert!(lab[1] > 128, "a should lean red, got {}", lab[1]);
        assert!(lab[2] > 128, "b should lean yellow, got {}", lab[2]);
    }

    #[test]
    fn round_trip_stays_close() {
        let lut = srgb_to_linear_lut();
        for rgb in [[12, 200, 90], [250, 10, 10], [128, 128, 128], [30, 60, 220]] {
            let back = lab8_to_rgb(rgb_to_lab8(rgb, &lut));
            for c in 0..3 {
                let diff = (i32::from(back[c]) - i32::from(rgb[c])).abs();
                assert!(diff <= 3, "{rgb:?} came back as {back:?}");
            }
        }
    }

    #[test]
    fn channel_mean_of_uniform_image() {
        let frame = Frame::from_pixel(3, 2, Rgb([128, 128, 128]));
        let lab = LabImage::from_frame(&frame);
        assert!((lab.channel_mean(1) - 128.0).abs() < f64::EPSILON);
        assert_eq!(lab.width(), 3);
        assert_eq!(lab.height(), 2);
    }
}
