// SPDX-License-Identifier: MPL-2.0
//! Border handling and sub-pixel sampling helpers shared by the image operations
//! and the engine adapters.

use super::Frame;
use image_rs::Rgb;

/// Maps a possibly out-of-range index into `0..len` by mirroring without
/// repeating the edge sample (`dcb|abcd|cba`).
///
/// Offsets larger than the length fold repeatedly.
#[must_use]
pub fn reflect_101(index: isize, len: usize) -> usize {
    if len <= 1 {
        return 0;
    }
    #[allow(clippy::cast_possible_wrap)]
    let period = (2 * len - 2) as isize;
    let folded = index.rem_euclid(period);
    #[allow(clippy::cast_sign_loss)]
    let folded = folded as usize;
    if folded >= len {
        2 * len - 2 - folded
    } else {
        folded
    }
}

/// Extends `frame` on the right and bottom edges with mirrored content.
#[must_use]
pub fn pad_reflect(frame: &Frame, right: u32, bottom: u32) -> Frame {
    if right == 0 && bottom == 0 {
        return frame.clone();
    }
    let (width, height) = frame.dimensions();
    Frame::from_fn(width + right, height + bottom, |x, y| {
        #[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
        let sx = reflect_101(x as isize, width as usize) as u32;
        #[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
        let sy = reflect_101(y as isize, height as usize) as u32;
        *frame.get_pixel(sx, sy)
    })
}

/// Samples `frame` at a fractional position with bilinear interpolation.
///
/// Positions outside the frame return `None`.
#[must_use]
pub fn sample_bilinear(frame: &Frame, x: f32, y: f32) -> Option<[f32; 3]> {
    let (width, height) = frame.dimensions();
    if width == 0 || height == 0 {
        return None;
    }
    #[allow(clippy::cast_precision_loss)]
    let (max_x, max_y) = ((width - 1) as f32, (height - 1) as f32);
    if x < 0.0 || y < 0.0 || x > max_x || y > max_y {
        return None;
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let (x0, y0) = (x.floor() as u32, y.floor() as u32);
    let x1 = (x0 + 1).min(width - 1);
    let y1 = (y0 + 1).min(height - 1);
    #[allow(clippy::cast_precision_loss)]
    let (fx, fy) = (x - x0 as f32, y - y0 as f32);

    let p00 = frame.get_pixel(x0, y0).0;
    let p10 = frame.get_pixel(x1, y0).0;
    let p01 = frame.get_pixel(x0, y1).0;
    let p11 = frame.get_pixel(x1, y1).0;

    let mut out = [0.0_f32; 3];
    for c in 0..3 {
        let top = f32::from(p00[c]) * (1.0 - fx) + f32::from(p10[c]) * fx;
        let bottom = f32::from(p01[c]) * (1.0 - fx) + f32::from(p11[c]) * fx;
        out[c] = top * (1.0 - fy) + bottom * fy;
    }
    Some(out)
}

/// Rounds and saturates a float pixel to 8 bits per channel.
#[must_use]
pub fn to_rgb8(pixel: [f32; 3]) -> Rgb<u8> {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let channels = pixel.map(|v| v.round().clamp(0.0, 255.0) as u8);
    Rgb(channels)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reflect_101_mirrors_without_repeating_edge() {
        assert_eq!(reflect_101(-1, 5), 1);
        assert_eq!(reflect_101(-2, 5), 2);
        assert_eq!(reflect_101(5, 5), 3);
        assert_eq!(reflect_101(6, 5), 2);
        assert_eq!(reflect_101(2, 5), 2);
    }

    #[test]
    fn reflect_101_folds_large_offsets() {
        // period of 8 for len 5: 0 1 2 3 4 3 2 1 | 0 ...
        assert_eq!(reflect_101(8, 5), 0);
        assert_eq!(reflect_101(11, 5), 3);
        assert_eq!(reflect_101(-9, 5), 1);
        assert_eq!(reflect_101(7, 1), 0);
    }

    #[test]
    fn pad_reflect_extends_dimensions() {
        let frame = Frame::from_fn(3, 2, |x, y| {
            #[allow(clippy::cast_possible_truncation)]
            let v = (x * 10 + y) as u8;
            Rgb([v, v, v])
        });
        let padded = pad_reflect(&frame, 2, 3);
        assert_eq!(padded.dimensions(), (5, 5));
        assert_eq!(padded.get_pixel(3, 0), frame.get_pixel(1, 0));
        assert_eq!(padded.get_pixel(0, 2), frame.get_pixel(0, 0));
    }

    #[test]
    fn bilinear_sampling_interpolates_and_rejects_outside() {
        let mut frame = Frame::new(2, 1);
        frame.put_pixel(0, 0, Rgb([0, 0, 0]));
        frame.put_pixel(1, 0, Rgb([100, 200, 50]));

        let mid = sample_bilinear(&frame, 0.5, 0.0).unwrap();
        assert!((mid[0] - 50.0).abs() < 1e-4);
        assert!((mid[1] - 100.0).abs() < 1e-4);
        assert!(sample_bilinear(&frame, -0.1, 0.0).is_none());
        assert!(sample_bilinear(&frame, 1.5, 0.0).is_none());
    }

    #[test]
    fn to_rgb8_saturates() {
        assert_eq!(to_rgb8([-4.0, 127.6, 300.0]), Rgb([0, 128, 255]));
    }
}
