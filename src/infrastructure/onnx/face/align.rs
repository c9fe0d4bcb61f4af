// SPDX-License-Identifier: MPL-2.0
//! Face alignment to the FFHQ five-point template and paste-back.
//!
//! A detected face is mapped into a `FACE_SIZE` square with a similarity
//! transform (rotation, uniform scale, translation) fitted by least squares to
//! its five landmarks. After restoration the square is mapped back and blended
//! in with a mask that fades out toward the square's edges.

use image_rs::Rgb;

use crate::media::sampling::{sample_bilinear, to_rgb8};
use crate::media::Frame;

/// Side of the aligned face crop expected by GFPGAN.
pub const FACE_SIZE: u32 = 512;

/// Landmark positions of the FFHQ template at 512x512: left eye, right eye,
/// nose tip, left mouth corner, right mouth corner.
pub const FFHQ_TEMPLATE: [[f32; 2]; 5] = [
    [192.981_38, 239.947_08],
    [318.902_77, 240.193_6],
    [256.634_16, 314.019_35],
    [201.261_17, 371.410_43],
    [313.089_05, 371.151_18],
];

/// Fill colour for crop pixels that fall outside the source frame.
const BORDER_FILL: Rgb<u8> = Rgb([135, 133, 132]);

/// 2D similarity transform: `(x, y) -> (a·x - b·y + tx, b·x + a·y + ty)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Similarity {
    pub a: f32,
    pub b: f32,
    pub tx: f32,
    pub ty: f32,
}

impl Similarity {
    /// Least-squares similarity mapping `src` points onto `dst` points.
    ///
    /// Returns `None` when the source points are all identical.
    #[must_use]
    pub fn estimate(src: &[[f32; 2]], dst: &[[f32; 2]]) -> Option<Self> {
        let n = src.len().min(dst.len());
        if n == 0 {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        let count = n as f64;

        let mean = |points: &[[f32; 2]]| {
            let (sx, sy) = points[..n].iter().fold((0.0, 0.0), |(sx, sy), p| {
                (sx + f64::from(p[0]), sy + f64::from(p[1]))
            });
            (sx / count, sy / count)
        };
        let (mx, my) = mean(src);
        let (mu, mv) = mean(dst);

        let (mut spread, mut dot, mut cross) = (0.0_f64, 0.0_f64, 0.0_f64);
        for (s, d) in src[..n].iter().zip(&dst[..n]) {
            let (xc, yc) = (f64::from(s[0]) - mx, f64::from(s[1]) - my);
            let (uc, vc) = (f64::from(d[0]) - mu, f64::from(d[1]) - mv);
            spread += xc * xc + yc * yc;
            dot += xc * uc + yc * vc;
            cross += xc * vc - yc * uc;
        }
        if spread <= f64::EPSILON {
            return None;
        }

        let a = dot / spread;
        let b = cross / spread;
        let tx = mu - (a * mx - b * my);
        let ty = mv - (b * mx + a * my);

        #[allow(clippy::cast_possible_truncation)]
        let fitted = Self {
            a: a as f32,
            b: b as f32,
            tx: tx as f32,
            ty: ty as f32,
        };
        Some(fitted)
    }

    /// Maps a point.
    #[must_use]
    pub fn apply(&self, point: [f32; 2]) -> [f32; 2] {
        let [x, y] = point;
        [
            self.a * x - self.b * y + self.tx,
            self.b * x + self.a * y + self.ty,
        ]
    }

    /// Uniform scale factor of the transform.
    #[must_use]
    pub fn scale(&self) -> f32 {
        self.a.hypot(self.b)
    }

    /// The inverse transform, `None` if degenerate.
    #[must_use]
    pub fn inverse(&self) -> Option<Self> {
        let det = self.a * self.a + self.b * self.b;
        if det <= f32::EPSILON {
            return None;
        }
        let a = self.a / det;
        let b = -self.b / det;
        Some(Self {
            a,
            b,
            tx: -(a * self.tx - b * self.ty),
            ty: -(b * self.tx + a * self.ty),
        })
    }
}

/// Extracts the aligned `FACE_SIZE` crop.
///
/// `to_template` maps source frame coordinates into crop coordinates. Returns
/// `None` if the transform cannot be inverted.
#[must_use]
pub fn warp_face(frame: &Frame, to_template: &Similarity) -> Option<Frame> {
    let to_frame = to_template.inverse()?;
    let crop = Frame::from_fn(FACE_SIZE, FACE_SIZE, |u, v| {
        #[allow(clippy::cast_precision_loss)]
        let [x, y] = to_frame.apply([u as f32, v as f32]);
        sample_bilinear(frame, x, y).map_or(BORDER_FILL, to_rgb8)
    });
    Some(crop)
}

/// Blend weight of crop position `(u, v)`.
///
/// Zero within `size / 20` of the crop edge, rising smoothly to one over the
/// next `size / 10`.
#[must_use]
pub fn feather_weight(u: f32, v: f32, size: f32) -> f32 {
    let edge = size / 20.0;
    let ramp = size / 10.0;
    let distance = u.min(v).min(size - 1.0 - u).min(size - 1.0 - v);
    let t = ((distance - edge) / ramp).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Blends the restored crop `face` back into `target`.
///
/// `to_template` is the same transform used to cut the crop out.
pub fn paste_face(target: &mut Frame, face: &Frame, to_template: &Similarity) {
    let Some(to_frame) = to_template.inverse() else {
        return;
    };
    let (width, height) = target.dimensions();
    if width == 0 || height == 0 {
        return;
    }

    #[allow(clippy::cast_precision_loss)]
    let size = face.width().min(face.height()) as f32;
    let corners = [[0.0, 0.0], [size - 1.0, 0.0], [0.0, size - 1.0], [size - 1.0, size - 1.0]]
        .map(|c| to_frame.apply(c));
    let (min_x, max_x, min_y, max_y) = corners.iter().fold(
        (f32::MAX, f32::MIN, f32::MAX, f32::MIN),
        |(x0, x1, y0, y1), p| (x0.min(p[0]), x1.max(p[0]), y0.min(p[1]), y1.max(p[1])),
    );

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let clamp_x = |v: f32| v.clamp(0.0, (width - 1) as f32) as u32;
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let clamp_y = |v: f32| v.clamp(0.0, (height - 1) as f32) as u32;
    if max_x < 0.0 || max_y < 0.0 {
        return;
    }

    for y in clamp_y(min_y.floor())..=clamp_y(max_y.ceil()) {
        for x in clamp_x(min_x.floor())..=clamp_x(max_x.ceil()) {
            #[allow(clippy::cast_precision_loss)]
            let [u, v] = to_template.apply([x as f32, y as f32]);
            let weight = feather_weight(u, v, size);
            if weight <= 0.0 {
                continue;
            }
            let Some(restored) = sample_bilinear(face, u, v) else {
                continue;
            };
            let original = target.get_pixel(x, y).0;
            let mut blended = [0.0_f32; 3];
            for c in 0..3 {
                blended[c] = weight * restored[c] + (1.0 - weight) * f32::from(original[c]);
            }
            target.put_pixel(x, y, to_rgb8(blended));
        }
    }
}
