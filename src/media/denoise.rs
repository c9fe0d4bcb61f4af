// SPDX-License-Identifier: MPL-2.0
//! Colour non-local means denoising.
//!
//! The frame is converted to 8-bit Lab. Lightness is filtered with
//! `h_luminance`, the two chroma channels are filtered together with `h_color`.
//! For every pixel, each candidate inside the search window contributes with
//! weight `exp(-(ssd / template²) / (h² · channels))`, where `ssd` is the sum of
//! squared differences between the two template patches. Weights below 0.001
//! are dropped. Borders are mirrored (reflect-101).
//!
//! Patch distances are computed per search offset with an integral image, so
//! the cost is proportional to `search² · pixels` rather than
//! `search² · template² · pixels`.

use super::lab::LabImage;
use super::sampling::reflect_101;
use super::Frame;
use crate::config::{DenoiseStrength, DENOISE_SEARCH_WINDOW, DENOISE_TEMPLATE_WINDOW};

const WEIGHT_THRESHOLD: f64 = 0.001;

/// Denoises `frame` with the pipeline's fixed window sizes.
///
/// Strength 0 returns the input unchanged.
#[must_use]
pub fn denoise(frame: &Frame, strength: DenoiseStrength) -> Frame {
    if !strength.is_enabled() {
        return frame.clone();
    }
    #[allow(clippy::cast_precision_loss)]
    let h = strength.value() as f32;
    denoise_colored(frame, h, h, DENOISE_TEMPLATE_WINDOW, DENOISE_SEARCH_WINDOW)
}

/// Colour-aware non-local means with explicit parameters.
///
/// `template_window` and `search_window` should be odd; even values are
/// treated as the next smaller odd size. The output always has the same
/// dimensions as the input.
#[must_use]
pub fn denoise_colored(
    frame: &Frame,
    h_luminance: f32,
    h_color: f32,
    template_window: usize,
    search_window: usize,
) -> Frame {
    let (width, height) = frame.dimensions();
    if width == 0 || height == 0 {
        return frame.clone();
    }

    let mut lab = LabImage::from_frame(frame);
    let lightness: Vec<u8> = lab.pixels().iter().map(|p| p[0]).collect();
    let chroma: Vec<u8> = lab.pixels().iter().flat_map(|p| [p[1], p[2]]).collect();

    let params = WindowParams::new(template_window, search_window);
    let (width, height) = (width as usize, height as usize);

    let lightness = nl_means(
        &PlaneGroup {
            data: &lightness,
            width,
            height,
            channels: 1,
            h: h_luminance,
        },
        params,
    );
    let chroma = nl_means(
        &PlaneGroup {
            data: &chroma,
            width,
            height,
            channels: 2,
            h: h_color,
        },
        params,
    );

    for (i, pixel) in lab.pixels_mut().iter_mut().enumerate() {
        pixel[0] = lightness[i];
        pixel[1] = chroma[2 * i];
        pixel[2] = chroma[2 * i + 1];
    }
    lab.to_frame()
}

#[derive(Debug, Clone, Copy)]
struct WindowParams {
    template_radius: usize,
    search_radius: usize,
}

impl WindowParams {
    fn new(template_window: usize, search_window: usize) -> Self {
        Self {
            template_radius: template_window.max(1) / 2,
            search_radius: search_window.max(1) / 2,
        }
    }

    fn template_side(self) -> usize {
        2 * self.template_radius + 1
    }

    fn border(self) -> usize {
        self.template_radius + self.search_radius
    }
}

/// Interleaved channels filtered together with one `h`.
struct PlaneGroup<'a> {
    data: &'a [u8],
    width: usize,
    height: usize,
    channels: usize,
    h: f32,
}

/// Precomputed `ssd -> weight` table; entries past the end weigh zero.
fn weight_table(h: f32, channels: usize, template_side: usize) -> Vec<f32> {
    let h = f64::from(h);
    #[allow(clippy::cast_precision_loss)]
    let denominator = h * h * channels as f64;
    #[allow(clippy::cast_precision_loss)]
    let patch_area = (template_side * template_side) as f64;

    let max_ssd = template_side * template_side * channels * 255 * 255;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let cutoff = ((-WEIGHT_THRESHOLD.ln()) * denominator * patch_area).ceil() as usize;
    let len = cutoff.min(max_ssd) + 1;

    (0..len)
        .map(|ssd| {
            #[allow(clippy::cast_precision_loss)]
            let distance = ssd as f64 / patch_area;
            let weight = (-distance / denominator).exp();
            #[allow(clippy::cast_possible_truncation)]
            let weight = weight as f32;
            if f64::from(weight) < WEIGHT_THRESHOLD {
                0.0
            } else {
                weight
            }
        })
        .collect()
}

fn nl_means(group: &PlaneGroup<'_>, params: WindowParams) -> Vec<u8> {
    if group.h <= 0.0 {
        return group.data.to_vec();
    }

    let (width, height, channels) = (group.width, group.height, group.channels);
    let border = params.border();
    let side = params.template_side();
    let tr = params.template_radius;
    let sr = params.search_radius;

    // Mirrored copy with `border` extra samples on every side.
    let padded_width = width + 2 * border;
    let padded_height = height + 2 * border;
    let mut padded = vec![0_i32; padded_width * padded_height * channels];
    for py in 0..padded_height {
        #[allow(clippy::cast_possible_wrap)]
        let sy = reflect_101(py as isize - border as isize, height);
        for px in 0..padded_width {
            #[allow(clippy::cast_possible_wrap)]
            let sx = reflect_101(px as isize - border as isize, width);
            for c in 0..channels {
                padded[(py * padded_width + px) * channels + c] =
                    i32::from(group.data[(sy * width + sx) * channels + c]);
            }
        }
    }

    let weights = weight_table(group.h, channels, side);

    // Patch centres of output pixels, plus the template reach around them.
    let region_width = width + 2 * tr;
    let region_height = height + 2 * tr;
    let origin = border - tr;
    let integral_width = region_width + 1;

    let mut accumulated = vec![0.0_f32; width * height * channels];
    let mut weight_sum = vec![0.0_f32; width * height];
    let mut integral = vec![0_u64; integral_width * (region_height + 1)];

    for dy in 0..=2 * sr {
        for dx in 0..=2 * sr {
            // Offset (dy - sr, dx - sr) expressed relative to the padded origin.
            for ry in 0..region_height {
                let mut row_sum = 0_u64;
                let ay = origin + ry;
                let by = ay + dy - sr;
                for rx in 0..region_width {
                    let ax = origin + rx;
                    let bx = ax + dx - sr;
                    let a = (ay * padded_width + ax) * channels;
                    let b = (by * padded_width + bx) * channels;
                    let mut ssd = 0_u64;
                    for c in 0..channels {
                        let d = padded[a + c] - padded[b + c];
                        #[allow(clippy::cast_sign_loss)]
                        {
                            ssd += (d * d) as u64;
                        }
                    }
                    row_sum += ssd;
                    integral[(ry + 1) * integral_width + rx + 1] =
                        integral[ry * integral_width + rx + 1] + row_sum;
                }
            }

            for y in 0..height {
                for x in 0..width {
                    let ssd = integral[(y + side) * integral_width + x + side]
                        + integral[y * integral_width + x]
                        - integral[y * integral_width + x + side]
                        - integral[(y + side) * integral_width + x];
                    #[allow(clippy::cast_possible_truncation)]
                    let weight = weights.get(ssd as usize).copied().unwrap_or(0.0);
                    if weight == 0.0 {
                        continue;
                    }

                    let idx = y * width + x;
                    weight_sum[idx] += weight;
                    let candidate = ((y + border + dy - sr) * padded_width + x + border + dx - sr)
                        * channels;
                    for c in 0..channels {
                        #[allow(clippy::cast_precision_loss)]
                        {
                            accumulated[idx * channels + c] += weight * padded[candidate + c] as f32;
                        }
                    }
                }
            }
        }
    }

    let mut out = Vec::with_capacity(width * height * channels);
    for idx in 0..width * height {
        // The zero offset always contributes weight 1, so the sum is positive.
        let total = weight_sum[idx];
        for c in 0..channels {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            out.push((accumulated[idx * channels + c] / total).round().clamp(0.0, 255.0) as u8);
        }
    }
    out
}
