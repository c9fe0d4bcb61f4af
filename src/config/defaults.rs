// SPDX-License-Identifier: MPL-2.0
//! Centralized default values and tuning constants.
//!
//! # Categories
//!
//! - **CLI**: defaults for the restoration options
//! - **Denoise**: non-local means window sizes
//! - **Colour**: chroma correction strength
//! - **Sharpen**: unsharp mask parameters
//! - **Output**: JPEG encoding
//! - **Models**: weight file names and download URLs

// ==========================================================================
// CLI Defaults
// ==========================================================================

/// Default upscale factor.
pub const DEFAULT_SCALE: u32 = 2;

/// Default denoise strength (0 disables denoising).
pub const DEFAULT_DENOISE_STRENGTH: u32 = 8;

/// Upper end of the recommended denoise range. Larger values are accepted.
pub const RECOMMENDED_MAX_DENOISE_STRENGTH: u32 = 20;

/// Default weights directory, relative to the working directory.
pub const DEFAULT_WEIGHTS_DIR: &str = "weights";

// ==========================================================================
// Denoise Defaults
// ==========================================================================

/// Side of the patch compared between pixels.
pub const DENOISE_TEMPLATE_WINDOW: usize = 7;

/// Side of the neighbourhood searched for similar patches.
pub const DENOISE_SEARCH_WINDOW: usize = 21;

// ==========================================================================
// Colour Defaults
// ==========================================================================

/// Fraction of the chroma deviation from neutral removed by colour correction.
pub const COLOUR_CORRECTION_STRENGTH: f32 = 0.12;

/// Neutral value of the 8-bit Lab chroma channels.
pub const CHROMA_NEUTRAL: f32 = 128.0;

// ==========================================================================
// Sharpen Defaults
// ==========================================================================

/// Gaussian sigma of the unsharp mask blur.
pub const SHARPEN_SIGMA: f32 = 1.0;

/// Weight of the original image in the unsharp mask.
pub const SHARPEN_ORIGINAL_WEIGHT: f32 = 1.15;

/// Weight of the blurred image in the unsharp mask.
pub const SHARPEN_BLURRED_WEIGHT: f32 = -0.15;

// ==========================================================================
// Output Defaults
// ==========================================================================

/// JPEG quality of restored images.
pub const OUTPUT_JPEG_QUALITY: u8 = 95;

/// Extension of restored images.
pub const OUTPUT_EXTENSION: &str = "jpg";

// ==========================================================================
// Model Defaults
// ==========================================================================

/// Default URL for the GFPGAN v1.4 ONNX face restoration model.
pub const DEFAULT_FACE_RESTORER_URL: &str =
    "https://github.com/facefusion/facefusion-assets/releases/download/models-3.0.0/gfpgan_1.4.onnx";

/// Default URL for the Real-ESRGAN x2plus ONNX super-resolution model.
pub const DEFAULT_UPSCALER_URL: &str =
    "https://github.com/facefusion/facefusion-assets/releases/download/models-3.0.0/real_esrgan_x2.onnx";

/// Default URL for the YuNet ONNX face detection model.
pub const DEFAULT_FACE_DETECTOR_URL: &str =
    "https://github.com/opencv/opencv_zoo/raw/main/models/face_detection_yunet/face_detection_yunet_2023mar.onnx";

/// Trained scale factor of the bundled Real-ESRGAN model.
pub const UPSCALER_NET_SCALE: u32 = 2;
