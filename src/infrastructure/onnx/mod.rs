// SPDX-License-Identifier: MPL-2.0
//! ONNX Runtime adapters implementing the engine port traits.
//!
//! This module provides the two inference engines of a run:
//!
//! - [`OnnxFaceRestorer`]: `GFPGAN` v1.4 face restoration, with `YuNet` detection
//! - [`OnnxUpscaler`]: `Real-ESRGAN` super-resolution
//!
//! # Design Notes
//!
//! - Adapters take and return [`Frame`]s (RGB, 8 bits per channel)
//! - Each adapter converts to its model's tensor layout at its own boundary:
//!   `GFPGAN` and `Real-ESRGAN` use NCHW RGB floats, `YuNet` uses NCHW BGR in
//!   `0..=255`
//! - Sessions are built once per run and driven through `&mut self`
//!
//! [`Frame`]: crate::media::Frame

pub mod face;
mod session;
mod tensor;
mod upscale;

pub use face::{FaceRestoreOptions, OnnxFaceRestorer};
pub use upscale::{OnnxUpscaler, PRE_PAD};
