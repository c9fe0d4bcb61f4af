// SPDX-License-Identifier: MPL-2.0
//! Infrastructure layer adapters.
//!
//! This module contains concrete implementations of the port traits defined in
//! `application::port`. These adapters wrap external dependencies like ONNX
//! Runtime and the network.
//!
//! # Available Adapters
//!
//! - [`onnx`]: face restoration and upscaling (implements [`FaceRestorer`] and [`Upscaler`])
//! - [`http`]: model downloads (implements [`Fetcher`])
//!
//! [`FaceRestorer`]: crate::application::port::FaceRestorer
//! [`Upscaler`]: crate::application::port::Upscaler
//! [`Fetcher`]: crate::application::port::Fetcher

pub mod http;
pub mod onnx;

pub use http::HttpFetcher;
pub use onnx::{FaceRestoreOptions, OnnxFaceRestorer, OnnxUpscaler};
