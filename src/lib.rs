// SPDX-License-Identifier: MPL-2.0
//! `photo_restore` restores directories of old photographs.
//!
//! Each image is denoised, has its faces restored with GFPGAN, optionally gets
//! a gentle colour-cast correction, is upscaled with Real-ESRGAN and finally
//! sharpened. Model weights are fetched on first use and cached on disk.

#![doc(html_root_url = "https://docs.rs/photo_restore/0.1.0")]

pub mod application;
pub mod cli;
pub mod config;
pub mod directory_scanner;
pub mod error;
pub mod infrastructure;
pub mod media;
pub mod paths;
pub mod pipeline;
pub mod provision;
