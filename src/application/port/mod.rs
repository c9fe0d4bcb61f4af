// SPDX-License-Identifier: MPL-2.0
//! Port definitions (traits) for dependency inversion.
//!
//! # Available Ports
//!
//! - [`ai`]: face restoration and super-resolution engines
//! - [`fetch`]: retrieval of model weight files
//!
//! Infrastructure adapters live in [`crate::infrastructure`]; tests substitute
//! their own implementations without touching any process-wide state.

pub mod ai;
pub mod fetch;

// Re-export main types for convenience
pub use ai::{EngineError, FaceRestorer, ProcessorCapabilities, Upscaler};
pub use fetch::{FetchError, Fetcher};
