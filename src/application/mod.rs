// SPDX-License-Identifier: MPL-2.0
//! Application layer.
//!
//! - [`port`]: trait definitions that infrastructure implements
//!
//! # Dependency Rule
//!
//! - The pipeline depends on ports, never on concrete adapters
//! - Infrastructure implements the ports (ONNX Runtime engines, HTTP fetcher)
//! - Only the binary wires concrete adapters into a run

pub mod port;
