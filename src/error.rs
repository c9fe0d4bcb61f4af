// SPDX-License-Identifier: MPL-2.0
//! Crate-wide error types.
//!
//! Errors fall into two groups:
//! - run-fatal: [`ProvisionError`], engine construction failures and [`Error::Config`]
//! - per-file: [`Error::Decode`], [`Error::Inference`] and [`Error::EncodeWrite`],
//!   which the pipeline records against a single input and then moves on

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::application::port::{EngineError, FetchError};

/// Pipeline stage that produced an inference error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    FaceRestoration,
    Upscale,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::FaceRestoration => write!(f, "face restoration"),
            Stage::Upscale => write!(f, "upscale"),
        }
    }
}

/// Failure while making a model weight file available locally.
#[derive(Error, Debug)]
pub enum ProvisionError {
    /// The weights directory could not be created.
    #[error("failed to create weights directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The fetch itself failed.
    #[error("failed to fetch model {name} from {url}: {source}")]
    Fetch {
        name: &'static str,
        url: String,
        #[source]
        source: FetchError,
    },

    /// The fetch reported success but left nothing usable behind.
    #[error("fetched model {name} is empty")]
    EmptyDownload { name: &'static str },

    /// Moving the completed download into place failed.
    #[error("failed to finalize model file {path}: {source}")]
    Finalize {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Main error type for the restoration pipeline.
#[derive(Error, Debug)]
pub enum Error {
    /// Model weights could not be provisioned.
    #[error(transparent)]
    Provisioning(#[from] ProvisionError),

    /// An input file could not be decoded.
    #[error("failed to decode image {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image_rs::ImageError,
    },

    /// An inference engine failed, either at load time or on a frame.
    #[error("{stage} failed: {source}")]
    Inference {
        stage: Stage,
        #[source]
        source: EngineError,
    },

    /// The restored image could not be encoded or written.
    #[error("failed to write {path}: {reason}")]
    EncodeWrite { path: PathBuf, reason: String },

    /// Invalid command line argument or settings file.
    #[error("configuration error: {0}")]
    Config(String),

    /// Filesystem error outside of a single image's processing.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats_decode_error() {
        let err = Error::Decode {
            path: PathBuf::from("in/broken.jpg"),
            source: image_rs::ImageError::IoError(std::io::Error::other("truncated")),
        };
        let message = err.to_string();
        assert!(message.contains("broken.jpg"));
        assert!(message.contains("truncated"));
    }

    #[test]
    fn from_io_error_produces_io_variant() {
        let io_error = std::io::Error::other("boom");
        let err: Error = io_error.into();
        match err {
            Error::Io(inner) => assert!(inner.to_string().contains("boom")),
            _ => panic!("expected Io variant"),
        }
    }

    #[test]
    fn inference_error_names_the_stage() {
        let err = Error::Inference {
            stage: Stage::Upscale,
            source: EngineError::InferenceFailed("out of memory".to_string()),
        };
        assert_eq!(err.to_string(), "upscale failed: Inference failed: out of memory");
    }

    #[test]
    fn provisioning_error_is_transparent() {
        let err: Error = ProvisionError::EmptyDownload { name: "GFPGAN v1.4" }.into();
        assert_eq!(err.to_string(), "fetched model GFPGAN v1.4 is empty");
    }

    #[test]
    fn config_error_from_bad_toml() {
        let parsed: std::result::Result<toml::Table, _> = toml::from_str("[models");
        let err: Error = parsed.unwrap_err().into();
        assert!(matches!(err, Error::Config(_)));
    }
}
