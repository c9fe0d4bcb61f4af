// SPDX-License-Identifier: MPL-2.0
//! Byte retrieval port used by the weight provisioner.
//!
//! The provisioner never talks to the network directly; it is handed a
//! [`Fetcher`]. Production code passes
//! [`HttpFetcher`](crate::infrastructure::http::HttpFetcher), tests pass a
//! closure.

use std::path::Path;
use thiserror::Error;

/// Errors reported by a [`Fetcher`].
#[derive(Error, Debug)]
pub enum FetchError {
    /// The request could not be sent or the body could not be read.
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered with a non-success status.
    #[error("HTTP status {0}")]
    Status(u16),

    /// Writing the destination file failed.
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Retrieves the bytes at a URL into a local file.
pub trait Fetcher {
    /// Writes the content at `url` to `destination` verbatim.
    ///
    /// Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] on any transport, status or write failure.
    fn fetch(&self, url: &str, destination: &Path) -> Result<u64, FetchError>;
}

impl<F> Fetcher for F
where
    F: Fn(&str, &Path) -> Result<u64, FetchError>,
{
    fn fetch(&self, url: &str, destination: &Path) -> Result<u64, FetchError> {
        self(url, destination)
    }
}
