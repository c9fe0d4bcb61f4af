// SPDX-License-Identifier: MPL-2.0
//! HTTP implementation of the [`Fetcher`] port.
//!
//! Downloads stream straight to disk. The fetcher owns a current-thread `tokio`
//! runtime and blocks on it, so callers stay synchronous.
//!
//! [`Fetcher`]: crate::application::port::Fetcher

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use futures_util::StreamExt;

use crate::application::port::{FetchError, Fetcher};

/// Maximum number of redirects followed for a single download.
pub const MAX_REDIRECTS: usize = 10;

/// Progress is logged every time this many more bytes have arrived.
const PROGRESS_STEP_BYTES: u64 = 16 * 1024 * 1024;

const USER_AGENT: &str = concat!("photo-restore/", env!("CARGO_PKG_VERSION"));

/// Production fetcher backed by `reqwest`.
pub struct HttpFetcher {
    client: reqwest::Client,
    runtime: tokio::runtime::Runtime,
}

impl HttpFetcher {
    /// Builds the HTTP client and its runtime.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Transport`] if the client cannot be configured and
    /// [`FetchError::Io`] if the runtime cannot start.
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self { client, runtime })
    }

    async fn download(&self, url: &str, destination: &Path) -> Result<u64, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let total_size = response.content_length();
        tracing::info!(url, total_size, "downloading");

        let mut writer = BufWriter::new(File::create(destination)?);
        let mut hasher = blake3::Hasher::new();
        let mut downloaded: u64 = 0;
        let mut next_report = PROGRESS_STEP_BYTES;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| FetchError::Transport(e.to_string()))?;
            writer.write_all(&chunk)?;
            hasher.update(&chunk);
            downloaded += chunk.len() as u64;

            if downloaded >= next_report {
                next_report += PROGRESS_STEP_BYTES;
                match total_size.filter(|&t| t > 0) {
                    Some(total) => {
                        // Precision loss is irrelevant for a percentage
                        #[allow(clippy::cast_precision_loss)]
                        let percent = downloaded as f64 / total as f64 * 100.0;
                        tracing::info!(downloaded, total, "download {percent:.0}%");
                    }
                    None => tracing::info!(downloaded, "download in progress"),
                }
            }
        }

        writer.flush()?;
        tracing::info!(
            bytes = downloaded,
            blake3 = %hasher.finalize().to_hex(),
            file = %destination.display(),
            "download complete"
        );
        Ok(downloaded)
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str, destination: &Path) -> Result<u64, FetchError> {
        self.runtime.block_on(self.download(url, destination))
    }
}
