//! HTTP client wrapper for binary fetches.

use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::Client;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, instrument};
use url::Url;

use super::error::FetchError;

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes for large files).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// HTTP client for fetching linked resources in binary mode.
///
/// Created once and reused across activations, taking advantage of
/// connection pooling. Cloning is cheap (the inner client is shared).
#[derive(Debug, Clone)]
pub struct FetchClient {
    client: Client,
}

impl Default for FetchClient {
    fn default() -> Self {
        Self::new()
    }
}

impl FetchClient {
    /// Creates a new client with default timeouts.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        Self::with_timeouts(CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
    }

    /// Creates a new client with explicit timeout values.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the supplied
    /// timeout configuration.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn with_timeouts(connect_timeout_secs: u64, read_timeout_secs: u64) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .timeout(Duration::from_secs(read_timeout_secs))
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self { client }
    }

    /// Issues one binary GET and streams the response body to `dest`.
    ///
    /// Returns the number of bytes written. On any failure after the file
    /// was created, the partial file is removed so nothing incomplete is
    /// left behind.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` if:
    /// - The URL is invalid
    /// - The request fails (network error, timeout)
    /// - The server returns an error status (4xx, 5xx)
    /// - Writing to `dest` fails
    #[instrument(skip(self), fields(url = %url, dest = %dest.display()))]
    pub async fn fetch_binary_to(&self, url: &str, dest: &Path) -> Result<u64, FetchError> {
        let response = self.get(url).await?;

        let file = File::create(dest)
            .await
            .map_err(|e| FetchError::io(dest, e))?;
        let mut writer = BufWriter::new(file);
        let mut stream = response.bytes_stream();
        let mut bytes_written: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    debug!(path = %dest.display(), "removing partial file after stream error");
                    let _ = tokio::fs::remove_file(dest).await;
                    return Err(classify_reqwest_error(url, e));
                }
            };
            if let Err(e) = writer.write_all(&chunk).await {
                let _ = tokio::fs::remove_file(dest).await;
                return Err(FetchError::io(dest, e));
            }
            bytes_written += chunk.len() as u64;
        }

        if let Err(e) = writer.flush().await {
            let _ = tokio::fs::remove_file(dest).await;
            return Err(FetchError::io(dest, e));
        }

        debug!(bytes = bytes_written, "binary fetch complete");
        Ok(bytes_written)
    }

    /// Fetches a text resource (a page to scan).
    ///
    /// # Errors
    ///
    /// Returns the same request-level errors as
    /// [`fetch_binary_to`](Self::fetch_binary_to).
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let response = self.get(url).await?;
        response
            .text()
            .await
            .map_err(|e| classify_reqwest_error(url, e))
    }

    /// Shared request path: validate, send, check status.
    async fn get(&self, url: &str) -> Result<reqwest::Response, FetchError> {
        Url::parse(url).map_err(|_| FetchError::invalid_url(url))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_reqwest_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::http_status(url, status.as_u16()));
        }

        Ok(response)
    }
}

/// Maps a reqwest error to the matching structured variant.
fn classify_reqwest_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::timeout(url)
    } else {
        FetchError::network(url, error)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_client_default_builds() {
        let _client = FetchClient::default();
    }

    #[test]
    fn test_fetch_client_with_timeouts_builds() {
        let _client = FetchClient::with_timeouts(5, 10);
    }

    #[tokio::test]
    async fn test_fetch_binary_to_rejects_invalid_url() {
        let client = FetchClient::new();
        let result = client
            .fetch_binary_to("definitely-not-a-url", Path::new("/tmp/unused.part"))
            .await;
        assert!(matches!(result, Err(FetchError::InvalidUrl { .. })));
    }

    #[tokio::test]
    async fn test_fetch_text_rejects_invalid_url() {
        let client = FetchClient::new();
        let result = client.fetch_text("::nope::").await;
        assert!(matches!(result, Err(FetchError::InvalidUrl { .. })));
    }
}
