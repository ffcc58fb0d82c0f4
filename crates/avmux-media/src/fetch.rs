use std::path::Path;

use futures_util::StreamExt;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::config::FetchLimits;
use crate::error::FetchError;

/// Remote-fetch client that streams bodies to disk under a size ceiling
/// and a deadline.
#[derive(Clone, Debug)]
pub struct Fetcher {
    client: reqwest::Client,
}

impl Fetcher {
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("avmux/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    /// Download `url` into `dest`, returning the number of bytes written.
    ///
    /// The deadline covers connecting, headers, and the whole body. A
    /// partially written `dest` is left in place for the caller's cleanup.
    pub async fn fetch_to_file(
        &self,
        url: &str,
        dest: &Path,
        limits: &FetchLimits,
    ) -> Result<u64, FetchError> {
        match tokio::time::timeout(limits.timeout(), self.stream_to_file(url, dest, limits)).await
        {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout { secs: limits.timeout_secs }),
        }
    }

    async fn stream_to_file(
        &self,
        url: &str,
        dest: &Path,
        limits: &FetchLimits,
    ) -> Result<u64, FetchError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { status: status.as_u16() });
        }
        if let Some(len) = response.content_length() {
            if len > limits.max_bytes {
                return Err(FetchError::TooLarge { limit: limits.max_bytes });
            }
        }

        let mut file = fs::File::create(dest).await?;
        let mut written: u64 = 0;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            written += chunk.len() as u64;
            if written > limits.max_bytes {
                return Err(FetchError::TooLarge { limit: limits.max_bytes });
            }
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        tracing::debug!(url, bytes = written, "fetched {}", dest.display());
        Ok(written)
    }
}
