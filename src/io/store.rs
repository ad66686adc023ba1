use async_trait::async_trait;
use reqwest::Client;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::catalog::ArchiveLocation;
use crate::error::{Error, Result};

/// Fetches byte ranges of named remote objects. The only operation in the
/// extraction path that crosses the network.
#[async_trait]
pub trait RangeStore: Send + Sync {
    /// Fetch `[start, end_inclusive]` of the object at `location`.
    ///
    /// Returns exactly the requested bytes or an error; a failed fetch has
    /// no side effects, so callers may retry freely.
    async fn fetch_range(
        &self,
        location: &ArchiveLocation,
        start: u64,
        end_inclusive: u64,
    ) -> Result<Vec<u8>>;
}

/// Range store over an HTTP object-storage gateway.
///
/// Objects are addressed as `{endpoint}/{bucket}/{key}` and read with
/// `Range` requests. Transient failures are not retried here; the retry
/// policy lives in [`crate::retry`] so every caller shares one ceiling.
pub struct HttpObjectStore {
    client: Client,
    endpoint: String,
    transferred_bytes: AtomicU64,
}

impl HttpObjectStore {
    pub fn new(endpoint: String) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            transferred_bytes: AtomicU64::new(0),
        })
    }

    /// Get total bytes transferred from network
    pub fn transferred_bytes(&self) -> u64 {
        self.transferred_bytes.load(Ordering::Relaxed)
    }

    fn object_url(&self, location: &ArchiveLocation) -> String {
        format!("{}/{}/{}", self.endpoint, location.bucket, location.key)
    }
}

#[async_trait]
impl RangeStore for HttpObjectStore {
    async fn fetch_range(
        &self,
        location: &ArchiveLocation,
        start: u64,
        end_inclusive: u64,
    ) -> Result<Vec<u8>> {
        let url = self.object_url(location);
        let range = format!("bytes={}-{}", start, end_inclusive);
        tracing::debug!(%url, %range, "fetching object range");

        let resp = self
            .client
            .get(&url)
            .header("Range", &range)
            .send()
            .await?;

        if resp.status() != reqwest::StatusCode::PARTIAL_CONTENT {
            return Err(Error::Store(anyhow::anyhow!(
                "range request for {url} failed with status: {}",
                resp.status()
            )));
        }

        let bytes = resp.bytes().await?;
        let expected = (end_inclusive - start + 1) as usize;
        if bytes.len() != expected {
            return Err(Error::Store(anyhow::anyhow!(
                "range request for {url} returned {} bytes, expected {expected}",
                bytes.len()
            )));
        }

        self.transferred_bytes
            .fetch_add(bytes.len() as u64, Ordering::Relaxed);

        Ok(bytes.to_vec())
    }
}
