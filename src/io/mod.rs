mod local;
mod sparse;
mod store;

pub use local::LocalObjectStore;
pub use sparse::{MaterializedRange, SparseReader};
pub use store::{HttpObjectStore, RangeStore};

use crate::error::Result;
use async_trait::async_trait;

/// Trait for random access reading from a data source
#[async_trait]
pub trait ReadAt: Send + Sync {
    /// Read data at the specified offset, filling the buffer completely
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<()>;

    /// Get the total size of the data source
    fn size(&self) -> u64;

    /// Read up to `max` bytes from the end of the source, returning the
    /// absolute offset of the first returned byte.
    ///
    /// Sources that cannot serve the whole window return the longest
    /// suffix they can; ZIP trailer scanning wants "as much tail as is
    /// available", not a fixed window.
    async fn read_tail(&self, max: u64) -> Result<(u64, Vec<u8>)> {
        let len = max.min(self.size());
        let start = self.size() - len;
        let mut buf = vec![0u8; len as usize];
        self.read_at(start, &mut buf).await?;
        Ok((start, buf))
    }
}
