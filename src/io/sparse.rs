//! Sparse random-access view over a remote archive.
//!
//! A [`SparseReader`] knows the archive's full logical length but holds only
//! the byte spans that were actually fetched. ZIP parsing seeks between the
//! end-of-file trailer, the central directory and one entry's local header,
//! so reads land in whichever span covers them; a read touching any byte
//! outside the fetched spans is an indexing bug and fails loudly instead of
//! serving wrong data.

use async_trait::async_trait;

use super::ReadAt;
use crate::error::{Error, Result};

/// One fetched span of the archive, tagged with its absolute position.
#[derive(Debug, Clone)]
pub struct MaterializedRange {
    pub offset: u64,
    pub data: Vec<u8>,
}

impl MaterializedRange {
    pub fn new(offset: u64, data: Vec<u8>) -> Self {
        Self { offset, data }
    }

    fn end(&self) -> u64 {
        self.offset + self.data.len() as u64
    }
}

/// Virtual random-access region of known total length, backed by a small
/// set of non-overlapping materialized spans.
#[derive(Debug)]
pub struct SparseReader {
    total_len: u64,
    /// Sorted by offset; pairwise disjoint, each within `[0, total_len)`.
    ranges: Vec<MaterializedRange>,
}

impl SparseReader {
    /// Build a sparse view from fetched spans.
    ///
    /// Validates the layout up front: every span must have positive length
    /// and lie within `[0, total_len)`, and no two spans may overlap. Input
    /// order does not matter.
    pub fn new(total_len: u64, mut ranges: Vec<MaterializedRange>) -> Result<Self> {
        for range in &ranges {
            if range.data.is_empty() {
                return Err(Error::InvalidRangeLayout(format!(
                    "empty range at offset {}",
                    range.offset
                )));
            }
            if range.end() > total_len {
                return Err(Error::InvalidRangeLayout(format!(
                    "range [{}, {}) exceeds total length {}",
                    range.offset,
                    range.end(),
                    total_len
                )));
            }
        }

        ranges.sort_by_key(|r| r.offset);

        for pair in ranges.windows(2) {
            if pair[0].end() > pair[1].offset {
                return Err(Error::InvalidRangeLayout(format!(
                    "range [{}, {}) overlaps range at offset {}",
                    pair[0].offset,
                    pair[0].end(),
                    pair[1].offset
                )));
            }
        }

        Ok(Self { total_len, ranges })
    }

    /// Find the span containing `offset`, if any.
    fn covering(&self, offset: u64) -> Option<&MaterializedRange> {
        let idx = match self.ranges.binary_search_by_key(&offset, |r| r.offset) {
            Ok(idx) => idx,
            Err(0) => return None,
            Err(idx) => idx - 1,
        };
        let range = &self.ranges[idx];
        (offset < range.end()).then_some(range)
    }
}

#[async_trait]
impl ReadAt for SparseReader {
    /// Fill `buf` from the span containing `[offset, offset + buf.len())`.
    ///
    /// The requested window must sit entirely inside one materialized span;
    /// anything else fails with [`Error::UnmappedRegion`]. Never zero-fills
    /// and never returns a short read.
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        if buf.is_empty() {
            return Ok(());
        }

        let range = self
            .covering(offset)
            .filter(|r| offset + buf.len() as u64 <= r.end())
            .ok_or(Error::UnmappedRegion {
                offset,
                count: buf.len(),
            })?;

        let start = (offset - range.offset) as usize;
        buf.copy_from_slice(&range.data[start..start + buf.len()]);
        Ok(())
    }

    fn size(&self) -> u64 {
        self.total_len
    }

    /// The longest mapped suffix, capped at `max` bytes. Fails when the
    /// final span does not reach the logical end, since a tail read that
    /// silently started earlier would hand the parser a truncated view.
    async fn read_tail(&self, max: u64) -> Result<(u64, Vec<u8>)> {
        let last = self.ranges.last().filter(|r| r.end() == self.total_len).ok_or(
            Error::UnmappedRegion {
                offset: self.total_len.saturating_sub(1),
                count: 1,
            },
        )?;

        let len = max.min(last.data.len() as u64);
        let start = self.total_len - len;
        Ok((start, last.data[(start - last.offset) as usize..].to_vec()))
    }
}
