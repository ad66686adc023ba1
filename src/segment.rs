//! Segment read orchestration.
//!
//! Ties the pieces together for one request: catalog numbers in, three
//! retried range fetches, a sparse archive view, index lookup, then
//! decryption into the caller's sink. Requests share nothing but the
//! store client and the read-only catalog, so any number may run
//! concurrently.

use std::sync::Arc;
use tokio::io::AsyncWrite;

use crate::catalog::{ArchiveLocation, Catalog, MovieId, OffsetLength};
use crate::crypto::SegmentKey;
use crate::error::{Error, Result};
use crate::io::{MaterializedRange, RangeStore, SparseReader};
use crate::retry::{self, with_retries};
use crate::zip::{LFH_SIGNATURE, SegmentExtractor, ZipParser};

/// Length of the leading signature probe fetched from every archive.
const SIGNATURE_PROBE_LEN: u64 = 4;

/// Entry name for a movie's n-th transport-stream segment, as written by
/// the import process.
pub fn segment_entry_name(segment_index: u32) -> String {
    format!("movie{segment_index}.ts")
}

/// Per-request segment reader over a range store and a catalog.
pub struct SegmentService<S, C> {
    store: Arc<S>,
    catalog: Arc<C>,
    attempts: u32,
    verify_catalog_offsets: bool,
}

impl<S: RangeStore, C: Catalog> SegmentService<S, C> {
    pub fn new(store: Arc<S>, catalog: Arc<C>) -> Self {
        Self {
            store,
            catalog,
            attempts: retry::DEFAULT_ATTEMPTS,
            verify_catalog_offsets: true,
        }
    }

    /// Disable the cross-check between catalog offsets and parsed
    /// directory offsets. Intended for recovery tooling working against a
    /// catalog that is known stale; the service default keeps it on.
    pub fn without_offset_verification(mut self) -> Self {
        self.verify_catalog_offsets = false;
        self
    }

    async fn fetch(&self, location: &ArchiveLocation, span: OffsetLength) -> Result<MaterializedRange> {
        let data = with_retries(self.attempts, || {
            self.store
                .fetch_range(location, span.offset, span.end_inclusive())
        })
        .await?;
        Ok(MaterializedRange::new(span.offset, data))
    }

    /// Fetch, locate and decrypt one segment into `sink`.
    ///
    /// At most three byte ranges of the archive are fetched: a 4-byte
    /// signature probe at offset 0, the catalog's trailer span, and the
    /// catalog's span for the entry itself. The first entry's span starts
    /// at the head of the archive and already contains the probe bytes,
    /// so no separate probe is fetched for it. Returns the number of
    /// plaintext bytes written.
    pub async fn read_segment<W>(
        &self,
        movie: &MovieId,
        segment_index: u32,
        location: &ArchiveLocation,
        key: &SegmentKey,
        sink: &mut W,
    ) -> Result<u64>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let entry_name = segment_entry_name(segment_index);
        tracing::debug!(%movie, %entry_name, "segment requested");

        let total_len = self.catalog.total_len(movie).await?;
        let trailer_span = self.catalog.trailer_range(movie).await?;
        let entry_span = self.catalog.entry_range(movie, &entry_name).await?;

        let mut ranges = Vec::with_capacity(3);

        if entry_span.offset >= SIGNATURE_PROBE_LEN {
            let probe = self
                .fetch(location, OffsetLength::new(0, SIGNATURE_PROBE_LEN))
                .await?;
            if probe.data != LFH_SIGNATURE {
                return Err(Error::MalformedArchive(
                    "object does not start with a local file header".into(),
                ));
            }
            ranges.push(probe);
        }

        ranges.push(self.fetch(location, trailer_span).await?);

        let entry_block = self.fetch(location, entry_span).await?;
        if entry_span.offset == 0 && !entry_block.data.starts_with(LFH_SIGNATURE) {
            return Err(Error::MalformedArchive(
                "object does not start with a local file header".into(),
            ));
        }
        ranges.push(entry_block);

        let archive = Arc::new(SparseReader::new(total_len, ranges)?);

        let descriptor = ZipParser::new(archive.clone())
            .locate_entry(&entry_name)
            .await?;

        // The catalog and the archive describe the same offset through
        // independent paths; disagreement means one of them is stale.
        if self.verify_catalog_offsets && descriptor.header_offset != entry_span.offset {
            return Err(Error::CatalogInconsistency {
                entry: entry_name,
                catalog_offset: entry_span.offset,
                parsed_offset: descriptor.header_offset,
            });
        }

        SegmentExtractor::new(archive)
            .extract(&descriptor, key, sink)
            .await
    }

    /// Return the movie's prebuilt manifest document.
    ///
    /// Pure catalog delegation; the archive is never touched.
    pub async fn read_manifest(&self, movie: &MovieId) -> Result<Vec<u8>> {
        self.catalog.manifest(movie).await
    }
}
