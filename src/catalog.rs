//! External catalog boundary.
//!
//! The import process that packs segment archives also records, per movie,
//! where the archive lives, its total length, and the byte spans of its
//! trailer block and of every entry. This crate only consumes those numbers;
//! producing them is the importer's job.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::{Error, Result};

/// Opaque stable identifier for a movie.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MovieId(pub String);

impl MovieId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for MovieId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Bucket/key pair identifying the remote ZIP object for a movie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveLocation {
    pub bucket: String,
    pub key: String,
}

impl ArchiveLocation {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

/// Precomputed position of a logical unit (trailer block or one entry's
/// local header + payload) inside the archive object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetLength {
    pub offset: u64,
    pub length: u64,
}

impl OffsetLength {
    pub fn new(offset: u64, length: u64) -> Self {
        Self { offset, length }
    }

    /// Inclusive end offset, as used in HTTP Range requests.
    pub fn end_inclusive(&self) -> u64 {
        self.offset + self.length - 1
    }
}

/// Read-only index produced by the external import process.
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn archive_location(&self, movie: &MovieId) -> Result<ArchiveLocation>;

    /// Exact byte length of the full archive object.
    async fn total_len(&self, movie: &MovieId) -> Result<u64>;

    /// Span covering the central directory and end-of-central-directory
    /// records.
    async fn trailer_range(&self, movie: &MovieId) -> Result<OffsetLength>;

    /// Span covering one entry's local file header and payload.
    async fn entry_range(&self, movie: &MovieId, entry_name: &str) -> Result<OffsetLength>;

    /// Prebuilt HLS manifest document for the movie.
    async fn manifest(&self, movie: &MovieId) -> Result<Vec<u8>>;
}

/// Per-movie record held by a [`StaticCatalog`].
#[derive(Debug, Clone)]
pub struct MovieRecord {
    pub location: ArchiveLocation,
    pub total_len: u64,
    pub trailer: OffsetLength,
    pub entries: HashMap<String, OffsetLength>,
    pub manifest: Vec<u8>,
}

/// In-memory catalog over fixed records; backs the CLI (one record built
/// from flags) and the test suite.
#[derive(Default)]
pub struct StaticCatalog {
    movies: HashMap<MovieId, MovieRecord>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, movie: MovieId, record: MovieRecord) {
        self.movies.insert(movie, record);
    }

    fn record(&self, movie: &MovieId) -> Result<&MovieRecord> {
        self.movies
            .get(movie)
            .ok_or_else(|| Error::Catalog(anyhow::anyhow!("unknown movie: {movie}")))
    }
}

#[async_trait]
impl Catalog for StaticCatalog {
    async fn archive_location(&self, movie: &MovieId) -> Result<ArchiveLocation> {
        Ok(self.record(movie)?.location.clone())
    }

    async fn total_len(&self, movie: &MovieId) -> Result<u64> {
        Ok(self.record(movie)?.total_len)
    }

    async fn trailer_range(&self, movie: &MovieId) -> Result<OffsetLength> {
        Ok(self.record(movie)?.trailer)
    }

    async fn entry_range(&self, movie: &MovieId, entry_name: &str) -> Result<OffsetLength> {
        self.record(movie)?
            .entries
            .get(entry_name)
            .copied()
            .ok_or_else(|| Error::EntryNotFound(entry_name.to_string()))
    }

    async fn manifest(&self, movie: &MovieId) -> Result<Vec<u8>> {
        Ok(self.record(movie)?.manifest.clone())
    }
}
