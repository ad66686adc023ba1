//! Shared test support: a minimal writer for encrypted segment archives,
//! an in-memory range store that logs every request, and catalog plumbing.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Write;
use std::sync::Mutex;

use async_trait::async_trait;

use reelvault::catalog::{ArchiveLocation, MovieId, MovieRecord, OffsetLength, StaticCatalog};
use reelvault::crypto::{self, SegmentKey};
use reelvault::error::{Error, Result};
use reelvault::io::RangeStore;
use reelvault::zip::CompressionMethod;

pub struct EntrySpec {
    pub name: String,
    pub plaintext: Vec<u8>,
    pub method: CompressionMethod,
}

impl EntrySpec {
    pub fn stored(name: &str, plaintext: &[u8]) -> Self {
        Self {
            name: name.to_string(),
            plaintext: plaintext.to_vec(),
            method: CompressionMethod::Stored,
        }
    }

    pub fn deflated(name: &str, plaintext: &[u8]) -> Self {
        Self {
            name: name.to_string(),
            plaintext: plaintext.to_vec(),
            method: CompressionMethod::Deflate,
        }
    }
}

pub struct BuiltArchive {
    pub bytes: Vec<u8>,
    pub trailer: OffsetLength,
    /// Span of local header + payload per entry name.
    pub entries: HashMap<String, OffsetLength>,
}

impl BuiltArchive {
    pub fn total_len(&self) -> u64 {
        self.bytes.len() as u64
    }
}

fn crc32(data: &[u8]) -> u32 {
    let mut crc = flate2::Crc::new();
    crc.update(data);
    crc.sum()
}

fn deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder =
        flate2::write::DeflateEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Write a one-movie segment archive the way the import process does:
/// local header + sealed payload per entry, then the central directory and
/// EOCD (plus an optional archive comment).
pub fn build_archive(key: &SegmentKey, entries: &[EntrySpec], comment: &[u8]) -> BuiltArchive {
    let mut bytes = Vec::new();
    let mut spans = HashMap::new();
    // (name, lfh_offset, payload_len, plaintext_len, crc, method)
    let mut records = Vec::new();

    for spec in entries {
        let lfh_offset = bytes.len() as u64;

        let compressed = match spec.method {
            CompressionMethod::Stored => spec.plaintext.clone(),
            CompressionMethod::Deflate => deflate(&spec.plaintext),
            CompressionMethod::Unknown(_) => panic!("unsupported method in builder"),
        };
        let payload = crypto::seal_segment(key, &spec.name, &compressed);
        let crc = crc32(&payload);

        bytes.extend_from_slice(b"PK\x03\x04");
        bytes.extend_from_slice(&20u16.to_le_bytes()); // version needed
        bytes.extend_from_slice(&0u16.to_le_bytes()); // flags
        bytes.extend_from_slice(&spec.method.as_u16().to_le_bytes());
        bytes.extend_from_slice(&0u16.to_le_bytes()); // mod time
        bytes.extend_from_slice(&0u16.to_le_bytes()); // mod date
        bytes.extend_from_slice(&crc.to_le_bytes());
        bytes.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&(spec.plaintext.len() as u32).to_le_bytes());
        bytes.extend_from_slice(&(spec.name.len() as u16).to_le_bytes());
        bytes.extend_from_slice(&0u16.to_le_bytes()); // extra len
        bytes.extend_from_slice(spec.name.as_bytes());
        bytes.extend_from_slice(&payload);

        let span_len = bytes.len() as u64 - lfh_offset;
        spans.insert(spec.name.clone(), OffsetLength::new(lfh_offset, span_len));
        records.push((
            spec.name.clone(),
            lfh_offset,
            payload.len() as u32,
            spec.plaintext.len() as u32,
            crc,
            spec.method,
        ));
    }

    let cd_offset = bytes.len() as u64;
    for (name, lfh_offset, payload_len, plaintext_len, crc, method) in &records {
        bytes.extend_from_slice(b"PK\x01\x02");
        bytes.extend_from_slice(&20u16.to_le_bytes()); // version made by
        bytes.extend_from_slice(&20u16.to_le_bytes()); // version needed
        bytes.extend_from_slice(&0u16.to_le_bytes()); // flags
        bytes.extend_from_slice(&method.as_u16().to_le_bytes());
        bytes.extend_from_slice(&0u16.to_le_bytes()); // mod time
        bytes.extend_from_slice(&0u16.to_le_bytes()); // mod date
        bytes.extend_from_slice(&crc.to_le_bytes());
        bytes.extend_from_slice(&payload_len.to_le_bytes());
        bytes.extend_from_slice(&plaintext_len.to_le_bytes());
        bytes.extend_from_slice(&(name.len() as u16).to_le_bytes());
        bytes.extend_from_slice(&0u16.to_le_bytes()); // extra len
        bytes.extend_from_slice(&0u16.to_le_bytes()); // comment len
        bytes.extend_from_slice(&0u16.to_le_bytes()); // disk number
        bytes.extend_from_slice(&0u16.to_le_bytes()); // internal attrs
        bytes.extend_from_slice(&0u32.to_le_bytes()); // external attrs
        bytes.extend_from_slice(&(*lfh_offset as u32).to_le_bytes());
        bytes.extend_from_slice(name.as_bytes());
    }
    let cd_size = bytes.len() as u64 - cd_offset;

    bytes.extend_from_slice(b"PK\x05\x06");
    bytes.extend_from_slice(&0u16.to_le_bytes()); // disk number
    bytes.extend_from_slice(&0u16.to_le_bytes()); // disk with cd
    bytes.extend_from_slice(&(records.len() as u16).to_le_bytes());
    bytes.extend_from_slice(&(records.len() as u16).to_le_bytes());
    bytes.extend_from_slice(&(cd_size as u32).to_le_bytes());
    bytes.extend_from_slice(&(cd_offset as u32).to_le_bytes());
    bytes.extend_from_slice(&(comment.len() as u16).to_le_bytes());
    bytes.extend_from_slice(comment);

    let trailer = OffsetLength::new(cd_offset, bytes.len() as u64 - cd_offset);

    BuiltArchive {
        bytes,
        trailer,
        entries: spans,
    }
}

/// Range store over one in-memory object, logging every requested range.
pub struct MemoryStore {
    bytes: Vec<u8>,
    pub requests: Mutex<Vec<(u64, u64)>>,
}

impl MemoryStore {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn logged_requests(&self) -> Vec<(u64, u64)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl RangeStore for MemoryStore {
    async fn fetch_range(
        &self,
        _location: &ArchiveLocation,
        start: u64,
        end_inclusive: u64,
    ) -> Result<Vec<u8>> {
        self.requests.lock().unwrap().push((start, end_inclusive));

        if end_inclusive >= self.bytes.len() as u64 || start > end_inclusive {
            return Err(Error::Store(anyhow::anyhow!(
                "range [{start}, {end_inclusive}] outside object of {} bytes",
                self.bytes.len()
            )));
        }
        Ok(self.bytes[start as usize..=end_inclusive as usize].to_vec())
    }
}

pub fn movie_id() -> MovieId {
    MovieId::new("tt0133093")
}

pub fn location() -> ArchiveLocation {
    ArchiveLocation::new("movies", "tt0133093.zip")
}

/// One-movie catalog over a built archive.
pub fn catalog_for(archive: &BuiltArchive, manifest: &[u8]) -> StaticCatalog {
    let mut catalog = StaticCatalog::new();
    catalog.insert(
        movie_id(),
        MovieRecord {
            location: location(),
            total_len: archive.total_len(),
            trailer: archive.trailer,
            entries: archive.entries.clone(),
            manifest: manifest.to_vec(),
        },
    );
    catalog
}

pub fn test_key() -> SegmentKey {
    SegmentKey([0x42; 32])
}
