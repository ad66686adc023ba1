//! Entry decryption and extraction.
//!
//! Given a located entry, reads its local file header, cross-checks it
//! against the central-directory descriptor, decrypts the payload and
//! writes the plaintext to the caller's sink. The sink sees bytes only
//! after every validation and the authentication tag have passed.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::crypto::{self, SegmentKey};
use crate::error::{Error, Result};
use crate::io::ReadAt;

use super::structures::{CompressionMethod, EntryDescriptor, LFH_SIGNATURE, LFH_SIZE};

/// Decrypts one entry's payload out of a random-access archive view.
pub struct SegmentExtractor<R: ReadAt> {
    reader: Arc<R>,
}

impl<R: ReadAt> SegmentExtractor<R> {
    pub fn new(reader: Arc<R>) -> Self {
        Self { reader }
    }

    /// Validate the local file header and return the payload's absolute
    /// offset.
    ///
    /// The header's name must equal the descriptor's name; a mismatch
    /// means the catalog's offsets have drifted from the archive and the
    /// payload at this position belongs to some other entry.
    async fn payload_offset(&self, entry: &EntryDescriptor) -> Result<u64> {
        let mut lfh_buf = vec![0u8; LFH_SIZE];
        self.reader.read_at(entry.header_offset, &mut lfh_buf).await?;

        if &lfh_buf[0..4] != LFH_SIGNATURE {
            return Err(Error::HeaderMismatch(format!(
                "no local file header at offset {}",
                entry.header_offset
            )));
        }

        let mut cursor = Cursor::new(&lfh_buf);
        cursor.set_position(26); // filename length field

        let file_name_length = cursor.read_u16::<LittleEndian>()? as u64;
        let extra_field_length = cursor.read_u16::<LittleEndian>()? as u64;

        if file_name_length != entry.name.len() as u64 {
            return Err(Error::HeaderMismatch(format!(
                "local header name length {} differs from directory entry {}",
                file_name_length, entry.name
            )));
        }

        let mut name_buf = vec![0u8; file_name_length as usize];
        self.reader
            .read_at(entry.header_offset + LFH_SIZE as u64, &mut name_buf)
            .await?;

        if name_buf != entry.name.as_bytes() {
            return Err(Error::HeaderMismatch(format!(
                "local header names {}, directory names {}",
                String::from_utf8_lossy(&name_buf),
                entry.name
            )));
        }

        // Payload starts after: LFH (30 bytes) + filename + extra field
        Ok(entry.header_offset + LFH_SIZE as u64 + file_name_length + extra_field_length)
    }

    /// Decrypt the entry's payload and write the plaintext to `sink`.
    ///
    /// Returns the number of plaintext bytes written. Nothing is written
    /// unless decryption (and inflation, for DEFLATE entries) succeeded in
    /// full.
    pub async fn extract<W>(
        &self,
        entry: &EntryDescriptor,
        key: &SegmentKey,
        sink: &mut W,
    ) -> Result<u64>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let payload_offset = self.payload_offset(entry).await?;

        let mut payload = vec![0u8; entry.compressed_size as usize];
        self.reader.read_at(payload_offset, &mut payload).await?;

        let sealed = crypto::open_segment(key, &entry.name, &payload)?;

        let plaintext = match entry.compression_method {
            CompressionMethod::Stored => sealed,
            CompressionMethod::Deflate => {
                let mut decoder = flate2::read::DeflateDecoder::new(sealed.as_slice());
                let mut out = Vec::new();
                decoder
                    .read_to_end(&mut out)
                    .map_err(|e| Error::MalformedArchive(format!("deflate: {e}")))?;
                out
            }
            CompressionMethod::Unknown(method) => {
                return Err(Error::MalformedArchive(format!(
                    "unsupported compression method: {method}"
                )));
            }
        };

        sink.write_all(&plaintext).await?;
        tracing::debug!(entry = %entry.name, bytes = plaintext.len(), "segment extracted");

        Ok(plaintext.len() as u64)
    }
}
