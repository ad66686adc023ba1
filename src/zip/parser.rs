//! Archive index reader.
//!
//! Parses just enough ZIP structure, through any [`ReadAt`] source, to
//! locate one named entry:
//!
//! 1. Find the End of Central Directory (EOCD) at the source's end
//! 2. If ZIP64, read the ZIP64 EOCD for large archive support
//! 3. Walk the Central Directory records until the name matches
//!
//! Payload bytes are never touched here; the reader only needs the EOCD
//! and central-directory regions of the source to be readable, which is
//! what makes it usable over a sparse three-range view.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::io::ReadAt;

use super::structures::*;

/// Maximum ZIP comment size allowed by the format (65535 bytes).
///
/// This limits the search area when looking for EOCD with a comment.
const MAX_COMMENT_SIZE: u64 = 65535;

/// Low-level ZIP index parser, generic over the byte source.
pub struct ZipParser<R: ReadAt> {
    /// The underlying data source
    reader: Arc<R>,
    /// Total size of the archive in bytes
    size: u64,
}

impl<R: ReadAt> ZipParser<R> {
    pub fn new(reader: Arc<R>) -> Self {
        let size = reader.size();
        Self { reader, size }
    }

    /// Find and parse the End of Central Directory record.
    ///
    /// Tries the no-comment position first (EOCD flush against the end of
    /// the archive), then searches backwards through the maximum comment
    /// window for the signature.
    ///
    /// Returns the EOCD record and its absolute offset.
    pub async fn find_eocd(&self) -> Result<(EndOfCentralDirectory, u64)> {
        if self.size >= EndOfCentralDirectory::SIZE as u64 {
            let offset = self.size - EndOfCentralDirectory::SIZE as u64;
            let mut buf = vec![0u8; EndOfCentralDirectory::SIZE];
            self.reader.read_at(offset, &mut buf).await?;

            // Check for signature and zero-length comment
            if &buf[0..4] == EndOfCentralDirectory::SIGNATURE && &buf[20..22] == b"\x00\x00" {
                let eocd = EndOfCentralDirectory::from_bytes(&buf)?;
                return Ok((eocd, offset));
            }
        }

        // EOCD not at the expected location - there may be an archive
        // comment, so scan backwards for the signature through as much of
        // the tail as the source can serve.
        let (search_start, buf) = self
            .reader
            .read_tail(MAX_COMMENT_SIZE + EndOfCentralDirectory::SIZE as u64)
            .await?;

        for i in (0..buf.len().saturating_sub(EndOfCentralDirectory::SIZE)).rev() {
            if &buf[i..i + 4] == EndOfCentralDirectory::SIGNATURE {
                // A real EOCD's comment length matches the bytes left
                // after the record.
                let comment_len = u16::from_le_bytes([buf[i + 20], buf[i + 21]]) as usize;

                if comment_len == buf.len() - i - EndOfCentralDirectory::SIZE {
                    let eocd =
                        EndOfCentralDirectory::from_bytes(&buf[i..i + EndOfCentralDirectory::SIZE])?;
                    return Ok((eocd, search_start + i as u64));
                }
            }
        }

        Err(Error::MalformedArchive(
            "end of central directory not found".into(),
        ))
    }

    /// Read the ZIP64 End of Central Directory record.
    ///
    /// Called when the regular EOCD carries 0xFFFF/0xFFFFFFFF sentinel
    /// fields. The locator sits immediately before the regular EOCD.
    pub async fn read_zip64_eocd(&self, eocd_offset: u64) -> Result<Zip64EOCD> {
        let locator_offset = eocd_offset - Zip64EOCDLocator::SIZE as u64;
        let mut locator_buf = vec![0u8; Zip64EOCDLocator::SIZE];
        self.reader
            .read_at(locator_offset, &mut locator_buf)
            .await?;

        let locator = Zip64EOCDLocator::from_bytes(&locator_buf)?;

        let mut eocd64_buf = vec![0u8; Zip64EOCD::MIN_SIZE];
        self.reader
            .read_at(locator.eocd64_offset, &mut eocd64_buf)
            .await?;

        Zip64EOCD::from_bytes(&eocd64_buf)
    }

    /// Locate one entry by exact name.
    ///
    /// Walks the central directory front to back and stops at the first
    /// record whose name matches. Fails with [`Error::EntryNotFound`] when
    /// the directory is exhausted without a match.
    pub async fn locate_entry(&self, name: &str) -> Result<EntryDescriptor> {
        let (eocd, eocd_offset) = self.find_eocd().await?;

        let (cd_offset, cd_size, total_entries) = if eocd.is_zip64() {
            let eocd64 = self.read_zip64_eocd(eocd_offset).await?;
            (eocd64.cd_offset, eocd64.cd_size, eocd64.total_entries)
        } else {
            (
                eocd.cd_offset as u64,
                eocd.cd_size as u64,
                eocd.total_entries as u64,
            )
        };

        // One read for the whole central directory; it is small compared
        // to the archive and the trailer fetch already covers it.
        let mut cd_data = vec![0u8; cd_size as usize];
        self.reader.read_at(cd_offset, &mut cd_data).await?;

        let mut cursor = Cursor::new(&cd_data);

        for _ in 0..total_entries {
            let entry = parse_cdfh(&mut cursor)?;
            if entry.name == name {
                return Ok(entry);
            }
        }

        Err(Error::EntryNotFound(name.to_string()))
    }
}

/// Parse a Central Directory File Header at the cursor position, leaving
/// the cursor at the start of the next record.
fn parse_cdfh(cursor: &mut Cursor<&Vec<u8>>) -> Result<EntryDescriptor> {
    // Read and verify the signature (PK\x01\x02)
    let mut sig = [0u8; 4];
    cursor
        .read_exact(&mut sig)
        .map_err(|_| Error::MalformedArchive("truncated central directory".into()))?;
    if sig != CDFH_SIGNATURE {
        return Err(Error::MalformedArchive(
            "invalid central directory file header".into(),
        ));
    }

    let _version_made_by = cursor.read_u16::<LittleEndian>()?;
    let _version_needed = cursor.read_u16::<LittleEndian>()?;
    let flags = cursor.read_u16::<LittleEndian>()?;
    let compression_method = cursor.read_u16::<LittleEndian>()?;
    let _last_mod_time = cursor.read_u16::<LittleEndian>()?;
    let _last_mod_date = cursor.read_u16::<LittleEndian>()?;
    let crc32 = cursor.read_u32::<LittleEndian>()?;
    let mut compressed_size = cursor.read_u32::<LittleEndian>()? as u64;
    let mut uncompressed_size = cursor.read_u32::<LittleEndian>()? as u64;
    let file_name_length = cursor.read_u16::<LittleEndian>()?;
    let extra_field_length = cursor.read_u16::<LittleEndian>()?;
    let file_comment_length = cursor.read_u16::<LittleEndian>()?;
    let _disk_number_start = cursor.read_u16::<LittleEndian>()?;
    let _internal_attrs = cursor.read_u16::<LittleEndian>()?;
    let _external_attrs = cursor.read_u32::<LittleEndian>()?;
    let mut header_offset = cursor.read_u32::<LittleEndian>()? as u64;

    let mut file_name_bytes = vec![0u8; file_name_length as usize];
    cursor
        .read_exact(&mut file_name_bytes)
        .map_err(|_| Error::MalformedArchive("truncated entry name".into()))?;
    // Lossy conversion keeps lookups working for non-UTF8 names
    let name = String::from_utf8_lossy(&file_name_bytes).to_string();

    // ZIP64 extended information lives in extra field ID 0x0001; a field
    // is present only when the 32-bit header value is the sentinel.
    let extra_field_end = cursor.position() + extra_field_length as u64;

    while cursor.position() + 4 <= extra_field_end {
        let header_id = cursor.read_u16::<LittleEndian>()?;
        let field_size = cursor.read_u16::<LittleEndian>()?;

        if header_id == 0x0001 {
            if uncompressed_size == 0xFFFFFFFF && cursor.position() + 8 <= extra_field_end {
                uncompressed_size = cursor.read_u64::<LittleEndian>()?;
            }
            if compressed_size == 0xFFFFFFFF && cursor.position() + 8 <= extra_field_end {
                compressed_size = cursor.read_u64::<LittleEndian>()?;
            }
            if header_offset == 0xFFFFFFFF && cursor.position() + 8 <= extra_field_end {
                header_offset = cursor.read_u64::<LittleEndian>()?;
            }
            // Skip any remaining ZIP64 fields (disk number start)
            let remaining = extra_field_end.saturating_sub(cursor.position());
            cursor.set_position(cursor.position() + remaining);
        } else {
            // Skip unknown extra fields
            cursor.set_position(cursor.position() + field_size as u64);
        }
    }

    cursor.set_position(extra_field_end + file_comment_length as u64);

    Ok(EntryDescriptor {
        name,
        header_offset,
        compressed_size,
        uncompressed_size,
        compression_method: CompressionMethod::from_u16(compression_method),
        flags,
        crc32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eocd_rejects_bad_signature() {
        let mut bytes = vec![0u8; EndOfCentralDirectory::SIZE];
        bytes[0..4].copy_from_slice(b"PK\x07\x08");
        assert!(matches!(
            EndOfCentralDirectory::from_bytes(&bytes).unwrap_err(),
            Error::MalformedArchive(_)
        ));
    }

    #[test]
    fn cdfh_parses_fixed_fields() {
        // Minimal stored-entry record, no extra field or comment
        let name = b"movie0.ts";
        let mut rec = Vec::new();
        rec.extend_from_slice(CDFH_SIGNATURE);
        rec.extend_from_slice(&20u16.to_le_bytes()); // version made by
        rec.extend_from_slice(&20u16.to_le_bytes()); // version needed
        rec.extend_from_slice(&0u16.to_le_bytes()); // flags
        rec.extend_from_slice(&0u16.to_le_bytes()); // method: stored
        rec.extend_from_slice(&0u16.to_le_bytes()); // mod time
        rec.extend_from_slice(&0u16.to_le_bytes()); // mod date
        rec.extend_from_slice(&0xAABBCCDDu32.to_le_bytes()); // crc32
        rec.extend_from_slice(&512u32.to_le_bytes()); // compressed size
        rec.extend_from_slice(&512u32.to_le_bytes()); // uncompressed size
        rec.extend_from_slice(&(name.len() as u16).to_le_bytes());
        rec.extend_from_slice(&0u16.to_le_bytes()); // extra len
        rec.extend_from_slice(&0u16.to_le_bytes()); // comment len
        rec.extend_from_slice(&0u16.to_le_bytes()); // disk number
        rec.extend_from_slice(&0u16.to_le_bytes()); // internal attrs
        rec.extend_from_slice(&0u32.to_le_bytes()); // external attrs
        rec.extend_from_slice(&4096u32.to_le_bytes()); // header offset
        rec.extend_from_slice(name);

        let mut cursor = Cursor::new(&rec);
        let entry = parse_cdfh(&mut cursor).unwrap();
        assert_eq!(entry.name, "movie0.ts");
        assert_eq!(entry.header_offset, 4096);
        assert_eq!(entry.compressed_size, 512);
        assert_eq!(entry.compression_method, CompressionMethod::Stored);
        assert_eq!(entry.crc32, 0xAABBCCDD);
        assert_eq!(cursor.position() as usize, rec.len());
    }

    #[test]
    fn cdfh_rejects_bad_signature() {
        let rec = b"PK\x09\x09garbage".to_vec();
        let mut cursor = Cursor::new(&rec);
        assert!(matches!(
            parse_cdfh(&mut cursor).unwrap_err(),
            Error::MalformedArchive(_)
        ));
    }
}
