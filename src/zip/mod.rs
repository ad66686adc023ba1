//! ZIP archive index parsing and entry extraction.
//!
//! A ZIP file consists of:
//! 1. Local file headers and payload data for each entry
//! 2. Central Directory with metadata for all entries
//! 3. End of Central Directory (EOCD) record at the end
//!
//! This implementation reads the EOCD first (from the end of the logical
//! length), then the Central Directory, then exactly one entry's local
//! header and payload. All reads go through [`ReadAt`](crate::io::ReadAt),
//! so the same code runs over a fully materialized file or a sparse
//! three-range view of a remote archive.
//!
//! Intentionally a subset of the format: a general-purpose archive
//! library assumes whole-file access, which is the one thing this crate
//! cannot afford.
//!
//! ## Supported
//!
//! - Standard ZIP format (PKZIP APPNOTE 6.3.x compatible)
//! - ZIP64 extensions for archives > 4GB
//! - STORED and DEFLATE entries, sealed per [`crate::crypto`]
//!
//! ## Not supported
//!
//! - Multi-disk archives
//! - ZipCrypto/AE-x entry encryption (entries are sealed above the ZIP
//!   layer instead)
//! - BZIP2, LZMA, or other compression methods

mod extractor;
mod parser;
mod structures;

pub use extractor::SegmentExtractor;
pub use parser::ZipParser;
pub use structures::*;
