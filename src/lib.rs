//! # reelvault
//!
//! Serves encrypted HLS segments out of remote ZIP archives using HTTP
//! Range requests.
//!
//! Each movie's transport-stream segments are stored, sealed with
//! XChaCha20-Poly1305, as entries of one large ZIP object in object
//! storage. Archives can be gigabytes, so nothing here ever downloads one:
//! a request fetches exactly three byte ranges (a 4-byte signature probe,
//! the central-directory trailer, and the target entry's span), assembles
//! them into a sparse random-access view, parses just enough ZIP structure
//! to locate the entry, and decrypts its payload into the caller's sink.
//! The byte spans themselves are precomputed by an external import process
//! and supplied through the [`catalog::Catalog`] boundary.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use reelvault::catalog::{ArchiveLocation, MovieId, StaticCatalog};
//! use reelvault::crypto::SegmentKey;
//! use reelvault::io::HttpObjectStore;
//! use reelvault::segment::SegmentService;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = Arc::new(HttpObjectStore::new("https://store.example.com".into())?);
//!     let catalog = Arc::new(StaticCatalog::new());
//!     let service = SegmentService::new(store, catalog);
//!
//!     let key = SegmentKey::from_hex("11".repeat(32).as_str())?;
//!     let location = ArchiveLocation::new("movies", "tt0133093.zip");
//!     let mut sink = tokio::io::stdout();
//!     service
//!         .read_segment(&MovieId::new("tt0133093"), 3, &location, &key, &mut sink)
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod cli;
pub mod crypto;
pub mod error;
pub mod io;
pub mod retry;
pub mod segment;
pub mod zip;

pub use catalog::{ArchiveLocation, Catalog, MovieId, OffsetLength, StaticCatalog};
pub use cli::Cli;
pub use crypto::SegmentKey;
pub use error::{Error, Result};
pub use io::{HttpObjectStore, LocalObjectStore, MaterializedRange, RangeStore, ReadAt, SparseReader};
pub use segment::{SegmentService, segment_entry_name};
