//! Main entry point for the reelvault CLI.
//!
//! Fetches one encrypted segment out of a remote (or local) archive using
//! the import-time index numbers passed on the command line, and writes
//! the decrypted transport stream to a file or stdout. Useful for
//! spot-checking archives and debugging catalog entries without running
//! the full streaming service.

use anyhow::Result;
use clap::Parser;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use reelvault::catalog::{ArchiveLocation, MovieId, MovieRecord, StaticCatalog};
use reelvault::crypto::SegmentKey;
use reelvault::io::{HttpObjectStore, LocalObjectStore, RangeStore};
use reelvault::segment::{SegmentService, segment_entry_name};
use reelvault::{Cli, OffsetLength};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if cli.is_http_store() {
        let store = Arc::new(HttpObjectStore::new(cli.store.clone())?);
        let written = fetch_segment(store.clone(), &cli).await?;

        if !cli.quiet {
            eprintln!(
                "{} bytes written, {} bytes transferred",
                written,
                store.transferred_bytes()
            );
        }
    } else {
        let store = Arc::new(LocalObjectStore::new(PathBuf::from(&cli.store)));
        let written = fetch_segment(store, &cli).await?;

        if !cli.quiet {
            eprintln!("{} bytes written", written);
        }
    }

    Ok(())
}

/// Build a one-movie catalog from the CLI's index numbers and run the
/// segment read against it.
async fn fetch_segment<S: RangeStore + 'static>(store: Arc<S>, cli: &Cli) -> Result<u64> {
    let movie = MovieId::new(cli.movie.clone());
    let location = ArchiveLocation::new(cli.bucket.clone(), cli.key.clone());
    let entry_name = segment_entry_name(cli.segment);
    let key = SegmentKey::from_hex(&cli.key_hex)?;

    let mut catalog = StaticCatalog::new();
    catalog.insert(
        movie.clone(),
        MovieRecord {
            location: location.clone(),
            total_len: cli.total_len,
            trailer: OffsetLength::new(cli.trailer.0, cli.trailer.1),
            entries: HashMap::from([(
                entry_name,
                OffsetLength::new(cli.entry.0, cli.entry.1),
            )]),
            manifest: Vec::new(),
        },
    );

    let mut service = SegmentService::new(store, Arc::new(catalog));
    if cli.no_verify_offsets {
        service = service.without_offset_verification();
    }

    let written = match &cli.output {
        Some(path) => {
            let mut file = tokio::fs::File::create(path).await?;
            service
                .read_segment(&movie, cli.segment, &location, &key, &mut file)
                .await?
        }
        None => {
            let mut stdout = tokio::io::stdout();
            service
                .read_segment(&movie, cli.segment, &location, &key, &mut stdout)
                .await?
        }
    };

    Ok(written)
}
