use thiserror::Error;

/// Errors surfaced by the extraction path.
///
/// Only [`Error::Store`] is transient; everything else signals a bad
/// archive, a bad request, or a stale catalog and must never be retried.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid range layout: {0}")]
    InvalidRangeLayout(String),

    #[error("read of {count} bytes at offset {offset} touches an unmapped region")]
    UnmappedRegion { offset: u64, count: usize },

    #[error("malformed archive: {0}")]
    MalformedArchive(String),

    #[error("entry not found: {0}")]
    EntryNotFound(String),

    #[error(
        "catalog offset {catalog_offset} disagrees with parsed offset {parsed_offset} for entry {entry}"
    )]
    CatalogInconsistency {
        entry: String,
        catalog_offset: u64,
        parsed_offset: u64,
    },

    #[error("local file header mismatch: {0}")]
    HeaderMismatch(String),

    #[error("segment decryption failed")]
    DecryptionFailed,

    #[error("store error: {0}")]
    Store(#[source] anyhow::Error),

    #[error("catalog error: {0}")]
    Catalog(#[source] anyhow::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether a retry can possibly succeed. Transport failures are the
    /// only transient kind; layout/parse/crypto errors are deterministic.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Store(_))
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Store(e.into())
    }
}

// Convenient crate-wide result type
pub type Result<T> = std::result::Result<T, Error>;
