use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "reelvault")]
#[command(version)]
#[command(about = "Fetch one encrypted segment from a remote ZIP archive", long_about = None)]
#[command(after_help = "Examples:\n  \
  reelvault https://store.example.com -b movies -k matrix.zip -m tt0133093 -s 3 \\\n      \
      --total-len 1048576 --trailer 1048000:576 --entry 512000:16384 \\\n      \
      --key-hex $(cat matrix.key) -o segment3.ts\n  \
  reelvault /var/lib/reelvault -b movies -k matrix.zip -m tt0133093 -s 0 \\\n      \
      --total-len 1048576 --trailer 1048000:576 --entry 4096:32768 \\\n      \
      --key-hex $(cat matrix.key) | mpv -")]
pub struct Cli {
    /// Object store endpoint URL, or a local store root directory
    #[arg(value_name = "STORE")]
    pub store: String,

    /// Store bucket holding the archive
    #[arg(short = 'b', long)]
    pub bucket: String,

    /// Object key of the archive
    #[arg(short = 'k', long)]
    pub key: String,

    /// Movie identifier
    #[arg(short = 'm', long)]
    pub movie: String,

    /// Segment index to fetch
    #[arg(short = 's', long)]
    pub segment: u32,

    /// Total archive length in bytes, as recorded at import time
    #[arg(long)]
    pub total_len: u64,

    /// Central-directory trailer span as offset:length
    #[arg(long, value_parser = parse_span)]
    pub trailer: (u64, u64),

    /// Entry span (local header + payload) as offset:length
    #[arg(long, value_parser = parse_span)]
    pub entry: (u64, u64),

    /// Hex-encoded 32-byte segment key
    #[arg(long, value_name = "HEX")]
    pub key_hex: String,

    /// Write the segment here instead of stdout
    #[arg(short = 'o', value_name = "FILE")]
    pub output: Option<String>,

    /// Skip the catalog-vs-archive offset cross-check
    #[arg(long)]
    pub no_verify_offsets: bool,

    /// Quiet mode (no transfer summary)
    #[arg(short = 'q')]
    pub quiet: bool,
}

impl Cli {
    pub fn is_http_store(&self) -> bool {
        self.store.starts_with("http://") || self.store.starts_with("https://")
    }
}

/// Parse an `offset:length` pair.
fn parse_span(s: &str) -> Result<(u64, u64), String> {
    let (offset, length) = s
        .split_once(':')
        .ok_or_else(|| format!("expected offset:length, got {s}"))?;
    let offset = offset.parse().map_err(|_| format!("bad offset in {s}"))?;
    let length = length.parse().map_err(|_| format!("bad length in {s}"))?;
    if length == 0 {
        return Err(format!("zero length in {s}"));
    }
    Ok((offset, length))
}
