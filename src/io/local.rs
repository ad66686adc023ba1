use async_trait::async_trait;
use std::path::PathBuf;

use super::store::RangeStore;
use crate::catalog::ArchiveLocation;
use crate::error::{Error, Result};

/// Range store over a local directory tree, mainly for development and
/// archives that have not been uploaded yet. Objects live at
/// `{root}/{bucket}/{key}`.
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn object_path(&self, location: &ArchiveLocation) -> PathBuf {
        self.root.join(&location.bucket).join(&location.key)
    }
}

#[async_trait]
impl RangeStore for LocalObjectStore {
    async fn fetch_range(
        &self,
        location: &ArchiveLocation,
        start: u64,
        end_inclusive: u64,
    ) -> Result<Vec<u8>> {
        let path = self.object_path(location);
        let len = (end_inclusive - start + 1) as usize;
        let mut buf = vec![0u8; len];

        let file = std::fs::File::open(&path)
            .map_err(|e| Error::Store(anyhow::anyhow!("open {}: {e}", path.display())))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::FileExt;
            file.read_exact_at(&mut buf, start)
                .map_err(|e| Error::Store(anyhow::anyhow!("read {}: {e}", path.display())))?;
        }

        #[cfg(not(unix))]
        {
            use std::io::{Read, Seek, SeekFrom};
            let mut file = file;
            file.seek(SeekFrom::Start(start))
                .and_then(|_| file.read_exact(&mut buf))
                .map_err(|e| Error::Store(anyhow::anyhow!("read {}: {e}", path.display())))?;
        }

        Ok(buf)
    }
}
