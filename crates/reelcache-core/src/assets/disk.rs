use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use bytes::Bytes;
use tracing::warn;

/// Unbounded on-disk tier, one file per resolved URL.
///
/// Every `clear` starts a new generation. Writes carry the generation they
/// were scheduled in and are dropped if a clear happened since, so nothing
/// fetched before a clear can reappear after it.
pub(crate) struct DiskTier {
    dir: PathBuf,
    generation: AtomicU64,
    io_lock: Mutex<()>,
}

impl DiskTier {
    pub(crate) fn new(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            generation: AtomicU64::new(0),
            io_lock: Mutex::new(()),
        })
    }

    pub(crate) fn dir(&self) -> &Path {
        &self.dir
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub(crate) fn path_for(&self, url: &str) -> PathBuf {
        self.dir.join(blake3::hash(url.as_bytes()).to_hex().as_str())
    }

    pub(crate) async fn read(&self, url: &str) -> Option<Bytes> {
        let path = self.path_for(url);
        match tokio::fs::read(&path).await {
            Ok(contents) => Some(Bytes::from(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(url, path = %path.display(), error = %e, "Failed to read cached asset");
                None
            }
        }
    }

    /// Blocking write. Returns `Ok(false)` when skipped because the tier was
    /// cleared after `generation`.
    pub(crate) fn write(&self, url: &str, bytes: &[u8], generation: u64) -> io::Result<bool> {
        let _guard = self.io_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if self.generation() != generation {
            return Ok(false);
        }
        let path = self.path_for(url);
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, bytes)?;
        std::fs::rename(&tmp, &path)?;
        Ok(true)
    }

    pub(crate) fn remove(&self, url: &str) {
        let path = self.path_for(url);
        if let Err(e) = std::fs::remove_file(&path) {
            if e.kind() != io::ErrorKind::NotFound {
                warn!(url, error = %e, "Failed to remove cached asset");
            }
        }
    }

    /// Delete the whole directory and recreate it empty.
    pub(crate) fn clear(&self) -> io::Result<()> {
        let _guard = self.io_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.generation.fetch_add(1, Ordering::SeqCst);
        match std::fs::remove_dir_all(&self.dir) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        std::fs::create_dir_all(&self.dir)
    }
}
