//! Request-time variant cache.
//!
//! Rendering on every preview request would make a page of thumbnails take
//! seconds. The proxy instead keeps each rendered variant on disk and reuses
//! it until its source image changes.
//!
//! # Layout
//!
//! The cache root mirrors the logical variant paths of the source tree:
//!
//! ```text
//! tmp/thumbnail-cache/
//! └── images/
//!     ├── cat-thumb.png
//!     └── blog/
//!         └── dog-large.jpg
//! ```
//!
//! # Validity
//!
//! An entry is valid when its modification time *equals* the modification
//! time of the source image it was rendered from. After every successful
//! store the entry's mtime is stamped to the source's. Editing the source
//! advances its mtime and silently invalidates every variant derived from
//! it, with no hashing and no dependency bookkeeping.
//!
//! # Atomic stores
//!
//! Bytes go to a temporary file in the entry's own directory, which is then
//! renamed over the entry, and only then is the mtime stamped. A reader can
//! observe an entry with fresh content and a stale stamp, which is just
//! another miss, but never a stamped entry with partial content. Two requests
//! racing on the same stale entry may both render; the last rename wins and
//! both are valid.

use std::fmt;
use std::fs::{self, File, FileTimes};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::SystemTime;
use tempfile::NamedTempFile;

/// Where a variant came from when it was served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Regenerated,
}

impl fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hit => f.write_str("cached"),
            Self::Regenerated => f.write_str("rendered"),
        }
    }
}

/// The cache root directory.
#[derive(Debug, Clone)]
pub struct CacheDir {
    root: PathBuf,
}

impl CacheDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Entry path for a logical variant path.
    pub fn entry_path(&self, logical: &Path) -> PathBuf {
        self.root.join(logical)
    }

    /// Read an entry if it was stamped with exactly `source_mtime`.
    ///
    /// Missing entries and stale stamps are `Ok(None)`. The stamp and the
    /// bytes are read through the same handle, so a concurrent rename cannot
    /// pair one entry's stamp with another's content.
    pub fn read_fresh(
        &self,
        entry: &Path,
        source_mtime: SystemTime,
    ) -> io::Result<Option<Vec<u8>>> {
        let mut file = match File::open(entry) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        let meta = file.metadata()?;
        if !meta.is_file() || meta.modified()? != source_mtime {
            return Ok(None);
        }
        let mut bytes = Vec::with_capacity(meta.len() as usize);
        file.read_to_end(&mut bytes)?;
        Ok(Some(bytes))
    }

    /// Atomically replace `entry` with `bytes`, then stamp it with
    /// `source_mtime`. The entry's parent directory must exist.
    pub fn store(&self, entry: &Path, bytes: &[u8], source_mtime: SystemTime) -> io::Result<()> {
        let dir = entry.parent().unwrap_or(&self.root);
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        let file = tmp.persist(entry).map_err(|e| e.error)?;
        stamp_file(&file, source_mtime)
    }
}

/// Modification time of a file.
pub fn modified_time(path: &Path) -> io::Result<SystemTime> {
    fs::metadata(path)?.modified()
}

/// Force a file's access and modification times to `time`.
fn stamp_file(file: &File, time: SystemTime) -> io::Result<()> {
    file.set_times(FileTimes::new().set_accessed(time).set_modified(time))
}

/// Request counters, shared by all server workers.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU32,
    regenerated: AtomicU32,
    passed_through: AtomicU32,
}

impl CacheStats {
    pub fn record(&self, status: CacheStatus) {
        let counter = match status {
            CacheStatus::Hit => &self.hits,
            CacheStatus::Regenerated => &self.regenerated,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn pass_through(&self) {
        self.passed_through.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CacheCounts {
        CacheCounts {
            hits: self.hits.load(Ordering::Relaxed),
            regenerated: self.regenerated.load(Ordering::Relaxed),
            passed_through: self.passed_through.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`CacheStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheCounts {
    pub hits: u32,
    pub regenerated: u32,
    pub passed_through: u32,
}

impl CacheCounts {
    /// Variant requests served, hits plus renders.
    pub fn variants(&self) -> u32 {
        self.hits + self.regenerated
    }
}

impl fmt::Display for CacheCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hits > 0 {
            write!(
                f,
                "{} cached, {} rendered ({} total)",
                self.hits,
                self.regenerated,
                self.variants()
            )?;
        } else {
            write!(f, "{} rendered", self.regenerated)?;
        }
        if self.passed_through > 0 {
            write!(f, ", {} passed through", self.passed_through)?;
        }
        Ok(())
    }
}
