//! Per-statistic run locks via fd-lock.
//!
//! One lock file per statistic under the lock directory. Acquisition is
//! non-blocking: a held lock fails fast with [`FillError::Locked`].

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use fd_lock::RwLock;
use tracing::debug;

use tally_core::errors::{FillError, FillResult};

pub struct RunLock {
    dir: PathBuf,
}

impl RunLock {
    /// Creates `dir` if it does not exist.
    pub fn new(dir: &Path) -> FillResult<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Lock file for `property`. Characters outside `[A-Za-z0-9_-]` become `_`.
    pub fn path_for(&self, property: &str) -> PathBuf {
        let name: String = property
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{name}.lock"))
    }

    /// Run `f` while holding the exclusive lock for `property`.
    pub fn with_exclusive<T, F>(&self, property: &str, f: F) -> FillResult<T>
    where
        F: FnOnce() -> FillResult<T>,
    {
        let path = self.path_for(property);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)?;
        let mut lock = RwLock::new(file);
        let _guard = lock.try_write().map_err(|e| FillError::Locked {
            property: property.to_string(),
            message: format!("another run holds {}: {e}", path.display()),
        })?;
        debug!(property, lock = %path.display(), "acquired run lock");
        f()
    }
}
