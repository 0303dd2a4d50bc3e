//! Exclusive working-tree lock.
//!
//! A deployment takes a non-blocking exclusive lock on a lock file that
//! records the holder's PID. A second invocation against the same working
//! tree fails fast with [`LockError::Held`] instead of racing the first.
//!
//! The file outlives the lock. Removing it on release would let a waiter
//! lock the unlinked inode while a newcomer locks a fresh file at the same
//! path.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::debug;

use crate::error::LockError;

/// Held for the lifetime of a deployment run; unlocked on drop.
#[derive(Debug)]
pub struct WorkTreeLock {
    file: File,
    path: PathBuf,
}

impl WorkTreeLock {
    /// Try to take the lock at `path` without waiting.
    pub fn acquire(path: &Path) -> Result<Self, LockError> {
        let io_err = |source| LockError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(io_err)?;

        if file.try_lock_exclusive().is_err() {
            let mut holder = String::new();
            let _ = file.read_to_string(&mut holder);
            let holder = match holder.trim() {
                "" => String::new(),
                pid => format!(", pid {pid}"),
            };
            return Err(LockError::Held {
                path: path.to_path_buf(),
                holder,
            });
        }

        file.set_len(0).map_err(io_err)?;
        file.seek(SeekFrom::Start(0)).map_err(io_err)?;
        write!(file, "{}", std::process::id()).map_err(io_err)?;
        file.flush().map_err(io_err)?;

        debug!(path = %path.display(), pid = std::process::id(), "acquired work-tree lock");
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for WorkTreeLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
        debug!(path = %self.path.display(), "released work-tree lock");
    }
}
