//! Exclusive lock serializing concurrent handler invocations.
//!
//! udev may fire several events at once (e.g. add on two interfaces); each
//! spawns its own process. They queue on a `flock` over a fixed path.

use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{NetconfError, Result};

/// Held exclusive lock. Released on drop.
#[derive(Debug)]
pub struct InstanceLock {
    file: File,
    path: PathBuf,
}

impl InstanceLock {
    /// Block until the lock is granted.
    pub fn acquire(path: &Path) -> Result<Self> {
        let file = open(path)?;
        loop {
            match flock(&file, libc::LOCK_EX) {
                Ok(()) => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(lock_error(path, e)),
            }
        }
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    /// Take the lock if it is free; `Ok(None)` when another process holds it.
    pub fn try_acquire(path: &Path) -> Result<Option<Self>> {
        let file = open(path)?;
        loop {
            match flock(&file, libc::LOCK_EX | libc::LOCK_NB) {
                Ok(()) => {
                    return Ok(Some(Self {
                        file,
                        path: path.to_path_buf(),
                    }))
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(None),
                Err(e) => return Err(lock_error(path, e)),
            }
        }
    }

    /// Take the lock without blocking the runtime, waiting behind any
    /// other holder.
    pub async fn acquire_async(path: &Path) -> Result<Self> {
        if let Some(lock) = Self::try_acquire(path)? {
            return Ok(lock);
        }

        info!("another instance holds {}, waiting", path.display());
        let owned = path.to_path_buf();
        tokio::task::spawn_blocking(move || Self::acquire(&owned))
            .await
            .map_err(|e| lock_error(path, io::Error::other(e.to_string())))?
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        let _ = flock(&self.file, libc::LOCK_UN);
    }
}

fn open(path: &Path) -> Result<File> {
    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .map_err(|e| lock_error(path, e))
}

fn flock(file: &File, operation: libc::c_int) -> io::Result<()> {
    let rc = unsafe { libc::flock(file.as_raw_fd(), operation) };
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

fn lock_error(path: &Path, source: io::Error) -> NetconfError {
    NetconfError::Lock {
        path: path.to_path_buf(),
        source,
    }
}
