//! Exclusive writer lock for a snapshot file.
//!
//! Held for the lifetime of a writable [`crate::MemoryStore`] on a sibling
//! `<snapshot>.lock` file, so two processes never rewrite the same snapshot
//! from diverging working sets.

use std::path::Path;

use crate::StoreError;

#[cfg(unix)]
pub(crate) struct SnapshotLock {
    _flock: nix::fcntl::Flock<std::fs::File>,
}

#[cfg(unix)]
impl SnapshotLock {
    pub(crate) fn acquire(snapshot: &Path) -> Result<Self, StoreError> {
        use nix::errno::Errno;
        use nix::fcntl::{Flock, FlockArg};

        let lock_path = lock_path(snapshot);
        let io_err = |source| StoreError::Io {
            path: lock_path.clone(),
            source,
        };

        if let Some(parent) = lock_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(io_err)?;

        match Flock::lock(file, FlockArg::LockExclusiveNonblock) {
            Ok(flock) => {
                tracing::debug!(path = %lock_path.display(), "store: snapshot lock acquired");
                Ok(Self { _flock: flock })
            }
            Err((_, errno)) if errno == Errno::EWOULDBLOCK => Err(StoreError::Locked {
                path: snapshot.to_path_buf(),
            }),
            Err((_, errno)) => Err(io_err(std::io::Error::from(errno))),
        }
    }
}

#[cfg(not(unix))]
pub(crate) struct SnapshotLock;

#[cfg(not(unix))]
impl SnapshotLock {
    pub(crate) fn acquire(_snapshot: &Path) -> Result<Self, StoreError> {
        Ok(Self)
    }
}

#[cfg(unix)]
fn lock_path(snapshot: &Path) -> std::path::PathBuf {
    let mut path = snapshot.as_os_str().to_owned();
    path.push(".lock");
    path.into()
}
