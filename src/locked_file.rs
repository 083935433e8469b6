use std::io::Write;

use super::*;

/// A file that's exclusively locked for as long as this value lives.
///
/// Meant for the data file a server writes to: open it with [`create`](Self::create) at startup,
/// fail if another instance has it, write through it, and [`unlock`](Self::unlock) when done.
/// Dropping it also releases the lock, but a failure there can only be logged.
#[derive(Debug)]
pub struct LockedFile {
    inner: File,
    path: PathBuf,
    locked: bool,
}

impl LockedFile {
    /// Opens (creating if necessary) `path` and takes the lock without waiting. Fails with a
    /// [`LockError::WouldBlock`] lock error if someone else holds it.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = open_for_locking(path)?;
        Self::from_file(file, path.to_owned())
    }

    /// Like [`create`](Self::create) but waits for the lock.
    pub fn create_blocking(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = open_for_locking(path)?;
        Self::lock_with(file, path.to_owned(), acquire_exclusive)
    }

    /// Takes ownership of an open file and locks it without waiting.
    ///
    /// The file must be open for writing when the record strategy is compiled in, otherwise
    /// locking fails with `EBADF`.
    pub fn from_file(file: File, path: PathBuf) -> Result<Self> {
        Self::lock_with(file, path, try_acquire_exclusive)
    }

    fn lock_with(file: File, path: PathBuf, lock: fn(LockHandle) -> LockResult) -> Result<Self> {
        if let Err(source) = lock(LockHandle::of(&file)) {
            return Err(Error::Lock { path, source });
        }
        debug!("locked {:?}", path);
        Ok(Self {
            inner: file,
            path,
            locked: true,
        })
    }

    pub fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_all(bytes)?;
        Ok(())
    }

    /// Flushes written data and metadata to disk.
    pub fn sync(&self) -> Result<()> {
        self.inner.sync_all()?;
        Ok(())
    }

    pub fn file(&self) -> &File {
        &self.inner
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn handle(&self) -> LockHandle {
        LockHandle::of(&self.inner)
    }

    /// Releases the lock and closes the file, returning any error instead of logging it.
    pub fn unlock(mut self) -> Result<()> {
        self.locked = false;
        release(self.handle()).map_err(|source| Error::Lock {
            path: self.path.clone(),
            source,
        })
    }
}

impl Drop for LockedFile {
    fn drop(&mut self) {
        if !self.locked {
            return;
        }
        match release(self.handle()) {
            Ok(()) => debug!("released lock on {:?}", self.path),
            Err(err) => log::error!("releasing lock on {:?}: {}", self.path, err),
        }
    }
}

fn open_for_locking(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(path)
        .map_err(|source| Error::Open {
            path: path.to_owned(),
            source,
        })
}
