use nix::errno::Errno;
use thiserror::Error;

use super::*;

/// Outcome of a single lock operation.
pub type LockResult<T = ()> = std::result::Result<T, LockError>;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockError {
    /// The descriptor was negative. Nothing was asked of the OS.
    #[error("invalid file descriptor")]
    InvalidHandle,
    /// Another holder has the lock. Only the non-blocking operations report this.
    #[error("file is locked by another holder")]
    WouldBlock,
    /// Anything else the OS reported, with the raw errno untouched.
    #[error("{}", os_error(.0))]
    Os(i32),
}

fn os_error(code: &i32) -> io::Error {
    io::Error::from_raw_os_error(*code)
}

impl LockError {
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            Self::Os(code) => Some(*code),
            _ => None,
        }
    }

    pub fn is_would_block(&self) -> bool {
        matches!(self, Self::WouldBlock)
    }
}

impl From<Errno> for LockError {
    fn from(errno: Errno) -> Self {
        Self::Os(errno as i32)
    }
}

impl From<LockError> for io::Error {
    fn from(err: LockError) -> Self {
        match err {
            LockError::InvalidHandle => io::Error::from_raw_os_error(libc::EBADF),
            LockError::WouldBlock => io::Error::from_raw_os_error(libc::EWOULDBLOCK),
            LockError::Os(code) => io::Error::from_raw_os_error(code),
        }
    }
}

/// Errors from [`LockedFile`], which opens files as well as locking them.
#[derive(Error, Debug)]
pub enum Error {
    #[error("opening {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("locking {path:?}: {source}")]
    Lock {
        path: PathBuf,
        #[source]
        source: LockError,
    },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// The lock error, if this was a failure to lock rather than to open or write.
    pub fn lock_error(&self) -> Option<LockError> {
        match self {
            Self::Lock { source, .. } => Some(*source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test;

    #[test]
    fn os_error_keeps_raw_code() {
        let err = LockError::from(Errno::ENOLCK);
        assert_eq!(err, LockError::Os(libc::ENOLCK));
        assert_eq!(err.raw_os_error(), Some(libc::ENOLCK));
        assert_eq!(
            err.to_string(),
            io::Error::from_raw_os_error(libc::ENOLCK).to_string()
        );
        assert_eq!(LockError::WouldBlock.raw_os_error(), None);
    }

    #[test]
    fn into_io_error() {
        let io_err: io::Error = LockError::WouldBlock.into();
        assert_eq!(io_err.kind(), io::ErrorKind::WouldBlock);
        let io_err: io::Error = LockError::InvalidHandle.into();
        assert_eq!(io_err.raw_os_error(), Some(libc::EBADF));
        let io_err: io::Error = LockError::Os(libc::EINTR).into();
        assert_eq!(io_err.kind(), io::ErrorKind::Interrupted);
    }
}
