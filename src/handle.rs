use std::os::fd::BorrowedFd;

use super::*;

/// A descriptor to lock, borrowed from whoever opened it.
///
/// Nothing here opens, closes or duplicates the descriptor, and no lock state is kept: the kernel
/// is the only thing that knows whether a lock is held. The caller keeps the descriptor open for as
/// long as it uses the handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LockHandle(RawFd);

impl LockHandle {
    pub const fn new(fd: RawFd) -> Self {
        Self(fd)
    }

    /// The handle for an open file (or anything else with a descriptor).
    pub fn of(file: &impl AsRawFd) -> Self {
        Self(file.as_raw_fd())
    }

    pub const fn raw(self) -> RawFd {
        self.0
    }

    pub const fn is_valid(self) -> bool {
        self.0 >= 0
    }

    pub(crate) fn checked(self) -> LockResult<RawFd> {
        if self.is_valid() {
            Ok(self.0)
        } else {
            Err(LockError::InvalidHandle)
        }
    }
}

impl From<RawFd> for LockHandle {
    fn from(fd: RawFd) -> Self {
        Self(fd)
    }
}

impl From<BorrowedFd<'_>> for LockHandle {
    fn from(fd: BorrowedFd<'_>) -> Self {
        Self::of(&fd)
    }
}

impl std::fmt::Display for LockHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "fd {}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test;

    #[test]
    fn negative_descriptors_are_invalid() {
        for fd in [-1, -2, RawFd::MIN] {
            let handle = LockHandle::new(fd);
            assert!(!handle.is_valid());
            assert_eq!(handle.checked(), Err(LockError::InvalidHandle));
        }
        assert_eq!(LockHandle::from(0).checked(), Ok(0));
    }

    #[test]
    fn handle_of_file() -> anyhow::Result<()> {
        let file = tempfile::tempfile()?;
        let handle = LockHandle::of(&file);
        assert_eq!(handle.raw(), file.as_raw_fd());
        assert_eq!(handle, LockHandle::from(std::os::fd::AsFd::as_fd(&file)));
        Ok(())
    }
}
