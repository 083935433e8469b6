//! Whole-file locks with BSD `flock(2)`.

use nix::fcntl::FlockArg::{self, *};

use super::*;

pub struct WholeFileLock;

fn flock(fd: RawFd, arg: FlockArg) -> nix::Result<()> {
    nix::fcntl::flock(fd, arg)
}

impl LockStrategy for WholeFileLock {
    const STRATEGY: Strategy = Strategy::WholeFile;

    fn lock(fd: RawFd) -> nix::Result<()> {
        flock(fd, LockExclusive)
    }

    fn try_lock(fd: RawFd) -> nix::Result<()> {
        flock(fd, LockExclusiveNonblock)
    }

    fn unlock(fd: RawFd) -> nix::Result<()> {
        flock(fd, Unlock)
    }

    fn is_contended(errno: Errno) -> bool {
        errno == Errno::EWOULDBLOCK
    }
}
