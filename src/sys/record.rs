//! Whole-file locks with POSIX `fcntl(2)` record locks.
//!
//! The record always starts at offset 0 with length 0, which POSIX defines as "to the end of the
//! file, however far it grows". Record locks are owned by the process: they never conflict with
//! other descriptors in the same process, they aren't inherited across fork, and closing any
//! descriptor to the file drops every record lock the process holds on it.
//!
//! An exclusive record lock needs the descriptor to be open for writing, otherwise it's `EBADF`.

use std::mem;

use nix::fcntl::FcntlArg;

use super::*;

pub struct RecordLock;

fn entire_file(l_type: libc::c_int) -> libc::flock {
    // Zeroed because some platforms carry extra fields (l_sysid on the BSDs).
    let mut flock: libc::flock = unsafe { mem::zeroed() };
    flock.l_type = l_type as libc::c_short;
    flock.l_whence = libc::SEEK_SET as libc::c_short;
    flock.l_start = 0;
    flock.l_len = 0;
    flock
}

fn fcntl(fd: RawFd, arg: FcntlArg) -> nix::Result<()> {
    nix::fcntl::fcntl(fd, arg).map(|_| ())
}

impl LockStrategy for RecordLock {
    const STRATEGY: Strategy = Strategy::Record;

    fn lock(fd: RawFd) -> nix::Result<()> {
        let flock = entire_file(libc::F_WRLCK as libc::c_int);
        fcntl(fd, FcntlArg::F_SETLKW(&flock))
    }

    fn try_lock(fd: RawFd) -> nix::Result<()> {
        let flock = entire_file(libc::F_WRLCK as libc::c_int);
        fcntl(fd, FcntlArg::F_SETLK(&flock))
    }

    fn unlock(fd: RawFd) -> nix::Result<()> {
        let flock = entire_file(libc::F_UNLCK as libc::c_int);
        fcntl(fd, FcntlArg::F_SETLK(&flock))
    }

    /// POSIX lets a conflicting F_SETLK fail with either EACCES or EAGAIN.
    fn is_contended(errno: Errno) -> bool {
        matches!(errno, Errno::EAGAIN | Errno::EACCES)
    }
}
