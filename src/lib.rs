//! Exclusive advisory locks on open files, for keeping a second writer away from on-disk data.
//!
//! Two kernel mechanisms can do this and they disagree about who owns a lock. `flock(2)` ties the
//! lock to the open file description, so `dup`ed descriptors share it and a second `open` of the
//! same file in the same process conflicts with it. `fcntl(2)` record locks belong to the process:
//! separate opens in one process never conflict, and closing *any* descriptor to the file drops the
//! process's lock. One of them is compiled in per target, see [`Strategy::PLATFORM`]. Processes
//! using different strategies can't see each other's locks, so don't mix builds over the same data.
//!
//! Record locks also need a descriptor opened for writing: an exclusive `fcntl` lock on a read-only
//! descriptor fails with `EBADF`, where `flock` would succeed. Open lock files read-write so either
//! build works.
//!
//! Only unix targets are supported. There is no Windows (`LockFileEx`) implementation, since locks
//! here are addressed by POSIX file descriptors.

#[cfg(not(unix))]
compile_error!("advlock locks POSIX file descriptors and only builds for unix targets");

use std::fs::{File, OpenOptions};
use std::io;
use std::os::fd::{AsRawFd, RawFd};
use std::path::{Path, PathBuf};

use log::debug;

mod error;
mod file_lock;
mod handle;
mod locked_file;
pub mod sys;
#[cfg(test)]
mod testing;

pub use error::{Error, LockError, LockResult};
pub use file_lock::*;
pub use handle::LockHandle;
pub use locked_file::LockedFile;
pub use sys::{LockScope, Strategy};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
use test_log::test;
