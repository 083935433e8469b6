//! The two kernel lock mechanisms, and the choice between them for this target.

use std::fmt::{self, Display, Formatter};

use cfg_if::cfg_if;
use nix::errno::Errno;

use super::*;

#[cfg(not(any(
    target_os = "solaris",
    target_os = "illumos",
    target_os = "aix",
    target_os = "redox"
)))]
mod flock;
mod record;

#[cfg(not(any(
    target_os = "solaris",
    target_os = "illumos",
    target_os = "aix",
    target_os = "redox"
)))]
pub use self::flock::WholeFileLock;
pub use self::record::RecordLock;

cfg_if! {
    if #[cfg(advlock_record_lock)] {
        /// The strategy the dispatch functions use on this target.
        pub type PlatformLock = RecordLock;
    } else {
        /// The strategy the dispatch functions use on this target.
        pub type PlatformLock = WholeFileLock;
    }
}

/// An exclusive whole-file lock implemented with one kind of kernel call.
///
/// Implementations issue exactly one syscall per method and return the raw errno. Deciding which
/// errno means "someone else has it" is left to [`is_contended`](Self::is_contended) since the two
/// mechanisms don't agree.
pub trait LockStrategy {
    const STRATEGY: Strategy;

    /// Waits until the lock is ours.
    fn lock(fd: RawFd) -> nix::Result<()>;

    /// Takes the lock if it's free right now.
    fn try_lock(fd: RawFd) -> nix::Result<()>;

    /// Drops the lock. Succeeds when there was nothing to drop.
    fn unlock(fd: RawFd) -> nix::Result<()>;

    /// Whether `errno` from [`try_lock`](Self::try_lock) means the lock is held elsewhere.
    fn is_contended(errno: Errno) -> bool;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// `flock(2)`. Locks belong to the open file description.
    WholeFile,
    /// `fcntl(2)` over `[0, EOF)`. Locks belong to the process, so two threads or two opens in the
    /// same process both "get" the lock, and closing any descriptor to the file releases it.
    Record,
}

impl Strategy {
    pub const PLATFORM: Strategy = PlatformLock::STRATEGY;

    pub fn scope(self) -> LockScope {
        match self {
            Self::WholeFile => LockScope::OpenFileDescription,
            Self::Record => LockScope::Process,
        }
    }

    /// Whether closing an unrelated descriptor to the same file drops the lock.
    pub fn released_by_any_close(self) -> bool {
        self.scope() == LockScope::Process
    }
}

impl Display for Strategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::WholeFile => "flock",
            Self::Record => "fcntl",
        })
    }
}

/// Who the kernel considers to be holding a lock.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LockScope {
    OpenFileDescription,
    Process,
}

impl Display for LockScope {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::OpenFileDescription => "open file description",
            Self::Process => "process",
        })
    }
}
