//! Exclusive lock operations over the platform strategy.
//!
//! Each call validates the handle, makes one kernel call and maps the result. Nothing is retried,
//! and a blocking acquire can block forever: use [`acquire_exclusive_timeout`] or poll
//! [`try_acquire_exclusive`] if that's not acceptable.

use std::cmp::min;
use std::thread::sleep;
use std::time::{Duration, Instant};

use tracing::trace;

use super::*;
use crate::sys::{LockStrategy, PlatformLock};

const MIN_BACKOFF: Duration = Duration::from_millis(1);
const MAX_BACKOFF: Duration = Duration::from_millis(100);

/// Blocks until this handle holds the exclusive lock on its file.
pub fn acquire_exclusive(handle: LockHandle) -> LockResult {
    acquire_exclusive_with::<PlatformLock>(handle)
}

/// Takes the exclusive lock if nobody else has it, otherwise fails with
/// [`LockError::WouldBlock`]. Never waits.
pub fn try_acquire_exclusive(handle: LockHandle) -> LockResult {
    try_acquire_exclusive_with::<PlatformLock>(handle)
}

/// Drops the lock. Releasing a handle that holds no lock is a no-op and returns `Ok`.
pub fn release(handle: LockHandle) -> LockResult {
    release_with::<PlatformLock>(handle)
}

/// Polls [`try_acquire_exclusive`] with exponential backoff until it succeeds or `timeout` has
/// passed, in which case the result is [`LockError::WouldBlock`]. A zero timeout tries once, and
/// one too large to add to [`Instant::now`] (such as [`Duration::MAX`]) never runs out.
pub fn acquire_exclusive_timeout(handle: LockHandle, timeout: Duration) -> LockResult {
    acquire_exclusive_timeout_with::<PlatformLock>(handle, timeout)
}

pub fn acquire_exclusive_with<S: LockStrategy>(handle: LockHandle) -> LockResult {
    let fd = handle.checked()?;
    let res = S::lock(fd);
    trace!(strategy = %S::STRATEGY, fd, ?res, "lock");
    res.map_err(Into::into)
}

pub fn try_acquire_exclusive_with<S: LockStrategy>(handle: LockHandle) -> LockResult {
    let fd = handle.checked()?;
    let res = S::try_lock(fd);
    trace!(strategy = %S::STRATEGY, fd, ?res, "try lock");
    res.map_err(|errno| {
        if S::is_contended(errno) {
            LockError::WouldBlock
        } else {
            errno.into()
        }
    })
}

pub fn release_with<S: LockStrategy>(handle: LockHandle) -> LockResult {
    let fd = handle.checked()?;
    let res = S::unlock(fd);
    trace!(strategy = %S::STRATEGY, fd, ?res, "unlock");
    res.map_err(Into::into)
}

pub fn acquire_exclusive_timeout_with<S: LockStrategy>(
    handle: LockHandle,
    timeout: Duration,
) -> LockResult {
    // A timeout too large to represent as an Instant never expires.
    let deadline = Instant::now().checked_add(timeout);
    let mut backoff = MIN_BACKOFF;
    loop {
        match try_acquire_exclusive_with::<S>(handle) {
            Err(LockError::WouldBlock) => {}
            res => return res,
        }
        let delay = match deadline {
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    return Err(LockError::WouldBlock);
                }
                min(backoff, deadline - now)
            }
            None => backoff,
        };
        sleep(delay);
        backoff = min(backoff * 2, MAX_BACKOFF);
    }
}

/// The lock operations on anything with a file descriptor.
pub trait ExclusiveLock {
    fn lock_exclusive(&self) -> LockResult;
    fn try_lock_exclusive(&self) -> LockResult;
    fn release_lock(&self) -> LockResult;

    /// Like [`try_lock_exclusive`](Self::try_lock_exclusive) but reports contention as
    /// `Ok(false)`.
    fn try_lock_exclusive_bool(&self) -> LockResult<bool> {
        match self.try_lock_exclusive() {
            Ok(()) => Ok(true),
            Err(LockError::WouldBlock) => Ok(false),
            Err(err) => Err(err),
        }
    }
}

impl<T: AsRawFd> ExclusiveLock for T {
    fn lock_exclusive(&self) -> LockResult {
        acquire_exclusive(LockHandle::of(self))
    }

    fn try_lock_exclusive(&self) -> LockResult {
        try_acquire_exclusive(LockHandle::of(self))
    }

    fn release_lock(&self) -> LockResult {
        release(LockHandle::of(self))
    }
}
