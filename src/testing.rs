use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use std::time::Duration;

use anyhow::bail;
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::{fork, ForkResult, Pid};

use super::*;
use crate::sys::LockStrategy;

const CHILD_ACQUIRED: i32 = 0;
const CHILD_CONTENDED: i32 = 1;

/// Opens `path` in a forked child and tries to lock it once with `S`. Returns whether the child got
/// the lock. The child exits straight after, which releases anything it took.
pub(crate) fn child_can_lock<S: LockStrategy>(path: &Path) -> anyhow::Result<bool> {
    let c_path = CString::new(path.as_os_str().as_bytes())?;
    // The child sticks to raw syscalls: other test threads may hold allocator locks at fork time.
    match unsafe { fork() }? {
        ForkResult::Child => {
            let fd = unsafe { libc::open(c_path.as_ptr(), libc::O_RDWR) };
            let code = if fd < 0 {
                2
            } else {
                match S::try_lock(fd) {
                    Ok(()) => CHILD_ACQUIRED,
                    Err(errno) if S::is_contended(errno) => CHILD_CONTENDED,
                    Err(_) => 3,
                }
            };
            unsafe { libc::_exit(code) }
        }
        ForkResult::Parent { child } => match waitpid(child, None)? {
            WaitStatus::Exited(_, CHILD_ACQUIRED) => Ok(true),
            WaitStatus::Exited(_, CHILD_CONTENDED) => Ok(false),
            status => bail!("child lock attempt on {path:?} failed: {status:?}"),
        },
    }
}

/// A forked child holding a lock on a file for a fixed time.
pub(crate) struct ChildHolder {
    pid: Pid,
}

impl ChildHolder {
    /// Returns once the child owns the lock. The child exits, and so releases it, after `hold`.
    pub(crate) fn spawn<S: LockStrategy>(path: &Path, hold: Duration) -> anyhow::Result<Self> {
        let c_path = CString::new(path.as_os_str().as_bytes())?;
        let mut hold_for: libc::timespec = unsafe { std::mem::zeroed() };
        hold_for.tv_sec = hold.as_secs() as libc::time_t;
        hold_for.tv_nsec = hold.subsec_nanos() as _;
        let mut fds = [0; 2];
        if unsafe { libc::pipe(fds.as_mut_ptr()) } != 0 {
            return Err(io::Error::last_os_error().into());
        }
        let [read_fd, write_fd] = fds;
        match unsafe { fork() }? {
            ForkResult::Child => unsafe {
                libc::close(read_fd);
                let fd = libc::open(c_path.as_ptr(), libc::O_RDWR);
                let locked: u8 = (fd >= 0 && S::lock(fd).is_ok()).into();
                libc::write(write_fd, &locked as *const u8 as *const libc::c_void, 1);
                if locked == 1 {
                    libc::nanosleep(&hold_for, std::ptr::null_mut());
                }
                libc::_exit(0)
            },
            ForkResult::Parent { child } => {
                let mut locked = 0u8;
                let n = unsafe {
                    libc::close(write_fd);
                    let n = libc::read(read_fd, &mut locked as *mut u8 as *mut libc::c_void, 1);
                    libc::close(read_fd);
                    n
                };
                let holder = Self { pid: child };
                if n != 1 || locked != 1 {
                    holder.wait()?;
                    bail!("child failed to lock {path:?}");
                }
                Ok(holder)
            }
        }
    }

    pub(crate) fn wait(self) -> anyhow::Result<()> {
        match waitpid(self.pid, None)? {
            WaitStatus::Exited(_, 0) => Ok(()),
            status => bail!("lock holder exited with {status:?}"),
        }
    }
}
