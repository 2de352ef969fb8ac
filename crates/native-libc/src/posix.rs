//! Generic POSIX C library surface
//!
//! Each method wraps exactly one libc call. Arguments are checked before the
//! call, and the error code is captured right after it and returned by value.

use native_core::{Errno, LimitKind, RLimit};
use std::ffi::CString;
use std::os::fd::RawFd;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

/// C library functions shared by every POSIX variant
pub trait PosixCLibrary: Send + Sync {
    fn getrlimit(&self, kind: LimitKind) -> Result<RLimit, Errno>;

    fn setrlimit(&self, kind: LimitKind, limit: RLimit) -> Result<(), Errno>;

    fn strerror(&self, errno: Errno) -> String {
        errno.message()
    }

    fn open(&self, path: &Path, flags: i32, mode: u32) -> Result<RawFd, Errno>;

    /// `fstat` into a raw buffer of at least `size_of::<libc::stat>()` bytes
    fn fstat(&self, fd: RawFd, buf: &mut [u8]) -> Result<(), Errno>;

    /// `stat` by path into a raw buffer, without opening the file
    fn stat(&self, path: &Path, buf: &mut [u8]) -> Result<(), Errno>;

    fn close(&self, fd: RawFd) -> Result<(), Errno>;

    fn mlockall(&self, flags: i32) -> Result<(), Errno>;
}

/// [`PosixCLibrary`] backed by the `libc` crate
#[derive(Debug, Default, Clone, Copy)]
pub struct LibcPosix;

impl PosixCLibrary for LibcPosix {
    fn getrlimit(&self, kind: LimitKind) -> Result<RLimit, Errno> {
        let mut rlim = libc::rlimit {
            rlim_cur: 0,
            rlim_max: 0,
        };
        // SAFETY: rlim is a valid out-pointer; an unknown resource fails with EINVAL.
        if unsafe { libc::getrlimit(kind.raw() as _, &mut rlim) } != 0 {
            return Err(Errno::last());
        }
        Ok(RLimit::new(rlim.rlim_cur as u64, rlim.rlim_max as u64))
    }

    fn setrlimit(&self, kind: LimitKind, limit: RLimit) -> Result<(), Errno> {
        let rlim = libc::rlimit {
            rlim_cur: limit.soft as libc::rlim_t,
            rlim_max: limit.hard as libc::rlim_t,
        };
        // SAFETY: rlim is valid for the duration of the call.
        if unsafe { libc::setrlimit(kind.raw() as _, &rlim) } != 0 {
            return Err(Errno::last());
        }
        Ok(())
    }

    fn open(&self, path: &Path, flags: i32, mode: u32) -> Result<RawFd, Errno> {
        let path = CString::new(path.as_os_str().as_bytes())
            .map_err(|_| Errno::from_raw(libc::EINVAL))?;
        // SAFETY: path is NUL-terminated and outlives the call.
        let fd = unsafe { libc::open(path.as_ptr(), flags, mode as libc::c_uint) };
        if fd < 0 {
            return Err(Errno::last());
        }
        Ok(fd)
    }

    fn fstat(&self, fd: RawFd, buf: &mut [u8]) -> Result<(), Errno> {
        if fd < 0 {
            return Err(Errno::from_raw(libc::EBADF));
        }
        if buf.len() < std::mem::size_of::<libc::stat>() {
            return Err(Errno::from_raw(libc::EINVAL));
        }
        // SAFETY: buf is writable for at least sizeof(struct stat) bytes. The
        // pointer is only handed to the C library, never dereferenced here.
        let rc = unsafe { libc::fstat(fd, buf.as_mut_ptr().cast::<libc::stat>()) };
        if rc != 0 {
            return Err(Errno::last());
        }
        Ok(())
    }

    fn stat(&self, path: &Path, buf: &mut [u8]) -> Result<(), Errno> {
        if buf.len() < std::mem::size_of::<libc::stat>() {
            return Err(Errno::from_raw(libc::EINVAL));
        }
        let path = CString::new(path.as_os_str().as_bytes())
            .map_err(|_| Errno::from_raw(libc::EINVAL))?;
        // SAFETY: path is NUL-terminated and buf is writable for at least
        // sizeof(struct stat) bytes; the pointer is only passed to the C library.
        let rc = unsafe { libc::stat(path.as_ptr(), buf.as_mut_ptr().cast::<libc::stat>()) };
        if rc != 0 {
            return Err(Errno::last());
        }
        Ok(())
    }

    fn close(&self, fd: RawFd) -> Result<(), Errno> {
        // SAFETY: closing an fd we do not own is the caller's bug, not UB.
        if unsafe { libc::close(fd) } != 0 {
            return Err(Errno::last());
        }
        Ok(())
    }

    fn mlockall(&self, flags: i32) -> Result<(), Errno> {
        // SAFETY: mlockall takes no pointers.
        if unsafe { libc::mlockall(flags) } != 0 {
            return Err(Errno::last());
        }
        Ok(())
    }
}
