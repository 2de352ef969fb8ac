//! `posix_fallocate` binding
//!
//! https://man.freebsd.org/cgi/man.cgi?query=posix_fallocate
//! https://man7.org/linux/man-pages/man3/posix_fallocate.3.html
//!
//! `posix_fallocate` reports failure through its return value rather than
//! errno, so the code is taken from that value and never from a separately
//! read errno.

use crate::downcall::Downcall;
use native_core::{Errno, Result};
use std::os::fd::RawFd;
use std::sync::OnceLock;

type PosixFallocateFn = unsafe extern "C" fn(libc::c_int, libc::off_t, libc::off_t) -> libc::c_int;

static POSIX_FALLOCATE: OnceLock<Downcall<PosixFallocateFn>> = OnceLock::new();

/// Disk space reservation for regular files
pub trait FallocateLibrary: Send + Sync {
    /// Reserve `length` bytes starting at `offset`
    fn posix_fallocate(&self, fd: RawFd, offset: i64, length: i64) -> std::result::Result<(), Errno>;
}

/// [`FallocateLibrary`] calling the C library's `posix_fallocate`
#[derive(Debug, Clone, Copy)]
pub struct LibcFallocate {
    handle: Downcall<PosixFallocateFn>,
}

impl LibcFallocate {
    /// Bind to `posix_fallocate`, resolving the symbol on first use only
    pub fn load() -> Result<Self> {
        if let Some(handle) = POSIX_FALLOCATE.get() {
            return Ok(Self { handle: *handle });
        }
        // SAFETY: PosixFallocateFn is `int posix_fallocate(int, off_t, off_t)`.
        let resolved = unsafe { Downcall::<PosixFallocateFn>::resolve(c"posix_fallocate") }?;
        Ok(Self {
            handle: *POSIX_FALLOCATE.get_or_init(|| resolved),
        })
    }

    /// Address of the resolved symbol
    pub fn address(&self) -> usize {
        self.handle.get() as usize
    }
}

impl FallocateLibrary for LibcFallocate {
    fn posix_fallocate(&self, fd: RawFd, offset: i64, length: i64) -> std::result::Result<(), Errno> {
        if fd < 0 {
            return Err(Errno::from_raw(libc::EBADF));
        }
        if offset < 0 || length < 0 {
            return Err(Errno::from_raw(libc::EINVAL));
        }
        // The OS rejects empty ranges with EINVAL; there is nothing to reserve.
        if length == 0 {
            return Ok(());
        }

        // SAFETY: the handle was resolved with a matching signature and all
        // arguments are plain integers checked above.
        let rc = unsafe { (self.handle.get())(fd, offset as libc::off_t, length as libc::off_t) };
        if rc != 0 {
            return Err(Errno::from_raw(rc));
        }
        Ok(())
    }
}
