//! OS error codes captured per native call
//!
//! An [`Errno`] is read on the calling thread right after the call that
//! produced it and travels by value inside a `Result`. Nothing here touches
//! shared mutable state, so concurrent callers only ever see their own code.

use std::ffi::CStr;
use std::fmt;

/// Error code of one native call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Errno(i32);

impl Errno {
    pub const fn from_raw(code: i32) -> Self {
        Self(code)
    }

    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Read the calling thread's errno.
    ///
    /// Must be called directly after the failing call, before anything else
    /// that may overwrite errno runs.
    pub fn last() -> Self {
        Self(
            std::io::Error::last_os_error()
                .raw_os_error()
                .unwrap_or(0),
        )
    }

    /// Human-readable message for this code
    pub fn message(self) -> String {
        strerror(self.0)
    }
}

impl fmt::Display for Errno {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

impl std::error::Error for Errno {}

impl From<Errno> for std::io::Error {
    fn from(errno: Errno) -> Self {
        std::io::Error::from_raw_os_error(errno.0)
    }
}

/// Thread-safe `strerror`
pub fn strerror(code: i32) -> String {
    let mut buf = [0 as libc::c_char; 256];
    // SAFETY: buf is writable for buf.len() bytes; the XSI strerror_r
    // NUL-terminates the message when it returns 0.
    let rc = unsafe { libc::strerror_r(code, buf.as_mut_ptr(), buf.len()) };
    if rc != 0 {
        return format!("Unknown error {}", code);
    }
    // SAFETY: see above, buf now holds a NUL-terminated string.
    unsafe { CStr::from_ptr(buf.as_ptr()) }
        .to_string_lossy()
        .into_owned()
}
