//! native-libc: native call bindings for native-access
//!
//! Wraps the C library calls the OS variants need. Every call returns its
//! error code by value, so concurrent callers never observe each other's
//! errno.

pub mod downcall;
pub mod fallocate;
pub mod posix;
pub mod provider;

pub use downcall::Downcall;
pub use fallocate::{FallocateLibrary, LibcFallocate};
pub use posix::{LibcPosix, PosixCLibrary};
pub use provider::{LibraryProvider, SystemLibraryProvider};
