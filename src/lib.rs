//! native-access: per-OS resource controls for a server process
//!
//! Queries and constrains the running process's own OS-level capabilities
//! on Linux and FreeBSD: process limits, memory locking, file preallocation,
//! and a one-way exec sandbox.
//!
//! # Modules
//!
//! - **variant**: per-OS constants and capability table
//! - **access**: POSIX behavior driven by a variant
//! - **sandbox**: one-way exec sandbox state
//! - **stat**: `struct stat` reads through the layout descriptor
//!
//! # Example
//!
//! ```ignore
//! use native_access::{NativeAccess, SystemLibraryProvider};
//!
//! let mut access = NativeAccess::new(&SystemLibraryProvider)?;
//! println!("max threads: {}", access.get_max_threads());
//! access.try_preallocate(Path::new("/var/lib/data/segment"), 64 * 1024 * 1024);
//! access.install_exec_sandbox()?;
//! ```

pub mod access;
pub mod sandbox;
pub mod stat;
pub mod variant;

pub use access::NativeAccess;
pub use native_core::{
    Errno, LimitKind, NativeAccessError, PosixLayout, ProcessLimits, RLimit, ResourceLimit,
    Result,
};
pub use native_libc::{
    FallocateLibrary, LibcFallocate, LibcPosix, LibraryProvider, PosixCLibrary,
    SystemLibraryProvider,
};
pub use sandbox::SandboxState;
pub use stat::FileStat;
pub use variant::{Os, OsVariant, VariantCapabilities};

#[cfg(test)]
mod tests {
    use crate::{NativeAccess, SandboxState, SystemLibraryProvider};

    #[test]
    fn test_module_imports() {
        let access = NativeAccess::new(&SystemLibraryProvider).unwrap();
        assert_eq!(access.exec_sandbox_state(), SandboxState::Uninitialized);
    }
}
