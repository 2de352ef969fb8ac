//! Library providers
//!
//! A provider hands out the native bindings a variant needs. Production code
//! uses [`SystemLibraryProvider`]; tests inject their own.

use crate::fallocate::{FallocateLibrary, LibcFallocate};
use crate::posix::{LibcPosix, PosixCLibrary};
use native_core::Result;
use std::sync::Arc;

/// Supplies native libraries by the interface they implement
pub trait LibraryProvider {
    fn posix(&self) -> Result<Arc<dyn PosixCLibrary>>;

    fn fallocate(&self) -> Result<Arc<dyn FallocateLibrary>>;
}

/// Binds directly to the process's C library
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLibraryProvider;

impl LibraryProvider for SystemLibraryProvider {
    fn posix(&self) -> Result<Arc<dyn PosixCLibrary>> {
        Ok(Arc::new(LibcPosix))
    }

    fn fallocate(&self) -> Result<Arc<dyn FallocateLibrary>> {
        Ok(Arc::new(LibcFallocate::load()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_provider_supplies_both_libraries() {
        let provider = SystemLibraryProvider;
        assert!(provider.posix().is_ok());
        assert!(provider.fallocate().is_ok());
    }
}
