//! Typed handles to C library symbols
//!
//! Symbols are looked up in the already-loaded C library with
//! `dlsym(RTLD_DEFAULT, ..)`. A resolved handle is a plain `Copy` function
//! pointer and can be shared freely between threads.

use native_core::{NativeAccessError, Result};
use std::ffi::{CStr, c_void};
use std::mem::size_of;

/// A resolved C symbol with the function pointer type `F`
#[derive(Debug, Clone, Copy)]
pub struct Downcall<F: Copy> {
    name: &'static CStr,
    handle: F,
}

impl<F: Copy> Downcall<F> {
    /// Look `name` up in the process's loaded libraries.
    ///
    /// # Safety
    ///
    /// `F` must be an `unsafe extern "C" fn` pointer type whose signature
    /// matches the C prototype of `name` on the running OS.
    pub unsafe fn resolve(name: &'static CStr) -> Result<Self> {
        if size_of::<F>() != size_of::<*mut c_void>() {
            return Err(NativeAccessError::InvalidLayout(format!(
                "handle type for {} is not pointer-sized",
                name.to_string_lossy()
            )));
        }

        // SAFETY: name is NUL-terminated; RTLD_DEFAULT searches the global scope.
        let ptr = unsafe { libc::dlsym(libc::RTLD_DEFAULT, name.as_ptr()) };
        if ptr.is_null() {
            return Err(NativeAccessError::SymbolUnavailable(
                name.to_string_lossy().into_owned(),
            ));
        }

        // SAFETY: F is pointer-sized (checked above) and the caller guarantees
        // it is the function pointer type of this symbol.
        let handle = unsafe { std::mem::transmute_copy::<*mut c_void, F>(&ptr) };
        Ok(Self { name, handle })
    }

    pub fn name(&self) -> &'static CStr {
        self.name
    }

    pub fn get(&self) -> F {
        self.handle
    }
}
