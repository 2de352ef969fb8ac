//! One-way exec sandbox
//!
//! Installing the sandbox drops the process-count rlimit to zero for both
//! the soft and hard value. The process cannot fork or start threads
//! afterwards, and the hard limit cannot be raised again without privilege.
//!
//! The state is a typestate: only `ExecSandbox<Pending>` has `install`, and
//! it consumes itself to produce an `ExecSandbox<Active>`.

use native_core::{LimitKind, NativeAccessError, RLimit};
use native_libc::PosixCLibrary;
use serde::Serialize;
use std::marker::PhantomData;

/// Observable sandbox state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SandboxState {
    Uninitialized,
    /// Process and thread creation is blocked for every thread
    AllThreads,
}

#[derive(Debug)]
pub struct Pending;

#[derive(Debug)]
pub struct Active;

#[derive(Debug)]
pub struct ExecSandbox<S> {
    _state: PhantomData<S>,
}

impl ExecSandbox<Pending> {
    pub(crate) fn new() -> Self {
        Self {
            _state: PhantomData,
        }
    }

    pub fn state(&self) -> SandboxState {
        SandboxState::Uninitialized
    }

    /// Set `nproc` to 0/0.
    ///
    /// On failure nothing changed and the pending sandbox is handed back.
    pub fn install(
        self,
        posix: &dyn PosixCLibrary,
        nproc: LimitKind,
    ) -> Result<ExecSandbox<Active>, (Self, NativeAccessError)> {
        if let Err(errno) = posix.setrlimit(nproc, RLimit::fixed(0)) {
            let err = NativeAccessError::Unsupported(format!(
                "RLIMIT_NPROC unavailable: {}",
                posix.strerror(errno)
            ));
            return Err((self, err));
        }
        Ok(ExecSandbox {
            _state: PhantomData,
        })
    }
}

impl ExecSandbox<Active> {
    pub fn state(&self) -> SandboxState {
        SandboxState::AllThreads
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use native_core::Errno;
    use std::path::Path;
    use std::sync::Mutex;

    struct RecordingPosix {
        result: Result<(), Errno>,
        calls: Mutex<Vec<(LimitKind, RLimit)>>,
    }

    impl PosixCLibrary for RecordingPosix {
        fn getrlimit(&self, _kind: LimitKind) -> Result<RLimit, Errno> {
            Err(Errno::from_raw(libc::ENOSYS))
        }

        fn setrlimit(&self, kind: LimitKind, limit: RLimit) -> Result<(), Errno> {
            self.calls.lock().unwrap().push((kind, limit));
            self.result
        }

        fn open(&self, _path: &Path, _flags: i32, _mode: u32) -> Result<i32, Errno> {
            Err(Errno::from_raw(libc::ENOSYS))
        }

        fn stat(&self, _path: &Path, _buf: &mut [u8]) -> Result<(), Errno> {
            Err(Errno::from_raw(libc::ENOSYS))
        }

        fn fstat(&self, _fd: i32, _buf: &mut [u8]) -> Result<(), Errno> {
            Err(Errno::from_raw(libc::ENOSYS))
        }

        fn close(&self, _fd: i32) -> Result<(), Errno> {
            Ok(())
        }

        fn mlockall(&self, _flags: i32) -> Result<(), Errno> {
            Ok(())
        }
    }

    #[test]
    fn install_sets_soft_and_hard_to_zero() {
        let posix = RecordingPosix {
            result: Ok(()),
            calls: Mutex::new(Vec::new()),
        };
        let pending = ExecSandbox::new();
        assert_eq!(pending.state(), SandboxState::Uninitialized);

        let active = pending.install(&posix, LimitKind::new(7)).unwrap();
        assert_eq!(active.state(), SandboxState::AllThreads);
        assert_eq!(
            *posix.calls.lock().unwrap(),
            vec![(LimitKind::new(7), RLimit::new(0, 0))]
        );
    }

    #[test]
    fn failed_install_returns_pending() {
        let posix = RecordingPosix {
            result: Err(Errno::from_raw(libc::EPERM)),
            calls: Mutex::new(Vec::new()),
        };
        let (pending, err) = ExecSandbox::new()
            .install(&posix, LimitKind::new(6))
            .unwrap_err();
        assert_eq!(pending.state(), SandboxState::Uninitialized);
        let message = err.to_string();
        assert!(message.contains("RLIMIT_NPROC unavailable"));
        assert!(message.contains(&Errno::from_raw(libc::EPERM).message()));
    }
}
