//! Shared test fixtures: capturing logger and injectable fake libraries

#![allow(dead_code)]

use log::{LevelFilter, Log, Metadata, Record};
use native_access::{
    Errno, FallocateLibrary, LibraryProvider, LimitKind, NativeAccessError, PosixCLibrary,
    RLimit, Result,
};
use std::cell::RefCell;
use std::collections::HashMap;
use std::os::fd::RawFd;
use std::path::Path;
use std::sync::{Arc, Mutex, Once};

thread_local! {
    static RECORDS: RefCell<Vec<(log::Level, String)>> = const { RefCell::new(Vec::new()) };
}

/// Logger that keeps records on the thread that emitted them
struct CaptureLogger;

impl Log for CaptureLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        RECORDS.with(|records| {
            records
                .borrow_mut()
                .push((record.level(), record.args().to_string()))
        });
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger;
static INIT: Once = Once::new();

pub fn init_logger() {
    INIT.call_once(|| {
        log::set_logger(&LOGGER).expect("logger already set");
        log::set_max_level(LevelFilter::Trace);
    });
    RECORDS.with(|records| records.borrow_mut().clear());
}

/// Drain the messages logged by the calling thread
pub fn take_logs() -> Vec<(log::Level, String)> {
    RECORDS.with(|records| std::mem::take(&mut *records.borrow_mut()))
}

pub fn warnings(logs: &[(log::Level, String)]) -> Vec<String> {
    logs.iter()
        .filter(|(level, _)| *level == log::Level::Warn)
        .map(|(_, message)| message.clone())
        .collect()
}

/// Scriptable [`PosixCLibrary`]
pub struct FakePosix {
    pub limits: Mutex<HashMap<i32, std::result::Result<RLimit, Errno>>>,
    pub setrlimit_result: Mutex<std::result::Result<(), Errno>>,
    pub setrlimit_calls: Mutex<Vec<(LimitKind, RLimit)>>,
    pub mlockall_result: std::result::Result<(), Errno>,
}

impl Default for FakePosix {
    fn default() -> Self {
        Self {
            limits: Mutex::new(HashMap::new()),
            setrlimit_result: Mutex::new(Ok(())),
            setrlimit_calls: Mutex::new(Vec::new()),
            mlockall_result: Ok(()),
        }
    }
}

impl FakePosix {
    pub fn with_limit(self, kind: LimitKind, limit: std::result::Result<RLimit, Errno>) -> Self {
        self.limits.lock().unwrap().insert(kind.raw(), limit);
        self
    }
}

impl PosixCLibrary for FakePosix {
    fn getrlimit(&self, kind: LimitKind) -> std::result::Result<RLimit, Errno> {
        self.limits
            .lock()
            .unwrap()
            .get(&kind.raw())
            .copied()
            .unwrap_or(Err(Errno::from_raw(libc::EINVAL)))
    }

    fn setrlimit(&self, kind: LimitKind, limit: RLimit) -> std::result::Result<(), Errno> {
        self.setrlimit_calls.lock().unwrap().push((kind, limit));
        *self.setrlimit_result.lock().unwrap()
    }

    fn open(&self, _path: &Path, _flags: i32, _mode: u32) -> std::result::Result<RawFd, Errno> {
        Err(Errno::from_raw(libc::EACCES))
    }

    fn stat(&self, _path: &Path, _buf: &mut [u8]) -> std::result::Result<(), Errno> {
        Err(Errno::from_raw(libc::ENOSYS))
    }

    fn fstat(&self, _fd: RawFd, _buf: &mut [u8]) -> std::result::Result<(), Errno> {
        Err(Errno::from_raw(libc::ENOSYS))
    }

    fn close(&self, _fd: RawFd) -> std::result::Result<(), Errno> {
        Ok(())
    }

    fn mlockall(&self, _flags: i32) -> std::result::Result<(), Errno> {
        self.mlockall_result
    }
}

/// [`FallocateLibrary`] that fails with a fixed code per descriptor
#[derive(Default)]
pub struct FakeFallocate {
    pub failures: HashMap<RawFd, Errno>,
    pub calls: Mutex<Vec<(RawFd, i64, i64)>>,
}

impl FallocateLibrary for FakeFallocate {
    fn posix_fallocate(
        &self,
        fd: RawFd,
        offset: i64,
        length: i64,
    ) -> std::result::Result<(), Errno> {
        self.calls.lock().unwrap().push((fd, offset, length));
        match self.failures.get(&fd) {
            Some(errno) => Err(*errno),
            None => Ok(()),
        }
    }
}

pub struct FakeProvider {
    pub posix: Arc<FakePosix>,
    pub fallocate: Arc<FakeFallocate>,
}

impl FakeProvider {
    pub fn new(posix: FakePosix, fallocate: FakeFallocate) -> Self {
        Self {
            posix: Arc::new(posix),
            fallocate: Arc::new(fallocate),
        }
    }
}

impl LibraryProvider for FakeProvider {
    fn posix(&self) -> Result<Arc<dyn PosixCLibrary>> {
        Ok(self.posix.clone())
    }

    fn fallocate(&self) -> Result<Arc<dyn FallocateLibrary>> {
        Ok(self.fallocate.clone())
    }
}

/// Provider whose fallocate binding cannot be resolved
pub struct MissingSymbolProvider;

impl LibraryProvider for MissingSymbolProvider {
    fn posix(&self) -> Result<Arc<dyn PosixCLibrary>> {
        Ok(Arc::new(FakePosix::default()))
    }

    fn fallocate(&self) -> Result<Arc<dyn FallocateLibrary>> {
        Err(NativeAccessError::SymbolUnavailable(
            "posix_fallocate".to_string(),
        ))
    }
}

/// Run `child` in a forked process and return its exit status.
///
/// # Safety
///
/// `child` runs after fork in a possibly multi-threaded process; it must
/// finish with `libc::_exit`.
pub unsafe fn run_forked(child: impl FnOnce() -> i32) -> i32 {
    unsafe {
        let pid = libc::fork();
        assert!(pid >= 0, "fork failed: {}", std::io::Error::last_os_error());

        if pid == 0 {
            let code = child();
            libc::_exit(code);
        }

        let mut status: i32 = 0;
        let ret = libc::waitpid(pid, &mut status, 0);
        assert_eq!(ret, pid);
        assert!(
            libc::WIFEXITED(status),
            "child should exit normally, status=0x{:x}",
            status
        );
        libc::WEXITSTATUS(status)
    }
}

pub fn is_root() -> bool {
    // SAFETY: geteuid has no preconditions.
    unsafe { libc::geteuid() == 0 }
}
