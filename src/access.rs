//! POSIX native access driven by an OS variant

use crate::sandbox::{Active, ExecSandbox, Pending, SandboxState};
use crate::stat::{self, FileStat};
use crate::variant::OsVariant;
use log::{debug, warn};
use native_core::{
    Errno, LimitKind, NativeAccessError, PosixLayout, ProcessLimits, ResourceLimit, Result,
};
use native_libc::{FallocateLibrary, LibraryProvider, PosixCLibrary};
use std::os::fd::RawFd;
use std::path::Path;
use std::sync::Arc;

enum SandboxSlot {
    Pending(ExecSandbox<Pending>),
    Active(ExecSandbox<Active>),
}

/// Resource controls of the running process
pub struct NativeAccess {
    variant: OsVariant,
    posix: Arc<dyn PosixCLibrary>,
    fallocate: Arc<dyn FallocateLibrary>,
    sandbox: SandboxSlot,
    memory_locked: bool,
}

impl NativeAccess {
    /// Bind to the running OS.
    ///
    /// Fails if the OS is unsupported or the provider cannot supply a
    /// required library. There is no degraded mode.
    pub fn new(provider: &dyn LibraryProvider) -> Result<Self> {
        Self::with_variant(OsVariant::detect()?, provider)
    }

    pub fn with_variant(variant: OsVariant, provider: &dyn LibraryProvider) -> Result<Self> {
        variant.layout.validate()?;
        let posix = provider.posix()?;
        let fallocate = provider.fallocate()?;

        debug!("native access initialized for {}", variant.name());

        Ok(Self {
            variant,
            posix,
            fallocate,
            sandbox: SandboxSlot::Pending(ExecSandbox::new()),
            memory_locked: false,
        })
    }

    pub fn variant(&self) -> &OsVariant {
        &self.variant
    }

    pub fn layout(&self) -> &PosixLayout {
        &self.variant.layout
    }

    pub(crate) fn fallocate_library(&self) -> &dyn FallocateLibrary {
        self.fallocate.as_ref()
    }

    /// Soft value of an rlimit
    pub fn get_rlimit(&self, kind: LimitKind, description: &str) -> ResourceLimit {
        match self.posix.getrlimit(kind) {
            Ok(limit) => ResourceLimit::from_raw(limit.soft, self.variant.layout.rlim_infinity),
            Err(errno) => {
                warn!(
                    "unable to retrieve {} [{}]",
                    description,
                    self.posix.strerror(errno)
                );
                ResourceLimit::Unknown
            }
        }
    }

    /// Ceiling on simultaneous threads
    pub fn get_max_threads(&self) -> ResourceLimit {
        (self.variant.capabilities.max_threads)(self)
    }

    pub fn process_limits(&self) -> ProcessLimits {
        let layout = &self.variant.layout;
        ProcessLimits {
            max_threads: self.get_max_threads(),
            max_virtual_memory: self.get_rlimit(layout.rlimit_as, "max size virtual memory"),
            max_file_size: self.get_rlimit(layout.rlimit_fsize, "max file size"),
        }
    }

    /// Operator instructions for granting the memory-lock privilege
    pub fn memory_lock_guidance(&self) -> Vec<String> {
        (self.variant.capabilities.memory_lock_guidance)()
    }

    pub fn log_memory_lock_guidance(&self) {
        for line in self.memory_lock_guidance() {
            warn!("{}", line);
        }
    }

    /// Lock the current address space into RAM.
    ///
    /// Failure is reported through the log; the process keeps running with
    /// swappable memory.
    pub fn try_lock_memory(&mut self) -> bool {
        match self.posix.mlockall(libc::MCL_CURRENT) {
            Ok(()) => {
                self.memory_locked = true;
                true
            }
            Err(errno) => {
                warn!("Unable to lock memory: error={}, reason={}", errno.raw(), errno);
                warn!("This can result in part of the process being swapped out.");

                if errno.raw() == libc::ENOMEM {
                    let kind = self.variant.layout.rlimit_memlock;
                    match self.posix.getrlimit(kind) {
                        Ok(limit) => {
                            let infinity = self.variant.layout.rlim_infinity;
                            warn!(
                                "Increase RLIMIT_MEMLOCK, soft limit: {}, hard limit: {}",
                                ResourceLimit::from_raw(limit.soft, infinity),
                                ResourceLimit::from_raw(limit.hard, infinity)
                            );
                            self.log_memory_lock_guidance();
                        }
                        Err(errno) => {
                            warn!("unable to retrieve RLIMIT_MEMLOCK [{}]", errno);
                        }
                    }
                }
                false
            }
        }
    }

    pub fn is_memory_locked(&self) -> bool {
        self.memory_locked
    }

    /// Reserve disk space so `fd` can grow from `current_size` to `new_size`.
    ///
    /// Callers only use this to grow a file. A failure is logged and
    /// reported as `false`; preallocation is an optimization only.
    pub fn preallocate_file(&self, fd: RawFd, current_size: i64, new_size: i64) -> bool {
        debug_assert!(
            new_size >= current_size,
            "preallocate_file must grow: {} -> {}",
            current_size,
            new_size
        );
        (self.variant.capabilities.preallocate)(self, fd, current_size, new_size)
    }

    /// Open (creating if needed) and preallocate `path` to `new_size` bytes
    pub fn try_preallocate(&self, path: &Path, new_size: i64) {
        let flags = self.variant.layout.o_creat | libc::O_WRONLY;
        let fd = match self.posix.open(path, flags, 0o644) {
            Ok(fd) => fd,
            Err(errno) => {
                warn!(
                    "Could not open file [{}] to preallocate size: {}",
                    path.display(),
                    errno
                );
                return;
            }
        };

        match self.file_stat(fd) {
            Ok(stat) if stat.size < new_size => {
                if self.preallocate_file(fd, stat.size, new_size) {
                    debug!("pre-allocated file [{}] to {} bytes", path.display(), new_size);
                }
            }
            Ok(_) => {}
            Err(errno) => {
                warn!(
                    "Could not get stats for file [{}] to preallocate size: {}",
                    path.display(),
                    errno
                );
            }
        }

        if let Err(errno) = self.posix.close(fd) {
            warn!(
                "Could not close file [{}] after trying to preallocate size: {}",
                path.display(),
                errno
            );
        }
    }

    /// Bytes allocated on disk for `path`.
    ///
    /// The file is never opened, so FIFOs and files without read permission
    /// are handled like any other path.
    pub fn allocated_size(&self, path: &Path) -> Option<u64> {
        match self.path_stat(path) {
            Ok(stat) => Some(stat.allocated_bytes(&self.variant.layout)),
            Err(errno) => {
                warn!("Could not get stats for file [{}]: {}", path.display(), errno);
                None
            }
        }
    }

    /// `st_size` and `st_blocks` of `path`, following symlinks
    pub fn path_stat(&self, path: &Path) -> std::result::Result<FileStat, Errno> {
        stat::stat_path(self.posix.as_ref(), &self.variant.layout, path)
    }

    /// `st_size` and `st_blocks` of an open descriptor
    pub fn file_stat(&self, fd: RawFd) -> std::result::Result<FileStat, Errno> {
        stat::fstat(self.posix.as_ref(), &self.variant.layout, fd)
    }

    /// Permanently forbid this process from creating threads or processes.
    ///
    /// This must be the last setup step: after it returns `Ok`, not even
    /// this process can start a thread. A second call is rejected without
    /// touching the OS. If the OS refuses the limit, the state is unchanged.
    pub fn install_exec_sandbox(&mut self) -> Result<()> {
        let pending = match std::mem::replace(
            &mut self.sandbox,
            SandboxSlot::Pending(ExecSandbox::new()),
        ) {
            SandboxSlot::Pending(pending) => pending,
            active @ SandboxSlot::Active(_) => {
                self.sandbox = active;
                return Err(NativeAccessError::AlreadyInstalled);
            }
        };

        match pending.install(self.posix.as_ref(), self.variant.rlimit_nproc) {
            Ok(active) => {
                debug!("{} RLIMIT_NPROC initialization successful", self.variant.name());
                self.sandbox = SandboxSlot::Active(active);
                Ok(())
            }
            Err((pending, err)) => {
                self.sandbox = SandboxSlot::Pending(pending);
                Err(err)
            }
        }
    }

    pub fn exec_sandbox_state(&self) -> SandboxState {
        match &self.sandbox {
            SandboxSlot::Pending(sandbox) => sandbox.state(),
            SandboxSlot::Active(sandbox) => sandbox.state(),
        }
    }
}
