//! Per-OS variant table
//!
//! An [`OsVariant`] bundles the constants of one operating system with the
//! behaviors that differ between systems. It is picked once at startup and
//! injected into [`NativeAccess`](crate::NativeAccess).

use crate::access::NativeAccess;
use log::warn;
use native_core::{LimitKind, NativeAccessError, PosixLayout, ResourceLimit, Result};
use serde::Serialize;
use std::fmt;
use std::os::fd::RawFd;

/// Supported operating system families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Os {
    Linux,
    FreeBsd,
}

impl Os {
    pub fn name(&self) -> &'static str {
        match self {
            Os::Linux => "Linux",
            Os::FreeBsd => "FreeBSD",
        }
    }
}

/// Behaviors that differ between operating systems
#[derive(Clone, Copy)]
pub struct VariantCapabilities {
    pub max_threads: fn(&NativeAccess) -> ResourceLimit,
    pub memory_lock_guidance: fn() -> Vec<String>,
    pub preallocate: fn(&NativeAccess, RawFd, i64, i64) -> bool,
}

impl fmt::Debug for VariantCapabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VariantCapabilities").finish_non_exhaustive()
    }
}

/// Constants and capability table of one operating system
#[derive(Debug, Clone, Copy)]
pub struct OsVariant {
    pub os: Os,
    pub layout: PosixLayout,
    /// Neither OS has a thread-count rlimit; the process count is the ceiling.
    pub rlimit_nproc: LimitKind,
    pub capabilities: VariantCapabilities,
}

impl OsVariant {
    pub fn linux(layout: PosixLayout) -> Self {
        Self {
            os: Os::Linux,
            layout,
            rlimit_nproc: LimitKind::new(6),
            capabilities: VariantCapabilities {
                max_threads: nproc_max_threads,
                memory_lock_guidance: linux_memory_lock_guidance,
                preallocate: posix_fallocate_preallocate,
            },
        }
    }

    // https://github.com/freebsd/freebsd-src/blob/release/14.2.0/sys/sys/resource.h#L110
    pub fn freebsd() -> Self {
        Self {
            os: Os::FreeBsd,
            layout: PosixLayout::FREEBSD,
            rlimit_nproc: LimitKind::new(7),
            capabilities: VariantCapabilities {
                max_threads: nproc_max_threads,
                memory_lock_guidance: freebsd_memory_lock_guidance,
                preallocate: posix_fallocate_preallocate,
            },
        }
    }

    /// Variant for the OS and architecture this binary was built for
    pub fn detect() -> Result<Self> {
        if cfg!(all(target_os = "linux", target_arch = "x86_64")) {
            Ok(Self::linux(PosixLayout::LINUX_X86_64))
        } else if cfg!(all(target_os = "linux", target_arch = "aarch64")) {
            Ok(Self::linux(PosixLayout::LINUX_AARCH64))
        } else if cfg!(all(target_os = "freebsd", target_pointer_width = "64")) {
            Ok(Self::freebsd())
        } else {
            Err(NativeAccessError::UnsupportedPlatform(format!(
                "{}/{}",
                std::env::consts::OS,
                std::env::consts::ARCH
            )))
        }
    }

    pub fn name(&self) -> &'static str {
        self.os.name()
    }
}

fn nproc_max_threads(access: &NativeAccess) -> ResourceLimit {
    access.get_rlimit(access.variant().rlimit_nproc, "max number of threads")
}

fn posix_fallocate_preallocate(
    access: &NativeAccess,
    fd: RawFd,
    current_size: i64,
    new_size: i64,
) -> bool {
    let length = new_size.saturating_sub(current_size).max(0);
    match access.fallocate_library().posix_fallocate(fd, current_size, length) {
        Ok(()) => true,
        Err(errno) => {
            warn!("posix_fallocate failed: {}", errno);
            false
        }
    }
}

fn linux_memory_lock_guidance() -> Vec<String> {
    let user = std::env::var("USER").unwrap_or_else(|_| "<user>".to_string());
    vec![
        "These can be adjusted by modifying /etc/security/limits.conf, for example:".to_string(),
        format!("\t# allow user '{}' mlockall", user),
        format!("\t{} soft memlock unlimited", user),
        format!("\t{} hard memlock unlimited", user),
        "You can also run the following command to raise the limit of the current shell immediately:"
            .to_string(),
        "ulimit -l unlimited".to_string(),
        "If you are logged in interactively, you will have to re-login for the new limits to take effect."
            .to_string(),
        "When running within a container, the limit must be raised by the runtime, for example:"
            .to_string(),
        "--ulimit memlock=-1:-1".to_string(),
    ]
}

fn freebsd_memory_lock_guidance() -> Vec<String> {
    vec![
        "You can allow this process to lock large amounts of RAM by setting the following in /etc/sysctl.conf:"
            .to_string(),
        "security.bsd.unprivileged_mlock=1".to_string(),
        "You can also run the following command to modify the value immediately:".to_string(),
        "sysctl security.bsd.unprivileged_mlock=1".to_string(),
        "When running within a Jail, it's highly advisable to set:".to_string(),
        "enforce_statfs = 1".to_string(),
    ]
}
