use console::style;
use log::{debug, info};
use native_access::{NativeAccess, SandboxState};
use nix::sys::wait::{WaitStatus, waitpid};
use nix::libc::_exit;
use nix::unistd::{ForkResult, fork, geteuid};
use serde::Serialize;
use std::path::Path;

type CommandResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Serialize)]
struct CheckReport<'a> {
    os: &'static str,
    root: bool,
    layout: &'a native_access::PosixLayout,
    rlimit_nproc: native_access::LimitKind,
    sandbox: SandboxState,
}

pub fn check(access: &NativeAccess, json: bool) -> CommandResult {
    info!("Checking native access for {}", access.variant().name());
    let report = CheckReport {
        os: access.variant().name(),
        root: geteuid().is_root(),
        layout: access.layout(),
        rlimit_nproc: access.variant().rlimit_nproc,
        sandbox: access.exec_sandbox_state(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let layout = report.layout;
    println!("Operating system: {}", style(report.os).bold());
    if report.root {
        println!("[✓] Running as root (exempt from RLIMIT_NPROC)");
    } else {
        println!("[✓] Running unprivileged");
    }
    println!("\nConstants:");
    println!("  RLIMIT_NPROC:   {}", report.rlimit_nproc.raw());
    println!("  RLIMIT_AS:      {}", layout.rlimit_as.raw());
    println!("  RLIMIT_FSIZE:   {}", layout.rlimit_fsize.raw());
    println!("  RLIMIT_MEMLOCK: {}", layout.rlimit_memlock.raw());
    println!("  RLIM_INFINITY:  {:#x}", layout.rlim_infinity);
    println!("  O_CREAT:        {:#o}", layout.o_creat);
    println!("\nstruct stat:");
    println!("  size:      {} bytes", layout.stat_size);
    println!("  st_size:   offset {}", layout.stat_size_offset);
    println!("  st_blocks: offset {}", layout.stat_blocks_offset);
    println!("\nExec sandbox: {:?}", report.sandbox);
    Ok(())
}

pub fn limits(access: &NativeAccess, json: bool) -> CommandResult {
    let limits = access.process_limits();
    if json {
        println!("{}", serde_json::to_string_pretty(&limits)?);
        return Ok(());
    }

    println!("Process limits:\n");
    println!("  max threads:        {}", limits.max_threads);
    println!("  max virtual memory: {}", limits.max_virtual_memory);
    println!("  max file size:      {}", limits.max_file_size);
    Ok(())
}

pub fn mlock(access: &mut NativeAccess, lock: bool) -> CommandResult {
    if lock {
        if access.try_lock_memory() {
            println!("[✓] Memory locked");
            return Ok(());
        }
        println!("[✗] Memory could not be locked\n");
    }

    for line in access.memory_lock_guidance() {
        println!("{}", line);
    }
    Ok(())
}

pub fn preallocate(access: &NativeAccess, path: &Path, size: &str) -> CommandResult {
    let size = parse_size(size)?;
    let size = i64::try_from(size).map_err(|_| format!("Size too large: {}", size))?;

    debug!("Preallocating {} to {} bytes", path.display(), size);
    access.try_preallocate(path, size);

    match access.allocated_size(path) {
        Some(allocated) => {
            println!("{}: {} bytes allocated", path.display(), allocated);
            Ok(())
        }
        None => Err(format!("Could not read allocated size of {}", path.display()).into()),
    }
}

pub fn sandbox(access: &mut NativeAccess) -> CommandResult {
    if geteuid().is_root() {
        println!(
            "{} root is exempt from RLIMIT_NPROC, thread and process creation may still succeed",
            style("warning:").yellow().bold()
        );
    }

    access.install_exec_sandbox()?;
    println!("[✓] Exec sandbox installed ({:?})", access.exec_sandbox_state());

    match std::thread::Builder::new().spawn(|| {}) {
        Ok(handle) => {
            let _ = handle.join();
            println!("[✗] Thread creation still possible");
        }
        Err(e) => println!("[✓] Thread creation blocked: {}", e),
    }

    match fork_and_reap() {
        Ok(_) => println!("[✗] Process creation still possible"),
        Err(e) => println!("[✓] Process creation blocked: {}", e),
    }
    Ok(())
}

/// Fork a child that exits at once, and wait for it
fn fork_and_reap() -> nix::Result<WaitStatus> {
    // SAFETY: the child only calls _exit, which is async-signal-safe and
    // skips atexit handlers and stdio flushing inherited from the parent.
    match unsafe { fork() }? {
        ForkResult::Child => unsafe { _exit(0) },
        ForkResult::Parent { child } => waitpid(child, None),
    }
}

/// Parse a size string (e.g., "4096", "100K", "64M", "1G")
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim().to_uppercase();

    let (num_str, multiplier) = match s.chars().last() {
        Some('G') => (&s[..s.len() - 1], 1024u64 * 1024 * 1024),
        Some('M') => (&s[..s.len() - 1], 1024u64 * 1024),
        Some('K') => (&s[..s.len() - 1], 1024u64),
        Some('B') => (&s[..s.len() - 1], 1u64),
        _ => (s.as_str(), 1u64),
    };

    let num: u64 = num_str
        .parse()
        .map_err(|_| format!("Invalid size: {}", s))?;

    num.checked_mul(multiplier)
        .ok_or_else(|| format!("Size overflow: {}", s))
}
