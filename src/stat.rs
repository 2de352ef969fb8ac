//! `stat`/`fstat` through the variant's layout descriptor

use native_core::{Errno, PosixLayout};
use native_libc::PosixCLibrary;
use serde::Serialize;
use std::os::fd::RawFd;
use std::path::Path;

/// The two `struct stat` fields native-access reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FileStat {
    /// `st_size`, in bytes
    pub size: i64,
    /// `st_blocks`, in units of `PosixLayout::stat_block_unit`
    pub blocks: i64,
}

impl FileStat {
    /// Bytes actually allocated on disk
    pub fn allocated_bytes(&self, layout: &PosixLayout) -> u64 {
        (self.blocks.max(0) as u64).saturating_mul(layout.stat_block_unit)
    }
}

pub(crate) fn fstat(
    posix: &dyn PosixCLibrary,
    layout: &PosixLayout,
    fd: RawFd,
) -> Result<FileStat, Errno> {
    let mut buf = vec![0u8; layout.stat_buffer_len()];
    posix.fstat(fd, &mut buf)?;
    decode(layout, &buf)
}

pub(crate) fn stat_path(
    posix: &dyn PosixCLibrary,
    layout: &PosixLayout,
    path: &Path,
) -> Result<FileStat, Errno> {
    let mut buf = vec![0u8; layout.stat_buffer_len()];
    posix.stat(path, &mut buf)?;
    decode(layout, &buf)
}

fn decode(layout: &PosixLayout, buf: &[u8]) -> Result<FileStat, Errno> {
    let size = layout
        .read_size(buf)
        .ok_or(Errno::from_raw(libc::EINVAL))?;
    let blocks = layout
        .read_blocks(buf)
        .ok_or(Errno::from_raw(libc::EINVAL))?;
    Ok(FileStat { size, blocks })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocated_bytes_uses_block_unit() {
        let stat = FileStat {
            size: 10,
            blocks: 8,
        };
        assert_eq!(stat.allocated_bytes(&PosixLayout::LINUX_X86_64), 4096);
    }

    #[test]
    fn negative_blocks_clamp_to_zero() {
        let stat = FileStat {
            size: 0,
            blocks: -1,
        };
        assert_eq!(stat.allocated_bytes(&PosixLayout::FREEBSD), 0);
    }
}
