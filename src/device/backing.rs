//! Storage backing a device: a memory mapping or plain positioned reads
//!
//! 设备的存储后端：内存映射或普通定位读取

use super::options::DeviceOptions;
use memmap2::{Advice, Mmap, MmapOptions};
use std::fs::File;
use std::io;
use std::path::Path;
use tracing::{debug, warn};

/// How device bytes are reached
///
/// 访问设备字节的方式
pub(crate) enum Backing {
    /// `mmap` covers the first `min(size, map_ceiling)` bytes
    ///
    /// `mmap` 覆盖前 `min(size, map_ceiling)` 字节
    Mapped { file: File, mmap: Mmap },

    /// Every read goes through `pread`
    ///
    /// 所有读取都通过 `pread`
    Buffered { file: File },
}

impl Backing {
    /// Try to map the device, falling back to positioned reads on any failure
    ///
    /// 尝试映射设备，任何失败都回退到定位读取
    pub(crate) fn establish(file: File, size: u64, options: &DeviceOptions, path: &Path) -> Self {
        Self::establish_with(file, size, options, path, map_prefix)
    }

    /// [`establish`](Self::establish) with the mapping step supplied by the caller
    ///
    /// 由调用者提供映射步骤的 [`establish`](Self::establish)
    pub(crate) fn establish_with<M>(
        file: File,
        size: u64,
        options: &DeviceOptions,
        path: &Path,
        map: M,
    ) -> Self
    where
        M: FnOnce(&File, u64) -> io::Result<Mmap>,
    {
        let map_size = size.min(options.map_ceiling);

        if !options.map {
            debug!(path = %path.display(), "mapping disabled, using positioned reads");
            return Self::buffered(file, options.sequential);
        }
        if map_size == 0 {
            debug!(path = %path.display(), "nothing to map, using positioned reads");
            return Self::buffered(file, options.sequential);
        }

        match map(&file, map_size) {
            Ok(mmap) => {
                advise_mapping(&mmap, options.sequential);
                Self::Mapped { file, mmap }
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    map_size,
                    error = %err,
                    "memory mapping failed, falling back to positioned reads"
                );
                Self::buffered(file, options.sequential)
            }
        }
    }

    fn buffered(file: File, sequential: bool) -> Self {
        advise_file(&file, sequential);
        Self::Buffered { file }
    }

    #[inline]
    pub(crate) fn file(&self) -> &File {
        match self {
            Self::Mapped { file, .. } | Self::Buffered { file } => file,
        }
    }

    #[inline]
    pub(crate) fn mmap(&self) -> Option<&Mmap> {
        match self {
            Self::Mapped { mmap, .. } => Some(mmap),
            Self::Buffered { .. } => None,
        }
    }

    /// Number of leading device bytes served from the mapping
    ///
    /// 由映射提供的设备前缀字节数
    #[inline]
    pub(crate) fn map_len(&self) -> u64 {
        self.mmap().map_or(0, |mmap| mmap.len() as u64)
    }
}

fn map_prefix(file: &File, map_size: u64) -> io::Result<Mmap> {
    let len = usize::try_from(map_size).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "mapping length exceeds the address space",
        )
    })?;

    // Safety: the mapping is read-only and the device is assumed not to be
    // truncated while mapped.
    // Safety: 映射为只读，并假定设备在映射期间不会被截断。
    unsafe { MmapOptions::new().len(len).map(file) }
}

fn advise_mapping(mmap: &Mmap, sequential: bool) {
    let advice = if sequential {
        Advice::Sequential
    } else {
        Advice::Random
    };
    if let Err(err) = mmap.advise(advice) {
        debug!(error = %err, ?advice, "madvise hint rejected");
    }
}

#[cfg(target_os = "linux")]
fn advise_file(file: &File, sequential: bool) {
    use rustix::fs::{Advice, fadvise};

    let advice = if sequential {
        Advice::Sequential
    } else {
        Advice::Random
    };
    if let Err(err) = fadvise(file, 0, None, advice) {
        debug!(error = %err, "fadvise hint rejected");
    }
}

#[cfg(not(target_os = "linux"))]
fn advise_file(_file: &File, _sequential: bool) {}

/// Positioned read that keeps going until `buf` is full or the file ends
///
/// 持续读取直到 `buf` 填满或到达文件末尾的定位读取
///
/// Returns the number of bytes placed in `buf`.
pub(crate) fn pread_full(file: &File, mut offset: u64, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match rustix::io::pread(file, &mut buf[filled..], offset) {
            Ok(0) => break,
            Ok(n) => {
                filled += n;
                offset += n as u64;
            }
            Err(rustix::io::Errno::INTR) => continue,
            Err(errno) => return Err(errno.into()),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn file_with(data: &[u8]) -> NamedTempFile {
        let mut tmp = NamedTempFile::new().unwrap();
        tmp.write_all(data).unwrap();
        tmp.flush().unwrap();
        tmp
    }

    #[test]
    fn test_establish_maps_whole_file() {
        let tmp = file_with(&[3u8; 8192]);
        let file = File::open(tmp.path()).unwrap();

        let backing = Backing::establish(file, 8192, &DeviceOptions::new(), tmp.path());
        assert_eq!(backing.map_len(), 8192);
        assert!(backing.mmap().is_some());
    }

    #[test]
    fn test_establish_respects_ceiling() {
        let tmp = file_with(&[3u8; 8192]);
        let file = File::open(tmp.path()).unwrap();

        let mut options = DeviceOptions::new();
        options.map_ceiling(4096);
        let backing = Backing::establish(file, 8192, &options, tmp.path());
        assert_eq!(backing.map_len(), 4096);
    }

    #[test]
    fn test_establish_empty_file_is_buffered() {
        let tmp = NamedTempFile::new().unwrap();
        let file = File::open(tmp.path()).unwrap();

        let backing = Backing::establish(file, 0, &DeviceOptions::new(), tmp.path());
        assert!(backing.mmap().is_none());
        assert_eq!(backing.map_len(), 0);
    }

    #[test]
    fn test_establish_recovers_from_map_failure() {
        let tmp = file_with(b"fallback");
        let file = File::open(tmp.path()).unwrap();

        let backing = Backing::establish_with(
            file,
            8,
            &DeviceOptions::new(),
            tmp.path(),
            |_, _| Err(io::Error::from_raw_os_error(12)),
        );
        assert!(backing.mmap().is_none());
        assert_eq!(backing.map_len(), 0);

        let mut buf = [0u8; 8];
        assert_eq!(pread_full(backing.file(), 0, &mut buf).unwrap(), 8);
        assert_eq!(&buf, b"fallback");
    }

    #[test]
    fn test_pread_full_stops_at_eof() {
        let tmp = file_with(b"0123456789");
        let file = File::open(tmp.path()).unwrap();

        let mut buf = [0u8; 8];
        assert_eq!(pread_full(&file, 6, &mut buf).unwrap(), 4);
        assert_eq!(&buf[..4], b"6789");

        assert_eq!(pread_full(&file, 2, &mut buf).unwrap(), 8);
        assert_eq!(&buf, b"23456789");
    }
}
