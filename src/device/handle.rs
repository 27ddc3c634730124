//! Read-only device handle
//!
//! 只读设备句柄

use super::backing::{Backing, pread_full};
use super::error::{Error, Result};
use super::options::DeviceOptions;
use super::pages;
use super::probe::probe;
use super::range::DeviceRange;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace};

/// How a [`Device`] serves reads
///
/// [`Device`] 提供读取的方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AccessMode {
    /// Reads below [`Device::map_len`] come straight from a memory mapping
    ///
    /// [`Device::map_len`] 以下的读取直接来自内存映射
    Mapped,

    /// No mapping exists; every read is a positioned read
    ///
    /// 不存在映射；所有读取都是定位读取
    Buffered,
}

/// Read-only, byte-addressable view over a block device or file
///
/// 块设备或文件上的只读、按字节寻址的视图
///
/// On open the device is validated, its size is measured once, and a read-only
/// mapping of the first `min(size, map_ceiling)` bytes is attempted. If mapping
/// fails the device still opens and serves every read with `pread`.
///
/// 打开时会验证设备、测量一次大小，并尝试对前 `min(size, map_ceiling)` 字节建立只读映射。
/// 映射失败时设备仍会打开，并通过 `pread` 提供所有读取。
///
/// # Concurrency
///
/// `Device` is cheap to clone and every clone shares one mapping and file handle.
/// All read methods take `&self` and may be called from any number of threads:
/// mapped reads borrow the mapping, and fallback reads fill a buffer owned by the
/// caller, so one reader never disturbs another.
///
/// # 并发
///
/// `Device` 克隆开销很小，所有克隆共享同一个映射和文件句柄。
/// 所有读取方法都接受 `&self`，可在任意数量的线程中调用：
/// 映射读取借用映射本身，回退读取填充调用者独有的缓冲区，读取之间互不干扰。
///
/// # Examples
///
/// ```
/// # use mapped_device::{AccessMode, Device, Result};
/// # use tempfile::NamedTempFile;
/// # use std::io::Write;
/// # fn main() -> Result<()> {
/// # let mut tmp = NamedTempFile::new()?;
/// # tmp.write_all(b"\xEB\x52\x90NTFS    ")?;
/// let device = Device::open(tmp.path())?;
/// assert_eq!(device.mode(), AccessMode::Mapped);
///
/// let oem = device.data_at(3, 8)?;
/// assert_eq!(&*oem, b"NTFS    ");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Device {
    inner: Arc<DeviceInner>,
}

struct DeviceInner {
    path: PathBuf,

    /// Measured once at open
    ///
    /// 打开时测量一次
    size: u64,

    scratch_size: usize,

    backing: Backing,
}

impl Device {
    /// Open a device for random access with default options
    ///
    /// 使用默认选项打开设备（随机访问）
    ///
    /// # Errors
    /// See [`DeviceOptions::open`].
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        DeviceOptions::new().open(path)
    }

    /// Start building a device with custom options
    ///
    /// 使用自定义选项构建设备
    pub fn options() -> DeviceOptions {
        DeviceOptions::new()
    }

    pub(crate) fn open_with(path: &Path, options: &DeviceOptions) -> Result<Self> {
        let (file, size) = probe(path)?;
        let backing = Backing::establish(file, size, options, path);
        Ok(Self::assemble(path, size, options, backing))
    }

    pub(crate) fn assemble(
        path: &Path,
        size: u64,
        options: &DeviceOptions,
        backing: Backing,
    ) -> Self {
        let device = Self {
            inner: Arc::new(DeviceInner {
                path: path.to_path_buf(),
                size,
                scratch_size: options.scratch_size.max(1),
                backing,
            }),
        };

        debug!(
            path = %path.display(),
            size,
            mode = ?device.mode(),
            map_len = device.map_len(),
            sequential = options.sequential,
            "device opened"
        );

        device
    }

    /// Path the device was opened from
    ///
    /// 打开设备时使用的路径
    #[inline]
    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Device size in bytes, fixed at open
    ///
    /// 设备大小（字节），在打开时确定
    #[inline]
    pub fn size(&self) -> u64 {
        self.inner.size
    }

    /// How reads are served, fixed at open
    ///
    /// 读取的提供方式，在打开时确定
    #[inline]
    pub fn mode(&self) -> AccessMode {
        match self.inner.backing {
            Backing::Mapped { .. } => AccessMode::Mapped,
            Backing::Buffered { .. } => AccessMode::Buffered,
        }
    }

    /// Whether a memory mapping was established
    ///
    /// 是否建立了内存映射
    #[inline]
    pub fn is_mapped(&self) -> bool {
        self.mode() == AccessMode::Mapped
    }

    /// Number of leading bytes served from the mapping (0 when buffered)
    ///
    /// 由映射提供的前缀字节数（缓冲模式下为 0）
    #[inline]
    pub fn map_len(&self) -> u64 {
        self.inner.backing.map_len()
    }

    /// The whole mapped region
    ///
    /// 整个映射区域
    ///
    /// Empty in [`AccessMode::Buffered`]; use [`data_at`](Self::data_at) or
    /// [`read_at`](Self::read_at) there.
    ///
    /// 在 [`AccessMode::Buffered`] 模式下为空；请改用 [`data_at`](Self::data_at) 或
    /// [`read_at`](Self::read_at)。
    #[inline]
    pub fn slice(&self) -> &[u8] {
        match self.inner.backing.mmap() {
            Some(mmap) => &mmap[..],
            None => &[],
        }
    }

    /// Validate `offset` and clip `[offset, offset + len)` to the device size
    ///
    /// 验证 `offset` 并将 `[offset, offset + len)` 截断到设备大小
    ///
    /// # Errors
    /// [`Error::OffsetOutOfRange`] if `offset >= size`.
    pub fn range(&self, offset: u64, len: u64) -> Result<DeviceRange> {
        let size = self.size();
        if offset >= size {
            return Err(Error::OffsetOutOfRange { offset, size });
        }
        let end = offset.saturating_add(len).min(size);
        Ok(DeviceRange::from_range_unchecked(offset, end))
    }

    /// Bytes starting at `offset`
    ///
    /// 从 `offset` 开始的字节
    ///
    /// Returns `min(len, size - offset)` bytes. When that span lies inside the
    /// mapping the result borrows the mapping directly. Otherwise the result owns
    /// a fresh buffer, capped at the configured scratch size, so later reads never
    /// overwrite data already handed out. Bytes of that buffer below
    /// [`map_len`](Self::map_len) are still copied from the mapping; only the
    /// rest comes from a positioned read. A `len` of 0 is treated as 1.
    ///
    /// 返回 `min(len, size - offset)` 字节。若该范围位于映射内，结果直接借用映射；
    /// 否则结果拥有一个新缓冲区（上限为配置的 scratch 大小），因此后续读取不会覆盖已返回的数据。
    /// 缓冲区中位于 [`map_len`](Self::map_len) 以下的字节仍从映射复制，只有其余部分来自定位读取。
    /// `len` 为 0 时按 1 处理。
    ///
    /// # Errors
    /// - [`Error::OffsetOutOfRange`] if `offset >= size`
    /// - [`Error::ShortRead`] if the positioned read comes up short
    ///
    /// # Examples
    ///
    /// ```
    /// # use mapped_device::{Device, Error, Result};
    /// # use tempfile::NamedTempFile;
    /// # use std::io::Write;
    /// # fn main() -> Result<()> {
    /// # let mut tmp = NamedTempFile::new()?;
    /// # tmp.write_all(b"hello world")?;
    /// let device = Device::open(tmp.path())?;
    ///
    /// assert_eq!(&*device.data_at(6, 5)?, b"world");
    /// assert_eq!(&*device.data_at(6, 100)?, b"world");
    /// assert!(matches!(
    ///     device.data_at(device.size(), 1),
    ///     Err(Error::OffsetOutOfRange { .. })
    /// ));
    /// # Ok(())
    /// # }
    /// ```
    pub fn data_at(&self, offset: u64, len: usize) -> Result<Cow<'_, [u8]>> {
        let range = self.range(offset, len.max(1) as u64)?;

        if let Some(bytes) = self.mapped_bytes(range) {
            return Ok(Cow::Borrowed(bytes));
        }

        let expected = (range.len() as usize).min(self.inner.scratch_size);
        let mut buf = vec![0u8; expected];
        let actual = self.fill(offset, &mut buf)?;
        if actual < expected {
            return Err(Error::ShortRead {
                offset,
                expected,
                actual,
            });
        }
        Ok(Cow::Owned(buf))
    }

    /// Single byte at `offset`
    ///
    /// `offset` 处的单个字节
    #[inline]
    pub fn byte_at(&self, offset: u64) -> Result<u8> {
        Ok(self.data_at(offset, 1)?[0])
    }

    /// Copy bytes starting at `offset` into `buf`
    ///
    /// 将从 `offset` 开始的字节复制到 `buf`
    ///
    /// Returns the number of bytes copied, which is less than `buf.len()` only
    /// near the end of the device and 0 at or past it.
    ///
    /// 返回复制的字节数；仅在接近设备末尾时小于 `buf.len()`，在末尾或之后为 0。
    pub fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        if offset >= self.size() || buf.is_empty() {
            return Ok(0);
        }
        let range = self.range(offset, buf.len() as u64)?;
        let len = range.len() as usize;
        self.fill(offset, &mut buf[..len])
    }

    /// Fill `buf` exactly with bytes starting at `offset`
    ///
    /// 用从 `offset` 开始的字节完整填充 `buf`
    ///
    /// # Errors
    /// - [`Error::OffsetOutOfRange`] if `offset >= size`
    /// - [`Error::ShortRead`] if fewer than `buf.len()` bytes are available
    pub fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let size = self.size();
        if offset >= size {
            return Err(Error::OffsetOutOfRange { offset, size });
        }
        let actual = self.read_at(offset, buf)?;
        if actual < buf.len() {
            return Err(Error::ShortRead {
                offset,
                expected: buf.len(),
                actual,
            });
        }
        Ok(())
    }

    /// Ask the OS to read ahead `[offset, offset + len)`
    ///
    /// 请求操作系统预读 `[offset, offset + len)`
    ///
    /// Only the mapped part of the range is affected; otherwise this does nothing.
    ///
    /// 仅影响范围内已映射的部分；其他情况下不执行任何操作。
    pub fn prefetch(&self, offset: u64, len: u64) {
        let Some(mmap) = self.inner.backing.mmap() else {
            return;
        };
        let map_len = mmap.len() as u64;
        if offset >= map_len || len == 0 {
            return;
        }
        let end = offset.saturating_add(len).min(map_len);
        if let Err(err) = mmap.advise_range(
            memmap2::Advice::WillNeed,
            offset as usize,
            (end - offset) as usize,
        ) {
            debug!(offset, len, error = %err, "prefetch hint rejected");
        }
    }

    /// Release the physical pages behind `[offset, offset + len)` of the mapping
    ///
    /// 释放映射中 `[offset, offset + len)` 背后的物理页
    ///
    /// The virtual range stays reserved by this device: a private zero-filled
    /// mapping is laid over it instead of unmapping it, so the address range can
    /// never be reused by an unrelated allocation. Afterwards the released bytes
    /// read as zero through [`slice`](Self::slice) and [`data_at`](Self::data_at);
    /// the device itself is untouched.
    ///
    /// Only whole pages inside the range are released; a partial page at either
    /// end is kept, except the final page of the mapping, which counts as whole.
    ///
    /// In [`AccessMode::Buffered`] there is nothing to release and this returns
    /// `Ok(())` for any arguments.
    ///
    /// 虚拟地址范围仍由本设备保留：不会执行 munmap，而是在其上覆盖一个私有的零填充映射，
    /// 因此该地址范围不会被无关的内存分配复用。之后通过 [`slice`](Self::slice) 和
    /// [`data_at`](Self::data_at) 读取被释放的字节将得到零；设备本身不受影响。
    ///
    /// 只释放范围内的完整页；两端的不完整页会被保留，映射的最后一页视为完整页。
    ///
    /// 在 [`AccessMode::Buffered`] 模式下无需释放，任何参数都返回 `Ok(())`。
    ///
    /// # Safety
    ///
    /// The caller must ensure no slice borrowed from this device, or from any of
    /// its clones, overlaps the released pages while this call runs or afterwards.
    ///
    /// # Safety
    ///
    /// 调用者必须确保在调用期间及之后，不存在从本设备（或其任何克隆）借用的、
    /// 与被释放页重叠的切片。
    ///
    /// # Errors
    /// - [`Error::RangeOutsideMapping`] if the range extends past the mapping
    /// - [`Error::Release`] if the OS rejects the overlay; its
    ///   [`raw_os_error`](Error::raw_os_error) carries the errno
    pub unsafe fn release(&self, offset: u64, len: u64) -> Result<()> {
        let Some(mmap) = self.inner.backing.mmap() else {
            trace!(offset, len, "release on buffered device is a no-op");
            return Ok(());
        };

        let map_len = mmap.len() as u64;
        let end = offset
            .checked_add(len)
            .filter(|&end| end <= map_len)
            .ok_or(Error::RangeOutsideMapping {
                offset,
                len,
                map_len,
            })?;

        let page = pages::page_size();
        let start = pages::align_up(offset, page);
        let stop = if end == map_len {
            pages::align_up(end, page)
        } else {
            pages::align_down(end, page)
        };
        if start >= stop {
            trace!(offset, len, "release range covers no whole page");
            return Ok(());
        }

        trace!(start, stop, "overlaying released pages");

        // Safety: `start` is page aligned and below `map_len`, the span ends on a
        // page boundary inside the mapping's last page, and the caller guarantees
        // nothing borrows it.
        // Safety: `start` 页对齐且小于 `map_len`，范围止于映射最后一页内的页边界，
        // 且调用者保证没有对其的借用。
        let released =
            unsafe { pages::decommit(mmap.as_ptr().add(start as usize), (stop - start) as usize) };
        released.map_err(|source| Error::Release {
            offset,
            len,
            source,
        })
    }

    /// Mapped bytes for `range`, if the whole range lies inside the mapping
    #[inline]
    fn mapped_bytes(&self, range: DeviceRange) -> Option<&[u8]> {
        let mmap = self.inner.backing.mmap()?;
        if range.end() > mmap.len() as u64 {
            return None;
        }
        mmap.get(range.as_usize_range()?)
    }

    /// Copy `buf.len()` bytes starting at `offset` into `buf`
    ///
    /// The part below `map_len` always comes from the mapping, so a byte reads
    /// the same whatever span it is requested in. Only the remainder past the
    /// mapping is fetched with `pread`. Returns the number of bytes filled.
    fn fill(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;

        if let Some(mmap) = self.inner.backing.mmap() {
            if let Ok(start) = usize::try_from(offset) {
                if start < mmap.len() {
                    filled = buf.len().min(mmap.len() - start);
                    buf[..filled].copy_from_slice(&mmap[start..start + filled]);
                }
            }
        }

        if filled < buf.len() {
            let rest = offset + filled as u64;
            trace!(offset = rest, len = buf.len() - filled, "positioned read");
            filled += pread_full(self.inner.backing.file(), rest, &mut buf[filled..])?;
        }

        Ok(filled)
    }
}

/// Implement Debug for Device
///
/// 为 Device 实现 Debug
impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("path", &self.inner.path)
            .field("size", &self.inner.size)
            .field("mode", &self.mode())
            .field("map_len", &self.map_len())
            .finish()
    }
}
