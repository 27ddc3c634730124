//! Device open options
//!
//! 设备打开选项

use super::error::Result;
use super::handle::Device;
use std::path::Path;

/// Largest prefix of a device that will be memory-mapped (100 TiB)
///
/// 设备被内存映射的最大前缀长度（100 TiB）
///
/// Ordinary devices fit entirely; oversized virtual devices are capped and the
/// remainder is served by positioned reads.
///
/// 普通设备可以完整映射；超大的虚拟设备会被截断，剩余部分通过定位读取访问。
pub const MAP_CEILING: u64 = 100 << 40;

/// Maximum bytes returned by a single fallback read (64 MiB)
///
/// 单次回退读取返回的最大字节数（64 MiB）
pub const SCRATCH_SIZE: usize = 64 << 20;

/// Options for opening a [`Device`]
///
/// 打开 [`Device`] 的选项
///
/// Mirrors the builder shape of [`std::fs::OpenOptions`].
///
/// 与 [`std::fs::OpenOptions`] 的构建器形式一致。
///
/// # Examples
///
/// ```
/// # use mapped_device::{AccessMode, Device, Result};
/// # use tempfile::NamedTempFile;
/// # use std::io::Write;
/// # fn main() -> Result<()> {
/// # let mut tmp = NamedTempFile::new()?;
/// # tmp.write_all(b"superblock")?;
/// // Sequential scan, positioned reads only
/// // 顺序扫描，仅使用定位读取
/// let device = Device::options()
///     .sequential(true)
///     .map(false)
///     .open(tmp.path())?;
///
/// assert_eq!(device.mode(), AccessMode::Buffered);
/// assert_eq!(&*device.data_at(0, 5)?, b"super");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DeviceOptions {
    /// Access will be predominantly sequential
    ///
    /// 访问主要为顺序访问
    pub(crate) sequential: bool,

    /// Attempt a memory mapping at all
    ///
    /// 是否尝试内存映射
    pub(crate) map: bool,

    /// Largest prefix to map
    ///
    /// 映射的最大前缀
    pub(crate) map_ceiling: u64,

    /// Largest single fallback read
    ///
    /// 单次回退读取的最大长度
    pub(crate) scratch_size: usize,
}

impl Default for DeviceOptions {
    fn default() -> Self {
        Self {
            sequential: false,
            map: true,
            map_ceiling: MAP_CEILING,
            scratch_size: SCRATCH_SIZE,
        }
    }
}

impl DeviceOptions {
    /// Create options with defaults: random access, mapping enabled
    ///
    /// 使用默认值创建选项：随机访问，启用映射
    pub fn new() -> Self {
        Self::default()
    }

    /// Hint that reads will be mostly sequential
    ///
    /// 提示读取将主要为顺序读取
    ///
    /// Only read-ahead behavior changes; results are identical either way.
    ///
    /// 仅影响预读行为，不影响读取结果。
    pub fn sequential(&mut self, sequential: bool) -> &mut Self {
        self.sequential = sequential;
        self
    }

    /// Enable or disable the memory mapping attempt
    ///
    /// 启用或禁用内存映射尝试
    pub fn map(&mut self, map: bool) -> &mut Self {
        self.map = map;
        self
    }

    /// Set the largest prefix that will be mapped
    ///
    /// 设置映射的最大前缀
    pub fn map_ceiling(&mut self, map_ceiling: u64) -> &mut Self {
        self.map_ceiling = map_ceiling;
        self
    }

    /// Set the largest number of bytes a single fallback read returns
    ///
    /// 设置单次回退读取返回的最大字节数
    ///
    /// Values below 1 are raised to 1.
    pub fn scratch_size(&mut self, scratch_size: usize) -> &mut Self {
        self.scratch_size = scratch_size.max(1);
        self
    }

    /// Open a device at `path` with these options
    ///
    /// 使用这些选项打开 `path` 处的设备
    ///
    /// # Errors
    /// - [`Error::NotFound`](super::Error::NotFound) if `path` does not exist
    /// - [`Error::InvalidDeviceType`](super::Error::InvalidDeviceType) if `path` is not a
    ///   regular file or block device
    /// - [`Error::SizeQueryFailed`](super::Error::SizeQueryFailed) if the size cannot be read
    ///
    /// A failed mapping attempt is not an error; the device opens in
    /// [`AccessMode::Buffered`](super::AccessMode::Buffered).
    ///
    /// 映射失败不是错误；设备会以 [`AccessMode::Buffered`](super::AccessMode::Buffered) 模式打开。
    pub fn open(&self, path: impl AsRef<Path>) -> Result<Device> {
        Device::open_with(path.as_ref(), self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = DeviceOptions::new();
        assert!(!options.sequential);
        assert!(options.map);
        assert_eq!(options.map_ceiling, 100 * 1024 * 1024 * 1024 * 1024);
        assert_eq!(options.scratch_size, 64 * 1024 * 1024);
    }

    #[test]
    fn test_scratch_size_floor() {
        let mut options = DeviceOptions::new();
        options.scratch_size(0);
        assert_eq!(options.scratch_size, 1);
    }
}
