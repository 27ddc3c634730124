//! Validated device byte range
//!
//! 经过验证的设备字节范围

use std::ops::Range;

/// Byte range inside a device
///
/// 设备内的字节范围
///
/// Represents a range `[start, end)` that has been checked against the size of the
/// [`Device`](super::Device) that produced it. Use [`Device::range`](super::Device::range)
/// to obtain one.
///
/// 表示已根据产生它的 [`Device`](super::Device) 大小检查过的范围 `[start, end)`。
/// 通过 [`Device::range`](super::Device::range) 获取。
///
/// # Examples
///
/// ```
/// # use mapped_device::{Device, Result};
/// # use tempfile::NamedTempFile;
/// # use std::io::Write;
/// # fn main() -> Result<()> {
/// # let mut tmp = NamedTempFile::new()?;
/// # tmp.write_all(&[0u8; 100])?;
/// let device = Device::open(tmp.path())?;
///
/// // Lengths past the end are clipped to the device size
/// // 超出末尾的长度会被截断到设备大小
/// let range = device.range(90, 64)?;
/// assert_eq!(range.start(), 90);
/// assert_eq!(range.end(), 100);
/// assert_eq!(range.len(), 10);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeviceRange {
    /// Range start position (inclusive)
    ///
    /// 范围起始位置（包含）
    start: u64,

    /// Range end position (exclusive)
    ///
    /// 范围结束位置（不包含）
    end: u64,
}

impl DeviceRange {
    /// Internal constructor, caller has validated `start <= end`
    ///
    /// 内部构造函数，调用者已验证 `start <= end`
    #[inline]
    pub(crate) fn from_range_unchecked(start: u64, end: u64) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    /// Start position (inclusive)
    ///
    /// 起始位置（包含）
    #[inline]
    pub fn start(&self) -> u64 {
        self.start
    }

    /// End position (exclusive)
    ///
    /// 结束位置（不包含）
    #[inline]
    pub fn end(&self) -> u64 {
        self.end
    }

    /// Length of the range in bytes
    ///
    /// 范围长度（字节数）
    #[inline]
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    /// Check if the range is empty
    ///
    /// 检查范围是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether `offset` falls inside the range
    ///
    /// `offset` 是否位于范围内
    #[inline]
    pub fn contains(&self, offset: u64) -> bool {
        self.start <= offset && offset < self.end
    }

    /// Convert to a standard `Range<u64>`
    ///
    /// 转换为标准 `Range<u64>`
    #[inline]
    pub fn as_range(&self) -> Range<u64> {
        self.start..self.end
    }

    /// Byte span as `usize` indices, if it fits the address space
    ///
    /// 以 `usize` 索引表示的字节范围（需能放入地址空间）
    #[inline]
    pub(crate) fn as_usize_range(&self) -> Option<Range<usize>> {
        let start = usize::try_from(self.start).ok()?;
        let end = usize::try_from(self.end).ok()?;
        Some(start..end)
    }
}

impl From<DeviceRange> for Range<u64> {
    #[inline]
    fn from(range: DeviceRange) -> Self {
        range.as_range()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_accessors() {
        let range = DeviceRange::from_range_unchecked(10, 30);
        assert_eq!(range.len(), 20);
        assert!(!range.is_empty());
        assert!(range.contains(10));
        assert!(range.contains(29));
        assert!(!range.contains(30));
        assert_eq!(Range::from(range), 10..30);
        assert_eq!(range.as_usize_range(), Some(10..30));
    }

    #[test]
    fn test_empty_range() {
        let range = DeviceRange::from_range_unchecked(5, 5);
        assert!(range.is_empty());
        assert!(!range.contains(5));
    }
}
