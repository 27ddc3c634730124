//! Error types for mapped-device
//!
//! mapped-device 的错误类型

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Error type for device operations
///
/// 设备操作的错误类型
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error
    ///
    /// I/O 错误
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The device path does not exist
    ///
    /// 设备路径不存在
    #[error("Device path not found: {} / 设备路径不存在", .path.display())]
    NotFound { path: PathBuf },

    /// The path is neither a regular file nor a block device
    ///
    /// 路径既不是普通文件也不是块设备
    #[error("{} is neither a regular file nor a block device / 不是普通文件或块设备", .path.display())]
    InvalidDeviceType { path: PathBuf },

    /// Opening the device or seeking to its end failed
    ///
    /// 打开设备或查询其大小失败
    #[error("Failed to query size of {}: {source}", .path.display())]
    SizeQueryFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Offset lies at or beyond the end of the device
    ///
    /// 偏移量超出设备末尾
    #[error("Offset {offset} is out of range for device of {size} bytes / 偏移量 {offset} 超出设备大小 {size}")]
    OffsetOutOfRange { offset: u64, size: u64 },

    /// A positioned read returned fewer bytes than expected
    ///
    /// 定位读取返回的字节数少于预期
    #[error("Short read at offset {offset}: expected {expected} bytes, got {actual} / 读取不足")]
    ShortRead {
        offset: u64,
        expected: usize,
        actual: usize,
    },

    /// Release range does not lie inside the mapped region
    ///
    /// 释放范围不在映射区域内
    #[error("Range [{offset}, {offset}+{len}) exceeds mapped region of {map_len} bytes / 范围超出映射区域")]
    RangeOutsideMapping { offset: u64, len: u64, map_len: u64 },

    /// The OS refused to overlay the released pages
    ///
    /// 操作系统拒绝覆盖释放的页
    #[error("Failed to release pages [{offset}, {offset}+{len}): {source}")]
    Release {
        offset: u64,
        len: u64,
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// OS error code carried by this error, if any
    ///
    /// 此错误携带的操作系统错误码（如有）
    ///
    /// Release failures report the errno of the failed overlay here.
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            Error::Io(err) => err.raw_os_error(),
            Error::SizeQueryFailed { source, .. } | Error::Release { source, .. } => {
                source.raw_os_error()
            }
            _ => None,
        }
    }
}

/// Convert from Error to io::Error for compatibility
///
/// 从 Error 转换到 io::Error 以保持兼容性
impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Io(io_err) => io_err,
            Error::NotFound { .. } => io::Error::new(io::ErrorKind::NotFound, err),
            Error::InvalidDeviceType { .. } => io::Error::new(io::ErrorKind::InvalidInput, err),
            Error::OffsetOutOfRange { .. } | Error::RangeOutsideMapping { .. } => {
                io::Error::new(io::ErrorKind::InvalidInput, err)
            }
            Error::ShortRead { .. } => io::Error::new(io::ErrorKind::UnexpectedEof, err),
            Error::SizeQueryFailed { .. } | Error::Release { .. } => io::Error::other(err),
        }
    }
}

/// Result type alias using our custom Error type
///
/// 使用自定义 Error 类型的 Result 类型别名
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_kinds() {
        let err: io::Error = Error::NotFound {
            path: PathBuf::from("/nope"),
        }
        .into();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);

        let err: io::Error = Error::ShortRead {
            offset: 0,
            expected: 4,
            actual: 1,
        }
        .into();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);

        let err: io::Error = Error::OffsetOutOfRange { offset: 10, size: 10 }.into();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_raw_os_error_from_release() {
        let err = Error::Release {
            offset: 0,
            len: 4096,
            source: io::Error::from_raw_os_error(12),
        };
        assert_eq!(err.raw_os_error(), Some(12));
        assert_eq!(Error::OffsetOutOfRange { offset: 1, size: 1 }.raw_os_error(), None);
    }
}
