//! Byte-addressable read access to block devices and files
//!
//! 块设备和文件的按字节寻址读取
//!
//! This library gives on-disk structure parsers (filesystem metadata readers,
//! partition table scanners, forensic tools) one read-only view over a device of
//! any size. The device is memory-mapped when the platform allows it, and read
//! with positioned reads otherwise.
//!
//! 本库为磁盘结构解析器（文件系统元数据读取器、分区表扫描器、取证工具）
//! 提供任意大小设备上的统一只读视图。平台允许时使用内存映射，否则使用定位读取。
//!
//! # Features
//!
//! - **Zero-copy reads**: Mapped reads borrow the mapping directly
//! - **Transparent fallback**: A failed mapping only changes how bytes are fetched
//! - **Bounds-checked views**: Every offset is validated against the device size
//! - **Race-free fallback**: Each positioned read fills a buffer owned by its caller
//! - **Page release**: Drop cached pages of the mapping without unmapping it
//!
//! # 特性
//!
//! - **零拷贝读取**：映射读取直接借用映射
//! - **透明回退**：映射失败只改变字节的获取方式
//! - **边界检查视图**：每个偏移量都根据设备大小验证
//! - **无竞争回退**：每次定位读取都填充调用者独有的缓冲区
//! - **页释放**：在不解除映射的情况下丢弃映射的缓存页
//!
//! # Quick Start
//!
//! ## 快速开始
//!
//! ```
//! use mapped_device::{AccessMode, Device, Result};
//! # use tempfile::NamedTempFile;
//! # use std::io::Write;
//! # fn main() -> Result<()> {
//! # let mut tmp = NamedTempFile::new()?;
//! # let mut image = vec![0u8; 4096];
//! # image[510] = 0x55;
//! # image[511] = 0xAA;
//! # tmp.write_all(&image)?;
//! # let path = tmp.path();
//!
//! // Open an image file or block device such as /dev/sda
//! // 打开镜像文件或块设备（例如 /dev/sda）
//! let device = Device::open(path)?;
//! assert_eq!(device.mode(), AccessMode::Mapped);
//!
//! // Check the MBR boot signature
//! // 检查 MBR 引导签名
//! let signature = device.data_at(510, 2)?;
//! assert_eq!(&*signature, &[0x55, 0xAA]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Forcing Positioned Reads
//!
//! ## 强制使用定位读取
//!
//! ```
//! use mapped_device::{AccessMode, Device, Result};
//! # use tempfile::NamedTempFile;
//! # use std::io::Write;
//! # fn main() -> Result<()> {
//! # let mut tmp = NamedTempFile::new()?;
//! # tmp.write_all(&[1, 2, 3, 4, 5, 6, 7, 8])?;
//!
//! let device = Device::options().map(false).open(tmp.path())?;
//! assert_eq!(device.mode(), AccessMode::Buffered);
//! assert!(device.slice().is_empty());
//!
//! // Each read owns its bytes, so both stay valid
//! // 每次读取都拥有自己的字节，因此两者都保持有效
//! let head = device.data_at(0, 2)?;
//! let tail = device.data_at(6, 2)?;
//! assert_eq!(&*head, &[1, 2]);
//! assert_eq!(&*tail, &[7, 8]);
//! # Ok(())
//! # }
//! ```
//!
//! # Main Types
//!
//! - [`Device`]: Read-only view over a block device or file
//! - [`DeviceOptions`]: Open options (access hint, mapping ceiling)
//! - [`AccessMode`]: Whether a device is mapped or buffered
//! - [`DeviceRange`]: Bounds-checked byte range inside a device
//!
//! # 主要类型
//!
//! - [`Device`]：块设备或文件上的只读视图
//! - [`DeviceOptions`]：打开选项（访问提示、映射上限）
//! - [`AccessMode`]：设备是映射模式还是缓冲模式
//! - [`DeviceRange`]：设备内经过边界检查的字节范围

#[cfg(not(unix))]
compile_error!("mapped-device supports Unix-like targets only");

mod device;

pub use device::{
    AccessMode, Device, DeviceOptions, DeviceRange, Error, MAP_CEILING, Result, SCRATCH_SIZE,
};
