//! Device access built on memmap2 with a positioned-read fallback
//!
//! 基于 memmap2 的设备访问，带定位读取回退
//!
//! A [`Device`] hides two access strategies behind one interface:
//! - [`AccessMode::Mapped`]: the device (up to [`MAP_CEILING`] bytes) is mapped
//!   read-only and reads borrow the mapping directly
//! - [`AccessMode::Buffered`]: no mapping could be made, every read is a `pread`
//!   into a buffer owned by the caller
//!
//! [`Device`] 在一个接口后隐藏了两种访问策略：
//! - [`AccessMode::Mapped`]：设备（最多 [`MAP_CEILING`] 字节）被只读映射，读取直接借用映射
//! - [`AccessMode::Buffered`]：无法建立映射，所有读取都通过 `pread` 写入调用者独有的缓冲区
//!
//! Bytes past the mapping ceiling are served by positioned reads even in
//! mapped mode.
//!
//! 即使在映射模式下，超出映射上限的字节也通过定位读取提供。
//!
//! # Releasing Pages
//!
//! [`Device::release`] drops the physical pages behind part of the mapping
//! while keeping its virtual addresses reserved. It is `unsafe` because any slice
//! still pointing into the range would observe the pages turning to zero.
//!
//! # 释放页
//!
//! [`Device::release`] 丢弃映射中部分区域背后的物理页，同时保留其虚拟地址。
//! 由于仍指向该范围的切片会看到数据变为零，此方法为 `unsafe`。
//!
//! ```
//! # use mapped_device::{Device, Result};
//! # use tempfile::NamedTempFile;
//! # use std::io::Write;
//! # fn main() -> Result<()> {
//! # let mut tmp = NamedTempFile::new()?;
//! # tmp.write_all(&vec![0xAB; 1 << 20])?;
//! let device = Device::open(tmp.path())?;
//! assert_eq!(device.byte_at(0)?, 0xAB);
//!
//! // Safety: nothing borrows the device right now
//! // Safety: 当前没有任何对设备的借用
//! unsafe { device.release(0, device.map_len())? };
//! assert_eq!(device.byte_at(0)?, 0);
//! # Ok(())
//! # }
//! ```

mod backing;
mod error;
mod handle;
mod options;
mod pages;
mod probe;
mod range;


// Re-export public API
// 重新导出公共 API
pub use error::{Error, Result};
pub use handle::{AccessMode, Device};
pub use options::{DeviceOptions, MAP_CEILING, SCRATCH_SIZE};
pub use range::DeviceRange;
