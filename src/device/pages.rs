//! Page-granular helpers for releasing mapped memory
//!
//! 用于释放映射内存的页粒度辅助函数

use rustix::mm::{MapFlags, ProtFlags, mmap_anonymous};
use std::ffi::c_void;
use std::io;

/// System page size in bytes
///
/// 系统页大小（字节）
#[inline]
pub(crate) fn page_size() -> u64 {
    rustix::param::page_size() as u64
}

/// Round `value` up to a multiple of `align` (a power of two)
///
/// 将 `value` 向上对齐到 `align` 的倍数（`align` 必须是 2 的幂）
#[inline]
pub(crate) const fn align_up(value: u64, align: u64) -> u64 {
    (value + align - 1) & !(align - 1)
}

/// Round `value` down to a multiple of `align` (a power of two)
///
/// 将 `value` 向下对齐到 `align` 的倍数（`align` 必须是 2 的幂）
#[inline]
pub(crate) const fn align_down(value: u64, align: u64) -> u64 {
    value & !(align - 1)
}

/// Drop the physical pages behind `[addr, addr + len)` while keeping the
/// virtual range reserved
///
/// 丢弃 `[addr, addr + len)` 背后的物理页，同时保留虚拟地址范围
///
/// A private zero-filled anonymous mapping is placed over the range with
/// `MAP_FIXED`, which atomically replaces the old pages. Unmapping instead would
/// let the kernel hand the range out to an unrelated allocation.
///
/// 使用 `MAP_FIXED` 在该范围上覆盖一个私有的零填充匿名映射，原子地替换旧页。
/// 若改为 munmap，内核可能将该范围分配给无关的内存申请。
///
/// # Safety
///
/// - `addr` must be page aligned and `len` a multiple of the page size
/// - The range must lie inside a mapping owned by the caller
/// - No live references into the range may exist; their contents change to zero
///
/// # Safety
///
/// - `addr` 必须页对齐，`len` 必须是页大小的整数倍
/// - 该范围必须位于调用者拥有的映射内
/// - 不得存在指向该范围的活动引用；其内容会变为零
pub(crate) unsafe fn decommit(addr: *const u8, len: usize) -> io::Result<()> {
    let replaced = unsafe {
        mmap_anonymous(
            addr as *mut c_void,
            len,
            ProtFlags::READ,
            MapFlags::PRIVATE | MapFlags::FIXED,
        )
    }?;
    debug_assert_eq!(replaced as *const u8, addr);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alignment_helpers() {
        assert_eq!(align_up(0, 4096), 0);
        assert_eq!(align_up(1, 4096), 4096);
        assert_eq!(align_up(4096, 4096), 4096);
        assert_eq!(align_down(4095, 4096), 0);
        assert_eq!(align_down(8193, 4096), 8192);
    }

    #[test]
    fn test_page_size_is_power_of_two() {
        assert!(page_size().is_power_of_two());
    }
}
