// SPDX-License-Identifier: AGPL-3.0-only

//! Memory-mapped I/O through `/dev/mem`
//!
//! Maps a physical window (register block or shared SDRAM) into the process
//! with `rustix::mm::mmap`. `/dev/mem` is opened with `O_SYNC`, which makes
//! the kernel map the pages uncached; together with volatile accesses this
//! gives one bus transaction per register read or write.
//!
//! Physical bases need not be page aligned: the mapping starts at the
//! enclosing page and accesses are offset into it.

// MMIO registers are naturally aligned by hardware, so pointer casts are safe
#![allow(clippy::cast_ptr_alignment)]

use crate::error::{Result, VecdotError};
use crate::memory::WordMemory;
use crate::regfile::RegisterFile;
use rustix::fs::{open, Mode, OFlags};
use rustix::mm::{mmap, munmap, MapFlags, ProtFlags};
use std::ptr::NonNull;

const DEV_MEM: &str = "/dev/mem";

/// A physical window mapped into the process.
///
/// Not `Clone`: each window has exactly one owner, and dropping it unmaps
/// the pages.
pub struct MmioRegion {
    /// Start of the page-aligned mapping
    map: NonNull<u8>,
    /// Length of the page-aligned mapping
    map_len: usize,
    /// Byte offset of the requested base inside the mapping
    offset: usize,
    /// Requested window size in bytes
    size: usize,
    /// Physical base address
    phys: u64,
}

impl std::fmt::Debug for MmioRegion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MmioRegion")
            .field("phys", &format_args!("{:#x}", self.phys))
            .field("size", &format_args!("{:#x}", self.size))
            .field("map", &format_args!("{:p}", self.map))
            .finish_non_exhaustive()
    }
}

// SAFETY: Send - MmioRegion owns its mapping exclusively. Moving it between
// threads does not invalidate the mapping (mmap'd memory is process-wide).
unsafe impl Send for MmioRegion {}

impl MmioRegion {
    /// Map `size` bytes of physical memory starting at `phys`.
    ///
    /// # Errors
    ///
    /// Returns error if `/dev/mem` cannot be opened (needs root or
    /// `CAP_SYS_RAWIO`) or the mapping fails.
    pub fn map(phys: u64, size: usize) -> Result<Self> {
        let page = rustix::param::page_size() as u64;
        let page_base = phys & !(page - 1);
        #[allow(clippy::cast_possible_truncation)]
        let offset = (phys - page_base) as usize;
        let map_len = offset + size;

        let fd = open(DEV_MEM, OFlags::RDWR | OFlags::SYNC, Mode::empty())
            .map_err(|e| VecdotError::map(format!("{DEV_MEM} (phys {phys:#x})"), e))?;

        // SAFETY: mmap necessary for MMIO - maps the physical window into the
        // process. Invariants: (1) fd is an open /dev/mem descriptor;
        // (2) page_base is page aligned; (3) map_len > 0 covers the window;
        // (4) on success the pointer is valid for map_len bytes until munmap.
        let ptr = unsafe {
            mmap(
                std::ptr::null_mut(),
                map_len,
                ProtFlags::READ | ProtFlags::WRITE,
                MapFlags::SHARED,
                &fd,
                page_base,
            )
        }
        .map_err(|e| VecdotError::map(format!("phys {phys:#x}+{size:#x}"), e))?;

        let map = NonNull::new(ptr.cast::<u8>()).ok_or_else(|| {
            VecdotError::map(
                format!("phys {phys:#x}"),
                std::io::Error::other("mmap returned null"),
            )
        })?;

        tracing::info!("Mapped phys {phys:#x} ({size:#x} bytes) at {map:p}+{offset:#x}");

        Ok(Self {
            map,
            map_len,
            offset,
            size,
            phys,
        })
    }

    /// Physical base address
    pub const fn phys(&self) -> u64 {
        self.phys
    }

    /// Window size in bytes
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Window size in 32-bit words
    pub const fn words(&self) -> usize {
        self.size / 4
    }

    fn word_ptr(&self, index: usize) -> *mut u32 {
        debug_assert!(
            (index + 1) * 4 <= self.size,
            "word {index} outside {:#x}-byte window at {:#x}",
            self.size,
            self.phys
        );
        // SAFETY: the window starts `offset` bytes into a mapping of
        // `map_len` bytes; callers stay within `size` (checked in debug).
        unsafe { self.map.as_ptr().add(self.offset + index * 4).cast::<u32>() }
    }

    /// Volatile 32-bit read of word `index`
    pub fn read32(&self, index: usize) -> u32 {
        // SAFETY: read_volatile necessary for MMIO - hardware can change the
        // value between reads. Pointer is in the mapping and 4-byte aligned
        // (page-aligned map plus word-aligned physical base).
        let value = unsafe { self.word_ptr(index).read_volatile() };
        tracing::trace!("Read u32 @ {:#x} = {value:#x}", self.phys + (index as u64) * 4);
        value
    }

    /// Volatile 32-bit write of word `index`
    pub fn write32(&mut self, index: usize, value: u32) {
        tracing::trace!("Write u32 @ {:#x} = {value:#x}", self.phys + (index as u64) * 4);
        // SAFETY: write_volatile necessary for MMIO - triggers hardware side
        // effects. Same pointer invariants as read32; &mut self gives
        // exclusive access.
        unsafe { self.word_ptr(index).write_volatile(value) }
    }
}

impl RegisterFile for MmioRegion {
    fn read(&mut self, offset: usize) -> u32 {
        self.read32(offset)
    }

    fn write(&mut self, offset: usize, value: u32) {
        self.write32(offset, value);
    }
}

impl WordMemory for MmioRegion {
    fn capacity(&self) -> usize {
        self.words()
    }

    #[allow(clippy::cast_possible_wrap)]
    fn load(&self, index: usize) -> i32 {
        self.read32(index) as i32
    }

    #[allow(clippy::cast_sign_loss)]
    fn store(&mut self, index: usize, value: i32) {
        self.write32(index, value as u32);
    }
}

impl Drop for MmioRegion {
    fn drop(&mut self) {
        // SAFETY: munmap necessary - releases the mapping created in map().
        // Invariants: (1) map/map_len are exactly what mmap returned/was given;
        // (2) Drop runs at most once; (3) no references outlive self.
        unsafe {
            if let Err(e) = munmap(self.map.as_ptr().cast(), self.map_len) {
                tracing::error!("munmap failed during drop: {e}");
            }
        }
        tracing::debug!("Unmapped phys {:#x}", self.phys);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapping_without_privileges_fails_cleanly() {
        // Only meaningful when not running as root; with root the map succeeds
        // and is dropped straight away.
        if let Err(e) = MmioRegion::map(vecdot_chip::memmap::TIMER_BASE, 24) {
            assert!(matches!(e, VecdotError::Map { .. }));
        }
    }
}
