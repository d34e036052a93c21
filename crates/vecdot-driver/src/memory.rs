// SPDX-License-Identifier: AGPL-3.0-only

//! Shared vector memory and buffer layout
//!
//! Vectors live in memory that both the processor and the accelerator can
//! address. The processor indexes it by word; the accelerator is given byte
//! addresses relative to its own view of the window
//! ([`memmap::ACC_SDRAM_BASE`]).

use crate::error::{Result, VecdotError};
use std::fmt::Debug;
use vecdot_chip::memmap;
use vecdot_chip::regs::ELEMENT_BYTES;

/// Word-addressed memory holding signed 32-bit vector elements.
pub trait WordMemory: Debug {
    /// Number of 32-bit words in the window.
    fn capacity(&self) -> usize;

    /// Load the word at `index`.
    fn load(&self, index: usize) -> i32;

    /// Store `value` at `index`.
    fn store(&mut self, index: usize, value: i32);
}

impl WordMemory for Vec<i32> {
    fn capacity(&self) -> usize {
        self.len()
    }

    fn load(&self, index: usize) -> i32 {
        self[index]
    }

    fn store(&mut self, index: usize, value: i32) {
        self[index] = value;
    }
}

impl<M: WordMemory + ?Sized> WordMemory for &mut M {
    fn capacity(&self) -> usize {
        (**self).capacity()
    }

    fn load(&self, index: usize) -> i32 {
        (**self).load(index)
    }

    fn store(&mut self, index: usize, value: i32) {
        (**self).store(index, value);
    }
}

/// A contiguous run of words inside a [`WordMemory`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VectorBuffer {
    start: usize,
    len: usize,
}

impl VectorBuffer {
    /// Buffer of `len` elements starting at word `start`.
    pub const fn new(start: usize, len: usize) -> Self {
        Self { start, len }
    }

    /// First word index.
    pub const fn start(&self) -> usize {
        self.start
    }

    /// Element count.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the buffer holds no elements.
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// One past the last word index.
    pub const fn end(&self) -> usize {
        self.start + self.len
    }

    /// Whether two buffers share at least one word. Empty buffers never overlap.
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end() && other.start < self.end()
    }
}

/// Validated placement of vectors A and B, with the byte addresses the
/// accelerator expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VectorLayout {
    a: VectorBuffer,
    b: VectorBuffer,
    address_a: u32,
    address_b: u32,
}

impl VectorLayout {
    /// Standard layout: A at word 0, B immediately after A.
    ///
    /// # Errors
    ///
    /// Returns error if both vectors do not fit in `capacity` words or the
    /// length cannot be programmed into `VEC_LENGTH`.
    pub fn packed(len: usize, capacity: usize) -> Result<Self> {
        Self::new(VectorBuffer::new(0, len), VectorBuffer::new(len, len), capacity)
    }

    /// Explicit placement.
    ///
    /// # Errors
    ///
    /// Returns error if the buffers differ in length, overlap, exceed
    /// `capacity`, or lie outside the accelerator's 32-bit address space.
    pub fn new(a: VectorBuffer, b: VectorBuffer, capacity: usize) -> Result<Self> {
        let len = a.len();
        if b.len() != len {
            return Err(VecdotError::invalid_length(
                len,
                format!("vector B holds {} elements", b.len()),
            ));
        }
        if u32::try_from(len).is_err() {
            return Err(VecdotError::invalid_length(
                len,
                "does not fit the 32-bit VEC_LENGTH register",
            ));
        }
        if a.overlaps(&b) {
            return Err(VecdotError::OverlappingBuffers {
                a_start: a.start(),
                a_end: a.end(),
                b_start: b.start(),
                b_end: b.end(),
            });
        }

        let needed = a.end().max(b.end());
        if needed > capacity {
            return Err(VecdotError::CapacityExceeded {
                requested: len,
                needed,
                capacity,
            });
        }

        let address_a = accel_address(a.start())
            .ok_or_else(|| VecdotError::invalid_length(len, "vector A outside accelerator address space"))?;
        let address_b = accel_address(b.start())
            .ok_or_else(|| VecdotError::invalid_length(len, "vector B outside accelerator address space"))?;

        Ok(Self {
            a,
            b,
            address_a,
            address_b,
        })
    }

    /// Vector A.
    pub const fn a(&self) -> VectorBuffer {
        self.a
    }

    /// Vector B.
    pub const fn b(&self) -> VectorBuffer {
        self.b
    }

    /// Element count of each vector.
    pub const fn len(&self) -> usize {
        self.a.len()
    }

    /// Whether the vectors are empty.
    pub const fn is_empty(&self) -> bool {
        self.a.is_empty()
    }

    /// Accelerator byte address of A.
    pub const fn address_a(&self) -> u32 {
        self.address_a
    }

    /// Accelerator byte address of B.
    pub const fn address_b(&self) -> u32 {
        self.address_b
    }
}

/// Accelerator byte address of word `index`.
pub fn accel_address(index: usize) -> Option<u32> {
    u32::try_from(index)
        .ok()?
        .checked_mul(ELEMENT_BYTES)?
        .checked_add(memmap::ACC_SDRAM_BASE)
}

/// Word index of accelerator byte address `address`.
pub const fn word_index(address: u32) -> usize {
    ((address - memmap::ACC_SDRAM_BASE) / ELEMENT_BYTES) as usize
}
