// SPDX-License-Identifier: AGPL-3.0-only

//! Register file abstraction
//!
//! A [`RegisterFile`] is a block of 32-bit registers addressed by word
//! offset. Every call is one bus transaction: implementations must never
//! cache, merge or reorder accesses, because the registers have side
//! effects (writing `CTRL` starts the accelerator, writing `SNAP_LO`
//! latches the timer).
//!
//! Offsets are not validated here. An out-of-range offset is a programming
//! error in the caller.

use std::fmt::Debug;

/// Word-addressed block of 32-bit hardware registers.
///
/// Both operations take `&mut self`: reads can have side effects on the
/// device (latched snapshots, busy-bit sampling), and exclusive access keeps
/// the configure/start handshake from interleaving with another writer.
pub trait RegisterFile: Debug {
    /// Read the register at word `offset`.
    fn read(&mut self, offset: usize) -> u32;

    /// Write `value` to the register at word `offset`.
    fn write(&mut self, offset: usize, value: u32);
}

impl<R: RegisterFile + ?Sized> RegisterFile for &mut R {
    fn read(&mut self, offset: usize) -> u32 {
        (**self).read(offset)
    }

    fn write(&mut self, offset: usize, value: u32) {
        (**self).write(offset, value);
    }
}

/// One recorded register transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Read of `offset` that returned `value`
    Read {
        /// Word offset
        offset: usize,
        /// Value returned
        value: u32,
    },
    /// Write of `value` to `offset`
    Write {
        /// Word offset
        offset: usize,
        /// Value written
        value: u32,
    },
}

impl Access {
    /// Word offset touched by this access
    pub const fn offset(&self) -> usize {
        match self {
            Self::Read { offset, .. } | Self::Write { offset, .. } => *offset,
        }
    }

    /// Whether this access is a write
    pub const fn is_write(&self) -> bool {
        matches!(self, Self::Write { .. })
    }
}
