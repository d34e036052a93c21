// SPDX-License-Identifier: AGPL-3.0-only

//! Accelerator register map.
//!
//! Word offsets from the accelerator base (`memmap::ACCEL_BASE`). Every
//! register is 32 bits wide.
//!
//! ```text
//! word  name        access  meaning
//! ────  ──────────  ──────  ───────────────────────────────────────────
//!  0    CTRL        R/W     bit0: write 1 = start, hardware clears on done
//!  1    VEC_LENGTH  W       element count N
//!  2    BASE_A      W       byte address of vector A (accelerator view)
//!  3    BASE_B      W       byte address of vector B (accelerator view)
//!  4    RESULT_LO   R       low 32 bits of the 64-bit result
//!  5    RESULT_HI   R       high 32 bits of the 64-bit result
//! ```

/// Control register. Bit 0 doubles as start trigger and busy flag.
pub const CTRL: usize = 0;
/// Vector length in elements.
pub const VEC_LENGTH: usize = 1;
/// Base byte address of vector A.
pub const BASE_A: usize = 2;
/// Base byte address of vector B.
pub const BASE_B: usize = 3;
/// Low word of the 64-bit dot product.
pub const RESULT_LO: usize = 4;
/// High word of the 64-bit dot product.
pub const RESULT_HI: usize = 5;

/// Number of registers in the block.
pub const REG_COUNT: usize = 6;

/// Human-readable register names, indexed by word offset.
pub const NAMES: [&str; REG_COUNT] = [
    "CTRL",
    "VEC_LENGTH",
    "BASE_A",
    "BASE_B",
    "RESULT_LO",
    "RESULT_HI",
];

/// Size in bytes of one vector element.
pub const ELEMENT_BYTES: u32 = 4;

// ── CTRL bit definitions ─────────────────────────────────────────────────────

pub mod ctrl {
    /// Write 1 to start. Reads 1 while the accelerator is busy, 0 once done.
    pub const START: u32 = 1 << 0;
    /// Alias of [`START`] as seen on read.
    pub const BUSY: u32 = START;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_are_contiguous_words() {
        let offsets = [CTRL, VEC_LENGTH, BASE_A, BASE_B, RESULT_LO, RESULT_HI];
        for (expected, offset) in offsets.iter().enumerate() {
            assert_eq!(*offset, expected);
        }
        assert_eq!(offsets.len(), REG_COUNT);
    }

    #[test]
    fn names_match_offsets() {
        assert_eq!(NAMES[CTRL], "CTRL");
        assert_eq!(NAMES[RESULT_HI], "RESULT_HI");
    }
}
