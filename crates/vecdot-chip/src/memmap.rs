// SPDX-License-Identifier: AGPL-3.0-only

//! Physical memory map of the HPS/FPGA system.
//!
//! ```text
//! region                 physical     size     notes
//! ─────────────────────  ───────────  ───────  ─────────────────────────────
//! H2F lightweight bridge 0xFF200000   2 MB     FPGA peripherals
//!   accelerator regs     +0x00000080  24 B     six 32-bit registers
//!   interval timer       0xFF202000   24 B     six 32-bit registers
//! FPGA SDRAM             0xC0000000   64 MB    shared vector storage
//! ```
//!
//! The accelerator sees the same SDRAM starting at [`ACC_SDRAM_BASE`].

/// Lightweight HPS-to-FPGA bridge base.
pub const H2F_BASE: u64 = 0xFF20_0000;

/// Accelerator offset inside the bridge.
pub const VEC_MUL_OFFSET: u64 = 0x0000_0080;

/// Accelerator register block base.
pub const ACCEL_BASE: u64 = H2F_BASE + VEC_MUL_OFFSET;

/// Interval timer register block base.
pub const TIMER_BASE: u64 = 0xFF20_2000;

/// FPGA SDRAM as seen by the processor.
pub const FPGA_SDRAM_BASE: u64 = 0xC000_0000;

/// FPGA SDRAM size in bytes.
pub const FPGA_SDRAM_SIZE: u64 = 64 * 1024 * 1024;

/// FPGA SDRAM as seen by the accelerator's memory master.
pub const ACC_SDRAM_BASE: u32 = 0x0000_0000;

/// FPGA SDRAM capacity in 32-bit words.
pub const SDRAM_WORDS: usize = (FPGA_SDRAM_SIZE / 4) as usize;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accelerator_sits_inside_bridge() {
        assert_eq!(ACCEL_BASE, 0xFF20_0080);
        assert!(TIMER_BASE > ACCEL_BASE);
    }

    #[test]
    fn sdram_word_capacity() {
        assert_eq!(SDRAM_WORDS, 16 * 1024 * 1024);
    }
}
