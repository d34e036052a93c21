// SPDX-License-Identifier: AGPL-3.0-only

//! Interval timer register map (Intel/Altera interval timer core, 32-bit
//! counter exposed as 16-bit halves).
//!
//! ```text
//! word  name        meaning
//! ────  ──────────  ─────────────────────────────────────────────────────
//!  0    STATUS      bit0 TO (reached zero, write to clear), bit1 RUN
//!  1    CONTROL     bit0 ITO, bit1 CONT, bit2 START, bit3 STOP
//!  2    PERIOD_LO   reload value, low 16 bits
//!  3    PERIOD_HI   reload value, high 16 bits
//!  4    SNAP_LO     write: latch counter; read: latched low 16 bits
//!  5    SNAP_HI     latched high 16 bits
//! ```
//!
//! The counter counts **down** from the period and reloads at zero.

/// Status register.
pub const STATUS: usize = 0;
/// Control register.
pub const CONTROL: usize = 1;
/// Reload period, low half.
pub const PERIOD_LO: usize = 2;
/// Reload period, high half.
pub const PERIOD_HI: usize = 3;
/// Snapshot trigger (write) and latched low half (read).
pub const SNAP_LO: usize = 4;
/// Latched high half.
pub const SNAP_HI: usize = 5;

/// Snapshot trigger shares the low snapshot register.
pub const SNAP_TRIGGER: usize = SNAP_LO;

/// Number of registers in the block.
pub const REG_COUNT: usize = 6;

/// Maximum value of a 16-bit half.
pub const HALF_MAX: u32 = 0xFFFF;

/// Maximum reload period (both halves at `HALF_MAX`).
pub const PERIOD_MAX: u32 = u32::MAX;

/// Timer input clock (Hz).
pub const CLOCK_HZ: u64 = 100_000_000;

pub mod control {
    /// Interrupt on timeout enable.
    pub const ITO: u32 = 1 << 0;
    /// Continuous mode: reload and keep counting at zero.
    pub const CONT: u32 = 1 << 1;
    /// Start counting.
    pub const START: u32 = 1 << 2;
    /// Stop counting.
    pub const STOP: u32 = 1 << 3;
}

pub mod status {
    /// Counter reached zero since the flag was last cleared.
    pub const TO: u32 = 1 << 0;
    /// Counter is running.
    pub const RUN: u32 = 1 << 1;
}
