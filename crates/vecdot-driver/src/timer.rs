// SPDX-License-Identifier: AGPL-3.0-only

//! Interval timer: cycle measurement with a free-running down-counter
//!
//! The counter runs at [`timer::CLOCK_HZ`] and counts **down** from the
//! reload period, so a later snapshot is numerically smaller than an earlier
//! one and elapsed cycles are `start - end`.
//!
//! # Wraparound
//!
//! With the period at its maximum the counter reloads every 2^32 cycles
//! (about 43 s at 100 MHz). A reload between two snapshots makes
//! [`elapsed_cycles`] wrong. The value is never corrected: measured
//! intervals must stay well below the period. [`Measurement::wrapped`]
//! reports whether the hardware TO flag was raised inside the bracket.

use crate::regfile::RegisterFile;
use std::time::Duration;
use tracing::{debug, warn};
use vecdot_chip::timer::{self, control, status};

/// Compose a counter value from latched halves.
///
/// Only the low 16 bits of `lo` are significant; `hi` supplies the upper
/// half. The halves must come from the same latch.
pub const fn compose_snapshot(lo: u32, hi: u32) -> u32 {
    (hi << 16) | (lo & timer::HALF_MAX)
}

/// Cycles elapsed between two snapshots of the down-counter.
///
/// Subtraction order is `start - end`. Unsigned wrapping arithmetic, no
/// reload detection.
pub const fn elapsed_cycles(start: u32, end: u32) -> u32 {
    start.wrapping_sub(end)
}

/// Convert timer cycles to wall-clock time.
pub fn cycles_to_duration(cycles: u32) -> Duration {
    Duration::from_nanos(u64::from(cycles) * 1_000_000_000 / timer::CLOCK_HZ)
}

/// Counter run state as last commanded by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    /// Not yet initialised, or stopped
    Stopped,
    /// Free-running in continuous mode
    Running,
}

/// Result of one bracketed measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Measurement {
    /// Snapshot taken before the operation
    pub start: u32,
    /// Snapshot taken after the operation
    pub end: u32,
    /// Hardware TO flag observed after the bracket
    pub wrapped: bool,
}

impl Measurement {
    /// Elapsed cycles, `start - end`
    pub const fn cycles(&self) -> u32 {
        elapsed_cycles(self.start, self.end)
    }

    /// Elapsed wall-clock time at the timer clock
    pub fn duration(&self) -> Duration {
        cycles_to_duration(self.cycles())
    }
}

/// Driver for the interval timer register block.
#[derive(Debug)]
pub struct IntervalTimer<R: RegisterFile> {
    regs: R,
    state: TimerState,
}

impl<R: RegisterFile> IntervalTimer<R> {
    /// Wrap a timer register block. The counter is left untouched until
    /// [`init`](Self::init).
    pub const fn new(regs: R) -> Self {
        Self {
            regs,
            state: TimerState::Stopped,
        }
    }

    /// Stop the counter, load the maximum period and restart it in
    /// continuous mode. Also clears the TO flag.
    pub fn init(&mut self) {
        self.regs.write(timer::STATUS, 0);
        self.regs.write(timer::CONTROL, control::STOP);
        self.regs.write(timer::PERIOD_LO, timer::HALF_MAX);
        self.regs.write(timer::PERIOD_HI, timer::HALF_MAX);
        self.regs.write(timer::CONTROL, control::START | control::CONT);
        self.state = TimerState::Running;
        debug!("Interval timer started, period {:#x}", timer::PERIOD_MAX);
    }

    /// Latch the counter and read it back, low half first.
    pub fn snapshot(&mut self) -> u32 {
        self.regs.write(timer::SNAP_TRIGGER, 0);
        let lo = self.regs.read(timer::SNAP_LO);
        let hi = self.regs.read(timer::SNAP_HI);
        compose_snapshot(lo, hi)
    }

    /// Freeze the counter at its current value.
    pub fn stop(&mut self) {
        self.regs.write(timer::CONTROL, control::STOP);
        self.state = TimerState::Stopped;
    }

    /// Whether the counter has reached zero since the flag was cleared.
    pub fn timed_out(&mut self) -> bool {
        self.regs.read(timer::STATUS) & status::TO != 0
    }

    /// Last commanded run state
    pub const fn state(&self) -> TimerState {
        self.state
    }

    /// Time `f`: init, snapshot, `f`, stop, snapshot.
    pub fn measure<T>(&mut self, f: impl FnOnce() -> T) -> (T, Measurement) {
        self.init();
        let start = self.snapshot();
        let value = f();
        self.stop();
        let end = self.snapshot();
        let wrapped = self.timed_out();

        let measurement = Measurement {
            start,
            end,
            wrapped,
        };
        if wrapped {
            warn!(
                "Interval timer reloaded during measurement; {} cycles is not reliable",
                measurement.cycles()
            );
        }
        debug!(
            "Measured {} cycles (start {start:#x}, end {end:#x})",
            measurement.cycles()
        );
        (value, measurement)
    }

    /// Underlying register block
    pub fn regs(&self) -> &R {
        &self.regs
    }

    /// Release the register block
    pub fn into_inner(self) -> R {
        self.regs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regfile::Access;
    use crate::sim::SimTimer;
    use proptest::prelude::*;

    #[test]
    fn compose_masks_low_half() {
        assert_eq!(compose_snapshot(0x1234, 0xABCD), 0xABCD_1234);
        assert_eq!(compose_snapshot(0xFFFF_5678, 0x0001), 0x0001_5678);
        assert_eq!(compose_snapshot(0, 0), 0);
    }

    #[test]
    fn elapsed_counts_down() {
        assert_eq!(elapsed_cycles(1000, 400), 600);
        assert_eq!(elapsed_cycles(7, 7), 0);
    }

    #[test]
    fn elapsed_silently_wraps() {
        // A reload between snapshots: end above start.
        assert_eq!(elapsed_cycles(10, u32::MAX - 9), 20);
    }

    #[test]
    fn cycles_at_100mhz() {
        assert_eq!(cycles_to_duration(100), Duration::from_micros(1));
        assert_eq!(cycles_to_duration(100_000_000), Duration::from_secs(1));
    }

    #[test]
    fn init_register_sequence() {
        let mut t = IntervalTimer::new(SimTimer::stepped(1));
        t.init();
        assert_eq!(
            t.regs().log(),
            &[
                Access::Write { offset: timer::STATUS, value: 0 },
                Access::Write { offset: timer::CONTROL, value: 0x8 },
                Access::Write { offset: timer::PERIOD_LO, value: 0xFFFF },
                Access::Write { offset: timer::PERIOD_HI, value: 0xFFFF },
                Access::Write { offset: timer::CONTROL, value: 0x6 },
            ]
        );
        assert_eq!(t.state(), TimerState::Running);
    }

    #[test]
    fn snapshot_triggers_then_reads_low_then_high() {
        let mut t = IntervalTimer::new(SimTimer::stepped(1));
        t.init();
        let before = t.regs().log().len();
        t.snapshot();
        let log = &t.regs().log()[before..];
        assert_eq!(log.len(), 3);
        assert_eq!(log[0], Access::Write { offset: timer::SNAP_TRIGGER, value: 0 });
        assert_eq!(log[1].offset(), timer::SNAP_LO);
        assert_eq!(log[2].offset(), timer::SNAP_HI);
    }

    #[test]
    fn snapshots_decrease_while_running() {
        let mut t = IntervalTimer::new(SimTimer::stepped(5));
        t.init();
        let a = t.snapshot();
        let b = t.snapshot();
        assert!(b < a);
        assert_eq!(elapsed_cycles(a, b), 15);
    }

    #[test]
    fn stop_freezes_counter() {
        let mut t = IntervalTimer::new(SimTimer::stepped(3));
        t.init();
        t.stop();
        let a = t.snapshot();
        let b = t.snapshot();
        assert_eq!(a, b);
        assert_eq!(t.state(), TimerState::Stopped);
    }

    #[test]
    fn measure_brackets_work() {
        let mut t = IntervalTimer::new(SimTimer::stepped(1));
        let (value, m) = t.measure(|| 42);
        assert_eq!(value, 42);
        assert!(!m.wrapped);
        // Between the two latches the counter ticks on the low/high reads
        // of the first snapshot and on the stop write.
        assert_eq!(m.cycles(), 3);
    }

    #[test]
    fn measure_reports_reload_without_correcting() {
        let mut t = IntervalTimer::new(SimTimer::stepped(1 << 31));
        let (_, m) = t.measure(|| ());
        assert!(m.wrapped);
        assert_eq!(m.cycles(), m.start.wrapping_sub(m.end));
    }

    proptest! {
        #[test]
        fn compose_matches_definition(lo in any::<u32>(), hi in 0u32..=0xFFFF) {
            prop_assert_eq!(compose_snapshot(lo, hi), (hi << 16) | (lo & 0xFFFF));
        }

        #[test]
        fn elapsed_is_difference_without_wrap(end in any::<u32>(), delta in any::<u32>()) {
            let start = end.saturating_add(delta);
            prop_assume!(start > end);
            prop_assert_eq!(elapsed_cycles(start, end), start - end);
        }
    }
}
