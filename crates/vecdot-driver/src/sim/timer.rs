// SPDX-License-Identifier: AGPL-3.0-only

use crate::regfile::{Access, RegisterFile};
use std::time::Instant;
use vecdot_chip::timer::{self, control, status};

/// Time base of a [`SimTimer`].
#[derive(Debug, Clone, Copy)]
pub enum SimClock {
    /// Counter advances by a fixed number of cycles on every register access.
    Stepped(u32),
    /// Counter follows the host clock at the given rate.
    WallClock {
        /// Counter frequency (Hz)
        hz: u64,
        /// Reference instant
        epoch: Instant,
    },
}

/// Register-level model of the interval timer core.
///
/// Counts down from the period while running, reloads at zero and raises
/// the TO status bit when it does. Writing either period register loads the
/// counter and stops it, like the hardware.
#[derive(Debug)]
pub struct SimTimer {
    clock: SimClock,
    /// Cycles already applied from the wall clock
    ticked: u64,
    counter: u32,
    period: u32,
    latch: u32,
    running: bool,
    continuous: bool,
    timed_out: bool,
    log: Vec<Access>,
}

impl SimTimer {
    /// Timer whose counter moves `step` cycles per register access
    pub fn stepped(step: u32) -> Self {
        Self::with_clock(SimClock::Stepped(step))
    }

    /// Timer driven by the host clock at `hz`
    pub fn wall_clock(hz: u64) -> Self {
        Self::with_clock(SimClock::WallClock {
            hz,
            epoch: Instant::now(),
        })
    }

    fn with_clock(clock: SimClock) -> Self {
        Self {
            clock,
            ticked: 0,
            counter: timer::PERIOD_MAX,
            period: timer::PERIOD_MAX,
            latch: 0,
            running: false,
            continuous: false,
            timed_out: false,
            log: Vec::new(),
        }
    }

    /// Current live counter value
    pub const fn counter(&self) -> u32 {
        self.counter
    }

    /// Whether the counter is running
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Recorded register accesses, oldest first
    pub fn log(&self) -> &[Access] {
        &self.log
    }

    /// Forget recorded accesses
    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    fn pending_cycles(&mut self) -> u64 {
        match self.clock {
            SimClock::Stepped(step) => u64::from(step),
            SimClock::WallClock { hz, epoch } => {
                #[allow(clippy::cast_possible_truncation)]
                let total = (epoch.elapsed().as_nanos() * u128::from(hz) / 1_000_000_000) as u64;
                let delta = total.saturating_sub(self.ticked);
                self.ticked = total;
                delta
            }
        }
    }

    /// Advance the clock up to the current access.
    fn tick(&mut self) {
        let cycles = self.pending_cycles();
        if !self.running || cycles == 0 {
            return;
        }

        let counter = u64::from(self.counter);
        if cycles <= counter {
            #[allow(clippy::cast_possible_truncation)]
            {
                self.counter = (counter - cycles) as u32;
            }
            return;
        }

        // Passed through zero at least once.
        self.timed_out = true;
        if !self.continuous {
            self.counter = self.period;
            self.running = false;
            return;
        }
        let modulus = u64::from(self.period) + 1;
        let past_zero = (cycles - counter - 1) % modulus;
        #[allow(clippy::cast_possible_truncation)]
        {
            self.counter = (u64::from(self.period) - past_zero) as u32;
        }
    }

    fn write_control(&mut self, value: u32) {
        self.continuous = value & control::CONT != 0;
        if value & control::STOP != 0 {
            self.running = false;
        } else if value & control::START != 0 {
            self.running = true;
        }
    }

    fn status(&self) -> u32 {
        let mut value = 0;
        if self.timed_out {
            value |= status::TO;
        }
        if self.running {
            value |= status::RUN;
        }
        value
    }
}

impl Default for SimTimer {
    fn default() -> Self {
        Self::wall_clock(timer::CLOCK_HZ)
    }
}

impl RegisterFile for SimTimer {
    fn read(&mut self, offset: usize) -> u32 {
        self.tick();
        let value = match offset {
            timer::STATUS => self.status(),
            timer::PERIOD_LO => self.period & timer::HALF_MAX,
            timer::PERIOD_HI => self.period >> 16,
            timer::SNAP_LO => self.latch & timer::HALF_MAX,
            timer::SNAP_HI => self.latch >> 16,
            _ => 0,
        };
        self.log.push(Access::Read { offset, value });
        value
    }

    fn write(&mut self, offset: usize, value: u32) {
        self.tick();
        self.log.push(Access::Write { offset, value });
        match offset {
            timer::STATUS => self.timed_out = false,
            timer::CONTROL => self.write_control(value),
            timer::PERIOD_LO => {
                self.period = (self.period & !timer::HALF_MAX) | (value & timer::HALF_MAX);
                self.counter = self.period;
                self.running = false;
            }
            timer::PERIOD_HI => {
                self.period = (self.period & timer::HALF_MAX) | ((value & timer::HALF_MAX) << 16);
                self.counter = self.period;
                self.running = false;
            }
            timer::SNAP_TRIGGER => self.latch = self.counter,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started(step: u32, period: u32) -> SimTimer {
        let mut t = SimTimer::stepped(step);
        t.write(timer::PERIOD_LO, period & 0xFFFF);
        t.write(timer::PERIOD_HI, period >> 16);
        t.write(timer::CONTROL, control::START | control::CONT);
        t
    }

    #[test]
    fn period_write_loads_and_stops() {
        let mut t = started(1, 100);
        assert!(t.is_running());
        t.write(timer::PERIOD_LO, 50);
        assert!(!t.is_running());
        assert_eq!(t.counter(), 50);
    }

    #[test]
    fn latch_holds_until_next_trigger() {
        let mut t = started(2, 1000);
        t.write(timer::SNAP_TRIGGER, 0);
        let first = t.read(timer::SNAP_LO);
        assert_eq!(t.read(timer::SNAP_LO), first);
        assert!(t.counter() < first);
    }

    #[test]
    fn continuous_reload_sets_timeout() {
        // Counter at 10 after start: ticks 4, 4, 4 take it past zero once.
        let mut t = started(4, 10);
        assert_eq!(t.counter(), 10);
        t.read(timer::PERIOD_LO);
        t.read(timer::PERIOD_LO);
        assert_eq!(t.counter(), 2);
        t.read(timer::PERIOD_LO);
        // 2 -> 1 -> 0 -> reload 10 -> 9
        assert_eq!(t.counter(), 9);
        assert_eq!(t.read(timer::STATUS) & status::TO, status::TO);

        t.write(timer::CONTROL, control::STOP);
        t.write(timer::STATUS, 0);
        assert_eq!(t.read(timer::STATUS), 0);
    }

    #[test]
    fn one_shot_stops_at_reload() {
        let mut t = SimTimer::stepped(8);
        t.write(timer::PERIOD_LO, 5);
        t.write(timer::PERIOD_HI, 0);
        t.write(timer::CONTROL, control::START);
        t.read(timer::STATUS);
        assert!(!t.is_running());
        assert_eq!(t.counter(), 5);
    }

    #[test]
    fn wall_clock_counts_down() {
        let mut t = SimTimer::wall_clock(timer::CLOCK_HZ);
        t.write(timer::CONTROL, control::START | control::CONT);
        std::thread::sleep(std::time::Duration::from_millis(2));
        t.write(timer::SNAP_TRIGGER, 0);
        let lo = t.read(timer::SNAP_LO);
        let hi = t.read(timer::SNAP_HI);
        let value = (hi << 16) | lo;
        assert!(value < timer::PERIOD_MAX);
    }
}
