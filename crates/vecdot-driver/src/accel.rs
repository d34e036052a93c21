// SPDX-License-Identifier: AGPL-3.0-only

//! Accelerator driver: configure, start, poll, read back
//!
//! ```text
//! Idle ──configure──▶ Configured ──start──▶ Busy ──busy bit clears──▶ Done
//!  ▲                                                                   │
//!  └──────────────────────────── configure ◀───────────────────────────┘
//! ```
//!
//! Completion is detected by polling `CTRL` until bit 0 reads 0. How long
//! to keep polling is a [`WaitStrategy`]; the default never gives up, so a
//! hung accelerator blocks the calling thread forever.

use crate::error::{Result, VecdotError};
use crate::memory::VectorLayout;
use crate::regfile::RegisterFile;
use crate::timer::{IntervalTimer, Measurement};
use std::time::{Duration, Instant};
use tracing::{debug, info};
use vecdot_chip::regs::{self, ctrl};

/// Compose the 64-bit result from its register halves.
#[allow(clippy::cast_possible_wrap)]
pub const fn compose_result(lo: u32, hi: u32) -> i64 {
    (((hi as u64) << 32) | lo as u64) as i64
}

/// Protocol state of the accelerator as tracked by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccelState {
    /// No job configured
    Idle,
    /// Length and addresses written
    Configured,
    /// Start written, busy bit not yet observed clear
    Busy,
    /// Busy bit observed clear, results readable
    Done,
}

impl std::fmt::Display for AccelState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Configured => write!(f, "Configured"),
            Self::Busy => write!(f, "Busy"),
            Self::Done => write!(f, "Done"),
        }
    }
}

/// How long to poll the busy bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitStrategy {
    /// Poll until the bit clears, however long that takes
    #[default]
    Unbounded,
    /// Give up after this many busy reads
    BoundedPolls(u64),
    /// Give up once this much wall-clock time has passed
    Deadline(Duration),
}

/// One timed hardware run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HardwareRun {
    /// Dot product read back from the accelerator
    pub result: i64,
    /// `CTRL` reads spent waiting
    pub polls: u64,
    /// Cycles from configure to result read
    pub measurement: Measurement,
}

/// Driver for the accelerator register block.
#[derive(Debug)]
pub struct AcceleratorDriver<R: RegisterFile> {
    regs: R,
    state: AccelState,
    wait: WaitStrategy,
}

impl<R: RegisterFile> AcceleratorDriver<R> {
    /// Driver over `regs` with the unbounded wait strategy.
    pub fn new(regs: R) -> Self {
        Self::with_wait(regs, WaitStrategy::default())
    }

    /// Driver with an explicit wait strategy.
    pub const fn with_wait(regs: R, wait: WaitStrategy) -> Self {
        Self {
            regs,
            state: AccelState::Idle,
            wait,
        }
    }

    /// Current protocol state
    pub const fn state(&self) -> AccelState {
        self.state
    }

    /// Wait strategy in use
    pub const fn wait_strategy(&self) -> WaitStrategy {
        self.wait
    }

    /// Replace the wait strategy
    pub fn set_wait_strategy(&mut self, wait: WaitStrategy) {
        self.wait = wait;
    }

    /// Underlying register block
    pub fn regs(&self) -> &R {
        &self.regs
    }

    /// Underlying register block, mutably
    pub fn regs_mut(&mut self) -> &mut R {
        &mut self.regs
    }

    /// Release the register block
    pub fn into_inner(self) -> R {
        self.regs
    }

    /// Write length and base byte addresses.
    ///
    /// # Errors
    ///
    /// Returns error if a job is still running.
    pub fn configure(&mut self, length: u32, address_a: u32, address_b: u32) -> Result<()> {
        if self.state == AccelState::Busy {
            return Err(VecdotError::invalid_state("configure while accelerator is busy"));
        }
        self.regs.write(regs::VEC_LENGTH, length);
        self.regs.write(regs::BASE_A, address_a);
        self.regs.write(regs::BASE_B, address_b);
        self.state = AccelState::Configured;
        debug!("Configured N={length} A={address_a:#x} B={address_b:#x}");
        Ok(())
    }

    /// Set the start bit.
    ///
    /// # Errors
    ///
    /// Returns error unless the driver is `Configured`.
    pub fn start(&mut self) -> Result<()> {
        if self.state != AccelState::Configured {
            return Err(VecdotError::invalid_state(format!("start from {}", self.state)));
        }
        self.regs.write(regs::CTRL, ctrl::START);
        self.state = AccelState::Busy;
        Ok(())
    }

    /// Read `CTRL` once; moves to `Done` if the busy bit is clear.
    ///
    /// # Errors
    ///
    /// Returns error unless the driver is `Busy`.
    pub fn poll(&mut self) -> Result<bool> {
        if self.state != AccelState::Busy {
            return Err(VecdotError::invalid_state(format!("poll from {}", self.state)));
        }
        let done = self.regs.read(regs::CTRL) & ctrl::BUSY == 0;
        if done {
            self.state = AccelState::Done;
        }
        Ok(done)
    }

    /// Poll until done according to the wait strategy. Returns the number
    /// of `CTRL` reads performed.
    ///
    /// # Errors
    ///
    /// Returns error if the driver is not `Busy`, or a bounded strategy
    /// runs out. On timeout the driver stays `Busy`.
    pub fn wait(&mut self) -> Result<u64> {
        let deadline = match self.wait {
            WaitStrategy::Deadline(limit) => Some((Instant::now(), limit)),
            _ => None,
        };

        let mut polls = 0u64;
        loop {
            polls += 1;
            if self.poll()? {
                debug!("Accelerator done after {polls} polls");
                return Ok(polls);
            }

            match self.wait {
                WaitStrategy::Unbounded => {}
                WaitStrategy::BoundedPolls(max) => {
                    if polls >= max {
                        return Err(VecdotError::AcceleratorTimeout { polls });
                    }
                }
                WaitStrategy::Deadline(_) => {
                    if let Some((started, limit)) = deadline {
                        if started.elapsed() >= limit {
                            #[allow(clippy::cast_possible_truncation)]
                            let duration_ms = limit.as_millis() as u64;
                            return Err(VecdotError::Timeout { duration_ms });
                        }
                    }
                }
            }
            std::hint::spin_loop();
        }
    }

    /// Read the 64-bit result, low word first.
    ///
    /// # Errors
    ///
    /// Returns error unless the driver is `Done`.
    pub fn result(&mut self) -> Result<i64> {
        if self.state != AccelState::Done {
            return Err(VecdotError::invalid_state(format!("result read from {}", self.state)));
        }
        let lo = self.regs.read(regs::RESULT_LO);
        let hi = self.regs.read(regs::RESULT_HI);
        Ok(compose_result(lo, hi))
    }

    /// Configure, start, wait and read back, without timing.
    ///
    /// # Errors
    ///
    /// Propagates protocol and wait errors.
    pub fn compute(&mut self, length: u32, address_a: u32, address_b: u32) -> Result<(i64, u64)> {
        self.configure(length, address_a, address_b)?;
        self.start()?;
        let polls = self.wait()?;
        Ok((self.result()?, polls))
    }

    /// Full timed run over a validated layout. The timer bracket covers the
    /// configuration writes, the computation and the result reads.
    ///
    /// # Errors
    ///
    /// Propagates protocol and wait errors.
    pub fn run<T: RegisterFile>(
        &mut self,
        layout: &VectorLayout,
        timer: &mut IntervalTimer<T>,
    ) -> Result<HardwareRun> {
        #[allow(clippy::cast_possible_truncation)]
        let length = layout.len() as u32;
        let (outcome, measurement) =
            timer.measure(|| self.compute(length, layout.address_a(), layout.address_b()));
        let (result, polls) = outcome?;

        info!(
            "Hardware dot product over {length} elements = {result} in {} cycles ({polls} polls)",
            measurement.cycles()
        );
        Ok(HardwareRun {
            result,
            polls,
            measurement,
        })
    }
}
