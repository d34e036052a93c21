// SPDX-License-Identifier: AGPL-3.0-only

//! Simulated hardware
//!
//! In-memory stand-ins for the accelerator, the interval timer and the
//! shared SDRAM window. They implement the same [`RegisterFile`] and
//! [`WordMemory`] traits as the `/dev/mem` backend, so the driver code under
//! test is the code that runs on the board.
//!
//! Every simulated register access is appended to an access log, which
//! tests use to check transaction order.
//!
//! [`RegisterFile`]: crate::regfile::RegisterFile
//! [`WordMemory`]: crate::memory::WordMemory

mod accel;
mod memory;
mod timer;

pub use accel::{Completion, SimAccelerator};
pub use memory::SharedMemory;
pub use timer::{SimClock, SimTimer};
