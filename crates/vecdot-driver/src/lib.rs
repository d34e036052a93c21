// SPDX-License-Identifier: AGPL-3.0-only

//! Driver for the FPGA vector dot-product accelerator.
//!
//! Times the accelerator against a software loop over the same vectors,
//! using the interval timer as a cycle counter.
//!
//! # Layers
//!
//! ```text
//! Benchmark              validate, fill, run both paths, compare
//!   ├─ SoftwareReference     dot product from shared memory
//!   ├─ AcceleratorDriver     configure / start / poll / read result
//!   └─ IntervalTimer         snapshot-based cycle measurement
//! RegisterFile / WordMemory
//!   ├─ MmioRegion            /dev/mem window (board)
//!   └─ sim::*                in-memory models (tests, --backend sim)
//! ```
//!
//! # Quick start
//!
//! ```
//! use vecdot_driver::sim::{SharedMemory, SimAccelerator, SimTimer};
//! use vecdot_driver::{BenchConfig, Benchmark};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let memory = SharedMemory::new(1024);
//! let accel = SimAccelerator::new(memory.clone());
//! let mut bench = Benchmark::new(memory, accel, SimTimer::default(), BenchConfig::default());
//!
//! let report = bench.run(100)?;
//! assert!(report.matches());
//! println!("speedup {:.2}x", report.speedup());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]

pub mod accel;
pub mod bench;
mod error;
pub mod memory;
pub mod mmio;
pub mod regfile;
pub mod sim;
pub mod software;
pub mod timer;

pub use accel::{compose_result, AccelState, AcceleratorDriver, HardwareRun, WaitStrategy};
pub use bench::{parse_length, BenchConfig, Benchmark, BenchmarkReport};
pub use error::{Result, VecdotError};
pub use memory::{VectorBuffer, VectorLayout, WordMemory};
pub use mmio::MmioRegion;
pub use regfile::{Access, RegisterFile};
pub use software::{dot_product, SoftwareReference, SoftwareRun};
pub use timer::{compose_snapshot, cycles_to_duration, elapsed_cycles, IntervalTimer, Measurement, TimerState};

/// Commonly used types.
pub mod prelude {
    pub use crate::{
        AcceleratorDriver, BenchConfig, Benchmark, BenchmarkReport, IntervalTimer, MmioRegion,
        RegisterFile, Result, SoftwareReference, VecdotError, VectorLayout, WaitStrategy,
        WordMemory,
    };
}
