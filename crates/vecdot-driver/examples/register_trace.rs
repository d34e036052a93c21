// SPDX-License-Identifier: AGPL-3.0-only

//! Register trace of one accelerator job
//!
//! Runs a three-element job on the simulated accelerator and prints every
//! register transaction the driver issued, in order.

use vecdot_chip::regs;
use vecdot_driver::sim::{Completion, SharedMemory, SimAccelerator, SimTimer};
use vecdot_driver::{Access, AcceleratorDriver, IntervalTimer, Result, VectorLayout};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("vecdot_driver=debug")
        .init();

    let memory = SharedMemory::from_words(vec![1, 2, 3, 4, 5, 6]);
    let layout = VectorLayout::packed(3, 6)?;
    let accel = SimAccelerator::with_completion(memory, Completion::AfterReads(4));

    let mut driver = AcceleratorDriver::new(accel);
    let mut timer = IntervalTimer::new(SimTimer::default());
    let run = driver.run(&layout, &mut timer)?;

    println!("Result {} after {} polls, {} cycles\n", run.result, run.polls, run.measurement.cycles());
    for access in driver.regs().log() {
        match *access {
            Access::Write { offset, value } => {
                println!("  W {:<10} <- {value:#010x}", regs::NAMES[offset]);
            }
            Access::Read { offset, value } => {
                println!("  R {:<10} -> {value:#010x}", regs::NAMES[offset]);
            }
        }
    }

    Ok(())
}
