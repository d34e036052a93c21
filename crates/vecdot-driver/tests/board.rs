// SPDX-License-Identifier: AGPL-3.0-only

//! Tests against the real board through /dev/mem
//!
//! All ignored by default: they need the FPGA image loaded and root.

use vecdot_chip::memmap;
use vecdot_chip::regs;
use vecdot_chip::timer;
use vecdot_driver::{
    AcceleratorDriver, BenchConfig, Benchmark, IntervalTimer, MmioRegion, WaitStrategy,
};

const REG_BYTES: usize = regs::REG_COUNT * 4;

#[test]
#[ignore] // Requires the board
fn timer_counts_down() {
    let regs = MmioRegion::map(memmap::TIMER_BASE, timer::REG_COUNT * 4).expect("map timer");
    let mut t = IntervalTimer::new(regs);
    t.init();
    let a = t.snapshot();
    let b = t.snapshot();
    assert!(b < a, "counter did not move down: {a:#x} -> {b:#x}");
    t.stop();
}

#[test]
#[ignore] // Requires the board
fn accelerator_completes_empty_job() {
    let regs = MmioRegion::map(memmap::ACCEL_BASE, REG_BYTES).expect("map accelerator");
    let mut drv =
        AcceleratorDriver::with_wait(regs, WaitStrategy::BoundedPolls(1_000_000));
    let (result, polls) = drv.compute(0, 0, 0).expect("empty job");
    assert_eq!(result, 0);
    println!("Empty job finished after {polls} polls");
}

#[test]
#[ignore] // Requires the board
fn board_matches_software() {
    let sdram = MmioRegion::map(memmap::FPGA_SDRAM_BASE, 1 << 20).expect("map sdram");
    let accel = MmioRegion::map(memmap::ACCEL_BASE, REG_BYTES).expect("map accelerator");
    let t = MmioRegion::map(memmap::TIMER_BASE, timer::REG_COUNT * 4).expect("map timer");
    let config = BenchConfig {
        wait: WaitStrategy::BoundedPolls(10_000_000),
        ..BenchConfig::default()
    };
    let mut bench = Benchmark::new(sdram, accel, t, config);
    for report in bench.sweep(&[0, 1, 3, 1000, 10_000]).expect("sweep") {
        assert!(report.matches(), "N={} mismatch", report.len);
        println!("N={:>6}  speedup {:.2}x", report.len, report.speedup());
    }
}
