// SPDX-License-Identifier: AGPL-3.0-only

//! Benchmark orchestration: hardware vs software on identical inputs
//!
//! A run validates the requested length, fills vectors A and B with
//! deterministic pseudorandom values, times the software reference, times
//! the accelerator, and compares the two results. Validation happens before
//! either path touches a register.

use crate::accel::{AcceleratorDriver, HardwareRun, WaitStrategy};
use crate::error::{Result, VecdotError};
use crate::memory::{VectorBuffer, VectorLayout, WordMemory};
use crate::regfile::RegisterFile;
use crate::software::{SoftwareReference, SoftwareRun};
use crate::timer::IntervalTimer;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};

/// Default seed for test vectors
pub const DEFAULT_SEED: u64 = 0;

/// Default exclusive upper bound for generated elements
pub const DEFAULT_MAX_VALUE: i32 = 10;

/// Orchestrator settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BenchConfig {
    /// Seed applied before every fill, so each run of the same length sees
    /// the same vectors
    pub seed: u64,
    /// Elements are drawn from `0..max_value` (at least `0..1`)
    pub max_value: i32,
    /// Busy-bit wait strategy for the accelerator
    pub wait: WaitStrategy,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            max_value: DEFAULT_MAX_VALUE,
            wait: WaitStrategy::Unbounded,
        }
    }
}

/// Outcome of one benchmark iteration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BenchmarkReport {
    /// Element count
    pub len: usize,
    /// Software path
    pub software: SoftwareRun,
    /// Hardware path
    pub hardware: HardwareRun,
}

impl BenchmarkReport {
    /// Whether both paths produced the same dot product
    pub const fn matches(&self) -> bool {
        self.software.result == self.hardware.result
    }

    /// Software cycles divided by hardware cycles.
    ///
    /// Not guarded: zero hardware cycles gives `inf` (or `NaN` if both are
    /// zero).
    pub fn speedup(&self) -> f64 {
        f64::from(self.software.measurement.cycles()) / f64::from(self.hardware.measurement.cycles())
    }
}

/// Parse a vector length typed by the user.
///
/// # Errors
///
/// Returns error for non-numeric or negative input.
pub fn parse_length(input: &str) -> Result<usize> {
    let trimmed = input.trim();
    let value: i64 = trimmed
        .parse()
        .map_err(|e| VecdotError::invalid_input(trimmed, format!("{e}")))?;
    usize::try_from(value).map_err(|_| VecdotError::invalid_input(trimmed, "length must not be negative"))
}

/// Owns the shared memory, the accelerator driver and the timer, and
/// sequences benchmark iterations over them.
#[derive(Debug)]
pub struct Benchmark<M: WordMemory, A: RegisterFile, T: RegisterFile> {
    memory: M,
    driver: AcceleratorDriver<A>,
    timer: IntervalTimer<T>,
    software: SoftwareReference,
    config: BenchConfig,
}

impl<M: WordMemory, A: RegisterFile, T: RegisterFile> Benchmark<M, A, T> {
    /// Assemble a benchmark from its hardware blocks.
    pub fn new(memory: M, accel: A, timer: T, config: BenchConfig) -> Self {
        Self {
            memory,
            driver: AcceleratorDriver::with_wait(accel, config.wait),
            timer: IntervalTimer::new(timer),
            software: SoftwareReference,
            config,
        }
    }

    /// Settings in use
    pub const fn config(&self) -> &BenchConfig {
        &self.config
    }

    /// Shared vector memory
    pub const fn memory(&self) -> &M {
        &self.memory
    }

    /// Accelerator driver
    pub const fn driver(&self) -> &AcceleratorDriver<A> {
        &self.driver
    }

    /// Interval timer
    pub const fn timer(&self) -> &IntervalTimer<T> {
        &self.timer
    }

    /// Largest length whose two vectors fit in shared memory
    pub fn max_len(&self) -> usize {
        self.memory.capacity() / 2
    }

    /// Standard layout for `len` elements.
    ///
    /// # Errors
    ///
    /// Returns error if the vectors do not fit.
    pub fn layout(&self, len: usize) -> Result<VectorLayout> {
        VectorLayout::packed(len, self.memory.capacity())
    }

    /// Write pseudorandom elements into A and B, reseeding first.
    pub fn fill(&mut self, layout: &VectorLayout) {
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let upper = self.config.max_value.max(1);
        let (a, b) = (layout.a(), layout.b());
        for i in 0..layout.len() {
            self.memory.store(a.start() + i, rng.gen_range(0..upper));
            self.memory.store(b.start() + i, rng.gen_range(0..upper));
        }
    }

    /// Write explicit contents into A and B.
    ///
    /// # Errors
    ///
    /// Returns error if the slices differ in length or do not fit.
    pub fn load(&mut self, a: &[i32], b: &[i32]) -> Result<VectorLayout> {
        if a.len() != b.len() {
            return Err(VecdotError::invalid_length(
                a.len(),
                format!("vector B holds {} elements", b.len()),
            ));
        }
        let layout = self.layout(a.len())?;
        for (i, (&x, &y)) in a.iter().zip(b).enumerate() {
            self.memory.store(layout.a().start() + i, x);
            self.memory.store(layout.b().start() + i, y);
        }
        Ok(layout)
    }

    /// Fill and run both paths for `len` elements.
    ///
    /// # Errors
    ///
    /// Returns error if `len` does not fit, or the accelerator wait fails.
    pub fn run(&mut self, len: usize) -> Result<BenchmarkReport> {
        let layout = self.layout(len)?;
        self.fill(&layout);
        self.execute(&layout)
    }

    /// Fill and run both paths with caller-chosen placement.
    ///
    /// # Errors
    ///
    /// Returns error if the placement is invalid (overlap, size mismatch,
    /// capacity), or the accelerator wait fails.
    pub fn run_placed(&mut self, a: VectorBuffer, b: VectorBuffer) -> Result<BenchmarkReport> {
        let layout = VectorLayout::new(a, b, self.memory.capacity())?;
        self.fill(&layout);
        self.execute(&layout)
    }

    /// Run both paths over whatever `layout` currently holds.
    ///
    /// # Errors
    ///
    /// Returns error if the accelerator wait fails.
    pub fn execute(&mut self, layout: &VectorLayout) -> Result<BenchmarkReport> {
        let software = self.software.run(&self.memory, layout, &mut self.timer);
        let hardware = self.driver.run(layout, &mut self.timer)?;

        let report = BenchmarkReport {
            len: layout.len(),
            software,
            hardware,
        };
        if report.matches() {
            info!(
                "N={} result={} sw={} hw={} speedup={:.2}x",
                report.len,
                report.hardware.result,
                report.software.measurement.cycles(),
                report.hardware.measurement.cycles(),
                report.speedup()
            );
        } else {
            warn!(
                "N={} result mismatch: software {} vs hardware {}",
                report.len, report.software.result, report.hardware.result
            );
        }
        Ok(report)
    }

    /// Run each length in turn.
    ///
    /// # Errors
    ///
    /// Stops at the first failing length.
    pub fn sweep(&mut self, lengths: &[usize]) -> Result<Vec<BenchmarkReport>> {
        lengths.iter().map(|&len| self.run(len)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{Completion, SharedMemory, SimAccelerator, SimTimer};

    type SimBench = Benchmark<SharedMemory, SimAccelerator, SimTimer>;

    fn bench(capacity: usize) -> SimBench {
        let memory = SharedMemory::new(capacity);
        let accel = SimAccelerator::new(memory.clone());
        Benchmark::new(memory, accel, SimTimer::stepped(1), BenchConfig::default())
    }

    #[test]
    fn parse_length_accepts_numbers() {
        assert_eq!(parse_length(" 42\n").unwrap(), 42);
        assert_eq!(parse_length("0").unwrap(), 0);
    }

    #[test]
    fn parse_length_rejects_negative_and_garbage() {
        assert!(matches!(parse_length("-1"), Err(VecdotError::InvalidInput { .. })));
        assert!(matches!(parse_length("ten"), Err(VecdotError::InvalidInput { .. })));
    }

    #[test]
    fn fill_is_deterministic_and_bounded() {
        let mut first = bench(64);
        let layout = first.layout(16).unwrap();
        first.fill(&layout);
        let mut second = bench(64);
        second.fill(&layout);
        assert_eq!(first.memory().to_vec(), second.memory().to_vec());
        assert!(first.memory().to_vec()[..32].iter().all(|v| (0..10).contains(v)));
    }

    #[test]
    fn reseeds_every_fill() {
        let mut b = bench(64);
        let layout = b.layout(8).unwrap();
        b.fill(&layout);
        let once = b.memory().to_vec();
        b.fill(&layout);
        assert_eq!(once, b.memory().to_vec());
    }

    #[test]
    fn oversized_length_rejected_before_hardware() {
        let mut b = bench(10);
        assert_eq!(b.max_len(), 5);
        let err = b.run(6).unwrap_err();
        assert!(matches!(err, VecdotError::CapacityExceeded { .. }));
        assert!(b.driver().regs().log().is_empty());
        assert!(b.timer().regs().log().is_empty());
    }

    #[test]
    fn speedup_unguarded() {
        let mut b = bench(8);
        let mut report = b.run(2).unwrap();
        report.hardware.measurement.end = report.hardware.measurement.start;
        assert!(report.speedup().is_infinite());
        report.software.measurement.end = report.software.measurement.start;
        assert!(report.speedup().is_nan());
    }

    #[test]
    fn hung_accelerator_with_bounded_wait() {
        let memory = SharedMemory::new(8);
        let accel = SimAccelerator::with_completion(memory.clone(), Completion::Never);
        let config = BenchConfig {
            wait: WaitStrategy::BoundedPolls(10),
            ..BenchConfig::default()
        };
        let mut b = Benchmark::new(memory, accel, SimTimer::stepped(1), config);
        assert!(b.run(4).unwrap_err().is_timeout());
    }

    #[test]
    fn sweep_runs_each_length() {
        let mut b = bench(1024);
        let reports = b.sweep(&[0, 1, 100, 512]).unwrap();
        assert_eq!(reports.len(), 4);
        assert!(reports.iter().all(BenchmarkReport::matches));
        assert_eq!(reports[0].hardware.result, 0);
    }
}
