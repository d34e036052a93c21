// SPDX-License-Identifier: AGPL-3.0-only

//! Software reference path
//!
//! Computes the same dot product as the accelerator by loading each element
//! from shared memory on the processor. On the board every load goes through
//! the uncached `/dev/mem` window, which is what the timed comparison
//! measures.
//!
//! Products are formed in 64 bits (an `i32 * i32` product always fits);
//! accumulation wraps on `i64` overflow exactly like the accelerator's
//! 64-bit accumulator. Overflow is not reported.

use crate::memory::{VectorBuffer, VectorLayout, WordMemory};
use crate::regfile::RegisterFile;
use crate::timer::{IntervalTimer, Measurement};
use tracing::debug;

/// `sum a[i] * b[i]` over two buffers of equal length in `memory`.
///
/// Only the first `min(a.len(), b.len())` elements take part.
pub fn dot_product<M: WordMemory + ?Sized>(memory: &M, a: VectorBuffer, b: VectorBuffer) -> i64 {
    (0..a.len().min(b.len())).fold(0i64, |acc, i| {
        let x = i64::from(memory.load(a.start() + i));
        let y = i64::from(memory.load(b.start() + i));
        acc.wrapping_add(x * y)
    })
}

/// One timed software run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoftwareRun {
    /// Dot product
    pub result: i64,
    /// Cycles spent in the loop
    pub measurement: Measurement,
}

/// Timed software computation over a validated layout.
#[derive(Debug, Default, Clone, Copy)]
pub struct SoftwareReference;

impl SoftwareReference {
    /// Compute the product of the two vectors in `layout`, bracketed by
    /// `timer` the same way the hardware path is.
    pub fn run<M, T>(&self, memory: &M, layout: &VectorLayout, timer: &mut IntervalTimer<T>) -> SoftwareRun
    where
        M: WordMemory + ?Sized,
        T: RegisterFile,
    {
        let (result, measurement) = timer.measure(|| dot_product(memory, layout.a(), layout.b()));
        debug!(
            "Software dot product over {} elements = {result} in {} cycles",
            layout.len(),
            measurement.cycles()
        );
        SoftwareRun {
            result,
            measurement,
        }
    }
}
