// SPDX-License-Identifier: AGPL-3.0-only

use super::SharedMemory;
use crate::memory::{word_index, VectorBuffer};
use crate::regfile::{Access, RegisterFile};
use crate::software::dot_product;
use vecdot_chip::regs::{self, ctrl};

/// When a started job reports done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The k-th read of `CTRL` after start observes the busy bit cleared.
    /// `AfterReads(0)` behaves like `AfterReads(1)`.
    AfterReads(u32),
    /// The busy bit never clears (hung accelerator).
    Never,
}

/// Register-level model of the dot-product accelerator.
///
/// Writing `CTRL` with the start bit latches `VEC_LENGTH`, `BASE_A` and
/// `BASE_B`, computes the product from [`SharedMemory`] and holds the busy
/// bit until [`Completion`] says otherwise. `RESULT_LO`/`RESULT_HI` are
/// updated when the busy bit clears.
#[derive(Debug)]
pub struct SimAccelerator {
    regs: [u32; regs::REG_COUNT],
    memory: SharedMemory,
    completion: Completion,
    pending: Option<i64>,
    polls_since_start: u64,
    ctrl_reads: u64,
    starts: u64,
    log: Vec<Access>,
}

impl SimAccelerator {
    /// Accelerator over `memory` that finishes on the first poll.
    pub fn new(memory: SharedMemory) -> Self {
        Self::with_completion(memory, Completion::AfterReads(1))
    }

    /// Accelerator with scripted completion.
    pub fn with_completion(memory: SharedMemory, completion: Completion) -> Self {
        Self {
            regs: [0; regs::REG_COUNT],
            memory,
            completion,
            pending: None,
            polls_since_start: 0,
            ctrl_reads: 0,
            starts: 0,
            log: Vec::new(),
        }
    }

    /// Change completion behaviour for subsequent jobs.
    pub fn set_completion(&mut self, completion: Completion) {
        self.completion = completion;
    }

    /// Total `CTRL` reads since construction.
    pub const fn ctrl_reads(&self) -> u64 {
        self.ctrl_reads
    }

    /// Jobs started since construction.
    pub const fn starts(&self) -> u64 {
        self.starts
    }

    /// Whether the busy bit is currently set.
    pub const fn is_busy(&self) -> bool {
        self.regs[regs::CTRL] & ctrl::BUSY != 0
    }

    /// Recorded register accesses, oldest first.
    pub fn log(&self) -> &[Access] {
        &self.log
    }

    /// Forget recorded accesses.
    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    fn start_job(&mut self) {
        let len = self.regs[regs::VEC_LENGTH] as usize;
        let a = VectorBuffer::new(word_index(self.regs[regs::BASE_A]), len);
        let b = VectorBuffer::new(word_index(self.regs[regs::BASE_B]), len);
        self.pending = Some(dot_product(&self.memory, a, b));
        self.regs[regs::CTRL] |= ctrl::BUSY;
        self.polls_since_start = 0;
        self.starts += 1;
    }

    fn finish_job(&mut self) {
        if let Some(result) = self.pending.take() {
            #[allow(clippy::cast_sign_loss)]
            let bits = result as u64;
            #[allow(clippy::cast_possible_truncation)]
            {
                self.regs[regs::RESULT_LO] = bits as u32;
                self.regs[regs::RESULT_HI] = (bits >> 32) as u32;
            }
        }
        self.regs[regs::CTRL] &= !ctrl::BUSY;
    }

    fn poll_ctrl(&mut self) -> u32 {
        self.ctrl_reads += 1;
        if self.is_busy() {
            self.polls_since_start += 1;
            if let Completion::AfterReads(k) = self.completion {
                if self.polls_since_start >= u64::from(k.max(1)) {
                    self.finish_job();
                }
            }
        }
        self.regs[regs::CTRL]
    }
}

impl RegisterFile for SimAccelerator {
    fn read(&mut self, offset: usize) -> u32 {
        let value = if offset == regs::CTRL {
            self.poll_ctrl()
        } else {
            self.regs[offset]
        };
        self.log.push(Access::Read { offset, value });
        value
    }

    fn write(&mut self, offset: usize, value: u32) {
        self.log.push(Access::Write { offset, value });
        match offset {
            regs::CTRL => {
                if value & ctrl::START != 0 && !self.is_busy() {
                    self.start_job();
                }
            }
            regs::RESULT_LO | regs::RESULT_HI => {}
            _ => self.regs[offset] = value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded(completion: Completion) -> SimAccelerator {
        let memory = SharedMemory::from_words(vec![1, 2, 3, 4, 5, 6]);
        let mut sim = SimAccelerator::with_completion(memory, completion);
        sim.write(regs::VEC_LENGTH, 3);
        sim.write(regs::BASE_A, 0);
        sim.write(regs::BASE_B, 12);
        sim
    }

    #[test]
    fn busy_until_kth_read() {
        let mut sim = loaded(Completion::AfterReads(3));
        sim.write(regs::CTRL, ctrl::START);
        assert_eq!(sim.read(regs::CTRL), 1);
        assert_eq!(sim.read(regs::CTRL), 1);
        assert_eq!(sim.read(regs::CTRL), 0);
        assert_eq!(sim.read(regs::RESULT_LO), 32);
        assert_eq!(sim.read(regs::RESULT_HI), 0);
    }

    #[test]
    fn results_hidden_while_busy() {
        let mut sim = loaded(Completion::Never);
        sim.write(regs::CTRL, ctrl::START);
        for _ in 0..10 {
            assert_eq!(sim.read(regs::CTRL), 1);
        }
        assert_eq!(sim.read(regs::RESULT_LO), 0);
    }

    #[test]
    fn result_registers_are_read_only() {
        let mut sim = loaded(Completion::AfterReads(1));
        sim.write(regs::RESULT_LO, 99);
        assert_eq!(sim.read(regs::RESULT_LO), 0);
    }

    #[test]
    fn negative_result_splits_into_words() {
        let memory = SharedMemory::from_words(vec![-3, 5]);
        let mut sim = SimAccelerator::new(memory);
        sim.write(regs::VEC_LENGTH, 1);
        sim.write(regs::BASE_A, 0);
        sim.write(regs::BASE_B, 4);
        sim.write(regs::CTRL, ctrl::START);
        assert_eq!(sim.read(regs::CTRL), 0);
        assert_eq!(sim.read(regs::RESULT_LO), (-15i32) as u32);
        assert_eq!(sim.read(regs::RESULT_HI), u32::MAX);
    }
}
