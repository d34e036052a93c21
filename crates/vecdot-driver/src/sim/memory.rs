// SPDX-License-Identifier: AGPL-3.0-only

use crate::memory::WordMemory;
use std::cell::RefCell;
use std::rc::Rc;

/// Word memory shared between the processor side and a [`SimAccelerator`].
///
/// Cloning yields another handle to the same words, the way the real SDRAM
/// is reachable from both the HPS and the FPGA fabric. `Rc` keeps it on one
/// thread.
///
/// [`SimAccelerator`]: super::SimAccelerator
#[derive(Debug, Clone, Default)]
pub struct SharedMemory {
    words: Rc<RefCell<Vec<i32>>>,
}

impl SharedMemory {
    /// Zero-filled memory of `capacity` words
    pub fn new(capacity: usize) -> Self {
        Self::from_words(vec![0; capacity])
    }

    /// Memory holding `words`
    pub fn from_words(words: Vec<i32>) -> Self {
        Self {
            words: Rc::new(RefCell::new(words)),
        }
    }

    /// Copy of the current contents
    pub fn to_vec(&self) -> Vec<i32> {
        self.words.borrow().clone()
    }
}

impl WordMemory for SharedMemory {
    fn capacity(&self) -> usize {
        self.words.borrow().len()
    }

    fn load(&self, index: usize) -> i32 {
        self.words.borrow()[index]
    }

    fn store(&mut self, index: usize, value: i32) {
        self.words.borrow_mut()[index] = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_words() {
        let mut a = SharedMemory::new(4);
        let b = a.clone();
        a.store(2, -7);
        assert_eq!(b.load(2), -7);
        assert_eq!(b.to_vec(), vec![0, 0, -7, 0]);
    }
}
