// SPDX-License-Identifier: AGPL-3.0-only

//! Error types for accelerator and benchmark operations

use thiserror::Error;

/// Result type alias for driver operations
pub type Result<T> = std::result::Result<T, VecdotError>;

/// Errors that can occur while driving the accelerator or validating a run
#[derive(Debug, Error)]
pub enum VecdotError {
    /// Requested vector length cannot be expressed to the hardware
    #[error("Invalid vector length {requested}: {reason}")]
    InvalidLength {
        /// Requested element count
        requested: usize,
        /// Why it was rejected
        reason: String,
    },

    /// Console input that is not a usable vector length
    #[error("Invalid input {input:?}: {reason}")]
    InvalidInput {
        /// Text as entered
        input: String,
        /// Why it was rejected
        reason: String,
    },

    /// Both vectors do not fit in the shared memory window
    #[error("Vector length {requested} needs {needed} words, shared memory holds {capacity}")]
    CapacityExceeded {
        /// Requested element count
        requested: usize,
        /// Words needed for both vectors
        needed: usize,
        /// Words available
        capacity: usize,
    },

    /// Vector A and vector B share words
    #[error("Vector buffers overlap: A=[{a_start}, {a_end}) B=[{b_start}, {b_end})")]
    OverlappingBuffers {
        /// First word of A
        a_start: usize,
        /// One past the last word of A
        a_end: usize,
        /// First word of B
        b_start: usize,
        /// One past the last word of B
        b_end: usize,
    },

    /// Driver operation issued in the wrong protocol state
    #[error("Accelerator in invalid state: {state}")]
    InvalidState {
        /// Description of the violation
        state: String,
    },

    /// Busy bit still set after the poll budget was spent
    #[error("Accelerator timeout: busy bit still set after {polls} polls")]
    AcceleratorTimeout {
        /// CTRL reads performed
        polls: u64,
    },

    /// Busy bit still set after the wall-clock deadline
    #[error("Operation timeout after {duration_ms}ms")]
    Timeout {
        /// Deadline in milliseconds
        duration_ms: u64,
    },

    /// Mapping a physical window failed
    #[error("Failed to map {what}: {source}")]
    Map {
        /// Which window was being mapped
        what: String,
        /// Underlying OS error
        #[source]
        source: std::io::Error,
    },

    /// I/O error on the console or device files
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error
        #[from]
        source: std::io::Error,
    },
}

impl VecdotError {
    /// Create an invalid length error
    pub fn invalid_length(requested: usize, reason: impl Into<String>) -> Self {
        Self::InvalidLength {
            requested,
            reason: reason.into(),
        }
    }

    /// Create an invalid input error
    pub fn invalid_input(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid state error
    pub fn invalid_state(state: impl Into<String>) -> Self {
        Self::InvalidState {
            state: state.into(),
        }
    }

    /// Create a mapping error
    pub fn map(what: impl Into<String>, source: impl Into<std::io::Error>) -> Self {
        Self::Map {
            what: what.into(),
            source: source.into(),
        }
    }

    /// Whether the error came from a bounded wait giving up
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::AcceleratorTimeout { .. } | Self::Timeout { .. })
    }
}
