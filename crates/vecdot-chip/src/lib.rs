// SPDX-License-Identifier: AGPL-3.0-only

//! Silicon model for the FPGA vector dot-product accelerator.
//!
//! This crate has **no dependencies** and **no hardware access**. It is a
//! pure model of the system: register offsets, bit definitions, the
//! physical memory map and the timer clock.
//!
//! # Crate organisation
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`regs`] | Accelerator register block (CTRL, VEC_LENGTH, BASE_A/B, RESULT_LO/HI) |
//! | [`timer`] | Interval timer register block and control/status bits |
//! | [`memmap`] | Physical base addresses and the shared SDRAM window |

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod memmap;
pub mod regs;
pub mod timer;
