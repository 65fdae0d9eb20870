//! SPI frame types and command headers
//!
//! This module provides the frame type handed to programmers and the
//! fixed MachXO2 sysCONFIG command headers.

mod command;
pub mod opcodes;

pub use command::{SpiCommand, MAX_FRAME_LEN};
pub use opcodes::*;
