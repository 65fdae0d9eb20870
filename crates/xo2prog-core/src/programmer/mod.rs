//! Programmer traits and abstractions
//!
//! This module defines the trait every SPI bridge implements to reach the
//! MachXO2 configuration port.

mod traits;

pub use traits::*;
