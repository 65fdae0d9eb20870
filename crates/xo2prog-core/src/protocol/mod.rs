//! Device protocol implementations
//!
//! This module contains the command sequences for the MachXO2
//! configuration interface.

pub mod machxo2;

pub use machxo2::*;
