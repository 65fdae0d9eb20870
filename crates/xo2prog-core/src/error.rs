//! Error types for xo2prog-core
//!
//! This module provides a no_std compatible error type for the device
//! protocol. JEDEC parse failures have their own type in
//! [`crate::jedec::JedecError`].

use core::fmt;

use crate::session::Phase;
use crate::status::StatusRegister;

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    // Transport errors
    /// SPI transfer failed
    TransferFailed,
    /// Frame does not fit the transfer buffer
    FrameTooLarge,
    /// Device stayed busy for longer than the configured poll limit
    Timeout,

    // Device errors
    /// Device ID does not match the MachXO2-256
    IdMismatch {
        /// The ID that was read back
        found: u32,
    },
    /// Offline configuration mode could not be entered
    EnableFailed(StatusRegister),
    /// Flash erase reported failure
    EraseFailed(StatusRegister),
    /// Page or DONE bit programming reported failure
    ProgramFailed(StatusRegister),
    /// Read-back of a programmed page did not match the fuse table
    VerifyFailed {
        /// Index of the first mismatching page
        page: usize,
    },

    // Usage errors
    /// Operation is not allowed in the current session phase
    InvalidState {
        /// Phase the session was in
        phase: Phase,
    },
    /// Fuse index is beyond the fuse table
    AddressOutOfBounds,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TransferFailed => write!(f, "SPI transfer failed"),
            Self::FrameTooLarge => write!(f, "frame exceeds transfer buffer"),
            Self::Timeout => write!(f, "device busy timeout"),
            Self::IdMismatch { found } => {
                write!(f, "unexpected device ID 0x{:08X}", found)
            }
            Self::EnableFailed(status) => {
                write!(f, "failed to enable configuration mode (status {})", status)
            }
            Self::EraseFailed(status) => write!(f, "flash erase failed (status {})", status),
            Self::ProgramFailed(status) => write!(f, "programming failed (status {})", status),
            Self::VerifyFailed { page } => write!(f, "verify failed at page {}", page),
            Self::InvalidState { phase } => {
                write!(f, "operation not allowed while {}", phase)
            }
            Self::AddressOutOfBounds => write!(f, "fuse address out of bounds"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
