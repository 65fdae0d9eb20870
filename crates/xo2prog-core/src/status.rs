//! Configuration status register

use bitflags::bitflags;
use core::fmt;

bitflags! {
    /// MachXO2 status register value
    ///
    /// Only the three flags below are interpreted; every other bit is kept
    /// as read so the raw value can still be logged.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StatusRegister: u32 {
        /// Configuration interface is enabled
        const ENABLED = 1 << 9;
        /// Device is busy with the previous command
        const BUSY    = 1 << 12;
        /// Previous command failed
        const FAIL    = 1 << 13;

        const _ = !0;
    }
}

impl StatusRegister {
    /// Wrap a raw 32-bit status word
    pub const fn from_raw(value: u32) -> Self {
        Self::from_bits_retain(value)
    }

    /// Raw 32-bit value
    pub const fn raw(&self) -> u32 {
        self.bits()
    }

    /// Configuration interface enabled (bit 9)
    pub fn enabled(&self) -> bool {
        self.contains(Self::ENABLED)
    }

    /// Busy (bit 12)
    pub fn busy(&self) -> bool {
        self.contains(Self::BUSY)
    }

    /// Fail (bit 13)
    pub fn fail(&self) -> bool {
        self.contains(Self::FAIL)
    }
}

impl fmt::Display for StatusRegister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "0x{:08X} [enabled={} busy={} fail={}]",
            self.raw(),
            self.enabled(),
            self.busy(),
            self.fail()
        )
    }
}
