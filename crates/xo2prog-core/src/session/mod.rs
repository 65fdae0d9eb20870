//! Programming session
//!
//! A [`Session`] borrows a programmer exclusively and walks the device
//! through its configuration lifecycle:
//!
//! ```text
//! Unidentified -> Identified -> ConfigEnabled -> {Erasing, Programming, Verifying} -> Disabled
//! ```
//!
//! Operations issued in the wrong phase fail with `Error::InvalidState`
//! before any frame is sent. Erase, program and verify only move forward:
//! once pages have been programmed or read back, erasing or programming
//! again requires `disable` and `enable`. Protocol failures (ID mismatch, FAIL bit) are
//! returned as errors the caller may retry; nothing is retried internally
//! apart from status polling.
//!
//! An operation interrupted halfway (e.g. an error in the middle of
//! `program`) leaves the device in an undefined configuration state. Run
//! `disable` and identify again before reusing it.

mod phase;
mod progress;

pub use phase::Phase;
pub use progress::{NoProgress, ProgramProgress};

use crate::error::{Error, Result};
use crate::frame::opcodes;
use crate::fuse::{FuseTable, Page, PAGE_BYTES, PAGE_COUNT};
use crate::programmer::SpiMaster;
use crate::protocol::{self, PollConfig};
use crate::status::StatusRegister;
use maybe_async::maybe_async;

/// Feature configuration read from the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Features {
    /// Feature row word 0
    pub feature_row0: u32,
    /// Feature row word 1
    pub feature_row1: u32,
    /// FEABITS register
    pub feabits: u16,
}

/// Exclusive programming session on one device
pub struct Session<'a, M: SpiMaster + ?Sized> {
    master: &'a mut M,
    phase: Phase,
    poll: PollConfig,
}

impl<'a, M: SpiMaster + ?Sized> Session<'a, M> {
    /// Start a session on the given programmer
    pub fn new(master: &'a mut M) -> Self {
        Self {
            master,
            phase: Phase::Unidentified,
            poll: PollConfig::default(),
        }
    }

    /// Use custom status polling parameters
    pub fn with_poll_config(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Status polling parameters in use
    pub fn poll_config(&self) -> &PollConfig {
        &self.poll
    }

    /// Get a reference to the underlying programmer
    pub fn master(&mut self) -> &mut M {
        self.master
    }

    fn require_config_mode(&self) -> Result<()> {
        if self.phase.is_config_mode() {
            Ok(())
        } else {
            Err(Error::InvalidState { phase: self.phase })
        }
    }

    fn require_forward(&self, target: Phase) -> Result<()> {
        if self.phase.can_enter(target) {
            Ok(())
        } else {
            Err(Error::InvalidState { phase: self.phase })
        }
    }

    fn enter(&mut self, phase: Phase) {
        if self.phase != phase {
            log::debug!("session: {} -> {}", self.phase, phase);
            self.phase = phase;
        }
    }
}

#[maybe_async]
impl<M: SpiMaster + ?Sized> Session<'_, M> {
    /// Read the device ID and check that it is a MachXO2-256
    ///
    /// An ID mismatch is returned as `Error::IdMismatch` and leaves the
    /// phase unchanged, so the caller may retry.
    pub async fn identify(&mut self) -> Result<u32> {
        if !self.phase.can_identify() {
            return Err(Error::InvalidState { phase: self.phase });
        }
        let id = protocol::identify(self.master).await?;
        log::info!("Found MachXO2-256 (device ID 0x{:08X})", id);
        self.enter(Phase::Identified);
        Ok(id)
    }

    /// Read the status register
    pub async fn read_status(&mut self) -> Result<StatusRegister> {
        protocol::read_status(self.master).await
    }

    /// Poll until the device is no longer busy
    pub async fn wait_idle(&mut self) -> Result<StatusRegister> {
        protocol::wait_idle(self.master, &self.poll).await
    }

    /// Enter offline configuration mode
    ///
    /// Issues ISC_ENABLE_X and an SRAM erase, then requires the status to
    /// show the interface enabled and no failure.
    pub async fn enable(&mut self) -> Result<()> {
        if !self.phase.can_enable() {
            return Err(Error::InvalidState { phase: self.phase });
        }
        let status = protocol::enable_offline(self.master, &self.poll).await?;
        if status.fail() || !status.enabled() {
            log::debug!("session: enable rejected, status {}", status);
            return Err(Error::EnableFailed(status));
        }
        self.enter(Phase::ConfigEnabled);
        Ok(())
    }

    /// Leave configuration mode and let the device reload its configuration
    ///
    /// Best effort: no status is checked. Allowed in any phase.
    pub async fn disable(&mut self) -> Result<()> {
        protocol::disable(self.master).await?;
        self.enter(Phase::Disabled);
        Ok(())
    }

    /// Read the feature row and FEABITS
    pub async fn read_features(&mut self) -> Result<Features> {
        self.require_config_mode()?;
        let (feature_row0, feature_row1) = protocol::read_feature_row(self.master).await?;
        let feabits = protocol::read_feabits(self.master).await?;
        Ok(Features {
            feature_row0,
            feature_row1,
            feabits,
        })
    }

    /// Read the USERCODE word
    pub async fn read_usercode(&mut self) -> Result<u32> {
        self.require_config_mode()?;
        protocol::read_usercode(self.master).await
    }

    /// Erase the configuration flash
    pub async fn erase_flash(&mut self) -> Result<()> {
        self.require_forward(Phase::Erasing)?;
        self.erase().await
    }

    async fn erase(&mut self) -> Result<()> {
        self.enter(Phase::Erasing);
        protocol::send_and_wait(self.master, &opcodes::ISC_ERASE_FLASH, &self.poll).await?;
        let status = protocol::read_status(self.master).await?;
        if status.fail() {
            return Err(Error::EraseFailed(status));
        }
        Ok(())
    }

    /// Erase the configuration flash and program the fuse table into it
    ///
    /// Programming is not attempted if the erase reports failure. Every
    /// page is followed by a wait for idle; the DONE bit is programmed last
    /// and the final status must not report failure.
    pub async fn program<P: ProgramProgress>(
        &mut self,
        fuses: &FuseTable,
        progress: &mut P,
    ) -> Result<()> {
        self.require_forward(Phase::Erasing)?;

        progress.erasing();
        self.erase().await?;

        self.enter(Phase::Programming);
        protocol::send_and_wait(self.master, &opcodes::LSC_INIT_ADDRESS, &self.poll).await?;

        progress.programming(PAGE_COUNT);
        for (n, page) in fuses.pages().enumerate() {
            protocol::program_page(self.master, &page).await?;
            protocol::wait_idle(self.master, &self.poll).await?;
            progress.page_programmed(n + 1);
        }
        log::debug!("session: {} pages programmed", PAGE_COUNT);

        protocol::send_and_wait(self.master, &opcodes::ISC_PROGRAM_DONE, &self.poll).await?;
        let status = protocol::read_status(self.master).await?;
        if status.fail() {
            return Err(Error::ProgramFailed(status));
        }
        progress.done();
        log::info!(
            "Programmed {} fuses (checksum 0x{:04X})",
            fuses.size(),
            fuses.checksum()
        );
        Ok(())
    }

    /// Read back the configuration flash and compare it with the fuse table
    pub async fn verify<P: ProgramProgress>(
        &mut self,
        fuses: &FuseTable,
        progress: &mut P,
    ) -> Result<()> {
        self.require_forward(Phase::Verifying)?;
        self.enter(Phase::Verifying);
        protocol::send_and_wait(self.master, &opcodes::LSC_INIT_ADDRESS, &self.poll).await?;

        progress.verifying(PAGE_COUNT);
        for (n, expected) in fuses.pages().enumerate() {
            let mut actual: Page = [0; PAGE_BYTES];
            protocol::read_page(self.master, &mut actual).await?;
            if actual != expected {
                log::debug!(
                    "session: page {} mismatch: expected {:02X?}, read {:02X?}",
                    n,
                    expected,
                    actual
                );
                return Err(Error::VerifyFailed { page: n });
            }
            progress.page_verified(n + 1);
        }
        log::info!("Verified {} pages", PAGE_COUNT);
        Ok(())
    }
}
