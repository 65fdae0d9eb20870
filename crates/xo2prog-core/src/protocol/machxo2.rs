//! MachXO2 sysCONFIG protocol implementation
//!
//! This module implements the individual command sequences of the
//! MachXO2 offline configuration interface. Each function issues fixed
//! frames through a [`SpiMaster`]; sequencing and phase checks live in
//! [`crate::session`].
//!
//! Uses `maybe_async` to support both sync and async modes:
//! - With `is_sync` feature: blocking/synchronous
//! - Without `is_sync` feature: async (for Embassy, tokio)

use crate::error::{Error, Result};
use crate::frame::{opcodes, SpiCommand};
use crate::fuse::Page;
use crate::programmer::SpiMaster;
use crate::status::StatusRegister;
use maybe_async::maybe_async;

/// Delay between status polls while the device is busy
pub const POLL_INTERVAL_MS: u32 = 1;

/// Time the device needs to reload its configuration after refresh
pub const REFRESH_DELAY_MS: u32 = 10;

/// Status polling parameters for [`wait_idle`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Delay between polls in milliseconds
    pub interval_ms: u32,
    /// Give up after this many status reads (`None` waits forever)
    pub max_polls: Option<u32>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: POLL_INTERVAL_MS,
            max_polls: None,
        }
    }
}

impl PollConfig {
    /// Set the delay between polls
    pub fn with_interval_ms(mut self, interval_ms: u32) -> Self {
        self.interval_ms = interval_ms;
        self
    }

    /// Bound the number of status reads
    pub fn with_max_polls(mut self, max_polls: u32) -> Self {
        self.max_polls = Some(max_polls);
        self
    }
}

fn be32(b: &[u8]) -> u32 {
    u32::from_be_bytes([b[0], b[1], b[2], b[3]])
}

/// Send a command header with no payload
#[maybe_async]
pub async fn send<M: SpiMaster + ?Sized>(master: &mut M, header: &[u8]) -> Result<()> {
    let mut cmd = SpiCommand::simple(header);
    master.execute(&mut cmd).await
}

/// Read the 32-bit device ID
#[maybe_async]
pub async fn read_device_id<M: SpiMaster + ?Sized>(master: &mut M) -> Result<u32> {
    let mut buf = [0u8; 4];
    let mut cmd = SpiCommand::read_reg(&opcodes::IDCODE_PUB, &mut buf);
    master.execute(&mut cmd).await?;
    Ok(be32(&buf))
}

/// Read the device ID and check it against the MachXO2-256
#[maybe_async]
pub async fn identify<M: SpiMaster + ?Sized>(master: &mut M) -> Result<u32> {
    let id = read_device_id(master).await?;
    log::debug!("machxo2: device ID 0x{:08X}", id);
    if id != opcodes::MACHXO2_256_ID {
        return Err(Error::IdMismatch { found: id });
    }
    Ok(id)
}

/// Read the status register
#[maybe_async]
pub async fn read_status<M: SpiMaster + ?Sized>(master: &mut M) -> Result<StatusRegister> {
    let mut buf = [0u8; 4];
    let mut cmd = SpiCommand::read_reg(&opcodes::LSC_READ_STATUS, &mut buf);
    master.execute(&mut cmd).await?;
    Ok(StatusRegister::from_raw(be32(&buf)))
}

/// Wait for the BUSY bit to clear
///
/// Polls the status register, sleeping `poll.interval_ms` between reads.
/// With `poll.max_polls` unset this blocks until the device reports idle;
/// otherwise it returns `Error::Timeout` after that many busy reads.
/// Returns the first non-busy status.
#[maybe_async]
pub async fn wait_idle<M: SpiMaster + ?Sized>(
    master: &mut M,
    poll: &PollConfig,
) -> Result<StatusRegister> {
    let mut polls: u32 = 0;
    loop {
        let status = read_status(master).await?;
        if !status.busy() {
            return Ok(status);
        }
        polls = polls.saturating_add(1);
        if let Some(max) = poll.max_polls {
            if polls >= max {
                log::warn!("machxo2: still busy after {} polls ({})", polls, status);
                return Err(Error::Timeout);
            }
        }
        master.delay_ms(poll.interval_ms).await;
    }
}

/// Send a command and wait for the device to finish it
#[maybe_async]
pub async fn send_and_wait<M: SpiMaster + ?Sized>(
    master: &mut M,
    header: &[u8],
    poll: &PollConfig,
) -> Result<StatusRegister> {
    send(master, header).await?;
    wait_idle(master, poll).await
}

/// Enter offline configuration mode and clear SRAM
///
/// Returns the status read after both steps; the caller decides whether
/// it indicates success.
#[maybe_async]
pub async fn enable_offline<M: SpiMaster + ?Sized>(
    master: &mut M,
    poll: &PollConfig,
) -> Result<StatusRegister> {
    send_and_wait(master, &opcodes::ISC_ENABLE_X, poll).await?;
    send_and_wait(master, &opcodes::ISC_ERASE_SRAM, poll).await?;
    read_status(master).await
}

/// Leave configuration mode and reload the configuration
#[maybe_async]
pub async fn disable<M: SpiMaster + ?Sized>(master: &mut M) -> Result<()> {
    send(master, &opcodes::ISC_DISABLE).await?;
    send(master, &opcodes::ISC_NOOP).await?;
    send(master, &opcodes::LSC_REFRESH).await?;
    master.delay_ms(REFRESH_DELAY_MS).await;
    Ok(())
}

/// Read both feature row words
#[maybe_async]
pub async fn read_feature_row<M: SpiMaster + ?Sized>(master: &mut M) -> Result<(u32, u32)> {
    let mut buf = [0u8; 8];
    let mut cmd = SpiCommand::read_reg(&opcodes::LSC_READ_FEATURE, &mut buf);
    master.execute(&mut cmd).await?;
    Ok((be32(&buf[0..4]), be32(&buf[4..8])))
}

/// Read FEABITS
///
/// The exchange is 12 bytes long like the feature row read; only the
/// first two response bytes carry data.
#[maybe_async]
pub async fn read_feabits<M: SpiMaster + ?Sized>(master: &mut M) -> Result<u16> {
    let mut buf = [0u8; 8];
    let mut cmd = SpiCommand::read_reg(&opcodes::LSC_READ_FEABITS, &mut buf);
    master.execute(&mut cmd).await?;
    Ok(u16::from_be_bytes([buf[0], buf[1]]))
}

/// Read the 32-bit USERCODE
#[maybe_async]
pub async fn read_usercode<M: SpiMaster + ?Sized>(master: &mut M) -> Result<u32> {
    let mut buf = [0u8; 4];
    let mut cmd = SpiCommand::read_reg(&opcodes::USERCODE, &mut buf);
    master.execute(&mut cmd).await?;
    Ok(be32(&buf))
}

/// Program one page at the current address and advance it
#[maybe_async]
pub async fn program_page<M: SpiMaster + ?Sized>(master: &mut M, page: &Page) -> Result<()> {
    let mut cmd = SpiCommand::write_data(&opcodes::LSC_PROG_INCR_NV, page);
    master.execute(&mut cmd).await
}

/// Read one page at the current address and advance it
#[maybe_async]
pub async fn read_page<M: SpiMaster + ?Sized>(master: &mut M, page: &mut Page) -> Result<()> {
    let mut cmd = SpiCommand::read_reg(&opcodes::LSC_READ_INCR_NV, page);
    master.execute(&mut cmd).await
}
