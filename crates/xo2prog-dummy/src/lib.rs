//! xo2prog-dummy - In-memory MachXO2 emulator for testing
//!
//! This crate provides a dummy programmer that emulates the configuration
//! port of a MachXO2-256 in memory. It's useful for testing and development
//! without real hardware: every frame is recorded, the configuration flash
//! is kept as a fuse table, and busy periods and failures can be injected
//! through [`DummyConfig`].

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "alloc")]
use alloc::vec::Vec;

use xo2prog_core::error::{Error, Result};
use xo2prog_core::frame::{opcodes, SpiCommand, MAX_FRAME_LEN};
use xo2prog_core::fuse::{FuseTable, Page, PAGE_BYTES, PAGE_COUNT};
use xo2prog_core::programmer::{default_execute, SpiMaster};
use xo2prog_core::status::StatusRegister;

/// Offset of the response data within a frame (after the 4-byte header)
const DATA_OFFSET: usize = 4;

/// Configuration for the dummy device
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// Value returned by IDCODE_PUB
    pub device_id: u32,
    /// Number of status reads that report BUSY after each long command
    pub busy_polls: u32,
    /// Refuse to enter configuration mode
    pub fail_enable: bool,
    /// Report FAIL after a flash erase and leave the flash untouched
    pub fail_erase: bool,
    /// Report FAIL after a page program and drop the page
    pub fail_program: bool,
    /// Feature row word 0
    pub feature_row0: u32,
    /// Feature row word 1
    pub feature_row1: u32,
    /// FEABITS register
    pub feabits: u16,
    /// USERCODE register
    pub usercode: u32,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            device_id: opcodes::MACHXO2_256_ID,
            busy_polls: 2,
            fail_enable: false,
            fail_erase: false,
            fail_program: false,
            feature_row0: 0x0000_0000,
            feature_row1: 0x0000_0620,
            feabits: 0x0620,
            usercode: 0xDEAD_BEEF,
        }
    }
}

/// Dummy MachXO2-256
///
/// Emulates the offline configuration interface for testing purposes.
#[cfg(feature = "alloc")]
pub struct DummyMachXo2 {
    config: DummyConfig,
    flash: FuseTable,
    enabled: bool,
    fail: bool,
    done: bool,
    busy_remaining: u32,
    address: usize,
    refreshes: u32,
    frames: Vec<Vec<u8>>,
    delays: Vec<u32>,
}

#[cfg(feature = "alloc")]
impl DummyMachXo2 {
    /// Create a new dummy device with the given configuration
    pub fn new(config: DummyConfig) -> Self {
        Self {
            config,
            flash: FuseTable::new(),
            enabled: false,
            fail: false,
            done: false,
            busy_remaining: 0,
            address: 0,
            refreshes: 0,
            frames: Vec::new(),
            delays: Vec::new(),
        }
    }

    /// Create a new dummy device with default configuration
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Get the configuration
    pub fn config(&self) -> &DummyConfig {
        &self.config
    }

    /// Contents of the emulated configuration flash
    pub fn flash(&self) -> &FuseTable {
        &self.flash
    }

    /// Mutable access to the configuration flash
    pub fn flash_mut(&mut self) -> &mut FuseTable {
        &mut self.flash
    }

    /// Whether the DONE bit has been programmed since the last erase
    pub fn done(&self) -> bool {
        self.done
    }

    /// Whether the device is in configuration mode
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Number of REFRESH commands received
    pub fn refreshes(&self) -> u32 {
        self.refreshes
    }

    /// Every frame clocked out so far, read phase included
    pub fn frames(&self) -> &[Vec<u8>] {
        &self.frames
    }

    /// Every delay requested so far, in milliseconds
    pub fn delays(&self) -> &[u32] {
        &self.delays
    }

    /// Forget recorded frames and delays
    pub fn clear_log(&mut self) {
        self.frames.clear();
        self.delays.clear();
    }

    fn status(&mut self) -> StatusRegister {
        let mut status = StatusRegister::empty();
        if self.enabled {
            status |= StatusRegister::ENABLED;
        }
        if self.fail {
            status |= StatusRegister::FAIL;
        }
        if self.busy_remaining > 0 {
            status |= StatusRegister::BUSY;
            if self.busy_remaining != u32::MAX {
                self.busy_remaining -= 1;
            }
        }
        status
    }

    fn start_busy(&mut self) {
        self.busy_remaining = self.config.busy_polls;
    }

    fn handle_erase(&mut self, target: u8) {
        match target {
            opcodes::ERASE_SRAM => {
                log::debug!("dummy: SRAM erased");
            }
            opcodes::ERASE_FLASH => {
                if self.config.fail_erase {
                    log::debug!("dummy: flash erase failure injected");
                    self.fail = true;
                } else {
                    self.flash.clear_all();
                    self.done = false;
                    log::debug!("dummy: flash erased");
                }
            }
            other => log::warn!("dummy: unknown erase target 0x{:02X}", other),
        }
        self.start_busy();
    }

    fn handle_program(&mut self, data: &[u8]) -> Result<()> {
        let page: Page = data
            .get(..PAGE_BYTES)
            .and_then(|d| d.try_into().ok())
            .ok_or(Error::TransferFailed)?;
        if self.config.fail_program {
            self.fail = true;
        } else if self.address < PAGE_COUNT {
            self.flash.set_page(self.address, &page);
        } else {
            return Err(Error::AddressOutOfBounds);
        }
        self.address += 1;
        self.start_busy();
        Ok(())
    }

    fn handle_read_page(&mut self, rx: &mut [u8]) -> Result<()> {
        if self.address >= PAGE_COUNT {
            return Err(Error::AddressOutOfBounds);
        }
        put(rx, &self.flash.page(self.address));
        self.address += 1;
        Ok(())
    }

    /// Produce the device's side of one full-duplex exchange
    fn respond(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<()> {
        self.frames.push(tx.to_vec());
        rx.fill(0xFF);

        match tx[0] {
            0xE0 => put(rx, &self.config.device_id.to_be_bytes()),
            0x3C => {
                let status = self.status();
                put(rx, &status.raw().to_be_bytes());
            }
            0xC6 => {
                if !self.config.fail_enable {
                    self.enabled = true;
                    self.fail = false;
                }
                self.start_busy();
            }
            opcodes::OP_ISC_ERASE => self.handle_erase(tx.get(1).copied().unwrap_or(0)),
            0x46 => {
                self.address = 0;
                self.start_busy();
            }
            0x70 => self.handle_program(&tx[DATA_OFFSET..])?,
            0x73 => self.handle_read_page(rx)?,
            0x5E => {
                self.done = true;
                self.start_busy();
            }
            0xE7 => {
                let mut row = [0u8; 8];
                row[..4].copy_from_slice(&self.config.feature_row0.to_be_bytes());
                row[4..].copy_from_slice(&self.config.feature_row1.to_be_bytes());
                put(rx, &row);
            }
            0xFB => put(rx, &self.config.feabits.to_be_bytes()),
            0xC0 => put(rx, &self.config.usercode.to_be_bytes()),
            0x26 => self.enabled = false,
            0xFF => {}
            0x79 => {
                self.refreshes += 1;
                self.fail = false;
            }
            op => {
                log::warn!("dummy: unsupported opcode 0x{:02X}", op);
                return Err(Error::TransferFailed);
            }
        }
        Ok(())
    }
}

/// Place response data after the 4-byte header
fn put(rx: &mut [u8], data: &[u8]) {
    if let Some(dst) = rx.get_mut(DATA_OFFSET..DATA_OFFSET + data.len()) {
        dst.copy_from_slice(data);
    }
}

#[cfg(feature = "alloc")]
impl SpiMaster for DummyMachXo2 {
    fn max_transfer_len(&self) -> usize {
        MAX_FRAME_LEN
    }

    fn execute(&mut self, cmd: &mut SpiCommand<'_>) -> Result<()> {
        default_execute(cmd, |tx, rx| self.respond(tx, rx))
    }

    fn delay_ms(&mut self, ms: u32) {
        // No delay needed for in-memory operations
        self.delays.push(ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xo2prog_core::protocol::{self, PollConfig};
    use xo2prog_core::session::Features;
    use xo2prog_core::{NoProgress, Phase, Session};

    const STATUS_FRAME: [u8; 8] = [0x3C, 0, 0, 0, 0, 0, 0, 0];

    fn quick() -> DummyConfig {
        DummyConfig {
            busy_polls: 0,
            ..Default::default()
        }
    }

    fn pattern() -> FuseTable {
        let mut t = FuseTable::new();
        for i in (0..t.size()).step_by(7) {
            t.set(i);
        }
        t
    }

    fn count_opcode(dev: &DummyMachXo2, op: u8) -> usize {
        dev.frames().iter().filter(|f| f[0] == op).count()
    }

    #[test]
    fn test_read_device_id() {
        let mut dev = DummyMachXo2::new_default();
        let id = protocol::read_device_id(&mut dev).unwrap();
        assert_eq!(id, 0x012B_8043);
        assert_eq!(dev.frames(), &[vec![0xE0u8, 0, 0, 0, 0, 0, 0, 0]]);
    }

    #[test]
    fn test_identify_mismatch_keeps_phase() {
        let mut dev = DummyMachXo2::new(DummyConfig {
            device_id: 0x012B_9043,
            ..Default::default()
        });
        let mut session = Session::new(&mut dev);
        assert_eq!(
            session.identify(),
            Err(Error::IdMismatch { found: 0x012B_9043 })
        );
        assert_eq!(session.phase(), Phase::Unidentified);
    }

    #[test]
    fn test_enable_frame_sequence() {
        let mut dev = DummyMachXo2::new(quick());
        let mut session = Session::new(&mut dev);
        session.identify().unwrap();
        session.enable().unwrap();
        assert_eq!(session.phase(), Phase::ConfigEnabled);

        let frames = &dev.frames()[1..];
        assert_eq!(frames[0], [0xC6, 0x08, 0x00, 0x00]);
        assert_eq!(frames[1], STATUS_FRAME);
        assert_eq!(frames[2], [0x0E, 0x01, 0x00, 0x00]);
        assert_eq!(frames[3], STATUS_FRAME);
        assert_eq!(frames[4], STATUS_FRAME);
        assert_eq!(frames.len(), 5);
        assert!(dev.enabled());
    }

    #[test]
    fn test_enable_rejected() {
        let mut dev = DummyMachXo2::new(DummyConfig {
            fail_enable: true,
            ..quick()
        });
        let mut session = Session::new(&mut dev);
        session.identify().unwrap();
        match session.enable() {
            Err(Error::EnableFailed(status)) => assert!(!status.enabled()),
            other => panic!("unexpected result {:?}", other),
        }
        assert_eq!(session.phase(), Phase::Identified);
    }

    #[test]
    fn test_wait_idle_polls_busy_device() {
        let mut dev = DummyMachXo2::new(DummyConfig {
            busy_polls: 3,
            ..Default::default()
        });
        protocol::send(&mut dev, &opcodes::LSC_INIT_ADDRESS).unwrap();
        let status = protocol::wait_idle(&mut dev, &PollConfig::default()).unwrap();
        assert!(!status.busy());
        assert_eq!(count_opcode(&dev, 0x3C), 4);
        assert_eq!(dev.delays(), &[1, 1, 1]);
    }

    #[test]
    fn test_wait_idle_times_out() {
        let mut dev = DummyMachXo2::new(DummyConfig {
            busy_polls: u32::MAX,
            ..Default::default()
        });
        let poll = PollConfig::default().with_max_polls(5);
        let mut session = Session::new(&mut dev).with_poll_config(poll);
        session.identify().unwrap();
        assert_eq!(session.enable(), Err(Error::Timeout));
        drop(session);

        assert_eq!(count_opcode(&dev, 0x3C), 5);
        assert_eq!(dev.delays().len(), 4);
    }

    #[test]
    fn test_config_ops_require_enable() {
        let mut dev = DummyMachXo2::new(quick());
        let fuses = pattern();
        let mut session = Session::new(&mut dev);

        assert_eq!(
            session.program(&fuses, &mut NoProgress),
            Err(Error::InvalidState {
                phase: Phase::Unidentified
            })
        );
        assert_eq!(
            session.enable(),
            Err(Error::InvalidState {
                phase: Phase::Unidentified
            })
        );
        session.identify().unwrap();
        assert_eq!(
            session.read_usercode(),
            Err(Error::InvalidState {
                phase: Phase::Identified
            })
        );
        drop(session);
        // only the IDCODE read reached the bus
        assert_eq!(dev.frames().len(), 1);
    }

    #[test]
    fn test_program_writes_every_page() {
        let mut dev = DummyMachXo2::new_default();
        let fuses = pattern();
        let mut session = Session::new(&mut dev);
        session.identify().unwrap();
        session.enable().unwrap();
        session.master().clear_log();
        session.program(&fuses, &mut NoProgress).unwrap();
        assert_eq!(session.phase(), Phase::Programming);
        drop(session);

        assert_eq!(dev.flash(), &fuses);
        assert!(dev.done());
        assert_eq!(count_opcode(&dev, 0x70), PAGE_COUNT);

        let frames = dev.frames();
        assert_eq!(frames[0], [0x0E, 0x04, 0x00, 0x00]);
        let init = frames.iter().position(|f| f[0] == 0x46).unwrap();
        let first = frames[init + 1..].iter().find(|f| f[0] == 0x70).unwrap();
        assert_eq!(first.len(), 20);
        assert_eq!(&first[..4], &[0x70, 0x00, 0x00, 0x01]);
        assert_eq!(&first[4..], &fuses.page(0));

        // every page is followed by a status poll
        for (n, f) in frames.iter().enumerate() {
            if f[0] == 0x70 {
                assert_eq!(frames[n + 1][0], 0x3C);
            }
        }

        let done = frames.iter().position(|f| f[0] == 0x5E).unwrap();
        assert_eq!(frames[done], [0x5E, 0x00, 0x00, 0x00]);
        assert!(frames[done + 1..].iter().all(|f| f[..] == STATUS_FRAME));
    }

    #[test]
    fn test_erase_failure_stops_programming() {
        let mut dev = DummyMachXo2::new(DummyConfig {
            fail_erase: true,
            ..quick()
        });
        let mut session = Session::new(&mut dev);
        session.identify().unwrap();
        session.enable().unwrap();
        match session.program(&pattern(), &mut NoProgress) {
            Err(Error::EraseFailed(status)) => assert!(status.fail()),
            other => panic!("unexpected result {:?}", other),
        }
        drop(session);

        assert_eq!(count_opcode(&dev, 0x70), 0);
        assert_eq!(count_opcode(&dev, 0x46), 0);
        assert!(!dev.done());
    }

    #[test]
    fn test_program_failure_reported() {
        let mut dev = DummyMachXo2::new(DummyConfig {
            fail_program: true,
            ..quick()
        });
        let mut session = Session::new(&mut dev);
        session.identify().unwrap();
        session.enable().unwrap();
        assert!(matches!(
            session.program(&pattern(), &mut NoProgress),
            Err(Error::ProgramFailed(_))
        ));
    }

    #[test]
    fn test_verify_detects_corruption() {
        let mut dev = DummyMachXo2::new(quick());
        let fuses = pattern();
        let mut session = Session::new(&mut dev);
        session.identify().unwrap();
        session.enable().unwrap();
        session.program(&fuses, &mut NoProgress).unwrap();
        session.verify(&fuses, &mut NoProgress).unwrap();
        assert_eq!(session.phase(), Phase::Verifying);

        let bit = 3 * 128 + 5;
        let flash = session.master().flash_mut();
        if flash.test(bit) {
            flash.clear(bit);
        } else {
            flash.set(bit);
        }
        assert_eq!(
            session.verify(&fuses, &mut NoProgress),
            Err(Error::VerifyFailed { page: 3 })
        );
    }

    #[test]
    fn test_no_erase_after_programming() {
        let mut dev = DummyMachXo2::new(quick());
        let fuses = pattern();
        let mut session = Session::new(&mut dev);
        session.identify().unwrap();
        session.enable().unwrap();
        session.program(&fuses, &mut NoProgress).unwrap();

        session.master().clear_log();
        assert_eq!(
            session.erase_flash(),
            Err(Error::InvalidState {
                phase: Phase::Programming
            })
        );
        session.verify(&fuses, &mut NoProgress).unwrap();
        assert_eq!(
            session.program(&fuses, &mut NoProgress),
            Err(Error::InvalidState {
                phase: Phase::Verifying
            })
        );
        assert_eq!(session.master().flash(), &fuses);
        assert_eq!(count_opcode(session.master(), opcodes::OP_ISC_ERASE), 0);

        // a fresh enable starts over
        session.disable().unwrap();
        session.enable().unwrap();
        session.erase_flash().unwrap();
        assert_eq!(session.phase(), Phase::Erasing);
        session.program(&fuses, &mut NoProgress).unwrap();
    }

    #[test]
    fn test_disable_frame_sequence() {
        let mut dev = DummyMachXo2::new(quick());
        let mut session = Session::new(&mut dev);
        session.identify().unwrap();
        session.enable().unwrap();
        session.master().clear_log();
        session.disable().unwrap();
        assert_eq!(session.phase(), Phase::Disabled);

        // identify and enable are allowed again
        session.identify().unwrap();
        session.enable().unwrap();
        drop(session);

        let frames = dev.frames();
        assert_eq!(frames[0], [0x26, 0x00, 0x00]);
        assert_eq!(frames[1], [0xFF, 0xFF, 0xFF, 0xFF]);
        assert_eq!(frames[2], [0x79, 0x00, 0x00]);
        assert_eq!(dev.delays()[0], 10);
        assert_eq!(dev.refreshes(), 1);
    }

    #[test]
    fn test_read_features_and_usercode() {
        let mut dev = DummyMachXo2::new(DummyConfig {
            feature_row0: 0x1122_3344,
            feature_row1: 0x5566_7788,
            feabits: 0x0A0B,
            usercode: 0xCAFE_F00D,
            ..quick()
        });
        let mut session = Session::new(&mut dev);
        session.identify().unwrap();
        session.enable().unwrap();
        assert_eq!(
            session.read_features().unwrap(),
            Features {
                feature_row0: 0x1122_3344,
                feature_row1: 0x5566_7788,
                feabits: 0x0A0B,
            }
        );
        assert_eq!(session.read_usercode().unwrap(), 0xCAFE_F00D);
        drop(session);

        let feature = dev.frames().iter().find(|f| f[0] == 0xE7).unwrap();
        assert_eq!(feature.len(), 12);
        let feabits = dev.frames().iter().find(|f| f[0] == 0xFB).unwrap();
        assert_eq!(feabits.len(), 12);
    }
}
