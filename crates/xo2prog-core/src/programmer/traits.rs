//! Programmer trait definitions
//!
//! These traits use `maybe_async` to support both sync and async modes.
//! - By default, traits are async (suitable for Embassy, tokio)
//! - With the `is_sync` feature, traits become synchronous

use crate::error::{Error, Result};
use crate::frame::{SpiCommand, MAX_FRAME_LEN};
use maybe_async::maybe_async;

/// SPI Master trait (sync or async depending on `is_sync` feature)
///
/// This trait represents a programmer that can clock command frames into
/// the MachXO2 configuration port.
///
/// Every exchange is full duplex: chip select is asserted for the whole
/// frame (`header`, `write_data`, then `read_buf.len()` zero bytes), and
/// the bytes received during the trailing read phase are stored in
/// `read_buf`. The session owns the programmer exclusively for its
/// lifetime, so implementations need no locking.
///
/// ## Example
///
/// ```ignore
/// impl SpiMaster for MyBridge {
///     fn max_transfer_len(&self) -> usize {
///         64
///     }
///
///     fn execute(&mut self, cmd: &mut SpiCommand<'_>) -> Result<()> {
///         default_execute(cmd, |tx, rx| self.transfer(tx, rx))
///     }
///
///     fn delay_ms(&mut self, ms: u32) {
///         std::thread::sleep(Duration::from_millis(ms as u64));
///     }
/// }
/// ```
#[maybe_async(AFIT)]
pub trait SpiMaster {
    /// Get the maximum number of bytes in a single exchange
    fn max_transfer_len(&self) -> usize;

    /// Execute a single command frame
    async fn execute(&mut self, cmd: &mut SpiCommand<'_>) -> Result<()>;

    /// Delay for the specified number of milliseconds
    async fn delay_ms(&mut self, ms: u32);
}

// Blanket impl for boxed SPI masters to allow trait objects (sync mode only)
// In async mode, traits with async fn are not object-safe
#[cfg(all(feature = "alloc", feature = "is_sync"))]
impl SpiMaster for alloc::boxed::Box<dyn SpiMaster + Send> {
    fn max_transfer_len(&self) -> usize {
        (**self).max_transfer_len()
    }

    fn execute(&mut self, cmd: &mut SpiCommand<'_>) -> Result<()> {
        (**self).execute(cmd)
    }

    fn delay_ms(&mut self, ms: u32) {
        (**self).delay_ms(ms)
    }
}

/// Helper function for implementing `SpiMaster::execute()`.
///
/// Most programmer implementations follow the same pattern:
/// 1. Encode the outgoing frame
/// 2. Run one full-duplex transfer of the same length
/// 3. Copy the read phase back into the command's read buffer
///
/// This function handles steps 1 and 3 on the stack, delegating step 2 to
/// the provided closure, which receives the transmit frame and a receive
/// buffer of identical length.
///
/// # Example
///
/// ```ignore
/// fn execute(&mut self, cmd: &mut SpiCommand<'_>) -> CoreResult<()> {
///     default_execute(cmd, |tx, rx| {
///         self.spi_transfer(tx, rx)
///             .map_err(|_| CoreError::TransferFailed)
///     })
/// }
/// ```
pub fn default_execute<F>(cmd: &mut SpiCommand<'_>, transfer_fn: F) -> Result<()>
where
    F: FnOnce(&[u8], &mut [u8]) -> Result<()>,
{
    let len = cmd.total_len();
    if len > MAX_FRAME_LEN {
        return Err(Error::FrameTooLarge);
    }

    let mut tx = [0u8; MAX_FRAME_LEN];
    let mut rx = [0u8; MAX_FRAME_LEN];
    cmd.encode(&mut tx[..len]);

    transfer_fn(&tx[..len], &mut rx[..len])?;

    if cmd.has_read() {
        cmd.decode_response(&rx[..len]);
    }
    Ok(())
}

/// Information about a programmer
#[derive(Debug, Clone)]
pub struct ProgrammerInfo {
    /// Name of the programmer
    pub name: &'static str,
    /// Alternative names/aliases
    pub aliases: &'static [&'static str],
    /// Description
    pub description: &'static str,
    /// Whether this programmer requires elevated privileges
    pub requires_root: bool,
}
