//! xo2prog-linux-spi - Linux spidev support
//!
//! This crate drives a MachXO2 configuration port through the Linux
//! `/dev/spidevX.Y` device interface.
//!
//! # Example
//!
//! ```no_run
//! use xo2prog_linux_spi::{LinuxSpi, LinuxSpiConfig};
//! use xo2prog_core::protocol;
//!
//! let config = LinuxSpiConfig::new("/dev/spidev0.0").with_speed(1_000_000);
//! let mut spi = LinuxSpi::open(&config)?;
//!
//! let id = protocol::read_device_id(&mut spi)?;
//! println!("Device ID: 0x{:08X}", id);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Usage with the xo2prog CLI
//!
//! ```bash
//! xo2prog probe -p linux_spi:dev=/dev/spidev0.0
//! xo2prog program -p linux_spi:dev=/dev/spidev0.0,spispeed=1000 -i design.jed
//! ```
//!
//! # System Requirements
//!
//! - Linux kernel with spidev support enabled (`CONFIG_SPI_SPIDEV`)
//! - Read/write access to `/dev/spidevX.Y`

pub mod device;
pub mod error;

pub use device::{parse_options, LinuxSpi, LinuxSpiConfig, DEFAULT_SPEED_HZ};
pub use error::{LinuxSpiError, Result};

use xo2prog_core::programmer::SpiMaster;

/// Open a Linux SPI device and return a boxed SpiMaster
///
/// # Options
///
/// - `dev=/dev/spidev0.0` - Required: device path
/// - `spispeed=400` - Optional: speed in kHz (default: 400)
/// - `mode=0` - Optional: SPI mode 0-3 (default: 0)
pub fn open_linux_spi(options: &[(&str, &str)]) -> Result<Box<dyn SpiMaster + Send>> {
    let config = parse_options(options)?;
    let spi = LinuxSpi::open(&config)?;
    Ok(Box::new(spi))
}
