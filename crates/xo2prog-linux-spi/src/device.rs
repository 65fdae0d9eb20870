//! Linux spidev transport
//!
//! The MachXO2 answers within the same chip-select window it receives the
//! command in, so every frame is sent as a single full-duplex transfer.

use crate::error::{LinuxSpiError, Result};

use xo2prog_core::error::{Error as CoreError, Result as CoreResult};
use xo2prog_core::frame::{SpiCommand, MAX_FRAME_LEN};
use xo2prog_core::programmer::{default_execute, SpiMaster};

use std::fs::{File, OpenOptions};
use std::os::unix::io::AsRawFd;
use std::time::Duration;

/// Path to kernel spidev buffer size parameter
const BUF_SIZE_SYSFS: &str = "/sys/module/spidev/parameters/bufsiz";

/// Default SPI clock speed in Hz (400 kHz)
pub const DEFAULT_SPEED_HZ: u32 = 400_000;

/// Linux spidev ioctl constants
mod ioctl {
    use nix::ioctl_write_ptr;

    const SPI_IOC_MAGIC: u8 = b'k';

    const SPI_IOC_TYPE_MODE: u8 = 1;
    const SPI_IOC_TYPE_BITS_PER_WORD: u8 = 3;
    const SPI_IOC_TYPE_MAX_SPEED_HZ: u8 = 4;

    ioctl_write_ptr!(spi_ioc_wr_mode, SPI_IOC_MAGIC, SPI_IOC_TYPE_MODE, u8);
    ioctl_write_ptr!(
        spi_ioc_wr_bits_per_word,
        SPI_IOC_MAGIC,
        SPI_IOC_TYPE_BITS_PER_WORD,
        u8
    );
    ioctl_write_ptr!(
        spi_ioc_wr_max_speed_hz,
        SPI_IOC_MAGIC,
        SPI_IOC_TYPE_MAX_SPEED_HZ,
        u32
    );

    /// Size of struct spi_ioc_transfer
    pub const SPI_IOC_TRANSFER_SIZE: usize = 32;

    /// SPI_IOC_MESSAGE(n) = _IOW(SPI_IOC_MAGIC, 0, char[n * sizeof(spi_ioc_transfer)])
    pub fn spi_ioc_message(n: u8) -> libc::c_ulong {
        let size = (n as usize) * SPI_IOC_TRANSFER_SIZE;
        ((1u32 << 30) | ((size as u32) << 16) | ((SPI_IOC_MAGIC as u32) << 8)) as libc::c_ulong
    }
}

/// Kernel struct spi_ioc_transfer
#[repr(C)]
#[derive(Debug, Default, Clone)]
struct SpiIocTransfer {
    tx_buf: u64,
    rx_buf: u64,
    len: u32,
    speed_hz: u32,
    delay_usecs: u16,
    bits_per_word: u8,
    cs_change: u8,
    tx_nbits: u8,
    rx_nbits: u8,
    word_delay_usecs: u8,
    _pad: u8,
}

/// Configuration for opening a Linux SPI device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinuxSpiConfig {
    /// Device path (e.g., "/dev/spidev0.0")
    pub device: String,
    /// SPI clock speed in Hz (default: 400 kHz)
    pub speed_hz: u32,
    /// SPI mode (0-3, default: 0)
    pub mode: u8,
}

impl Default for LinuxSpiConfig {
    fn default() -> Self {
        Self {
            device: String::new(),
            speed_hz: DEFAULT_SPEED_HZ,
            mode: 0,
        }
    }
}

impl LinuxSpiConfig {
    /// Create a new configuration with the given device path
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            ..Default::default()
        }
    }

    /// Set the SPI clock speed in Hz
    pub fn with_speed(mut self, speed_hz: u32) -> Self {
        self.speed_hz = speed_hz;
        self
    }

    /// Set the SPI mode (0-3)
    pub fn with_mode(mut self, mode: u8) -> Self {
        self.mode = mode;
        self
    }
}

/// MachXO2 programmer on a Linux spidev device
pub struct LinuxSpi {
    file: File,
    max_kernel_buf_size: usize,
    speed_hz: u32,
}

impl LinuxSpi {
    /// Open a Linux SPI device with the given configuration
    pub fn open(config: &LinuxSpiConfig) -> Result<Self> {
        if config.device.is_empty() {
            return Err(LinuxSpiError::NoDevice);
        }

        log::debug!("linux_spi: Opening device {}", config.device);

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&config.device)
            .map_err(|e| LinuxSpiError::OpenFailed {
                path: config.device.clone(),
                source: e,
            })?;

        let fd = file.as_raw_fd();
        let config_err = |what: &'static str| {
            move |e: nix::errno::Errno| LinuxSpiError::ConfigFailed {
                what,
                source: std::io::Error::from_raw_os_error(e as i32),
            }
        };

        let mode = config.mode;
        let bits: u8 = 8;
        let speed = config.speed_hz;
        unsafe {
            ioctl::spi_ioc_wr_mode(fd, &mode).map_err(config_err("SPI mode"))?;
            ioctl::spi_ioc_wr_bits_per_word(fd, &bits).map_err(config_err("bits per word"))?;
            ioctl::spi_ioc_wr_max_speed_hz(fd, &speed).map_err(config_err("clock speed"))?;
        }

        let max_kernel_buf_size = get_max_kernel_buf_size();
        log::info!(
            "linux_spi: Opened {} (mode={}, speed={} kHz, bufsiz={})",
            config.device,
            mode,
            speed / 1000,
            max_kernel_buf_size
        );

        Ok(Self {
            file,
            max_kernel_buf_size,
            speed_hz: speed,
        })
    }

    /// Open a device with default settings
    pub fn open_device(device: &str) -> Result<Self> {
        Self::open(&LinuxSpiConfig::new(device))
    }

    /// Current clock speed in Hz
    pub fn speed_hz(&self) -> u32 {
        self.speed_hz
    }

    /// Clock `tx` out while filling `rx` with what comes back
    fn transfer(&mut self, tx: &[u8], rx: &mut [u8]) -> Result<()> {
        if tx.len() > self.max_kernel_buf_size {
            return Err(LinuxSpiError::FrameTooLarge {
                len: tx.len(),
                max: self.max_kernel_buf_size,
            });
        }

        let transfer = SpiIocTransfer {
            tx_buf: tx.as_ptr() as u64,
            rx_buf: rx.as_mut_ptr() as u64,
            len: tx.len() as u32,
            speed_hz: self.speed_hz,
            bits_per_word: 8,
            ..Default::default()
        };

        let fd = self.file.as_raw_fd();
        let ptr = &transfer as *const SpiIocTransfer;
        let ret = unsafe { libc::ioctl(fd, ioctl::spi_ioc_message(1), ptr) };
        if ret < 0 {
            return Err(LinuxSpiError::TransferFailed(
                std::io::Error::last_os_error(),
            ));
        }
        log::trace!("linux_spi: tx {:02X?} rx {:02X?}", tx, rx);
        Ok(())
    }
}

impl SpiMaster for LinuxSpi {
    fn max_transfer_len(&self) -> usize {
        self.max_kernel_buf_size.min(MAX_FRAME_LEN)
    }

    fn execute(&mut self, cmd: &mut SpiCommand<'_>) -> CoreResult<()> {
        default_execute(cmd, |tx, rx| {
            self.transfer(tx, rx).map_err(|e| {
                log::debug!("linux_spi: {}", e);
                CoreError::TransferFailed
            })
        })
    }

    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(Duration::from_millis(ms as u64));
    }
}

/// Read the maximum kernel buffer size from sysfs, or use page size as fallback
fn get_max_kernel_buf_size() -> usize {
    if let Ok(content) = std::fs::read_to_string(BUF_SIZE_SYSFS) {
        if let Ok(size) = content.trim().parse::<usize>() {
            if size > 0 {
                return size;
            }
        }
        log::warn!("linux_spi: Invalid buffer size in {}", BUF_SIZE_SYSFS);
    } else {
        log::debug!("linux_spi: Cannot read {}, using page size", BUF_SIZE_SYSFS);
    }

    let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if page_size > 0 {
        page_size as usize
    } else {
        4096
    }
}

/// Parse programmer options from a list of key-value pairs
pub fn parse_options(options: &[(&str, &str)]) -> Result<LinuxSpiConfig> {
    let mut config = LinuxSpiConfig::default();

    for (key, value) in options {
        match *key {
            "dev" => {
                config.device = value.to_string();
            }
            "spispeed" => {
                // Speed in kHz
                let speed_khz: u32 = value.parse().map_err(|_| {
                    LinuxSpiError::InvalidParameter(format!("Invalid spispeed value: {}", value))
                })?;
                if speed_khz == 0 {
                    return Err(LinuxSpiError::InvalidParameter(
                        "spispeed must be non-zero".into(),
                    ));
                }
                config.speed_hz = speed_khz.saturating_mul(1000);
            }
            "mode" => {
                let mode: u8 = value.parse().map_err(|_| {
                    LinuxSpiError::InvalidParameter(format!("Invalid mode value: {}", value))
                })?;
                if mode > 3 {
                    return Err(LinuxSpiError::InvalidParameter(format!(
                        "Invalid SPI mode: {} (must be 0-3)",
                        mode
                    )));
                }
                config.mode = mode;
            }
            _ => {
                log::warn!("linux_spi: Unknown option: {}={}", key, value);
            }
        }
    }

    if config.device.is_empty() {
        return Err(LinuxSpiError::NoDevice);
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_options_defaults() {
        let config = parse_options(&[("dev", "/dev/spidev0.0")]).unwrap();
        assert_eq!(config, LinuxSpiConfig::new("/dev/spidev0.0"));
        assert_eq!(config.speed_hz, 400_000);
        assert_eq!(config.mode, 0);
    }

    #[test]
    fn test_parse_options_speed_and_mode() {
        let config = parse_options(&[
            ("dev", "/dev/spidev1.2"),
            ("spispeed", "1000"),
            ("mode", "3"),
        ])
        .unwrap();
        assert_eq!(config.device, "/dev/spidev1.2");
        assert_eq!(config.speed_hz, 1_000_000);
        assert_eq!(config.mode, 3);
    }

    #[test]
    fn test_parse_options_errors() {
        assert!(matches!(parse_options(&[]), Err(LinuxSpiError::NoDevice)));
        assert!(matches!(
            parse_options(&[("dev", "/dev/spidev0.0"), ("mode", "4")]),
            Err(LinuxSpiError::InvalidParameter(_))
        ));
        assert!(matches!(
            parse_options(&[("dev", "/dev/spidev0.0"), ("spispeed", "fast")]),
            Err(LinuxSpiError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_transfer_struct_layout() {
        assert_eq!(
            std::mem::size_of::<SpiIocTransfer>(),
            ioctl::SPI_IOC_TRANSFER_SIZE
        );
    }
}
