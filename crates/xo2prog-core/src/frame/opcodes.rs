//! MachXO2 sysCONFIG command headers
//!
//! Each constant is the complete header of a command: the opcode followed
//! by its operand bytes, exactly as clocked onto the bus.

/// Read device ID (IDCODE_PUB), 4 response bytes
pub const IDCODE_PUB: [u8; 4] = [0xE0, 0x00, 0x00, 0x00];
/// Read status register (LSC_READ_STATUS), 4 response bytes
pub const LSC_READ_STATUS: [u8; 4] = [0x3C, 0x00, 0x00, 0x00];
/// Enable offline configuration (ISC_ENABLE_X)
pub const ISC_ENABLE_X: [u8; 4] = [0xC6, 0x08, 0x00, 0x00];
/// Erase SRAM (ISC_ERASE, SRAM target)
pub const ISC_ERASE_SRAM: [u8; 4] = [0x0E, 0x01, 0x00, 0x00];
/// Erase configuration flash (ISC_ERASE, CFG target)
pub const ISC_ERASE_FLASH: [u8; 4] = [0x0E, 0x04, 0x00, 0x00];
/// Disable configuration (ISC_DISABLE)
pub const ISC_DISABLE: [u8; 3] = [0x26, 0x00, 0x00];
/// No-op frame clocked after ISC_DISABLE
pub const ISC_NOOP: [u8; 4] = [0xFF, 0xFF, 0xFF, 0xFF];
/// Reload configuration from flash (LSC_REFRESH)
pub const LSC_REFRESH: [u8; 3] = [0x79, 0x00, 0x00];
/// Read feature row (LSC_READ_FEATURE), 8 response bytes
pub const LSC_READ_FEATURE: [u8; 4] = [0xE7, 0x00, 0x00, 0x00];
/// Read FEABITS (LSC_READ_FEABITS), 8 response bytes, first 2 significant
pub const LSC_READ_FEABITS: [u8; 4] = [0xFB, 0x00, 0x00, 0x00];
/// Reset configuration flash address (LSC_INIT_ADDRESS)
pub const LSC_INIT_ADDRESS: [u8; 4] = [0x46, 0x00, 0x00, 0x00];
/// Program one page and advance the address (LSC_PROG_INCR_NV)
pub const LSC_PROG_INCR_NV: [u8; 4] = [0x70, 0x00, 0x00, 0x01];
/// Read one page and advance the address (LSC_READ_INCR_NV)
pub const LSC_READ_INCR_NV: [u8; 4] = [0x73, 0x00, 0x00, 0x01];
/// Program the DONE bit (ISC_PROGRAM_DONE)
pub const ISC_PROGRAM_DONE: [u8; 4] = [0x5E, 0x00, 0x00, 0x00];
/// Read USERCODE, 4 response bytes
pub const USERCODE: [u8; 4] = [0xC0, 0x00, 0x00, 0x00];

/// Opcode of ISC_ERASE; the first operand selects the target
pub const OP_ISC_ERASE: u8 = 0x0E;
/// ISC_ERASE operand selecting SRAM
pub const ERASE_SRAM: u8 = 0x01;
/// ISC_ERASE operand selecting configuration flash
pub const ERASE_FLASH: u8 = 0x04;

/// Device ID of the MachXO2-256
pub const MACHXO2_256_ID: u32 = 0x012B_8043;
