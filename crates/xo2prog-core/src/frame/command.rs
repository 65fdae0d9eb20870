//! SPI command frame

/// Largest frame any MachXO2 command in this crate needs (20 bytes for
/// page program/read), with headroom
pub const MAX_FRAME_LEN: usize = 32;

/// A single full-duplex SPI exchange
///
/// Designed to avoid allocation - uses slices for data.
/// The frame on the wire is `header`, then `write_data`, then one zero byte
/// for every byte of `read_buf`. The bytes clocked in during that trailing
/// part of the exchange are copied into `read_buf`.
pub struct SpiCommand<'a> {
    /// Opcode followed by its operand bytes
    pub header: &'a [u8],

    /// Data to write after the header
    pub write_data: &'a [u8],

    /// Buffer to read into (mutable)
    pub read_buf: &'a mut [u8],
}

impl<'a> SpiCommand<'a> {
    /// Create a command that only sends its header (e.g., REFRESH)
    pub fn simple(header: &'a [u8]) -> Self {
        Self {
            header,
            write_data: &[],
            read_buf: &mut [],
        }
    }

    /// Create a command that reads back a register (e.g., READ_ID)
    pub fn read_reg(header: &'a [u8], buf: &'a mut [u8]) -> Self {
        Self {
            header,
            write_data: &[],
            read_buf: buf,
        }
    }

    /// Create a command carrying a data payload (e.g., PROG_INCR_NV)
    pub fn write_data(header: &'a [u8], data: &'a [u8]) -> Self {
        Self {
            header,
            write_data: data,
            read_buf: &mut [],
        }
    }

    /// Opcode byte (first header byte)
    pub fn opcode(&self) -> u8 {
        self.header.first().copied().unwrap_or(0)
    }

    /// Number of bytes written before the read phase starts
    pub fn header_len(&self) -> usize {
        self.header.len() + self.write_data.len()
    }

    /// Total number of bytes clocked on the bus
    pub fn total_len(&self) -> usize {
        self.header_len() + self.read_buf.len()
    }

    /// Returns true if this command has a read phase
    pub fn has_read(&self) -> bool {
        !self.read_buf.is_empty()
    }

    /// Encode the outgoing frame into `out`
    ///
    /// `out` must be exactly [`SpiCommand::total_len`] bytes long; the read
    /// phase is filled with zeros.
    pub fn encode(&self, out: &mut [u8]) {
        let h = self.header.len();
        let w = self.write_data.len();
        out[..h].copy_from_slice(self.header);
        out[h..h + w].copy_from_slice(self.write_data);
        out[h + w..].fill(0);
    }

    /// Copy the read phase out of a full-duplex response frame
    pub fn decode_response(&mut self, response: &[u8]) {
        let start = self.header_len();
        let len = self.read_buf.len();
        self.read_buf.copy_from_slice(&response[start..start + len]);
    }
}
