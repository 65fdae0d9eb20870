//! JEDEC field parser

use embedded_io::Read;

use super::reader::JedecReader;
use super::{JedecError, ParseSummary, ETX, STX};
use crate::fuse::{FuseTable, FUSE_COUNT};

/// Checksum assumed when the file carries no `C` field
const DEFAULT_CHECKSUM: u16 = 0xFFFF;

/// Field kinds, selected by the first significant byte of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldTag {
    /// `Q`: a quantity, `QF` being the fuse count
    Quantity,
    /// `F`: default state of unlisted fuses
    Fill,
    /// `L`: fuse list starting at an address
    List,
    /// `C`: fuse checksum
    Checksum,
    /// ETX: end of the fuse data
    End,
    /// Any other tag, or end of input
    Other,
}

impl FieldTag {
    fn from_byte(b: Option<u8>) -> Self {
        match b {
            Some(b'Q') => Self::Quantity,
            Some(b'F') => Self::Fill,
            Some(b'L') => Self::List,
            Some(b'C') => Self::Checksum,
            Some(ETX) => Self::End,
            _ => Self::Other,
        }
    }
}

fn hex_value(b: u8) -> Option<u16> {
    match b {
        b'0'..=b'9' => Some(u16::from(b - b'0')),
        b'A'..=b'F' => Some(u16::from(b - b'A' + 10)),
        _ => None,
    }
}

pub(crate) struct JedecParser<'f, R> {
    reader: JedecReader<R>,
    fuses: &'f mut FuseTable,
    summary: ParseSummary,
}

impl<'f, R: Read> JedecParser<'f, R> {
    pub(crate) fn new(input: R, fuses: &'f mut FuseTable) -> Self {
        Self {
            reader: JedecReader::new(input),
            fuses,
            summary: ParseSummary {
                declared_checksum: None,
                computed_checksum: 0,
                fuse_count: None,
            },
        }
    }

    pub(crate) fn run(mut self) -> Result<ParseSummary, JedecError> {
        // The design information field right after STX is never interpreted
        if !(self.reader.find(STX) && self.reader.skip_field()) {
            return Err(JedecError::NoStx);
        }

        loop {
            let tag = self.reader.next_significant();
            match FieldTag::from_byte(tag) {
                FieldTag::Quantity => self.quantity()?,
                FieldTag::Fill => self.fill()?,
                FieldTag::List => self.list()?,
                // The checksum closes the fuse data, ETX after it is optional
                FieldTag::Checksum => {
                    self.checksum()?;
                    break;
                }
                FieldTag::End => break,
                FieldTag::Other => {
                    if !self.reader.skip_field() {
                        return Err(JedecError::NoEtx);
                    }
                }
            }
        }

        let declared = self.summary.declared_checksum.unwrap_or(DEFAULT_CHECKSUM);
        let computed = self.fuses.checksum();
        self.summary.computed_checksum = computed;
        if computed != declared {
            log::debug!(
                "jedec: checksum mismatch, file 0x{:04X}, fuses 0x{:04X}",
                declared,
                computed
            );
            return Err(JedecError::WrongChecksum { declared, computed });
        }
        Ok(self.summary)
    }

    fn quantity(&mut self) -> Result<(), JedecError> {
        if self.reader.next_significant() != Some(b'F') {
            // QP, QV and friends carry nothing we need
            self.reader.skip_field();
            return Ok(());
        }

        let mut count: usize = 0;
        loop {
            match self.reader.next_significant() {
                Some(b'*') => break,
                Some(b) if b.is_ascii_digit() => {
                    count = count
                        .checked_mul(10)
                        .and_then(|c| c.checked_add(usize::from(b - b'0')))
                        .ok_or(JedecError::BadQf)?;
                }
                Some(_) => return Err(JedecError::BadQf),
                None => return Err(JedecError::NoEtx),
            }
        }

        self.summary.fuse_count = Some(count);
        if count != self.fuses.size() {
            log::debug!("jedec: QF{} does not match {} fuses", count, FUSE_COUNT);
            return Err(JedecError::BadQf);
        }
        Ok(())
    }

    fn fill(&mut self) -> Result<(), JedecError> {
        match self.reader.next_significant() {
            Some(b'0') => self.fuses.clear_all(),
            Some(b'1') => self.fuses.set_all(),
            _ => return Err(JedecError::BadF),
        }
        self.reader.skip_field();
        Ok(())
    }

    fn list(&mut self) -> Result<(), JedecError> {
        let mut addr = self.reader.parse_uint().ok_or(JedecError::BadL)?;
        loop {
            let value = match self.reader.next_significant() {
                Some(b'0') => false,
                Some(b'1') => true,
                Some(b'*') => return Ok(()),
                _ => return Err(JedecError::BadL),
            };
            if addr >= FUSE_COUNT {
                log::debug!("jedec: fuse address {} beyond {} fuses", addr, FUSE_COUNT);
                return Err(JedecError::BadL);
            }
            if value {
                self.fuses.set(addr);
            } else {
                self.fuses.clear(addr);
            }
            addr += 1;
        }
    }

    fn checksum(&mut self) -> Result<(), JedecError> {
        let mut sum: u16 = 0;
        loop {
            match self.reader.next_significant() {
                Some(b'*') => break,
                Some(b) => {
                    let digit = hex_value(b).ok_or(JedecError::BadC)?;
                    sum = (sum << 4).wrapping_add(digit);
                }
                None => return Err(JedecError::BadC),
            }
        }
        self.summary.declared_checksum = Some(sum);
        Ok(())
    }
}
