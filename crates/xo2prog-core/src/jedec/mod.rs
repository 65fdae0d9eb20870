//! JEDEC fuse map parsing
//!
//! Parses the JEDEC (JESD3) text format produced by the Lattice tools into
//! a [`FuseTable`]. The input is consumed as a byte stream, one field at a
//! time, so it works on anything implementing [`embedded_io::Read`] without
//! buffering the whole file.
//!
//! ```text
//! <STX>design info*
//! QF73600*
//! F0*
//! L000000 0110...*
//! C1A2B*
//! <ETX>
//! ```
//!
//! Fields are terminated by `*`; spaces, CR and LF anywhere inside or
//! between fields are insignificant. Only `QF`, `F`, `L` and `C` are
//! interpreted, all other fields are skipped. The `C` field ends the fuse
//! data: anything after it, ETX included, is not read.

mod parser;
mod reader;

use core::fmt;
use embedded_io::Read;

use crate::fuse::FuseTable;
use parser::JedecParser;

/// Start of text, opens the fuse data
pub const STX: u8 = 0x02;
/// End of text, closes the fuse data
pub const ETX: u8 = 0x03;

/// JEDEC parse failure
///
/// Every failure is final for the parse attempt; the fuse table may be
/// partially written and must be discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JedecError {
    /// No STX byte, or no field terminator after it
    NoStx,
    /// Input ended before ETX or a `C` field
    NoEtx,
    /// `QF` field is malformed or does not match the device fuse count
    BadQf,
    /// `F` field is neither `0` nor `1`
    BadF,
    /// `L` field contains something other than `0`/`1`, or runs past the table
    BadL,
    /// `C` field contains a non-hex character
    BadC,
    /// Fuse checksum does not match the `C` field
    WrongChecksum {
        /// Checksum stated in the file (0xFFFF without a `C` field)
        declared: u16,
        /// Checksum of the parsed fuses
        computed: u16,
    },
}

impl fmt::Display for JedecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoStx => write!(f, "no STX found"),
            Self::NoEtx => write!(f, "unexpected end of file (no ETX)"),
            Self::BadQf => write!(f, "invalid QF field (fuse count)"),
            Self::BadF => write!(f, "invalid F field (default fuse state)"),
            Self::BadL => write!(f, "invalid L field (fuse list)"),
            Self::BadC => write!(f, "invalid C field (fuse checksum)"),
            Self::WrongChecksum { declared, computed } => write!(
                f,
                "fuse checksum mismatch: file says 0x{:04X}, fuses give 0x{:04X}",
                declared, computed
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for JedecError {}

/// Information gathered while parsing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseSummary {
    /// Checksum from the `C` field, if present
    pub declared_checksum: Option<u16>,
    /// Checksum computed over the parsed fuse table
    pub computed_checksum: u16,
    /// Fuse count from the `QF` field, if present
    pub fuse_count: Option<usize>,
}

/// Parse a JEDEC stream into `fuses`
///
/// `fuses` is only written by `F` and `L` fields; start from a cleared
/// table unless the file is known to carry an `F` field.
pub fn parse_jedec<R: Read>(input: R, fuses: &mut FuseTable) -> Result<ParseSummary, JedecError> {
    JedecParser::new(input, fuses).run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fuse::FUSE_COUNT;
    use std::format;
    use std::string::String;
    use std::vec::Vec;

    /// Build a JEDEC file listing every fuse of `fuses`, 64 per line
    fn render(fuses: &FuseTable, qf: usize, checksum: Option<u16>, etx: bool) -> Vec<u8> {
        let mut s = String::from("\x02*\r\nN DEVICE LCMXO2-256HC*\r\n");
        s.push_str(&format!("QF{}*\r\nQP32*\r\nG0*\r\nF0*\r\nL0\r\n", qf));
        for i in 0..FUSE_COUNT {
            s.push(if fuses.test(i) { '1' } else { '0' });
            if i % 64 == 63 {
                s.push_str("\r\n");
            }
        }
        s.push_str("*\r\n");
        if let Some(c) = checksum {
            s.push_str(&format!("C{:04X}*\r\n", c));
        }
        if etx {
            s.push('\x03');
            s.push_str("0000\r\n");
        }
        s.into_bytes()
    }

    fn pattern() -> FuseTable {
        let mut t = FuseTable::new();
        for i in (0..FUSE_COUNT).filter(|i| i % 5 == 0 || i % 11 == 3) {
            t.set(i);
        }
        t
    }

    #[test]
    fn test_parse_full_file() {
        let expected = pattern();
        let data = render(&expected, FUSE_COUNT, Some(expected.checksum()), true);

        let mut fuses = FuseTable::new();
        fuses.set_all();
        let summary = parse_jedec(&data[..], &mut fuses).unwrap();

        assert_eq!(fuses, expected);
        assert_eq!(summary.declared_checksum, Some(expected.checksum()));
        assert_eq!(summary.computed_checksum, expected.checksum());
        assert_eq!(summary.fuse_count, Some(FUSE_COUNT));
    }

    #[test]
    fn test_no_stx() {
        let mut fuses = FuseTable::new();
        let data = b"*QF73600*F0*C0000*\x03";
        assert_eq!(parse_jedec(&data[..], &mut fuses), Err(JedecError::NoStx));
        assert_eq!(parse_jedec(&b""[..], &mut fuses), Err(JedecError::NoStx));
    }

    #[test]
    fn test_stx_without_field_terminator() {
        let mut fuses = FuseTable::new();
        let data = b"junk\x02 design name";
        assert_eq!(parse_jedec(&data[..], &mut fuses), Err(JedecError::NoStx));
    }

    #[test]
    fn test_bad_qf() {
        let expected = pattern();
        let data = render(&expected, 64, Some(expected.checksum()), true);
        let mut fuses = FuseTable::new();
        assert_eq!(parse_jedec(&data[..], &mut fuses), Err(JedecError::BadQf));

        let mut fuses = FuseTable::new();
        let data = b"\x02*QF73x600*\x03";
        assert_eq!(parse_jedec(&data[..], &mut fuses), Err(JedecError::BadQf));
    }

    #[test]
    fn test_wrong_checksum() {
        let expected = pattern();
        let bad = expected.checksum().wrapping_add(1);
        let data = render(&expected, FUSE_COUNT, Some(bad), true);
        let mut fuses = FuseTable::new();
        assert_eq!(
            parse_jedec(&data[..], &mut fuses),
            Err(JedecError::WrongChecksum {
                declared: bad,
                computed: expected.checksum(),
            })
        );
    }

    #[test]
    fn test_missing_checksum_defaults_to_ffff() {
        let mut fuses = FuseTable::new();
        let data = b"\x02*QF73600*F0*\x03";
        assert_eq!(
            parse_jedec(&data[..], &mut fuses),
            Err(JedecError::WrongChecksum {
                declared: 0xFFFF,
                computed: 0,
            })
        );
    }

    #[test]
    fn test_no_etx() {
        let expected = pattern();
        let data = render(&expected, FUSE_COUNT, Some(expected.checksum()), false);
        let mut fuses = FuseTable::new();
        assert_eq!(parse_jedec(&data[..], &mut fuses), Err(JedecError::NoEtx));

        let mut fuses = FuseTable::new();
        let data = b"\x02*QF73600*F0*N unterminated note";
        assert_eq!(parse_jedec(&data[..], &mut fuses), Err(JedecError::NoEtx));
    }

    #[test]
    fn test_checksum_field_ends_stream() {
        // fields after C are ignored
        let mut fuses = FuseTable::new();
        let data = b"\x02*F0*C0001*L0 1*\x03";
        assert_eq!(
            parse_jedec(&data[..], &mut fuses),
            Err(JedecError::WrongChecksum {
                declared: 1,
                computed: 0,
            })
        );
        assert!(!fuses.test(0));

        // no ETX needed once C is read
        let mut fuses = FuseTable::new();
        let data = b"\x02*QF73600*F0*C0000*";
        let summary = parse_jedec(&data[..], &mut fuses).unwrap();
        assert_eq!(summary.declared_checksum, Some(0));
        assert_eq!(summary.fuse_count, Some(FUSE_COUNT));
    }

    #[test]
    fn test_bad_f() {
        let mut fuses = FuseTable::new();
        let data = b"\x02*QF73600*F2*C0000*\x03";
        assert_eq!(parse_jedec(&data[..], &mut fuses), Err(JedecError::BadF));
    }

    #[test]
    fn test_fill_one() {
        let mut fuses = FuseTable::new();
        let expected = {
            let mut t = FuseTable::new();
            t.set_all();
            t.checksum()
        };
        let data = format!("\x02*F1*C{:04X}*\x03", expected);
        parse_jedec(data.as_bytes(), &mut fuses).unwrap();
        assert_eq!(fuses.count_ones(), FUSE_COUNT);
    }

    #[test]
    fn test_bad_l() {
        let mut fuses = FuseTable::new();
        let data = b"\x02*F0*L0 0102*C0000*\x03";
        assert_eq!(parse_jedec(&data[..], &mut fuses), Err(JedecError::BadL));

        let mut fuses = FuseTable::new();
        let data = format!("\x02*F0*L{} 01*C0000*\x03", FUSE_COUNT - 1);
        assert_eq!(parse_jedec(data.as_bytes(), &mut fuses), Err(JedecError::BadL));
    }

    #[test]
    fn test_bad_c() {
        let mut fuses = FuseTable::new();
        let data = b"\x02*F0*C00g0*\x03";
        assert_eq!(parse_jedec(&data[..], &mut fuses), Err(JedecError::BadC));

        let mut fuses = FuseTable::new();
        let data = b"\x02*F0*C00";
        assert_eq!(parse_jedec(&data[..], &mut fuses), Err(JedecError::BadC));
    }

    #[test]
    fn test_list_address_and_whitespace() {
        let mut fuses = FuseTable::new();
        // L field split across lines, bits 100..=103 = 1 0 1 1
        let data = b"\x02*\nF0 *\n L00100\r\n1 0\r\n11 *\n C00D0*\n\x03";
        parse_jedec(&data[..], &mut fuses).unwrap();
        assert!(fuses.test(100));
        assert!(!fuses.test(101));
        assert!(fuses.test(102));
        assert!(fuses.test(103));
        assert_eq!(fuses.count_ones(), 3);
    }

    #[test]
    fn test_unknown_fields_skipped() {
        let mut fuses = FuseTable::new();
        let data = b"\x02*N NOTE hi*QP32*J0 0*X0*F0*C0000*\x03";
        assert!(parse_jedec(&data[..], &mut fuses).is_ok());
    }
}
