//! Byte-level access to a JEDEC stream

use embedded_io::{Error as _, Read};

/// Bytes skipped between fields
const fn is_blank(b: u8) -> bool {
    matches!(b, b' ' | b'\r' | b'\n')
}

/// Single-byte reader with one byte of look-ahead
///
/// A read error is treated exactly like the end of the stream: the parser
/// has no way to resynchronise on a broken transport.
pub(crate) struct JedecReader<R> {
    inner: R,
    peeked: Option<u8>,
    eof: bool,
}

impl<R: Read> JedecReader<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self {
            inner,
            peeked: None,
            eof: false,
        }
    }

    /// Next raw byte, `None` once the stream is exhausted
    pub(crate) fn next_byte(&mut self) -> Option<u8> {
        if let Some(b) = self.peeked.take() {
            return Some(b);
        }
        if self.eof {
            return None;
        }
        let mut buf = [0u8; 1];
        match self.inner.read(&mut buf) {
            Ok(1) => Some(buf[0]),
            Ok(_) => {
                self.eof = true;
                None
            }
            Err(e) => {
                log::debug!("jedec: read error ({:?}), treating as end of input", e.kind());
                self.eof = true;
                None
            }
        }
    }

    fn push_back(&mut self, b: u8) {
        self.peeked = Some(b);
    }

    /// Consume bytes up to and including `target`
    pub(crate) fn find(&mut self, target: u8) -> bool {
        while let Some(b) = self.next_byte() {
            if b == target {
                return true;
            }
        }
        false
    }

    /// Consume the rest of the current field including its `*`
    pub(crate) fn skip_field(&mut self) -> bool {
        self.find(b'*')
    }

    /// Next byte that is not a space, CR or LF
    pub(crate) fn next_significant(&mut self) -> Option<u8> {
        loop {
            match self.next_byte() {
                Some(b) if is_blank(b) => continue,
                other => return other,
            }
        }
    }

    /// Parse a decimal integer the way a serial stream does
    ///
    /// Leading non-digit bytes are skipped, digits are accumulated, and the
    /// first byte after the digits is left unread. Returns `None` if the
    /// stream ends before any digit. Values too large for `usize` saturate.
    pub(crate) fn parse_uint(&mut self) -> Option<usize> {
        let first = loop {
            let b = self.next_byte()?;
            if b.is_ascii_digit() {
                break b;
            }
        };

        let mut value = usize::from(first - b'0');
        while let Some(b) = self.next_byte() {
            if !b.is_ascii_digit() {
                self.push_back(b);
                break;
            }
            value = value
                .saturating_mul(10)
                .saturating_add(usize::from(b - b'0'));
        }
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_significant_skips_blanks() {
        let mut r = JedecReader::new(&b" \r\n 1\n"[..]);
        assert_eq!(r.next_significant(), Some(b'1'));
        assert_eq!(r.next_significant(), None);
        assert_eq!(r.next_significant(), None);
    }

    #[test]
    fn test_parse_uint_leaves_terminator() {
        let mut r = JedecReader::new(&b"x 0128 01*"[..]);
        assert_eq!(r.parse_uint(), Some(128));
        assert_eq!(r.next_byte(), Some(b' '));
        assert_eq!(r.next_significant(), Some(b'0'));
    }

    #[test]
    fn test_parse_uint_no_digits() {
        let mut r = JedecReader::new(&b"abc"[..]);
        assert_eq!(r.parse_uint(), None);
    }

    #[test]
    fn test_skip_field() {
        let mut r = JedecReader::new(&b"N NOTE *QF"[..]);
        assert!(r.skip_field());
        assert_eq!(r.next_byte(), Some(b'Q'));
        assert!(!r.skip_field());
    }
}
