//! Fuse table of the MachXO2-256
//!
//! The fuse table is the complete configuration bit map of one device.
//! It is stored bit-packed in a fixed array; the size is a property of the
//! device family and never changes.

use core::fmt;

use crate::error::{Error, Result};

/// Number of configuration fuses in a MachXO2-256
pub const FUSE_COUNT: usize = 73_600;

/// Fuses per configuration flash page
pub const PAGE_BITS: usize = 128;

/// Bytes per packed configuration flash page
pub const PAGE_BYTES: usize = PAGE_BITS / 8;

/// Number of pages needed to hold the fuse table
pub const PAGE_COUNT: usize = FUSE_COUNT.div_ceil(PAGE_BITS);

const WORD_BITS: usize = 32;
const WORDS: usize = FUSE_COUNT.div_ceil(WORD_BITS);

// set_all() fills whole words
const _: () = assert!(FUSE_COUNT % WORD_BITS == 0);

/// A packed configuration page, MSB first within each byte
pub type Page = [u8; PAGE_BYTES];

/// Complete fuse map of one device
#[derive(Clone, PartialEq, Eq)]
pub struct FuseTable {
    words: [u32; WORDS],
}

impl FuseTable {
    /// Create a fuse table with every fuse cleared
    pub const fn new() -> Self {
        Self { words: [0; WORDS] }
    }

    /// Number of fuses in the table
    pub const fn size(&self) -> usize {
        FUSE_COUNT
    }

    /// Test one fuse
    ///
    /// # Panics
    /// If `index >= FUSE_COUNT`.
    pub fn test(&self, index: usize) -> bool {
        assert!(index < FUSE_COUNT, "fuse index {} out of range", index);
        self.words[index / WORD_BITS] & (1 << (index % WORD_BITS)) != 0
    }

    /// Set one fuse
    ///
    /// # Panics
    /// If `index >= FUSE_COUNT`.
    pub fn set(&mut self, index: usize) {
        assert!(index < FUSE_COUNT, "fuse index {} out of range", index);
        self.words[index / WORD_BITS] |= 1 << (index % WORD_BITS);
    }

    /// Clear one fuse
    ///
    /// # Panics
    /// If `index >= FUSE_COUNT`.
    pub fn clear(&mut self, index: usize) {
        assert!(index < FUSE_COUNT, "fuse index {} out of range", index);
        self.words[index / WORD_BITS] &= !(1 << (index % WORD_BITS));
    }

    /// Set or clear one fuse, failing instead of panicking on a bad index
    pub fn try_assign(&mut self, index: usize, value: bool) -> Result<()> {
        if index >= FUSE_COUNT {
            return Err(Error::AddressOutOfBounds);
        }
        if value {
            self.set(index);
        } else {
            self.clear(index);
        }
        Ok(())
    }

    /// Set every fuse
    pub fn set_all(&mut self) {
        self.words.fill(!0);
    }

    /// Clear every fuse
    pub fn clear_all(&mut self) {
        self.words.fill(0);
    }

    /// Number of set fuses
    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Compute the JEDEC fuse checksum
    ///
    /// Every set fuse `i` contributes `1 << (i % 8)` to a 16-bit sum that
    /// silently wraps on overflow.
    pub fn checksum(&self) -> u16 {
        let mut sum = 0u16;
        for i in 0..FUSE_COUNT {
            if self.test(i) {
                sum = sum.wrapping_add(1 << (i % 8));
            }
        }
        sum
    }

    /// Pack one page for programming
    ///
    /// Fuse `page * 128 + j * 8 + k` lands in bit `7 - k` of byte `j`.
    /// Fuses past the end of the table read as zero.
    pub fn page(&self, page: usize) -> Page {
        let mut out = [0u8; PAGE_BYTES];
        let base = page * PAGE_BITS;
        for (j, byte) in out.iter_mut().enumerate() {
            for k in 0..8 {
                let index = base + j * 8 + k;
                if index < FUSE_COUNT && self.test(index) {
                    *byte |= 1 << (7 - k);
                }
            }
        }
        out
    }

    /// Unpack one page into the table (inverse of [`FuseTable::page`])
    pub fn set_page(&mut self, page: usize, data: &Page) {
        let base = page * PAGE_BITS;
        for (j, byte) in data.iter().enumerate() {
            for k in 0..8 {
                let index = base + j * 8 + k;
                if index >= FUSE_COUNT {
                    return;
                }
                if byte & (1 << (7 - k)) != 0 {
                    self.set(index);
                } else {
                    self.clear(index);
                }
            }
        }
    }

    /// Iterate over all packed pages in programming order
    pub fn pages(&self) -> impl Iterator<Item = Page> + '_ {
        (0..PAGE_COUNT).map(move |p| self.page(p))
    }
}

impl Default for FuseTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FuseTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FuseTable")
            .field("size", &FUSE_COUNT)
            .field("set", &self.count_ones())
            .field("checksum", &format_args!("0x{:04X}", self.checksum()))
            .finish()
    }
}
