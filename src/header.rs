//! Directory header of an [`crate::bank::EntryBank`].
//!
//! The header is packed by hand into a little-endian integer, least significant bit first:
//!
//! ```text
//! | exists (1) | entry_start (START_BITS) | entry_count (COUNT_BITS) |
//!   bit 0        bit 1 ..                   .. msb
//! ```
//!
//! The width of `entry_count` bounds how many entries a bank can ever hold, so the format is a
//! policy choice of the bank.

use crate::{Address, EEPROM_SIZE};

pub trait HeaderFormat {
    /// Header size in bytes.
    const SIZE: usize;
    const START_BITS: u32;
    const COUNT_BITS: u32;

    /// Largest `entry_count` the header can represent.
    const MAX_ENTRIES: usize = (1usize << Self::COUNT_BITS) - 1;
}

/// 32-bit header, up to 2^21 - 1 entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WideHeader;

impl HeaderFormat for WideHeader {
    const SIZE: usize = 4;
    const START_BITS: u32 = 10;
    const COUNT_BITS: u32 = 21;
}

/// 16-bit header, up to 31 entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NarrowHeader;

impl HeaderFormat for NarrowHeader {
    const SIZE: usize = 2;
    const START_BITS: u32 = 10;
    const COUNT_BITS: u32 = 5;
}

const _: () = assert!(
    1 + WideHeader::START_BITS + WideHeader::COUNT_BITS == 8 * WideHeader::SIZE as u32
);
const _: () = assert!(
    1 + NarrowHeader::START_BITS + NarrowHeader::COUNT_BITS == 8 * NarrowHeader::SIZE as u32
);
// entry_start has to address every byte of the store
const _: () = assert!(1 << WideHeader::START_BITS >= EEPROM_SIZE);
const _: () = assert!(1 << NarrowHeader::START_BITS >= EEPROM_SIZE);

#[inline(always)]
const fn mask(bits: u32) -> u32 {
    (1u32 << bits) - 1
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Header {
    /// Set once the header has been written. Distinguishes an erased store from an empty bank.
    pub exists: bool,
    pub entry_start: Address,
    pub entry_count: u32,
}

impl Header {
    /// A fresh header for a bank whose header sits at `location`.
    ///
    /// The entries have to start inside the 1KB store, `entry_start` is only `START_BITS` wide.
    pub fn at<F: HeaderFormat>(location: Address) -> Self {
        debug_assert!((location as usize + F::SIZE) < 1 << F::START_BITS);
        Self {
            exists: true,
            entry_start: location + F::SIZE as Address,
            entry_count: 0,
        }
    }

    pub fn pack<F: HeaderFormat>(&self) -> u32 {
        let start = (self.entry_start as u32) & mask(F::START_BITS);
        let count = self.entry_count & mask(F::COUNT_BITS);
        (self.exists as u32) | (start << 1) | (count << (1 + F::START_BITS))
    }

    pub fn unpack<F: HeaderFormat>(word: u32) -> Self {
        Self {
            exists: word & 1 != 0,
            entry_start: ((word >> 1) & mask(F::START_BITS)) as Address,
            entry_count: (word >> (1 + F::START_BITS)) & mask(F::COUNT_BITS),
        }
    }

    /// Little-endian bytes; only the first `F::SIZE` are meaningful.
    pub fn to_bytes<F: HeaderFormat>(&self) -> [u8; 4] {
        self.pack::<F>().to_le_bytes()
    }

    pub fn from_bytes<F: HeaderFormat>(bytes: &[u8]) -> Self {
        let mut word = [0u8; 4];
        word[..F::SIZE].copy_from_slice(&bytes[..F::SIZE]);
        Self::unpack::<F>(u32::from_le_bytes(word))
    }
}
