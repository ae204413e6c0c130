//! Address chaining.
//!
//! Every owner of storage takes its base address in its constructor and reports one-past-the-end
//! through [`Chained::end`]. Owners are wired strictly left to right,
//! `b = B::new(a.end())`, which yields a contiguous layout without overlap. Nothing checks this
//! at runtime: growing one owner silently moves every owner constructed after it.

use crate::Address;

/// Half-open byte range `[base, base + size)` of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Region {
    pub base: Address,
    pub size: u16,
}

impl Region {
    pub const fn new(base: Address, size: u16) -> Self {
        Self { base, size }
    }

    /// Region from `base` up to `limit` (exclusive). Empty if `limit` is below `base`.
    pub const fn until(base: Address, limit: usize) -> Self {
        let size = if limit > base as usize {
            limit - base as usize
        } else {
            0
        };
        let size = if size > u16::MAX as usize {
            u16::MAX
        } else {
            size as u16
        };
        Self { base, size }
    }

    pub const fn end(&self) -> Address {
        self.base + self.size
    }

    pub const fn is_empty(&self) -> bool {
        self.size == 0
    }

    pub const fn overlaps(&self, other: &Region) -> bool {
        !self.is_empty() && !other.is_empty() && self.base < other.end() && other.base < self.end()
    }

    /// Whether the region lies within a store of `capacity` bytes.
    pub const fn fits(&self, capacity: usize) -> bool {
        self.end() as usize <= capacity
    }
}

/// An owner of a storage region that participates in address chaining.
pub trait Chained {
    fn address(&self) -> Address;

    fn end(&self) -> Address;

    fn region(&self) -> Region {
        Region::new(self.address(), self.end() - self.address())
    }
}
