use core::cmp;
use core::marker::PhantomData;
#[cfg(feature = "defmt")]
use defmt::{trace, warn};

use crate::error::Error;
use crate::header::{Header, HeaderFormat, WideHeader};
use crate::layout::{Chained, Region};
use crate::persist::Persist;
use crate::platform::{self, Platform};
use crate::{Address, EEPROM_SIZE};

/// A bounded log of fixed-size entries persisted behind a packed [`Header`].
///
/// Entry `i` lives at `entry_start + i * E::SIZE`. The number of entries is bounded by the
/// smallest of `MAX`, the header's count width and the space left in the region after the
/// header. Running into that bound is not an error: `push` silently drops the entry, while
/// `record` evicts the oldest one first. Callers that care compare [`EntryBank::len`] before
/// and after.
pub struct EntryBank<E, F = WideHeader, const MAX: usize = 64> {
    region: Region,
    header: Header,
    capacity: usize,
    _marker: PhantomData<(E, F)>,
}

impl<E: Persist, F: HeaderFormat, const MAX: usize> EntryBank<E, F, MAX> {
    /// Creates a bank occupying `region`. Does not touch the store, call [`EntryBank::begin`]
    /// once the store is ready.
    pub fn new(region: Region) -> Self {
        Self {
            region,
            header: Header::at::<F>(region.base),
            capacity: Self::effective_capacity(region),
            _marker: PhantomData,
        }
    }

    /// Creates a bank starting at `base` that may use the rest of a 1KB store.
    pub fn at(base: Address) -> Self {
        Self::new(Region::until(base, EEPROM_SIZE))
    }

    fn effective_capacity(region: Region) -> usize {
        let physical = (region.size as usize).saturating_sub(F::SIZE) / E::SIZE;
        cmp::min(cmp::min(MAX, F::MAX_ENTRIES), physical)
    }

    /// Adopts the header in the store if it describes this bank. Never writes.
    ///
    /// A header is only adopted if its `exists` bit is set and it describes this bank: an
    /// erased EEPROM reads as all ones, which would otherwise pass for a full bank.
    pub fn load<S: Platform>(&mut self, storage: &mut S) -> Result<bool, Error> {
        let mut raw = [0u8; 4];
        platform::read_bytes(storage, self.region.base, &mut raw[..F::SIZE])?;
        let stored = Header::from_bytes::<F>(&raw);

        let fresh = Header::at::<F>(self.region.base);
        if stored.exists
            && stored.entry_start == fresh.entry_start
            && stored.entry_count as usize <= self.capacity
        {
            #[cfg(feature = "defmt")]
            trace!("bank @{:#06x}: loaded {} entries", self.region.base, stored.entry_count);

            self.header = stored;
            return Ok(true);
        }

        #[cfg(feature = "defmt")]
        if stored.exists {
            warn!("bank @{:#06x}: discarding implausible header", self.region.base);
        }
        Ok(false)
    }

    /// Loads the header from the store, or writes a fresh one if the store holds none.
    ///
    /// Returns whether a stored header was adopted.
    pub fn begin<S: Platform>(&mut self, storage: &mut S) -> Result<bool, Error> {
        if self.load(storage)? {
            return Ok(true);
        }
        self.write_header(storage, Header::at::<F>(self.region.base))?;
        Ok(false)
    }

    fn write_header<S: Platform>(&mut self, storage: &mut S, header: Header) -> Result<(), Error> {
        let raw = header.to_bytes::<F>();
        platform::write_bytes(storage, self.region.base, &raw[..F::SIZE])?;
        self.header = header;
        Ok(())
    }

    fn slot(&self, index: usize) -> Address {
        self.header.entry_start + (index * E::SIZE) as Address
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.header.entry_count as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Effective capacity of the bank.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    /// Returns entry `index`, or `E::default()` if there is no such entry.
    pub fn get<S: Platform>(&self, storage: &mut S, index: usize) -> Result<E, Error> {
        let mut entry = E::default();
        self.fetch(storage, index, &mut entry)?;
        Ok(entry)
    }

    /// Reads entry `index` into `out`. Leaves `out` untouched if there is no such entry.
    pub fn fetch<S: Platform>(
        &self,
        storage: &mut S,
        index: usize,
        out: &mut E,
    ) -> Result<(), Error> {
        if index < self.len() {
            *out = platform::load(storage, self.slot(index))?;
        }
        Ok(())
    }

    /// Overwrites entry `index` in place. No-op if there is no such entry.
    pub fn set<S: Platform>(
        &mut self,
        storage: &mut S,
        index: usize,
        entry: &E,
    ) -> Result<(), Error> {
        if index < self.len() {
            platform::store(storage, self.slot(index), entry)?;
        }
        Ok(())
    }

    /// Appends `entry`. Dropped silently when the bank is full.
    ///
    /// The entry is written before the header is committed, so an interrupted push never
    /// reports more entries than were written.
    pub fn push<S: Platform>(&mut self, storage: &mut S, entry: &E) -> Result<(), Error> {
        if self.is_full() {
            #[cfg(feature = "defmt")]
            trace!("bank @{:#06x}: full, entry dropped", self.region.base);
            return Ok(());
        }

        platform::store(storage, self.slot(self.len()), entry)?;
        let mut header = self.header;
        header.entry_count += 1;
        self.write_header(storage, header)
    }

    /// Removes the last entry and returns it, `E::default()` if the bank is empty.
    pub fn pop<S: Platform>(&mut self, storage: &mut S) -> Result<E, Error> {
        if self.is_empty() {
            return Ok(E::default());
        }
        let entry = self.get(storage, self.len() - 1)?;
        self.fast_pop(storage)?;
        Ok(entry)
    }

    /// Removes the last entry without reading it.
    pub fn fast_pop<S: Platform>(&mut self, storage: &mut S) -> Result<(), Error> {
        if self.is_empty() {
            return Ok(());
        }
        let mut header = self.header;
        header.entry_count -= 1;
        self.write_header(storage, header)
    }

    /// Removes the first entry and returns it, moving every other entry down one slot.
    pub fn shift_down<S: Platform>(&mut self, storage: &mut S) -> Result<E, Error> {
        let first = self.get(storage, 0)?;
        self.fast_shift_down(storage)?;
        Ok(first)
    }

    /// Removes the first entry without reading it. Costs one read and one write per remaining
    /// entry.
    pub fn fast_shift_down<S: Platform>(&mut self, storage: &mut S) -> Result<(), Error> {
        if self.is_empty() {
            return Ok(());
        }
        for index in 1..self.len() {
            let entry: E = platform::load(storage, self.slot(index))?;
            platform::store(storage, self.slot(index - 1), &entry)?;
        }
        let mut header = self.header;
        header.entry_count -= 1;
        self.write_header(storage, header)
    }

    /// Appends `entry`, evicting the oldest entry first if the bank is full. Turns the bank into
    /// a fixed-size ring log.
    pub fn record<S: Platform>(&mut self, storage: &mut S, entry: &E) -> Result<(), Error> {
        if self.is_full() {
            self.fast_shift_down(storage)?;
        }
        self.push(storage, entry)
    }

    /// Forgets all entries. Slot contents stay in the store until overwritten.
    pub fn clear<S: Platform>(&mut self, storage: &mut S) -> Result<(), Error> {
        let mut header = self.header;
        header.entry_count = 0;
        self.write_header(storage, header)
    }

    /// Iterates the entries oldest first.
    pub fn iter<'a, S: Platform>(&'a self, storage: &'a mut S) -> Entries<'a, E, F, S, MAX> {
        Entries {
            bank: self,
            storage,
            index: 0,
        }
    }

    pub fn header(&self) -> Header {
        self.header
    }

    pub fn address(&self) -> Address {
        self.region.base
    }

    /// One past the last byte the bank can ever write.
    pub fn end(&self) -> Address {
        self.region.base + (F::SIZE + self.capacity * E::SIZE) as Address
    }
}

impl<E: Persist, F: HeaderFormat, const MAX: usize> Chained for EntryBank<E, F, MAX> {
    fn address(&self) -> Address {
        EntryBank::address(self)
    }

    fn end(&self) -> Address {
        EntryBank::end(self)
    }
}

pub struct Entries<'a, E, F, S, const MAX: usize> {
    bank: &'a EntryBank<E, F, MAX>,
    storage: &'a mut S,
    index: usize,
}

impl<E: Persist, F: HeaderFormat, S: Platform, const MAX: usize> Iterator
    for Entries<'_, E, F, S, MAX>
{
    type Item = Result<E, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.bank.len() {
            return None;
        }
        let entry = self.bank.get(self.storage, self.index);
        self.index += 1;
        Some(entry)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.bank.len().saturating_sub(self.index);
        (remaining, Some(remaining))
    }
}
