use embedded_storage::{ReadStorage, Storage};

use crate::Address;
use crate::error::Error;
use crate::persist::Persist;

/// Byte addressable non-volatile store, e.g. the 1KB EEPROM of an ATmega328P.
///
/// Any [`embedded_storage::Storage`] implementation qualifies. Writes are expected to be
/// synchronous: when `write` returns, the bytes are programmed.
pub trait Platform: Storage {}

impl<T: Storage> Platform for T {}

/// Board services the storage core may need besides the store itself. Register access stays
/// behind this trait so the core can be tested on the host against a fake board.
pub trait Hal {
    /// Configures the hardware timer to call [`crate::ticks::on_tick`] once per millisecond.
    fn arm_timer(&mut self);

    fn digital_read(&mut self, pin: u8) -> bool;

    fn digital_write(&mut self, pin: u8, high: bool);

    /// Raw ADC reading, 10 bit on the reference board.
    fn analog_read(&mut self, pin: u8) -> u16;
}

#[inline(always)]
fn check_bounds<T: Platform>(hal: &T, address: Address, len: usize) -> Result<(), Error> {
    if address as usize + len > hal.capacity() {
        return Err(Error::OutOfBounds { address, len });
    }
    Ok(())
}

pub(crate) fn read_bytes<T: Platform>(
    hal: &mut T,
    address: Address,
    bytes: &mut [u8],
) -> Result<(), Error> {
    check_bounds(hal, address, bytes.len())?;
    ReadStorage::read(hal, address as u32, bytes).map_err(|_| Error::StorageError)
}

pub(crate) fn write_bytes<T: Platform>(
    hal: &mut T,
    address: Address,
    bytes: &[u8],
) -> Result<(), Error> {
    check_bounds(hal, address, bytes.len())?;

    #[cfg(feature = "debug-logs")]
    println!("  platform: write {:#06x}[{}]", address, bytes.len());

    Storage::write(hal, address as u32, bytes).map_err(|_| Error::StorageError)
}

/// Reads a value of type `V` stored at `address`.
pub(crate) fn load<V: Persist, T: Platform>(hal: &mut T, address: Address) -> Result<V, Error> {
    let mut raw = V::Raw::default();
    read_bytes(hal, address, raw.as_mut())?;
    Ok(V::decode(&raw))
}

/// Writes `value` at `address`.
pub(crate) fn store<V: Persist, T: Platform>(
    hal: &mut T,
    address: Address,
    value: &V,
) -> Result<(), Error> {
    let raw = value.encode();
    write_bytes(hal, address, raw.as_ref())
}

/// Overwrites the whole store with zeros.
pub(crate) fn zero_fill<T: Platform>(hal: &mut T) -> Result<(), Error> {
    let capacity = hal.capacity();
    zero_range(hal, 0, capacity)
}

/// Overwrites `start..end` with zeros.
pub(crate) fn zero_range<T: Platform>(hal: &mut T, start: usize, end: usize) -> Result<(), Error> {
    const CHUNK: usize = 32;
    let zeros = [0u8; CHUNK];

    let mut offset = start;
    while offset < end {
        let len = CHUNK.min(end - offset);
        write_bytes(hal, offset as Address, &zeros[..len])?;
        offset += len;
    }
    Ok(())
}
