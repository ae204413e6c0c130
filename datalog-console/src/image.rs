use std::fs;
use std::path::Path;

use eeprom_datalog::EEPROM_SIZE;
use embedded_storage::{ReadStorage, Storage};

use crate::error::Error;

/// A 1KB EEPROM backed by memory and persisted to an image file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    buf: Vec<u8>,
}

impl Default for Image {
    fn default() -> Self {
        Self::blank()
    }
}

impl Image {
    /// A zeroed image, the state `@wipe absolutelyeverything` leaves behind.
    pub fn blank() -> Self {
        Self {
            buf: vec![0u8; EEPROM_SIZE],
        }
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, Error> {
        if bytes.len() != EEPROM_SIZE {
            return Err(Error::InvalidImageSize(bytes.len()));
        }
        Ok(Self { buf: bytes })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        Self::from_bytes(fs::read(path)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        fs::write(path, &self.buf)?;
        Ok(())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }
}

/// Access outside of the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutOfRange;

fn range(offset: u32, len: usize, capacity: usize) -> Result<std::ops::Range<usize>, OutOfRange> {
    let start = offset as usize;
    let end = start.checked_add(len).ok_or(OutOfRange)?;
    if end > capacity {
        return Err(OutOfRange);
    }
    Ok(start..end)
}

impl ReadStorage for Image {
    type Error = OutOfRange;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        let range = range(offset, bytes.len(), self.buf.len())?;
        bytes.copy_from_slice(&self.buf[range]);
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.buf.len()
    }
}

impl Storage for Image {
    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        let range = range(offset, bytes.len(), self.buf.len())?;
        self.buf[range].copy_from_slice(bytes);
        Ok(())
    }
}
