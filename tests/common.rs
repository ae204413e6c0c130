#![allow(dead_code)]

// filename according to https://doc.rust-lang.org/book/ch11-03-test-organization.html
use embedded_storage::{ReadStorage, Storage};

use eeprom_datalog::clock::Rtc;

pub const EEPROM_SIZE: usize = eeprom_datalog::EEPROM_SIZE;

/// In-memory EEPROM. Starts erased (all ones) like the real part.
#[derive(Default)]
pub struct Eeprom {
    pub buf: Vec<u8>,
    pub fail_after_operation: usize,
    pub operations: Vec<Operation>,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Operation {
    Read { offset: u32, len: usize },
    Write { offset: u32, len: usize },
}

impl Eeprom {
    pub fn new() -> Self {
        Self {
            buf: vec![0xffu8; EEPROM_SIZE],
            fail_after_operation: usize::MAX,
            ..Default::default()
        }
    }

    pub fn zeroed() -> Self {
        Self {
            buf: vec![0u8; EEPROM_SIZE],
            fail_after_operation: usize::MAX,
            ..Default::default()
        }
    }

    pub fn new_with_fault(fail_after_operation: usize) -> Self {
        Self {
            fail_after_operation,
            ..Self::new()
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Fails every operation from now on.
    pub fn fail_now(&mut self) {
        self.fail_after_operation = self.operations.len();
    }

    pub fn disable_faults(&mut self) {
        self.fail_after_operation = usize::MAX;
    }

    pub fn writes(&self) -> Vec<(u32, usize)> {
        self.operations
            .iter()
            .filter_map(|op| match op {
                Operation::Write { offset, len } => Some((*offset, *len)),
                _ => None,
            })
            .collect()
    }

    pub fn reads(&self) -> usize {
        self.operations
            .iter()
            .filter(|op| matches!(op, Operation::Read { .. }))
            .count()
    }

    /// Forgets the operation log. Also rearms a pending fault relative to the empty log.
    pub fn clear_operations(&mut self) {
        let done = self.operations.len();
        self.operations.clear();
        self.fail_after_operation = self.fail_after_operation.saturating_sub(done);
    }

    pub fn dump_operations(&self) {
        println!("Operations:");
        for op in &self.operations {
            println!("  {:?}", op);
        }
    }
}

#[derive(Debug)]
pub struct EepromError;

impl ReadStorage for Eeprom {
    type Error = EepromError;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        println!(
            "    eeprom: read:  0x{offset:04X}[0x{:04X}] #{:>2}",
            bytes.len(),
            self.operations.len()
        );
        if self.operations.len() >= self.fail_after_operation {
            println!("    eeprom: FAULT");
            return Err(EepromError);
        }
        self.operations.push(Operation::Read {
            offset,
            len: bytes.len(),
        });

        let offset = offset as usize;
        bytes.copy_from_slice(&self.buf[offset..offset + bytes.len()]);
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.buf.len()
    }
}

impl Storage for Eeprom {
    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        println!(
            "    eeprom: write: 0x{offset:04X}[0x{:04X}] #{:>2}",
            bytes.len(),
            self.operations.len()
        );
        if self.operations.len() >= self.fail_after_operation {
            println!("    eeprom: FAULT");
            return Err(EepromError);
        }
        self.operations.push(Operation::Write {
            offset,
            len: bytes.len(),
        });

        // unlike flash, EEPROM cells can be rewritten in both directions
        let offset = offset as usize;
        self.buf[offset..offset + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }
}

/// RTC that keeps whatever it was last set to.
#[derive(Debug, Default, Clone, Copy)]
pub struct FakeRtc {
    pub unix: u32,
}

impl Rtc for FakeRtc {
    fn now(&mut self) -> u32 {
        self.unix
    }

    fn adjust(&mut self, unix: u32) {
        self.unix = unix;
    }
}
