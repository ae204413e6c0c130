#![doc = include_str ! ("../README.md")]
#![cfg_attr(not(target_arch = "x86_64"), no_std)]

pub mod bank;
pub mod clock;
pub mod console;
pub mod error;
pub mod header;
pub mod layout;
pub mod ldr;
pub mod logger;
pub mod parser;
pub mod persist;
pub mod platform;
pub mod record;
pub mod sensor;
pub mod ticks;

/// Byte offset into the non-volatile store.
pub type Address = u16;

/// Size of the EEPROM of the reference board (ATmega328P).
pub const EEPROM_SIZE: usize = 1024;

pub use bank::EntryBank;
pub use clock::{Clock, Rtc, TimeZone};
pub use error::Error;
pub use header::{Header, HeaderFormat, NarrowHeader, WideHeader};
pub use layout::{Chained, Region};
pub use ldr::LdrSettings;
pub use logger::{DataLogger, Log, Reading};
pub use parser::{Outcome, Parser, Response, ResponseKind};
pub use persist::Persist;
pub use platform::{Hal, Platform};
pub use record::{Deferred, FlushOnRelease, NoCache, Record, WriteThrough};
pub use sensor::{SensorSettings, Unit, Value};
