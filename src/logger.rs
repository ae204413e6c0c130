//! The data logger: every persisted owner chained from one base address, plus the danger zone
//! sampling that feeds the log.

use core::fmt;

#[cfg(feature = "defmt")]
use defmt::trace;

use crate::bank::EntryBank;
use crate::clock::{self, Clock, Rtc};
use crate::error::Error;
use crate::header::WideHeader;
use crate::layout::Chained;
use crate::ldr::LdrSettings;
use crate::parser::{Outcome, Response};
use crate::persist::{Persist, Reader, Writer};
use crate::platform::{self, Platform};
use crate::record::{FlushOnRelease, Record};
use crate::sensor::{Fixed, SensorSettings, Unit, Value};
use crate::Address;

/// Minimum time between two evaluated samples.
pub const SAMPLE_PERIOD_MS: u32 = 2000;

/// Number of log entries kept before the oldest is evicted.
pub const LOG_ENTRIES: usize = 64;

/// One entry of the danger zone log.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Log {
    /// Local unix seconds.
    pub timestamp: u32,
    pub value: Value,
    /// Percent.
    pub luminosity: u8,
}

impl Persist for Log {
    type Raw = [u8; 9];

    fn encode(&self) -> Self::Raw {
        let mut raw = [0u8; 9];
        Writer::new(&mut raw)
            .put(&self.timestamp)
            .put(&self.value)
            .put(&self.luminosity);
        raw
    }

    fn decode(raw: &Self::Raw) -> Self {
        let mut r = Reader::new(raw);
        Self {
            timestamp: r.take(),
            value: r.take(),
            luminosity: r.take(),
        }
    }
}

impl Log {
    /// Formats the entry with temperatures in `unit`.
    pub fn display(&self, unit: Unit) -> impl fmt::Display + '_ {
        LogLine { log: self, unit }
    }
}

struct LogLine<'a> {
    log: &'a Log,
    unit: Unit,
}

impl fmt::Display for LogLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} {} | {} % | {} %",
            clock::to_datetime(self.log.timestamp),
            Fixed(self.unit.from_celsius(self.log.value.temperature)),
            self.unit,
            Fixed(self.log.value.humidity as i32),
            self.log.luminosity,
        )
    }
}

/// Configuration steps tracked in [`SetupFlags`].
#[derive(strum::Display, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Setup {
    Clock = 1 << 0,
    Temperature = 1 << 1,
    Humidity = 1 << 2,
    Luminosity = 1 << 3,
    Calibration = 1 << 4,
}

impl Setup {
    /// The setup step a successful command completes, if any.
    pub fn for_outcome(outcome: Outcome) -> Option<Self> {
        match outcome {
            Outcome::ClockConfigured => Some(Setup::Clock),
            Outcome::TemperatureSet => Some(Setup::Temperature),
            Outcome::HumiditySet => Some(Setup::Humidity),
            Outcome::LuminositySet => Some(Setup::Luminosity),
            Outcome::CalibrationDone => Some(Setup::Calibration),
            Outcome::ReadSensors | Outcome::ReadRawLdr | Outcome::Reset => None,
        }
    }
}

/// Bitmask of completed [`Setup`] steps.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SetupFlags(pub u8);

impl SetupFlags {
    /// Steps that have to be done before anything is logged. Calibration is optional.
    pub const REQUIRED: SetupFlags = SetupFlags(
        Setup::Clock as u8
            | Setup::Temperature as u8
            | Setup::Humidity as u8
            | Setup::Luminosity as u8,
    );

    pub const fn contains(self, step: Setup) -> bool {
        self.0 & step as u8 != 0
    }

    pub fn insert(&mut self, step: Setup) {
        self.0 |= step as u8;
    }

    pub const fn is_complete(self) -> bool {
        self.0 & Self::REQUIRED.0 == Self::REQUIRED.0
    }
}

impl Persist for SetupFlags {
    type Raw = [u8; 1];

    fn encode(&self) -> Self::Raw {
        [self.0]
    }

    fn decode(raw: &Self::Raw) -> Self {
        Self(raw[0])
    }
}

/// A live measurement handed in by the main loop.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reading {
    pub value: Value,
    /// Raw ADC reading of the light dependent resistor.
    pub ldr_raw: u16,
}

pub type LogBank = EntryBank<Log, WideHeader, LOG_ENTRIES>;

/// All persisted state of the logger, laid out back to back from a base address:
/// clock, sensor, ldr, setup flags, log.
pub struct DataLogger<R> {
    pub clock: Clock<R>,
    pub sensor: SensorSettings,
    pub ldr: LdrSettings,
    setup: Record<SetupFlags, FlushOnRelease>,
    pub log: LogBank,
    last_sample: Option<u32>,
}

impl<R: Rtc> DataLogger<R> {
    /// Lays out the owners from `base`. Performs no I/O, call [`DataLogger::begin`] before use.
    pub fn new(base: Address, rtc: R) -> Self {
        let clock = Clock::new(base, rtc);
        let sensor = SensorSettings::new(clock.end());
        let ldr = LdrSettings::new(sensor.end());
        let setup = Record::new(ldr.end());
        let log = LogBank::at(setup.end());
        Self {
            clock,
            sensor,
            ldr,
            setup,
            log,
            last_sample: None,
        }
    }

    /// Hydrates every owner from the store. Also used after a wipe to pick up the zeroed state.
    ///
    /// The log header tells whether the store holds logger state at all. Without one, e.g. on
    /// an erased EEPROM, the settings are zeroed and a fresh header is written.
    pub fn begin<S: Platform>(&mut self, storage: &mut S) -> Result<(), Error> {
        if !self.log.load(storage)? {
            #[cfg(feature = "defmt")]
            trace!("logger: no log header, resetting settings");

            // settings first, the header commits them
            platform::zero_range(storage, self.address() as usize, self.log.address() as usize)?;
            self.log.begin(storage)?;
        }
        self.clock.begin(storage)?;
        self.sensor.begin(storage)?;
        self.ldr.begin(storage)?;
        self.setup.begin(storage)?;
        self.last_sample = None;

        #[cfg(feature = "defmt")]
        trace!("logger: ready, {} log entries", self.log.len());

        Ok(())
    }

    pub fn address(&self) -> Address {
        self.clock.address()
    }

    /// One past the last byte used by the logger.
    pub fn end(&self) -> Address {
        self.log.end()
    }

    pub fn setup<S: Platform>(&self, storage: &mut S) -> Result<SetupFlags, Error> {
        self.setup.get(storage)
    }

    pub fn is_configured<S: Platform>(&self, storage: &mut S) -> Result<bool, Error> {
        Ok(self.setup(storage)?.is_complete())
    }

    /// Records the setup step completed by a parser response and returns its typed outcome.
    pub fn apply<S: Platform>(
        &mut self,
        storage: &mut S,
        response: Response,
    ) -> Result<Option<Outcome>, Error> {
        let Some(outcome) = response.outcome() else {
            return Ok(None);
        };

        if let Some(step) = Setup::for_outcome(outcome) {
            let mut scope = self.setup.scope(storage);
            scope.update(|flags| flags.insert(step));
            scope.release()?;

            #[cfg(feature = "defmt")]
            trace!("logger: setup step {} done", step);
        }
        Ok(Some(outcome))
    }

    /// Evaluates a reading once the logger is configured, at most once per
    /// [`SAMPLE_PERIOD_MS`]. Readings outside any of the configured thresholds are appended to
    /// the log, evicting the oldest entry when it is full.
    ///
    /// Returns whether the reading was logged.
    pub fn sample<S: Platform>(
        &mut self,
        storage: &mut S,
        now_ms: u32,
        reading: Reading,
    ) -> Result<bool, Error> {
        if !self.is_configured(storage)? {
            return Ok(false);
        }
        if self
            .last_sample
            .is_some_and(|last| now_ms.wrapping_sub(last) < SAMPLE_PERIOD_MS)
        {
            return Ok(false);
        }
        self.last_sample = Some(now_ms);

        let luminosity = self.ldr.percent(storage, reading.ldr_raw)?;
        if self.sensor.is_safe(storage, reading.value)? && self.ldr.is_safe(storage, luminosity)? {
            return Ok(false);
        }

        let log = Log {
            timestamp: self.clock.unix_now(storage)?,
            value: reading.value,
            luminosity,
        };
        self.log.record(storage, &log)?;

        #[cfg(feature = "defmt")]
        trace!("logger: danger zone, logged {}", log);

        Ok(true)
    }
}

impl<R: Rtc> Chained for DataLogger<R> {
    fn address(&self) -> Address {
        DataLogger::address(self)
    }

    fn end(&self) -> Address {
        DataLogger::end(self)
    }
}
