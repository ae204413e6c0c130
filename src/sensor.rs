//! Persisted configuration of the temperature/humidity sensor.
//!
//! Readings are fixed point hundredths: `2150` is 21.50 °C or 21.50 %. Temperatures are always
//! stored in Celsius; the configured [`Unit`] only affects parsing and display.

use core::fmt;

use crate::error::Error;
use crate::layout::Chained;
use crate::persist::{Persist, Reader, Writer};
use crate::platform::Platform;
use crate::record::Record;
use crate::Address;

#[derive(
    strum::EnumString, strum::Display, strum::FromRepr, Debug, Default, Clone, Copy, PartialEq, Eq,
)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[strum(ascii_case_insensitive)]
#[repr(u8)]
pub enum Unit {
    #[default]
    #[strum(
        to_string = "C",
        serialize = "celsius",
        serialize = "celcius",
        serialize = "centigrade",
        serialize = "cel"
    )]
    Celsius = b'C',
    #[strum(
        to_string = "F",
        serialize = "fahrenheit",
        serialize = "farenheit",
        serialize = "far"
    )]
    Fahrenheit = b'F',
    #[strum(to_string = "K", serialize = "kelvin", serialize = "kel")]
    Kelvin = b'K',
}

impl Unit {
    /// Converts hundredths of a degree in this unit to hundredths of a degree Celsius, `None`
    /// if the result does not fit the stored width.
    pub fn to_celsius(self, value: i32) -> Option<i16> {
        let value = value as i64;
        let celsius = match self {
            Unit::Celsius => value,
            Unit::Fahrenheit => (value - 3200) * 5 / 9,
            Unit::Kelvin => value - 27315,
        };
        i16::try_from(celsius).ok()
    }

    /// Converts hundredths of a degree Celsius to this unit.
    pub fn from_celsius(self, value: i16) -> i32 {
        let value = value as i32;
        match self {
            Unit::Celsius => value,
            Unit::Fahrenheit => value * 9 / 5 + 3200,
            Unit::Kelvin => value + 27315,
        }
    }
}

impl Persist for Unit {
    type Raw = [u8; 1];

    fn encode(&self) -> Self::Raw {
        [*self as u8]
    }

    fn decode(raw: &Self::Raw) -> Self {
        Unit::from_repr(raw[0]).unwrap_or_default()
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Value {
    /// Hundredths of a degree Celsius.
    pub temperature: i16,
    /// Hundredths of a percent of relative humidity.
    pub humidity: i16,
}

impl Persist for Value {
    type Raw = [u8; 4];

    fn encode(&self) -> Self::Raw {
        let mut raw = [0u8; 4];
        Writer::new(&mut raw).put(&self.temperature).put(&self.humidity);
        raw
    }

    fn decode(raw: &Self::Raw) -> Self {
        let mut r = Reader::new(raw);
        Self {
            temperature: r.take(),
            humidity: r.take(),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Threshold {
    pub min: Value,
    pub max: Value,
}

impl Threshold {
    pub fn temperature_ok(&self, temperature: i16) -> bool {
        (self.min.temperature..=self.max.temperature).contains(&temperature)
    }

    pub fn humidity_ok(&self, humidity: i16) -> bool {
        (self.min.humidity..=self.max.humidity).contains(&humidity)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorInfo {
    pub unit: Unit,
    pub threshold: Threshold,
}

impl Persist for SensorInfo {
    type Raw = [u8; 9];

    fn encode(&self) -> Self::Raw {
        let mut raw = [0u8; 9];
        Writer::new(&mut raw)
            .put(&self.unit)
            .put(&self.threshold.min)
            .put(&self.threshold.max);
        raw
    }

    fn decode(raw: &Self::Raw) -> Self {
        let mut r = Reader::new(raw);
        Self {
            unit: r.take(),
            threshold: Threshold {
                min: r.take(),
                max: r.take(),
            },
        }
    }
}

/// Hundredths formatted as a decimal, e.g. `-105` as `-1.05`.
pub struct Fixed(pub i32);

impl fmt::Display for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

pub struct SensorSettings {
    info: Record<SensorInfo>,
}

impl SensorSettings {
    pub fn new(address: Address) -> Self {
        Self {
            info: Record::new(address),
        }
    }

    pub fn begin<S: Platform>(&mut self, storage: &mut S) -> Result<(), Error> {
        self.info.begin(storage)
    }

    pub fn info<S: Platform>(&self, storage: &mut S) -> Result<SensorInfo, Error> {
        self.info.get(storage)
    }

    pub fn unit<S: Platform>(&self, storage: &mut S) -> Result<Unit, Error> {
        Ok(self.info.get(storage)?.unit)
    }

    pub fn set_unit<S: Platform>(&mut self, storage: &mut S, unit: Unit) -> Result<(), Error> {
        self.info.update(storage, |info| info.unit = unit)?;
        Ok(())
    }

    pub fn threshold<S: Platform>(&self, storage: &mut S) -> Result<Threshold, Error> {
        Ok(self.info.get(storage)?.threshold)
    }

    pub fn set_threshold<S: Platform>(
        &mut self,
        storage: &mut S,
        threshold: Threshold,
    ) -> Result<(), Error> {
        self.info.update(storage, |info| info.threshold = threshold)?;
        Ok(())
    }

    /// Whether `value` lies within the configured thresholds, bounds included.
    pub fn is_safe<S: Platform>(&self, storage: &mut S, value: Value) -> Result<bool, Error> {
        let threshold = self.threshold(storage)?;
        Ok(threshold.temperature_ok(value.temperature) && threshold.humidity_ok(value.humidity))
    }
}

impl Chained for SensorSettings {
    fn address(&self) -> Address {
        self.info.address()
    }

    fn end(&self) -> Address {
        self.info.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::str::FromStr;

    #[test]
    fn unit_aliases() {
        assert_eq!(Unit::from_str("celcius"), Ok(Unit::Celsius));
        assert_eq!(Unit::from_str("c"), Ok(Unit::Celsius));
        assert_eq!(Unit::from_str("Far"), Ok(Unit::Fahrenheit));
        assert_eq!(Unit::from_str("k"), Ok(Unit::Kelvin));
        assert!(Unit::from_str("rankine").is_err());
    }

    #[test]
    fn conversions() {
        assert_eq!(Unit::Fahrenheit.to_celsius(21200), Some(10000));
        assert_eq!(Unit::Kelvin.to_celsius(27315), Some(0));
        assert_eq!(Unit::Fahrenheit.from_celsius(-4000), -4000);
        assert_eq!(Unit::Kelvin.from_celsius(2500), 29815);
    }

    #[test]
    fn conversions_out_of_range() {
        assert_eq!(Unit::Celsius.to_celsius(1_000_000), None);
        assert_eq!(Unit::Fahrenheit.to_celsius(i32::MAX), None);
        assert_eq!(Unit::Kelvin.to_celsius(i32::MIN), None);
        assert_eq!(Unit::Celsius.to_celsius(i16::MIN as i32), Some(i16::MIN));
    }

    #[test]
    fn fixed_point_display() {
        use core::fmt::Write;
        let mut s = heapless::String::<32>::new();
        write!(s, "{} {} {}", Fixed(2150), Fixed(-105), Fixed(7)).unwrap();
        assert_eq!(s.as_str(), "21.50 -1.05 0.07");
    }

    #[test]
    fn info_layout() {
        let info = SensorInfo {
            unit: Unit::Kelvin,
            threshold: Threshold {
                min: Value {
                    temperature: 1,
                    humidity: 2,
                },
                max: Value {
                    temperature: 3,
                    humidity: 4,
                },
            },
        };
        assert_eq!(info.encode(), [b'K', 1, 0, 2, 0, 3, 0, 4, 0]);
        assert_eq!(SensorInfo::decode(&info.encode()), info);
    }
}
