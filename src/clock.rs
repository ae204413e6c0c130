//! Wall clock on top of an external RTC, with a persisted time zone.

use core::fmt;

use chrono::{DateTime, NaiveDateTime};

use crate::Address;
use crate::error::Error;
use crate::layout::Chained;
use crate::persist::Persist;
use crate::platform::Platform;
use crate::record::Record;

/// Battery backed real time clock (a DS1307 on the reference board). Keeps UTC unix seconds.
pub trait Rtc {
    fn now(&mut self) -> u32;

    fn adjust(&mut self, unix: u32);
}

impl<T: Rtc> Rtc for &mut T {
    fn now(&mut self) -> u32 {
        T::now(self)
    }

    fn adjust(&mut self, unix: u32) {
        T::adjust(self, unix)
    }
}

/// Time zone in quarter hours, as it fits in 7 bits.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimeZone(i8);

impl TimeZone {
    pub const MIN: i8 = -64;
    pub const MAX: i8 = 63;
    pub const UTC: TimeZone = TimeZone(0);

    pub fn from_quarters(quarters: i16) -> Option<Self> {
        if (Self::MIN as i16..=Self::MAX as i16).contains(&quarters) {
            Some(Self(quarters as i8))
        } else {
            None
        }
    }

    /// `negative` applies to both parts, so `-3:30` is three and a half hours behind UTC.
    /// Minutes are truncated to the quarter hour.
    pub fn from_hours_minutes(negative: bool, hours: u8, minutes: u8) -> Option<Self> {
        if minutes >= 60 {
            return None;
        }
        let quarters = hours as i16 * 4 + minutes as i16 / 15;
        Self::from_quarters(if negative { -quarters } else { quarters })
    }

    pub const fn quarters(self) -> i8 {
        self.0
    }

    pub const fn offset_seconds(self) -> i32 {
        self.0 as i32 * (3600 / 4)
    }
}

impl fmt::Display for TimeZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}:{:02}", abs / 4, (abs % 4) * 15)
    }
}

/// Persisted clock state, one byte: bit 0 `adjusted`, bits 1..=7 the time zone.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockInfo {
    pub adjusted: bool,
    pub time_zone: TimeZone,
}

impl Persist for ClockInfo {
    type Raw = [u8; 1];

    fn encode(&self) -> Self::Raw {
        [(self.adjusted as u8) | ((self.time_zone.0 as u8) << 1)]
    }

    fn decode(raw: &Self::Raw) -> Self {
        Self {
            adjusted: raw[0] & 1 != 0,
            // arithmetic shift sign-extends the 7-bit zone
            time_zone: TimeZone((raw[0] as i8) >> 1),
        }
    }
}

pub struct Clock<R> {
    info: Record<ClockInfo>,
    rtc: R,
}

impl<R: Rtc> Clock<R> {
    pub fn new(address: Address, rtc: R) -> Self {
        Self {
            info: Record::new(address),
            rtc,
        }
    }

    pub fn begin<S: Platform>(&mut self, storage: &mut S) -> Result<(), Error> {
        self.info.begin(storage)
    }

    pub fn time_zone<S: Platform>(&self, storage: &mut S) -> Result<TimeZone, Error> {
        Ok(self.info.get(storage)?.time_zone)
    }

    pub fn set_time_zone<S: Platform>(
        &mut self,
        storage: &mut S,
        zone: TimeZone,
    ) -> Result<(), Error> {
        self.info.update(storage, |info| info.time_zone = zone)?;
        Ok(())
    }

    /// Whether the time has been set since the store was last wiped.
    pub fn is_adjusted<S: Platform>(&self, storage: &mut S) -> Result<bool, Error> {
        Ok(self.info.get(storage)?.adjusted)
    }

    /// Sets the RTC from a local date and time. The resulting UTC time has to fit the RTC's
    /// unsigned 32-bit seconds.
    pub fn adjust<S: Platform>(
        &mut self,
        storage: &mut S,
        local: NaiveDateTime,
    ) -> Result<(), Error> {
        let zone = self.time_zone(storage)?;
        let utc = local.and_utc().timestamp() - zone.offset_seconds() as i64;
        let utc = u32::try_from(utc).map_err(|_| Error::TimestampOutOfRange)?;
        self.rtc.adjust(utc);
        if !self.is_adjusted(storage)? {
            self.info.update(storage, |info| info.adjusted = true)?;
        }
        Ok(())
    }

    /// Local unix time.
    pub fn unix_now<S: Platform>(&mut self, storage: &mut S) -> Result<u32, Error> {
        let zone = self.time_zone(storage)?;
        Ok(self.rtc.now().wrapping_add_signed(zone.offset_seconds()))
    }

    pub fn now<S: Platform>(&mut self, storage: &mut S) -> Result<NaiveDateTime, Error> {
        Ok(to_datetime(self.unix_now(storage)?))
    }

    pub fn rtc(&mut self) -> &mut R {
        &mut self.rtc
    }
}

impl<R> Chained for Clock<R>
where
    R: Rtc,
{
    fn address(&self) -> Address {
        self.info.address()
    }

    fn end(&self) -> Address {
        self.info.end()
    }
}

/// Unix seconds as a calendar date; every `u32` is representable.
pub fn to_datetime(unix: u32) -> NaiveDateTime {
    DateTime::from_timestamp(unix as i64, 0)
        .map(|dt| dt.naive_utc())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quarters_from_hours_and_minutes() {
        assert_eq!(TimeZone::from_hours_minutes(false, 2, 30).map(TimeZone::quarters), Some(10));
        assert_eq!(TimeZone::from_hours_minutes(true, 3, 30).map(TimeZone::quarters), Some(-14));
        assert_eq!(TimeZone::from_hours_minutes(false, 5, 44).map(TimeZone::quarters), Some(22));
        assert_eq!(TimeZone::from_hours_minutes(false, 16, 0), None);
        assert_eq!(TimeZone::from_hours_minutes(false, 1, 60), None);
    }

    #[test]
    fn display() {
        use core::fmt::Write;
        let mut s = heapless::String::<32>::new();
        write!(s, "{} {} {}", TimeZone(10), TimeZone(-14), TimeZone(-2)).unwrap();
        assert_eq!(s.as_str(), "2:30 -3:30 -0:30");
    }

    #[test]
    fn info_packs_into_one_byte() {
        let info = ClockInfo {
            adjusted: true,
            time_zone: TimeZone(-1),
        };
        assert_eq!(info.encode(), [0xFF]);
        assert_eq!(ClockInfo::decode(&[0xFF]), info);
        assert_eq!(
            ClockInfo::decode(&[0x14]),
            ClockInfo {
                adjusted: false,
                time_zone: TimeZone(10),
            }
        );
    }
}
