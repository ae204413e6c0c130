//! The console command grammar.
//!
//! A line is split on spaces. Token 0 is the command word and has to start with `@`, token 1
//! selects a parameter, the remaining tokens are values. Missing tokens read as empty strings,
//! the grammar decides whether that is a missing argument or a missing value.
//!
//! ```text
//! @set temperature <min> <max> [unit]    @view log
//! @set humidity <min> <max>              @view thresholds
//! @set unit <unit>                       @view timezone
//! @set datetime <YYYY-MM-DDThh:mm:ss>    @view rawadjustment
//! @set timezone <[-]H:M>                 @wipe log
//! @set luminosity <min> <max>            @wipe absolutelyeverything
//! @set rawadjustment <min> <max>         @reset
//! @read [sensors|rawldr]                 @calibrate
//! ```
//!
//! Every command word and parameter has short synonyms, e.g. `@s t 10 30` or `@v z`.

use core::fmt::{self, Write};
use core::str::FromStr;

use chrono::NaiveDateTime;

use crate::clock::{Rtc, TimeZone};
use crate::console::token;
use crate::error::Error;
use crate::ldr::{Adjustment, Bounds};
use crate::logger::DataLogger;
use crate::platform::{self, Platform};
use crate::sensor::{Fixed, Unit};

#[derive(strum::Display, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResponseKind {
    #[default]
    Ok,
    NotACommand,
    MissingCommand,
    InvalidCommand,
    MissingArgument,
    InvalidArgument,
    MissingValue,
    InvalidValue,
}

/// What a successful command asks of the caller: the setup step it completed, a live read to
/// perform, or a device reset.
#[derive(strum::FromRepr, strum::Display, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(i8)]
pub enum Outcome {
    Reset = -1,
    ClockConfigured = 1,
    TemperatureSet = 2,
    HumiditySet = 3,
    LuminositySet = 4,
    CalibrationDone = 5,
    ReadSensors = 6,
    ReadRawLdr = 7,
}

/// Result of evaluating one line. `id` is only meaningful when `kind` is [`ResponseKind::Ok`];
/// `0` means there is nothing for the caller to do.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Response {
    pub kind: ResponseKind,
    pub id: i8,
}

impl Response {
    pub const fn ok(id: i8) -> Self {
        Self {
            kind: ResponseKind::Ok,
            id,
        }
    }

    pub const fn error(kind: ResponseKind) -> Self {
        Self { kind, id: 0 }
    }

    pub fn is_ok(&self) -> bool {
        self.kind == ResponseKind::Ok
    }

    pub fn outcome(&self) -> Option<Outcome> {
        if self.is_ok() {
            Outcome::from_repr(self.id)
        } else {
            None
        }
    }
}

impl From<Outcome> for Response {
    fn from(outcome: Outcome) -> Self {
        Response::ok(outcome as i8)
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.outcome() {
            Some(outcome) => write!(f, "{outcome}"),
            None if self.is_ok() => write!(f, "Ok"),
            None => write!(f, "Error: {}", self.kind),
        }
    }
}

#[derive(strum::EnumString, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    #[strum(serialize = "@set", serialize = "@s")]
    Set,
    #[strum(serialize = "@view", serialize = "@v")]
    View,
    #[strum(serialize = "@wipe", serialize = "@w")]
    Wipe,
    #[strum(serialize = "@reset")]
    Reset,
    #[strum(serialize = "@read", serialize = "@r")]
    Read,
    #[strum(serialize = "@calibrate", serialize = "@c")]
    Calibrate,
}

#[derive(strum::EnumString, Debug, Clone, Copy, PartialEq, Eq)]
enum SetParam {
    #[strum(serialize = "temperature", serialize = "temp", serialize = "t")]
    Temperature,
    #[strum(serialize = "humidity", serialize = "hum", serialize = "h")]
    Humidity,
    #[strum(serialize = "unit", serialize = "u")]
    Unit,
    #[strum(serialize = "datetime", serialize = "dt", serialize = "d")]
    DateTime,
    #[strum(serialize = "timezone", serialize = "zone", serialize = "z")]
    TimeZone,
    #[strum(serialize = "luminosity", serialize = "ldr", serialize = "l")]
    Luminosity,
    #[strum(
        serialize = "rawadjustment",
        serialize = "rawadjust",
        serialize = "radj",
        serialize = "ra",
        serialize = "a"
    )]
    RawAdjustment,
}

#[derive(strum::EnumString, Debug, Clone, Copy, PartialEq, Eq)]
enum ViewParam {
    #[strum(serialize = "log", serialize = "l")]
    Log,
    #[strum(serialize = "thresholds", serialize = "t")]
    Thresholds,
    #[strum(serialize = "timezone", serialize = "zone", serialize = "z")]
    TimeZone,
    #[strum(
        serialize = "rawadjustment",
        serialize = "rawadjust",
        serialize = "radj",
        serialize = "ra",
        serialize = "a"
    )]
    RawAdjustment,
}

#[derive(strum::EnumString, Debug, Clone, Copy, PartialEq, Eq)]
enum WipeParam {
    #[strum(serialize = "log")]
    Log,
    #[strum(serialize = "absolutelyeverything")]
    Everything,
}

#[derive(strum::EnumString, Debug, Clone, Copy, PartialEq, Eq)]
enum ReadParam {
    #[strum(serialize = "sensors")]
    Sensors,
    #[strum(serialize = "rawldr")]
    RawLdr,
}

/// Why a command did not complete: rejected input, or a storage failure.
enum Reject {
    Input(ResponseKind),
    Fatal(Error),
}

impl From<ResponseKind> for Reject {
    fn from(kind: ResponseKind) -> Self {
        Reject::Input(kind)
    }
}

impl From<Error> for Reject {
    fn from(error: Error) -> Self {
        Reject::Fatal(error)
    }
}

impl From<fmt::Error> for Reject {
    fn from(error: fmt::Error) -> Self {
        Reject::Fatal(error.into())
    }
}

type Eval = Result<i8, Reject>;

/// Parameter word at `index`, or the matching rejection.
fn param<T: FromStr>(line: &str, index: usize) -> Result<T, ResponseKind> {
    match token(line, index, ' ') {
        "" => Err(ResponseKind::MissingArgument),
        word => word.parse().map_err(|_| ResponseKind::InvalidArgument),
    }
}

/// Value token at `index`, or the matching rejection.
fn value<'l>(line: &'l str, index: usize) -> Result<&'l str, ResponseKind> {
    match token(line, index, ' ') {
        "" => Err(ResponseKind::MissingValue),
        word => Ok(word),
    }
}

/// A `min max` pair at `index` and `index + 1`. `max` has to be strictly greater than `min`.
fn range<T: PartialOrd>(
    line: &str,
    index: usize,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<(T, T), ResponseKind> {
    let min = value(line, index)?;
    let max = value(line, index + 1)?;
    let min = parse(min).ok_or(ResponseKind::InvalidValue)?;
    let max = parse(max).ok_or(ResponseKind::InvalidValue)?;
    if max <= min {
        return Err(ResponseKind::InvalidValue);
    }
    Ok((min, max))
}

/// Parses a decimal with up to two significant fractional digits into hundredths, so `-1.5`
/// becomes `-150`. Further fractional digits are truncated.
pub fn parse_hundredths(s: &str) -> Option<i32> {
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let (int, frac) = digits.split_once('.').unwrap_or((digits, ""));
    if int.is_empty() && frac.is_empty() {
        return None;
    }
    if !int.bytes().chain(frac.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }

    let mut value: i32 = 0;
    for b in int.bytes() {
        value = value.checked_mul(10)?.checked_add((b - b'0') as i32)?;
    }
    value = value.checked_mul(100)?;
    let mut scale = 100;
    for b in frac.bytes().take(2) {
        scale /= 10;
        value = value.checked_add((b - b'0') as i32 * scale)?;
    }
    Some(if negative { -value } else { value })
}

/// `[-]H:M`. The sign applies to the minutes too.
fn parse_time_zone(hours: &str, minutes: &str) -> Option<TimeZone> {
    let (negative, hours) = match hours.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, hours),
    };
    TimeZone::from_hours_minutes(negative, hours.parse().ok()?, minutes.parse().ok()?)
}

/// Evaluates console lines against the persisted state of a [`DataLogger`].
///
/// Rejected input never changes the store. Only storage and output failures are returned as
/// `Err`; everything else is a [`Response`].
pub struct Parser<'a, S, R> {
    storage: &'a mut S,
    logger: &'a mut DataLogger<R>,
}

impl<'a, S: Platform, R: Rtc> Parser<'a, S, R> {
    pub fn new(storage: &'a mut S, logger: &'a mut DataLogger<R>) -> Self {
        Self { storage, logger }
    }

    /// Evaluates one line, printing anything the command displays to `out`.
    pub fn evaluate<W: Write>(&mut self, line: &str, out: &mut W) -> Result<Response, Error> {
        match self.dispatch(line, out) {
            Ok(id) => Ok(Response::ok(id)),
            Err(Reject::Input(kind)) => Ok(Response::error(kind)),
            Err(Reject::Fatal(e)) => Err(e),
        }
    }

    fn dispatch<W: Write>(&mut self, line: &str, out: &mut W) -> Eval {
        if line.is_empty() {
            return Err(ResponseKind::MissingCommand.into());
        }
        let word = token(line, 0, ' ');
        if !word.starts_with('@') {
            return Err(ResponseKind::NotACommand.into());
        }

        match Command::from_str(word).map_err(|_| ResponseKind::InvalidCommand)? {
            Command::Set => self.set(line),
            Command::View => self.view(line, out),
            Command::Wipe => self.wipe(line),
            Command::Reset => Ok(-1),
            Command::Read => match token(line, 1, ' ') {
                "" => Ok(6),
                _ => match param(line, 1)? {
                    ReadParam::Sensors => Ok(6),
                    ReadParam::RawLdr => Ok(7),
                },
            },
            // reserved, nothing to calibrate yet
            Command::Calibrate => Ok(0),
        }
    }

    fn set(&mut self, line: &str) -> Eval {
        match param(line, 1)? {
            SetParam::Temperature => {
                value(line, 2)?;
                value(line, 3)?;
                let unit = match token(line, 4, ' ') {
                    "" => Unit::Celsius,
                    name => Unit::from_str(name).map_err(|_| ResponseKind::InvalidValue)?,
                };
                // ordered after conversion, truncation can collapse close bounds
                let (min, max) = range(line, 2, |s| {
                    parse_hundredths(s).and_then(|v| unit.to_celsius(v))
                })?;
                let mut threshold = self.logger.sensor.threshold(self.storage)?;
                threshold.min.temperature = min;
                threshold.max.temperature = max;
                self.logger.sensor.set_threshold(self.storage, threshold)?;
                Ok(2)
            }
            SetParam::Humidity => {
                let (min, max) = range(line, 2, |s| {
                    parse_hundredths(s).and_then(|v| i16::try_from(v).ok())
                })?;
                let mut threshold = self.logger.sensor.threshold(self.storage)?;
                threshold.min.humidity = min;
                threshold.max.humidity = max;
                self.logger.sensor.set_threshold(self.storage, threshold)?;
                Ok(3)
            }
            SetParam::Unit => {
                let unit = Unit::from_str(value(line, 2)?).map_err(|_| ResponseKind::InvalidValue)?;
                self.logger.sensor.set_unit(self.storage, unit)?;
                Ok(0)
            }
            SetParam::DateTime => {
                let local = NaiveDateTime::from_str(value(line, 2)?)
                    .map_err(|_| ResponseKind::InvalidValue)?;
                match self.logger.clock.adjust(self.storage, local) {
                    Ok(()) => Ok(0),
                    Err(Error::TimestampOutOfRange) => Err(ResponseKind::InvalidValue.into()),
                    Err(e) => Err(e.into()),
                }
            }
            SetParam::TimeZone => {
                let zone = value(line, 2)?;
                let hours = token(zone, 0, ':');
                let minutes = token(zone, 1, ':');
                if hours.is_empty() || minutes.is_empty() {
                    return Err(ResponseKind::MissingValue.into());
                }
                let zone = parse_time_zone(hours, minutes).ok_or(ResponseKind::InvalidValue)?;
                self.logger.clock.set_time_zone(self.storage, zone)?;
                Ok(1)
            }
            SetParam::Luminosity => {
                let (min, max) = range(line, 2, |s| s.parse::<u8>().ok().filter(|&v| v <= 100))?;
                self.logger.ldr.set_threshold(self.storage, Bounds { min, max })?;
                Ok(4)
            }
            SetParam::RawAdjustment => {
                let (min, max) = range(line, 2, |s| s.parse::<u16>().ok())?;
                self.logger.ldr.set_adjustment(self.storage, Adjustment { min, max })?;
                Ok(5)
            }
        }
    }

    fn view<W: Write>(&mut self, line: &str, out: &mut W) -> Eval {
        match param(line, 1)? {
            ViewParam::Log => {
                let unit = self.logger.sensor.unit(self.storage)?;
                for log in self.logger.log.iter(self.storage) {
                    writeln!(out, "{}", log?.display(unit))?;
                }
            }
            ViewParam::Thresholds => {
                let info = self.logger.sensor.info(self.storage)?;
                let (min, max) = (info.threshold.min, info.threshold.max);
                writeln!(out, "Temperature ({}):", info.unit)?;
                writeln!(out, "    MIN: {}", Fixed(info.unit.from_celsius(min.temperature)))?;
                writeln!(out, "    MAX: {}", Fixed(info.unit.from_celsius(max.temperature)))?;
                writeln!(out, "Humidity (%):")?;
                writeln!(out, "    MIN: {}", Fixed(min.humidity as i32))?;
                writeln!(out, "    MAX: {}", Fixed(max.humidity as i32))?;

                let bounds = self.logger.ldr.threshold(self.storage)?;
                writeln!(out, "Luminosity (%):")?;
                writeln!(out, "    MIN: {}", bounds.min)?;
                writeln!(out, "    MAX: {}", bounds.max)?;
            }
            ViewParam::TimeZone => {
                writeln!(out, "Timezone: {}", self.logger.clock.time_zone(self.storage)?)?;
            }
            ViewParam::RawAdjustment => {
                let adjustment = self.logger.ldr.adjustment(self.storage)?;
                writeln!(out, "Adjustment (RAW):")?;
                writeln!(out, "    MIN: {}", adjustment.min)?;
                writeln!(out, "    MAX: {}", adjustment.max)?;
            }
        }
        Ok(0)
    }

    fn wipe(&mut self, line: &str) -> Eval {
        match param(line, 1)? {
            WipeParam::Log => {
                self.logger.log.clear(self.storage)?;
                Ok(0)
            }
            WipeParam::Everything => {
                platform::zero_fill(self.storage)?;
                Ok(-1)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hundredths() {
        assert_eq!(parse_hundredths("21.5"), Some(2150));
        assert_eq!(parse_hundredths("-1.05"), Some(-105));
        assert_eq!(parse_hundredths("+3"), Some(300));
        assert_eq!(parse_hundredths(".25"), Some(25));
        assert_eq!(parse_hundredths("0.999"), Some(99));
        assert_eq!(parse_hundredths("."), None);
        assert_eq!(parse_hundredths("-"), None);
        assert_eq!(parse_hundredths("1e3"), None);
        assert_eq!(parse_hundredths("99999999999"), None);
    }

    #[test]
    fn time_zone_sign_applies_to_minutes() {
        assert_eq!(parse_time_zone("2", "30").map(TimeZone::quarters), Some(10));
        assert_eq!(parse_time_zone("-3", "30").map(TimeZone::quarters), Some(-14));
        assert_eq!(parse_time_zone("-0", "45").map(TimeZone::quarters), Some(-3));
        assert_eq!(parse_time_zone("x", "0"), None);
    }

    #[test]
    fn outcome_ids() {
        assert_eq!(Response::ok(1).outcome(), Some(Outcome::ClockConfigured));
        assert_eq!(Response::ok(-1).outcome(), Some(Outcome::Reset));
        assert_eq!(Response::ok(0).outcome(), None);
        assert_eq!(Response::error(ResponseKind::InvalidValue).outcome(), None);
        assert_eq!(Response::from(Outcome::ReadRawLdr), Response::ok(7));
    }
}
