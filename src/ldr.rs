use crate::Address;
use crate::error::Error;
use crate::layout::Chained;
use crate::persist::{Persist, Reader, Writer};
use crate::platform::Platform;
use crate::record::Record;

/// Raw ADC readings that map to 0 % and 100 % luminosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Adjustment {
    pub min: u16,
    pub max: u16,
}

impl Default for Adjustment {
    fn default() -> Self {
        Self { min: 0, max: 1023 }
    }
}

/// Accepted luminosity range in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Bounds {
    pub min: u8,
    pub max: u8,
}

impl Default for Bounds {
    fn default() -> Self {
        Self { min: 0, max: 100 }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LdrInfo {
    pub threshold: Bounds,
    pub adjustment: Adjustment,
}

impl Persist for LdrInfo {
    type Raw = [u8; 6];

    fn encode(&self) -> Self::Raw {
        let mut raw = [0u8; 6];
        Writer::new(&mut raw)
            .put(&self.threshold.min)
            .put(&self.threshold.max)
            .put(&self.adjustment.min)
            .put(&self.adjustment.max);
        raw
    }

    fn decode(raw: &Self::Raw) -> Self {
        let mut r = Reader::new(raw);
        Self {
            threshold: Bounds {
                min: r.take(),
                max: r.take(),
            },
            adjustment: Adjustment {
                min: r.take(),
                max: r.take(),
            },
        }
    }
}

impl Adjustment {
    /// Maps a raw reading onto 0..=100 %, clamping readings outside the calibrated range.
    pub fn percent(&self, raw: u16) -> u8 {
        if self.max <= self.min {
            return 0;
        }
        let raw = raw.clamp(self.min, self.max);
        ((raw - self.min) as u32 * 100 / (self.max - self.min) as u32) as u8
    }
}

/// Persisted configuration of the light dependent resistor.
pub struct LdrSettings {
    info: Record<LdrInfo>,
}

impl LdrSettings {
    pub fn new(address: Address) -> Self {
        Self {
            info: Record::new(address),
        }
    }

    pub fn begin<S: Platform>(&mut self, storage: &mut S) -> Result<(), Error> {
        self.info.begin(storage)
    }

    pub fn threshold<S: Platform>(&self, storage: &mut S) -> Result<Bounds, Error> {
        Ok(self.info.get(storage)?.threshold)
    }

    pub fn set_threshold<S: Platform>(
        &mut self,
        storage: &mut S,
        bounds: Bounds,
    ) -> Result<(), Error> {
        self.info.update(storage, |info| info.threshold = bounds)?;
        Ok(())
    }

    pub fn adjustment<S: Platform>(&self, storage: &mut S) -> Result<Adjustment, Error> {
        Ok(self.info.get(storage)?.adjustment)
    }

    pub fn set_adjustment<S: Platform>(
        &mut self,
        storage: &mut S,
        adjustment: Adjustment,
    ) -> Result<(), Error> {
        self.info.update(storage, |info| info.adjustment = adjustment)?;
        Ok(())
    }

    pub fn percent<S: Platform>(&self, storage: &mut S, raw: u16) -> Result<u8, Error> {
        Ok(self.adjustment(storage)?.percent(raw))
    }

    pub fn is_safe<S: Platform>(&self, storage: &mut S, percent: u8) -> Result<bool, Error> {
        let bounds = self.threshold(storage)?;
        Ok((bounds.min..=bounds.max).contains(&percent))
    }
}

impl Chained for LdrSettings {
    fn address(&self) -> Address {
        self.info.address()
    }

    fn end(&self) -> Address {
        self.info.end()
    }
}
