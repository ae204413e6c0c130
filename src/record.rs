//! A single persisted value with a selectable cache policy.
//!
//! All policies share the same interface; the policy only decides where `get` reads from and
//! when the mirror is written back:
//!
//! | policy             | `get` reads | persisted on                         |
//! |--------------------|-------------|--------------------------------------|
//! | [`NoCache`]        | storage     | every `set`                          |
//! | [`WriteThrough`]   | mirror      | every `set`                          |
//! | [`Deferred`]       | mirror      | explicit `save`                      |
//! | [`FlushOnRelease`] | mirror      | explicit `save` or end of a [`Scope`] |
//!
//! Constructing a record never touches the store. A mirrored record starts at `T::default()`
//! and has to be hydrated with [`Record::begin`] once the store is ready.

use core::marker::PhantomData;
#[cfg(feature = "defmt")]
use defmt::{trace, warn};

use crate::Address;
use crate::error::Error;
use crate::layout::Chained;
use crate::persist::Persist;
use crate::platform::{self, Platform};

#[derive(strum::Display, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CacheKind {
    NoCache,
    WriteThrough,
    Deferred,
    FlushOnRelease,
}

mod sealed {
    pub trait Sealed {}
}

pub trait CachePolicy: sealed::Sealed {
    const KIND: CacheKind;
}

macro_rules! policy {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name;

        impl sealed::Sealed for $name {}

        impl CachePolicy for $name {
            const KIND: CacheKind = CacheKind::$name;
        }
    };
}

policy!(
    /// Every access is a storage transaction.
    NoCache
);
policy!(
    /// Mirror in RAM, persisted synchronously on every `set`.
    WriteThrough
);
policy!(
    /// Mirror in RAM, persisted on `save` only. Unsaved changes are lost on power loss.
    Deferred
);
policy!(
    /// Like [`Deferred`], but [`Record::scope`] saves automatically when the scope ends.
    FlushOnRelease
);

pub struct Record<T, P = WriteThrough> {
    address: Address,
    value: T,
    _policy: PhantomData<P>,
}

impl<T: Persist, P: CachePolicy> Record<T, P> {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            value: T::default(),
            _policy: PhantomData,
        }
    }

    pub const fn policy(&self) -> CacheKind {
        P::KIND
    }

    const fn mirrored() -> bool {
        !matches!(P::KIND, CacheKind::NoCache)
    }

    /// Pulls the persisted value into the mirror. No-op for [`NoCache`].
    pub fn begin<S: Platform>(&mut self, storage: &mut S) -> Result<(), Error> {
        if Self::mirrored() {
            self.value = platform::load(storage, self.address)?;

            #[cfg(feature = "defmt")]
            trace!("record @{:#06x}: hydrated", self.address);
        }
        Ok(())
    }

    pub fn get<S: Platform>(&self, storage: &mut S) -> Result<T, Error> {
        let mut value = T::default();
        self.fetch(storage, &mut value)?;
        Ok(value)
    }

    /// Same as [`Record::get`] but writes into `out`, avoiding a copy of large values.
    pub fn fetch<S: Platform>(&self, storage: &mut S, out: &mut T) -> Result<(), Error> {
        if Self::mirrored() {
            *out = self.value;
        } else {
            *out = platform::load(storage, self.address)?;
        }
        Ok(())
    }

    pub fn set<S: Platform>(&mut self, storage: &mut S, value: T) -> Result<&mut Self, Error> {
        match P::KIND {
            CacheKind::NoCache => platform::store(storage, self.address, &value)?,
            CacheKind::WriteThrough => {
                platform::store(storage, self.address, &value)?;
                self.value = value;
            }
            CacheKind::Deferred | CacheKind::FlushOnRelease => self.value = value,
        }
        Ok(self)
    }

    /// Reads the current value, lets `f` modify it and sets the result.
    pub fn update<S: Platform>(
        &mut self,
        storage: &mut S,
        f: impl FnOnce(&mut T),
    ) -> Result<&mut Self, Error> {
        let mut value = self.get(storage)?;
        f(&mut value);
        self.set(storage, value)
    }

    /// Writes the mirror back. No-op for [`NoCache`], which has nothing pending.
    pub fn save<S: Platform>(&mut self, storage: &mut S) -> Result<(), Error> {
        if Self::mirrored() {
            platform::store(storage, self.address, &self.value)?;

            #[cfg(feature = "defmt")]
            trace!("record @{:#06x}: saved", self.address);
        }
        Ok(())
    }

    pub const fn address(&self) -> Address {
        self.address
    }

    pub const fn end(&self) -> Address {
        self.address + T::SIZE as Address
    }
}

impl<T: Persist, P: CachePolicy> Chained for Record<T, P> {
    fn address(&self) -> Address {
        self.address
    }

    fn end(&self) -> Address {
        Record::end(self)
    }
}

impl<T: Persist> Record<T, FlushOnRelease> {
    /// Opens a scope over the record; the mirror is saved when the scope is dropped, so several
    /// `set` calls inside the scope cost a single write.
    pub fn scope<'a, S: Platform>(&'a mut self, storage: &'a mut S) -> Scope<'a, T, S> {
        Scope {
            record: self,
            storage,
            released: false,
        }
    }
}

pub struct Scope<'a, T: Persist, S: Platform> {
    record: &'a mut Record<T, FlushOnRelease>,
    storage: &'a mut S,
    released: bool,
}

impl<T: Persist, S: Platform> Scope<'_, T, S> {
    pub fn get(&self) -> T {
        self.record.value
    }

    pub fn set(&mut self, value: T) -> &mut Self {
        self.record.value = value;
        self
    }

    pub fn update(&mut self, f: impl FnOnce(&mut T)) -> &mut Self {
        f(&mut self.record.value);
        self
    }

    /// Ends the scope and reports the outcome of the final save, which `Drop` can only log.
    pub fn release(mut self) -> Result<(), Error> {
        self.released = true;
        self.record.save(&mut *self.storage)
    }
}

impl<T: Persist, S: Platform> Drop for Scope<'_, T, S> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(_e) = self.record.save(&mut *self.storage) {
            #[cfg(feature = "defmt")]
            warn!("record @{:#06x}: save on release failed: {}", self.record.address, _e);

            #[cfg(feature = "debug-logs")]
            println!("record @{:#06x}: save on release failed: {_e}", self.record.address);
        }
    }
}
