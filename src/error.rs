use thiserror::Error;

/// Errors that can occur while talking to the non-volatile store. Capacity conditions of the
/// entry bank (full bank, index out of range) are not errors and are absorbed silently, and
/// console parse failures are reported through [`crate::parser::ResponseKind`] instead.
#[derive(Error, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// The internal error value is returned from the provided `impl Storage`
    #[error("internal storage error")]
    StorageError,

    /// The access would read or write past the capacity of the store. Usually a symptom of a
    /// layout that no longer fits after one of the chained owners grew.
    #[error("access of {len} bytes at {address:#06x} is out of bounds")]
    OutOfBounds { address: u16, len: usize },

    /// The RTC counts unsigned 32-bit seconds since 1970.
    #[error("timestamp out of range")]
    TimestampOutOfRange,

    /// Writing to the console sink failed.
    #[error("console output failed")]
    OutputError,
}

impl From<core::fmt::Error> for Error {
    fn from(_: core::fmt::Error) -> Self {
        Error::OutputError
    }
}
