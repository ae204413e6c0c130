use std::path::PathBuf;

use thiserror::Error;

/// Errors of the host console.
#[derive(Error, Debug)]
pub enum Error {
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("storage error: {0}")]
    StorageError(#[from] eeprom_datalog::Error),

    #[error("invalid image size {0}: must be exactly 1024 bytes")]
    InvalidImageSize(usize),

    #[error("image {} already exists", .0.display())]
    ImageExists(PathBuf),
}
