//! Host side console for [`eeprom_datalog`].
//!
//! Runs the device's command parser against a 1KB EEPROM image file and a simulated board, so
//! settings can be prepared and logs inspected without hardware.

pub mod board;
pub mod error;
pub mod image;
pub mod session;

pub use board::{SimBoard, SystemRtc, LDR_PIN};
pub use error::Error;
pub use image::Image;
pub use session::{dump, format, Session};
