//! Simulated board: pins, the LDR input, the millisecond timer and the RTC.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use eeprom_datalog::clock::Rtc;
use eeprom_datalog::platform::Hal;
use eeprom_datalog::ticks;

/// Analog pin of the light dependent resistor (A0 on the reference board).
pub const LDR_PIN: u8 = 14;

const PINS: usize = 20;

pub struct SimBoard {
    pins: [bool; PINS],
    ldr_raw: u16,
    timer: Option<Arc<AtomicBool>>,
}

impl SimBoard {
    pub fn new(ldr_raw: u16) -> Self {
        Self {
            pins: [false; PINS],
            ldr_raw,
            timer: None,
        }
    }
}

impl Hal for SimBoard {
    /// Starts a thread standing in for the timer interrupt.
    fn arm_timer(&mut self) {
        if self.timer.is_some() {
            return;
        }
        let running = Arc::new(AtomicBool::new(true));
        let flag = running.clone();
        thread::spawn(move || {
            while flag.load(Ordering::Relaxed) {
                thread::sleep(Duration::from_millis(1));
                ticks::on_tick();
            }
        });
        self.timer = Some(running);
    }

    fn digital_read(&mut self, pin: u8) -> bool {
        self.pins.get(pin as usize).copied().unwrap_or(false)
    }

    fn digital_write(&mut self, pin: u8, high: bool) {
        if let Some(state) = self.pins.get_mut(pin as usize) {
            *state = high;
        }
    }

    fn analog_read(&mut self, pin: u8) -> u16 {
        if pin == LDR_PIN { self.ldr_raw } else { 0 }
    }
}

impl Drop for SimBoard {
    fn drop(&mut self) {
        if let Some(running) = self.timer.take() {
            running.store(false, Ordering::Relaxed);
        }
    }
}

/// RTC running off the host clock. Adjusting it only shifts an offset, which is lost when the
/// process exits.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRtc {
    offset: i64,
}

fn system_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

impl Rtc for SystemRtc {
    fn now(&mut self) -> u32 {
        (system_seconds() + self.offset).clamp(0, u32::MAX as i64) as u32
    }

    fn adjust(&mut self, unix: u32) {
        self.offset = unix as i64 - system_seconds();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pins_and_ldr() {
        let mut board = SimBoard::new(700);
        assert_eq!(board.analog_read(LDR_PIN), 700);
        assert_eq!(board.analog_read(LDR_PIN + 1), 0);
        board.digital_write(13, true);
        assert!(board.digital_read(13));
        board.digital_write(200, true);
        assert!(!board.digital_read(200));
    }

    #[test]
    fn rtc_adjust() {
        let mut rtc = SystemRtc::default();
        rtc.adjust(1_000);
        let now = rtc.now();
        assert!((1_000..1_010).contains(&now));
    }
}
