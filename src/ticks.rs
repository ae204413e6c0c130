//! Process-wide millisecond counter.
//!
//! The counter is incremented from the timer interrupt through [`on_tick`] and read from the
//! main loop through [`millis`]. Both go through a critical section, which on a single core
//! MCU masks interrupts for the duration of the 32-bit access.

use core::cell::Cell;

use critical_section::Mutex;

use crate::platform::Hal;

static MILLIS: Mutex<Cell<u32>> = Mutex::new(Cell::new(0));

/// Resets the counter and arms the board timer.
pub fn init<H: Hal>(hal: &mut H) {
    critical_section::with(|cs| MILLIS.borrow(cs).set(0));
    hal.arm_timer();
}

/// Interrupt hook. Must only be called from the millisecond timer interrupt.
pub fn on_tick() {
    critical_section::with(|cs| {
        let millis = MILLIS.borrow(cs);
        millis.set(millis.get().wrapping_add(1));
    });
}

/// Milliseconds since [`init`]. Wraps after about 49 days.
pub fn millis() -> u32 {
    critical_section::with(|cs| MILLIS.borrow(cs).get())
}

/// Milliseconds elapsed since `start`, correct across one wrap of the counter.
pub fn elapsed(start: u32) -> u32 {
    millis().wrapping_sub(start)
}

/// Busy waits for `ms` milliseconds. Blocks everything but interrupts.
pub fn delay(ms: u32) {
    let start = millis();
    while elapsed(start) < ms {
        core::hint::spin_loop();
    }
}
