//! Millisecond time source used for rate limiting.

use core::cell::Cell;

use critical_section::Mutex;

/// Free-running millisecond clock. Wraps around after ~49.7 days.
pub trait Clock {
    fn now_millis(&self) -> u32;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_millis(&self) -> u32 {
        (**self).now_millis()
    }
}

/// Millisecond counter advanced from a periodic timer interrupt.
///
/// Meant to live in a `static`: call [`tick`](Self::tick) from the 1 ms
/// interrupt handler and hand `&COUNTER` to the driver as its clock. Both
/// sides go through a critical section, so the main context never sees a
/// half-updated value on targets without 32-bit atomics.
///
/// ```
/// use bme680_twi::{Clock, MillisCounter};
///
/// static MILLIS: MillisCounter = MillisCounter::new();
///
/// // in the timer ISR
/// MILLIS.tick();
///
/// assert_eq!(MILLIS.now_millis(), 1);
/// ```
pub struct MillisCounter {
    millis: Mutex<Cell<u32>>,
}

impl MillisCounter {
    pub const fn new() -> Self {
        MillisCounter {
            millis: Mutex::new(Cell::new(0)),
        }
    }

    /// Advances the counter by one millisecond.
    pub fn tick(&self) {
        self.advance(1);
    }

    /// Advances the counter by `millis`, wrapping on overflow.
    pub fn advance(&self, millis: u32) {
        critical_section::with(|cs| {
            let cell = self.millis.borrow(cs);
            cell.set(cell.get().wrapping_add(millis));
        });
    }
}

impl Default for MillisCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MillisCounter {
    fn now_millis(&self) -> u32 {
        critical_section::with(|cs| self.millis.borrow(cs).get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static COUNTER: MillisCounter = MillisCounter::new();

    #[test]
    fn ticks_accumulate() {
        let counter = MillisCounter::new();
        assert_eq!(counter.now_millis(), 0);
        for _ in 0..5 {
            counter.tick();
        }
        counter.advance(995);
        assert_eq!(counter.now_millis(), 1000);
    }

    #[test]
    fn counter_wraps() {
        let counter = MillisCounter::new();
        counter.advance(u32::MAX);
        counter.tick();
        assert_eq!(counter.now_millis(), 0);
    }

    #[test]
    fn shared_static_through_reference() {
        fn read(clock: impl Clock) -> u32 {
            clock.now_millis()
        }

        COUNTER.advance(42);
        assert_eq!(read(&COUNTER), 42);
    }
}
