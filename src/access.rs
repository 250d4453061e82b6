//! Whole-register reads and writes with a bounded retry policy.
//!
//! This is the only place that retries. Each failed attempt is followed by
//! [`Transport::recover`] so the next attempt always starts from an idle bus.

use crate::error::{AccessError, BusError};
use crate::transport::{Direction, Transport};

/// Attempts per register transaction unless configured otherwise.
pub const DEFAULT_ATTEMPTS: u8 = 3;

/// Register read/write front end for one device on the bus.
#[derive(Debug)]
pub struct RegisterAccess<T> {
    transport: T,
    address: u8,
    attempts: u8,
}

impl<T: Transport> RegisterAccess<T> {
    pub fn new(transport: T, address: u8) -> Self {
        RegisterAccess {
            transport,
            address,
            attempts: DEFAULT_ATTEMPTS,
        }
    }

    /// Sets the total number of attempts per transaction (at least one).
    pub fn with_attempts(mut self, attempts: u8) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    /// 7-bit address of the device this front end talks to.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Gives back the transport.
    pub fn release(self) -> T {
        self.transport
    }

    /// Reads a single register: `start(W) reg start(R) data+NACK stop`.
    pub fn read_register(&mut self, register: u8) -> Result<u8, AccessError> {
        let address = self.address;
        self.with_retries(register, |bus| {
            bus.start(address, Direction::Write)?;
            bus.write_byte(register)?;
            bus.start(address, Direction::Read)?;
            let value = bus.read_byte(false)?;
            bus.stop()?;
            Ok(value)
        })
    }

    /// Writes a single register: `start(W) reg value stop`.
    pub fn write_register(&mut self, register: u8, value: u8) -> Result<(), AccessError> {
        let address = self.address;
        self.with_retries(register, |bus| {
            bus.start(address, Direction::Write)?;
            bus.write_byte(register)?;
            bus.write_byte(value)?;
            bus.stop()
        })
    }

    fn with_retries<R>(
        &mut self,
        register: u8,
        mut transaction: impl FnMut(&mut T) -> Result<R, BusError>,
    ) -> Result<R, AccessError> {
        let mut last = BusError::Timeout;

        for attempt in 1..=self.attempts {
            match transaction(&mut self.transport) {
                Ok(value) => return Ok(value),
                Err(err) => {
                    trace!(
                        "register {=u8:#x}: attempt {} failed with {}",
                        register,
                        attempt,
                        err
                    );
                    self.transport.recover();
                    last = err;
                }
            }
        }

        error!("register {=u8:#x}: giving up after {} attempts", register, self.attempts);
        Err(AccessError::Exhausted { register, last })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::BusState;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Call {
        Start(u8, Direction),
        Write(u8),
        Read(bool),
        Stop,
        Recover,
    }

    /// Transport whose first `failures` start() calls fail with `error`.
    struct FlakyTransport {
        failures: usize,
        error: BusError,
        wedged: bool,
        read_value: u8,
        calls: Vec<Call>,
    }

    impl FlakyTransport {
        fn new(failures: usize, error: BusError) -> Self {
            FlakyTransport {
                failures,
                error,
                wedged: false,
                read_value: 0x5A,
                calls: Vec::new(),
            }
        }

        fn recoveries(&self) -> usize {
            self.calls.iter().filter(|c| **c == Call::Recover).count()
        }
    }

    impl Transport for FlakyTransport {
        fn start(&mut self, address: u8, direction: Direction) -> Result<(), BusError> {
            self.calls.push(Call::Start(address, direction));
            if self.wedged {
                return Err(BusError::BusWedged);
            }
            if self.failures > 0 {
                self.failures -= 1;
                return Err(self.error);
            }
            Ok(())
        }

        fn write_byte(&mut self, data: u8) -> Result<(), BusError> {
            self.calls.push(Call::Write(data));
            Ok(())
        }

        fn read_byte(&mut self, send_ack: bool) -> Result<u8, BusError> {
            self.calls.push(Call::Read(send_ack));
            Ok(self.read_value)
        }

        fn stop(&mut self) -> Result<(), BusError> {
            self.calls.push(Call::Stop);
            Ok(())
        }

        fn recover(&mut self) {
            self.calls.push(Call::Recover);
            self.wedged = false;
        }

        fn bus_state(&mut self) -> BusState {
            if self.wedged {
                BusState::Busy
            } else {
                BusState::Idle
            }
        }
    }

    #[test]
    fn read_register_sequence() {
        let mut access = RegisterAccess::new(FlakyTransport::new(0, BusError::NoAck), 0x76);

        assert_eq!(access.read_register(0xD0), Ok(0x5A));
        assert_eq!(
            access.release().calls,
            [
                Call::Start(0x76, Direction::Write),
                Call::Write(0xD0),
                Call::Start(0x76, Direction::Read),
                Call::Read(false),
                Call::Stop,
            ]
        );
    }

    #[test]
    fn write_register_sequence() {
        let mut access = RegisterAccess::new(FlakyTransport::new(0, BusError::NoAck), 0x77);
        assert_eq!(access.address(), 0x77);

        assert_eq!(access.write_register(0xE0, 0xB6), Ok(()));
        assert_eq!(
            access.release().calls,
            [
                Call::Start(0x77, Direction::Write),
                Call::Write(0xE0),
                Call::Write(0xB6),
                Call::Stop,
            ]
        );
    }

    #[test]
    fn transient_failures_below_budget_succeed() {
        let transport = FlakyTransport::new(DEFAULT_ATTEMPTS as usize - 1, BusError::Timeout);
        let mut access = RegisterAccess::new(transport, 0x76);

        assert_eq!(access.read_register(0x1D), Ok(0x5A));
        assert_eq!(access.release().recoveries(), DEFAULT_ATTEMPTS as usize - 1);

        let transport = FlakyTransport::new(DEFAULT_ATTEMPTS as usize - 1, BusError::NoAck);
        let mut access = RegisterAccess::new(transport, 0x76);
        assert_eq!(access.write_register(0x74, 0x21), Ok(()));
    }

    #[test]
    fn failures_at_budget_are_exhausted() {
        let transport = FlakyTransport::new(DEFAULT_ATTEMPTS as usize, BusError::NoAck);
        let mut access = RegisterAccess::new(transport, 0x76);

        assert_eq!(
            access.read_register(0x22),
            Err(AccessError::Exhausted {
                register: 0x22,
                last: BusError::NoAck
            })
        );
        let transport = access.release();
        // Every failed attempt is followed by a recovery, including the last one.
        assert_eq!(transport.recoveries(), DEFAULT_ATTEMPTS as usize);
        assert!(!transport.calls.contains(&Call::Read(false)));

        let transport = FlakyTransport::new(DEFAULT_ATTEMPTS as usize, BusError::Timeout);
        let mut access = RegisterAccess::new(transport, 0x76);
        assert_eq!(
            access.write_register(0x74, 0x21),
            Err(AccessError::Exhausted {
                register: 0x74,
                last: BusError::Timeout
            })
        );
    }

    #[test]
    fn wedged_bus_is_recovered_before_the_retried_start() {
        let mut transport = FlakyTransport::new(0, BusError::NoAck);
        transport.wedged = true;
        let mut access = RegisterAccess::new(transport, 0x76);

        assert_eq!(access.read_register(0xD0), Ok(0x5A));
        let transport = access.release();
        assert_eq!(transport.recoveries(), 1);
        assert_eq!(
            &transport.calls[..3],
            [
                Call::Start(0x76, Direction::Write),
                Call::Recover,
                Call::Start(0x76, Direction::Write),
            ]
        );
    }

    #[test]
    fn custom_attempt_budget() {
        let transport = FlakyTransport::new(4, BusError::NoAck);
        let mut access = RegisterAccess::new(transport, 0x76).with_attempts(5);
        assert_eq!(access.read_register(0x8C), Ok(0x5A));

        let transport = FlakyTransport::new(1, BusError::NoAck);
        let mut access = RegisterAccess::new(transport, 0x76).with_attempts(0);
        assert!(access.read_register(0x8C).is_err());
    }
}
