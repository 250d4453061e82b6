//! Two-wire bus transport.
//!
//! [`Twi`] drives a master peripheral one step at a time: addressing, single
//! byte transfers and the stop condition. Every wait on a peripheral flag is
//! bounded by a poll budget, so a missing device or a stuck line surfaces as a
//! [`BusError`] instead of hanging the caller.
//!
//! The hardware register layout stays behind [`TwiRegisters`]. The bit
//! definitions in [`MasterStatus`] and [`BusCommand::mctrlb`] follow the
//! megaAVR-0 / tinyAVR TWI master, which is what the driver was written
//! against, but any peripheral that can report the same flags will do.

use crate::error::BusError;

/// Default number of status polls before a wait is reported as [`BusError::Timeout`].
pub const DEFAULT_TIMEOUT_POLLS: u16 = 1000;

/// Bus state as seen by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusState {
    Idle,
    Busy,
    Error,
}

/// Transfer direction, sent as the R/W bit after the 7-bit address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Direction {
    Write = 0,
    Read = 1,
}

/// Commands the master issues while it owns the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusCommand {
    /// Repeated start.
    Start,
    /// Stop condition, releases the bus.
    Stop,
    /// Acknowledge the received byte and clock in the next one.
    Ack,
    /// Not-acknowledge the received byte and stop.
    Nack,
}

impl BusCommand {
    /// Encoding for the `MCTRLB` register: ACKACT in bit 2, MCMD in bits [1:0].
    pub const fn mctrlb(self) -> u8 {
        match self {
            BusCommand::Start => 0x01,
            BusCommand::Ack => 0x02,
            BusCommand::Stop => 0x03,
            BusCommand::Nack => 0x04 | 0x03,
        }
    }
}

/// Snapshot of the master status register (`MSTATUS`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MasterStatus(pub u8);

impl MasterStatus {
    pub const READ_IF: u8 = 0x80;
    pub const WRITE_IF: u8 = 0x40;
    pub const CLKHOLD: u8 = 0x20;
    pub const RXACK: u8 = 0x10;
    pub const ARBLOST: u8 = 0x08;
    pub const BUSERR: u8 = 0x04;
    pub const BUSSTATE_MASK: u8 = 0x03;
    pub const BUSSTATE_UNKNOWN: u8 = 0x00;
    pub const BUSSTATE_IDLE: u8 = 0x01;
    pub const BUSSTATE_OWNER: u8 = 0x02;
    pub const BUSSTATE_BUSY: u8 = 0x03;

    pub fn read_complete(self) -> bool {
        self.0 & Self::READ_IF != 0
    }

    pub fn write_complete(self) -> bool {
        self.0 & Self::WRITE_IF != 0
    }

    /// The last transmitted byte (or address) was not acknowledged.
    pub fn nacked(self) -> bool {
        self.0 & Self::RXACK != 0
    }

    /// Arbitration was lost or an illegal bus condition was detected.
    pub fn fault(self) -> bool {
        self.0 & (Self::ARBLOST | Self::BUSERR) != 0
    }

    pub fn bus_state(self) -> BusState {
        match self.0 & Self::BUSSTATE_MASK {
            Self::BUSSTATE_IDLE => BusState::Idle,
            Self::BUSSTATE_OWNER | Self::BUSSTATE_BUSY => BusState::Busy,
            _ => BusState::Error,
        }
    }
}

/// Register-level access to a TWI master peripheral.
pub trait TwiRegisters {
    /// Read `MSTATUS`.
    fn status(&mut self) -> MasterStatus;
    /// Write `MADDR` (address shifted left, R/W in bit 0). Issues a start condition.
    fn set_address(&mut self, address_rw: u8);
    /// Write `MDATA`, starting a byte transmission.
    fn write_data(&mut self, data: u8);
    /// Read `MDATA`.
    fn read_data(&mut self) -> u8;
    /// Write a command to `MCTRLB`.
    fn command(&mut self, cmd: BusCommand);
    /// Force the bus state bits of `MSTATUS` to idle.
    fn force_idle(&mut self);
}

/// Byte-level bus transaction steps.
///
/// Implementations are strictly sequential: a step never overlaps another one.
pub trait Transport {
    /// Send a start (or repeated start) and the address byte.
    fn start(&mut self, address: u8, direction: Direction) -> Result<(), BusError>;
    /// Transmit one byte and check it was acknowledged.
    fn write_byte(&mut self, data: u8) -> Result<(), BusError>;
    /// Receive one byte. `send_ack == false` ends the read with NACK + stop.
    fn read_byte(&mut self, send_ack: bool) -> Result<u8, BusError>;
    /// Release the bus and wait for it to become idle.
    fn stop(&mut self) -> Result<(), BusError>;
    /// Bring the bus back to idle after a failed step.
    fn recover(&mut self);
    /// Current bus state, `Error` after a failed step until [`Transport::recover`].
    fn bus_state(&mut self) -> BusState;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Addressing,
    DataPhase,
    /// NACK + stop already issued by the last read.
    Stopping,
    Error,
}

/// Polling TWI master built on a [`TwiRegisters`] implementation.
#[derive(Debug)]
pub struct Twi<R> {
    regs: R,
    timeout_polls: u16,
    phase: Phase,
}

impl<R: TwiRegisters> Twi<R> {
    /// Takes over the peripheral and forces its bus state to idle.
    ///
    /// The master powers up with the bus state unknown, which would make the
    /// first `start()` fail.
    pub fn new(mut regs: R) -> Self {
        regs.force_idle();
        Twi {
            regs,
            timeout_polls: DEFAULT_TIMEOUT_POLLS,
            phase: Phase::Idle,
        }
    }

    /// Overrides the number of status polls allowed per wait.
    pub fn with_timeout(mut self, polls: u16) -> Self {
        self.timeout_polls = polls;
        self
    }

    /// Gives back the peripheral.
    pub fn release(self) -> R {
        self.regs
    }

    fn wait_for(&mut self, ready: impl Fn(MasterStatus) -> bool) -> Result<MasterStatus, BusError> {
        for _ in 0..self.timeout_polls {
            let status = self.regs.status();
            if ready(status) {
                return Ok(status);
            }
        }
        Err(BusError::Timeout)
    }

    fn fail(&mut self, err: BusError) -> BusError {
        debug!("bus step failed: {}", err);
        self.phase = Phase::Error;
        err
    }
}

impl<R: TwiRegisters> Transport for Twi<R> {
    fn start(&mut self, address: u8, direction: Direction) -> Result<(), BusError> {
        match self.phase {
            Phase::Error => return Err(BusError::BusWedged),
            Phase::Idle | Phase::Stopping => {
                if self.regs.status().bus_state() != BusState::Idle {
                    return Err(self.fail(BusError::BusWedged));
                }
            }
            // Repeated start inside a running transaction.
            Phase::Addressing | Phase::DataPhase => {}
        }

        self.phase = Phase::Addressing;
        self.regs.set_address((address << 1) | direction as u8);

        let status = self
            .wait_for(|s| s.read_complete() || s.write_complete())
            .map_err(|e| self.fail(e))?;

        if status.fault() {
            return Err(self.fail(BusError::BusWedged));
        }
        if status.nacked() {
            return Err(self.fail(BusError::NoAck));
        }

        self.phase = Phase::DataPhase;
        Ok(())
    }

    fn write_byte(&mut self, data: u8) -> Result<(), BusError> {
        self.regs.write_data(data);

        let status = self
            .wait_for(|s| s.write_complete())
            .map_err(|e| self.fail(e))?;

        if status.fault() {
            return Err(self.fail(BusError::BusWedged));
        }
        if status.nacked() {
            return Err(self.fail(BusError::NoAck));
        }
        Ok(())
    }

    fn read_byte(&mut self, send_ack: bool) -> Result<u8, BusError> {
        let status = self
            .wait_for(|s| s.read_complete())
            .map_err(|e| self.fail(e))?;

        if status.fault() {
            return Err(self.fail(BusError::BusWedged));
        }

        let data = self.regs.read_data();
        if send_ack {
            self.regs.command(BusCommand::Ack);
        } else {
            self.regs.command(BusCommand::Nack);
            self.phase = Phase::Stopping;
        }
        Ok(data)
    }

    fn stop(&mut self) -> Result<(), BusError> {
        if self.phase != Phase::Stopping {
            self.regs.command(BusCommand::Stop);
        }

        match self.wait_for(|s| s.bus_state() == BusState::Idle) {
            Ok(_) => {
                self.phase = Phase::Idle;
                Ok(())
            }
            Err(_) => Err(self.fail(BusError::BusWedged)),
        }
    }

    fn recover(&mut self) {
        // Whatever was in flight is abandoned.
        self.phase = Phase::Idle;

        if self.regs.status().bus_state() != BusState::Idle {
            warn!("forcing two-wire bus back to idle");
            self.regs.command(BusCommand::Stop);
            self.regs.force_idle();
        }
    }

    fn bus_state(&mut self) -> BusState {
        if self.phase == Phase::Error {
            return BusState::Error;
        }
        self.regs.status().bus_state()
    }
}
