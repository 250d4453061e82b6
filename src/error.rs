//! Error types for each layer of the driver.
//!
//! Errors flow upwards: a [`BusError`] from a single transfer step is retried
//! inside the register access layer and only surfaces as an [`AccessError`]
//! once the retry budget is spent. The controller wraps those into
//! [`InitError`] or [`MeasureError`] depending on the phase that failed.

use embedded_hal::i2c::{self, ErrorKind, NoAcknowledgeSource};

/// Failure of a single bus step (start, byte transfer or stop).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// The addressed device (or the receiver of a data byte) answered with NACK.
    NoAck,
    /// The bounded wait for the peripheral flags expired.
    Timeout,
    /// The bus did not return to idle, or was not idle when a transaction began.
    BusWedged,
}

impl i2c::Error for BusError {
    fn kind(&self) -> ErrorKind {
        match self {
            BusError::NoAck => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Unknown),
            BusError::Timeout => ErrorKind::Other,
            BusError::BusWedged => ErrorKind::Bus,
        }
    }
}

/// Failure of a whole register transaction after retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AccessError {
    /// Every attempt failed. Carries the register and the error of the last attempt.
    Exhausted { register: u8, last: BusError },
}

impl AccessError {
    /// The bus error reported by the final attempt.
    pub fn last_bus_error(&self) -> BusError {
        match self {
            AccessError::Exhausted { last, .. } => *last,
        }
    }
}

/// Reasons `init()` can fail. All of them leave the controller in `Failed`,
/// except [`InitError::InvalidState`] which does not touch the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InitError {
    /// The soft-reset command was not accepted (typically no device on the bus).
    Reset(AccessError),
    /// The chip identifier register could not be read.
    ChipIdRead(AccessError),
    /// The chip identifier did not match and the chip-id policy is strict.
    ChipIdMismatch { expected: u8, found: u8 },
    /// Writing the oversampling or gas control registers failed.
    Configure(AccessError),
    /// One of the calibration registers could not be read.
    CalibrationReadFailure(AccessError),
    /// `init()` was called on a controller that is not `Uninitialized`.
    InvalidState,
}

/// Reasons a measurement cycle can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MeasureError {
    /// The controller has not completed `init()` (or it failed).
    NotReady,
    /// The measuring bit did not clear within the poll budget.
    MeasurementTimeout,
    /// A register transaction failed after retries.
    Access(AccessError),
}

impl From<AccessError> for MeasureError {
    fn from(err: AccessError) -> Self {
        MeasureError::Access(err)
    }
}
