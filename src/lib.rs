#![cfg_attr(not(test), no_std)]

//! # BME680 two-wire temperature driver
//!
//! A blocking, `no_std` driver for the Bosch BME680 that talks to the sensor
//! through a byte-level two-wire [`Transport`] rather than a packaged I²C
//! HAL. It owns the full transaction sequencing: every wait on the bus is
//! bounded, a wedged bus is forced back to idle, and transient failures are
//! retried a fixed number of times before they reach the caller.
//!
//! ## Features
//! - **Bounded bus waits** with explicit `NoAck`, `Timeout` and `BusWedged` errors.
//! - **Fixed-point compensation**: no FPU required.
//! - **Rate limiting**: measurements closer together than the configured
//!   interval return `None` without touching the bus.
//! - **Injectable debug channel** through the [`Logger`] port.
//!
//! ## Units
//! - **Temperature**: Centigrade (C * 100) -> 2350 = 23.50 °C
//!
//! ## Usage
//!
//! ```ignore
//! static MILLIS: MillisCounter = MillisCounter::new();
//!
//! let twi = Twi::new(board_twi_registers);
//! let mut bme680 = Bme680::new(twi, &MILLIS, Config::default());
//! bme680.init(&mut delay)?;
//!
//! loop {
//!     if let Some(centi) = bme680.read_temperature(&mut delay) {
//!         // 2496 = 24.96 °C
//!     }
//! }
//! ```

mod fmt;

pub mod access;
pub mod calc;
pub mod calibration;
pub mod clock;
pub mod error;
pub mod log;
pub mod registers;
pub mod settings;
pub mod transport;

use embedded_hal::delay::DelayNs;

pub use access::RegisterAccess;
pub use calc::{calc_temperature, CalcTempData};
pub use calibration::{load_calibration, CalibrationCoefficients};
pub use clock::{Clock, MillisCounter};
pub use error::{AccessError, BusError, InitError, MeasureError};
pub use log::{FmtLogger, Logger, NoopLogger};
pub use settings::{ChipIdPolicy, Config, ConfigBuilder, Oversampling, OversamplingConfig};
pub use transport::{BusCommand, BusState, Direction, MasterStatus, Transport, Twi, TwiRegisters};

/// Duration wrapper for type-safety. Stored in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Milliseconds(pub u32);

/// Represents temperature in Centigrade (degrees Celsius * 100).
///
/// # Example
/// A value of `2350` represents **23.50 °C**.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Temperature(pub i16);

impl Temperature {
    /// Splits the fixed-point value into integral (degrees) and fractional (decimals) parts.
    ///
    /// Both parts carry the sign of the value.
    ///
    /// ```rust
    /// use bme680_twi::Temperature;
    /// assert_eq!(Temperature(2350).split(), (23, 50));
    /// assert_eq!(Temperature(-1234).split(), (-12, -34));
    /// ```
    pub fn split(&self) -> (i16, i16) {
        (self.0 / 100, self.0 % 100)
    }
}

/// Lifecycle of the sensor controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorState {
    Uninitialized,
    Resetting,
    ReadingCalibration,
    Ready,
    Measuring,
    /// `init()` failed. Terminal for this instance.
    Failed,
}

/// The BME680 sensor controller.
///
/// Owns the register access layer, the calibration coefficients and the
/// rate limiter. Construct with [`Bme680::new`], then call [`Bme680::init`]
/// once before reading.
pub struct Bme680<T, C, L = NoopLogger> {
    access: RegisterAccess<T>,
    clock: C,
    logger: L,
    config: Config,
    state: SensorState,
    calib: Option<CalibrationCoefficients>,
    /// Clock value of the last measurement that went to the bus.
    last_measurement: Option<u32>,
}

impl<T, C> Bme680<T, C, NoopLogger>
where
    T: Transport,
    C: Clock,
{
    /// Creates a new driver instance in the `Uninitialized` state.
    ///
    /// This does not communicate with the sensor yet.
    pub fn new(transport: T, clock: C, config: Config) -> Self {
        Bme680 {
            access: RegisterAccess::new(transport, config.address)
                .with_attempts(config.access_attempts),
            clock,
            logger: NoopLogger,
            config,
            state: SensorState::Uninitialized,
            calib: None,
            last_measurement: None,
        }
    }
}

impl<T, C, L> Bme680<T, C, L>
where
    T: Transport,
    C: Clock,
    L: Logger,
{
    /// Attaches a debug text channel.
    pub fn with_logger<L2: Logger>(self, logger: L2) -> Bme680<T, C, L2> {
        Bme680 {
            access: self.access,
            clock: self.clock,
            logger,
            config: self.config,
            state: self.state,
            calib: self.calib,
            last_measurement: self.last_measurement,
        }
    }

    pub fn state(&self) -> SensorState {
        self.state
    }

    /// Coefficients read during `init()`, if it succeeded.
    pub fn calibration(&self) -> Option<&CalibrationCoefficients> {
        self.calib.as_ref()
    }

    /// Gives back the transport, e.g. to build a fresh instance after a failed `init()`.
    pub fn release(self) -> T {
        self.access.release()
    }

    /// Resets the sensor, checks its identity, configures the temperature
    /// channel and loads the calibration coefficients.
    ///
    /// Any failure moves the controller to [`SensorState::Failed`]. There is
    /// no automatic retry; a failed instance rejects further `init()` calls
    /// with [`InitError::InvalidState`].
    pub fn init(&mut self, delay: &mut impl DelayNs) -> Result<(), InitError> {
        if self.state != SensorState::Uninitialized {
            return Err(InitError::InvalidState);
        }

        match self.run_init(delay) {
            Ok(calib) => {
                self.calib = Some(calib);
                self.state = SensorState::Ready;
                debug!("bme680 ready");
                Ok(())
            }
            Err(err) => {
                error!("bme680 init failed: {}", err);
                self.logger.write_str("BME680 init failed\r\n");
                self.state = SensorState::Failed;
                Err(err)
            }
        }
    }

    fn run_init(&mut self, delay: &mut impl DelayNs) -> Result<CalibrationCoefficients, InitError> {
        self.state = SensorState::Resetting;
        self.logger.write_str("BME680 reset\r\n");
        self.access
            .write_register(registers::ADDR_SOFT_RESET, registers::SOFT_RESET_CMD)
            .map_err(InitError::Reset)?;

        delay.delay_ms(self.config.wake_delay.0);

        self.check_chip_id()?;
        self.configure().map_err(InitError::Configure)?;

        self.state = SensorState::ReadingCalibration;
        self.logger.write_str("Reading calibration...\r\n");
        let calib =
            load_calibration(&mut self.access).map_err(InitError::CalibrationReadFailure)?;
        self.dump_calibration(&calib);

        Ok(calib)
    }

    fn check_chip_id(&mut self) -> Result<(), InitError> {
        if self.config.chip_id_policy == ChipIdPolicy::Skip {
            return Ok(());
        }

        let found = self
            .access
            .read_register(registers::ADDR_CHIP_ID)
            .map_err(InitError::ChipIdRead)?;

        if found != registers::CHIP_ID {
            warn!("unexpected chip id {=u8:#x}", found);
            self.logger.write_str("Chip ID mismatch: ");
            log::write_hex_u16(&mut self.logger, found as u16);
            self.logger.write_str("\r\n");

            if self.config.chip_id_policy == ChipIdPolicy::Strict {
                return Err(InitError::ChipIdMismatch {
                    expected: registers::CHIP_ID,
                    found,
                });
            }
        }
        Ok(())
    }

    /// Gas heater off, oversampling as configured, sleep mode.
    fn configure(&mut self) -> Result<(), AccessError> {
        let osrs = self.config.osrs_config;
        self.access.write_register(registers::ADDR_CTRL_GAS_1, 0x00)?;
        self.access
            .write_register(registers::ADDR_CTRL_HUM, osrs.ctrl_hum())?;
        self.access.write_register(
            registers::ADDR_CTRL_MEAS,
            osrs.ctrl_meas(registers::MODE_SLEEP),
        )
    }

    fn dump_calibration(&mut self, calib: &CalibrationCoefficients) {
        self.logger.write_str("T1 = ");
        log::write_hex_u16(&mut self.logger, calib.par_t1);
        self.logger.write_str("\r\nT2 = ");
        log::write_hex_i16(&mut self.logger, calib.par_t2);
        self.logger.write_str("\r\nT3 = ");
        log::write_hex_i16(&mut self.logger, calib.par_t3 as i16);
        self.logger.write_str("\r\n");
    }

    /// Starts a forced-mode conversion and polls until the measuring bit clears.
    fn trigger_measurement(&mut self, delay: &mut impl DelayNs) -> Result<(), MeasureError> {
        let ctrl_meas = self.config.osrs_config.ctrl_meas(registers::MODE_FORCED);
        self.access
            .write_register(registers::ADDR_CTRL_MEAS, ctrl_meas)?;

        for _ in 0..self.config.max_poll_attempts {
            let status = self.access.read_register(registers::ADDR_MEAS_STATUS_0)?;
            if status & registers::STATUS_MEASURING == 0 {
                return Ok(());
            }
            delay.delay_ms(self.config.poll_interval.0);
        }

        Err(MeasureError::MeasurementTimeout)
    }

    /// Reads MSB, LSB and XLSB (in that order) and assembles the 20-bit sample.
    fn read_raw_temperature(&mut self) -> Result<u32, MeasureError> {
        let msb = self.access.read_register(registers::ADDR_TEMP_MSB)?;
        let lsb = self.access.read_register(registers::ADDR_TEMP_LSB)?;
        let xlsb = self.access.read_register(registers::ADDR_TEMP_XLSB)?;
        Ok(calc::raw_temperature(msb, lsb, xlsb))
    }

    /// Runs one measurement cycle unless the rate limiter says it is too early.
    ///
    /// Returns `Ok(None)` when rate-limited. A failed cycle still counts as a
    /// measurement for the rate limiter.
    pub fn measure(&mut self, delay: &mut impl DelayNs) -> Result<Option<i16>, MeasureError> {
        let calib = match (self.state, self.calib) {
            (SensorState::Ready, Some(calib)) => calib,
            _ => return Err(MeasureError::NotReady),
        };

        let now = self.clock.now_millis();
        if let Some(last) = self.last_measurement {
            if now.wrapping_sub(last) < self.config.measurement_interval.0 {
                trace!("rate limited, {} ms since last measurement", now.wrapping_sub(last));
                return Ok(None);
            }
        }
        self.last_measurement = Some(now);

        self.state = SensorState::Measuring;
        let raw = self
            .trigger_measurement(delay)
            .and_then(|_| self.read_raw_temperature());
        self.state = SensorState::Ready;

        let temp = calc::calc_temperature(raw?, &calib);
        self.logger.write_str("T:");
        log::write_centi_celsius(&mut self.logger, temp);
        self.logger.write_str("\r\n");

        Ok(Some(temp))
    }

    /// Temperature in hundredths of a degree Celsius.
    ///
    /// `None` when the call is rate-limited, the controller is not ready, or
    /// the measurement failed. Use [`Bme680::measure`] to tell these apart.
    pub fn read_temperature(&mut self, delay: &mut impl DelayNs) -> Option<i16> {
        match self.measure(delay) {
            Ok(reading) => reading,
            Err(err) => {
                warn!("temperature measurement failed: {}", err);
                self.logger.write_str(match err {
                    MeasureError::NotReady => "sensor not ready\r\n",
                    MeasureError::MeasurementTimeout => "measurement timeout\r\n",
                    MeasureError::Access(_) => "bus access failed\r\n",
                });
                None
            }
        }
    }
}
