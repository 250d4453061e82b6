use crate::access::DEFAULT_ATTEMPTS;
use crate::registers;
use crate::Milliseconds;

/// Oversampling settings for temperature, pressure and humidity.
///
/// Higher rates average more internal samples per reading. That lowers noise
/// but lengthens the conversion and raises self-heating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Oversampling {
    /// Channel disabled.
    Skipped = 0,
    #[default]
    X1 = 1,
    X2 = 2,
    X4 = 3,
    X8 = 4,
    X16 = 5,
}

/// Oversampling for the three environmental channels.
///
/// Only temperature is compensated by this driver; the other two channels
/// default to `Skipped` so the conversion stays short.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OversamplingConfig {
    pub temp_osrs: Oversampling,
    pub hum_osrs: Oversampling,
    pub pres_osrs: Oversampling,
}

impl Default for OversamplingConfig {
    fn default() -> Self {
        OversamplingConfig {
            temp_osrs: Oversampling::X1,
            hum_osrs: Oversampling::Skipped,
            pres_osrs: Oversampling::Skipped,
        }
    }
}

impl OversamplingConfig {
    /// `ctrl_meas` value: osrs_t in [7:5], osrs_p in [4:2], mode in [1:0].
    pub fn ctrl_meas(&self, mode: u8) -> u8 {
        ((self.temp_osrs as u8) << 5) | ((self.pres_osrs as u8) << 2) | (mode & 0x03)
    }

    /// `ctrl_hum` value: osrs_h in [2:0].
    pub fn ctrl_hum(&self) -> u8 {
        self.hum_osrs as u8
    }
}

/// How to treat an unexpected chip identifier during `init()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChipIdPolicy {
    /// Do not read the identifier at all.
    Skip,
    /// Report a mismatch on the debug channel and carry on.
    #[default]
    Advisory,
    /// Fail `init()` on a mismatch.
    Strict,
}

/// Driver configuration.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// 7-bit bus address of the sensor.
    pub address: u8,
    pub osrs_config: OversamplingConfig,
    /// Minimum time between two measurements that touch the bus.
    pub measurement_interval: Milliseconds,
    /// Delay between two reads of the status register while a conversion runs.
    pub poll_interval: Milliseconds,
    /// Status reads before a conversion is declared stuck.
    pub max_poll_attempts: u8,
    /// Delay after the soft reset before the device answers again.
    pub wake_delay: Milliseconds,
    /// Attempts per register transaction.
    pub access_attempts: u8,
    pub chip_id_policy: ChipIdPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            address: registers::DEVICE_ADDR_PRIMARY,
            osrs_config: OversamplingConfig::default(),
            measurement_interval: Milliseconds(10_000),
            poll_interval: Milliseconds(10),
            max_poll_attempts: 50,
            wake_delay: Milliseconds(2),
            access_attempts: DEFAULT_ATTEMPTS,
            chip_id_policy: ChipIdPolicy::Advisory,
        }
    }
}

/// Builder for [`Config`], starting from the defaults.
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Starts from [`Config::default`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the 7-bit bus address.
    pub fn address(mut self, address: u8) -> Self {
        self.config.address = address;
        self
    }

    /// Sets the temperature oversampling.
    pub fn temp_oversampling(mut self, os: Oversampling) -> Self {
        self.config.osrs_config.temp_osrs = os;
        self
    }

    /// Sets the humidity oversampling.
    pub fn hum_oversampling(mut self, os: Oversampling) -> Self {
        self.config.osrs_config.hum_osrs = os;
        self
    }

    /// Sets the pressure oversampling.
    pub fn pres_oversampling(mut self, os: Oversampling) -> Self {
        self.config.osrs_config.pres_osrs = os;
        self
    }

    /// Sets the minimum time between two measurements.
    pub fn measurement_interval(mut self, interval: Milliseconds) -> Self {
        self.config.measurement_interval = interval;
        self
    }

    /// Sets the delay between status polls during a conversion.
    pub fn poll_interval(mut self, interval: Milliseconds) -> Self {
        self.config.poll_interval = interval;
        self
    }

    /// Sets how many status polls a conversion may take.
    pub fn max_poll_attempts(mut self, attempts: u8) -> Self {
        self.config.max_poll_attempts = attempts;
        self
    }

    /// Sets the delay after the soft reset.
    pub fn wake_delay(mut self, delay: Milliseconds) -> Self {
        self.config.wake_delay = delay;
        self
    }

    /// Sets the attempts per register transaction (at least one is made).
    pub fn access_attempts(mut self, attempts: u8) -> Self {
        self.config.access_attempts = attempts;
        self
    }

    /// Sets how an unexpected chip identifier is handled.
    pub fn chip_id_policy(mut self, policy: ChipIdPolicy) -> Self {
        self.config.chip_id_policy = policy;
        self
    }

    /// Returns the finished configuration.
    pub fn build(self) -> Config {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ctrl_meas_packs_oversampling_and_mode() {
        let osrs = OversamplingConfig::default();
        assert_eq!(osrs.ctrl_meas(registers::MODE_SLEEP), 0x20);
        assert_eq!(osrs.ctrl_meas(registers::MODE_FORCED), 0x21);

        let osrs = OversamplingConfig {
            temp_osrs: Oversampling::X1,
            hum_osrs: Oversampling::X2,
            pres_osrs: Oversampling::X1,
        };
        assert_eq!(osrs.ctrl_meas(registers::MODE_FORCED), 0x25);
        assert_eq!(osrs.ctrl_hum(), 0x02);
    }

    #[test]
    fn builder_overrides_defaults() {
        let config = ConfigBuilder::new()
            .address(registers::DEVICE_ADDR_SECONDARY)
            .temp_oversampling(Oversampling::X16)
            .measurement_interval(Milliseconds(1_000))
            .chip_id_policy(ChipIdPolicy::Strict)
            .build();

        assert_eq!(config.address, 0x77);
        assert_eq!(config.osrs_config.temp_osrs, Oversampling::X16);
        assert_eq!(config.measurement_interval.0, 1_000);
        assert_eq!(config.poll_interval.0, 10);
        assert_eq!(config.access_attempts, 3);
        assert_eq!(config.chip_id_policy, ChipIdPolicy::Strict);
    }
}
