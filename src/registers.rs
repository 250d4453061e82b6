//! BME680 register map (datasheet section 5.2).

/// Default 7-bit device address (SDO tied to GND).
pub const DEVICE_ADDR_PRIMARY: u8 = 0x76;
/// Alternative 7-bit device address (SDO tied to VDDIO).
pub const DEVICE_ADDR_SECONDARY: u8 = 0x77;

pub const ADDR_CHIP_ID: u8 = 0xD0;
pub const CHIP_ID: u8 = 0x61;

pub const ADDR_SOFT_RESET: u8 = 0xE0;
pub const SOFT_RESET_CMD: u8 = 0xB6;

pub const ADDR_CTRL_GAS_1: u8 = 0x71;
pub const ADDR_CTRL_HUM: u8 = 0x72;
pub const ADDR_CTRL_MEAS: u8 = 0x74;

/// `ctrl_meas` mode bits [1:0].
pub const MODE_SLEEP: u8 = 0b00;
pub const MODE_FORCED: u8 = 0b01;

pub const ADDR_MEAS_STATUS_0: u8 = 0x1D;
/// Set while a conversion is running.
pub const STATUS_MEASURING: u8 = 0x20;

pub const ADDR_TEMP_MSB: u8 = 0x22;
pub const ADDR_TEMP_LSB: u8 = 0x23;
pub const ADDR_TEMP_XLSB: u8 = 0x24;

/// Calibration coefficient locations.
pub mod calib {
    pub const T1_LSB: u8 = 0xE9;
    pub const T1_MSB: u8 = 0xEA;
    pub const T2_LSB: u8 = 0x8A;
    pub const T2_MSB: u8 = 0x8B;
    pub const T3: u8 = 0x8C;

    pub const P1_LSB: u8 = 0x8E;
    pub const P1_MSB: u8 = 0x8F;
    pub const P2_LSB: u8 = 0x90;
    pub const P2_MSB: u8 = 0x91;
    pub const P3: u8 = 0x92;
    pub const P4_LSB: u8 = 0x94;
    pub const P4_MSB: u8 = 0x95;
    pub const P5_LSB: u8 = 0x96;
    pub const P5_MSB: u8 = 0x97;
    pub const P7: u8 = 0x98;
    pub const P6: u8 = 0x99;
    pub const P8_LSB: u8 = 0x9C;
    pub const P8_MSB: u8 = 0x9D;
    pub const P9_LSB: u8 = 0x9E;
    pub const P9_MSB: u8 = 0x9F;
    pub const P10: u8 = 0xA0;

    /// H2 bits [11:4].
    pub const H2_MSB: u8 = 0xE1;
    /// Shared: H1 bits [3:0] in the low nibble, H2 bits [3:0] in the high nibble.
    pub const H1_H2_LSB: u8 = 0xE2;
    /// H1 bits [11:4].
    pub const H1_MSB: u8 = 0xE3;
    pub const H3: u8 = 0xE4;
    pub const H4: u8 = 0xE5;
    pub const H5: u8 = 0xE6;
    pub const H6: u8 = 0xE7;
    pub const H7: u8 = 0xE8;
}
