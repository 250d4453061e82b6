//! Factory calibration coefficients.

use crate::access::RegisterAccess;
use crate::error::AccessError;
use crate::registers::calib;
use crate::transport::Transport;

/// Factory-fused calibration coefficients read from the sensor.
///
/// These are unique to every chip. The temperature set feeds
/// [`calc_temperature`](crate::calc::calc_temperature); the pressure and
/// humidity sets are loaded for completeness but not compensated.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationCoefficients {
    pub par_t1: u16,
    pub par_t2: i16,
    pub par_t3: i8,
    pub par_p1: u16,
    pub par_p2: i16,
    pub par_p3: i8,
    pub par_p4: i16,
    pub par_p5: i16,
    pub par_p6: i8,
    pub par_p7: i8,
    pub par_p8: i16,
    pub par_p9: i16,
    pub par_p10: u8,
    pub par_h1: u16,
    pub par_h2: u16,
    pub par_h3: i8,
    pub par_h4: i8,
    pub par_h5: i8,
    pub par_h6: u8,
    pub par_h7: i8,
}

/// Reads the full coefficient set, one register at a time.
///
/// Any register that still fails after retries aborts the whole load.
pub fn load_calibration<T: Transport>(
    access: &mut RegisterAccess<T>,
) -> Result<CalibrationCoefficients, AccessError> {
    let mut word = |lsb: u8, msb: u8| -> Result<u16, AccessError> {
        let lo = access.read_register(lsb)?;
        let hi = access.read_register(msb)?;
        Ok(u16::from_le_bytes([lo, hi]))
    };

    let par_t1 = word(calib::T1_LSB, calib::T1_MSB)?;
    let par_t2 = word(calib::T2_LSB, calib::T2_MSB)? as i16;
    let par_p1 = word(calib::P1_LSB, calib::P1_MSB)?;
    let par_p2 = word(calib::P2_LSB, calib::P2_MSB)? as i16;
    let par_p4 = word(calib::P4_LSB, calib::P4_MSB)? as i16;
    let par_p5 = word(calib::P5_LSB, calib::P5_MSB)? as i16;
    let par_p8 = word(calib::P8_LSB, calib::P8_MSB)? as i16;
    let par_p9 = word(calib::P9_LSB, calib::P9_MSB)? as i16;

    let mut byte = |reg: u8| access.read_register(reg);

    let par_t3 = byte(calib::T3)? as i8;
    let par_p3 = byte(calib::P3)? as i8;
    let par_p6 = byte(calib::P6)? as i8;
    let par_p7 = byte(calib::P7)? as i8;
    let par_p10 = byte(calib::P10)?;

    // H1 and H2 are 12-bit values sharing the nibbles of one register.
    let h2_msb = byte(calib::H2_MSB)?;
    let h_lsb = byte(calib::H1_H2_LSB)?;
    let h1_msb = byte(calib::H1_MSB)?;
    let par_h1 = ((h1_msb as u16) << 4) | (h_lsb & 0x0F) as u16;
    let par_h2 = ((h2_msb as u16) << 4) | (h_lsb >> 4) as u16;

    let par_h3 = byte(calib::H3)? as i8;
    let par_h4 = byte(calib::H4)? as i8;
    let par_h5 = byte(calib::H5)? as i8;
    let par_h6 = byte(calib::H6)?;
    let par_h7 = byte(calib::H7)? as i8;

    Ok(CalibrationCoefficients {
        par_t1,
        par_t2,
        par_t3,
        par_p1,
        par_p2,
        par_p3,
        par_p4,
        par_p5,
        par_p6,
        par_p7,
        par_p8,
        par_p9,
        par_p10,
        par_h1,
        par_h2,
        par_h3,
        par_h4,
        par_h5,
        par_h6,
        par_h7,
    })
}
