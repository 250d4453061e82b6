use crate::calibration::CalibrationCoefficients;

/// Intermediate and final values of the temperature compensation.
///
/// `temp_fine` is the accumulator the datasheet feeds into the pressure and
/// humidity formulas; it is exposed for callers that compensate those
/// channels themselves.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CalcTempData {
    pub temp_fine: i32,
    /// Hundredths of a degree Celsius.
    pub temp_comp: i16,
}

/// Assembles the 20-bit temperature ADC value from its three registers.
pub fn raw_temperature(msb: u8, lsb: u8, xlsb: u8) -> u32 {
    ((msb as u32) << 12) | ((lsb as u32) << 4) | ((xlsb as u32) >> 4)
}

/// Runs the datasheet integer compensation and keeps `t_fine`.
///
/// All intermediates are 64-bit so the squared term cannot overflow for any
/// 20-bit input; `var1` is negative below the calibration point. The result
/// saturates at the `i16` range for out-of-range coefficients.
pub fn compensate_temperature(temp_adc: u32, calib: &CalibrationCoefficients) -> CalcTempData {
    let var1 = ((temp_adc as i64) >> 3) - ((calib.par_t1 as i64) << 1);
    let var2 = (var1 * calib.par_t2 as i64) >> 11;
    let var3 = ((var1 >> 1) * (var1 >> 1)) >> 12;
    let var3 = (var3 * ((calib.par_t3 as i64) << 4)) >> 14;
    let temp_fine = (var2 + var3) as i32;

    CalcTempData {
        temp_fine,
        temp_comp: (((temp_fine as i64) * 5 + 128) >> 8)
            .clamp(i16::MIN as i64, i16::MAX as i64) as i16,
    }
}

/// Converts a raw temperature sample into hundredths of a degree Celsius.
pub fn calc_temperature(temp_adc: u32, calib: &CalibrationCoefficients) -> i16 {
    compensate_temperature(temp_adc, calib).temp_comp
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calib(par_t1: u16, par_t2: i16, par_t3: i8) -> CalibrationCoefficients {
        CalibrationCoefficients {
            par_t1,
            par_t2,
            par_t3,
            ..Default::default()
        }
    }

    #[test]
    fn regression_fixture() {
        let c = calib(26342, 26649, 16);
        let result = compensate_temperature(419_430, &c);
        assert_eq!(result.temp_fine, -3332);
        assert_eq!(result.temp_comp, -65);
        assert_eq!(calc_temperature(419_430, &c), -65);
    }

    #[test]
    fn room_temperature_sample() {
        let c = calib(26342, 26649, 16);
        // 0x7A120
        assert_eq!(calc_temperature(500_000, &c), 2496);
    }

    #[test]
    fn repeated_calls_agree() {
        let c = calib(26342, 26649, 16);
        let first = calc_temperature(512_345, &c);
        let second = calc_temperature(512_345, &c);
        assert_eq!(first, second);
    }

    #[test]
    fn no_overflow_at_adc_extremes() {
        let c = calib(u16::MAX, i16::MAX, i8::MAX);
        let low = compensate_temperature(0, &c);
        let high = compensate_temperature(0xF_FFFF, &c);
        assert!(low.temp_fine < 0);
        assert!(high.temp_fine > low.temp_fine);
    }

    #[test]
    fn assembles_twenty_bit_sample() {
        assert_eq!(raw_temperature(0x7A, 0x12, 0x00), 500_000);
        assert_eq!(raw_temperature(0xFF, 0xFF, 0xF0), 0xF_FFFF);
        // Low nibble of XLSB is not part of the sample.
        assert_eq!(raw_temperature(0x00, 0x00, 0x0F), 0);
    }

    #[test]
    fn out_of_range_coefficients_saturate() {
        // t_fine = 2097072 would compensate to +40958.
        let hot = calib(0, i16::MAX, 0);
        assert_eq!(compensate_temperature(0xF_FFFF, &hot).temp_fine, 2_097_072);
        assert_eq!(calc_temperature(0xF_FFFF, &hot), i16::MAX);

        let cold = calib(0, i16::MIN, 0);
        assert_eq!(calc_temperature(0xF_FFFF, &cold), i16::MIN);
    }
}
