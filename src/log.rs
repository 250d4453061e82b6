//! Debug text channel.
//!
//! The driver reports progress (calibration dump, chip-id warnings,
//! measurement failures) through a [`Logger`]. Nothing in the protocol path
//! depends on it; [`NoopLogger`] drops everything.

use crate::Temperature;

/// Byte/string sink, typically a UART transmitter.
pub trait Logger {
    fn write_str(&mut self, text: &str);
    fn write_byte(&mut self, byte: u8);
}

impl<L: Logger + ?Sized> Logger for &mut L {
    fn write_str(&mut self, text: &str) {
        (**self).write_str(text)
    }

    fn write_byte(&mut self, byte: u8) {
        (**self).write_byte(byte)
    }
}

/// Discards all output.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLogger;

impl Logger for NoopLogger {
    fn write_str(&mut self, _text: &str) {}

    fn write_byte(&mut self, _byte: u8) {}
}

/// Adapts any [`core::fmt::Write`] implementation. Write errors are dropped.
///
/// Single bytes are taken as ASCII; anything above 0x7F is written as
/// `U+FFFD`.
#[derive(Debug, Default)]
pub struct FmtLogger<W>(pub W);

impl<W: core::fmt::Write> Logger for FmtLogger<W> {
    fn write_str(&mut self, text: &str) {
        let _ = self.0.write_str(text);
    }

    fn write_byte(&mut self, byte: u8) {
        let ch = if byte.is_ascii() {
            byte as char
        } else {
            char::REPLACEMENT_CHARACTER
        };
        let _ = self.0.write_char(ch);
    }
}

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Four upper-case hex digits, no prefix.
pub fn write_hex_u16(log: &mut impl Logger, value: u16) {
    for shift in [12, 8, 4, 0] {
        log.write_byte(HEX_DIGITS[((value >> shift) & 0x0F) as usize]);
    }
}

/// Sign followed by the magnitude in hex, e.g. `-282C`.
pub fn write_hex_i16(log: &mut impl Logger, value: i16) {
    if value < 0 {
        log.write_byte(b'-');
    }
    write_hex_u16(log, value.unsigned_abs());
}

/// Unsigned decimal without leading zeros.
pub fn write_decimal(log: &mut impl Logger, value: u32) {
    let mut digits = [0u8; 10];
    let mut len = 0;
    let mut rest = value;
    loop {
        digits[len] = b'0' + (rest % 10) as u8;
        len += 1;
        rest /= 10;
        if rest == 0 {
            break;
        }
    }
    for digit in digits[..len].iter().rev() {
        log.write_byte(*digit);
    }
}

/// Formats hundredths of a degree as `23.50` / `-0.65`.
pub fn write_centi_celsius(log: &mut impl Logger, centi: i16) {
    let (whole, fraction) = Temperature(centi).split();
    if centi < 0 {
        log.write_byte(b'-');
    }
    write_decimal(log, whole.unsigned_abs() as u32);
    log.write_byte(b'.');
    let fraction = fraction.unsigned_abs() as u8;
    log.write_byte(b'0' + fraction / 10);
    log.write_byte(b'0' + fraction % 10);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(f: impl FnOnce(&mut FmtLogger<String>)) -> String {
        let mut log = FmtLogger(String::new());
        f(&mut log);
        log.0
    }

    #[test]
    fn hex_words() {
        assert_eq!(render(|l| write_hex_u16(l, 0x66E6)), "66E6");
        assert_eq!(render(|l| write_hex_u16(l, 0x000A)), "000A");
        assert_eq!(render(|l| write_hex_i16(l, -10284)), "-282C");
        assert_eq!(render(|l| write_hex_i16(l, i16::MIN)), "-8000");
    }

    #[test]
    fn decimals() {
        assert_eq!(render(|l| write_decimal(l, 0)), "0");
        assert_eq!(render(|l| write_decimal(l, 4_294_967_295)), "4294967295");
    }

    #[test]
    fn temperatures() {
        assert_eq!(render(|l| write_centi_celsius(l, 2496)), "24.96");
        assert_eq!(render(|l| write_centi_celsius(l, 705)), "7.05");
        assert_eq!(render(|l| write_centi_celsius(l, -65)), "-0.65");
        assert_eq!(render(|l| write_centi_celsius(l, -1234)), "-12.34");
    }

    #[test]
    fn non_ascii_bytes_are_replaced() {
        let out = render(|l| {
            l.write_byte(b'T');
            l.write_byte(0xB0);
            l.write_byte(b'C');
        });
        assert_eq!(out, "T\u{FFFD}C");
    }

    #[test]
    fn noop_logger_accepts_everything() {
        let mut log = NoopLogger;
        log.write_str("ignored");
        write_centi_celsius(&mut log, 100);
    }
}
