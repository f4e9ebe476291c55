//! Readout formatting
//!
//! All conversions stay in fixed-point integer arithmetic (×100) so the
//! displayed values truncate exactly like the sensor decoding does.
//! Formatted text lives in fixed-capacity `heapless` strings to avoid heap
//! allocations during rendering.

use core::fmt::Write;

use heapless::String;

/// Capacity of a single readout field
pub const MAX_READOUT_LENGTH: usize = 12;

pub type ReadoutString = String<MAX_READOUT_LENGTH>;

/// °C × 100 to °F × 100: F = C × 9/5 + 32
pub const fn celsius_x100_to_fahrenheit_x100(temp_c_x100: i16) -> i32 {
    temp_c_x100 as i32 * 9 / 5 + 3200
}

/// CO2 concentration as a plain integer, e.g. `"800"`
pub fn format_co2(co2_ppm: u16) -> ReadoutString {
    let mut s = String::new();
    let _ = write!(s, "{}", co2_ppm);
    s
}

/// Temperature in Fahrenheit with one decimal, e.g. `"51.9F"`
pub fn format_fahrenheit(temp_c_x100: i16) -> ReadoutString {
    let temp_f_x100 = celsius_x100_to_fahrenheit_x100(temp_c_x100);
    let sign = if temp_f_x100 < 0 { "-" } else { "" };
    let magnitude = temp_f_x100.unsigned_abs();

    let mut s = String::new();
    let _ = write!(
        s,
        "{}{}.{}F",
        sign,
        magnitude / 100,
        (magnitude % 100) / 10
    );
    s
}

/// Relative humidity as a whole percentage, e.g. `"42%RH"`
pub fn format_humidity(rh_x100: i16) -> ReadoutString {
    let mut s = String::new();
    let _ = write!(s, "{}%RH", rh_x100 / 100);
    s
}

/// Graph axis label for a scaled CO2 value
pub fn format_axis_label(value: u32) -> ReadoutString {
    let mut s = String::new();
    let _ = write!(s, "{}", value);
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fahrenheit_conversion() {
        assert_eq!(celsius_x100_to_fahrenheit_x100(0), 3200);
        assert_eq!(celsius_x100_to_fahrenheit_x100(10000), 21200);
        assert_eq!(celsius_x100_to_fahrenheit_x100(-4000), -4000);
        // 11.07 °C = 51.926 °F, truncated
        assert_eq!(celsius_x100_to_fahrenheit_x100(1107), 5192);
    }

    #[test]
    fn test_format_fahrenheit() {
        assert_eq!(format_fahrenheit(1107).as_str(), "51.9F");
        assert_eq!(format_fahrenheit(2000).as_str(), "68.0F");
        assert_eq!(format_fahrenheit(-4500).as_str(), "-49.0F");
    }

    #[test]
    fn test_format_fahrenheit_keeps_sign_between_zero_and_minus_one() {
        // −18.06 °C = −0.508 °F
        assert_eq!(celsius_x100_to_fahrenheit_x100(-1806), -50);
        assert_eq!(format_fahrenheit(-1806).as_str(), "-0.5F");
    }

    #[test]
    fn test_format_co2_and_humidity() {
        assert_eq!(format_co2(800).as_str(), "800");
        assert_eq!(format_co2(40000).as_str(), "40000");
        assert_eq!(format_humidity(4272).as_str(), "42%RH");
        assert_eq!(format_humidity(9999).as_str(), "99%RH");
        assert_eq!(format_axis_label(850).as_str(), "850");
    }
}
