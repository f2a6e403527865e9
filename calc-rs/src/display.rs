//! Presentation helpers for numeric results.
//!
//! The core never rounds; callers that show a value to a person pass it
//! through [`round_to`] first to hide floating-point noise such as
//! `0.1 + 0.2 = 0.30000000000000004`.

/// Decimal places used when no configuration overrides it.
pub const DEFAULT_PRECISION: u32 = 8;

/// Largest accepted precision; `10^15` is still exact in an `f64`.
pub const MAX_PRECISION: u32 = 15;

/// Round `value` to `places` decimal places.
///
/// Halves round toward positive infinity (`-2.5 → -2`, `2.5 → 3`).  Values
/// that are not finite, or so large that scaling them would overflow, are
/// returned unchanged.
pub fn round_to(value: f64, places: u32) -> f64 {
    let scale = 10f64.powi(places.min(MAX_PRECISION) as i32);
    let scaled = value * scale;
    if !scaled.is_finite() {
        return value;
    }
    let rounded = (scaled + 0.5).floor() / scale;
    // keep `-0.4e-9` from turning into `-0`
    if rounded == 0.0 { 0.0 } else { rounded }
}

/// Magnitudes from here up print in exponent form.
const EXP_UPPER: f64 = 1e21;

/// Magnitudes below this print in exponent form.
const EXP_LOWER: f64 = 1e-6;

/// Render a number the way a calculator display would.
///
/// Integral values print without a fractional part, negative zero prints as
/// `0`, and non-finite values are spelled out.  Magnitudes of `1e21` and up
/// or below `1e-6` use exponent form with a signed exponent (`1e+300`,
/// `1.5e-7`), as a browser would show them.
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_owned()
    } else if value.is_infinite() {
        if value > 0.0 { "Infinity" } else { "-Infinity" }.to_owned()
    } else if value == 0.0 {
        "0".to_owned()
    } else if value.abs() >= EXP_UPPER || value.abs() < EXP_LOWER {
        let s = format!("{value:e}");
        match s.split_once('e') {
            Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
            _ => s,
        }
    } else {
        value.to_string()
    }
}

/// [`round_to`] followed by [`format_number`].
pub fn format_rounded(value: f64, places: u32) -> String {
    format_number(round_to(value, places))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_float_noise() {
        assert_eq!(round_to(0.1 + 0.2, 8), 0.3);
        assert_eq!(format_rounded(0.1 + 0.2, 8), "0.3");
    }

    #[test]
    fn halves_round_up() {
        assert_eq!(round_to(2.5, 0), 3.0);
        assert_eq!(round_to(-2.5, 0), -2.0);
        assert_eq!(round_to(0.125, 2), 0.13);
    }

    #[test]
    fn tiny_negative_rounds_to_plain_zero() {
        let r = round_to(-1e-12, 8);
        assert_eq!(r, 0.0);
        assert!(r.is_sign_positive());
    }

    #[test]
    fn huge_values_pass_through() {
        assert_eq!(round_to(1e305, 8), 1e305);
        assert!(round_to(f64::INFINITY, 8).is_infinite());
        assert!(round_to(f64::NAN, 8).is_nan());
    }

    #[test]
    fn integers_have_no_fraction() {
        assert_eq!(format_number(5.0), "5");
        assert_eq!(format_number(-8.0), "-8");
        assert_eq!(format_number(0.5), "0.5");
    }

    #[test]
    fn special_values() {
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(f64::INFINITY), "Infinity");
        assert_eq!(format_number(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(format_number(f64::NAN), "NaN");
    }

    #[test]
    fn exponent_form_at_the_extremes() {
        assert_eq!(format_number(1e300), "1e+300");
        assert_eq!(format_number(1e21), "1e+21");
        assert_eq!(format_number(-2.5e22), "-2.5e+22");
        assert_eq!(format_number(1e-7), "1e-7");
        assert_eq!(format_number(-1.5e-7), "-1.5e-7");
        assert_eq!(format_number(f64::MIN_POSITIVE), "2.2250738585072014e-308");
    }

    #[test]
    fn plain_form_in_between() {
        assert_eq!(format_number(1e20), "100000000000000000000");
        assert_eq!(format_number(0.000001), "0.000001");
        assert_eq!(format_number(123456.789), "123456.789");
    }

    #[test]
    fn precision_is_clamped() {
        assert_eq!(round_to(1.5, 40), 1.5);
    }
}
