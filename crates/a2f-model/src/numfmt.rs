//! C `printf`-compatible rendering of floating point values.
//!
//! The target solver reads fixed-layout decks that were historically written
//! with `%g`, `%e` and `%f` conversions. Rust's formatter has no `%g` and
//! prints exponents without sign or padding, so the conversions are rebuilt
//! here on top of `{:e}` and `{:.*}`.

/// Renders `value` like C's `%{width}.{precision}e` (or `%E` when `upper`).
///
/// # Examples
///
/// ```
/// use a2f_model::numfmt::format_e;
///
/// assert_eq!(format_e(1500.0, 12, 5, true), " 1.50000E+03");
/// assert_eq!(format_e(-0.00025, 0, 5, false), "-2.50000e-04");
/// ```
pub fn format_e(value: f64, width: usize, precision: usize, upper: bool) -> String {
    pad(exponential(value, precision, upper), width)
}

/// Renders `value` like C's `%{width}.{precision}f`.
pub fn format_f(value: f64, width: usize, precision: usize) -> String {
    if !value.is_finite() {
        return pad(non_finite(value, false), width);
    }
    pad(format!("{value:.precision$}"), width)
}

/// Renders `value` like C's `%{width}.{precision}g` (or `%G` when `upper`).
///
/// A precision of zero is treated as one. Trailing zeros in the fraction are
/// removed, along with the decimal point if nothing follows it.
///
/// # Examples
///
/// ```
/// use a2f_model::numfmt::format_g;
///
/// assert_eq!(format_g(0.5, 12, 6, true), "         0.5");
/// assert_eq!(format_g(1.0e-5, 0, 6, true), "1E-05");
/// assert_eq!(format_g(123456789.0, 0, 8, false), "1.2345679e+08");
/// ```
pub fn format_g(value: f64, width: usize, precision: usize, upper: bool) -> String {
    if !value.is_finite() {
        return pad(non_finite(value, upper), width);
    }
    let precision = precision.max(1);
    let exponent = decimal_exponent(value, precision - 1);
    let body = if exponent < -4 || exponent >= precision as i32 {
        let text = exponential(value, precision - 1, upper);
        match text.split_once(if upper { 'E' } else { 'e' }) {
            Some((mantissa, exp)) => {
                format!("{}{}{}", strip_zeros(mantissa), if upper { 'E' } else { 'e' }, exp)
            }
            None => text,
        }
    } else {
        let decimals = (precision as i32 - 1 - exponent).max(0) as usize;
        strip_zeros(&format!("{value:.decimals$}")).to_string()
    };
    pad(body, width)
}

/// Number of decimal digits needed to print `value` as an integer.
pub fn digit_count(value: u64) -> usize {
    let mut n = value;
    let mut digits = 1;
    while n >= 10 {
        n /= 10;
        digits += 1;
    }
    digits
}

fn exponential(value: f64, precision: usize, upper: bool) -> String {
    if !value.is_finite() {
        return non_finite(value, upper);
    }
    let text = format!("{value:.precision$e}");
    let Some((mantissa, exp)) = text.split_once('e') else {
        return text;
    };
    let exp: i32 = exp.parse().unwrap_or(0);
    let sign = if exp < 0 { '-' } else { '+' };
    let marker = if upper { 'E' } else { 'e' };
    format!("{mantissa}{marker}{sign}{:02}", exp.abs())
}

/// Decimal exponent of `value` after rounding to `precision` fraction digits
/// in scientific notation, as `%g` decides between its two styles.
fn decimal_exponent(value: f64, precision: usize) -> i32 {
    if value == 0.0 {
        return 0;
    }
    let text = format!("{value:.precision$e}");
    text.split_once('e')
        .and_then(|(_, exp)| exp.parse().ok())
        .unwrap_or(0)
}

fn strip_zeros(text: &str) -> &str {
    if !text.contains('.') {
        return text;
    }
    text.trim_end_matches('0').trim_end_matches('.')
}

fn non_finite(value: f64, upper: bool) -> String {
    let text = if value.is_nan() {
        "nan"
    } else if value > 0.0 {
        "inf"
    } else {
        "-inf"
    };
    if upper {
        text.to_ascii_uppercase()
    } else {
        text.to_string()
    }
}

fn pad(text: String, width: usize) -> String {
    if text.len() >= width {
        text
    } else {
        format!("{text:>width$}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exponent_keeps_two_digits_and_sign() {
        assert_eq!(format_e(0.0, 12, 5, true), " 0.00000E+00");
        assert_eq!(format_e(1.0e-120, 0, 2, false), "1.00e-120");
        assert_eq!(format_e(-12.5, 10, 3, false), "-1.250e+01");
    }

    #[test]
    fn general_format_switches_style_on_exponent() {
        assert_eq!(format_g(100.0, 0, 6, true), "100");
        assert_eq!(format_g(0.0001, 0, 6, true), "0.0001");
        assert_eq!(format_g(0.00001, 0, 6, true), "1E-05");
        assert_eq!(format_g(1234567.0, 0, 6, true), "1.23457E+06");
        assert_eq!(format_g(9999999.0, 0, 6, false), "1e+07");
        assert_eq!(format_g(0.0, 12, 6, true), "           0");
        assert_eq!(format_g(-2.5, 0, 8, false), "-2.5");
    }

    #[test]
    fn fixed_format_pads_to_width() {
        assert_eq!(format_f(0.5, 9, 6), " 0.500000");
        assert_eq!(format_f(-12.26, 0, 1), "-12.3");
    }

    #[test]
    fn counts_digits() {
        assert_eq!(digit_count(0), 1);
        assert_eq!(digit_count(9), 1);
        assert_eq!(digit_count(10), 2);
        assert_eq!(digit_count(123456), 6);
    }
}
