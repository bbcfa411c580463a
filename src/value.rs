use crate::errors::{CalcError, ErrorKind};
use crate::{
    ABSOLUTE_ZERO_THRESHOLD, DISPLAY_FORMAT_MIN, EPSILON, INFINITY_THRESHOLD, PRECISION,
    RELATIVE_EPSILON, SCI_PRECISION,
};

/// Expression calculation result: either a finite value or an error
pub type CalcResult = Result<f64, CalcError>;

/// Floating-point equality with a mixed absolute/relative tolerance.
///
/// NaN equals NaN and same-signed infinities are equal, so comparisons of
/// special values behave the way the rest of the crate expects. A pure
/// relative comparison fails near zero and a pure absolute one fails for
/// large magnitudes, hence the split:
/// * both magnitudes below [`ABSOLUTE_ZERO_THRESHOLD`] compare equal,
/// * either magnitude below [`EPSILON`] falls back to an absolute check,
/// * otherwise the absolute difference must be below [`EPSILON`] or the
///   difference relative to the larger operand below [`RELATIVE_EPSILON`].
pub fn nearly_equal(a: f64, b: f64) -> bool {
    if a.is_nan() && b.is_nan() {
        return true;
    }
    if a.is_infinite() && b.is_infinite() {
        return (a > 0.0) == (b > 0.0);
    }
    if a.is_nan() || b.is_nan() || a.is_infinite() || b.is_infinite() {
        return false;
    }
    if a.abs() < ABSOLUTE_ZERO_THRESHOLD && b.abs() < ABSOLUTE_ZERO_THRESHOLD {
        return true;
    }
    if a.abs() < EPSILON || b.abs() < EPSILON {
        return (a - b).abs() < EPSILON;
    }
    let diff = (a - b).abs();
    // relative to the larger operand so the check is symmetric
    let largest = a.abs().max(b.abs());
    diff < EPSILON || diff / largest < RELATIVE_EPSILON
}

/// Returns the nearest integer when the value is within tolerance of one.
///
/// Applying it to its own output returns the same integer.
pub fn snap_to_integer(value: f64) -> Option<i64> {
    if !value.is_finite() {
        return None;
    }
    let rounded = value.round();
    if rounded < i64::MIN as f64 || rounded > i64::MAX as f64 {
        return None;
    }
    if nearly_equal(value, rounded) {
        Some(rounded as i64)
    } else {
        None
    }
}

/// Overflow classification: non-finite values and magnitudes above
/// [`INFINITY_THRESHOLD`]. NaN ("undefined") stays a separate notion and is
/// tested with `is_nan` directly.
pub fn is_overflow(value: f64) -> bool {
    !value.is_finite() || value.abs() > INFINITY_THRESHOLD
}

/// Post-processing applied after every arithmetic reduction and function
/// application: classify overflow, then snap near-integer results so binary
/// floating-point noise does not leak into chained operations.
pub(crate) fn post_process(value: f64) -> CalcResult {
    if is_overflow(value) {
        return Err(CalcError::new(ErrorKind::Overflow, "result is too large"));
    }
    match snap_to_integer(value) {
        Some(i) => Ok(i as f64),
        None => Ok(value),
    }
}

/// Renders a value for display.
///
/// NaN renders as `undefined` and infinities as a signed `infinity` label.
/// Integer-snapped values print as plain integers up to
/// [`INFINITY_THRESHOLD`], above it as scientific notation with one
/// fractional digit. Everything else prints in scientific notation at
/// [`SCI_PRECISION`] fractional digits when the magnitude falls below
/// [`DISPLAY_FORMAT_MIN`], and otherwise fixed-point at [`PRECISION`] digits
/// with trailing zeros and a bare trailing decimal point stripped.
///
/// Any finite value up to [`INFINITY_THRESHOLD`] re-parses from its rendered
/// form to something `nearly_equal` to the original: fixed-point error stays
/// below [`EPSILON`] absolutely for small magnitudes and far below
/// [`RELATIVE_EPSILON`] relatively for large ones, and the scientific
/// mantissa is wide enough for the literal parser to retain in full.
pub fn format(value: f64) -> String {
    if value.is_nan() {
        return "undefined".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 {
            "infinity".to_string()
        } else {
            "-infinity".to_string()
        };
    }
    if let Some(i) = snap_to_integer(value) {
        if (i.unsigned_abs() as f64) > INFINITY_THRESHOLD {
            return std::format!("{:.1e}", value);
        }
        return i.to_string();
    }
    let magnitude = value.abs();
    if magnitude > INFINITY_THRESHOLD {
        // snap failed only because the value is outside the i64 range
        return std::format!("{:.1e}", value);
    }
    if magnitude < DISPLAY_FORMAT_MIN {
        return std::format!("{:.*e}", SCI_PRECISION, value);
    }
    let mut s = std::format!("{:.*}", PRECISION, value);
    while s.ends_with('0') {
        s.pop();
    }
    if s.ends_with('.') {
        s.pop();
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearly_equal_special_values() {
        assert!(nearly_equal(f64::NAN, f64::NAN));
        assert!(nearly_equal(f64::INFINITY, f64::INFINITY));
        assert!(nearly_equal(f64::NEG_INFINITY, f64::NEG_INFINITY));
        assert!(!nearly_equal(f64::INFINITY, f64::NEG_INFINITY));
        assert!(!nearly_equal(f64::NAN, 0.0));
        assert!(!nearly_equal(f64::INFINITY, 1e300));
    }

    #[test]
    fn test_nearly_equal_near_zero() {
        assert!(nearly_equal(0.0, 1e-16));
        assert!(nearly_equal(-1e-16, 1e-16));
        assert!(nearly_equal(1e-12, 1e-11));
        assert!(!nearly_equal(0.0, 1e-9));
    }

    #[test]
    fn test_nearly_equal_absolute_and_relative() {
        assert!(nearly_equal(1.0, 1.0 + 1e-11));
        assert!(!nearly_equal(1.0, 1.001));
        // large magnitudes go through the relative branch
        assert!(nearly_equal(1e15, 1e15 + 0.001));
        assert!(!nearly_equal(1e10, 1e10 + 1.0));
    }

    #[test]
    fn test_snap_to_integer() {
        assert_eq!(snap_to_integer(3.0000000000001), Some(3));
        assert_eq!(snap_to_integer(-2.9999999999999), Some(-3));
        assert_eq!(snap_to_integer(0.0), Some(0));
        assert_eq!(snap_to_integer(3.001), None);
        assert_eq!(snap_to_integer(f64::NAN), None);
        assert_eq!(snap_to_integer(f64::INFINITY), None);
    }

    #[test]
    fn test_snap_is_idempotent() {
        let first = snap_to_integer(511.99999999999994).unwrap();
        assert_eq!(snap_to_integer(first as f64), Some(first));
        assert_eq!(first, 512);
    }

    #[test]
    fn test_is_overflow() {
        assert!(is_overflow(f64::INFINITY));
        assert!(is_overflow(f64::NAN));
        assert!(is_overflow(1e16));
        assert!(!is_overflow(1e15));
        assert!(!is_overflow(-123.0));
    }

    #[test]
    fn test_format_special_values() {
        assert_eq!(format(f64::NAN), "undefined");
        assert_eq!(format(f64::INFINITY), "infinity");
        assert_eq!(format(f64::NEG_INFINITY), "-infinity");
    }

    #[test]
    fn test_format_snapped_integers() {
        assert_eq!(format(3.0000000000001), "3");
        assert_eq!(format(-512.0), "-512");
        assert_eq!(format(0.0), "0");
        // integer magnitude within the plain-display range
        assert_eq!(format(10000000.0), "10000000");
        // huge snapped integers switch to scientific notation
        assert_eq!(format(2e16), "2.0e16");
    }

    #[test]
    fn test_format_fixed_point() {
        assert_eq!(format(2.5), "2.5");
        assert_eq!(format(0.1 + 0.2), "0.3");
        assert_eq!(format(123.456), "123.456");
        assert_eq!(format(0.0001), "0.0001");
        assert_eq!(format(-1.25), "-1.25");
    }

    #[test]
    fn test_format_scientific() {
        assert_eq!(format(0.00009), "9.0000000000e-5");
        assert_eq!(format(3e-5), "3.0000000000e-5");
        assert_eq!(format(-1.5e-7), "-1.5000000000e-7");
    }

    #[test]
    fn test_format_large_magnitudes_stay_fixed_point() {
        // magnitudes up to INFINITY_THRESHOLD keep fixed-point display so a
        // rendered result re-parses within tolerance of the original
        assert_eq!(format(12345678.5), "12345678.5");
        assert_eq!(format(123456789.5), "123456789.5");
        assert_eq!(format(1234567890123.25), "1234567890123.25");
    }
}
