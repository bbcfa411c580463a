use std::f64::consts::PI;

use lazy_static::lazy_static;

use crate::errors::{CalcError, ErrorKind};
use crate::value::{snap_to_integer, CalcResult};
use crate::{ABSOLUTE_ZERO_THRESHOLD, EPSILON};

/// How raw numeric arguments to trigonometric functions are interpreted and
/// how inverse-trig results are expressed.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AngleMode {
    Degrees,
    Radians,
}

/// Tags for the supported unary functions, plus a sentinel for identifiers
/// that match nothing.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FuncTag {
    None,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sqrt,
    Log,
    Ln,
    Abs,
    Rad,
    Deg,
}

/// Longest identifier the function matcher consumes.
pub(crate) const MAX_FUNC_NAME: usize = 9;

// Special-angle detection uses a tighter tolerance in radians than in
// degrees, reflecting the different natural step sizes of the two scales.
const RAD_ANGLE_TOLERANCE: f64 = 1e-12;

lazy_static! {
    pub(crate) static ref FUNC_NAMES: Vec<(&'static str, FuncTag)> = vec![
        ("sin", FuncTag::Sin),
        ("cos", FuncTag::Cos),
        ("tan", FuncTag::Tan),
        ("asin", FuncTag::Asin),
        ("acos", FuncTag::Acos),
        ("atan", FuncTag::Atan),
        ("sqrt", FuncTag::Sqrt),
        ("log", FuncTag::Log),
        ("ln", FuncTag::Ln),
        ("abs", FuncTag::Abs),
        ("rad", FuncTag::Rad),
        ("deg", FuncTag::Deg),
    ];
}

impl FuncTag {
    /// Case-insensitive lookup in the fixed function table.
    pub fn from_name(name: &str) -> FuncTag {
        let lower = name.to_lowercase();
        for (fname, tag) in FUNC_NAMES.iter() {
            if *fname == lower {
                return *tag;
            }
        }
        FuncTag::None
    }
}

/// Consumes a maximal run of letters (bounded at [`MAX_FUNC_NAME`]) starting
/// at `start` and looks it up in the function table. Returns the tag and the
/// index one past the consumed letters; an unknown identifier yields
/// [`FuncTag::None`] with the cursor still advanced.
pub(crate) fn match_name(bytes: &[u8], start: usize) -> (FuncTag, usize) {
    let mut end = start;
    while end < bytes.len() && bytes[end].is_ascii_alphabetic() && end - start < MAX_FUNC_NAME {
        end += 1;
    }
    // the run is plain ASCII letters
    let name = std::str::from_utf8(&bytes[start..end]).unwrap_or("");
    (FuncTag::from_name(name), end)
}

// Quadrant boundaries where trig functions take exact closed-form values.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Quadrant {
    Zero,
    Quarter,
    Half,
    ThreeQuarter,
}

// Folds the angle into a single period and tests it against the quadrant
// boundaries (0, 90, 180, 270 degrees or their radian equivalents).
fn special_angle(value: f64, mode: AngleMode) -> Option<Quadrant> {
    let (period, tolerance) = match mode {
        AngleMode::Degrees => (360.0, EPSILON),
        AngleMode::Radians => (2.0 * PI, RAD_ANGLE_TOLERANCE),
    };
    let quarter = period / 4.0;
    let folded = value.rem_euclid(period);
    if folded < tolerance || (folded - period).abs() < tolerance {
        return Some(Quadrant::Zero);
    }
    if (folded - quarter).abs() < tolerance {
        return Some(Quadrant::Quarter);
    }
    if (folded - 2.0 * quarter).abs() < tolerance {
        return Some(Quadrant::Half);
    }
    if (folded - 3.0 * quarter).abs() < tolerance {
        return Some(Quadrant::ThreeQuarter);
    }
    None
}

fn to_radians(value: f64, mode: AngleMode) -> f64 {
    match mode {
        AngleMode::Degrees => value * PI / 180.0,
        AngleMode::Radians => value,
    }
}

fn from_radians(value: f64, mode: AngleMode) -> f64 {
    match mode {
        AngleMode::Degrees => value * 180.0 / PI,
        AngleMode::Radians => value,
    }
}

// Transcendental results within a hair of zero are representation noise.
fn flush_zero(value: f64) -> f64 {
    if value.abs() < ABSOLUTE_ZERO_THRESHOLD {
        0.0
    } else {
        value
    }
}

/// Evaluates a function tag against a value in the given angle mode.
///
/// NaN-classified inputs propagate unchanged. Trig functions return exact
/// values at the quadrant special angles, bypassing the transcendental call
/// entirely; every successful result passes through the integer-snap check.
pub fn apply(tag: FuncTag, value: f64, mode: AngleMode) -> CalcResult {
    if value.is_nan() {
        return Ok(value);
    }
    let result = match tag {
        FuncTag::Sin => match special_angle(value, mode) {
            Some(Quadrant::Zero) | Some(Quadrant::Half) => 0.0,
            Some(Quadrant::Quarter) => 1.0,
            Some(Quadrant::ThreeQuarter) => -1.0,
            None => flush_zero(to_radians(value, mode).sin()),
        },
        FuncTag::Cos => match special_angle(value, mode) {
            Some(Quadrant::Zero) => 1.0,
            Some(Quadrant::Half) => -1.0,
            Some(Quadrant::Quarter) | Some(Quadrant::ThreeQuarter) => 0.0,
            None => flush_zero(to_radians(value, mode).cos()),
        },
        FuncTag::Tan => match special_angle(value, mode) {
            Some(Quadrant::Quarter) | Some(Quadrant::ThreeQuarter) => {
                return Err(CalcError::new(
                    ErrorKind::Undefined,
                    "tan is undefined at odd multiples of 90 degrees",
                ));
            }
            Some(Quadrant::Zero) | Some(Quadrant::Half) => 0.0,
            None => flush_zero(to_radians(value, mode).tan()),
        },
        FuncTag::Asin => {
            if !(-1.0..=1.0).contains(&value) {
                return Err(CalcError::new(
                    ErrorKind::InvalidArgument,
                    "asin argument must be within [-1, 1]",
                ));
            }
            flush_zero(from_radians(value.asin(), mode))
        }
        FuncTag::Acos => {
            if !(-1.0..=1.0).contains(&value) {
                return Err(CalcError::new(
                    ErrorKind::InvalidArgument,
                    "acos argument must be within [-1, 1]",
                ));
            }
            flush_zero(from_radians(value.acos(), mode))
        }
        FuncTag::Atan => flush_zero(from_radians(value.atan(), mode)),
        FuncTag::Sqrt => {
            if value < 0.0 {
                return Err(CalcError::new(
                    ErrorKind::InvalidArgument,
                    "square root of a negative number",
                ));
            }
            value.sqrt()
        }
        FuncTag::Log => {
            if value <= 0.0 {
                return Err(CalcError::new(
                    ErrorKind::InvalidArgument,
                    "log argument must be positive",
                ));
            }
            flush_zero(value.log10())
        }
        FuncTag::Ln => {
            if value <= 0.0 {
                return Err(CalcError::new(
                    ErrorKind::InvalidArgument,
                    "ln argument must be positive",
                ));
            }
            flush_zero(value.ln())
        }
        FuncTag::Abs => value.abs(),
        // fixed conversions, independent of the ambient angle mode
        FuncTag::Rad => value * PI / 180.0,
        FuncTag::Deg => value * 180.0 / PI,
        FuncTag::None => {
            return Err(CalcError::new(ErrorKind::InvalidFunction, "unknown function"));
        }
    };
    match snap_to_integer(result) {
        Some(i) => Ok(i as f64),
        None => Ok(result),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::nearly_equal;

    #[test]
    fn test_lookup() {
        assert_eq!(FuncTag::from_name("sin"), FuncTag::Sin);
        assert_eq!(FuncTag::from_name("SIN"), FuncTag::Sin);
        assert_eq!(FuncTag::from_name("Sqrt"), FuncTag::Sqrt);
        assert_eq!(FuncTag::from_name("sine"), FuncTag::None);
        assert_eq!(FuncTag::from_name(""), FuncTag::None);
    }

    #[test]
    fn test_match_name_advances_cursor() {
        let src = b"atan(1)";
        assert_eq!(match_name(src, 0), (FuncTag::Atan, 4));
        let src = b"bogus(1)";
        assert_eq!(match_name(src, 0), (FuncTag::None, 5));
        // the run is bounded even for absurdly long identifiers
        let src = b"abcdefghijklm";
        assert_eq!(match_name(src, 0), (FuncTag::None, MAX_FUNC_NAME));
    }

    #[test]
    fn test_degree_special_angles() {
        assert_eq!(apply(FuncTag::Sin, 0.0, AngleMode::Degrees), Ok(0.0));
        assert_eq!(apply(FuncTag::Sin, 90.0, AngleMode::Degrees), Ok(1.0));
        assert_eq!(apply(FuncTag::Sin, 180.0, AngleMode::Degrees), Ok(0.0));
        assert_eq!(apply(FuncTag::Sin, 270.0, AngleMode::Degrees), Ok(-1.0));
        assert_eq!(apply(FuncTag::Sin, -90.0, AngleMode::Degrees), Ok(-1.0));
        assert_eq!(apply(FuncTag::Sin, 450.0, AngleMode::Degrees), Ok(1.0));
        assert_eq!(apply(FuncTag::Cos, 0.0, AngleMode::Degrees), Ok(1.0));
        assert_eq!(apply(FuncTag::Cos, 90.0, AngleMode::Degrees), Ok(0.0));
        assert_eq!(apply(FuncTag::Cos, 180.0, AngleMode::Degrees), Ok(-1.0));
        assert_eq!(apply(FuncTag::Cos, -90.0, AngleMode::Degrees), Ok(0.0));
        assert_eq!(apply(FuncTag::Cos, 360.0, AngleMode::Degrees), Ok(1.0));
        assert_eq!(apply(FuncTag::Tan, 0.0, AngleMode::Degrees), Ok(0.0));
        assert_eq!(apply(FuncTag::Tan, 180.0, AngleMode::Degrees), Ok(0.0));
    }

    #[test]
    fn test_tan_undefined_at_quarter_turns() {
        for angle in [90.0, 270.0, -90.0, 450.0] {
            let err = apply(FuncTag::Tan, angle, AngleMode::Degrees).unwrap_err();
            assert_eq!(err.kind, ErrorKind::Undefined, "tan({})", angle);
        }
        let err = apply(FuncTag::Tan, PI / 2.0, AngleMode::Radians).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Undefined);
    }

    #[test]
    fn test_radian_special_angles() {
        assert_eq!(apply(FuncTag::Sin, PI / 2.0, AngleMode::Radians), Ok(1.0));
        assert_eq!(apply(FuncTag::Sin, PI, AngleMode::Radians), Ok(0.0));
        assert_eq!(apply(FuncTag::Cos, PI, AngleMode::Radians), Ok(-1.0));
        assert_eq!(apply(FuncTag::Cos, 0.0, AngleMode::Radians), Ok(1.0));
        assert_eq!(apply(FuncTag::Tan, PI, AngleMode::Radians), Ok(0.0));
    }

    #[test]
    fn test_ordinary_trig_values() {
        let v = apply(FuncTag::Sin, 30.0, AngleMode::Degrees).unwrap();
        assert!(nearly_equal(v, 0.5));
        let v = apply(FuncTag::Cos, 60.0, AngleMode::Degrees).unwrap();
        assert!(nearly_equal(v, 0.5));
        let v = apply(FuncTag::Tan, 45.0, AngleMode::Degrees).unwrap();
        assert!(nearly_equal(v, 1.0));
        let v = apply(FuncTag::Sin, PI / 6.0, AngleMode::Radians).unwrap();
        assert!(nearly_equal(v, 0.5));
    }

    #[test]
    fn test_inverse_trig() {
        assert_eq!(apply(FuncTag::Asin, 1.0, AngleMode::Degrees), Ok(90.0));
        assert_eq!(apply(FuncTag::Asin, -1.0, AngleMode::Degrees), Ok(-90.0));
        assert_eq!(apply(FuncTag::Asin, 0.5, AngleMode::Degrees), Ok(30.0));
        assert_eq!(apply(FuncTag::Acos, 0.0, AngleMode::Degrees), Ok(90.0));
        assert_eq!(apply(FuncTag::Acos, -1.0, AngleMode::Degrees), Ok(180.0));
        assert_eq!(apply(FuncTag::Atan, 1.0, AngleMode::Degrees), Ok(45.0));
        let v = apply(FuncTag::Asin, 1.0, AngleMode::Radians).unwrap();
        assert!(nearly_equal(v, PI / 2.0));
    }

    #[test]
    fn test_inverse_trig_domain() {
        let err = apply(FuncTag::Asin, 2.0, AngleMode::Degrees).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArgument);
        let err = apply(FuncTag::Acos, -1.0001, AngleMode::Degrees).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_logarithms_and_roots() {
        assert_eq!(apply(FuncTag::Log, 100.0, AngleMode::Degrees), Ok(2.0));
        assert_eq!(apply(FuncTag::Log, 1.0, AngleMode::Degrees), Ok(0.0));
        assert_eq!(
            apply(FuncTag::Ln, std::f64::consts::E, AngleMode::Degrees),
            Ok(1.0)
        );
        assert_eq!(apply(FuncTag::Sqrt, 16.0, AngleMode::Degrees), Ok(4.0));
        for bad in [
            apply(FuncTag::Log, 0.0, AngleMode::Degrees),
            apply(FuncTag::Log, -1.0, AngleMode::Degrees),
            apply(FuncTag::Ln, 0.0, AngleMode::Degrees),
            apply(FuncTag::Sqrt, -1.0, AngleMode::Degrees),
        ] {
            assert_eq!(bad.unwrap_err().kind, ErrorKind::InvalidArgument);
        }
    }

    #[test]
    fn test_abs_and_conversions() {
        assert_eq!(apply(FuncTag::Abs, -3.0, AngleMode::Degrees), Ok(3.0));
        let v = apply(FuncTag::Abs, -3.14, AngleMode::Degrees).unwrap();
        assert!(nearly_equal(v, 3.14));
        // rad/deg ignore the ambient mode
        for mode in [AngleMode::Degrees, AngleMode::Radians] {
            let v = apply(FuncTag::Rad, 180.0, mode).unwrap();
            assert!(nearly_equal(v, PI));
            assert_eq!(apply(FuncTag::Deg, PI, mode), Ok(180.0));
        }
    }

    #[test]
    fn test_nan_propagates() {
        let v = apply(FuncTag::Sin, f64::NAN, AngleMode::Degrees).unwrap();
        assert!(v.is_nan());
        let v = apply(FuncTag::Sqrt, f64::NAN, AngleMode::Degrees).unwrap();
        assert!(v.is_nan());
    }

    #[test]
    fn test_none_tag_is_invalid_function() {
        let err = apply(FuncTag::None, 1.0, AngleMode::Degrees).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidFunction);
    }
}
