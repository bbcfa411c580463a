//! # Scientific expression evaluator
//!
//! Evaluates infix arithmetic expressions over `f64` values with the usual
//! operators, parentheses, implicit multiplication, and a fixed set of unary
//! scientific functions:
//!
//! * `+`, `-`, `*`, `/`, and right-associative `^`
//! * implicit multiplication: `2(3+4)`, `(1+2)(3+4)`, `2pi`
//! * constants `pi` and `e`
//! * trigonometry in a caller-chosen angle mode: sin, cos, tan, asin, acos,
//!   atan; plus sqrt, log (base 10), ln, abs, and the rad/deg converters
//!
//! Results that land within a tight tolerance of an integer are snapped to
//! that integer after every operation, so `sqrt(2)^2` is exactly `2` and
//! `sin(90)` in degree mode is exactly `1` rather than `0.999...`. Trig
//! functions recognize quadrant angles (multiples of 90 degrees) and return
//! their closed-form values directly; `tan` at an odd quadrant reports an
//! error instead of a huge float.
//!
//! Every failure is a [`CalcError`] with a category, a message, and where
//! possible the character offset in the input:
//!
//! ```
//! use scicalc::{evaluate, format, AngleMode, ErrorKind};
//!
//! assert_eq!(evaluate("2^3^2", AngleMode::Degrees), Ok(512.0));
//! assert_eq!(format(evaluate("0.1+0.2", AngleMode::Degrees).unwrap()), "0.3");
//!
//! let err = evaluate("1/0", AngleMode::Degrees).unwrap_err();
//! assert_eq!(err.kind, ErrorKind::DivisionByZero);
//! ```

pub mod errors;
pub mod funcs;
pub mod parse;
pub mod stack;
pub mod value;

pub use crate::errors::{CalcError, ErrorKind};
pub use crate::funcs::{AngleMode, FuncTag};
pub use crate::parse::evaluate;
pub use crate::value::{format, nearly_equal, snap_to_integer, CalcResult};

/// Capacity of each of the operand and operator stacks.
pub const MAX_STACK: usize = 100;
/// Fractional digits retained by the literal parser and used for fixed-point
/// display.
pub const PRECISION: usize = 10;
/// Maximum parenthesis nesting depth.
pub const MAX_NESTING: usize = 10;
/// Absolute comparison tolerance, also the integer-snap tolerance.
pub const EPSILON: f64 = 1e-10;
/// Relative comparison tolerance for large magnitudes.
pub const RELATIVE_EPSILON: f64 = 1e-12;
/// Magnitudes below this are treated as exactly zero.
pub const ABSOLUTE_ZERO_THRESHOLD: f64 = 1e-15;
/// Magnitudes above this are classified as overflow.
pub const INFINITY_THRESHOLD: f64 = 1e15;
/// Display switches to scientific notation below this magnitude.
pub const DISPLAY_FORMAT_MIN: f64 = 1e-4;
/// Fractional digits in scientific-notation display. Wide enough that a
/// rendered value survives a trip back through the literal parser.
pub const SCI_PRECISION: usize = 10;
