use std::f64::consts::{E, PI};

use crate::errors::{CalcError, ErrorKind};
use crate::funcs::{self, AngleMode, FuncTag};
use crate::stack::Stack;
use crate::value::{post_process, CalcResult};
use crate::{MAX_NESTING, PRECISION};

/// Evaluates an infix expression in the given angle mode and returns either
/// the numeric result or the first error, with a best-effort character
/// offset attached.
///
/// Supported syntax: `+ - * / ^` (power is right-associative), parentheses,
/// implicit multiplication (`2(3+4)`, `2pi`), the constants `pi` and `e`,
/// and the unary functions `sin cos tan asin acos atan sqrt log ln abs rad
/// deg`, each of which must be followed by a parenthesized argument.
///
/// ```
/// use scicalc::{evaluate, AngleMode};
///
/// assert_eq!(evaluate("2^3^2", AngleMode::Degrees), Ok(512.0));
/// assert_eq!(evaluate("sin(90)", AngleMode::Degrees), Ok(1.0));
/// ```
pub fn evaluate(expr: &str, mode: AngleMode) -> CalcResult {
    if expr.trim().is_empty() {
        return Err(CalcError::new(ErrorKind::EmptyExpression, "expression is empty"));
    }
    check_brackets(expr)?;
    check_trailing_operator(expr)?;

    let bytes = expr.as_bytes();
    let mut stack = Stack::new();
    let mut last_was_value = false;
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];

        if c == b' ' {
            i += 1;
            continue;
        }

        if c.is_ascii_alphabetic() {
            if let Some((value, next)) = constant_at(bytes, i) {
                if last_was_value {
                    stack.push_operator('*')?;
                }
                stack.push_number(value)?;
                i = next;
                last_was_value = true;
                continue;
            }
            let (tag, after_name) = funcs::match_name(bytes, i);
            if tag == FuncTag::None {
                return Err(CalcError::at(
                    ErrorKind::InvalidCharacter,
                    format!("unknown identifier '{}'", &expr[i..after_name]),
                    i,
                ));
            }
            let (value, next) = eval_function(expr, tag, i, after_name, mode)?;
            stack.push_number(value)?;
            i = next;
            last_was_value = true;
            continue;
        }

        if c.is_ascii_digit() || c == b'.' {
            if last_was_value {
                stack.push_operator('*')?;
            }
            let (value, next) = parse_number(bytes, i)?;
            stack.push_number(value)?;
            i = next;
            last_was_value = true;
            continue;
        }

        match c {
            b'(' => {
                if last_was_value {
                    stack.push_operator('*')?;
                }
                stack.open_group()?;
                i += 1;
                last_was_value = false;
            }
            b')' => {
                if !last_was_value && stack.at_group_start() {
                    return Err(CalcError::at(
                        ErrorKind::Syntax,
                        "parentheses must contain an expression",
                        i,
                    ));
                }
                stack.close_group()?;
                i += 1;
                last_was_value = true;
            }
            b'+' | b'-' | b'*' | b'/' | b'^' => {
                if !last_was_value && c == b'-' && negatable_at(bytes, i + 1) {
                    // unary minus folds into the literal or constant
                    i += 1;
                    if let Some((value, next)) = constant_at(bytes, i) {
                        stack.push_number(-value)?;
                        i = next;
                    } else {
                        let (value, next) = parse_number(bytes, i)?;
                        stack.push_number(-value)?;
                        i = next;
                    }
                    last_was_value = true;
                } else {
                    if !last_was_value && c != b'-' {
                        return Err(CalcError::at(ErrorKind::Syntax, "misplaced operator", i));
                    }
                    stack.push_operator(c as char)?;
                    i += 1;
                    last_was_value = false;
                }
            }
            _ => {
                // i always sits on a character boundary: the scan only ever
                // advances over ASCII
                let ch = expr[i..].chars().next().unwrap_or('?');
                return Err(CalcError::at(
                    ErrorKind::InvalidCharacter,
                    format!("invalid character '{}'", ch),
                    i,
                ));
            }
        }
    }

    stack.finish()
}

// Verifies bracket balance and the nesting cap over the whole string before
// any evaluation begins.
fn check_brackets(expr: &str) -> Result<(), CalcError> {
    let mut depth = 0usize;
    for (i, c) in expr.bytes().enumerate() {
        match c {
            b'(' => {
                depth += 1;
                if depth > MAX_NESTING {
                    return Err(CalcError::at(
                        ErrorKind::StackOverflow,
                        "parentheses nested too deeply",
                        i,
                    ));
                }
            }
            b')' => {
                if depth == 0 {
                    return Err(CalcError::at(
                        ErrorKind::MissingParenthesis,
                        "unmatched closing parenthesis",
                        i,
                    ));
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    if depth > 0 {
        return Err(CalcError::new(ErrorKind::MissingParenthesis, "unclosed parenthesis"));
    }
    Ok(())
}

// An expression may not end in `+ - * /`. A trailing `^` or `)` is accepted;
// the `^` asymmetry is historical and kept deliberately (a dangling `^`
// still fails later, as an incomplete expression).
fn check_trailing_operator(expr: &str) -> Result<(), CalcError> {
    let bytes = expr.as_bytes();
    let mut end = bytes.len();
    while end > 0 && bytes[end - 1] == b' ' {
        end -= 1;
    }
    if end == 0 {
        return Ok(());
    }
    if matches!(bytes[end - 1], b'+' | b'-' | b'*' | b'/') {
        return Err(CalcError::at(
            ErrorKind::Syntax,
            "expression may not end with an operator",
            end - 1,
        ));
    }
    Ok(())
}

// `pi` and `e`, matched case-sensitively and only when not running into a
// longer identifier. Returns the value and the index one past the name.
fn constant_at(bytes: &[u8], i: usize) -> Option<(f64, usize)> {
    if bytes[i..].starts_with(b"pi") && !letter_at(bytes, i + 2) {
        return Some((PI, i + 2));
    }
    if bytes.get(i) == Some(&b'e') && !letter_at(bytes, i + 1) {
        return Some((E, i + 1));
    }
    None
}

fn letter_at(bytes: &[u8], i: usize) -> bool {
    matches!(bytes.get(i), Some(c) if c.is_ascii_alphabetic())
}

// True when a `-` in operator position starts a negative literal or
// negated constant rather than a binary subtraction.
fn negatable_at(bytes: &[u8], i: usize) -> bool {
    match bytes.get(i) {
        Some(c) if c.is_ascii_digit() => true,
        Some(b'.') => true,
        _ => constant_at(bytes, i).is_some(),
    }
}

// Evaluates a function call starting at `start` (the first letter of the
// name, already matched to `tag`, with the cursor at `after_name`). The
// parenthesized argument is sliced out and evaluated recursively with its
// own stacks; errors from the slice keep their own coordinate frame, while
// errors from applying the function are positioned at the function name.
fn eval_function(
    expr: &str,
    tag: FuncTag,
    start: usize,
    after_name: usize,
    mode: AngleMode,
) -> Result<(f64, usize), CalcError> {
    let bytes = expr.as_bytes();
    let mut open = after_name;
    while open < bytes.len() && bytes[open] == b' ' {
        open += 1;
    }
    if open >= bytes.len() || bytes[open] != b'(' {
        return Err(CalcError::at(
            ErrorKind::MissingParenthesis,
            "function must be followed by a parenthesized argument",
            start,
        ));
    }

    let mut close = open + 1;
    let mut depth = 1usize;
    while close < bytes.len() {
        match bytes[close] {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
            }
            _ => {}
        }
        close += 1;
    }
    if depth != 0 {
        return Err(CalcError::at(ErrorKind::MissingParenthesis, "unclosed parenthesis", start));
    }

    let argument = evaluate(&expr[open + 1..close], mode)?;
    let applied = funcs::apply(tag, argument, mode).map_err(|e| e.with_position(start))?;
    let value = post_process(applied).map_err(|e| e.with_position(start))?;
    Ok((value, close + 1))
}

// Consumes a maximal numeric literal at `start` (integer, decimal,
// scientific notation) and returns its value with the index one past it.
// Error positions are absolute within the current frame.
fn parse_number(bytes: &[u8], start: usize) -> Result<(f64, usize), CalcError> {
    let mut i = start;
    while i < bytes.len() && bytes[i] == b' ' {
        i += 1;
    }
    if i >= bytes.len() || (!bytes[i].is_ascii_digit() && bytes[i] != b'.') {
        return Err(CalcError::at(ErrorKind::InvalidNumber, "invalid number", i));
    }

    let mut number = 0.0f64;
    let mut decimal_scale = 0.1f64;
    let mut decimal_count = 0usize;
    let mut digit_count = 0usize;
    let mut has_decimal = false;

    while i < bytes.len() {
        let c = bytes[i];
        if c == b'.' {
            if has_decimal {
                return Err(CalcError::at(
                    ErrorKind::InvalidNumber,
                    "multiple decimal points in number",
                    i,
                ));
            }
            has_decimal = true;
            i += 1;
        } else if c == b'e' || c == b'E' {
            // exponent part: optional sign, then digits only
            i += 1;
            let mut exponent = 0i32;
            let mut exponent_sign = 1i32;
            if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
                if bytes[i] == b'-' {
                    exponent_sign = -1;
                }
                i += 1;
            }
            if i >= bytes.len() || !bytes[i].is_ascii_digit() {
                if matches!(bytes.get(i), Some(b'e') | Some(b'E')) {
                    return Err(CalcError::at(
                        ErrorKind::InvalidNumber,
                        "multiple exponent markers in number",
                        i,
                    ));
                }
                return Err(CalcError::at(
                    ErrorKind::InvalidNumber,
                    "exponent must be an integer",
                    i,
                ));
            }
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                exponent = exponent * 10 + i32::from(bytes[i] - b'0');
                // the magnitude cap ignores the exponent sign
                if exponent > 308 {
                    return Err(CalcError::at(ErrorKind::Overflow, "number is too large", i));
                }
                i += 1;
            }
            if matches!(bytes.get(i), Some(b'e') | Some(b'E')) {
                return Err(CalcError::at(
                    ErrorKind::InvalidNumber,
                    "multiple exponent markers in number",
                    i,
                ));
            }
            if bytes.get(i) == Some(&b'.') {
                return Err(CalcError::at(
                    ErrorKind::InvalidNumber,
                    "exponent must be an integer",
                    i,
                ));
            }
            let scale = 10f64.powi(exponent_sign * exponent);
            let scaled = number * scale;
            if scale.is_infinite() || scaled.is_infinite() {
                return Err(CalcError::at(ErrorKind::Overflow, "number is too large", i));
            }
            return Ok((scaled, i));
        } else if c.is_ascii_digit() {
            let digit = f64::from(c - b'0');
            if has_decimal {
                // retain PRECISION fractional digits, read and drop the rest
                if decimal_count < PRECISION {
                    number += digit * decimal_scale;
                    decimal_scale *= 0.1;
                    decimal_count += 1;
                }
            } else {
                digit_count += 1;
                if digit_count > 15 || number > f64::MAX / 10.0 {
                    return Err(CalcError::at(ErrorKind::Overflow, "number is too large", i));
                }
                number = number * 10.0 + digit;
            }
            i += 1;
        } else {
            break;
        }
    }

    Ok((number, i))
}
