use crate::errors::{CalcError, ErrorKind};
use crate::value::{post_process, CalcResult};
use crate::{ABSOLUTE_ZERO_THRESHOLD, EPSILON, MAX_STACK};

/// Operator priorities. `(` is a sentinel that is never reduced against;
/// anything unknown maps to the invalid marker -1.
pub(crate) fn priority(op: char) -> i32 {
    match op {
        '+' | '-' => 1,
        '*' | '/' => 2,
        '^' => 3,
        '(' => 0,
        _ => -1,
    }
}

/// Applies a single binary operator. Division and power carry domain checks;
/// addition, subtraction, and multiplication are unchecked.
pub(crate) fn apply_operator(op: char, a: f64, b: f64) -> CalcResult {
    let result = match op {
        '+' => a + b,
        '-' => a - b,
        '*' => a * b,
        '/' => {
            if b.abs() < ABSOLUTE_ZERO_THRESHOLD {
                return Err(CalcError::new(ErrorKind::DivisionByZero, "division by zero"));
            }
            a / b
        }
        '^' => {
            if a.abs() < ABSOLUTE_ZERO_THRESHOLD && b < 0.0 {
                return Err(CalcError::new(
                    ErrorKind::Undefined,
                    "zero to a negative power is undefined",
                ));
            }
            if a < 0.0 && (b - b.round()).abs() > EPSILON {
                return Err(CalcError::new(
                    ErrorKind::Undefined,
                    "negative base with a fractional exponent is undefined",
                ));
            }
            a.powf(b)
        }
        _ => return Err(CalcError::new(ErrorKind::Syntax, "unknown operator")),
    };
    Ok(result)
}

/// One evaluation frame's operand and operator stacks.
///
/// Each call to the evaluator, including every recursive call on a sliced
/// sub-expression, owns its own instance; nothing is shared between frames.
pub(crate) struct Stack {
    numbers: Vec<f64>,
    operators: Vec<char>,
}

impl Stack {
    pub(crate) fn new() -> Self {
        Stack {
            numbers: Vec::new(),
            operators: Vec::new(),
        }
    }

    pub(crate) fn push_number(&mut self, value: f64) -> Result<(), CalcError> {
        if self.numbers.len() >= MAX_STACK {
            return Err(CalcError::new(
                ErrorKind::StackOverflow,
                "operand stack overflow, expression is too complex",
            ));
        }
        self.numbers.push(value);
        Ok(())
    }

    /// Resolves pending operators of greater or equal priority, then pushes
    /// the incoming one. The one exception: `^` never reduces a `^` already
    /// on top, which makes power right-associative.
    pub(crate) fn push_operator(&mut self, op: char) -> Result<(), CalcError> {
        while let Some(&top) = self.operators.last() {
            if top == '(' || (op == '^' && top == '^') || priority(top) < priority(op) {
                break;
            }
            self.reduce_once()?;
        }
        if self.operators.len() >= MAX_STACK {
            return Err(CalcError::new(
                ErrorKind::StackOverflow,
                "operator stack overflow, expression is too complex",
            ));
        }
        self.operators.push(op);
        Ok(())
    }

    pub(crate) fn open_group(&mut self) -> Result<(), CalcError> {
        if self.operators.len() >= MAX_STACK {
            return Err(CalcError::new(
                ErrorKind::StackOverflow,
                "operator stack overflow, expression is too complex",
            ));
        }
        self.operators.push('(');
        Ok(())
    }

    /// True when the top of the operator stack is the open marker, i.e. no
    /// operand or operator has been pushed since the group opened.
    pub(crate) fn at_group_start(&self) -> bool {
        self.operators.last() == Some(&'(')
    }

    /// Reduces everything down to the matching open marker and removes it.
    pub(crate) fn close_group(&mut self) -> Result<(), CalcError> {
        loop {
            match self.operators.last() {
                Some('(') => {
                    self.operators.pop();
                    return Ok(());
                }
                Some(_) => self.reduce_once()?,
                None => {
                    return Err(CalcError::new(
                        ErrorKind::MissingParenthesis,
                        "mismatched closing parenthesis",
                    ));
                }
            }
        }
    }

    /// Drains the operator stack and returns the sole remaining operand.
    pub(crate) fn finish(&mut self) -> CalcResult {
        while let Some(&top) = self.operators.last() {
            if top == '(' {
                return Err(CalcError::new(ErrorKind::MissingParenthesis, "unclosed parenthesis"));
            }
            self.reduce_once()?;
        }
        if self.numbers.len() != 1 {
            return Err(CalcError::new(ErrorKind::Syntax, "incomplete expression"));
        }
        // length was checked right above
        Ok(self.numbers.pop().unwrap())
    }

    // Pops two operands and one operator, applies it, post-processes the
    // result, and pushes it back.
    fn reduce_once(&mut self) -> Result<(), CalcError> {
        if self.numbers.len() < 2 {
            return Err(CalcError::new(ErrorKind::Syntax, "operator is missing an operand"));
        }
        // pops are guarded: two operands checked above, operator by the caller
        let b = self.numbers.pop().unwrap();
        let a = self.numbers.pop().unwrap();
        let op = self.operators.pop().unwrap();
        let result = apply_operator(op, a, b)?;
        self.numbers.push(post_process(result)?);
        Ok(())
    }
}
