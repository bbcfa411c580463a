use std::fmt;

use thiserror::Error;

/// Closed set of failure categories the evaluator reports.
///
/// Every kind is recoverable by construction: malformed input always yields
/// an error value, never a panic.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum ErrorKind {
    #[error("expression is empty")]
    EmptyExpression,
    #[error("syntax error")]
    Syntax,
    #[error("division by zero")]
    DivisionByZero,
    #[error("invalid number")]
    InvalidNumber,
    #[error("numeric overflow")]
    Overflow,
    #[error("result is undefined")]
    Undefined,
    #[error("invalid function")]
    InvalidFunction,
    #[error("invalid argument")]
    InvalidArgument,
    #[error("expression is too complex")]
    StackOverflow,
    #[error("mismatched parentheses")]
    MissingParenthesis,
    #[error("invalid character")]
    InvalidCharacter,
}

/// Evaluation failure: an [`ErrorKind`], a human-readable message, and a
/// best-effort character offset into the expression of the frame that
/// produced it.
///
/// Errors from a recursively evaluated sub-expression keep positions relative
/// to that sub-expression's own slice.
#[derive(Clone, PartialEq, Debug)]
pub struct CalcError {
    pub kind: ErrorKind,
    pub message: String,
    pub position: Option<usize>,
}

impl CalcError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        CalcError {
            kind,
            message: message.into(),
            position: None,
        }
    }

    pub fn at(kind: ErrorKind, message: impl Into<String>, position: usize) -> Self {
        CalcError {
            kind,
            message: message.into(),
            position: Some(position),
        }
    }

    /// Replaces the recorded offset, used when a caller translates an error
    /// into its own coordinate frame.
    pub fn with_position(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }
}

impl fmt::Display for CalcError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.position {
            Some(p) => write!(f, "{} (at offset {})", self.message, p),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for CalcError {}
