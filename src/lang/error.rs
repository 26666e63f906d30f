use std::{error, fmt};

use super::value::Value;

/// Failure while parsing or evaluating an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionError {
    /// The text does not follow the expression grammar.
    Syntax {
        source: String,
        /// Byte offset in `source` where parsing failed.
        position: usize,
        message: String,
    },
    IntegerOutOfRange { literal: String },
    UndefinedName { name: String },
    DivisionByZero,
    Overflow { op: &'static str },
    NotAProgramCounter { value: Value },
}

impl fmt::Display for ExpressionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpressionError::Syntax { source, position, message } => write!(
                f,
                "invalid syntax at column {} of `{}`: {}",
                position + 1,
                source,
                message
            ),
            ExpressionError::IntegerOutOfRange { literal } => {
                write!(f, "integer literal `{}` is out of range", literal)
            }
            ExpressionError::UndefinedName { name } => write!(f, "name `{}` is not defined", name),
            ExpressionError::DivisionByZero => write!(f, "division by zero"),
            ExpressionError::Overflow { op } => write!(f, "integer overflow in `{}`", op),
            ExpressionError::NotAProgramCounter { value } => write!(
                f,
                "expected an integer program counter, got {} `{}`",
                value.type_name(),
                value
            ),
        }
    }
}

impl error::Error for ExpressionError {}
