//! Expression language used by `nextpc` fields and `assign` effects.
//!
//! A small grammar of literals, names, arithmetic, comparison and boolean
//! operators, `a if c else b`, and `name := expr`. Names resolve only
//! against the [`Environment`] handed to the evaluator.

pub mod environment;
pub mod error;
pub mod expression;
mod parser;
pub mod value;

pub use environment::Environment;
pub use error::ExpressionError;
pub use expression::{BinaryOp, Expr, Expression, UnaryOp, evaluate};
pub use value::Value;
