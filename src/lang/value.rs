use std::cmp::Ordering;
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use super::error::ExpressionError;

/// A runtime value of the expression language.
///
/// Booleans behave as `0`/`1` whenever they meet arithmetic or ordering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Bool(bool),
}

impl Default for Value {
    fn default() -> Self {
        Value::Integer(0)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}
impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}
impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
        }
    }
}

/// Numeric view of a value once booleans have been folded into integers.
#[derive(Debug, Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn as_f64(self) -> f64 {
        match self {
            Num::Int(i) => i as f64,
            Num::Float(f) => f,
        }
    }
}

impl From<Num> for Value {
    fn from(n: Num) -> Self {
        match n {
            Num::Int(i) => Value::Integer(i),
            Num::Float(f) => Value::Float(f),
        }
    }
}

impl Value {
    fn num(self) -> Num {
        match self {
            Value::Integer(i) => Num::Int(i),
            Value::Float(f) => Num::Float(f),
            Value::Bool(b) => Num::Int(b as i64),
        }
    }

    pub fn is_truthy(&self) -> bool {
        match *self {
            Value::Integer(i) => i != 0,
            Value::Float(f) => f != 0.0,
            Value::Bool(b) => b,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Bool(_) => "boolean",
        }
    }

    /// Interprets the value as a program counter.
    ///
    /// Integral floats are accepted, booleans are not.
    pub fn as_pc(&self) -> Result<i64, ExpressionError> {
        match *self {
            Value::Integer(i) => Ok(i),
            Value::Float(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 => {
                Ok(f as i64)
            }
            _ => Err(ExpressionError::NotAProgramCounter { value: *self }),
        }
    }

    pub fn neg(self) -> Result<Value, ExpressionError> {
        match self.num() {
            Num::Int(i) => i
                .checked_neg()
                .map(Value::Integer)
                .ok_or(ExpressionError::Overflow { op: "-" }),
            Num::Float(f) => Ok(Value::Float(-f)),
        }
    }

    pub fn not(self) -> Value {
        Value::Bool(!self.is_truthy())
    }

    pub fn add(self, other: Value) -> Result<Value, ExpressionError> {
        match (self.num(), other.num()) {
            (Num::Int(a), Num::Int(b)) => a
                .checked_add(b)
                .map(Value::Integer)
                .ok_or(ExpressionError::Overflow { op: "+" }),
            (a, b) => Ok(Value::Float(a.as_f64() + b.as_f64())),
        }
    }

    pub fn sub(self, other: Value) -> Result<Value, ExpressionError> {
        match (self.num(), other.num()) {
            (Num::Int(a), Num::Int(b)) => a
                .checked_sub(b)
                .map(Value::Integer)
                .ok_or(ExpressionError::Overflow { op: "-" }),
            (a, b) => Ok(Value::Float(a.as_f64() - b.as_f64())),
        }
    }

    pub fn mul(self, other: Value) -> Result<Value, ExpressionError> {
        match (self.num(), other.num()) {
            (Num::Int(a), Num::Int(b)) => a
                .checked_mul(b)
                .map(Value::Integer)
                .ok_or(ExpressionError::Overflow { op: "*" }),
            (a, b) => Ok(Value::Float(a.as_f64() * b.as_f64())),
        }
    }

    /// True division, always a float.
    pub fn div(self, other: Value) -> Result<Value, ExpressionError> {
        let divisor = other.num().as_f64();
        if divisor == 0.0 {
            return Err(ExpressionError::DivisionByZero);
        }
        Ok(Value::Float(self.num().as_f64() / divisor))
    }

    pub fn floor_div(self, other: Value) -> Result<Value, ExpressionError> {
        match (self.num(), other.num()) {
            (Num::Int(_), Num::Int(0)) => Err(ExpressionError::DivisionByZero),
            (Num::Int(a), Num::Int(b)) => {
                let q = a.checked_div(b).ok_or(ExpressionError::Overflow { op: "//" })?;
                // Round toward negative infinity.
                if (a % b != 0) && ((a < 0) != (b < 0)) {
                    Ok(Value::Integer(q - 1))
                } else {
                    Ok(Value::Integer(q))
                }
            }
            (a, b) => {
                let divisor = b.as_f64();
                if divisor == 0.0 {
                    return Err(ExpressionError::DivisionByZero);
                }
                Ok(Value::Float((a.as_f64() / divisor).floor()))
            }
        }
    }

    /// Remainder carrying the sign of the divisor.
    pub fn rem(self, other: Value) -> Result<Value, ExpressionError> {
        match (self.num(), other.num()) {
            (Num::Int(_), Num::Int(0)) => Err(ExpressionError::DivisionByZero),
            (Num::Int(a), Num::Int(b)) => {
                let r = a.checked_rem(b).ok_or(ExpressionError::Overflow { op: "%" })?;
                if r != 0 && ((r < 0) != (b < 0)) {
                    Ok(Value::Integer(r + b))
                } else {
                    Ok(Value::Integer(r))
                }
            }
            (a, b) => {
                let (a, b) = (a.as_f64(), b.as_f64());
                if b == 0.0 {
                    return Err(ExpressionError::DivisionByZero);
                }
                let r = a % b;
                if r != 0.0 && ((r < 0.0) != (b < 0.0)) {
                    Ok(Value::Float(r + b))
                } else {
                    Ok(Value::Float(r))
                }
            }
        }
    }

    pub fn pow(self, other: Value) -> Result<Value, ExpressionError> {
        match (self.num(), other.num()) {
            (Num::Int(a), Num::Int(b)) if b >= 0 => {
                let exp = u32::try_from(b).map_err(|_| ExpressionError::Overflow { op: "**" })?;
                a.checked_pow(exp)
                    .map(Value::Integer)
                    .ok_or(ExpressionError::Overflow { op: "**" })
            }
            (a, b) => {
                let base = a.as_f64();
                if base == 0.0 && b.as_f64() < 0.0 {
                    return Err(ExpressionError::DivisionByZero);
                }
                Ok(Value::Float(base.powf(b.as_f64())))
            }
        }
    }

    /// Numeric ordering; `None` when a NaN is involved.
    pub fn compare(self, other: Value) -> Option<Ordering> {
        match (self.num(), other.num()) {
            (Num::Int(a), Num::Int(b)) => Some(a.cmp(&b)),
            (a, b) => a.as_f64().partial_cmp(&b.as_f64()),
        }
    }

    pub fn equals(self, other: Value) -> bool {
        self.compare(other) == Some(Ordering::Equal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_division_rounds_down() {
        assert_eq!(Value::Integer(7).floor_div(Value::Integer(2)).unwrap(), Value::Integer(3));
        assert_eq!(Value::Integer(-7).floor_div(Value::Integer(2)).unwrap(), Value::Integer(-4));
        assert_eq!(Value::Float(7.5).floor_div(Value::Integer(2)).unwrap(), Value::Float(3.0));
    }

    #[test]
    fn remainder_follows_divisor_sign() {
        assert_eq!(Value::Integer(-7).rem(Value::Integer(3)).unwrap(), Value::Integer(2));
        assert_eq!(Value::Integer(7).rem(Value::Integer(-3)).unwrap(), Value::Integer(-2));
        assert_eq!(Value::Integer(6).rem(Value::Integer(3)).unwrap(), Value::Integer(0));
    }

    #[test]
    fn division_by_zero_is_an_error() {
        assert_eq!(Value::Integer(1).div(Value::Integer(0)), Err(ExpressionError::DivisionByZero));
        assert_eq!(Value::Integer(1).rem(Value::Bool(false)), Err(ExpressionError::DivisionByZero));
    }

    #[test]
    fn booleans_count_as_integers() {
        assert_eq!(Value::Bool(true).add(Value::Integer(1)).unwrap(), Value::Integer(2));
        assert!(Value::Bool(true).equals(Value::Integer(1)));
    }

    #[test]
    fn overflow_is_reported() {
        assert_eq!(
            Value::Integer(i64::MAX).add(Value::Integer(1)),
            Err(ExpressionError::Overflow { op: "+" })
        );
        assert_eq!(
            Value::Integer(2).pow(Value::Integer(64)),
            Err(ExpressionError::Overflow { op: "**" })
        );
    }

    #[test]
    fn program_counter_coercion() {
        assert_eq!(Value::Integer(-1).as_pc(), Ok(-1));
        assert_eq!(Value::Float(3.0).as_pc(), Ok(3));
        assert!(Value::Float(3.5).as_pc().is_err());
        assert!(Value::Bool(true).as_pc().is_err());
    }
}
