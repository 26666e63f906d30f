use std::fmt;

use crate::error::Error;
use crate::lang::{Environment, Expression, ExpressionError};

use super::error::ProgramError;
use super::Pc;

/// What an instruction does to the environment before control moves on.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// `pass`
    Nop,
    /// `assign <name>=<expr>`, held as the expression `name := expr`.
    Assign { name: String, assignment: Expression },
    /// `exit`. Halting itself is decided by the `nextpc` expression.
    Terminate,
}

impl Effect {
    /// Parses a `meta` descriptor of the instruction at `pc`.
    pub fn parse(pc: Pc, descriptor: &str) -> Result<Effect, Error> {
        let descriptor = descriptor.trim();
        match descriptor {
            "pass" => return Ok(Effect::Nop),
            "exit" => return Ok(Effect::Terminate),
            _ => (),
        }
        let unknown = || ProgramError::UnknownEffect {
            pc,
            descriptor: descriptor.to_owned(),
        };
        let invalid = || ProgramError::InvalidAssignment {
            pc,
            descriptor: descriptor.to_owned(),
        };
        let rest = descriptor.strip_prefix("assign").ok_or_else(unknown)?;
        if !rest.starts_with(char::is_whitespace) {
            return Err(unknown().into());
        }
        let (name, expr) = rest.split_once('=').ok_or_else(invalid)?;
        let name = name.trim();
        if !is_identifier(name) {
            return Err(invalid().into());
        }
        let value = Expression::parse(expr.trim()).map_err(|source| Error::Expression {
            pc,
            field: format!("assign {}", name),
            text: expr.trim().to_owned(),
            source,
        })?;
        Ok(Effect::Assign {
            name: name.to_owned(),
            assignment: Expression::assignment(name, value),
        })
    }

    pub fn apply(&self, env: &mut Environment) -> Result<(), ExpressionError> {
        match self {
            Effect::Nop | Effect::Terminate => Ok(()),
            Effect::Assign { assignment, .. } => assignment.evaluate_mut(env).map(|_| ()),
        }
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Effect::Nop => write!(f, "pass"),
            Effect::Assign { assignment, .. } => write!(f, "assign {}", assignment),
            Effect::Terminate => write!(f, "exit"),
        }
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !matches!(
            name,
            "and" | "or" | "not" | "if" | "else" | "True" | "true" | "False" | "false"
        )
}
