use std::{fmt, str::FromStr};

use super::environment::Environment;
use super::error::ExpressionError;
use super::parser;
use super::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Rem,
    Pow,
}

/// Parsed expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Var(String),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    /// Chained comparison `a < b <= c`: every link must hold, each operand
    /// is evaluated at most once and evaluation stops at the first false link.
    Compare(Box<Expr>, Vec<(BinaryOp, Expr)>),
    /// `then if condition else otherwise`
    Conditional {
        condition: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
    },
    /// `name := value`, yields `True` once the binding is recorded.
    Assign {
        name: String,
        value: Box<Expr>,
    },
}

/// Where names are resolved and, when permitted, bound.
trait Scope {
    fn lookup(&self, name: &str) -> Option<Value>;
    fn assign(&mut self, name: &str, value: Value) -> Result<(), ExpressionError>;
}

/// Reads through to a snapshot; bindings made during evaluation stay local.
struct Scratch<'a> {
    base: &'a Environment,
    locals: Environment,
}

impl Scope for Scratch<'_> {
    fn lookup(&self, name: &str) -> Option<Value> {
        self.locals.get(name).or_else(|| self.base.get(name))
    }

    fn assign(&mut self, name: &str, value: Value) -> Result<(), ExpressionError> {
        self.locals.bind(name, value);
        Ok(())
    }
}

impl Scope for Environment {
    fn lookup(&self, name: &str) -> Option<Value> {
        self.get(name)
    }

    fn assign(&mut self, name: &str, value: Value) -> Result<(), ExpressionError> {
        self.bind(name, value);
        Ok(())
    }
}

fn compare(op: BinaryOp, l: Value, r: Value) -> bool {
    match op {
        BinaryOp::Eq => l.equals(r),
        BinaryOp::Ne => !l.equals(r),
        BinaryOp::Lt => l.compare(r).is_some_and(|o| o.is_lt()),
        BinaryOp::Le => l.compare(r).is_some_and(|o| o.is_le()),
        BinaryOp::Gt => l.compare(r).is_some_and(|o| o.is_gt()),
        BinaryOp::Ge => l.compare(r).is_some_and(|o| o.is_ge()),
        _ => unreachable!(),
    }
}

impl BinaryOp {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }
}

impl Expr {
    fn eval<S: Scope>(&self, scope: &mut S) -> Result<Value, ExpressionError> {
        match self {
            Expr::Literal(v) => Ok(*v),
            Expr::Var(name) => scope
                .lookup(name)
                .ok_or_else(|| ExpressionError::UndefinedName { name: name.clone() }),
            Expr::Unary(op, operand) => {
                let v = operand.eval(scope)?;
                match op {
                    UnaryOp::Neg => v.neg(),
                    UnaryOp::Not => Ok(v.not()),
                }
            }
            Expr::Binary(BinaryOp::And, lhs, rhs) => {
                let l = lhs.eval(scope)?;
                if l.is_truthy() { rhs.eval(scope) } else { Ok(l) }
            }
            Expr::Binary(BinaryOp::Or, lhs, rhs) => {
                let l = lhs.eval(scope)?;
                if l.is_truthy() { Ok(l) } else { rhs.eval(scope) }
            }
            Expr::Binary(op, lhs, rhs) => {
                let l = lhs.eval(scope)?;
                let r = rhs.eval(scope)?;
                match op {
                    BinaryOp::Add => l.add(r),
                    BinaryOp::Sub => l.sub(r),
                    BinaryOp::Mul => l.mul(r),
                    BinaryOp::Div => l.div(r),
                    BinaryOp::FloorDiv => l.floor_div(r),
                    BinaryOp::Rem => l.rem(r),
                    BinaryOp::Pow => l.pow(r),
                    BinaryOp::Eq
                    | BinaryOp::Ne
                    | BinaryOp::Lt
                    | BinaryOp::Le
                    | BinaryOp::Gt
                    | BinaryOp::Ge => Ok(Value::Bool(compare(*op, l, r))),
                    BinaryOp::And | BinaryOp::Or => unreachable!(),
                }
            }
            Expr::Compare(first, links) => {
                let mut left = first.eval(scope)?;
                for (op, operand) in links {
                    let right = operand.eval(scope)?;
                    if !compare(*op, left, right) {
                        return Ok(Value::Bool(false));
                    }
                    left = right;
                }
                Ok(Value::Bool(true))
            }
            Expr::Conditional { condition, then, otherwise } => {
                if condition.eval(scope)?.is_truthy() {
                    then.eval(scope)
                } else {
                    otherwise.eval(scope)
                }
            }
            Expr::Assign { name, value } => {
                let v = value.eval(scope)?;
                scope.assign(name, v)?;
                Ok(Value::Bool(true))
            }
        }
    }
}

/// An expression together with the text it was parsed from.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    source: String,
    ast: Expr,
}

impl Expression {
    pub fn parse(source: &str) -> Result<Self, ExpressionError> {
        Ok(Expression {
            source: source.trim().to_owned(),
            ast: parser::parse(source)?,
        })
    }

    /// Builds `name := value`.
    pub fn assignment(name: &str, value: Expression) -> Self {
        Expression {
            source: format!("{} := {}", name, value.source),
            ast: Expr::Assign {
                name: name.to_owned(),
                value: Box::new(value.ast),
            },
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn ast(&self) -> &Expr {
        &self.ast
    }

    /// Evaluates without touching `env`. Names bound with `:=` are visible
    /// for the rest of this evaluation only.
    pub fn evaluate(&self, env: &Environment) -> Result<Value, ExpressionError> {
        self.ast.eval(&mut Scratch {
            base: env,
            locals: Environment::new(),
        })
    }

    /// Evaluates with assignments recorded into `env`.
    pub fn evaluate_mut(&self, env: &mut Environment) -> Result<Value, ExpressionError> {
        self.ast.eval(env)
    }

    pub fn evaluate_pc(&self, env: &Environment) -> Result<i64, ExpressionError> {
        self.evaluate(env)?.as_pc()
    }
}

impl FromStr for Expression {
    type Err = ExpressionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Expression::parse(s)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Parses and evaluates `source` against `env` in one go.
pub fn evaluate(source: &str, env: &Environment) -> Result<Value, ExpressionError> {
    Expression::parse(source)?.evaluate(env)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(vars: &[(&str, Value)]) -> Environment {
        vars.iter().map(|(k, v)| (*k, *v)).collect()
    }

    #[test]
    fn resolves_every_bound_name() {
        let env = env(&[
            ("a", Value::Integer(2)),
            ("b", Value::Integer(5)),
            ("c", Value::Bool(true)),
        ]);
        assert_eq!(evaluate("a * b + c", &env), Ok(Value::Integer(11)));
        assert_eq!(evaluate("a < b and c", &env), Ok(Value::Bool(true)));
    }

    #[test]
    fn undefined_name() {
        assert_eq!(
            evaluate("x + 1", &Environment::new()),
            Err(ExpressionError::UndefinedName { name: "x".to_owned() })
        );
    }

    #[test]
    fn short_circuit_skips_undefined_names() {
        let empty = Environment::new();
        assert_eq!(evaluate("False and missing", &empty), Ok(Value::Bool(false)));
        assert_eq!(evaluate("1 or missing", &empty), Ok(Value::Integer(1)));
        assert!(evaluate("True and missing", &empty).is_err());
    }

    #[test]
    fn conditional_picks_branch() {
        let env = env(&[("i", Value::Integer(3))]);
        assert_eq!(evaluate("2 if i < 3 else 5", &env), Ok(Value::Integer(5)));
        assert_eq!(evaluate("2 if i <= 3 else 5", &env), Ok(Value::Integer(2)));
    }

    #[test]
    fn true_division_yields_float() {
        let empty = Environment::new();
        assert_eq!(evaluate("7 / 2", &empty), Ok(Value::Float(3.5)));
        assert_eq!(evaluate("7 // 2", &empty), Ok(Value::Integer(3)));
        assert_eq!(evaluate("-7 % 3", &empty), Ok(Value::Integer(2)));
    }

    #[test]
    fn read_only_bindings_stay_local() {
        let env = env(&[("i", Value::Integer(2))]);
        assert_eq!(evaluate("(t := i + 1) and t", &env), Ok(Value::Integer(3)));
        assert_eq!(evaluate("(i := 10) and i", &env), Ok(Value::Integer(10)));
        assert_eq!(env.get("i"), Some(Value::Integer(2)));
        assert!(!env.contains("t"));
    }

    #[test]
    fn comparisons_chain() {
        let five = env(&[("x", Value::Integer(5))]);
        let two = env(&[("x", Value::Integer(2))]);
        assert_eq!(evaluate("1 < x < 3", &five), Ok(Value::Bool(false)));
        assert_eq!(evaluate("1 < x < 3", &two), Ok(Value::Bool(true)));
        assert_eq!(evaluate("1 < x <= 2 == x", &two), Ok(Value::Bool(true)));
        // Parentheses end the chain: `True < 3`.
        assert_eq!(evaluate("(1 < x) < 3", &five), Ok(Value::Bool(true)));
        assert_eq!(evaluate("2 if 0 < x < 3 else 9", &five), Ok(Value::Integer(9)));
    }

    #[test]
    fn chain_stops_at_first_false_link() {
        let empty = Environment::new();
        assert_eq!(evaluate("5 < 1 < missing", &empty), Ok(Value::Bool(false)));
        assert!(evaluate("1 < 5 < missing", &empty).is_err());
    }

    #[test]
    fn chain_evaluates_each_operand_once() {
        let mut env = env(&[("n", Value::Integer(0))]);
        let chain = Expression::parse("0 < (n := n + 1) < 2").unwrap();
        assert_eq!(chain.evaluate_mut(&mut env), Ok(Value::Bool(true)));
        assert_eq!(env.get("n"), Some(Value::Integer(1)));
    }

    #[test]
    fn assignment_binds_and_keeps_previous_names() {
        let mut env = env(&[("a", Value::Integer(1))]);
        let assign = Expression::assignment("b", Expression::parse("a + 1").unwrap());
        assert_eq!(assign.source(), "b := a + 1");
        assert_eq!(assign.evaluate_mut(&mut env), Ok(Value::Bool(true)));
        assert_eq!(env.get("a"), Some(Value::Integer(1)));
        assert_eq!(env.get("b"), Some(Value::Integer(2)));
    }

    #[test]
    fn assignment_overwrites() {
        let mut env = env(&[("n", Value::Integer(1))]);
        Expression::parse("n := n * 10").unwrap().evaluate_mut(&mut env).unwrap();
        assert_eq!(env.get("n"), Some(Value::Integer(10)));
    }

    #[test]
    fn program_counter_results() {
        let env = env(&[("i", Value::Integer(4))]);
        assert_eq!(Expression::parse("i - 5").unwrap().evaluate_pc(&env), Ok(-1));
        assert_eq!(Expression::parse("i / 2").unwrap().evaluate_pc(&env), Ok(2));
        assert!(matches!(
            Expression::parse("i > 2").unwrap().evaluate_pc(&env),
            Err(ExpressionError::NotAProgramCounter { .. })
        ));
    }

    #[test]
    fn same_snapshot_same_value() {
        let env = env(&[("x", Value::Float(1.5)), ("y", Value::Integer(3))]);
        let expr = Expression::parse("x * y ** 2 - y // 2").unwrap();
        let first = expr.evaluate(&env);
        for _ in 0..10 {
            assert_eq!(expr.evaluate(&env), first);
        }
    }
}
