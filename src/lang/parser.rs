use pest::{
    Parser,
    error::InputLocation,
    iterators::Pair,
    pratt_parser::PrattParser,
};
use pest_derive::Parser;

use super::error::ExpressionError;
use super::expression::{BinaryOp, Expr, UnaryOp};
use super::value::Value;

#[derive(Parser)]
#[grammar = "lang/expression.pest"]
struct ExpressionParser;

lazy_static::lazy_static! {
    static ref PRATT_PARSER : PrattParser<Rule> = {
        use pest::pratt_parser::{Assoc::*, Op};
        use Rule::*;
        // Precedence is defined lowest to highest
        PrattParser::new()
            .op(Op::infix(or, Left))
            .op(Op::infix(and, Left))
            .op(Op::prefix(not))
            .op(
                Op::infix(eq, Left) |
                Op::infix(ne, Left) |
                Op::infix(lt, Left) |
                Op::infix(le, Left) |
                Op::infix(gt, Left) |
                Op::infix(ge, Left)
            )
            .op(
                Op::infix(add, Left) |
                Op::infix(sub, Left)
            )
            .op(
                Op::infix(mul, Left) |
                Op::infix(div, Left) |
                Op::infix(floor_div, Left) |
                Op::infix(rem, Left)
            )
            .op(Op::prefix(neg))
            .op(Op::infix(pow, Right))
    };
}

/// Parses a full expression; trailing input is a syntax error.
pub(super) fn parse(source: &str) -> Result<Expr, ExpressionError> {
    let mut pairs = ExpressionParser::parse(Rule::line, source)
        .map_err(|err| syntax_error(source, err))?;
    match pairs.next() {
        Some(pair) => parse_expr(pair),
        None => Err(ExpressionError::Syntax {
            source: source.to_owned(),
            position: 0,
            message: "empty expression".to_owned(),
        }),
    }
}

fn syntax_error(source: &str, err: pest::error::Error<Rule>) -> ExpressionError {
    let err = err.renamed_rules(|rule| describe(rule).to_owned());
    let position = match err.location {
        InputLocation::Pos(pos) => pos,
        InputLocation::Span((start, _)) => start,
    };
    ExpressionError::Syntax {
        source: source.to_owned(),
        position,
        message: err.variant.message().into_owned(),
    }
}

fn describe(rule: &Rule) -> &'static str {
    match rule {
        Rule::int | Rule::float => "number",
        Rule::boolean => "boolean",
        Rule::ident => "name",
        Rule::EOI => "end of expression",
        Rule::kw_if => "`if`",
        Rule::kw_else => "`else`",
        Rule::neg | Rule::not => "unary operator",
        Rule::or | Rule::and | Rule::eq | Rule::ne | Rule::le | Rule::ge
        | Rule::lt | Rule::gt | Rule::add | Rule::sub | Rule::pow
        | Rule::floor_div | Rule::mul | Rule::div | Rule::rem => "operator",
        _ => "expression",
    }
}

fn malformed(pair: &Pair<Rule>) -> ExpressionError {
    ExpressionError::Syntax {
        source: pair.as_str().to_owned(),
        position: 0,
        message: "incomplete expression".to_owned(),
    }
}

fn parse_expr(pair: Pair<Rule>) -> Result<Expr, ExpressionError> {
    let inner = pair.clone().into_inner().next().ok_or_else(|| malformed(&pair))?;
    match inner.as_rule() {
        Rule::assignment => {
            let mut parts = inner.clone().into_inner();
            let name = parts.next().ok_or_else(|| malformed(&inner))?;
            let value = parts.next().ok_or_else(|| malformed(&inner))?;
            Ok(Expr::Assign {
                name: name.as_str().to_owned(),
                value: Box::new(parse_expr(value)?),
            })
        }
        Rule::ternary => parse_ternary(inner),
        _ => unreachable!(),
    }
}

fn parse_ternary(pair: Pair<Rule>) -> Result<Expr, ExpressionError> {
    let mut parts = pair
        .clone()
        .into_inner()
        .filter(|p| !matches!(p.as_rule(), Rule::kw_if | Rule::kw_else));
    let body = parse_operation(parts.next().ok_or_else(|| malformed(&pair))?)?;
    let Some(condition) = parts.next() else {
        return Ok(body);
    };
    let condition = parse_operation(condition)?;
    let otherwise = parse_expr(parts.next().ok_or_else(|| malformed(&pair))?)?;
    Ok(Expr::Conditional {
        condition: Box::new(condition),
        then: Box::new(body),
        otherwise: Box::new(otherwise),
    })
}

/// Operand on the Pratt stack. `chain` marks the result of a comparison that
/// a following comparison operator extends instead of nesting.
struct Operand {
    expr: Expr,
    chain: bool,
}

impl From<Expr> for Operand {
    fn from(expr: Expr) -> Self {
        Operand { expr, chain: false }
    }
}

fn comparison(lhs: Operand, op: BinaryOp, rhs: Expr) -> Operand {
    let expr = match lhs {
        Operand { expr: Expr::Compare(first, mut links), chain: true } => {
            links.push((op, rhs));
            Expr::Compare(first, links)
        }
        Operand { expr: Expr::Binary(prev, a, b), chain: true } => {
            Expr::Compare(a, vec![(prev, *b), (op, rhs)])
        }
        Operand { expr, .. } => Expr::Binary(op, Box::new(expr), Box::new(rhs)),
    };
    Operand { expr, chain: true }
}

fn parse_operation(pair: Pair<Rule>) -> Result<Expr, ExpressionError> {
    PRATT_PARSER
        .map_primary(|primary| parse_primary(primary).map(Operand::from))
        .map_prefix(|op, rhs| {
            let op = match op.as_rule() {
                Rule::neg => UnaryOp::Neg,
                Rule::not => UnaryOp::Not,
                _ => unreachable!(),
            };
            Ok(Expr::Unary(op, Box::new(rhs?.expr)).into())
        })
        .map_infix(|lhs, op, rhs| {
            let op = match op.as_rule() {
                Rule::or => BinaryOp::Or,
                Rule::and => BinaryOp::And,
                Rule::eq => BinaryOp::Eq,
                Rule::ne => BinaryOp::Ne,
                Rule::lt => BinaryOp::Lt,
                Rule::le => BinaryOp::Le,
                Rule::gt => BinaryOp::Gt,
                Rule::ge => BinaryOp::Ge,
                Rule::add => BinaryOp::Add,
                Rule::sub => BinaryOp::Sub,
                Rule::mul => BinaryOp::Mul,
                Rule::div => BinaryOp::Div,
                Rule::floor_div => BinaryOp::FloorDiv,
                Rule::rem => BinaryOp::Rem,
                Rule::pow => BinaryOp::Pow,
                _ => unreachable!(),
            };
            let (lhs, rhs) = (lhs?, rhs?.expr);
            if op.is_comparison() {
                return Ok(comparison(lhs, op, rhs));
            }
            Ok(Expr::Binary(op, Box::new(lhs.expr), Box::new(rhs)).into())
        })
        .parse(pair.into_inner())
        .map(|operand| operand.expr)
}

fn parse_primary(pair: Pair<Rule>) -> Result<Expr, ExpressionError> {
    match pair.as_rule() {
        Rule::int => pair
            .as_str()
            .parse::<i64>()
            .map(|i| Expr::Literal(Value::Integer(i)))
            .map_err(|_| ExpressionError::IntegerOutOfRange {
                literal: pair.as_str().to_owned(),
            }),
        Rule::float => pair
            .as_str()
            .parse::<f64>()
            .map(|f| Expr::Literal(Value::Float(f)))
            .map_err(|_| malformed(&pair)),
        Rule::boolean => Ok(Expr::Literal(Value::Bool(matches!(
            pair.as_str(),
            "True" | "true"
        )))),
        Rule::ident => Ok(Expr::Var(pair.as_str().to_owned())),
        Rule::expr => parse_expr(pair),
        _ => unreachable!(),
    }
}
