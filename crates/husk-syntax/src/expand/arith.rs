//! Arithmetic expansion
//!
//! Expressions are parsed by `brush_parser::arithmetic` and evaluated here
//! with 64-bit integers that wrap on overflow, like the shells do.
//! Assignments such as `x += 2` only last for the expression: the values go
//! to a scratch table in front of the environment, which is never written.

use super::{Environ, ExpandError, ExpandResult};
use brush_parser::ast::{
    ArithmeticExpr, ArithmeticTarget, BinaryOperator, UnaryAssignmentOperator, UnaryOperator,
};
use std::collections::HashMap;

/// How deep variables holding expressions may refer to other variables
const MAX_DEPTH: usize = 32;

pub(super) fn eval(expr: &str, env: &dyn Environ) -> ExpandResult<i64> {
    let mut eval = Eval {
        env,
        scratch: HashMap::new(),
        depth: 0,
    };
    eval.text(expr)
}

struct Eval<'a> {
    env: &'a dyn Environ,
    scratch: HashMap<String, i64>,
    depth: usize,
}

impl Eval<'_> {
    fn text(&mut self, expr: &str) -> ExpandResult<i64> {
        let expr = expr.trim();
        if expr.is_empty() {
            return Ok(0);
        }
        let parsed = brush_parser::arithmetic::parse(expr).map_err(|e| {
            ExpandError::Arithmetic(format!("invalid arithmetic expression '{expr}': {e:?}"))
        })?;
        self.expr(&parsed)
    }

    fn expr(&mut self, expr: &ArithmeticExpr) -> ExpandResult<i64> {
        match expr {
            ArithmeticExpr::Literal(n) => Ok(*n),
            ArithmeticExpr::Reference(target) => self.get(target),
            ArithmeticExpr::UnaryOp(op, operand) => {
                let value = self.expr(operand)?;
                Ok(match op {
                    UnaryOperator::UnaryPlus => value,
                    UnaryOperator::UnaryMinus => value.wrapping_neg(),
                    UnaryOperator::LogicalNot => i64::from(value == 0),
                    UnaryOperator::BitwiseNot => !value,
                })
            }
            ArithmeticExpr::BinaryOp(BinaryOperator::LogicalAnd, left, right) => {
                Ok(i64::from(self.expr(left)? != 0 && self.expr(right)? != 0))
            }
            ArithmeticExpr::BinaryOp(BinaryOperator::LogicalOr, left, right) => {
                Ok(i64::from(self.expr(left)? != 0 || self.expr(right)? != 0))
            }
            ArithmeticExpr::BinaryOp(op, left, right) => {
                let left = self.expr(left)?;
                let right = self.expr(right)?;
                binary(op, left, right)
            }
            ArithmeticExpr::Conditional(cond, then, otherwise) => {
                if self.expr(cond)? != 0 {
                    self.expr(then)
                } else {
                    self.expr(otherwise)
                }
            }
            ArithmeticExpr::Assignment(target, value) => {
                let value = self.expr(value)?;
                self.set(target, value)?;
                Ok(value)
            }
            ArithmeticExpr::BinaryAssignment(op, target, value) => {
                let current = self.get(target)?;
                let rhs = self.expr(value)?;
                let value = binary(op, current, rhs)?;
                self.set(target, value)?;
                Ok(value)
            }
            ArithmeticExpr::UnaryAssignment(op, target) => {
                let current = self.get(target)?;
                let (result, value) = match op {
                    UnaryAssignmentOperator::PrefixIncrement => {
                        (current.wrapping_add(1), current.wrapping_add(1))
                    }
                    UnaryAssignmentOperator::PrefixDecrement => {
                        (current.wrapping_sub(1), current.wrapping_sub(1))
                    }
                    UnaryAssignmentOperator::PostfixIncrement => (current, current.wrapping_add(1)),
                    UnaryAssignmentOperator::PostfixDecrement => (current, current.wrapping_sub(1)),
                };
                self.set(target, value)?;
                Ok(result)
            }
        }
    }

    fn name(&mut self, target: &ArithmeticTarget) -> ExpandResult<String> {
        match target {
            ArithmeticTarget::Variable(name) => Ok(name.clone()),
            ArithmeticTarget::ArrayElement(name, index) => match self.expr(index)? {
                0 => Ok(name.clone()),
                _ => Err(ExpandError::Arithmetic(format!(
                    "{name}: arrays are not supported"
                ))),
            },
        }
    }

    fn get(&mut self, target: &ArithmeticTarget) -> ExpandResult<i64> {
        let name = self.name(target)?;
        if let Some(value) = self.scratch.get(&name) {
            return Ok(*value);
        }
        let value = self.env.lookup(&name)?.unwrap_or_default();
        let value = value.trim();
        if value.is_empty() {
            return Ok(0);
        }
        if let Some(n) = parse_number(value) {
            return Ok(n);
        }
        if self.depth >= MAX_DEPTH {
            return Err(ExpandError::Arithmetic(format!(
                "{name}: expression recursion level exceeded"
            )));
        }
        self.depth += 1;
        let result = self.text(value);
        self.depth -= 1;
        result
    }

    fn set(&mut self, target: &ArithmeticTarget, value: i64) -> ExpandResult<()> {
        let name = self.name(target)?;
        self.scratch.insert(name, value);
        Ok(())
    }
}

fn binary(op: &BinaryOperator, left: i64, right: i64) -> ExpandResult<i64> {
    Ok(match op {
        BinaryOperator::Add => left.wrapping_add(right),
        BinaryOperator::Subtract => left.wrapping_sub(right),
        BinaryOperator::Multiply => left.wrapping_mul(right),
        BinaryOperator::Divide | BinaryOperator::Modulo if right == 0 => {
            return Err(ExpandError::Arithmetic("division by zero".to_string()));
        }
        BinaryOperator::Divide => left.wrapping_div(right),
        BinaryOperator::Modulo => left.wrapping_rem(right),
        BinaryOperator::Power => match u32::try_from(right) {
            Ok(exp) => left.wrapping_pow(exp),
            Err(_) if right < 0 => {
                return Err(ExpandError::Arithmetic("exponent less than 0".to_string()));
            }
            Err(_) => left.wrapping_pow(u32::MAX),
        },
        BinaryOperator::BitwiseAnd => left & right,
        BinaryOperator::BitwiseOr => left | right,
        BinaryOperator::BitwiseXor => left ^ right,
        BinaryOperator::ShiftLeft => left.wrapping_shl(right as u32),
        BinaryOperator::ShiftRight => left.wrapping_shr(right as u32),
        BinaryOperator::LessThan => i64::from(left < right),
        BinaryOperator::LessThanOrEqualTo => i64::from(left <= right),
        BinaryOperator::GreaterThan => i64::from(left > right),
        BinaryOperator::GreaterThanOrEqualTo => i64::from(left >= right),
        BinaryOperator::Equals => i64::from(left == right),
        BinaryOperator::NotEquals => i64::from(left != right),
        BinaryOperator::Comma => right,
        BinaryOperator::LogicalAnd => i64::from(left != 0 && right != 0),
        BinaryOperator::LogicalOr => i64::from(left != 0 || right != 0),
    })
}

/// Decimal, `0x` hexadecimal or leading-zero octal, with an optional sign
fn parse_number(text: &str) -> Option<i64> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let value = if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).ok()? as i64
    } else if digits.len() > 1 && digits.starts_with('0') {
        u64::from_str_radix(&digits[1..], 8).ok()? as i64
    } else {
        digits.parse::<u64>().ok()? as i64
    };
    Some(if negative { value.wrapping_neg() } else { value })
}
