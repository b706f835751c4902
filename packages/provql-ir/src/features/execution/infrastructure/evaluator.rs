//! Predicate evaluation over in-memory rows
//!
//! `None` is SQL NULL. Comparisons and arithmetic involving NULL yield NULL,
//! and a WHERE clause keeps a row only when the predicate is `TRUE`.

use crate::features::execution::domain::{ExecutionError, ExecutionResult, Row};
use crate::features::ir_generation::IRExpr;
use crate::features::parsing::{BinaryOp, UnaryOp};
use crate::shared::models::Value;
use std::cmp::Ordering;

pub fn evaluate(expr: &IRExpr, row: &Row) -> ExecutionResult<Option<Value>> {
    match expr {
        IRExpr::Column { name, .. } => Ok(row.get(name).cloned()),
        IRExpr::Literal(value) => Ok(Some(value.value().clone())),
        IRExpr::IsNull { operand, negated } => {
            let is_null = evaluate(operand, row)?.is_none();
            Ok(Some(Value::Bool(is_null != *negated)))
        }
        IRExpr::Unary { op, operand } => {
            let Some(value) = evaluate(operand, row)? else {
                return Ok(None);
            };
            unary(*op, value).map(Some)
        }
        IRExpr::Binary { op, left, right } if op.is_logical() => {
            let left = truth(evaluate(left, row)?)?;
            // three-valued AND/OR
            match (op, left) {
                (BinaryOp::And, Some(false)) => return Ok(Some(Value::Bool(false))),
                (BinaryOp::Or, Some(true)) => return Ok(Some(Value::Bool(true))),
                _ => {}
            }
            let right = truth(evaluate(right, row)?)?;
            Ok(match (op, left, right) {
                (BinaryOp::And, _, Some(false)) => Some(Value::Bool(false)),
                (BinaryOp::Or, _, Some(true)) => Some(Value::Bool(true)),
                (_, Some(l), Some(r)) => Some(Value::Bool(if *op == BinaryOp::And {
                    l && r
                } else {
                    l || r
                })),
                _ => None,
            })
        }
        IRExpr::Binary { op, left, right } => {
            let (Some(left), Some(right)) = (evaluate(left, row)?, evaluate(right, row)?) else {
                return Ok(None);
            };
            binary(*op, &left, &right).map(Some)
        }
    }
}

fn truth(value: Option<Value>) -> ExecutionResult<Option<bool>> {
    match value {
        None => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(b)),
        Some(other) => Err(ExecutionError::evaluation(format!(
            "expected boolean, found {}",
            other.kind_name()
        ))),
    }
}

fn unary(op: UnaryOp, value: Value) -> ExecutionResult<Value> {
    match (op, value) {
        (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (UnaryOp::Plus, v @ (Value::Nat(_) | Value::Int(_) | Value::Float(_))) => Ok(v),
        (UnaryOp::Neg, Value::Int(i)) => i
            .checked_neg()
            .map(Value::Int)
            .ok_or_else(|| ExecutionError::evaluation("integer overflow")),
        (UnaryOp::Neg, Value::Nat(n)) => i64::try_from(n)
            .map(|n| Value::Int(-n))
            .map_err(|_| ExecutionError::evaluation("integer overflow")),
        (UnaryOp::Neg, Value::Float(x)) => Ok(Value::Float(-x)),
        (op, value) => Err(ExecutionError::evaluation(format!(
            "cannot apply {} to {}",
            op.as_str(),
            value.kind_name()
        ))),
    }
}

fn binary(op: BinaryOp, left: &Value, right: &Value) -> ExecutionResult<Value> {
    if op.is_comparison() {
        let ordering = compare_values(left, right).ok_or_else(|| {
            ExecutionError::evaluation(format!(
                "cannot compare {} with {}",
                left.kind_name(),
                right.kind_name()
            ))
        })?;
        let holds = match op {
            BinaryOp::Eq => ordering == Ordering::Equal,
            BinaryOp::NotEq => ordering != Ordering::Equal,
            BinaryOp::Lt => ordering == Ordering::Less,
            BinaryOp::LtEq => ordering != Ordering::Greater,
            BinaryOp::Gt => ordering == Ordering::Greater,
            _ => ordering != Ordering::Less,
        };
        return Ok(Value::Bool(holds));
    }
    match (op, left, right) {
        (BinaryOp::Concat, Value::Text(a), Value::Text(b)) => Ok(Value::Text(format!("{}{}", a, b))),
        (_, Value::Nat(a), Value::Nat(b)) => nat_arithmetic(op, *a, *b),
        _ => float_arithmetic(op, left, right),
    }
}

fn nat_arithmetic(op: BinaryOp, a: u64, b: u64) -> ExecutionResult<Value> {
    let overflow = || ExecutionError::evaluation("integer overflow");
    let result = match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Sub if a >= b => Some(a - b),
        BinaryOp::Sub => {
            return i64::try_from(a as i128 - b as i128)
                .map(Value::Int)
                .map_err(|_| overflow())
        }
        BinaryOp::Mul => a.checked_mul(b),
        BinaryOp::Div | BinaryOp::Mod if b == 0 => {
            return Err(ExecutionError::evaluation("division by zero"))
        }
        BinaryOp::Div => Some(a / b),
        BinaryOp::Mod => Some(a % b),
        BinaryOp::Pow => u32::try_from(b).ok().and_then(|b| a.checked_pow(b)),
        other => {
            return Err(ExecutionError::evaluation(format!(
                "{} is not arithmetic",
                other
            )))
        }
    };
    result.map(Value::Nat).ok_or_else(overflow)
}

fn float_arithmetic(op: BinaryOp, left: &Value, right: &Value) -> ExecutionResult<Value> {
    let (Some(a), Some(b)) = (left.as_f64(), right.as_f64()) else {
        return Err(ExecutionError::evaluation(format!(
            "cannot apply {} to {} and {}",
            op,
            left.kind_name(),
            right.kind_name()
        )));
    };
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div if b == 0.0 => return Err(ExecutionError::evaluation("division by zero")),
        BinaryOp::Div => a / b,
        BinaryOp::Mod => a % b,
        BinaryOp::Pow => a.powf(b),
        other => {
            return Err(ExecutionError::evaluation(format!(
                "{} is not arithmetic",
                other
            )))
        }
    };
    Ok(Value::Float(result))
}

/// Ordering between two values of compatible kinds
pub fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Nat(a), Value::Nat(b)) => Some(a.cmp(b)),
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::Nat(a), Value::Int(b)) => Some((*a as i128).cmp(&(*b as i128))),
        (Value::Int(a), Value::Nat(b)) => Some((*a as i128).cmp(&(*b as i128))),
        (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Uuid(a), Value::Uuid(b)) => Some(a.cmp(b)),
        (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
        (Value::Vector(a), Value::Vector(b)) => {
            for (x, y) in a.iter().zip(b) {
                match compare_values(x, y)? {
                    Ordering::Equal => continue,
                    other => return Some(other),
                }
            }
            Some(a.len().cmp(&b.len()))
        }
        (Value::Scores(a), Value::Scores(b)) => (a == b).then_some(Ordering::Equal),
        (a, b) => a.as_f64()?.partial_cmp(&b.as_f64()?),
    }
}
