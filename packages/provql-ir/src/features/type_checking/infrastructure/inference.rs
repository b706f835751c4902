//! Literal inference, coercion and constant folding
//!
//! Inferred literals take the narrowest type that fits the literal's shape.
//! Assignability to a column then follows a fixed table:
//!
//! | literal  | assignable to                                  |
//! |----------|------------------------------------------------|
//! | natural  | Nat, Int, Float, BoundedNat, BoundedFloat,     |
//! |          | Confidence, Timestamp                          |
//! | integer  | Int, Float, BoundedFloat, Confidence, Timestamp |
//! | float    | Float, BoundedFloat, Confidence                |
//! | string   | String, NonEmptyString, Uuid, Timestamp        |
//! | boolean  | Bool                                           |
//! | `[..]`   | Vector (element-wise)                          |
//! | `{..}`   | PromptScores                                   |

use crate::features::parsing::{BinaryOp, Expr, Literal, UnaryOp};
use crate::shared::models::{rfc3339_to_timestamp, PromptScores, TypeExpr, Value};
use uuid::Uuid;

/// Coercion failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Coercion {
    /// The literal's shape cannot inhabit the target type
    NotAssignable,
    /// The shape fits but the content is invalid (bad UUID, bad timestamp, ...)
    Invalid(String),
}

/// Narrowest type of a literal
pub fn infer_literal(literal: &Literal) -> Result<TypeExpr, String> {
    match literal {
        Literal::Natural(_) => Ok(TypeExpr::Nat),
        Literal::Integer(_) => Ok(TypeExpr::Int),
        Literal::Float(_) => Ok(TypeExpr::Float),
        Literal::String(_) => Ok(TypeExpr::String),
        Literal::Boolean(_) => Ok(TypeExpr::Bool),
        Literal::Null => Err("NULL has no type".to_string()),
        Literal::Record(_) => Ok(TypeExpr::PromptScores),
        Literal::Vector(items) => {
            let first = items
                .first()
                .ok_or_else(|| "cannot infer the element type of an empty vector".to_string())?;
            let mut element = infer_literal(first)?;
            for item in &items[1..] {
                let next = infer_literal(item)?;
                element = widen(&element, &next).ok_or_else(|| {
                    format!("vector mixes {} and {} elements", element, next)
                })?;
            }
            Ok(TypeExpr::vector(element, items.len()))
        }
    }
}

/// Common type of two inferred element types (`Nat` widens to `Int` or `Float`)
fn widen(a: &TypeExpr, b: &TypeExpr) -> Option<TypeExpr> {
    match (a, b) {
        _ if a == b => Some(a.clone()),
        (TypeExpr::Nat, TypeExpr::Int) | (TypeExpr::Int, TypeExpr::Nat) => Some(TypeExpr::Int),
        (TypeExpr::Nat | TypeExpr::Int, TypeExpr::Float)
        | (TypeExpr::Float, TypeExpr::Nat | TypeExpr::Int) => Some(TypeExpr::Float),
        _ => None,
    }
}

/// Convert a literal to the runtime representation of `target`
///
/// Only the shape is checked here; refinements are left to the verifier.
pub fn coerce_literal(literal: &Literal, target: &TypeExpr) -> Result<Value, Coercion> {
    match (literal, target) {
        (Literal::Natural(n), TypeExpr::Nat | TypeExpr::BoundedNat { .. }) => Ok(Value::Nat(*n)),
        (Literal::Natural(n), TypeExpr::Int) => i64::try_from(*n)
            .map(Value::Int)
            .map_err(|_| Coercion::Invalid(format!("{} does not fit in Int", n))),
        (
            Literal::Natural(n),
            TypeExpr::Float | TypeExpr::BoundedFloat { .. } | TypeExpr::Confidence,
        ) => Ok(Value::Float(*n as f64)),
        (Literal::Natural(n), TypeExpr::Timestamp) => i64::try_from(*n)
            .map(Value::Timestamp)
            .map_err(|_| Coercion::Invalid(format!("{} is out of timestamp range", n))),

        (Literal::Integer(i), TypeExpr::Int) => Ok(Value::Int(*i)),
        (
            Literal::Integer(i),
            TypeExpr::Float | TypeExpr::BoundedFloat { .. } | TypeExpr::Confidence,
        ) => Ok(Value::Float(*i as f64)),
        (Literal::Integer(i), TypeExpr::Timestamp) => Ok(Value::Timestamp(*i)),

        (
            Literal::Float(x),
            TypeExpr::Float | TypeExpr::BoundedFloat { .. } | TypeExpr::Confidence,
        ) => Ok(Value::Float(*x)),

        (Literal::String(s), TypeExpr::String | TypeExpr::NonEmptyString) => {
            Ok(Value::Text(s.clone()))
        }
        (Literal::String(s), TypeExpr::Uuid) => Uuid::parse_str(s)
            .map(Value::Uuid)
            .map_err(|e| Coercion::Invalid(format!("invalid UUID {:?}: {}", s, e))),
        (Literal::String(s), TypeExpr::Timestamp) => rfc3339_to_timestamp(s)
            .map(Value::Timestamp)
            .ok_or_else(|| Coercion::Invalid(format!("invalid RFC 3339 timestamp {:?}", s))),

        (Literal::Boolean(b), TypeExpr::Bool) => Ok(Value::Bool(*b)),

        (Literal::Vector(items), TypeExpr::Vector(element, _)) => items
            .iter()
            .map(|item| coerce_literal(item, element))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Vector),

        (Literal::Record(fields), TypeExpr::PromptScores) => {
            let mut entries = Vec::with_capacity(fields.len());
            for (name, value) in fields {
                match value {
                    Literal::Natural(n) => entries.push((name.as_str(), *n)),
                    other => {
                        return Err(Coercion::Invalid(format!(
                            "prompt score '{}' must be a natural number, found {}",
                            name, other
                        )))
                    }
                }
            }
            PromptScores::from_entries(entries)
                .map(Value::Scores)
                .map_err(Coercion::Invalid)
        }

        _ => Err(Coercion::NotAssignable),
    }
}

/// Arithmetic intermediate: integers are exact in i128
#[derive(Debug, Clone, Copy)]
enum Number {
    Exact(i128),
    Approx(f64),
}

impl Number {
    fn from_literal(literal: &Literal) -> Option<Self> {
        match literal {
            Literal::Natural(n) => Some(Self::Exact(*n as i128)),
            Literal::Integer(i) => Some(Self::Exact(*i as i128)),
            Literal::Float(x) => Some(Self::Approx(*x)),
            _ => None,
        }
    }

    fn to_f64(self) -> f64 {
        match self {
            Self::Exact(i) => i as f64,
            Self::Approx(x) => x,
        }
    }

    fn into_literal(self) -> Result<Literal, String> {
        match self {
            Self::Approx(x) => Ok(Literal::Float(x)),
            Self::Exact(i) if i >= 0 => u64::try_from(i)
                .map(Literal::Natural)
                .map_err(|_| "integer overflow in constant expression".to_string()),
            Self::Exact(i) => i64::try_from(i)
                .map(Literal::Integer)
                .map_err(|_| "integer overflow in constant expression".to_string()),
        }
    }
}

/// Fold a column-free expression to a literal
///
/// Supports unary sign, arithmetic and string concatenation. Errors are
/// plain messages; the caller attaches position and column.
pub fn fold_constant(expr: &Expr) -> Result<Literal, String> {
    match expr {
        Expr::Literal { value, .. } => Ok(value.clone()),
        Expr::Column(ident) => Err(format!(
            "column '{}' cannot be used in a constant expression",
            ident.name
        )),
        Expr::Unary { op, operand, .. } => {
            let operand = fold_constant(operand)?;
            match (op, Number::from_literal(&operand)) {
                (UnaryOp::Plus, Some(_)) => Ok(operand),
                (UnaryOp::Neg, Some(Number::Exact(i))) => Number::Exact(-i).into_literal(),
                (UnaryOp::Neg, Some(Number::Approx(x))) => Ok(Literal::Float(-x)),
                (UnaryOp::Not, _) => match operand {
                    Literal::Boolean(b) => Ok(Literal::Boolean(!b)),
                    other => Err(format!("NOT applied to {}", other)),
                },
                (_, None) => Err(format!("sign applied to non-number {}", operand)),
            }
        }
        Expr::Binary {
            op: BinaryOp::Concat,
            left,
            right,
            ..
        } => match (fold_constant(left)?, fold_constant(right)?) {
            (Literal::String(a), Literal::String(b)) => Ok(Literal::String(a + &b)),
            (a, b) => Err(format!("'||' needs two strings, found {} and {}", a, b)),
        },
        Expr::Binary {
            op, left, right, ..
        } if op.is_arithmetic() => {
            let (a, b) = (fold_constant(left)?, fold_constant(right)?);
            match (Number::from_literal(&a), Number::from_literal(&b)) {
                (Some(x), Some(y)) => arithmetic(*op, x, y)?.into_literal(),
                _ => Err(format!("'{}' needs two numbers, found {} and {}", op, a, b)),
            }
        }
        Expr::Binary { op, .. } => Err(format!(
            "'{}' is not allowed in a constant expression",
            op
        )),
        Expr::IsNull { .. } => Err("IS NULL is not allowed in a constant expression".to_string()),
    }
}

fn arithmetic(op: BinaryOp, x: Number, y: Number) -> Result<Number, String> {
    let overflow = || "integer overflow in constant expression".to_string();
    match (x, y) {
        (Number::Exact(a), Number::Exact(b)) => match op {
            BinaryOp::Add => a.checked_add(b).map(Number::Exact).ok_or_else(overflow),
            BinaryOp::Sub => a.checked_sub(b).map(Number::Exact).ok_or_else(overflow),
            BinaryOp::Mul => a.checked_mul(b).map(Number::Exact).ok_or_else(overflow),
            BinaryOp::Div | BinaryOp::Mod if b == 0 => Err("division by zero".to_string()),
            BinaryOp::Div => Ok(Number::Exact(a / b)),
            BinaryOp::Mod => Ok(Number::Exact(a % b)),
            BinaryOp::Pow => {
                let exponent =
                    u32::try_from(b).map_err(|_| "exponent must be a small natural".to_string())?;
                a.checked_pow(exponent).map(Number::Exact).ok_or_else(overflow)
            }
            _ => Err(format!("'{}' is not arithmetic", op)),
        },
        (x, y) => {
            let (a, b) = (x.to_f64(), y.to_f64());
            let result = match op {
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                BinaryOp::Div if b == 0.0 => return Err("division by zero".to_string()),
                BinaryOp::Div => a / b,
                BinaryOp::Mod => a % b,
                BinaryOp::Pow => a.powf(b),
                _ => return Err(format!("'{}' is not arithmetic", op)),
            };
            Ok(Number::Approx(result))
        }
    }
}
