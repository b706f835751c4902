//! Schema-guided type checker
//!
//! Resolves every column against the schema, types literals (explicit
//! annotation or inference), and hands each assignment value to the
//! constraint verifier before it becomes a `TypedValue`.

use super::inference::{coerce_literal, fold_constant, infer_literal, Coercion};
use crate::features::parsing::{
    Assignment, BinaryOp, Expr, Ident, Literal, OrderBy, Projection, Statement, UnaryOp,
};
use crate::features::smt::{
    verify_refinement, Comparison, ConstraintVerifier, Interval, VerificationFailure,
};
use crate::features::type_checking::domain::{
    CheckResult, ColumnRef, Dialect, ProofError, TypeError, TypedAssignment, TypedExpr,
    TypedOrderBy, TypedStatement,
};
use crate::shared::models::{Position, Schema, TypeExpr, Value};
use crate::shared::utils::closest_match;
use rustc_hash::FxHashSet;
use tracing::debug;

pub struct TypeChecker<'a> {
    schema: &'a Schema,
    verifier: &'a dyn ConstraintVerifier,
}

impl<'a> TypeChecker<'a> {
    pub fn new(schema: &'a Schema, verifier: &'a dyn ConstraintVerifier) -> Self {
        Self { schema, verifier }
    }

    pub fn check(&self, statement: &Statement) -> CheckResult<TypedStatement> {
        let table = statement.table();
        if table.name != self.schema.name() {
            return Err(TypeError::new(
                table.position,
                self.schema.name(),
                table.name.clone(),
                format!(
                    "statement targets table '{}' but the schema describes '{}'",
                    table.name,
                    self.schema.name()
                ),
            )
            .into());
        }

        let mut typed = TypedStatement::empty(statement.kind(), table.name.clone());
        if let Some(provenance) = statement.provenance() {
            typed.provenance = provenance.clone();
        }

        match statement {
            Statement::Insert(insert) => {
                typed.assignments = self.check_assignments(&insert.assignments)?;
            }
            Statement::Update(update) => {
                typed.assignments = self.check_assignments(&update.assignments)?;
                typed.predicate = update
                    .predicate
                    .as_ref()
                    .map(|p| self.check_predicate(p, &mut typed.warnings))
                    .transpose()?;
            }
            Statement::Delete(delete) => {
                typed.predicate = Some(self.check_predicate(&delete.predicate, &mut typed.warnings)?);
                // a delete removes every column of the matched rows
                typed.projection = self.all_columns();
            }
            Statement::Select(select) => {
                typed.projection = match &select.projection {
                    Projection::All => self.all_columns(),
                    Projection::Columns(columns) => columns
                        .iter()
                        .map(|c| self.resolve_column(c))
                        .collect::<Result<_, _>>()?,
                };
                typed.predicate = select
                    .predicate
                    .as_ref()
                    .map(|p| self.check_predicate(p, &mut typed.warnings))
                    .transpose()?;
                typed.order_by = select
                    .order_by
                    .iter()
                    .map(|o| self.check_order_by(o))
                    .collect::<Result<_, _>>()?;
                typed.limit = select.limit;
            }
            Statement::Normalize(normalize) => {
                typed.normal_form = normalize.target;
                if let (Some(target), Some(current)) = (normalize.target, self.schema.normal_form()) {
                    if target == current {
                        typed
                            .warnings
                            .push(format!("table '{}' is already in {}", table.name, current));
                    }
                }
            }
        }

        debug!(
            table = %typed.table,
            kind = %typed.kind,
            assignments = typed.assignments.len(),
            warnings = typed.warnings.len(),
            "type check passed"
        );
        Ok(typed)
    }

    fn all_columns(&self) -> Vec<ColumnRef> {
        self.schema
            .columns()
            .iter()
            .map(|c| ColumnRef {
                name: c.name.clone(),
                ty: c.ty.clone(),
            })
            .collect()
    }

    fn resolve_column(&self, ident: &Ident) -> Result<ColumnRef, TypeError> {
        match self.schema.column(&ident.name) {
            Some(column) => Ok(ColumnRef {
                name: column.name.clone(),
                ty: column.ty.clone(),
            }),
            None => Err(TypeError::new(
                ident.position,
                format!("a column of '{}'", self.schema.name()),
                ident.name.clone(),
                format!(
                    "unknown column '{}' in table '{}'",
                    ident.name,
                    self.schema.name()
                ),
            )
            .in_column(ident.name.clone())
            .maybe_suggestion(
                closest_match(&ident.name, self.schema.column_names())
                    .map(|c| format!("did you mean '{}'?", c)),
            )),
        }
    }

    fn check_assignments(&self, assignments: &[Assignment]) -> CheckResult<Vec<TypedAssignment>> {
        let mut seen = FxHashSet::default();
        let mut typed = Vec::with_capacity(assignments.len());
        for assignment in assignments {
            if !seen.insert(assignment.column.name.as_str()) {
                return Err(TypeError::new(
                    assignment.column.position,
                    "one assignment per column",
                    assignment.column.name.clone(),
                    "column assigned more than once",
                )
                .in_column(assignment.column.name.clone())
                .into());
            }
            typed.push(self.check_assignment(assignment)?);
        }
        Ok(typed)
    }

    fn check_assignment(&self, assignment: &Assignment) -> CheckResult<TypedAssignment> {
        let column = self.resolve_column(&assignment.column)?;
        let position = assignment.value.position();

        let literal = fold_constant(&assignment.value).map_err(|message| {
            TypeError::new(position, column.ty.to_string(), assignment.value.to_string(), message)
                .in_column(column.name.clone())
                .with_suggestion("assignment values must be constant expressions")
        })?;

        let (dialect, target) = match &assignment.annotation {
            Some(declared) if *declared != column.ty => {
                return Err(TypeError::mismatch(position, &column.ty, declared)
                    .in_column(column.name.clone())
                    .with_suggestion(format!("annotate the value as {}", column.ty))
                    .into());
            }
            Some(declared) => (Dialect::Explicit, declared),
            None => (Dialect::Inferred, &column.ty),
        };

        let value = coerce_literal(&literal, target)
            .map_err(|failure| coercion_error(failure, &literal, target, position, &column.name))?;

        match verify_refinement(self.verifier, target, &value) {
            Ok(verified) => Ok(TypedAssignment {
                column: column.name,
                value: verified.typed,
                dialect,
                method: verified.method,
                evidence: verified.evidence,
                position,
            }),
            Err(VerificationFailure::Violated { detail, suggestion }) => {
                Err(TypeError::new(position, target.to_string(), value.to_string(), detail)
                    .in_column(column.name)
                    .maybe_suggestion(suggestion)
                    .into())
            }
            Err(VerificationFailure::Undecidable { reason }) => Err(ProofError {
                column: column.name,
                ty: target.clone(),
                detail: reason,
                position,
            }
            .into()),
        }
    }

    fn check_order_by(&self, order: &OrderBy) -> Result<TypedOrderBy, TypeError> {
        let column = self.resolve_column(&order.column)?;
        if !column.ty.is_orderable() {
            return Err(TypeError::new(
                order.column.position,
                "an orderable type",
                column.ty.to_string(),
                format!("cannot order by {} column", column.ty),
            )
            .in_column(column.name)
            .with_suggestion("order by a numeric, string or timestamp column"));
        }
        Ok(TypedOrderBy {
            column,
            direction: order.direction,
        })
    }

    fn check_predicate(&self, expr: &Expr, warnings: &mut Vec<String>) -> Result<TypedExpr, TypeError> {
        let typed = self.type_expr(expr, None, warnings)?;
        let ty = typed.ty();
        if ty != TypeExpr::Bool {
            return Err(TypeError::new(
                expr.position(),
                "Bool",
                ty.to_string(),
                format!("WHERE predicate must be Bool, found {}", ty),
            )
            .with_suggestion("compare the column with a value, e.g. col = 1"));
        }
        Ok(typed)
    }

    /// Type an expression; `hint` is the base type a bare literal should adopt
    fn type_expr(
        &self,
        expr: &Expr,
        hint: Option<&TypeExpr>,
        warnings: &mut Vec<String>,
    ) -> Result<TypedExpr, TypeError> {
        if is_constant(expr) {
            let literal = fold_constant(expr).map_err(|message| {
                TypeError::new(expr.position(), "a constant", expr.to_string(), message)
            })?;
            return type_literal(&literal, expr.position(), hint);
        }

        match expr {
            Expr::Column(ident) => Ok(TypedExpr::Column(self.resolve_column(ident)?)),
            Expr::Literal { value, position } => type_literal(value, *position, hint),
            Expr::IsNull {
                operand, negated, ..
            } => Ok(TypedExpr::IsNull {
                operand: Box::new(self.type_expr(operand, None, warnings)?),
                negated: *negated,
            }),
            Expr::Unary {
                op: UnaryOp::Not,
                operand,
                position,
            } => {
                let operand = self.type_expr(operand, Some(&TypeExpr::Bool), warnings)?;
                require(&operand, &TypeExpr::Bool, *position, "NOT")?;
                Ok(TypedExpr::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                    ty: TypeExpr::Bool,
                })
            }
            Expr::Unary {
                op,
                operand,
                position,
            } => {
                let operand = self.type_expr(operand, None, warnings)?;
                let base = operand.ty().base();
                let ty = match (op, &base) {
                    (UnaryOp::Neg, TypeExpr::Nat) => TypeExpr::Int,
                    (_, TypeExpr::Nat | TypeExpr::Int | TypeExpr::Float) => base.clone(),
                    _ => {
                        return Err(TypeError::new(
                            *position,
                            "a numeric type",
                            base.to_string(),
                            format!("'{}' needs a number, found {}", op.as_str(), base),
                        ))
                    }
                };
                Ok(TypedExpr::Unary {
                    op: *op,
                    operand: Box::new(operand),
                    ty,
                })
            }
            Expr::Binary {
                op,
                left,
                right,
                position,
            } if op.is_logical() => {
                let left = self.type_expr(left, Some(&TypeExpr::Bool), warnings)?;
                let right = self.type_expr(right, Some(&TypeExpr::Bool), warnings)?;
                require(&left, &TypeExpr::Bool, *position, op.as_str())?;
                require(&right, &TypeExpr::Bool, *position, op.as_str())?;
                Ok(binary(*op, left, right, TypeExpr::Bool))
            }
            Expr::Binary {
                op,
                left,
                right,
                position,
            } => {
                let (left, right) = self.type_operands(left, right, warnings)?;
                let base = left.ty().base();
                if base != right.ty().base() {
                    return Err(TypeError::mismatch(*position, &base, &right.ty().base())
                        .with_suggestion(format!(
                            "both sides of '{}' must have the same base type",
                            op
                        )));
                }
                let ty = if op.is_comparison() {
                    if op.is_ordering() && !base.is_orderable() {
                        return Err(TypeError::new(
                            *position,
                            "an orderable type",
                            base.to_string(),
                            format!("'{}' cannot compare {} values", op, base),
                        )
                        .with_suggestion("use = or != instead"));
                    }
                    if let Some(warning) = unsatisfiable(*op, &left, &right) {
                        warnings.push(warning);
                    }
                    TypeExpr::Bool
                } else if *op == BinaryOp::Concat {
                    if base != TypeExpr::String {
                        return Err(TypeError::mismatch(*position, &TypeExpr::String, &base)
                            .with_suggestion("'||' concatenates strings"));
                    }
                    TypeExpr::String
                } else {
                    if !base.is_numeric() {
                        return Err(TypeError::new(
                            *position,
                            "a numeric type",
                            base.to_string(),
                            format!("'{}' needs numbers, found {}", op, base),
                        ));
                    }
                    base
                };
                Ok(binary(*op, left, right, ty))
            }
        }
    }

    /// Type both operands, letting a literal side adopt the other side's base type
    fn type_operands(
        &self,
        left: &Expr,
        right: &Expr,
        warnings: &mut Vec<String>,
    ) -> Result<(TypedExpr, TypedExpr), TypeError> {
        if is_literal_like(left) && !is_literal_like(right) {
            let right = self.type_expr(right, None, warnings)?;
            let hint = right.ty().base();
            let left = self.type_expr(left, Some(&hint), warnings)?;
            Ok((left, right))
        } else {
            let left = self.type_expr(left, None, warnings)?;
            let hint = left.ty().base();
            let right = self.type_expr(right, Some(&hint), warnings)?;
            Ok((left, right))
        }
    }
}

/// Column-free sign/arithmetic/concat expression that folds to a literal
fn is_constant(expr: &Expr) -> bool {
    let foldable = match expr {
        Expr::Unary { op, .. } => *op != UnaryOp::Not,
        Expr::Binary { op, .. } => op.is_arithmetic() || *op == BinaryOp::Concat,
        _ => false,
    };
    foldable && expr.columns().is_empty()
}

fn is_literal_like(expr: &Expr) -> bool {
    matches!(expr, Expr::Literal { .. }) || is_constant(expr)
}

fn type_literal(
    literal: &Literal,
    position: Position,
    hint: Option<&TypeExpr>,
) -> Result<TypedExpr, TypeError> {
    if *literal == Literal::Null {
        return Err(TypeError::new(position, "a value", "NULL", "NULL cannot be compared")
            .with_suggestion("use IS NULL or IS NOT NULL"));
    }
    if let Some(hint) = hint {
        match coerce_literal(literal, hint) {
            Ok(value) => {
                return Ok(TypedExpr::Literal {
                    value,
                    ty: hint.clone(),
                })
            }
            Err(Coercion::Invalid(message)) => {
                return Err(TypeError::new(position, hint.to_string(), literal.to_string(), message))
            }
            // fall through: the operator reports the mismatch
            Err(Coercion::NotAssignable) => {}
        }
    }
    let ty = infer_literal(literal)
        .map_err(|message| TypeError::new(position, "a typed literal", literal.to_string(), message))?;
    let value = coerce_literal(literal, &ty).map_err(|_| {
        TypeError::new(
            position,
            ty.to_string(),
            literal.to_string(),
            format!("literal {} does not fit {}", literal, ty),
        )
    })?;
    Ok(TypedExpr::Literal { value, ty })
}

fn require(expr: &TypedExpr, expected: &TypeExpr, position: Position, op: &str) -> Result<(), TypeError> {
    let actual = expr.ty();
    if actual.base() == *expected {
        Ok(())
    } else {
        Err(TypeError::mismatch(position, expected, &actual)
            .with_suggestion(format!("operands of {} must be {}", op, expected)))
    }
}

fn binary(op: BinaryOp, left: TypedExpr, right: TypedExpr, ty: TypeExpr) -> TypedExpr {
    TypedExpr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
        ty,
    }
}

fn coercion_error(
    failure: Coercion,
    literal: &Literal,
    target: &TypeExpr,
    position: Position,
    column: &str,
) -> TypeError {
    match failure {
        Coercion::Invalid(message) => {
            TypeError::new(position, target.to_string(), literal.to_string(), message)
                .in_column(column)
        }
        Coercion::NotAssignable if *literal == Literal::Null => TypeError::new(
            position,
            target.to_string(),
            "NULL",
            format!("NULL is not a value of {}", target),
        )
        .in_column(column)
        .with_suggestion("columns are not nullable; provide a value"),
        Coercion::NotAssignable => {
            let actual = infer_literal(literal)
                .map(|ty| ty.to_string())
                .unwrap_or_else(|_| literal.to_string());
            TypeError::new(
                position,
                target.to_string(),
                actual.clone(),
                format!("cannot assign {} literal {} to {}", actual, literal, target),
            )
            .in_column(column)
            .with_suggestion(format!("provide a {} literal", literal_kind_for(target)))
        }
    }
}

fn literal_kind_for(ty: &TypeExpr) -> &'static str {
    match ty {
        TypeExpr::Nat | TypeExpr::BoundedNat { .. } => "natural number",
        TypeExpr::Int => "integer",
        TypeExpr::Float | TypeExpr::BoundedFloat { .. } | TypeExpr::Confidence => "float",
        TypeExpr::String | TypeExpr::NonEmptyString => "string",
        TypeExpr::Uuid => "UUID string",
        TypeExpr::Timestamp => "RFC 3339 string or epoch-millisecond",
        TypeExpr::Bool => "boolean",
        TypeExpr::Vector(..) => "vector",
        TypeExpr::PromptScores => "score record",
    }
}

/// Warning when a `column op constant` comparison contradicts the column's refinement
fn unsatisfiable(op: BinaryOp, left: &TypedExpr, right: &TypedExpr) -> Option<String> {
    let (column, value, op) = match (left, right) {
        (TypedExpr::Column(c), TypedExpr::Literal { value, .. }) => (c, value, op),
        (TypedExpr::Literal { value, .. }, TypedExpr::Column(c)) => (c, value, flip(op)?),
        _ => return None,
    };
    let comparison = match op {
        BinaryOp::Eq => Comparison::Eq,
        BinaryOp::Lt => Comparison::Lt,
        BinaryOp::LtEq => Comparison::Le,
        BinaryOp::Gt => Comparison::Gt,
        BinaryOp::GtEq => Comparison::Ge,
        _ => return None,
    };
    let empty = match (&column.ty, value) {
        (TypeExpr::BoundedNat { min, max }, Value::Nat(v)) => Interval::bounded(*min, *max)
            .intersect(&Interval::from_comparison(comparison, *v))
            .is_empty(),
        (TypeExpr::BoundedFloat { min, max }, Value::Float(v)) => Interval::bounded(*min, *max)
            .intersect(&Interval::from_comparison(comparison, *v))
            .is_empty(),
        (TypeExpr::Confidence, Value::Float(v)) => Interval::bounded(0.0, 1.0)
            .intersect(&Interval::from_comparison(comparison, *v))
            .is_empty(),
        _ => false,
    };
    empty.then(|| {
        format!(
            "predicate '{} {} {}' can never hold for {} column '{}'",
            column.name, op, value, column.ty, column.name
        )
    })
}

fn flip(op: BinaryOp) -> Option<BinaryOp> {
    Some(match op {
        BinaryOp::Eq => BinaryOp::Eq,
        BinaryOp::NotEq => BinaryOp::NotEq,
        BinaryOp::Lt => BinaryOp::Gt,
        BinaryOp::Gt => BinaryOp::Lt,
        BinaryOp::LtEq => BinaryOp::GtEq,
        BinaryOp::GtEq => BinaryOp::LtEq,
        _ => return None,
    })
}
