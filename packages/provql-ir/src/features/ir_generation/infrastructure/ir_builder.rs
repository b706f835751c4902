//! IR builder - lowers a `TypedStatement` into an `IRNode`
//!
//! Responsibilities:
//! - Mint one proof blob per row (memoised in the proof cache)
//! - Attach provenance to mutations, refuse to lower a mutation without it
//! - Collect the type categories the permission validator gates on

use super::proof_cache::ProofCache;
use crate::features::ir_generation::domain::{
    IRColumn, IRExpr, IRNode, IROrder, IRRow, LoweringError, PermissionContext, ProofBlob,
};
use crate::features::smt::VerificationMethod;
use crate::features::type_checking::{TypedAssignment, TypedExpr, TypedStatement};
use crate::shared::models::{ProvenanceRecord, TypeCategory, TypedValue};
use parking_lot::Mutex;
use std::collections::BTreeSet;
use tracing::debug;

/// Default proof cache capacity
pub const DEFAULT_PROOF_CACHE_CAPACITY: usize = 1024;

pub struct IRBuilder {
    cache: Mutex<ProofCache>,
}

impl Default for IRBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_PROOF_CACHE_CAPACITY)
    }
}

impl IRBuilder {
    /// `cache_capacity` of 0 disables proof caching
    pub fn new(cache_capacity: usize) -> Self {
        Self {
            cache: Mutex::new(ProofCache::new(cache_capacity)),
        }
    }

    pub fn lower(
        &self,
        typed: &TypedStatement,
        provenance: Option<ProvenanceRecord>,
    ) -> Result<IRNode, LoweringError> {
        let provenance = if typed.kind.is_mutation() {
            Some(provenance.ok_or(LoweringError::MissingProvenance {
                kind: typed.kind,
                field: "provenance record",
            })?)
        } else {
            None
        };

        let rows: Vec<IRRow> = typed.assignments.iter().map(|a| self.lower_row(a)).collect();
        let predicate = typed.predicate.as_ref().map(lower_expr).transpose()?;

        let mut required_categories: BTreeSet<TypeCategory> =
            rows.iter().map(|r| r.value.ty().category()).collect();
        required_categories.extend(typed.projection.iter().map(|c| c.ty.category()));
        required_categories.extend(typed.order_by.iter().map(|o| o.column.ty.category()));
        if let Some(predicate) = &predicate {
            required_categories.extend(predicate.columns().into_iter().map(|(_, ty)| ty.category()));
        }

        let node = IRNode {
            kind: typed.kind,
            table: typed.table.clone(),
            rows,
            projection: typed
                .projection
                .iter()
                .map(|c| IRColumn {
                    name: c.name.clone(),
                    ty: c.ty.clone(),
                })
                .collect(),
            predicate,
            order_by: typed
                .order_by
                .iter()
                .map(|o| IROrder {
                    column: o.column.name.clone(),
                    direction: o.direction,
                })
                .collect(),
            limit: typed.limit,
            normal_form: typed.normal_form,
            provenance,
            permission: PermissionContext {
                role_id: None,
                dialect: typed.dialect(),
                required_categories,
            },
        };
        debug!(
            table = %node.table,
            kind = %node.kind,
            rows = node.rows.len(),
            "lowered to IR"
        );
        Ok(node)
    }

    fn lower_row(&self, assignment: &TypedAssignment) -> IRRow {
        let proof = self.cache.lock().get_or_mint(
            assignment.method,
            &assignment.evidence,
            &assignment.value,
            || mint_proof(assignment.method, &assignment.evidence, &assignment.value),
        );
        IRRow {
            column: assignment.column.clone(),
            value: assignment.value.clone(),
            proof,
            dialect: assignment.dialect,
        }
    }

    /// (hits, misses) of the proof cache
    pub fn cache_stats(&self) -> (usize, usize) {
        let cache = self.cache.lock();
        (cache.hits(), cache.misses())
    }
}

/// Build a proof blob; the payload carries the checked predicate and a
/// fingerprint binding it to the value
pub fn mint_proof(method: VerificationMethod, evidence: &str, value: &TypedValue) -> ProofBlob {
    ProofBlob {
        kind: method,
        category: value.ty().category(),
        payload: format!("{}; fingerprint={}", evidence, fingerprint(value)),
        verified: true,
    }
}

/// First 16 hex digits of the blake3 hash of `type|value`
pub fn fingerprint(value: &TypedValue) -> String {
    let hash = blake3::hash(format!("{}|{}", value.ty(), value.value()).as_bytes());
    hash.to_hex().as_str()[..16].to_string()
}

fn lower_expr(expr: &TypedExpr) -> Result<IRExpr, LoweringError> {
    Ok(match expr {
        TypedExpr::Column(column) => IRExpr::Column {
            name: column.name.clone(),
            ty: column.ty.clone(),
        },
        TypedExpr::Literal { value, ty } => {
            IRExpr::Literal(TypedValue::new(ty.clone(), value.clone())?)
        }
        TypedExpr::Unary { op, operand, .. } => IRExpr::Unary {
            op: *op,
            operand: Box::new(lower_expr(operand)?),
        },
        TypedExpr::Binary {
            op, left, right, ..
        } => IRExpr::Binary {
            op: *op,
            left: Box::new(lower_expr(left)?),
            right: Box::new(lower_expr(right)?),
        },
        TypedExpr::IsNull { operand, negated } => IRExpr::IsNull {
            operand: Box::new(lower_expr(operand)?),
            negated: *negated,
        },
    })
}
