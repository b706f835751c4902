//! Provenance resolution for mutations
//!
//! Statement clauses win over request defaults. The timestamp always comes
//! from the shared clock, never from the statement.

use crate::features::ir_generation::domain::LoweringError;
use crate::features::parsing::{ProvenanceClause, StatementKind};
use crate::shared::models::{ProvenanceClock, ProvenanceRecord};

/// Request-level fallback for `ACTOR` / `RATIONALE`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvenanceDefaults {
    pub actor: Option<String>,
    pub rationale: Option<String>,
}

impl ProvenanceDefaults {
    pub fn new(actor: Option<String>, rationale: Option<String>) -> Self {
        Self { actor, rationale }
    }
}

/// Build the record a mutation must carry; `None` for SELECT
pub fn resolve_provenance(
    kind: StatementKind,
    clause: &ProvenanceClause,
    defaults: &ProvenanceDefaults,
    clock: &ProvenanceClock,
) -> Result<Option<ProvenanceRecord>, LoweringError> {
    if !kind.is_mutation() {
        return Ok(None);
    }
    let actor = clause
        .actor
        .as_ref()
        .or(defaults.actor.as_ref())
        .ok_or(LoweringError::MissingProvenance {
            kind,
            field: "actor",
        })?;
    let rationale = clause
        .rationale
        .as_ref()
        .or(defaults.rationale.as_ref())
        .ok_or(LoweringError::MissingProvenance {
            kind,
            field: "rationale",
        })?;
    Ok(Some(ProvenanceRecord::new(
        actor.clone(),
        clock.tick(),
        rationale.clone(),
    )?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::ProvenanceError;

    fn clause(actor: Option<&str>, rationale: Option<&str>) -> ProvenanceClause {
        ProvenanceClause {
            actor: actor.map(String::from),
            rationale: rationale.map(String::from),
        }
    }

    #[test]
    fn test_clause_wins_over_defaults() {
        let clock = ProvenanceClock::new();
        let defaults = ProvenanceDefaults::new(Some("svc".into()), Some("batch".into()));
        let record = resolve_provenance(
            StatementKind::Insert,
            &clause(Some("alice"), None),
            &defaults,
            &clock,
        )
        .unwrap()
        .unwrap();
        assert_eq!(record.actor_id(), "alice");
        assert_eq!(record.rationale(), "batch");
        assert_eq!(record.timestamp(), clock.last());
    }

    #[test]
    fn test_missing_and_blank() {
        let clock = ProvenanceClock::new();
        let none = ProvenanceDefaults::default();
        assert_eq!(
            resolve_provenance(StatementKind::Insert, &clause(None, Some("r")), &none, &clock),
            Err(LoweringError::MissingProvenance {
                kind: StatementKind::Insert,
                field: "actor"
            })
        );
        assert_eq!(
            resolve_provenance(StatementKind::Delete, &clause(Some(" "), Some("r")), &none, &clock),
            Err(LoweringError::Provenance(ProvenanceError::EmptyActor))
        );
        assert_eq!(
            resolve_provenance(StatementKind::Select, &clause(None, None), &none, &clock),
            Ok(None)
        );
    }
}
