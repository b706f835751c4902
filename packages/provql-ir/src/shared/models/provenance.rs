//! Change provenance
//!
//! Who changed what, when, and why. Attached to mutation IR nodes by
//! reference, never nested inside a value.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProvenanceError {
    #[error("provenance actor id must not be empty")]
    EmptyActor,
    #[error("provenance rationale must not be empty")]
    EmptyRationale,
}

/// Provenance record; actor and rationale are never empty
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ProvenanceRecord {
    actor_id: String,
    timestamp: u64,
    rationale: String,
}

impl ProvenanceRecord {
    pub fn new(
        actor_id: impl Into<String>,
        timestamp: u64,
        rationale: impl Into<String>,
    ) -> Result<Self, ProvenanceError> {
        let actor_id = actor_id.into();
        let rationale = rationale.into();
        if actor_id.trim().is_empty() {
            return Err(ProvenanceError::EmptyActor);
        }
        if rationale.trim().is_empty() {
            return Err(ProvenanceError::EmptyRationale);
        }
        Ok(Self {
            actor_id,
            timestamp,
            rationale,
        })
    }

    pub fn actor_id(&self) -> &str {
        &self.actor_id
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn rationale(&self) -> &str {
        &self.rationale
    }
}

#[derive(Deserialize)]
struct RawProvenance {
    actor_id: String,
    timestamp: u64,
    rationale: String,
}

impl<'de> Deserialize<'de> for ProvenanceRecord {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawProvenance::deserialize(deserializer)?;
        Self::new(raw.actor_id, raw.timestamp, raw.rationale).map_err(serde::de::Error::custom)
    }
}

/// Strictly increasing timestamp source (epoch milliseconds)
///
/// Two calls never return the same value, even within one millisecond.
#[derive(Debug, Default)]
pub struct ProvenanceClock {
    last: AtomicU64,
}

impl ProvenanceClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next timestamp: wall clock, bumped past the previous one on collision
    pub fn tick(&self) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        let mut prev = self.last.load(Ordering::Relaxed);
        loop {
            let next = now.max(prev + 1);
            match self
                .last
                .compare_exchange_weak(prev, next, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return next,
                Err(actual) => prev = actual,
            }
        }
    }

    /// Last issued timestamp (0 if none)
    pub fn last(&self) -> u64 {
        self.last.load(Ordering::Acquire)
    }
}
