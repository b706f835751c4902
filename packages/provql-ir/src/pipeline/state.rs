//! Compile state machine
//!
//! `Idle → Tokenizing → Parsing → TypeChecking → IRGenerating →
//! PermissionValidating → Serializing → Done`, with `Error` reachable from
//! every non-terminal state. `Done` and `Error` are terminal.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Idle,
    Tokenizing,
    Parsing,
    TypeChecking,
    IRGenerating,
    PermissionValidating,
    Serializing,
    Done,
    Error,
}

impl PipelineState {
    /// Happy-path order
    pub const SEQUENCE: [PipelineState; 8] = [
        Self::Idle,
        Self::Tokenizing,
        Self::Parsing,
        Self::TypeChecking,
        Self::IRGenerating,
        Self::PermissionValidating,
        Self::Serializing,
        Self::Done,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Tokenizing => "tokenizing",
            Self::Parsing => "parsing",
            Self::TypeChecking => "type_checking",
            Self::IRGenerating => "ir_generating",
            Self::PermissionValidating => "permission_validating",
            Self::Serializing => "serializing",
            Self::Done => "done",
            Self::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }

    /// Successor on success; `None` for terminal states
    pub fn next(&self) -> Option<PipelineState> {
        match self {
            Self::Idle => Some(Self::Tokenizing),
            Self::Tokenizing => Some(Self::Parsing),
            Self::Parsing => Some(Self::TypeChecking),
            Self::TypeChecking => Some(Self::IRGenerating),
            Self::IRGenerating => Some(Self::PermissionValidating),
            Self::PermissionValidating => Some(Self::Serializing),
            Self::Serializing => Some(Self::Done),
            Self::Done | Self::Error => None,
        }
    }

    pub fn can_transition_to(&self, target: PipelineState) -> bool {
        if target == Self::Error {
            return !self.is_terminal();
        }
        self.next() == Some(target)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("illegal pipeline transition {from} -> {to}")]
pub struct IllegalTransition {
    pub from: PipelineState,
    pub to: PipelineState,
}

/// Wall time spent in one stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTiming {
    pub stage: PipelineState,
    pub elapsed: Duration,
}

/// Per-request state with its transition trace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateMachine {
    state: PipelineState,
    trace: Vec<PipelineState>,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StateMachine {
    /// Every request starts at `Idle`
    pub fn new() -> Self {
        Self {
            state: PipelineState::Idle,
            trace: vec![PipelineState::Idle],
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn trace(&self) -> &[PipelineState] {
        &self.trace
    }

    pub fn into_trace(self) -> Vec<PipelineState> {
        self.trace
    }

    pub fn transition(&mut self, to: PipelineState) -> Result<(), IllegalTransition> {
        if !self.state.can_transition_to(to) {
            return Err(IllegalTransition {
                from: self.state,
                to,
            });
        }
        self.state = to;
        self.trace.push(to);
        Ok(())
    }

    /// Move to `Error`; a no-op once terminal
    pub fn fail(&mut self) {
        if !self.state.is_terminal() {
            self.state = PipelineState::Error;
            self.trace.push(PipelineState::Error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_sequence() {
        let mut machine = StateMachine::new();
        for next in &PipelineState::SEQUENCE[1..] {
            machine.transition(*next).unwrap();
        }
        assert_eq!(machine.state(), PipelineState::Done);
        assert_eq!(machine.trace(), &PipelineState::SEQUENCE);
    }

    #[test]
    fn test_no_skipping_stages() {
        let mut machine = StateMachine::new();
        let err = machine.transition(PipelineState::Parsing).unwrap_err();
        assert_eq!(err.from, PipelineState::Idle);
        assert_eq!(err.to_string(), "illegal pipeline transition idle -> parsing");
        assert_eq!(machine.state(), PipelineState::Idle);
    }

    #[test]
    fn test_error_reachable_from_every_non_terminal_state() {
        for state in PipelineState::SEQUENCE {
            assert_eq!(
                state.can_transition_to(PipelineState::Error),
                !state.is_terminal(),
                "{}",
                state
            );
        }
        assert!(!PipelineState::Error.can_transition_to(PipelineState::Error));
    }

    #[test]
    fn test_terminal_states_are_final() {
        let mut machine = StateMachine::new();
        machine.transition(PipelineState::Tokenizing).unwrap();
        machine.fail();
        machine.fail();
        assert_eq!(
            machine.trace(),
            &[PipelineState::Idle, PipelineState::Tokenizing, PipelineState::Error]
        );
        assert!(machine.transition(PipelineState::Parsing).is_err());
        assert!(machine.transition(PipelineState::Idle).is_err());
    }
}
