//! Synchronous compile pipeline
//!
//! One request runs start to finish on the calling thread. Each stage
//! consumes the previous stage's output, and the first failure moves the
//! state machine to `Error` and returns; nothing after it runs. Independent
//! requests may share one `CompilePipeline` across threads.

use super::error::{PipelineError, PipelineResult};
use super::state::{PipelineState, StageTiming, StateMachine};
use crate::config::{ValidatedConfig, VerificationMode};
use crate::features::ir_generation::{resolve_provenance, IRBuilder, IRNode, ProvenanceDefaults};
use crate::features::lexing::{Lexer, Token};
use crate::features::parsing::{Parser, Statement};
use crate::features::permission;
use crate::features::serialization::{Encoded, Format, Serializer};
use crate::features::smt::{ConstraintVerifier, IntervalVerifier, RuntimeOnlyVerifier};
use crate::features::type_checking::{self, TypedStatement};
use crate::shared::models::{PermissionProfile, ProvenanceClock, Schema};
use rayon::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// One statement to compile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileRequest {
    pub source: String,
    /// Role whose permission profile gates the statement
    pub role_id: String,
    /// Fallback for `ACTOR` / `RATIONALE` clauses the statement omits
    pub defaults: ProvenanceDefaults,
    /// Overrides the configured output format
    pub format: Option<Format>,
}

impl CompileRequest {
    pub fn new(source: impl Into<String>, role_id: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            role_id: role_id.into(),
            defaults: ProvenanceDefaults::default(),
            format: None,
        }
    }

    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.defaults.actor = Some(actor.into());
        self
    }

    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.defaults.rationale = Some(rationale.into());
        self
    }

    pub fn with_format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }
}

/// Successful compile
#[derive(Debug, Clone)]
pub struct CompileOutput {
    pub ir: IRNode,
    pub encoded: Encoded,
    pub format: Format,
    /// Advisory notices: unsatisfiable predicates, lossy SQL lowering
    pub warnings: Vec<String>,
    pub trace: Vec<PipelineState>,
    pub timings: Vec<StageTiming>,
}

/// Per-request bookkeeping: state machine, timings, cancellation
pub(crate) struct Run<'a> {
    machine: StateMachine,
    timings: Vec<StageTiming>,
    started: Instant,
    cancel: Option<&'a CancellationToken>,
}

impl<'a> Run<'a> {
    pub(crate) fn new(cancel: Option<&'a CancellationToken>) -> Self {
        Self {
            machine: StateMachine::new(),
            timings: Vec::new(),
            started: Instant::now(),
            cancel,
        }
    }

    pub(crate) fn state(&self) -> PipelineState {
        self.machine.state()
    }

    /// Close the current stage and enter the next one (a stage boundary)
    pub(crate) fn advance(&mut self) -> PipelineResult<PipelineState> {
        let current = self.machine.state();
        let Some(next) = current.next() else {
            return Err(PipelineError::from(super::state::IllegalTransition {
                from: current,
                to: current,
            }));
        };
        if self.cancel.is_some_and(CancellationToken::is_cancelled) {
            return Err(self.fail(PipelineError::cancelled(next)));
        }
        if current != PipelineState::Idle {
            self.timings.push(StageTiming {
                stage: current,
                elapsed: self.started.elapsed(),
            });
        }
        self.machine.transition(next)?;
        self.started = Instant::now();
        debug!(from = %current, to = %next, "pipeline transition");
        Ok(next)
    }

    /// Record the failure in the trace and hand the error back
    pub(crate) fn fail(&mut self, error: PipelineError) -> PipelineError {
        debug!(stage = %self.machine.state(), kind = %error.kind, "pipeline failed");
        self.machine.fail();
        error
    }

    /// Run `f` inside the current stage, failing the run on error
    pub(crate) fn stage<T, E>(&mut self, f: impl FnOnce() -> Result<T, E>) -> PipelineResult<T>
    where
        E: Into<PipelineError>,
    {
        f().map_err(|e| self.fail(e.into()))
    }

    fn finish(self) -> (Vec<PipelineState>, Vec<StageTiming>) {
        (self.machine.into_trace(), self.timings)
    }
}

pub struct CompilePipeline {
    config: ValidatedConfig,
    verifier: Box<dyn ConstraintVerifier>,
    builder: IRBuilder,
    clock: Arc<ProvenanceClock>,
}

impl Default for CompilePipeline {
    fn default() -> Self {
        Self::new(ValidatedConfig::default())
    }
}

impl CompilePipeline {
    pub fn new(config: ValidatedConfig) -> Self {
        let verifier: Box<dyn ConstraintVerifier> = match config.verification().mode {
            VerificationMode::StaticThenRuntime => Box::new(IntervalVerifier::new()),
            VerificationMode::RuntimeOnly => Box::new(RuntimeOnlyVerifier),
        };
        let builder = IRBuilder::new(config.verification().proof_cache_capacity);
        Self {
            config,
            verifier,
            builder,
            clock: Arc::new(ProvenanceClock::new()),
        }
    }

    /// Share a provenance clock with other pipelines
    pub fn with_clock(mut self, clock: Arc<ProvenanceClock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &ValidatedConfig {
        &self.config
    }

    pub fn clock(&self) -> &Arc<ProvenanceClock> {
        &self.clock
    }

    /// (hits, misses) of the proof cache
    pub fn proof_cache_stats(&self) -> (usize, usize) {
        self.builder.cache_stats()
    }

    /// Compile one statement against a schema and permission profile
    pub fn compile(
        &self,
        request: &CompileRequest,
        schema: &Schema,
        profile: &PermissionProfile,
    ) -> PipelineResult<CompileOutput> {
        let mut run = Run::new(None);
        let statement = self.front(request, &mut run)?;
        self.back(request, statement, schema, profile, run)
    }

    /// `compile` with cancellation checked at every stage boundary
    pub fn compile_cancellable(
        &self,
        request: &CompileRequest,
        schema: &Schema,
        profile: &PermissionProfile,
        cancel: &CancellationToken,
    ) -> PipelineResult<CompileOutput> {
        let mut run = Run::new(Some(cancel));
        let statement = self.front(request, &mut run)?;
        self.back(request, statement, schema, profile, run)
    }

    /// Compile independent statements in parallel; results keep input order
    pub fn compile_batch(
        &self,
        requests: &[CompileRequest],
        schema: &Schema,
        profile: &PermissionProfile,
    ) -> Vec<PipelineResult<CompileOutput>> {
        requests
            .par_iter()
            .map(|request| self.compile(request, schema, profile))
            .collect()
    }

    /// Tokenizing and Parsing; leaves the run in `TypeChecking`, where
    /// callers resolve the schema and profile the statement is checked against
    pub(crate) fn front(&self, request: &CompileRequest, run: &mut Run<'_>) -> PipelineResult<Statement> {
        let limits = *self.config.limits();

        run.advance()?;
        let tokens = run.stage(|| self.tokenize(&request.source))?;

        run.advance()?;
        let statement = run.stage(|| {
            Parser::new(tokens)
                .with_max_depth(limits.max_statement_depth)
                .parse_statement()
        })?;

        run.advance()?;
        Ok(statement)
    }

    /// Rest of TypeChecking through Done
    pub(crate) fn back(
        &self,
        request: &CompileRequest,
        statement: Statement,
        schema: &Schema,
        profile: &PermissionProfile,
        mut run: Run<'_>,
    ) -> PipelineResult<CompileOutput> {
        let typed: TypedStatement =
            run.stage(|| type_checking::check(&statement, schema, self.verifier.as_ref()))?;
        drop(statement);

        run.advance()?;
        let ir = run.stage(|| {
            let provenance =
                resolve_provenance(typed.kind, &typed.provenance, &request.defaults, &self.clock)?;
            self.builder
                .lower(&typed, provenance)
                .map(|node| node.bind_role(profile.role_id.clone()))
        })?;

        run.advance()?;
        run.stage(|| permission::validate(&ir, profile))?;

        run.advance()?;
        let format = request.format.unwrap_or(self.config.output().format);
        let encoded = run.stage(|| Serializer::new(format).encode_ir(&ir))?;

        run.advance()?;
        let mut warnings = typed.warnings;
        warnings.extend(encoded.warnings().iter().cloned());
        let (trace, timings) = run.finish();

        info!(
            table = %ir.table,
            kind = %ir.kind,
            rows = ir.rows.len(),
            format = %format,
            bytes = encoded.len(),
            "compiled statement"
        );
        Ok(CompileOutput {
            ir,
            encoded,
            format,
            warnings,
            trace,
            timings,
        })
    }

    /// Lex with the source-size and token-count limits applied
    fn tokenize(&self, source: &str) -> PipelineResult<Vec<Token>> {
        let limits = self.config.limits();
        let state = PipelineState::Tokenizing;
        if source.len() > limits.max_source_bytes {
            return Err(PipelineError::limit(
                state,
                "max_source_bytes",
                limits.max_source_bytes,
                source.len(),
            ));
        }
        let mut tokens = Vec::new();
        for token in Lexer::new(source) {
            let token = token?;
            if !token.is_end() && tokens.len() >= limits.max_tokens {
                return Err(PipelineError::limit(
                    state,
                    "max_tokens",
                    limits.max_tokens,
                    tokens.len() + 1,
                )
                .at(token.position));
            }
            tokens.push(token);
        }
        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CompilerConfig, Preset};
    use crate::features::parsing::StatementKind;
    use crate::pipeline::PipelineErrorKind;
    use crate::shared::models::{ColumnDef, TypeCategory, TypeExpr};

    fn schema() -> Schema {
        Schema::new(
            "evidence",
            vec![
                ColumnDef::new("id", TypeExpr::Nat).primary_key(),
                ColumnDef::new("prompt_provenance", TypeExpr::bounded_nat(0, 100)),
                ColumnDef::new("note", TypeExpr::String),
            ],
        )
        .unwrap()
    }

    fn profile() -> PermissionProfile {
        PermissionProfile::unrestricted("analyst")
    }

    #[test]
    fn test_insert_runs_every_stage() {
        let pipeline = CompilePipeline::default();
        let request = CompileRequest::new(
            "INSERT INTO evidence SET id = 1, prompt_provenance = 87 : BoundedNat(0, 100) ACTOR \"alice\" RATIONALE \"seed\"",
            "analyst",
        );
        let output = pipeline.compile(&request, &schema(), &profile()).unwrap();
        assert_eq!(output.trace, PipelineState::SEQUENCE.to_vec());
        assert_eq!(output.timings.len(), 6);
        assert_eq!(output.ir.kind, StatementKind::Insert);
        assert_eq!(output.ir.permission.role_id.as_deref(), Some("analyst"));
        assert_eq!(output.format, Format::Cbor);
        assert!(!output.encoded.is_empty());
    }

    #[test]
    fn test_failure_halts_at_type_checking() {
        let pipeline = CompilePipeline::default();
        let request = CompileRequest::new(
            "INSERT INTO evidence SET prompt_provenance = 150 ACTOR \"a\" RATIONALE \"r\"",
            "analyst",
        );
        let err = pipeline.compile(&request, &schema(), &profile()).unwrap_err();
        assert_eq!(err.stage, PipelineState::TypeChecking);
        assert_eq!(err.kind, PipelineErrorKind::Type);
        assert!(err.position.is_some());
    }

    #[test]
    fn test_defaults_fill_missing_provenance() {
        let pipeline = CompilePipeline::default();
        let source = "INSERT INTO evidence SET id = 2";

        let err = pipeline
            .compile(&CompileRequest::new(source, "analyst"), &schema(), &profile())
            .unwrap_err();
        assert_eq!(err.kind, PipelineErrorKind::Provenance);
        assert_eq!(err.stage, PipelineState::IRGenerating);

        let request = CompileRequest::new(source, "analyst")
            .with_actor("cli")
            .with_rationale("backfill");
        let output = pipeline.compile(&request, &schema(), &profile()).unwrap();
        let provenance = output.ir.provenance.unwrap();
        assert_eq!(provenance.actor_id(), "cli");
        assert_eq!(provenance.rationale(), "backfill");
    }

    #[test]
    fn test_front_hands_over_in_type_checking() {
        let pipeline = CompilePipeline::default();
        let mut run = Run::new(None);
        pipeline
            .front(&CompileRequest::new("SELECT * FROM evidence", "analyst"), &mut run)
            .unwrap();
        assert_eq!(run.state(), PipelineState::TypeChecking);

        // a schema lookup failing here is reported in the stage the trace shows
        let stage = run.state();
        let err = run.fail(PipelineError::cancelled(stage));
        assert_eq!(err.stage, PipelineState::TypeChecking);
        let (trace, timings) = run.finish();
        assert_eq!(
            trace,
            vec![
                PipelineState::Idle,
                PipelineState::Tokenizing,
                PipelineState::Parsing,
                PipelineState::TypeChecking,
                PipelineState::Error,
            ]
        );
        assert_eq!(timings.len(), 2);
    }

    #[test]
    fn test_permission_denied() {
        let pipeline = CompilePipeline::default();
        let profile = PermissionProfile::new("reader", [TypeCategory::Nat, TypeCategory::String]);
        let request = CompileRequest::new(
            "INSERT INTO evidence SET prompt_provenance = 10 ACTOR \"a\" RATIONALE \"r\"",
            "reader",
        );
        let err = pipeline.compile(&request, &schema(), &profile).unwrap_err();
        assert_eq!(err.stage, PipelineState::PermissionValidating);
        assert_eq!(err.kind, PipelineErrorKind::Permission);
        assert!(err.suggestion.is_some());
    }

    #[test]
    fn test_token_limit() {
        let config = CompilerConfig::preset(Preset::Strict)
            .limits(|l| l.max_tokens(3))
            .build()
            .unwrap();
        let pipeline = CompilePipeline::new(config);
        let err = pipeline
            .compile(
                &CompileRequest::new("SELECT * FROM evidence", "analyst"),
                &schema(),
                &profile(),
            )
            .unwrap_err();
        assert_eq!(err.kind, PipelineErrorKind::Limit);
        assert_eq!(err.stage, PipelineState::Tokenizing);
        assert_eq!(err.message, "max_tokens 4 exceeds the limit of 3");
    }

    #[test]
    fn test_source_size_limit() {
        let config = CompilerConfig::preset(Preset::Strict)
            .limits(|l| l.max_source_bytes(8))
            .build()
            .unwrap();
        let err = CompilePipeline::new(config)
            .compile(
                &CompileRequest::new("SELECT * FROM evidence", "analyst"),
                &schema(),
                &profile(),
            )
            .unwrap_err();
        assert_eq!(err.kind, PipelineErrorKind::Limit);
        assert!(err.message.starts_with("max_source_bytes 22"));
    }

    #[test]
    fn test_cancelled_before_start() {
        let token = CancellationToken::new();
        token.cancel();
        let err = CompilePipeline::default()
            .compile_cancellable(
                &CompileRequest::new("SELECT * FROM evidence", "analyst"),
                &schema(),
                &profile(),
                &token,
            )
            .unwrap_err();
        assert_eq!(err.kind, PipelineErrorKind::Cancelled);
        assert_eq!(err.stage, PipelineState::Tokenizing);
    }

    #[test]
    fn test_request_format_overrides_config() {
        let pipeline = CompilePipeline::default();
        let request = CompileRequest::new(
            "UPDATE evidence SET note = \"x\" WHERE id = 1 RATIONALE \"fix\"",
            "analyst",
        )
        .with_actor("bob")
        .with_format(Format::Sql);
        let output = pipeline.compile(&request, &schema(), &profile()).unwrap();
        assert_eq!(output.format, Format::Sql);
        assert!(output.encoded.to_display_string().starts_with("-- WARNING: lossy"));
        assert!(!output.warnings.is_empty());
    }

    #[test]
    fn test_batch_keeps_order() {
        let pipeline = CompilePipeline::default();
        let requests = vec![
            CompileRequest::new("SELECT id FROM evidence", "analyst"),
            CompileRequest::new("SELECT FROM", "analyst"),
            CompileRequest::new("SELECT * FROM evidence WHERE id > 3", "analyst"),
        ];
        let results = pipeline.compile_batch(&requests, &schema(), &profile());
        assert!(results[0].is_ok());
        assert_eq!(results[1].as_ref().unwrap_err().kind, PipelineErrorKind::Parse);
        assert!(results[2].is_ok());
    }

    #[test]
    fn test_shared_clock_orders_provenance() {
        let clock = Arc::new(ProvenanceClock::new());
        let a = CompilePipeline::default().with_clock(clock.clone());
        let b = CompilePipeline::default().with_clock(clock.clone());
        let request = CompileRequest::new("DELETE FROM evidence WHERE id = 1 RATIONALE \"gc\"", "analyst")
            .with_actor("ops");
        let first = a.compile(&request, &schema(), &profile()).unwrap();
        let second = b.compile(&request, &schema(), &profile()).unwrap();
        assert!(
            second.ir.provenance.unwrap().timestamp() > first.ir.provenance.unwrap().timestamp()
        );
    }
}
