//! Configuration driving the pipeline: presets, YAML files, environment
//! overrides and their effect on compiles.

mod common;

use common::*;
use provql_ir::config::{ConfigError, ConfigSource, VerificationMode};
use provql_ir::features::smt::VerificationMethod;
use provql_ir::{
    CompileOutput, CompilePipeline, CompileRequest, CompilerConfig, Format, PipelineError,
    PipelineErrorKind, PipelineState, Preset,
};
use std::io::Write;
use tempfile::NamedTempFile;

fn config_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn compile_with(config: CompilerConfig, source: &str) -> Result<CompileOutput, PipelineError> {
    CompilePipeline::new(config.build().unwrap()).compile(
        &CompileRequest::new(source, "admin"),
        &evidence_schema(),
        &admin(),
    )
}

#[test]
fn test_yaml_file_then_env_layering() {
    let file = config_file(
        "version: 1\npreset: strict\noverrides:\n  limits:\n    max_tokens: 500\n  output:\n    format: json\n",
    );
    let config = CompilerConfig::load_yaml(file.path())
        .unwrap()
        .apply_env_from([("PROVQL__OUTPUT__FORMAT", "packed")])
        .unwrap()
        .build()
        .unwrap();

    assert_eq!(config.preset(), Preset::Strict);
    assert_eq!(config.limits().max_tokens, 500);
    assert_eq!(config.limits().max_statement_depth, 32);
    assert_eq!(config.output().format, Format::Packed);

    let provenance = config.provenance();
    assert!(matches!(
        provenance.source_of("limits.max_tokens"),
        ConfigSource::Yaml { .. }
    ));
    assert_eq!(
        provenance.source_of("output.format"),
        ConfigSource::Env("PROVQL__OUTPUT__FORMAT".into())
    );
    assert_eq!(
        provenance.source_of("catalog.lookup_timeout_ms"),
        ConfigSource::Preset(Preset::Strict)
    );
}

#[test]
fn test_unknown_yaml_field_is_rejected() {
    let file = config_file("version: 1\npreset: balanced\noverrides:\n  limits:\n    max_tokenz: 5\n");
    let err = CompilerConfig::from_yaml(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Yaml(_)), "{}", err);
    assert_eq!(err.category(), "yaml");
}

#[test]
fn test_missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = CompilerConfig::from_yaml(dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn test_configured_format_reaches_the_output() {
    let config = CompilerConfig::preset(Preset::Balanced).output(|o| o.format(Format::Json));
    let output = compile_with(config, "SELECT title FROM evidence").unwrap();

    assert_eq!(output.format, Format::Json);
    let json: serde_json::Value = serde_json::from_str(&output.encoded.to_display_string()).unwrap();
    assert_eq!(json["table"], "evidence");
}

#[test]
fn test_statement_depth_limit() {
    let config = CompilerConfig::preset(Preset::Balanced).limits(|l| l.max_statement_depth(4));

    assert!(compile_with(config.clone(), "SELECT * FROM evidence WHERE score = 1").is_ok());

    let err = compile_with(config, "SELECT * FROM evidence WHERE ((((score = 1))))").unwrap_err();
    assert_eq!(err.kind, PipelineErrorKind::Parse);
    assert_eq!(err.stage, PipelineState::Parsing);
    assert!(err.message.contains("nesting exceeds the limit of 4 levels"), "{}", err);
}

#[test]
fn test_verification_mode_selects_the_proof_method() {
    let source = r#"INSERT INTO evidence SET prompt_provenance = 87 ACTOR "a" RATIONALE "r""#;

    let static_first = compile_with(CompilerConfig::preset(Preset::Balanced), source).unwrap();
    assert_eq!(
        static_first.ir.row("prompt_provenance").unwrap().proof.kind,
        VerificationMethod::StaticInterval
    );

    let runtime = compile_with(
        CompilerConfig::preset(Preset::Balanced)
            .verification(|v| v.mode(VerificationMode::RuntimeOnly)),
        source,
    )
    .unwrap();
    let proof = &runtime.ir.row("prompt_provenance").unwrap().proof;
    assert_eq!(proof.kind, VerificationMethod::RuntimePredicate);
    assert!(proof.verified);
}

#[test]
fn test_proof_cache_capacity() {
    let source = r#"INSERT INTO evidence SET prompt_provenance = 87 ACTOR "a" RATIONALE "r""#;
    let request = CompileRequest::new(source, "admin");

    let cached = CompilePipeline::new(CompilerConfig::preset(Preset::Balanced).build().unwrap());
    for _ in 0..3 {
        cached.compile(&request, &evidence_schema(), &admin()).unwrap();
    }
    assert_eq!(cached.proof_cache_stats(), (2, 1));

    let uncached = CompilePipeline::new(
        CompilerConfig::preset(Preset::Balanced)
            .verification(|v| v.proof_cache_capacity(0))
            .build()
            .unwrap(),
    );
    for _ in 0..3 {
        uncached.compile(&request, &evidence_schema(), &admin()).unwrap();
    }
    assert_eq!(uncached.proof_cache_stats(), (0, 0));
}

#[test]
fn test_env_range_error_carries_hint() {
    let err = CompilerConfig::preset(Preset::Balanced)
        .apply_env_from([("PROVQL__CATALOG__LOOKUP_TIMEOUT_MS", "120000")])
        .unwrap()
        .build()
        .unwrap_err();
    assert!(matches!(err, ConfigError::Range { ref field, .. } if field == "catalog.lookup_timeout_ms"));
}
