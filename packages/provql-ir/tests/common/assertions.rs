//! Custom assertions for pipeline results

use provql_ir::{CompileOutput, PipelineError, PipelineErrorKind, PipelineState};

/// Assert a compile failed with the given kind at the given stage
pub fn assert_pipeline_error(
    result: &Result<CompileOutput, PipelineError>,
    kind: PipelineErrorKind,
    stage: PipelineState,
) -> PipelineError {
    match result {
        Ok(output) => panic!(
            "Expected {} error during {}, compile succeeded with trace {:?}",
            kind, stage, output.trace
        ),
        Err(err) => {
            assert_eq!(err.kind, kind, "wrong error kind: {}", err);
            assert_eq!(err.stage, stage, "wrong failing stage: {}", err);
            err.clone()
        }
    }
}

/// Assert a compile walked every stage and ended in Done
pub fn assert_completed(result: &Result<CompileOutput, PipelineError>) -> &CompileOutput {
    match result {
        Ok(output) => {
            assert_eq!(
                output.trace,
                PipelineState::SEQUENCE.to_vec(),
                "trace must visit every stage once"
            );
            assert!(output.ir.is_fully_verified(), "unverified proof in {:?}", output.ir);
            output
        }
        Err(err) => panic!("Expected successful compile, got: {}", err),
    }
}

/// Assert the error carries a hint containing `fragment`
pub fn assert_suggests(err: &PipelineError, fragment: &str) {
    let suggestion = err
        .suggestion
        .as_deref()
        .unwrap_or_else(|| panic!("Expected a suggestion on: {}", err));
    assert!(
        suggestion.contains(fragment),
        "Suggestion {:?} does not mention {:?}",
        suggestion,
        fragment
    );
}
