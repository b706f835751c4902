//! End-to-end scenarios: source text in, verified IR (or one structured
//! error) out.

mod common;

use common::*;
use pretty_assertions::assert_eq;
use provql_ir::features::parsing::StatementKind;
use provql_ir::features::serialization::VendorTag;
use provql_ir::shared::models::TypeCategory;
use provql_ir::{
    CompilePipeline, CompileRequest, Format, PermissionProfile, PipelineErrorKind, PipelineState,
    Serializer, TypeExpr, TypedValue, Value,
};

#[test]
fn test_insert_with_inferred_non_empty_string() {
    let pipeline = CompilePipeline::default();
    let request = CompileRequest::new(
        r#"INSERT INTO evidence SET title = "ONS Data" ACTOR "alice" RATIONALE "official stats""#,
        "admin",
    );
    let result = pipeline.compile(&request, &evidence_schema(), &admin());
    let output = assert_completed(&result);

    assert_eq!(output.ir.kind, StatementKind::Insert);
    assert_eq!(output.ir.rows.len(), 1);
    let row = output.ir.row("title").unwrap();
    assert_eq!(row.value.ty(), &TypeExpr::NonEmptyString);
    assert_eq!(row.value.value(), &Value::Text("ONS Data".into()));
    assert!(row.proof.verified);
    assert_eq!(row.proof.category, TypeCategory::NonEmptyString);

    let provenance = output.ir.provenance.as_ref().unwrap();
    assert_eq!(provenance.actor_id(), "alice");
    assert_eq!(provenance.rationale(), "official stats");

    assert_eq!(output.format, Format::Cbor);
    let decoded = Serializer::new(Format::Cbor)
        .decode_ir(output.encoded.as_bytes())
        .unwrap();
    assert_eq!(decoded, output.ir);
}

#[test]
fn test_bound_violation_halts_at_type_checking() {
    let pipeline = CompilePipeline::default();
    let request = CompileRequest::new(
        r#"INSERT INTO evidence SET prompt_provenance = 150 ACTOR "bob" RATIONALE "x""#,
        "admin",
    );
    let result = pipeline.compile(&request, &evidence_schema(), &admin());
    let err = assert_pipeline_error(
        &result,
        PipelineErrorKind::Type,
        PipelineState::TypeChecking,
    );

    assert!(err.message.contains("value 150 exceeds max 100"), "{}", err);
    assert_eq!(err.suggestion.as_deref(), Some("value must be within [0,100]"));
    assert!(err.position.is_some());
}

#[test]
fn test_delete_without_where_is_a_parse_error() {
    let pipeline = CompilePipeline::default();
    let result = pipeline.compile(
        &CompileRequest::new("DELETE FROM evidence", "admin"),
        &evidence_schema(),
        &admin(),
    );
    let err = assert_pipeline_error(&result, PipelineErrorKind::Parse, PipelineState::Parsing);

    assert!(
        err.message.contains("WHERE clause required for DELETE"),
        "{}",
        err
    );
    assert_suggests(&err, "WHERE");
}

#[test]
fn test_role_without_nat_cannot_write_score() {
    let pipeline = CompilePipeline::default();
    let request = request_with_defaults("INSERT INTO evidence SET score = 42", "writer");
    let result = pipeline.compile(&request, &evidence_schema(), &string_only("writer"));
    let err = assert_pipeline_error(
        &result,
        PipelineErrorKind::Permission,
        PipelineState::PermissionValidating,
    );

    assert!(err.message.contains("'score'"), "{}", err);
    assert!(err.message.contains("Nat"), "{}", err);
    assert_suggests(&err, "grant Nat");
}

#[test]
fn test_bounded_nat_wire_shape() {
    let value = TypedValue::bounded_nat(0, 100, 87).unwrap();
    let serializer = Serializer::new(Format::Cbor);
    let encoded = serializer.encode_value(&value).unwrap();

    let parsed: ciborium::Value = ciborium::de::from_reader(encoded.as_bytes()).unwrap();
    let ciborium::Value::Tag(tag, inner) = parsed else {
        panic!("expected a tagged item, got {:?}", parsed);
    };
    assert_eq!(tag, 0x5051_0001);
    assert_eq!(VendorTag::from_value(tag), Some(VendorTag::BoundedNat));

    let ciborium::Value::Map(entries) = *inner else {
        panic!("tag content must be a map");
    };
    let keys: Vec<&str> = entries.iter().filter_map(|(k, _)| k.as_text()).collect();
    assert_eq!(keys, vec!["max", "min", "proof", "value"]);

    let (decoded, proof) = serializer.decode_value(encoded.as_bytes()).unwrap();
    assert_eq!(decoded, value);
    assert!(proof.verified);
}

#[test]
fn test_select_needs_no_provenance() {
    let pipeline = CompilePipeline::default();
    let result = pipeline.compile(
        &CompileRequest::new(
            "SELECT title, score FROM evidence WHERE score >= 10 ORDER BY score DESC LIMIT 5",
            "admin",
        ),
        &evidence_schema(),
        &admin(),
    );
    let output = assert_completed(&result);

    assert_eq!(output.ir.kind, StatementKind::Select);
    assert!(output.ir.provenance.is_none());
    assert!(output.ir.rows.is_empty());
    assert_eq!(output.ir.projection.len(), 2);
    assert_eq!(output.ir.limit, Some(5));
}

#[test]
fn test_mutation_without_provenance_fails_in_ir_generation() {
    let pipeline = CompilePipeline::default();
    let result = pipeline.compile(
        &CompileRequest::new(
            r#"UPDATE evidence SET score = 3 WHERE score = 2 RATIONALE "recount""#,
            "admin",
        ),
        &evidence_schema(),
        &admin(),
    );
    let err = assert_pipeline_error(
        &result,
        PipelineErrorKind::Provenance,
        PipelineState::IRGenerating,
    );
    assert_suggests(&err, "ACTOR");
}

#[test]
fn test_update_without_rationale_is_a_parse_error() {
    let pipeline = CompilePipeline::default();
    let result = pipeline.compile(
        &request_with_defaults("UPDATE evidence SET score = 3 WHERE score = 2", "admin"),
        &evidence_schema(),
        &admin(),
    );
    let err = assert_pipeline_error(&result, PipelineErrorKind::Parse, PipelineState::Parsing);
    assert_eq!(err.message, "RATIONALE clause required for UPDATE");
    assert_suggests(&err, "RATIONALE");
}

#[test]
fn test_unknown_column_suggests_closest_name() {
    let pipeline = CompilePipeline::default();
    let result = pipeline.compile(
        &CompileRequest::new("SELECT titel FROM evidence", "admin"),
        &evidence_schema(),
        &admin(),
    );
    let err = assert_pipeline_error(
        &result,
        PipelineErrorKind::Type,
        PipelineState::TypeChecking,
    );
    assert!(err.message.contains("unknown column 'titel'"), "{}", err);
    assert_suggests(&err, "title");
}

#[test]
fn test_lex_error_reports_position() {
    let pipeline = CompilePipeline::default();
    let result = pipeline.compile(
        &CompileRequest::new("SELECT * FROM evidence WHERE title = \"open", "admin"),
        &evidence_schema(),
        &admin(),
    );
    let err = assert_pipeline_error(&result, PipelineErrorKind::Lex, PipelineState::Tokenizing);
    assert!(err.position.is_some());
}

#[test]
fn test_delete_needs_every_column_of_the_row() {
    let pipeline = CompilePipeline::default();
    let request = request_with_defaults(r#"DELETE FROM evidence WHERE score = 3 RATIONALE "gc""#, "nobody");

    let nobody = PermissionProfile::new("nobody", Vec::<TypeCategory>::new());
    let err = assert_pipeline_error(
        &pipeline.compile(&request, &evidence_schema(), &nobody),
        PipelineErrorKind::Permission,
        PipelineState::PermissionValidating,
    );
    assert!(err.message.contains("column 'score'"), "{}", err);

    let every_column: Vec<TypeCategory> = evidence_schema()
        .columns()
        .iter()
        .map(|c| c.ty.category())
        .collect();
    let janitor = PermissionProfile::new("nobody", every_column);
    assert_completed(&pipeline.compile(&request, &evidence_schema(), &janitor));
}

#[test]
fn test_whole_number_fits_confidence() {
    let pipeline = CompilePipeline::default();
    for source in [
        r#"INSERT INTO evidence SET confidence = 1 ACTOR "alice" RATIONALE "x""#,
        r#"INSERT INTO evidence SET confidence = 1 : Confidence ACTOR "alice" RATIONALE "x""#,
        r#"INSERT INTO evidence SET confidence = 0 ACTOR "alice" RATIONALE "x""#,
    ] {
        let result = pipeline.compile(&CompileRequest::new(source, "admin"), &evidence_schema(), &admin());
        let output = assert_completed(&result);
        let row = output.ir.row("confidence").unwrap();
        assert_eq!(row.value.ty(), &TypeExpr::Confidence);
        assert!(matches!(row.value.value(), Value::Float(_)), "{}", source);
    }

    let err = assert_pipeline_error(
        &pipeline.compile(
            &CompileRequest::new(
                r#"INSERT INTO evidence SET confidence = 2 ACTOR "alice" RATIONALE "x""#,
                "admin",
            ),
            &evidence_schema(),
            &admin(),
        ),
        PipelineErrorKind::Type,
        PipelineState::TypeChecking,
    );
    assert!(err.message.contains("confidence"), "{}", err);
}
