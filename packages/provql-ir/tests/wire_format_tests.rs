//! Wire format tests
//!
//! Our CBOR is checked against an independent decoder (ciborium), compiled IR
//! is round-tripped through every decodable format, and malformed or
//! tampered input must fail to decode.

mod common;

use common::*;
use pretty_assertions::assert_eq;
use provql_ir::features::serialization::{
    cbor, encode_proof, encode_value, packed, proof_for, DataItem, SerializationError, VendorTag,
};
use provql_ir::{CompilePipeline, CompileRequest, Format, IRNode, Serializer, TypedValue};

fn compiled(source: &str) -> IRNode {
    CompilePipeline::default()
        .compile(&CompileRequest::new(source, "admin"), &evidence_schema(), &admin())
        .unwrap()
        .ir
}

fn insert_node() -> IRNode {
    compiled(r#"INSERT INTO evidence SET title = "ONS Data", prompt_provenance = 87, score = 12 ACTOR "alice" RATIONALE "official stats""#)
}

#[test]
fn test_ciborium_reads_and_reproduces_our_cbor() {
    let encoded = Serializer::new(Format::Cbor).encode_ir(&insert_node()).unwrap();
    let ours = encoded.as_bytes();

    let value: ciborium::Value = ciborium::de::from_reader(ours).unwrap();
    let mut theirs = Vec::new();
    ciborium::ser::into_writer(&value, &mut theirs).unwrap();

    // Float-free document: both encoders choose the same minimal heads
    assert_eq!(theirs, ours);
}

#[test]
fn test_we_read_ciborium_output() {
    let value = TypedValue::confidence(0.75).unwrap();
    let ours = Serializer::new(Format::Cbor).encode_value(&value).unwrap();

    // ciborium shrinks 0.75 to a half-precision float
    let parsed: ciborium::Value = ciborium::de::from_reader(ours.as_bytes()).unwrap();
    let mut theirs = Vec::new();
    ciborium::ser::into_writer(&parsed, &mut theirs).unwrap();
    assert!(theirs.len() < ours.len());

    let (decoded, proof) = Serializer::new(Format::Cbor).decode_value(&theirs).unwrap();
    assert_eq!(decoded, value);
    assert!(proof.verified);
}

#[test]
fn test_vendor_tags_for_every_category() {
    let samples = [
        (TypedValue::bounded_nat(0, 100, 87).unwrap(), VendorTag::BoundedNat),
        (TypedValue::non_empty_string("x").unwrap(), VendorTag::NonEmptyString),
        (TypedValue::confidence(0.5).unwrap(), VendorTag::Confidence),
        (
            TypedValue::prompt_scores(provql_ir::shared::models::PromptScores::new(1, 2, 3, 4, 5))
                .unwrap(),
            VendorTag::PromptScores,
        ),
    ];
    for (value, tag) in samples {
        let bytes = cbor::encode(&encode_value(&value, &proof_for(&value)));
        let parsed: ciborium::Value = ciborium::de::from_reader(bytes.as_slice()).unwrap();
        match parsed {
            ciborium::Value::Tag(found, inner) => {
                assert_eq!(found, tag.value());
                let ciborium::Value::Map(entries) = *inner else {
                    panic!("tag {} must wrap a map", tag.name());
                };
                let proof = entries
                    .iter()
                    .find(|(k, _)| k.as_text() == Some("proof"))
                    .map(|(_, v)| v)
                    .unwrap();
                assert!(matches!(proof, ciborium::Value::Tag(t, _) if *t == VendorTag::ProofBlob.value()));
            }
            other => panic!("{} encoded as {:?}", tag.name(), other),
        }
    }
}

#[test]
fn test_ir_round_trips_in_every_decodable_format() {
    let nodes = [
        insert_node(),
        compiled(r#"UPDATE evidence SET confidence = 0.9 WHERE score > 3 AND NOT title = "x" ACTOR "bob" RATIONALE "recal""#),
        compiled(r#"DELETE FROM evidence WHERE score = 1 ACTOR "ops" RATIONALE "gc""#),
        compiled("SELECT title, score FROM evidence WHERE score >= 10 ORDER BY score DESC LIMIT 3"),
    ];
    for format in [Format::Cbor, Format::Json, Format::Packed] {
        let serializer = Serializer::new(format);
        for node in &nodes {
            let encoded = serializer.encode_ir(node).unwrap();
            let decoded = serializer.decode_ir(encoded.as_bytes()).unwrap();
            assert_eq!(&decoded, node, "{} round trip of {:?}", format, node.kind);
        }
    }
}

#[test]
fn test_json_carries_the_same_fields() {
    let value = TypedValue::bounded_nat(0, 100, 87).unwrap();
    let encoded = Serializer::new(Format::Json).encode_value(&value).unwrap();
    let json: serde_json::Value = serde_json::from_str(&encoded.to_display_string()).unwrap();

    assert_eq!(json["category"], "bounded_nat");
    assert_eq!(json["min"], 0);
    assert_eq!(json["max"], 100);
    assert_eq!(json["value"], 87);
    assert_eq!(json["proof"]["verified"], true);
}

#[test]
fn test_json_confidence_survives_round_trip() {
    let serializer = Serializer::new(Format::Json);
    // xorshift over [0, 1), covering many digits of decimal expansion
    let mut state = 0x9E37_79B9_7F4A_7C15u64;
    for _ in 0..2_000 {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        let x = (state >> 11) as f64 / (1u64 << 53) as f64;

        let value = TypedValue::confidence(x).unwrap();
        let encoded = serializer.encode_value(&value).unwrap();
        let (decoded, proof) = serializer.decode_value(encoded.as_bytes()).unwrap();
        assert_eq!(decoded, value, "confidence {}", x);
        assert!(proof.verified);
    }

    let value = TypedValue::confidence(0.9856906946328695).unwrap();
    let encoded = serializer.encode_value(&value).unwrap();
    assert_eq!(serializer.decode_value(encoded.as_bytes()).unwrap().0, value);
}

#[test]
fn test_sql_is_one_way() {
    let encoded = Serializer::new(Format::Sql).encode_ir(&insert_node()).unwrap();
    assert!(!encoded.warnings().is_empty());
    assert!(encoded.to_display_string().contains("INSERT INTO evidence"));
    assert!(matches!(
        Serializer::new(Format::Sql).decode_ir(encoded.as_bytes()),
        Err(SerializationError::Unsupported { .. })
    ));
}

#[test]
fn test_decoding_rechecks_refinements() {
    let valid = TypedValue::bounded_nat(0, 100, 87).unwrap();
    let forged = DataItem::tagged(
        VendorTag::BoundedNat.value(),
        DataItem::map([
            ("min", DataItem::Unsigned(0)),
            ("max", DataItem::Unsigned(100)),
            ("value", DataItem::Unsigned(150)),
            ("proof", encode_proof(&proof_for(&valid))),
        ]),
    );
    let err = Serializer::new(Format::Cbor)
        .decode_value(&cbor::encode(&forged))
        .unwrap_err();
    assert!(matches!(err, SerializationError::Refinement(_)), "{}", err);
}

#[test]
fn test_proof_must_match_value() {
    let value = TypedValue::bounded_nat(0, 100, 87).unwrap();
    let other = TypedValue::bounded_nat(0, 100, 88).unwrap();
    let bytes = cbor::encode(&encode_value(&value, &proof_for(&other)));
    assert!(Serializer::new(Format::Cbor).decode_value(&bytes).is_err());
}

#[test]
fn test_malformed_input() {
    let cbor = Serializer::new(Format::Cbor);
    assert!(matches!(
        cbor.decode_value(&[0xda, 0x50, 0x51, 0xff, 0xff, 0xf6]),
        Err(SerializationError::UnknownTag(0x5051_ffff))
    ));
    assert!(matches!(
        cbor.decode_value(&[0x18]),
        Err(SerializationError::Truncated { .. })
    ));
    assert!(matches!(
        cbor.decode_value(&[0xf6, 0xf6]),
        Err(SerializationError::TrailingBytes { offset: 1, count: 1 })
    ));

    let valid = Serializer::new(Format::Packed)
        .encode_value(&TypedValue::nat(5))
        .unwrap();
    let mut bad_magic = valid.as_bytes().to_vec();
    bad_magic[0] = b'X';
    assert!(matches!(packed::decode(&bad_magic), Err(SerializationError::Packed(_))));
    assert!(packed::decode(&valid.as_bytes()[..valid.len() - 1]).is_err());
}
