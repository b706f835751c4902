//! TypedValue <-> DataItem
//!
//! Refinement categories travel under their vendor tag as a map of named
//! fields plus the embedded proof blob. Every other type travels in a
//! `{type, value, proof}` envelope. Decoding never trusts its input: the
//! value is rebuilt through `TypedValue::new` and the proof must match the
//! decoded value's category and fingerprint.

use crate::features::ir_generation::{fingerprint, mint_proof, ProofBlob};
use crate::features::serialization::domain::{
    DataItem, SerializationError, SerializationResult, VendorTag,
};
use crate::features::smt::VerificationMethod;
use crate::shared::models::{
    decide, Decision, PromptScores, TypeCategory, TypeExpr, TypedValue, Value,
};
use uuid::Uuid;

/// Proof for a value encoded outside an IR node
///
/// Values are valid by construction, so the runtime predicate always holds.
pub fn proof_for(value: &TypedValue) -> ProofBlob {
    let evidence = match decide(value.ty(), value.value()) {
        Decision::Holds { evidence } => evidence,
        Decision::Fails { detail, .. } => detail,
        Decision::Undecidable { reason } => reason,
    };
    mint_proof(VerificationMethod::RuntimePredicate, &evidence, value)
}

pub fn encode_proof(proof: &ProofBlob) -> DataItem {
    DataItem::tagged(
        VendorTag::ProofBlob.value(),
        DataItem::map([
            ("kind", DataItem::text(proof.kind.as_str())),
            ("value_category", DataItem::text(proof.category.as_str())),
            ("payload", DataItem::text(&proof.payload)),
            ("verified", DataItem::Bool(proof.verified)),
        ]),
    )
}

pub fn decode_proof(item: &DataItem) -> SerializationResult<ProofBlob> {
    let fields = expect_tag(item, VendorTag::ProofBlob)?;
    let kind = text_field(fields, "kind")?
        .parse::<VerificationMethod>()
        .map_err(|e| SerializationError::field("kind", e))?;
    let category: TypeCategory = text_field(fields, "value_category")?
        .parse()
        .map_err(|e: String| SerializationError::field("value_category", e))?;
    let payload = text_field(fields, "payload")?.to_string();
    let verified = required(fields, "verified")?
        .as_bool()
        .ok_or_else(|| SerializationError::field("verified", "expected boolean"))?;
    Ok(ProofBlob {
        kind,
        category,
        payload,
        verified,
    })
}

/// Encode a value with the proof of how it was verified
pub fn encode_value(value: &TypedValue, proof: &ProofBlob) -> DataItem {
    let proof_item = encode_proof(proof);
    match (value.ty(), value.value()) {
        (TypeExpr::BoundedNat { min, max }, Value::Nat(n)) => DataItem::tagged(
            VendorTag::BoundedNat.value(),
            DataItem::map([
                ("min", DataItem::Unsigned(*min)),
                ("max", DataItem::Unsigned(*max)),
                ("value", DataItem::Unsigned(*n)),
                ("proof", proof_item),
            ]),
        ),
        (TypeExpr::NonEmptyString, Value::Text(text)) => DataItem::tagged(
            VendorTag::NonEmptyString.value(),
            DataItem::map([("value", DataItem::text(text)), ("proof", proof_item)]),
        ),
        (TypeExpr::Confidence, Value::Float(x)) => DataItem::tagged(
            VendorTag::Confidence.value(),
            DataItem::map([("value", DataItem::Float(*x)), ("proof", proof_item)]),
        ),
        (TypeExpr::PromptScores, Value::Scores(scores)) => {
            let mut fields: Vec<(&str, DataItem)> = scores
                .entries()
                .iter()
                .map(|(name, score)| (*name, DataItem::Unsigned(*score)))
                .collect();
            fields.push(("proof", proof_item));
            DataItem::tagged(VendorTag::PromptScores.value(), DataItem::map(fields))
        }
        (ty, plain) => DataItem::map([
            ("type", DataItem::text(ty.to_string())),
            ("value", encode_plain(plain)),
            ("proof", proof_item),
        ]),
    }
}

/// Decode and re-verify a value and its proof
pub fn decode_value(item: &DataItem) -> SerializationResult<(TypedValue, ProofBlob)> {
    let (ty, value, fields) = match item {
        DataItem::Tag(tag, _) => {
            let vendor = VendorTag::from_value(*tag).ok_or(SerializationError::UnknownTag(*tag))?;
            let fields = expect_tag(item, vendor)?;
            let (ty, value) = decode_tagged(vendor, fields)?;
            (ty, value, fields)
        }
        DataItem::Map(_) => {
            let ty: TypeExpr = text_field(item, "type")?
                .parse()
                .map_err(|e: String| SerializationError::field("type", e))?;
            let value = decode_plain(&ty, required(item, "value")?, "value")?;
            (ty, value, item)
        }
        other => {
            return Err(SerializationError::unexpected(
                "tagged value or typed envelope",
                other.describe(),
            ))
        }
    };

    let typed = TypedValue::new(ty, value)?;
    let proof = decode_proof(required(fields, "proof")?)?;
    check_proof(&typed, &proof)?;
    Ok((typed, proof))
}

/// The proof must describe this exact value
fn check_proof(value: &TypedValue, proof: &ProofBlob) -> SerializationResult<()> {
    let category = value.ty().category();
    if proof.category != category {
        return Err(SerializationError::field(
            "proof",
            format!(
                "proof is for category {}, value has category {}",
                proof.category, category
            ),
        ));
    }
    let expected = fingerprint(value);
    let recorded = proof
        .payload
        .rsplit_once("fingerprint=")
        .map(|(_, fp)| fp.trim());
    if recorded != Some(expected.as_str()) {
        return Err(SerializationError::field(
            "proof",
            "fingerprint does not match the decoded value",
        ));
    }
    Ok(())
}

fn decode_tagged(vendor: VendorTag, fields: &DataItem) -> SerializationResult<(TypeExpr, Value)> {
    match vendor {
        VendorTag::BoundedNat => {
            let min = u64_field(fields, "min")?;
            let max = u64_field(fields, "max")?;
            let value = u64_field(fields, "value")?;
            Ok((TypeExpr::bounded_nat(min, max), Value::Nat(value)))
        }
        VendorTag::NonEmptyString => Ok((
            TypeExpr::NonEmptyString,
            Value::Text(text_field(fields, "value")?.to_string()),
        )),
        VendorTag::Confidence => {
            let value = required(fields, "value")?
                .as_f64()
                .ok_or_else(|| SerializationError::field("value", "expected number"))?;
            Ok((TypeExpr::Confidence, Value::Float(value)))
        }
        VendorTag::PromptScores => {
            let mut entries = Vec::with_capacity(PromptScores::FIELDS.len());
            for name in PromptScores::FIELDS {
                entries.push((name, u64_field(fields, name)?));
            }
            let scores = PromptScores::from_entries(entries)
                .map_err(|e| SerializationError::field("prompt_scores", e))?;
            Ok((TypeExpr::PromptScores, Value::Scores(scores)))
        }
        VendorTag::ProofBlob => Err(SerializationError::InvalidTag {
            tag: vendor.value(),
            reason: "a proof blob is not a value".to_string(),
        }),
    }
}

/// Untagged encoding used inside envelopes; the type travels separately
fn encode_plain(value: &Value) -> DataItem {
    match value {
        Value::Nat(n) => DataItem::Unsigned(*n),
        Value::Int(i) => DataItem::int(*i),
        Value::Float(x) => DataItem::Float(*x),
        Value::Text(s) => DataItem::text(s),
        Value::Bool(b) => DataItem::Bool(*b),
        Value::Uuid(u) => DataItem::text(u.hyphenated().to_string()),
        Value::Timestamp(ms) => DataItem::int(*ms),
        Value::Vector(items) => DataItem::Array(items.iter().map(encode_plain).collect()),
        Value::Scores(scores) => DataItem::map(
            scores
                .entries()
                .iter()
                .map(|(name, score)| (*name, DataItem::Unsigned(*score))),
        ),
    }
}

fn decode_plain(ty: &TypeExpr, item: &DataItem, field: &str) -> SerializationResult<Value> {
    let wrong = |expected: &str| {
        SerializationError::field(
            field,
            format!("expected {} for {}, found {}", expected, ty, item.describe()),
        )
    };
    Ok(match ty.base() {
        TypeExpr::Nat => Value::Nat(item.as_u64().ok_or_else(|| wrong("unsigned integer"))?),
        TypeExpr::Int => Value::Int(item.as_i64().ok_or_else(|| wrong("integer"))?),
        TypeExpr::Float => Value::Float(item.as_f64().ok_or_else(|| wrong("number"))?),
        TypeExpr::String => Value::Text(item.as_str().ok_or_else(|| wrong("text"))?.to_string()),
        TypeExpr::Bool => Value::Bool(item.as_bool().ok_or_else(|| wrong("boolean"))?),
        TypeExpr::Uuid => {
            let text = item.as_str().ok_or_else(|| wrong("UUID text"))?;
            Value::Uuid(Uuid::parse_str(text).map_err(|e| SerializationError::field(field, e.to_string()))?)
        }
        TypeExpr::Timestamp => Value::Timestamp(item.as_i64().ok_or_else(|| wrong("epoch milliseconds"))?),
        TypeExpr::Vector(_, _) => {
            let TypeExpr::Vector(element, _) = ty else {
                return Err(wrong("vector type"));
            };
            let items = item.as_array().ok_or_else(|| wrong("array"))?;
            Value::Vector(
                items
                    .iter()
                    .map(|i| decode_plain(element, i, field))
                    .collect::<Result<_, _>>()?,
            )
        }
        TypeExpr::PromptScores => {
            let mut entries = Vec::with_capacity(PromptScores::FIELDS.len());
            for name in PromptScores::FIELDS {
                entries.push((name, u64_field(item, name)?));
            }
            Value::Scores(
                PromptScores::from_entries(entries)
                    .map_err(|e| SerializationError::field(field, e))?,
            )
        }
        _ => return Err(wrong("base type")),
    })
}

/// Inner map of `item`, which must carry `vendor`'s tag
fn expect_tag(item: &DataItem, vendor: VendorTag) -> SerializationResult<&DataItem> {
    match item {
        DataItem::Tag(tag, inner) if *tag == vendor.value() => match inner.as_ref() {
            map @ DataItem::Map(_) => Ok(map),
            other => Err(SerializationError::InvalidTag {
                tag: *tag,
                reason: format!("expected map, found {}", other.describe()),
            }),
        },
        DataItem::Tag(tag, _) if VendorTag::from_value(*tag).is_none() => {
            Err(SerializationError::UnknownTag(*tag))
        }
        other => Err(SerializationError::unexpected(
            format!("{} tag", vendor.name()),
            other.describe(),
        )),
    }
}

pub(crate) fn required<'a>(map: &'a DataItem, name: &str) -> SerializationResult<&'a DataItem> {
    map.field(name)
        .ok_or_else(|| SerializationError::field(name, "missing"))
}

pub(crate) fn text_field<'a>(map: &'a DataItem, name: &str) -> SerializationResult<&'a str> {
    required(map, name)?
        .as_str()
        .ok_or_else(|| SerializationError::field(name, "expected text"))
}

pub(crate) fn u64_field(map: &DataItem, name: &str) -> SerializationResult<u64> {
    required(map, name)?
        .as_u64()
        .ok_or_else(|| SerializationError::field(name, "expected unsigned integer"))
}
