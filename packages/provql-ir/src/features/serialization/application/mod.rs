//! Serializer facade
//!
//! Picks the wire format for values and IR nodes. Binary formats produce
//! bytes, JSON produces text, SQL produces an advisory lowering that cannot be
//! decoded.

use crate::features::ir_generation::{IRNode, ProofBlob};
use crate::features::serialization::domain::{
    hex, DataItem, Format, SerializationError, SerializationResult,
};
use crate::features::serialization::infrastructure::{
    cbor, decode_ir, decode_value, encode_ir, encode_value, json, lower_to_sql, packed,
    proof_for, SqlLowering,
};
use crate::shared::models::TypedValue;
use tracing::trace;

/// Encoded artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Encoded {
    Binary(Vec<u8>),
    Text(String),
    Sql(SqlLowering),
}

impl Encoded {
    pub fn len(&self) -> usize {
        match self {
            Self::Binary(bytes) => bytes.len(),
            Self::Text(text) => text.len(),
            Self::Sql(sql) => sql.text.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Advisory warnings (only SQL lowering has any)
    pub fn warnings(&self) -> &[String] {
        match self {
            Self::Sql(sql) => &sql.warnings,
            _ => &[],
        }
    }

    /// Printable form: hex for binary, the text otherwise
    pub fn to_display_string(&self) -> String {
        match self {
            Self::Binary(bytes) => hex(bytes),
            Self::Text(text) => text.clone(),
            Self::Sql(sql) => sql.text.clone(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Binary(bytes) => bytes,
            Self::Text(text) => text.as_bytes(),
            Self::Sql(sql) => sql.text.as_bytes(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Serializer {
    format: Format,
}

impl Serializer {
    pub fn new(format: Format) -> Self {
        Self { format }
    }

    pub fn format(&self) -> Format {
        self.format
    }

    /// Encode a standalone value; its proof is minted from the runtime predicate
    pub fn encode_value(&self, value: &TypedValue) -> SerializationResult<Encoded> {
        self.encode_value_with_proof(value, &proof_for(value))
    }

    pub fn encode_value_with_proof(
        &self,
        value: &TypedValue,
        proof: &ProofBlob,
    ) -> SerializationResult<Encoded> {
        if self.format == Format::Sql {
            return Err(SerializationError::Unsupported {
                format: Format::Sql,
                what: "standalone values".to_string(),
            });
        }
        self.write(&encode_value(value, proof))
    }

    pub fn decode_value(&self, encoded: &[u8]) -> SerializationResult<(TypedValue, ProofBlob)> {
        decode_value(&self.read(encoded)?)
    }

    pub fn encode_ir(&self, node: &IRNode) -> SerializationResult<Encoded> {
        if self.format == Format::Sql {
            return Ok(Encoded::Sql(lower_to_sql(node)));
        }
        self.write(&encode_ir(node))
    }

    pub fn decode_ir(&self, encoded: &[u8]) -> SerializationResult<IRNode> {
        decode_ir(&self.read(encoded)?)
    }

    fn write(&self, item: &DataItem) -> SerializationResult<Encoded> {
        let encoded = match self.format {
            Format::Cbor => Encoded::Binary(cbor::encode(item)),
            Format::Packed => Encoded::Binary(packed::encode(item)?),
            Format::Json => Encoded::Text(json::to_string(item)?),
            Format::Sql => {
                return Err(SerializationError::Unsupported {
                    format: Format::Sql,
                    what: "generic data items".to_string(),
                })
            }
        };
        trace!(format = %self.format, bytes = encoded.len(), "encoded");
        Ok(encoded)
    }

    fn read(&self, encoded: &[u8]) -> SerializationResult<DataItem> {
        match self.format {
            Format::Cbor => cbor::decode(encoded),
            Format::Packed => packed::decode(encoded),
            Format::Json => {
                let text = std::str::from_utf8(encoded)
                    .map_err(|e| SerializationError::Json(e.to_string()))?;
                json::from_str(text)
            }
            Format::Sql => Err(SerializationError::Unsupported {
                format: Format::Sql,
                what: "decoding".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::PromptScores;

    fn samples() -> Vec<TypedValue> {
        vec![
            TypedValue::bounded_nat(0, 100, 87).unwrap(),
            TypedValue::non_empty_string("ONS Data").unwrap(),
            TypedValue::confidence(0.9).unwrap(),
            TypedValue::prompt_scores(PromptScores::new(80, 70, 90, 60, 75)).unwrap(),
        ]
    }

    #[test]
    fn test_round_trip_every_decodable_format() {
        for format in Format::ALL.into_iter().filter(Format::is_decodable) {
            let serializer = Serializer::new(format);
            for value in samples() {
                let encoded = serializer.encode_value(&value).unwrap();
                let (decoded, proof) = serializer.decode_value(encoded.as_bytes()).unwrap();
                assert_eq!(decoded, value, "{} round trip", format);
                assert!(proof.verified);
            }
        }
    }

    #[test]
    fn test_json_is_a_plain_object() {
        let encoded = Serializer::new(Format::Json)
            .encode_value(&TypedValue::bounded_nat(0, 100, 87).unwrap())
            .unwrap();
        let json: serde_json::Value = serde_json::from_str(&encoded.to_display_string()).unwrap();
        assert_eq!(json["category"], "bounded_nat");
        assert_eq!(json["value"], 87);
        assert_eq!(json["proof"]["category"], "proof_blob");
    }

    #[test]
    fn test_sql_rejects_values_and_decoding() {
        let sql = Serializer::new(Format::Sql);
        assert!(sql.encode_value(&TypedValue::nat(1)).is_err());
        assert!(matches!(
            sql.decode_value(b"SELECT 1"),
            Err(SerializationError::Unsupported { .. })
        ));
    }

    #[test]
    fn test_truncated_cbor_is_an_error() {
        let serializer = Serializer::default();
        let encoded = serializer.encode_value(&TypedValue::nat(1_000)).unwrap();
        let bytes = encoded.as_bytes();
        assert!(serializer.decode_value(&bytes[..bytes.len() - 1]).is_err());
    }
}
