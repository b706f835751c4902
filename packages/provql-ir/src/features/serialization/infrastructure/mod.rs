//! Wire formats

pub mod cbor;
pub mod ir_codec;
pub mod json;
pub mod packed;
pub mod sql;
pub mod value_codec;

pub use ir_codec::{decode_ir, encode_ir};
pub use sql::{lower_to_sql, SqlLowering, LOSSY_MARKER};
pub use value_codec::{decode_proof, decode_value, encode_proof, encode_value, proof_for};
