//! Serialization
//!
//! Bidirectional codecs for `TypedValue`s and `IRNode`s:
//!
//! - **CBOR**: canonical major-type encoding, refinement categories under
//!   vendor tags in `0x5051_0000..`
//! - **JSON**: same logical fields, tag replaced by a `category` field
//! - **Packed**: length-framed msgpack of the same data model
//! - **SQL**: one-way, lossy, flagged with a warning
//!
//! Decoding re-runs refinement verification on every value.

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::{Encoded, Serializer};
pub use domain::*;
pub use infrastructure::{
    cbor, decode_ir, decode_proof, decode_value, encode_ir, encode_proof, encode_value, json,
    lower_to_sql, packed, proof_for, SqlLowering, LOSSY_MARKER,
};
