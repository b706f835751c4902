//! Serialization domain models

pub mod data_item;
pub mod error;
pub mod format;
pub mod tags;

pub use data_item::{canonical_key_order, hex, DataItem};
pub use error::{SerializationError, SerializationResult};
pub use format::Format;
pub use tags::{VendorTag, VENDOR_TAG_BASE};
