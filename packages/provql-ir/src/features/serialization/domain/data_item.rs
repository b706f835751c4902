//! Format-neutral data model
//!
//! Every wire format maps to and from `DataItem`. The variants mirror the
//! CBOR major types so the binary codec is a direct walk.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DataItem {
    /// Major type 0
    Unsigned(u64),
    /// Major type 1; represents `-1 - n`
    Negative(u64),
    Bytes(Vec<u8>),
    Text(String),
    Array(Vec<DataItem>),
    /// Entries in canonical key order when built with [`DataItem::map`]
    Map(Vec<(DataItem, DataItem)>),
    Tag(u64, Box<DataItem>),
    Bool(bool),
    Null,
    Float(f64),
}

impl DataItem {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn int(value: i64) -> Self {
        if value >= 0 {
            Self::Unsigned(value as u64)
        } else {
            Self::Negative(!(value as u64))
        }
    }

    /// Map with text keys, sorted canonically (shorter key first, then bytewise)
    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, DataItem)>) -> Self {
        let mut entries: Vec<(String, DataItem)> =
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect();
        entries.sort_by(|(a, _), (b, _)| canonical_key_order(a.as_bytes(), b.as_bytes()));
        Self::Map(
            entries
                .into_iter()
                .map(|(k, v)| (Self::Text(k), v))
                .collect(),
        )
    }

    pub fn tagged(tag: u64, inner: DataItem) -> Self {
        Self::Tag(tag, Box::new(inner))
    }

    pub fn optional(item: Option<DataItem>) -> Self {
        item.unwrap_or(Self::Null)
    }

    /// Field of a text-keyed map
    pub fn field(&self, name: &str) -> Option<&DataItem> {
        match self {
            Self::Map(entries) => entries.iter().find_map(|(k, v)| match k {
                Self::Text(key) if key == name => Some(v),
                _ => None,
            }),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Unsigned(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Unsigned(n) => i64::try_from(*n).ok(),
            Self::Negative(n) => i64::try_from(*n).ok().map(|n| -1 - n),
            _ => None,
        }
    }

    /// Floats, and integers read as floats
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(x) => Some(*x),
            Self::Unsigned(n) => Some(*n as f64),
            Self::Negative(n) => Some(-1.0 - *n as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[DataItem]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Short description for error messages
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Unsigned(_) => "unsigned integer",
            Self::Negative(_) => "negative integer",
            Self::Bytes(_) => "byte string",
            Self::Text(_) => "text string",
            Self::Array(_) => "array",
            Self::Map(_) => "map",
            Self::Tag(..) => "tagged item",
            Self::Bool(_) => "boolean",
            Self::Null => "null",
            Self::Float(_) => "float",
        }
    }
}

/// Canonical CBOR key order: shorter encodings first, then bytewise
pub fn canonical_key_order(a: &[u8], b: &[u8]) -> std::cmp::Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

impl fmt::Display for DataItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsigned(n) => write!(f, "{}", n),
            Self::Negative(n) => write!(f, "-{}", *n as u128 + 1),
            Self::Bytes(b) => write!(f, "h'{}'", hex(b)),
            Self::Text(s) => write!(f, "{:?}", s),
            Self::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Self::Map(entries) => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                f.write_str("}")
            }
            Self::Tag(tag, inner) => write!(f, "{}({})", tag, inner),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Null => f.write_str("null"),
            Self::Float(x) => write!(f, "{:?}", x),
        }
    }
}

/// Lowercase hex
pub fn hex(bytes: &[u8]) -> String {
    use std::fmt::Write;
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
        let _ = write!(out, "{:02x}", b);
        out
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_round_trips_through_negative() {
        assert_eq!(DataItem::int(-1), DataItem::Negative(0));
        assert_eq!(DataItem::int(-500).as_i64(), Some(-500));
        assert_eq!(DataItem::int(i64::MIN).as_i64(), Some(i64::MIN));
        assert_eq!(DataItem::int(7), DataItem::Unsigned(7));
    }

    #[test]
    fn test_map_sorts_keys_canonically() {
        let item = DataItem::map([
            ("value", DataItem::Unsigned(1)),
            ("max", DataItem::Unsigned(2)),
            ("min", DataItem::Unsigned(3)),
            ("proof", DataItem::Null),
        ]);
        let keys: Vec<&str> = match &item {
            DataItem::Map(entries) => entries.iter().filter_map(|(k, _)| k.as_str()).collect(),
            _ => unreachable!(),
        };
        assert_eq!(keys, vec!["max", "min", "proof", "value"]);
        assert_eq!(item.field("min"), Some(&DataItem::Unsigned(3)));
    }

    #[test]
    fn test_display_diagnostic_notation() {
        let item = DataItem::tagged(
            0x5051_0001,
            DataItem::map([("value", DataItem::Unsigned(87))]),
        );
        assert_eq!(item.to_string(), "1347485697({\"value\": 87})");
        assert_eq!(DataItem::Negative(u64::MAX).to_string(), "-18446744073709551616");
    }
}
