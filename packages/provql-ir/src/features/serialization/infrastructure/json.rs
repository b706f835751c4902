//! JSON mapping of the data model
//!
//! Vendor tags become a `"category"` discriminator inside the object, so the
//! JSON document carries the same logical fields as the binary form.

use crate::features::serialization::domain::{
    DataItem, Format, SerializationError, SerializationResult, VendorTag,
};
use serde_json::{Map, Number, Value as Json};

const CATEGORY_KEY: &str = "category";

pub fn to_json(item: &DataItem) -> SerializationResult<Json> {
    Ok(match item {
        DataItem::Unsigned(n) => Json::Number((*n).into()),
        DataItem::Negative(_) => {
            let value = item.as_i64().ok_or_else(|| unsupported("integers below i64::MIN"))?;
            Json::Number(value.into())
        }
        DataItem::Float(x) => Number::from_f64(*x)
            .map(Json::Number)
            .ok_or_else(|| unsupported("non-finite floats"))?,
        DataItem::Text(s) => Json::String(s.clone()),
        DataItem::Bool(b) => Json::Bool(*b),
        DataItem::Null => Json::Null,
        DataItem::Bytes(_) => return Err(unsupported("byte strings")),
        DataItem::Array(items) => Json::Array(items.iter().map(to_json).collect::<Result<_, _>>()?),
        DataItem::Map(_) => Json::Object(object(item)?),
        DataItem::Tag(tag, inner) => {
            let vendor = VendorTag::from_value(*tag).ok_or(SerializationError::UnknownTag(*tag))?;
            let mut fields = match inner.as_ref() {
                map @ DataItem::Map(_) => object(map)?,
                other => {
                    return Err(SerializationError::InvalidTag {
                        tag: *tag,
                        reason: format!("expected map, found {}", other.describe()),
                    })
                }
            };
            if fields.contains_key(CATEGORY_KEY) {
                return Err(SerializationError::InvalidTag {
                    tag: *tag,
                    reason: format!("field '{}' is reserved", CATEGORY_KEY),
                });
            }
            fields.insert(CATEGORY_KEY.to_string(), Json::String(vendor.name().to_string()));
            Json::Object(fields)
        }
    })
}

fn object(map: &DataItem) -> SerializationResult<Map<String, Json>> {
    let DataItem::Map(entries) = map else {
        return Err(SerializationError::unexpected("map", map.describe()));
    };
    let mut out = Map::with_capacity(entries.len());
    for (key, value) in entries {
        let key = key.as_str().ok_or_else(|| unsupported("non-text map keys"))?;
        out.insert(key.to_string(), to_json(value)?);
    }
    Ok(out)
}

pub fn from_json(json: &Json) -> SerializationResult<DataItem> {
    Ok(match json {
        Json::Null => DataItem::Null,
        Json::Bool(b) => DataItem::Bool(*b),
        Json::Number(n) => {
            if let Some(u) = n.as_u64() {
                DataItem::Unsigned(u)
            } else if let Some(i) = n.as_i64() {
                DataItem::int(i)
            } else {
                DataItem::Float(n.as_f64().ok_or_else(|| {
                    SerializationError::Json(format!("number {} is out of range", n))
                })?)
            }
        }
        Json::String(s) => DataItem::text(s),
        Json::Array(items) => DataItem::Array(items.iter().map(from_json).collect::<Result<_, _>>()?),
        Json::Object(fields) => {
            let mut entries = Vec::with_capacity(fields.len());
            for (key, value) in fields.iter().filter(|(k, _)| k.as_str() != CATEGORY_KEY) {
                entries.push((key.as_str(), from_json(value)?));
            }
            let map = DataItem::map(entries);
            match fields.get(CATEGORY_KEY) {
                None => map,
                Some(Json::String(name)) => {
                    let vendor = VendorTag::from_name(name).ok_or_else(|| {
                        SerializationError::field(CATEGORY_KEY, format!("unknown category '{}'", name))
                    })?;
                    DataItem::tagged(vendor.value(), map)
                }
                Some(_) => return Err(SerializationError::field(CATEGORY_KEY, "expected text")),
            }
        }
    })
}

pub fn to_string(item: &DataItem) -> SerializationResult<String> {
    serde_json::to_string(&to_json(item)?).map_err(|e| SerializationError::Json(e.to_string()))
}

pub fn from_str(text: &str) -> SerializationResult<DataItem> {
    let json: Json = serde_json::from_str(text).map_err(|e| SerializationError::Json(e.to_string()))?;
    from_json(&json)
}

fn unsupported(what: &str) -> SerializationError {
    SerializationError::Unsupported {
        format: Format::Json,
        what: what.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_vendor_tag_becomes_category() {
        let item = DataItem::tagged(
            VendorTag::BoundedNat.value(),
            DataItem::map([
                ("min", DataItem::Unsigned(0)),
                ("max", DataItem::Unsigned(100)),
                ("value", DataItem::Unsigned(87)),
            ]),
        );
        let json = to_json(&item).unwrap();
        assert_eq!(
            json,
            json!({"category": "bounded_nat", "min": 0, "max": 100, "value": 87})
        );
        assert_eq!(from_json(&json).unwrap(), item);
    }

    #[test]
    fn test_numbers() {
        assert_eq!(from_str("-3").unwrap(), DataItem::int(-3));
        assert_eq!(from_str("0.25").unwrap(), DataItem::Float(0.25));
        assert_eq!(from_str("1.0").unwrap(), DataItem::Float(1.0));
        assert_eq!(to_string(&DataItem::Float(1.0)).unwrap(), "1.0");
    }

    #[test]
    fn test_floats_parse_back_bit_exact() {
        for x in [0.9856906946328695, 0.1 + 0.2, 2.0f64.powi(-1074), 0.7071067811865476] {
            let text = to_string(&DataItem::Float(x)).unwrap();
            match from_str(&text).unwrap() {
                DataItem::Float(y) => assert_eq!(y.to_bits(), x.to_bits(), "{}", text),
                other => panic!("expected float, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_unsupported_items() {
        assert!(matches!(
            to_json(&DataItem::Float(f64::NAN)),
            Err(SerializationError::Unsupported { format: Format::Json, .. })
        ));
        assert!(to_json(&DataItem::Bytes(vec![1])).is_err());
        assert_eq!(
            to_json(&DataItem::tagged(1, DataItem::Null)),
            Err(SerializationError::UnknownTag(1))
        );
    }

    #[test]
    fn test_unknown_category() {
        let err = from_str(r#"{"category": "bogus", "value": 1}"#).unwrap_err();
        assert!(err.to_string().contains("unknown category 'bogus'"));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(from_str("{\"a\":"), Err(SerializationError::Json(_))));
    }
}
