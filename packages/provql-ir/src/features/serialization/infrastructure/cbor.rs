//! Canonical CBOR codec
//!
//! Encoder: shortest-form heads, definite lengths, map entries sorted by
//! encoded key, floats always as float64. Decoder: accepts half/single/double
//! floats and any map order, rejects indefinite lengths, and checks every
//! length against the remaining input before allocating.

use crate::features::serialization::domain::{
    canonical_key_order, DataItem, SerializationError, SerializationResult,
};

const MAJOR_UNSIGNED: u8 = 0;
const MAJOR_NEGATIVE: u8 = 1;
const MAJOR_BYTES: u8 = 2;
const MAJOR_TEXT: u8 = 3;
const MAJOR_ARRAY: u8 = 4;
const MAJOR_MAP: u8 = 5;
const MAJOR_TAG: u8 = 6;
const MAJOR_SIMPLE: u8 = 7;

const FALSE: u8 = 0xf4;
const TRUE: u8 = 0xf5;
const NULL: u8 = 0xf6;
const FLOAT64: u8 = 0xfb;

/// Nesting limit for decoding
pub const MAX_DEPTH: usize = 128;

pub fn encode(item: &DataItem) -> Vec<u8> {
    let mut out = Vec::new();
    write_item(&mut out, item);
    out
}

fn write_head(out: &mut Vec<u8>, major: u8, arg: u64) {
    let major = major << 5;
    if arg < 24 {
        out.push(major | arg as u8);
    } else if arg <= u8::MAX as u64 {
        out.push(major | 24);
        out.push(arg as u8);
    } else if arg <= u16::MAX as u64 {
        out.push(major | 25);
        out.extend_from_slice(&(arg as u16).to_be_bytes());
    } else if arg <= u32::MAX as u64 {
        out.push(major | 26);
        out.extend_from_slice(&(arg as u32).to_be_bytes());
    } else {
        out.push(major | 27);
        out.extend_from_slice(&arg.to_be_bytes());
    }
}

fn write_item(out: &mut Vec<u8>, item: &DataItem) {
    match item {
        DataItem::Unsigned(n) => write_head(out, MAJOR_UNSIGNED, *n),
        DataItem::Negative(n) => write_head(out, MAJOR_NEGATIVE, *n),
        DataItem::Bytes(bytes) => {
            write_head(out, MAJOR_BYTES, bytes.len() as u64);
            out.extend_from_slice(bytes);
        }
        DataItem::Text(text) => {
            write_head(out, MAJOR_TEXT, text.len() as u64);
            out.extend_from_slice(text.as_bytes());
        }
        DataItem::Array(items) => {
            write_head(out, MAJOR_ARRAY, items.len() as u64);
            for item in items {
                write_item(out, item);
            }
        }
        DataItem::Map(entries) => {
            let mut encoded: Vec<(Vec<u8>, &DataItem)> =
                entries.iter().map(|(k, v)| (encode(k), v)).collect();
            encoded.sort_by(|(a, _), (b, _)| canonical_key_order(a, b));
            write_head(out, MAJOR_MAP, encoded.len() as u64);
            for (key, value) in encoded {
                out.extend_from_slice(&key);
                write_item(out, value);
            }
        }
        DataItem::Tag(tag, inner) => {
            write_head(out, MAJOR_TAG, *tag);
            write_item(out, inner);
        }
        DataItem::Bool(false) => out.push(FALSE),
        DataItem::Bool(true) => out.push(TRUE),
        DataItem::Null => out.push(NULL),
        DataItem::Float(x) => {
            out.push(FLOAT64);
            out.extend_from_slice(&x.to_be_bytes());
        }
    }
}

/// Decode exactly one item; trailing bytes are an error
pub fn decode(bytes: &[u8]) -> SerializationResult<DataItem> {
    let mut reader = CborReader::new(bytes);
    let item = reader.read_item()?;
    if reader.offset < bytes.len() {
        return Err(SerializationError::TrailingBytes {
            offset: reader.offset,
            count: bytes.len() - reader.offset,
        });
    }
    Ok(item)
}

struct CborReader<'a> {
    bytes: &'a [u8],
    offset: usize,
    depth: usize,
}

impl<'a> CborReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            offset: 0,
            depth: 0,
        }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    fn take(&mut self, n: usize) -> SerializationResult<&'a [u8]> {
        if self.remaining() < n {
            return Err(SerializationError::Truncated {
                offset: self.offset,
                needed: n - self.remaining(),
            });
        }
        let slice = &self.bytes[self.offset..self.offset + n];
        self.offset += n;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self) -> SerializationResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Argument of a head whose additional info is `info`
    fn read_argument(&mut self, info: u8, head_offset: usize) -> SerializationResult<u64> {
        match info {
            0..=23 => Ok(info as u64),
            24 => Ok(self.take_array::<1>()?[0] as u64),
            25 => Ok(u16::from_be_bytes(self.take_array()?) as u64),
            26 => Ok(u32::from_be_bytes(self.take_array()?) as u64),
            27 => Ok(u64::from_be_bytes(self.take_array()?)),
            31 => Err(SerializationError::MalformedLength {
                offset: head_offset,
                reason: "indefinite-length items are not supported".to_string(),
            }),
            _ => Err(SerializationError::MalformedLength {
                offset: head_offset,
                reason: format!("reserved additional information {}", info),
            }),
        }
    }

    /// Length argument checked against the bytes left (`min_item_size` per element)
    fn read_length(&mut self, info: u8, head_offset: usize, min_item_size: usize) -> SerializationResult<usize> {
        let len = self.read_argument(info, head_offset)?;
        let fits = usize::try_from(len)
            .ok()
            .and_then(|n| n.checked_mul(min_item_size))
            .is_some_and(|needed| needed <= self.remaining());
        if !fits {
            return Err(SerializationError::MalformedLength {
                offset: head_offset,
                reason: format!(
                    "length {} exceeds the {} remaining bytes",
                    len,
                    self.remaining()
                ),
            });
        }
        Ok(len as usize)
    }

    fn read_item(&mut self) -> SerializationResult<DataItem> {
        if self.depth >= MAX_DEPTH {
            return Err(SerializationError::MalformedLength {
                offset: self.offset,
                reason: format!("nesting exceeds {} levels", MAX_DEPTH),
            });
        }
        let head_offset = self.offset;
        let initial = self.take_array::<1>()?[0];
        let (major, info) = (initial >> 5, initial & 0x1f);

        let item = match major {
            MAJOR_UNSIGNED => DataItem::Unsigned(self.read_argument(info, head_offset)?),
            MAJOR_NEGATIVE => DataItem::Negative(self.read_argument(info, head_offset)?),
            MAJOR_BYTES => {
                let len = self.read_length(info, head_offset, 1)?;
                DataItem::Bytes(self.take(len)?.to_vec())
            }
            MAJOR_TEXT => {
                let len = self.read_length(info, head_offset, 1)?;
                let raw = self.take(len)?;
                let text = std::str::from_utf8(raw).map_err(|_| {
                    SerializationError::unexpected(
                        "UTF-8 text",
                        format!("invalid UTF-8 at offset {}", head_offset),
                    )
                })?;
                DataItem::Text(text.to_string())
            }
            MAJOR_ARRAY => {
                let len = self.read_length(info, head_offset, 1)?;
                self.depth += 1;
                let items = (0..len)
                    .map(|_| self.read_item())
                    .collect::<Result<Vec<_>, _>>()?;
                self.depth -= 1;
                DataItem::Array(items)
            }
            MAJOR_MAP => {
                let len = self.read_length(info, head_offset, 2)?;
                self.depth += 1;
                let mut entries = Vec::with_capacity(len);
                for _ in 0..len {
                    let key = self.read_item()?;
                    let value = self.read_item()?;
                    entries.push((key, value));
                }
                self.depth -= 1;
                DataItem::Map(entries)
            }
            MAJOR_TAG => {
                let tag = self.read_argument(info, head_offset)?;
                self.depth += 1;
                let inner = self.read_item()?;
                self.depth -= 1;
                DataItem::Tag(tag, Box::new(inner))
            }
            _ => self.read_simple(info, head_offset)?,
        };
        Ok(item)
    }

    fn read_simple(&mut self, info: u8, head_offset: usize) -> SerializationResult<DataItem> {
        debug_assert!(MAJOR_SIMPLE == 7);
        match info {
            20 => Ok(DataItem::Bool(false)),
            21 => Ok(DataItem::Bool(true)),
            22 => Ok(DataItem::Null),
            25 => Ok(DataItem::Float(half_to_f64(u16::from_be_bytes(self.take_array()?)))),
            26 => Ok(DataItem::Float(f32::from_be_bytes(self.take_array()?) as f64)),
            27 => Ok(DataItem::Float(f64::from_be_bytes(self.take_array()?))),
            31 => Err(SerializationError::MalformedLength {
                offset: head_offset,
                reason: "unexpected break".to_string(),
            }),
            other => Err(SerializationError::unexpected(
                "boolean, null or float",
                format!("simple value {} at offset {}", other, head_offset),
            )),
        }
    }
}

/// IEEE 754 binary16 to f64
fn half_to_f64(bits: u16) -> f64 {
    let sign = if bits & 0x8000 != 0 { -1.0 } else { 1.0 };
    let exponent = ((bits >> 10) & 0x1f) as i32;
    let mantissa = (bits & 0x3ff) as f64;
    match exponent {
        0 => sign * mantissa * 2f64.powi(-24),
        31 if mantissa == 0.0 => sign * f64::INFINITY,
        31 => f64::NAN,
        e => sign * (1.0 + mantissa / 1024.0) * 2f64.powi(e - 15),
    }
}
