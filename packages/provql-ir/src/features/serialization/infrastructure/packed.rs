//! Packed binary form
//!
//! Framing: `[magic "PQB1"][u32_le length][msgpack DataItem: length bytes]`.

use crate::features::serialization::domain::{DataItem, SerializationError, SerializationResult};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Cursor, Write};

pub const MAGIC: &[u8; 4] = b"PQB1";
const HEADER_LEN: usize = MAGIC.len() + 4;

pub fn encode(item: &DataItem) -> SerializationResult<Vec<u8>> {
    let payload = rmp_serde::to_vec(item).map_err(|e| SerializationError::Packed(e.to_string()))?;
    let len = u32::try_from(payload.len())
        .map_err(|_| SerializationError::Packed(format!("payload of {} bytes exceeds u32", payload.len())))?;

    let mut buffer = Vec::with_capacity(HEADER_LEN + payload.len());
    buffer
        .write_all(MAGIC)
        .map_err(|e| SerializationError::Packed(e.to_string()))?;
    buffer
        .write_u32::<LittleEndian>(len)
        .map_err(|e| SerializationError::Packed(e.to_string()))?;
    buffer
        .write_all(&payload)
        .map_err(|e| SerializationError::Packed(e.to_string()))?;
    Ok(buffer)
}

pub fn decode(bytes: &[u8]) -> SerializationResult<DataItem> {
    if bytes.len() < HEADER_LEN {
        return Err(SerializationError::Truncated {
            offset: bytes.len(),
            needed: HEADER_LEN - bytes.len(),
        });
    }
    if &bytes[..MAGIC.len()] != MAGIC {
        return Err(SerializationError::Packed(format!(
            "bad magic {:02x?}",
            &bytes[..MAGIC.len()]
        )));
    }

    let mut cursor = Cursor::new(&bytes[MAGIC.len()..HEADER_LEN]);
    let len = cursor
        .read_u32::<LittleEndian>()
        .map_err(|e| SerializationError::Packed(e.to_string()))? as usize;

    let body = &bytes[HEADER_LEN..];
    if body.len() < len {
        return Err(SerializationError::MalformedLength {
            offset: MAGIC.len(),
            reason: format!("length prefix {} exceeds the {} bytes present", len, body.len()),
        });
    }
    if body.len() > len {
        return Err(SerializationError::TrailingBytes {
            offset: HEADER_LEN + len,
            count: body.len() - len,
        });
    }
    rmp_serde::from_slice(body).map_err(|e| SerializationError::Packed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataItem {
        DataItem::tagged(
            0x5051_0003,
            DataItem::map([("value", DataItem::Float(0.5)), ("n", DataItem::int(-2))]),
        )
    }

    #[test]
    fn test_framing() {
        let bytes = encode(&sample()).unwrap();
        assert_eq!(&bytes[..4], b"PQB1");
        let len = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;
        assert_eq!(len, bytes.len() - 8);
        assert_eq!(decode(&bytes).unwrap(), sample());
    }

    #[test]
    fn test_rejects_bad_frames() {
        let bytes = encode(&sample()).unwrap();
        assert!(matches!(decode(&bytes[..6]), Err(SerializationError::Truncated { .. })));
        assert!(matches!(
            decode(&bytes[..bytes.len() - 1]),
            Err(SerializationError::MalformedLength { offset: 4, .. })
        ));

        let mut extra = bytes.clone();
        extra.push(0);
        assert!(matches!(decode(&extra), Err(SerializationError::TrailingBytes { .. })));

        let mut bad_magic = bytes;
        bad_magic[0] = b'X';
        assert!(matches!(decode(&bad_magic), Err(SerializationError::Packed(_))));
    }
}
