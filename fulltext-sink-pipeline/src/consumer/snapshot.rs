//! Snapshot row encoding: `u32 LE key length | key | u32 LE value length | value`.

use std::io::{Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::errors::PipelineError;

/// Split an encoded snapshot row into key and value.
pub fn decode_kv(row: &[u8]) -> Result<(Vec<u8>, Vec<u8>), PipelineError> {
    let mut cursor = Cursor::new(row);
    let key = read_part(&mut cursor, "key")?;
    let value = read_part(&mut cursor, "value")?;
    Ok((key, value))
}

/// Encode a key/value pair as a snapshot row.
pub fn encode_kv(key: &[u8], value: &[u8]) -> Vec<u8> {
    let mut row = Vec::with_capacity(8 + key.len() + value.len());
    let _ = row.write_u32::<LittleEndian>(key.len() as u32);
    row.extend_from_slice(key);
    let _ = row.write_u32::<LittleEndian>(value.len() as u32);
    row.extend_from_slice(value);
    row
}

fn read_part(cursor: &mut Cursor<&[u8]>, what: &str) -> Result<Vec<u8>, PipelineError> {
    let len = cursor
        .read_u32::<LittleEndian>()
        .map_err(|_| PipelineError::decode(format!("snapshot row missing {} length", what)))?
        as usize;
    let remaining = cursor.get_ref().len() - cursor.position() as usize;
    if len > remaining {
        return Err(PipelineError::decode(format!(
            "snapshot row {} length {} exceeds remaining {} bytes",
            what, len, remaining
        )));
    }
    let mut part = vec![0u8; len];
    cursor
        .read_exact(&mut part)
        .map_err(|e| PipelineError::decode(e.to_string()))?;
    Ok(part)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_kv() {
        let row = encode_kv(b"key", b"value");
        assert_eq!(&row[0..4], &3u32.to_le_bytes());
        assert_eq!(decode_kv(&row).unwrap(), (b"key".to_vec(), b"value".to_vec()));
    }

    #[test]
    fn test_decode_kv_truncated() {
        let row = encode_kv(b"key", b"value");
        assert!(decode_kv(&row[..row.len() - 1]).is_err());
        assert!(decode_kv(&[1, 0]).is_err());
    }
}
