//! Log payload decoding.
//!
//! A payload is `i64 LE timestamp | u8 log type | body`. Bodies hold
//! length-prefixed byte strings (`u32 LE length | bytes`).

use std::io::{Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::consumer::mutation::Mutation;
use crate::errors::PipelineError;

/// Type byte following the timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LogType {
    Put = 0x01,
    MultiPut = 0x02,
    Remove = 0x03,
    MultiRemove = 0x04,
    RemoveRange = 0x06,
    AddLearner = 0x07,
    TransLeader = 0x08,
    AddPeer = 0x09,
    RemovePeer = 0x10,
    Batch = 0x11,
}

impl LogType {
    fn from_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            0x01 => Self::Put,
            0x02 => Self::MultiPut,
            0x03 => Self::Remove,
            0x04 => Self::MultiRemove,
            0x06 => Self::RemoveRange,
            0x07 => Self::AddLearner,
            0x08 => Self::TransLeader,
            0x09 => Self::AddPeer,
            0x10 => Self::RemovePeer,
            0x11 => Self::Batch,
            _ => return None,
        })
    }
}

/// One operation inside a batch record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOp {
    Put { key: Vec<u8>, value: Vec<u8> },
    Remove { key: Vec<u8> },
    RemoveRange { start: Vec<u8>, end: Vec<u8> },
}

impl BatchOp {
    const PUT: u8 = 0x01;
    const REMOVE: u8 = 0x02;
    const REMOVE_RANGE: u8 = 0x03;
}

/// Decoded log payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogRecord {
    Put { key: Vec<u8>, value: Vec<u8> },
    MultiPut(Vec<(Vec<u8>, Vec<u8>)>),
    Remove { key: Vec<u8> },
    MultiRemove(Vec<Vec<u8>>),
    RemoveRange { start: Vec<u8>, end: Vec<u8> },
    Batch(Vec<BatchOp>),
    /// Membership or leadership change; carries no data mutation.
    Control(LogType),
    /// Type byte not understood by this version.
    Unknown(u8),
}

const HEADER_LEN: usize = 9;

impl LogRecord {
    /// Decode a non-empty payload.
    pub fn decode(payload: &[u8]) -> Result<Self, PipelineError> {
        if payload.len() < HEADER_LEN {
            return Err(PipelineError::decode(format!(
                "log payload too short: {} bytes",
                payload.len()
            )));
        }

        let mut cursor = Cursor::new(payload);
        let _timestamp = cursor.read_i64::<LittleEndian>().map_err(truncated)?;
        let type_byte = cursor.read_u8().map_err(truncated)?;

        let log_type = match LogType::from_byte(type_byte) {
            Some(log_type) => log_type,
            None => return Ok(Self::Unknown(type_byte)),
        };

        let record = match log_type {
            LogType::Put => {
                let mut values = read_values(&mut cursor, 2)?.into_iter();
                let key = values.next().unwrap_or_default();
                let value = values.next().unwrap_or_default();
                Self::Put { key, value }
            }
            LogType::MultiPut => {
                let values = read_multi_values(&mut cursor)?;
                if values.len() % 2 != 0 {
                    return Err(PipelineError::decode(format!(
                        "multi put with odd value count {}",
                        values.len()
                    )));
                }
                let mut pairs = Vec::with_capacity(values.len() / 2);
                let mut values = values.into_iter();
                while let (Some(key), Some(value)) = (values.next(), values.next()) {
                    pairs.push((key, value));
                }
                Self::MultiPut(pairs)
            }
            LogType::Remove => Self::Remove {
                key: read_value(&mut cursor)?,
            },
            LogType::MultiRemove => Self::MultiRemove(read_multi_values(&mut cursor)?),
            LogType::RemoveRange => {
                let mut values = read_values(&mut cursor, 2)?.into_iter();
                let start = values.next().unwrap_or_default();
                let end = values.next().unwrap_or_default();
                Self::RemoveRange { start, end }
            }
            LogType::Batch => Self::Batch(read_batch(&mut cursor)?),
            control => Self::Control(control),
        };
        Ok(record)
    }

    /// Encode with the given timestamp; the inverse of [`LogRecord::decode`].
    pub fn encode(&self, timestamp: i64) -> Vec<u8> {
        let mut out = Vec::new();
        // Writes into a Vec cannot fail.
        let _ = out.write_i64::<LittleEndian>(timestamp);
        match self {
            Self::Put { key, value } => {
                out.push(LogType::Put as u8);
                write_value(&mut out, key);
                write_value(&mut out, value);
            }
            Self::MultiPut(pairs) => {
                out.push(LogType::MultiPut as u8);
                let _ = out.write_u32::<LittleEndian>((pairs.len() * 2) as u32);
                for (key, value) in pairs {
                    write_value(&mut out, key);
                    write_value(&mut out, value);
                }
            }
            Self::Remove { key } => {
                out.push(LogType::Remove as u8);
                write_value(&mut out, key);
            }
            Self::MultiRemove(keys) => {
                out.push(LogType::MultiRemove as u8);
                let _ = out.write_u32::<LittleEndian>(keys.len() as u32);
                for key in keys {
                    write_value(&mut out, key);
                }
            }
            Self::RemoveRange { start, end } => {
                out.push(LogType::RemoveRange as u8);
                write_value(&mut out, start);
                write_value(&mut out, end);
            }
            Self::Batch(ops) => {
                out.push(LogType::Batch as u8);
                for op in ops {
                    let (code, key, value): (u8, &[u8], &[u8]) = match op {
                        BatchOp::Put { key, value } => (BatchOp::PUT, key.as_slice(), value.as_slice()),
                        BatchOp::Remove { key } => (BatchOp::REMOVE, key.as_slice(), &[]),
                        BatchOp::RemoveRange { start, end } => {
                            (BatchOp::REMOVE_RANGE, start.as_slice(), end.as_slice())
                        }
                    };
                    out.push(code);
                    write_value(&mut out, key);
                    write_value(&mut out, value);
                }
            }
            Self::Control(log_type) => out.push(*log_type as u8),
            Self::Unknown(byte) => out.push(*byte),
        }
        out
    }

    /// Data mutations carried by this record, in log order.
    pub fn into_mutations(self) -> Vec<Mutation> {
        match self {
            Self::Put { key, value } => vec![Mutation::Put { key, value }],
            Self::MultiPut(pairs) => pairs
                .into_iter()
                .map(|(key, value)| Mutation::Put { key, value })
                .collect(),
            Self::Remove { key } => vec![Mutation::Remove { key }],
            Self::MultiRemove(keys) => keys.into_iter().map(|key| Mutation::Remove { key }).collect(),
            Self::RemoveRange { start, end } => vec![Mutation::RemoveRange { start, end }],
            Self::Batch(ops) => ops
                .into_iter()
                .map(|op| match op {
                    BatchOp::Put { key, value } => Mutation::Put { key, value },
                    BatchOp::Remove { key } => Mutation::Remove { key },
                    BatchOp::RemoveRange { start, end } => Mutation::RemoveRange { start, end },
                })
                .collect(),
            Self::Control(_) | Self::Unknown(_) => Vec::new(),
        }
    }
}

fn truncated(e: std::io::Error) -> PipelineError {
    PipelineError::decode(format!("truncated log payload: {}", e))
}

fn read_value(cursor: &mut Cursor<&[u8]>) -> Result<Vec<u8>, PipelineError> {
    let len = cursor.read_u32::<LittleEndian>().map_err(truncated)? as usize;
    let remaining = cursor.get_ref().len() - cursor.position() as usize;
    if len > remaining {
        return Err(PipelineError::decode(format!(
            "value length {} exceeds remaining {} bytes",
            len, remaining
        )));
    }
    let mut value = vec![0u8; len];
    cursor.read_exact(&mut value).map_err(truncated)?;
    Ok(value)
}

fn read_values(cursor: &mut Cursor<&[u8]>, count: usize) -> Result<Vec<Vec<u8>>, PipelineError> {
    (0..count).map(|_| read_value(cursor)).collect()
}

fn read_multi_values(cursor: &mut Cursor<&[u8]>) -> Result<Vec<Vec<u8>>, PipelineError> {
    let count = cursor.read_u32::<LittleEndian>().map_err(truncated)? as usize;
    read_values(cursor, count)
}

fn read_batch(cursor: &mut Cursor<&[u8]>) -> Result<Vec<BatchOp>, PipelineError> {
    let mut ops = Vec::new();
    while (cursor.position() as usize) < cursor.get_ref().len() {
        let code = cursor.read_u8().map_err(truncated)?;
        let key = read_value(cursor)?;
        let value = read_value(cursor)?;
        let op = match code {
            BatchOp::PUT => BatchOp::Put { key, value },
            BatchOp::REMOVE => BatchOp::Remove { key },
            BatchOp::REMOVE_RANGE => BatchOp::RemoveRange { start: key, end: value },
            other => {
                return Err(PipelineError::decode(format!("unknown batch op {:#04x}", other)));
            }
        };
        ops.push(op);
    }
    Ok(ops)
}

fn write_value(out: &mut Vec<u8>, value: &[u8]) {
    let _ = out.write_u32::<LittleEndian>(value.len() as u32);
    out.extend_from_slice(value);
}
