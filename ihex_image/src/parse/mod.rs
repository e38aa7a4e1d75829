use std::fmt;

use crate::common::{Record, RecordKind};
use crate::hex;

const START_CODE: u8 = b':';

// Offsets of the fixed fields, counted in characters from the start code.
const BYTE_COUNT_POS: usize = 1;
const ADDRESS_POS: usize = 3;
const TYPE_POS: usize = 7;
const DATA_POS: usize = 9;

/// Length of a record line with no payload: start code, byte count,
/// address, type and checksum.
const MIN_LINE_LEN: usize = 11;

/// Parses one line of an Intel HEX file, without its line terminator.
pub fn parse_line(line: &[u8]) -> Result<Record> {
    if line.first() != Some(&START_CODE) || line.len() % 2 == 0 || line.len() < MIN_LINE_LEN {
        return Err(LineError::BadFormat);
    }

    let sum = line_sum(line);
    if sum != 0 {
        let stated = hex::byte_at(line, line.len() - 2);
        return Err(LineError::ChecksumMismatch {
            expected: stated.wrapping_sub(sum),
        });
    }

    let byte_count = hex::byte_at(line, BYTE_COUNT_POS);
    if line.len() != MIN_LINE_LEN + 2 * byte_count as usize {
        return Err(LineError::LengthMismatch {
            byte_count,
            line_len: line.len(),
        });
    }

    let addr = u16::from_be_bytes([
        hex::byte_at(line, ADDRESS_POS),
        hex::byte_at(line, ADDRESS_POS + 2),
    ]);
    let kind_val = hex::byte_at(line, TYPE_POS);
    let data = hex::hex_string_to_bytes(&line[DATA_POS..line.len() - 2]);
    let kind = RecordKind::from_int(kind_val, data).map_err(LineError::UnknownType)?;

    Ok(Record { addr, kind })
}

/// Sum of every byte on the line after the start code, checksum included.
fn line_sum(line: &[u8]) -> u8 {
    hex::hex_string_to_bytes(&line[1..])
        .into_iter()
        .fold(0u8, |sum, value| sum.wrapping_add(value))
}

/// Why a line was rejected. None of these stop the conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineError {
    BadFormat,
    ChecksumMismatch { expected: u8 },
    LengthMismatch { byte_count: u8, line_len: usize },
    UnknownType(u8),
}

impl fmt::Display for LineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use LineError::*;
        match self {
            BadFormat => write!(f, "invalid format"),
            ChecksumMismatch { expected } => {
                write!(f, "invalid checksum, expected {expected:02X}")
            }
            LengthMismatch {
                byte_count,
                line_len,
            } => write!(
                f,
                "invalid length, {byte_count} data bytes need {} characters but line has {line_len}",
                MIN_LINE_LEN + 2 * *byte_count as usize
            ),
            UnknownType(kind) => write!(f, "unknown record type {kind:02X}"),
        }
    }
}

impl std::error::Error for LineError {}

pub type Result<T> = std::result::Result<T, LineError>;
