//! Lenient hex digit decoding.
//!
//! Malformed digits are not reported here. They decode as zero and are
//! caught later by the record checksum and length checks.

const DIGITS_PER_BYTE: usize = 2;

/// Decodes the byte whose two hex digits start at `pos` in `line`.
/// Digits missing at the end of the line decode as zero.
pub fn byte_at(line: &[u8], pos: usize) -> u8 {
    match line.get(pos..pos + DIGITS_PER_BYTE) {
        Some(&[high, low]) => decode_hex_digit(high) << 4 | decode_hex_digit(low),
        _ => 0,
    }
}

/// Decodes a run of hex digit pairs. A trailing unpaired digit is ignored.
pub fn hex_string_to_bytes(hex_string: &[u8]) -> Vec<u8> {
    hex_string
        .chunks_exact(DIGITS_PER_BYTE)
        .map(|pair| decode_hex_digit(pair[0]) << 4 | decode_hex_digit(pair[1]))
        .collect()
}

fn decode_hex_digit(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => 10 + (digit - b'a'),
        b'A'..=b'F' => 10 + (digit - b'A'),
        _ => 0,
    }
}
