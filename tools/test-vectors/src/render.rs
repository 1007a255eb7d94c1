//! Hex rendering and parsing of message bytes

use std::fmt;

/// Displays bytes as space-separated two-digit lowercase hex: `2b 03 34`
pub struct HexBytes<'a>(pub &'a [u8]);

impl fmt::Display for HexBytes<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// Parse one two-digit hex token
pub fn parse_hex_byte(token: &str) -> Option<u8> {
    if token.len() != 2 || !token.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u8::from_str_radix(token, 16).ok()
}

/// Parse a whole hex line
///
/// Returns the first offending token on failure.
pub fn parse_hex_line(line: &str) -> Result<Vec<u8>, &str> {
    line.split_whitespace()
        .map(|token| parse_hex_byte(token).ok_or(token))
        .collect()
}
