//! Hex colour tokens as used in spreadsheet fills (`"FF0080"`).

use crate::error::{Error, Result};
use crate::grid::Rgb;

/// Length of a colour token without the optional `#` marker.
pub const TOKEN_LEN: usize = 6;

/// Encode a pixel as six uppercase hex digits, R then G then B.
pub fn encode(rgb: Rgb) -> String {
    format!("{:02X}{:02X}{:02X}", rgb.r, rgb.g, rgb.b)
}

/// Parse a token produced by [`encode`]. A leading `#` is accepted.
pub fn decode(token: &str) -> Result<Rgb> {
    let hex = token.strip_prefix('#').unwrap_or(token);

    if hex.len() != TOKEN_LEN {
        return Err(Error::Format {
            token: token.to_string(),
            reason: "expected exactly 6 hex digits",
        });
    }
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(Error::Format {
            token: token.to_string(),
            reason: "contains a non-hex character",
        });
    }

    let channel = |i: usize| {
        u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| Error::Format {
            token: token.to_string(),
            reason: "contains a non-hex character",
        })
    };

    Ok(Rgb::new(channel(0)?, channel(2)?, channel(4)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_uppercase_zero_padded() {
        assert_eq!(encode(Rgb::new(255, 0, 128)), "FF0080");
        assert_eq!(encode(Rgb::new(1, 2, 3)), "010203");
        assert_eq!(encode(Rgb::new(0xAB, 0xCD, 0xEF)), "ABCDEF");
    }

    #[test]
    fn decodes_with_and_without_marker() {
        assert_eq!(decode("FF0080").unwrap(), Rgb::new(255, 0, 128));
        assert_eq!(decode("#FF0080").unwrap(), Rgb::new(255, 0, 128));
        assert_eq!(decode("ff0080").unwrap(), Rgb::new(255, 0, 128));
    }

    #[test]
    fn rejects_wrong_length() {
        for token in ["", "#", "FFF", "FF00800", "#FF008"] {
            assert!(matches!(decode(token), Err(Error::Format { .. })), "{token}");
        }
    }

    #[test]
    fn rejects_non_hex() {
        for token in ["GG0000", "#12345Z", "12 456", "+12345"] {
            assert!(matches!(decode(token), Err(Error::Format { .. })), "{token}");
        }
    }

    #[test]
    fn rejects_multibyte_span_of_six_bytes() {
        // "é" is two bytes; the span has six bytes but is not hex.
        assert!(decode("éABCD").is_err());
    }

    #[test]
    fn every_channel_value_round_trips() {
        for v in 0..=255u8 {
            for rgb in [Rgb::new(v, 0, 0), Rgb::new(0, v, 0), Rgb::new(0, 0, v), Rgb::new(v, 255 - v, v / 2)] {
                assert_eq!(decode(&encode(rgb)).unwrap(), rgb);
            }
        }
    }
}
