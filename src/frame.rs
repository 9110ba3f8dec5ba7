//! Frame codec
//!
//! A frame is `led_count * 6` hex digits: `RRGGBB` per pixel, pixel 0 first.
//! Decoding either yields every pixel or fails without producing any.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::Write;

use crate::color::Color;

/// Hex digits per pixel
pub const HEX_PER_PIXEL: usize = 6;

/// Reasons a frame payload is rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// Payload length is not `led_count * 6`
    Length { expected: usize, actual: usize },
    /// Character at `position` is not a hex digit
    InvalidDigit { position: usize },
}

/// Decode a hex payload into `led_count` colors.
pub fn decode(hex: &str, led_count: usize) -> Result<Vec<Color>, FrameError> {
    let bytes = hex.as_bytes();
    let expected = led_count * HEX_PER_PIXEL;
    if bytes.len() != expected {
        return Err(FrameError::Length {
            expected,
            actual: bytes.len(),
        });
    }

    // Validate everything up front so a bad digit late in the payload
    // cannot leave a half-built frame behind.
    if let Some(position) = bytes.iter().position(|b| !b.is_ascii_hexdigit()) {
        return Err(FrameError::InvalidDigit { position });
    }

    let colors = bytes
        .chunks_exact(HEX_PER_PIXEL)
        .map(|px| Color::new(hex_pair(px[0], px[1]), hex_pair(px[2], px[3]), hex_pair(px[4], px[5])))
        .collect();
    Ok(colors)
}

/// Encode colors as an uppercase hex payload, the inverse of [`decode`].
pub fn encode(colors: &[Color]) -> String {
    let mut out = String::with_capacity(colors.len() * HEX_PER_PIXEL);
    for c in colors {
        // Writing into a String cannot fail.
        let _ = write!(out, "{:02X}{:02X}{:02X}", c.r, c.g, c.b);
    }
    out
}

fn hex_pair(hi: u8, lo: u8) -> u8 {
    (nibble(hi) << 4) | nibble(lo)
}

fn nibble(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        b'A'..=b'F' => digit - b'A' + 10,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_pixels_in_order() {
        let colors = decode("FF000000FF000000ff", 3).unwrap();
        assert_eq!(
            colors,
            [
                Color::new(255, 0, 0),
                Color::new(0, 255, 0),
                Color::new(0, 0, 255)
            ]
        );
    }

    #[test]
    fn mixed_case_digits_decode_identically() {
        assert_eq!(decode("aBcDeF", 1).unwrap(), decode("ABCDEF", 1).unwrap());
    }

    #[test]
    fn rejects_wrong_length() {
        assert_eq!(
            decode("FF00", 3),
            Err(FrameError::Length {
                expected: 18,
                actual: 4
            })
        );
        assert!(decode("FF0000FF0000FF0000FF", 3).is_err());
    }

    #[test]
    fn rejects_non_hex_anywhere() {
        let valid = "123456789ABCDEF012";
        for position in 0..valid.len() {
            let mut bad: Vec<u8> = valid.bytes().collect();
            bad[position] = b'G';
            let bad = String::from_utf8(bad).unwrap();
            assert_eq!(
                decode(&bad, 3),
                Err(FrameError::InvalidDigit { position })
            );
        }
    }

    #[test]
    fn sign_characters_are_not_digits() {
        assert!(decode("+F0000", 1).is_err());
    }

    #[test]
    fn zero_length_frame() {
        assert!(decode("", 0).unwrap().is_empty());
    }

    #[test]
    fn encode_inverts_decode() {
        let colors = [Color::new(1, 2, 3), Color::new(250, 128, 0)];
        let hex = encode(&colors);
        assert_eq!(hex, "010203FA8000");
        assert_eq!(decode(&hex, 2).unwrap(), colors);
    }
}
