//! Color helpers
//!
//! Channel clamping and strip channel ordering. Colors are `smart_leds::RGB8`.

pub use smart_leds::RGB8 as Color;

/// Saturate an integer into a single 8-bit channel.
pub fn clamp8(value: i32) -> u8 {
    value.clamp(0, u8::MAX as i32) as u8
}

/// Build a color from unclamped channel values.
pub fn color_from(r: i32, g: i32, b: i32) -> Color {
    Color::new(clamp8(r), clamp8(g), clamp8(b))
}

/// Order in which a strip expects the three channels on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorOrder {
    Rgb,
    Rbg,
    Grb,
    Gbr,
    Brg,
    Bgr,
}

impl ColorOrder {
    /// Channel bytes in transmit order
    pub fn wire_bytes(self, color: Color) -> [u8; 3] {
        let Color { r, g, b } = color;
        match self {
            ColorOrder::Rgb => [r, g, b],
            ColorOrder::Rbg => [r, b, g],
            ColorOrder::Grb => [g, r, b],
            ColorOrder::Gbr => [g, b, r],
            ColorOrder::Brg => [b, r, g],
            ColorOrder::Bgr => [b, g, r],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_saturates_out_of_range() {
        assert_eq!(clamp8(-5), 0);
        assert_eq!(clamp8(300), 255);
        assert_eq!(clamp8(i32::MIN), 0);
        assert_eq!(clamp8(i32::MAX), 255);
        assert_eq!(clamp8(128), 128);
    }

    #[test]
    fn clamp_is_idempotent() {
        for value in [-1000, -1, 0, 17, 255, 256, 9999] {
            let once = clamp8(value);
            assert_eq!(clamp8(once as i32), once);
        }
    }

    #[test]
    fn color_from_clamps_each_channel() {
        assert_eq!(color_from(300, -5, 10), Color::new(255, 0, 10));
    }

    #[test]
    fn wire_order_permutes_channels() {
        let c = Color::new(1, 2, 3);
        assert_eq!(ColorOrder::Rgb.wire_bytes(c), [1, 2, 3]);
        assert_eq!(ColorOrder::Grb.wire_bytes(c), [2, 1, 3]);
        assert_eq!(ColorOrder::Bgr.wire_bytes(c), [3, 2, 1]);
        assert_eq!(ColorOrder::Brg.wire_bytes(c), [3, 1, 2]);
    }
}
