//! LED strip driver
//!
//! [`PixelSink`] over any `smart-leds` writer. On the board the writer is
//! the RMT-backed `SmartLedsAdapter` from `esp-hal-smartled`.

use log::error;
use smart_leds::{RGB8, SmartLedsWrite, brightness};

use crate::BoardError;
use crate::color::{Color, ColorOrder};
use crate::sink::PixelSink;

/// Strip of `N` pixels behind a `smart-leds` writer
pub struct StripDriver<W, const N: usize> {
    writer: W,
    order: ColorOrder,
    pixels: [Color; N],
}

impl<W, const N: usize> StripDriver<W, N>
where
    W: SmartLedsWrite<Color = RGB8>,
{
    pub fn new(writer: W, order: ColorOrder) -> Self {
        Self {
            writer,
            order,
            pixels: [Color::default(); N],
        }
    }

    /// Adapter input that makes the writer emit `order` on the wire.
    ///
    /// The RMT adapter always transmits G, R, B.
    fn to_adapter(&self, color: Color) -> RGB8 {
        let [first, second, third] = self.order.wire_bytes(color);
        RGB8 {
            r: second,
            g: first,
            b: third,
        }
    }
}

impl<W, const N: usize> PixelSink for StripDriver<W, N>
where
    W: SmartLedsWrite<Color = RGB8>,
    W::Error: core::fmt::Debug,
{
    fn set(&mut self, index: usize, color: Color) {
        if let Some(pixel) = self.pixels.get_mut(index) {
            *pixel = color;
        }
    }

    fn fill(&mut self, color: Color) {
        self.pixels = [color; N];
    }

    fn clear(&mut self) {
        self.pixels = [Color::default(); N];
    }

    fn flush(&mut self, level: u8) -> Result<(), BoardError> {
        let mut frame = [RGB8::default(); N];
        for (out, &pixel) in frame.iter_mut().zip(self.pixels.iter()) {
            *out = self.to_adapter(pixel);
        }

        self.writer
            .write(brightness(frame.into_iter(), level))
            .map_err(|e| {
                error!("[LED] RMT write failed: {:?}", e);
                BoardError::LedError
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        writes: Vec<Vec<RGB8>>,
        fail: bool,
    }

    impl SmartLedsWrite for Recorder {
        type Error = ();
        type Color = RGB8;

        fn write<T, I>(&mut self, iterator: T) -> Result<(), Self::Error>
        where
            T: IntoIterator<Item = I>,
            I: Into<Self::Color>,
        {
            if self.fail {
                return Err(());
            }
            self.writes.push(iterator.into_iter().map(Into::into).collect());
            Ok(())
        }
    }

    #[test]
    fn grb_strip_passes_colors_through() {
        let mut strip = StripDriver::<_, 2>::new(Recorder::default(), ColorOrder::Grb);
        strip.set(0, Color::new(10, 20, 30));
        strip.flush(255).unwrap();
        assert_eq!(
            strip.writer.writes[0],
            [RGB8::new(10, 20, 30), RGB8::default()]
        );
    }

    #[test]
    fn rgb_strip_is_reordered_for_the_adapter() {
        let mut strip = StripDriver::<_, 1>::new(Recorder::default(), ColorOrder::Rgb);
        strip.fill(Color::new(1, 2, 3));
        strip.flush(255).unwrap();
        // Adapter sends g, r, b, so the wire sees 1, 2, 3.
        assert_eq!(strip.writer.writes[0], [RGB8::new(2, 1, 3)]);
    }

    #[test]
    fn brightness_scales_output() {
        let mut strip = StripDriver::<_, 1>::new(Recorder::default(), ColorOrder::Grb);
        strip.fill(Color::new(255, 255, 255));
        strip.flush(0).unwrap();
        assert_eq!(strip.writer.writes[0], [RGB8::default()]);
    }

    #[test]
    fn clear_and_out_of_range_set() {
        let mut strip = StripDriver::<_, 2>::new(Recorder::default(), ColorOrder::Grb);
        strip.fill(Color::new(5, 5, 5));
        strip.set(7, Color::new(9, 9, 9));
        strip.clear();
        strip.flush(255).unwrap();
        assert_eq!(strip.writer.writes[0], [RGB8::default(); 2]);
    }

    #[test]
    fn write_failure_maps_to_led_error() {
        let mut strip = StripDriver::<_, 1>::new(
            Recorder {
                fail: true,
                ..Default::default()
            },
            ColorOrder::Grb,
        );
        assert_eq!(strip.flush(32), Err(BoardError::LedError));
    }
}
