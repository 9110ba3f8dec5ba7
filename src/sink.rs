//! Pixel sink abstraction
//!
//! The dispatcher only talks to the strip through [`PixelSink`]. The
//! firmware implements it on top of the RMT driver; [`MemoryStrip`] keeps
//! everything in RAM.

use crate::BoardError;
use crate::color::Color;

/// Capability to drive the physical strip
pub trait PixelSink {
    /// Write one pixel into the working buffer. Indices are validated by the caller.
    fn set(&mut self, index: usize, color: Color);

    /// Write every pixel in the working buffer.
    fn fill(&mut self, color: Color);

    /// Set every pixel in the working buffer to black.
    fn clear(&mut self);

    /// Push the working buffer to the strip, scaled by `brightness`.
    fn flush(&mut self, brightness: u8) -> Result<(), BoardError>;
}

/// Pixel sink backed by two in-memory buffers
///
/// `pixels` is the working buffer, `shown` is what the last flush pushed out.
#[derive(Debug, Clone)]
pub struct MemoryStrip<const N: usize> {
    pixels: [Color; N],
    shown: [Color; N],
    brightness: u8,
    flush_count: u32,
}

impl<const N: usize> MemoryStrip<N> {
    pub fn new() -> Self {
        Self {
            pixels: [Color::default(); N],
            shown: [Color::default(); N],
            brightness: 0,
            flush_count: 0,
        }
    }

    pub fn pixels(&self) -> &[Color; N] {
        &self.pixels
    }

    /// Pixels as of the last flush
    pub fn shown(&self) -> &[Color; N] {
        &self.shown
    }

    /// Brightness used by the last flush
    pub fn shown_brightness(&self) -> u8 {
        self.brightness
    }

    pub fn flush_count(&self) -> u32 {
        self.flush_count
    }
}

impl<const N: usize> Default for MemoryStrip<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> PixelSink for MemoryStrip<N> {
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

    fn flush(&mut self, brightness: u8) -> Result<(), BoardError> {
        self.shown = self.pixels;
        self.brightness = brightness;
        self.flush_count += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_stay_in_working_buffer_until_flush() {
        let mut strip = MemoryStrip::<3>::new();
        strip.set(1, Color::new(9, 8, 7));
        assert_eq!(strip.pixels()[1], Color::new(9, 8, 7));
        assert_eq!(strip.shown()[1], Color::default());

        strip.flush(40).unwrap();
        assert_eq!(strip.shown()[1], Color::new(9, 8, 7));
        assert_eq!(strip.shown_brightness(), 40);
        assert_eq!(strip.flush_count(), 1);
    }

    #[test]
    fn clear_only_touches_working_buffer() {
        let mut strip = MemoryStrip::<2>::new();
        strip.fill(Color::new(1, 1, 1));
        strip.flush(10).unwrap();
        strip.clear();
        assert_eq!(strip.pixels(), &[Color::default(); 2]);
        assert_eq!(strip.shown(), &[Color::new(1, 1, 1); 2]);
    }

    #[test]
    fn out_of_range_set_is_ignored() {
        let mut strip = MemoryStrip::<2>::new();
        strip.set(5, Color::new(1, 2, 3));
        assert_eq!(strip.pixels(), &[Color::default(); 2]);
    }
}
