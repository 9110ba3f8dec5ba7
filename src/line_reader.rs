//! Serial line assembly
//!
//! Collects bytes into newline-terminated lines with a fixed cap. Lines over
//! the cap never reach the parser.

use alloc::string::String;

use crate::reply::CommandError;

/// Byte-fed line buffer holding at most `N` characters
pub struct LineReader<const N: usize> {
    buf: heapless::String<N>,
    discarding: bool,
}

impl<const N: usize> LineReader<N> {
    pub fn new() -> Self {
        Self {
            buf: heapless::String::new(),
            discarding: false,
        }
    }

    /// Feed one byte.
    ///
    /// Returns a trimmed line when `\n` arrives, or `LineTooLong` as soon as
    /// the buffer overflows. The rest of an overflowing line is dropped up to
    /// and including its newline.
    pub fn push(&mut self, byte: u8) -> Option<Result<String, CommandError>> {
        match byte {
            b'\r' => None,
            b'\n' => {
                if core::mem::take(&mut self.discarding) {
                    return None;
                }
                let line = String::from(self.buf.trim());
                self.buf.clear();
                Some(Ok(line))
            }
            _ if self.discarding => None,
            _ => {
                let ch = if byte.is_ascii() { byte as char } else { '?' };
                if self.buf.push(ch).is_err() {
                    self.buf.clear();
                    self.discarding = true;
                    return Some(Err(CommandError::LineTooLong));
                }
                None
            }
        }
    }

    /// Bytes buffered for the current line
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}

impl<const N: usize> Default for LineReader<N> {
    fn default() -> Self {
        Self::new()
    }
}
