//! Serial transport over the ESP32-C3 USB-Serial-JTAG port

use esp_hal::Blocking;
use esp_hal::usb_serial_jtag::UsbSerialJtag;
use log::{debug, warn};

use crate::config::MAX_LINE_LEN;
use crate::dispatch::StripContext;
use crate::line_reader::LineReader;
use crate::reply::format_reply;
use crate::sink::PixelSink;
use crate::{BoardError, handle_line};

/// Line-oriented command port
pub struct SerialPort<'d> {
    usb: UsbSerialJtag<'d, Blocking>,
    reader: LineReader<MAX_LINE_LEN>,
}

impl<'d> SerialPort<'d> {
    pub fn new(usb: UsbSerialJtag<'d, Blocking>) -> Self {
        Self {
            usb,
            reader: LineReader::new(),
        }
    }

    /// Boot banner; hosts wait for it before sending commands.
    pub fn announce_ready(&mut self) -> Result<(), BoardError> {
        self.write_line("READY")
    }

    /// Drain received bytes and answer every completed line.
    pub fn poll<S: PixelSink>(&mut self, sink: &mut S, ctx: &mut StripContext) {
        while let Ok(byte) = self.usb.read_byte() {
            let Some(line) = self.reader.push(byte) else {
                continue;
            };
            let reply = match line {
                Ok(line) => handle_line(&line, sink, ctx),
                Err(err) => {
                    debug!("[SERIAL] Dropping line: {}", err);
                    format_reply(&Err(err))
                }
            };
            if let Err(e) = self.write_line(&reply) {
                warn!("[SERIAL] Reply lost: {}", e);
            }
        }
    }

    fn write_line(&mut self, line: &str) -> Result<(), BoardError> {
        self.usb
            .write(line.as_bytes())
            .and_then(|_| self.usb.write(b"\r\n"))
            .map_err(|_| BoardError::SerialError)?;
        self.usb.flush_tx().map_err(|_| BoardError::SerialError)
    }
}
