#![cfg_attr(not(test), no_std)]

//! ESP32-C3 LED Wall Board Library
//!
//! Line-based command protocol for an addressable LED strip, shared by the
//! serial and HTTP transports, plus the Wi-Fi supervisor that gates the
//! network transport.

extern crate alloc;

pub mod color;
pub mod command;
pub mod connectivity;
pub mod dispatch;
pub mod frame;
pub mod http;
pub mod led_control;
pub mod line_reader;
pub mod reply;
pub mod sink;

#[cfg(feature = "firmware")]
pub mod http_server;
#[cfg(feature = "firmware")]
pub mod serial;
#[cfg(feature = "firmware")]
pub mod wifi;

use alloc::string::String;

pub use color::{Color, ColorOrder, clamp8};
pub use command::Command;
pub use connectivity::{ConnectivityState, ConnectivitySupervisor, Credentials, StationLink};
pub use dispatch::{StripContext, dispatch};
pub use reply::{CommandError, Reply, format_reply};
pub use sink::{MemoryStrip, PixelSink};

/// Project version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Compile-time configuration
pub mod config {
    use crate::color::ColorOrder;

    /// Number of pixels on the strip
    pub const NUM_LEDS: usize = 15;

    /// Wire channel order of the strip (WS2812B)
    pub const COLOR_ORDER: ColorOrder = ColorOrder::Grb;

    /// Global brightness applied at boot
    pub const DEFAULT_BRIGHTNESS: u8 = 32;

    /// Longest serial line accepted, newline excluded
    pub const MAX_LINE_LEN: usize = 200;

    /// Default LED data GPIO pin
    pub const LED_DATA_PIN: u8 = 4;

    /// HTTP port for the network transport
    pub const HTTP_PORT: u16 = 80;

    /// Largest HTTP request (head and body) the network transport buffers
    pub const MAX_HTTP_REQUEST: usize = 1024;

    /// Delay between run loop iterations
    pub const POLL_INTERVAL_MS: u64 = 5;

    /// WiFi configuration
    /// Read from environment variables at compile time
    pub const WIFI_SSID: &str = env!("WIFI_SSID");
    pub const WIFI_PASSWORD: &str = env!("WIFI_PASSWORD");

    /// WiFi connection timeout in milliseconds
    pub const WIFI_CONNECT_TIMEOUT_MS: u64 = 10000;

    /// WiFi reconnection interval in milliseconds
    pub const WIFI_RECONNECT_INTERVAL_MS: u64 = 5000;
}

/// Error types for the LED wall board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardError {
    /// WiFi connection error
    WiFiError,
    /// LED control error
    LedError,
    /// Serial port error
    SerialError,
    /// HTTP server error
    HttpError,
}

impl core::fmt::Display for BoardError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let text = match self {
            BoardError::WiFiError => "wifi error",
            BoardError::LedError => "led error",
            BoardError::SerialError => "serial error",
            BoardError::HttpError => "http error",
        };
        f.write_str(text)
    }
}

/// Run one raw command line through parser, dispatcher and formatter.
///
/// Both transports call this so a command produces byte-identical replies
/// regardless of where it came from.
pub fn handle_line<S: PixelSink>(line: &str, sink: &mut S, ctx: &mut StripContext) -> String {
    let command = command::parse(line);
    log::debug!("[CMD] {:?}", command);
    format_reply(&dispatch(command, sink, ctx))
}
