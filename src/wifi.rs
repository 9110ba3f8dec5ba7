//! WiFi module for ESP32-C3 board
//!
//! Station-mode link for the connectivity supervisor, using esp-wifi 0.14.1
//! with embassy-net DHCP

use embassy_net::Stack;
use esp_wifi::wifi::{AuthMethod, ClientConfiguration, Configuration, WifiController};
use log::{debug, info, warn};

use crate::BoardError;
use crate::connectivity::{Credentials, StationLink};

/// WiFi manager wrapping the radio controller and the embassy-net stack
pub struct WiFiManager<'a> {
    controller: WifiController<'a>,
    stack: Option<Stack<'a>>,
    started: bool,
    was_associated: bool,
    ip_reported: bool,
}

impl<'a> WiFiManager<'a> {
    /// Create a new WiFi manager instance
    pub fn new(controller: WifiController<'a>) -> Self {
        Self {
            controller,
            stack: None,
            started: false,
            was_associated: false,
            ip_reported: false,
        }
    }

    /// Set the embassy-net stack used to report the DHCP address
    pub fn set_stack(&mut self, stack: Stack<'a>) {
        self.stack = Some(stack);
    }

    /// Current DHCP address, if the stack has one
    pub fn get_ip_address(&self) -> Option<[u8; 4]> {
        let config = self.stack.as_ref()?.config_v4()?;
        Some(config.address.address().octets())
    }

    /// Log the DHCP address once per association.
    fn report_dhcp_ip(&mut self) {
        if self.ip_reported {
            return;
        }
        if let Some(ip) = self.get_ip_address() {
            info!(
                "[DHCP] IP address obtained: {}.{}.{}.{}",
                ip[0], ip[1], ip[2], ip[3]
            );
            self.ip_reported = true;
        }
    }
}

impl StationLink for WiFiManager<'_> {
    fn begin_association(&mut self, credentials: &Credentials) -> Result<(), BoardError> {
        let client_config = ClientConfiguration {
            ssid: credentials
                .ssid
                .as_str()
                .try_into()
                .map_err(|_| BoardError::WiFiError)?,
            password: credentials
                .password
                .as_str()
                .try_into()
                .map_err(|_| BoardError::WiFiError)?,
            auth_method: if credentials.password.is_empty() {
                AuthMethod::None
            } else {
                AuthMethod::WPA2Personal
            },
            ..Default::default()
        };

        // A stale half-open attempt blocks a new connect.
        if self.started {
            if let Err(e) = self.controller.disconnect() {
                debug!("[WIFI] Disconnect before reassociation failed: {:?}", e);
            }
        }

        self.controller
            .set_configuration(&Configuration::Client(client_config))
            .map_err(|e| {
                warn!("[WIFI] Rejected configuration: {:?}", e);
                BoardError::WiFiError
            })?;

        if !self.started {
            self.controller.start().map_err(|e| {
                warn!("[WIFI] Failed to start radio: {:?}", e);
                BoardError::WiFiError
            })?;
            self.started = true;
        }

        self.controller.connect().map_err(|e| {
            warn!("[WIFI] Connect request failed: {:?}", e);
            BoardError::WiFiError
        })
    }

    fn is_associated(&mut self) -> bool {
        let associated = self.controller.is_connected().unwrap_or(false);
        if associated && !self.was_associated {
            info!("[WIFI] Successfully connected to WiFi network");
        }
        if associated {
            self.report_dhcp_ip();
        } else {
            self.ip_reported = false;
        }
        self.was_associated = associated;
        associated
    }
}
