//! Connectivity supervisor
//!
//! Station-mode association state machine. It owns the connectivity state,
//! decides when to (re)try joining the network and tells the run loop
//! whether the network transport may run. It never touches the strip.

use log::{info, warn};

use crate::BoardError;

/// Connectivity states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityState {
    Disconnected,
    Connecting,
    Connected,
}

/// Events observed while polling the link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    /// Association request accepted by the radio
    AssociationStarted,
    /// Radio refused to start associating
    AssociationFailed,
    /// Link came up
    Associated,
    /// Association did not complete before the deadline
    Timeout,
    /// Established link dropped
    LinkLost,
}

/// Result of feeding an event to the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateTransition {
    /// Keep the current state
    Stay,
    /// Move to a new state
    Transition(ConnectivityState),
}

/// Why configured credentials cannot be used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialsError {
    /// SSID longer than 32 bytes
    SsidTooLong,
    /// Password longer than 64 bytes
    PasswordTooLong,
}

impl core::fmt::Display for CredentialsError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            CredentialsError::SsidTooLong => f.write_str("SSID longer than 32 bytes"),
            CredentialsError::PasswordTooLong => f.write_str("password longer than 64 bytes"),
        }
    }
}

/// Station credentials. An empty SSID means Wi-Fi is not configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub ssid: heapless::String<32>,
    pub password: heapless::String<64>,
}

impl Credentials {
    /// `None` when the SSID is empty or either value exceeds 802.11 limits.
    pub fn new(ssid: &str, password: &str) -> Option<Self> {
        Self::from_config(ssid, password).ok().flatten()
    }

    /// `Ok(None)` for an empty SSID, an error when a value is too long.
    pub fn from_config(ssid: &str, password: &str) -> Result<Option<Self>, CredentialsError> {
        if ssid.is_empty() {
            return Ok(None);
        }
        let mut creds = Self {
            ssid: heapless::String::new(),
            password: heapless::String::new(),
        };
        creds
            .ssid
            .push_str(ssid)
            .map_err(|_| CredentialsError::SsidTooLong)?;
        creds
            .password
            .push_str(password)
            .map_err(|_| CredentialsError::PasswordTooLong)?;
        Ok(Some(creds))
    }
}

/// Station-mode radio as seen by the supervisor
pub trait StationLink {
    /// Kick off association; must not wait for it to complete.
    fn begin_association(&mut self, credentials: &Credentials) -> Result<(), BoardError>;

    /// Whether the station is currently associated.
    fn is_associated(&mut self) -> bool;
}

/// Connectivity supervisor
pub struct ConnectivitySupervisor {
    current_state: ConnectivityState,
    previous_state: Option<ConnectivityState>,
    credentials: Option<Credentials>,
    connect_timeout_ms: u64,
    retry_interval_ms: u64,
    deadline_ms: u64,
    next_attempt_ms: u64,
    attempt_count: u32,
    warned_unconfigured: bool,
}

impl ConnectivitySupervisor {
    pub fn new(
        credentials: Option<Credentials>,
        connect_timeout_ms: u64,
        retry_interval_ms: u64,
    ) -> Self {
        Self {
            current_state: ConnectivityState::Disconnected,
            previous_state: None,
            credentials,
            connect_timeout_ms,
            retry_interval_ms,
            deadline_ms: 0,
            next_attempt_ms: 0,
            attempt_count: 0,
            warned_unconfigured: false,
        }
    }

    pub fn get_current_state(&self) -> ConnectivityState {
        self.current_state
    }

    pub fn get_previous_state(&self) -> Option<ConnectivityState> {
        self.previous_state
    }

    /// Association attempts started so far
    pub fn get_attempt_count(&self) -> u32 {
        self.attempt_count
    }

    /// Network transport gate
    pub fn network_enabled(&self) -> bool {
        self.current_state == ConnectivityState::Connected
    }

    /// Advance the state machine; call once per run loop iteration.
    pub fn poll<L: StationLink>(&mut self, link: &mut L, now_ms: u64) -> ConnectivityState {
        match self.current_state {
            ConnectivityState::Disconnected => self.poll_disconnected(link, now_ms),
            ConnectivityState::Connecting => {
                if link.is_associated() {
                    self.handle_event(LinkEvent::Associated);
                } else if now_ms >= self.deadline_ms {
                    warn!(
                        "[WIFI] Association timed out after {} ms",
                        self.connect_timeout_ms
                    );
                    self.next_attempt_ms = now_ms + self.retry_interval_ms;
                    self.handle_event(LinkEvent::Timeout);
                }
            }
            ConnectivityState::Connected => {
                if !link.is_associated() {
                    warn!("[WIFI] WiFi connection lost!");
                    self.next_attempt_ms = now_ms + self.retry_interval_ms;
                    self.handle_event(LinkEvent::LinkLost);
                }
            }
        }
        self.current_state
    }

    fn poll_disconnected<L: StationLink>(&mut self, link: &mut L, now_ms: u64) {
        let Some(credentials) = &self.credentials else {
            if !self.warned_unconfigured {
                warn!("[WIFI] No WiFi credentials configured - network transport disabled");
                self.warned_unconfigured = true;
            }
            return;
        };

        // An earlier connect request may complete after its deadline.
        if link.is_associated() {
            info!("[WIFI] Late association picked up");
            self.handle_event(LinkEvent::Associated);
            return;
        }

        if now_ms < self.next_attempt_ms {
            return;
        }

        self.attempt_count += 1;
        info!(
            "[WIFI] Connecting to WiFi network: {} (attempt {})",
            credentials.ssid, self.attempt_count
        );

        match link.begin_association(credentials) {
            Ok(()) => {
                self.deadline_ms = now_ms + self.connect_timeout_ms;
                self.handle_event(LinkEvent::AssociationStarted);
            }
            Err(err) => {
                warn!("[WIFI] Failed to start association: {}", err);
                self.next_attempt_ms = now_ms + self.retry_interval_ms;
                self.handle_event(LinkEvent::AssociationFailed);
            }
        }
    }

    /// Feed one event through the transition table.
    pub fn handle_event(&mut self, event: LinkEvent) -> StateTransition {
        let outcome = transition(self.current_state, event);
        if let StateTransition::Transition(new_state) = outcome {
            self.transition_to_state(new_state);
        }
        outcome
    }

    fn transition_to_state(&mut self, new_state: ConnectivityState) {
        if new_state == self.current_state {
            return;
        }
        match new_state {
            ConnectivityState::Connected => info!("[WIFI] Connected - network transport enabled"),
            ConnectivityState::Disconnected => {
                info!("[WIFI] Disconnected - network transport disabled")
            }
            ConnectivityState::Connecting => {}
        }
        self.previous_state = Some(self.current_state);
        self.current_state = new_state;
    }
}

/// Transition table of the supervisor
pub fn transition(current: ConnectivityState, event: LinkEvent) -> StateTransition {
    use ConnectivityState::*;

    match (current, event) {
        (Disconnected, LinkEvent::AssociationStarted) => StateTransition::Transition(Connecting),
        (Disconnected | Connecting, LinkEvent::Associated) => StateTransition::Transition(Connected),
        (Connecting, LinkEvent::Timeout | LinkEvent::AssociationFailed) => {
            StateTransition::Transition(Disconnected)
        }
        (Connected, LinkEvent::LinkLost) => StateTransition::Transition(Disconnected),
        _ => StateTransition::Stay,
    }
}
