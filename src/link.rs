//! Connection state machine and the remote start/stop protocol.
//!
//! ```text
//! Disconnected --connect--> Connected (transmit disabled)
//!      ^                        |  '1' / '0' toggle transmit
//!      +-------disconnect-------+  -> restart the session
//! ```

use embassy_sync::blocking_mutex::raw::RawMutex;
use heapless::Vec;
use portable_atomic::{AtomicBool, Ordering};

use crate::config::LINK_PAYLOAD_MAX;
use crate::ipc::LinkEventReceiver;

pub type Payload = Vec<u8, LINK_PAYLOAD_MAX>;

/// Notification from the transport collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub enum LinkEvent {
    Connected,
    Disconnected,
    DataReceived(Payload),
}

impl LinkEvent {
    /// Data event from raw bytes; anything past `LINK_PAYLOAD_MAX` is cut.
    pub fn data(bytes: &[u8]) -> Self {
        let len = bytes.len().min(LINK_PAYLOAD_MAX);
        let mut payload = Payload::new();
        // Cannot fail, `len` is within capacity.
        let _ = payload.extend_from_slice(&bytes[..len]);
        Self::DataReceived(payload)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub enum Command {
    StartStreaming,
    StopStreaming,
}

impl Command {
    /// Only the first byte of a payload carries a command.
    pub fn parse(payload: &[u8]) -> Option<Self> {
        match payload.first()? {
            b'1' => Some(Self::StartStreaming),
            b'0' => Some(Self::StopStreaming),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub struct LinkSnapshot {
    pub connected: bool,
    pub transmit_enabled: bool,
}

impl LinkSnapshot {
    pub const INITIAL: Self = Self {
        connected: false,
        transmit_enabled: false,
    };
}

/// Connection and transmit flags shared between the link handler (writer)
/// and the transmitter (reader).
pub struct LinkState {
    connected: AtomicBool,
    transmit_enabled: AtomicBool,
}

impl LinkState {
    pub const fn new() -> Self {
        Self {
            connected: AtomicBool::new(false),
            transmit_enabled: AtomicBool::new(false),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    pub fn transmit_enabled(&self) -> bool {
        self.transmit_enabled.load(Ordering::Acquire)
    }

    /// Gate consulted before every transmission attempt.
    pub fn may_transmit(&self) -> bool {
        self.is_connected() && self.transmit_enabled()
    }

    pub fn snapshot(&self) -> LinkSnapshot {
        LinkSnapshot {
            connected: self.is_connected(),
            transmit_enabled: self.transmit_enabled(),
        }
    }

    fn mark_connected(&self) {
        self.connected.store(true, Ordering::Release);
    }

    // transmit_enabled drops before connected does.
    fn mark_disconnected(&self) {
        self.transmit_enabled.store(false, Ordering::Release);
        self.connected.store(false, Ordering::Release);
    }

    fn set_transmit(&self, enabled: bool) {
        self.transmit_enabled.store(enabled, Ordering::Release);
    }

    /// Back to the boot state, used by the supervisor between sessions.
    pub fn reset(&self) {
        self.mark_disconnected();
    }
}

/// Visible connection indicator (status LED).
pub trait LinkIndicator {
    fn show(&mut self, connected: bool);
}

impl<T: LinkIndicator + ?Sized> LinkIndicator for &mut T {
    fn show(&mut self, connected: bool) {
        (**self).show(connected)
    }
}

/// What the supervisor should do after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(target_os = "none", derive(defmt::Format))]
pub enum Flow {
    Continue,
    Restart,
}

pub struct LinkEventHandler<'a, I> {
    state: &'a LinkState,
    indicator: I,
}

impl<'a, I: LinkIndicator> LinkEventHandler<'a, I> {
    pub fn new(state: &'a LinkState, indicator: I) -> Self {
        Self { state, indicator }
    }

    pub fn handle(&mut self, event: &LinkEvent) -> Flow {
        match event {
            LinkEvent::Connected => {
                info!("Client connected");
                self.state.mark_connected();
                self.indicator.show(true);
                Flow::Continue
            }
            LinkEvent::Disconnected => {
                info!("Client disconnected, restarting session");
                self.state.mark_disconnected();
                self.indicator.show(false);
                Flow::Restart
            }
            LinkEvent::DataReceived(payload) if !self.state.is_connected() => {
                debug!("Ignoring {} byte payload while disconnected", payload.len());
                Flow::Continue
            }
            LinkEvent::DataReceived(payload) => {
                match Command::parse(payload) {
                    Some(Command::StartStreaming) => {
                        info!("Starting data transmission");
                        self.state.set_transmit(true);
                    }
                    Some(Command::StopStreaming) => {
                        info!("Stopping data transmission");
                        self.state.set_transmit(false);
                    }
                    None => trace!("Ignoring {} byte payload", payload.len()),
                }
                Flow::Continue
            }
        }
    }

    /// Process events until the link is lost.
    pub async fn run<M: RawMutex>(&mut self, events: LinkEventReceiver<'_, M>) {
        loop {
            let event = events.receive().await;
            if self.handle(&event) == Flow::Restart {
                return;
            }
        }
    }
}
