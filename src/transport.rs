//! Transport abstraction.
//!
//! The engine never depends on a concrete BLE binding. Outbound traffic
//! goes through the [`Transport`] trait; inbound traffic arrives as
//! [`TransportEvent`] values pushed into whatever [`EventSink`] the host
//! wires up (normally an [`crate::event_mux::EventMux`]). Splitting egress
//! (a trait the engine calls) from ingress (events a sink receives) breaks
//! the transport/engine reference cycle that a callback-both-ways design
//! would otherwise create: the transport holds a handle to push events
//! forward, the engine holds a trait object to send — neither side needs a
//! back-reference to the other's concrete type.
//!
//! Registering a `Transport` implementor against real GATT characteristics
//! (service/characteristic registration, CCCD setup, notification
//! subscription) is a GATT-stack-primitives concern this crate doesn't
//! cover; this module ships only the trait, the wire UUIDs, and an
//! in-memory [`MockTransport`] pair for tests.

use heapless::Vec;

use crate::wire::MAX_FRAME_SIZE;

// ── Wire UUIDs ────────────────────────────────────────────────

/// GATT service UUID advertised by the receiver (peripheral).
pub const SERVICE_UUID: &str = "6E400001-B5A3-F393-E0A9-E50E24DCCA9E";
/// Control characteristic: 20-byte writes with response, notify-capable.
pub const CHAR_CONTROL_UUID: &str = "6E400002-B5A3-F393-E0A9-E50E24DCCA9E";
/// Data channel 0: sender -> receiver writes-without-response.
pub const CHAR_DATA_UUID: &str = "6E400010-B5A3-F393-E0A9-E50E24DCCA9E";

/// A bounded wire frame as delivered across the transport boundary.
pub type Frame = Vec<u8, MAX_FRAME_SIZE>;

/// Inbound event delivered from the transport to the owning session via an
/// [`EventSink`].
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// A complete frame arrived on the control characteristic.
    ControlFrame(Frame),
    /// A complete frame arrived on the data characteristic.
    DataFrame(Frame),
    /// MTU negotiation completed or changed.
    MtuChanged(u16),
    /// The transport established a connection.
    Connect,
    /// The transport tore down its connection.
    Disconnect,
}

/// Narrow sink a transport pushes inbound events into. Implemented by
/// [`crate::event_mux::EventMux`]; kept separate from it so a transport
/// never needs to name the mux's concrete session type.
pub trait EventSink {
    fn push(&self, event: TransportEvent);
}

/// Outbound operations the engine performs against a transport.
pub trait Transport {
    type Error: core::fmt::Debug;

    /// Write-with-response on the control characteristic.
    fn send_control(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;
    /// Notification from peripheral to central on the control characteristic.
    fn notify_control(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;
    /// Write-without-response on the data characteristic.
    fn send_data(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;
}

// ── In-memory mock transport (used by this crate's own tests) ─

/// Error type for [`MockTransport`] — the mock never actually fails a send,
/// but the associated type exists so `Transport` bounds on the mock exercise
/// the same error-handling paths real transports do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockTransportError;

impl core::fmt::Display for MockTransportError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "mock transport error")
    }
}


/// Connects one peer's outbound sends directly to another peer's
/// [`EventSink`], simulating a BLE link with no real radio. Used to drive
/// sender and receiver engines against each other end-to-end in tests.
pub struct MockTransport<S: EventSink> {
    peer: S,
}

impl<S: EventSink> MockTransport<S> {
    #[must_use]
    pub const fn new(peer: S) -> Self {
        Self { peer }
    }

    fn frame_of(bytes: &[u8]) -> Frame {
        let mut f = Frame::new();
        // A well-behaved caller never exceeds MAX_FRAME_SIZE; truncate
        // rather than panic if it does, since this is a test double.
        let n = bytes.len().min(MAX_FRAME_SIZE);
        let _ = f.extend_from_slice(&bytes[..n]);
        f
    }

    /// Simulate the transport becoming connected.
    pub fn simulate_connect(&self) {
        self.peer.push(TransportEvent::Connect);
    }

    /// Simulate a disconnect (either peer tearing down the link).
    pub fn simulate_disconnect(&self) {
        self.peer.push(TransportEvent::Disconnect);
    }

    /// Simulate an MTU negotiation result.
    pub fn simulate_mtu_changed(&self, mtu: u16) {
        self.peer.push(TransportEvent::MtuChanged(mtu));
    }
}

impl<S: EventSink> Transport for MockTransport<S> {
    type Error = MockTransportError;

    fn send_control(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.peer.push(TransportEvent::ControlFrame(Self::frame_of(bytes)));
        Ok(())
    }

    fn notify_control(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.peer.push(TransportEvent::ControlFrame(Self::frame_of(bytes)));
        Ok(())
    }

    fn send_data(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.peer.push(TransportEvent::DataFrame(Self::frame_of(bytes)));
        Ok(())
    }
}
