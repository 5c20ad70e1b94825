//! Shared end-to-end harness: wires a [`SenderSession`] and a
//! [`ReceiverSession`] to each other over two [`MockTransport`]s, with
//! each side's inbound events queued through its own [`EventMux`] exactly
//! as a host application would.
//!
//! Constructing both sessions up front creates a chicken-and-egg problem —
//! each transport needs the *other* side's mux sink, but a mux sink can
//! only be obtained from a mux that already owns its session. [`DeferredSink`]
//! breaks that cycle: it is handed to the transport before the destination
//! mux exists, then bound to the real sink once both muxes are built.

use std::cell::RefCell;
use std::rc::Rc;

use bletinyflow::config::EngineConfig;
use bletinyflow::device_info::DeviceInfo;
use bletinyflow::error::SenderError;
use bletinyflow::event_mux::{EventMux, EventMuxSink};
use bletinyflow::receiver::{ReceiverCallbacks, ReceiverSession};
use bletinyflow::sender::{SenderCallbacks, SenderSession};
use bletinyflow::transport::{EventSink, MockTransport, TransportEvent};

#[derive(Clone)]
pub struct DeferredSink(Rc<RefCell<Option<EventMuxSink>>>);

impl DeferredSink {
    fn new() -> (Self, Rc<RefCell<Option<EventMuxSink>>>) {
        let slot = Rc::new(RefCell::new(None));
        (Self(slot.clone()), slot)
    }
}

impl EventSink for DeferredSink {
    fn push(&self, event: TransportEvent) {
        if let Some(sink) = self.0.borrow().as_ref() {
            sink.push(event);
        }
    }
}

#[derive(Default)]
pub struct RecordingReceiverCallbacks {
    pub completed: Option<(std::vec::Vec<u8>, bool)>,
    pub errors: std::vec::Vec<bletinyflow::error::ReceiverError>,
    pub device_info: std::vec::Vec<DeviceInfo>,
}

impl ReceiverCallbacks for RecordingReceiverCallbacks {
    fn on_transfer_complete(&mut self, buffer: &[u8], jpeg_magic_detected: bool) {
        self.completed = Some((buffer.to_vec(), jpeg_magic_detected));
    }
    fn on_transfer_error(&mut self, error: bletinyflow::error::ReceiverError) {
        self.errors.push(error);
    }
    fn on_device_info_sent(&mut self, info: DeviceInfo) {
        self.device_info.push(info);
    }
}

#[derive(Default)]
pub struct RecordingSenderCallbacks {
    pub progress: std::vec::Vec<(u32, u32)>,
    pub completed: Option<(u32, f64)>,
    pub errors: std::vec::Vec<SenderError>,
}

impl SenderCallbacks for RecordingSenderCallbacks {
    fn on_progress(&mut self, bytes_sent: u32, total_bytes: u32) {
        self.progress.push((bytes_sent, total_bytes));
    }
    fn on_transfer_complete(&mut self, total_bytes: u32, _elapsed: std::time::Duration, throughput: f64) {
        self.completed = Some((total_bytes, throughput));
    }
    fn on_transfer_error(&mut self, error: SenderError) {
        self.errors.push(error);
    }
}

type Receiver = ReceiverSession<MockTransport<DeferredSink>, RecordingReceiverCallbacks>;
type Sender = SenderSession<MockTransport<DeferredSink>, RecordingSenderCallbacks>;

/// Records every frame a lone session sends, without a peer on the other
/// end — used to drive a receiver directly with hand-built frames when a
/// test needs to inject duplicate or out-of-order data that a conformant
/// sender would never itself produce.
#[derive(Clone)]
pub struct OutboxSink(pub Rc<RefCell<std::collections::VecDeque<TransportEvent>>>);

impl EventSink for OutboxSink {
    fn push(&self, event: TransportEvent) {
        self.0.borrow_mut().push_back(event);
    }
}

type StandaloneReceiver = ReceiverSession<MockTransport<OutboxSink>, RecordingReceiverCallbacks>;

pub struct StandaloneReceiverHarness {
    pub mux: EventMux<StandaloneReceiver>,
    pub outbox: Rc<RefCell<std::collections::VecDeque<TransportEvent>>>,
}

impl StandaloneReceiverHarness {
    pub fn new(config: EngineConfig) -> Self {
        let outbox = Rc::new(RefCell::new(std::collections::VecDeque::new()));
        let transport = MockTransport::new(OutboxSink(outbox.clone()));
        let receiver = ReceiverSession::new(transport, RecordingReceiverCallbacks::default(), config);
        Self { mux: EventMux::new(receiver), outbox }
    }
}

pub struct Link {
    pub sender_mux: EventMux<Sender>,
    pub receiver_mux: EventMux<Receiver>,
}

impl Link {
    pub fn new(config: EngineConfig) -> Self {
        let (sink_to_receiver, slot_to_receiver) = DeferredSink::new();
        let (sink_to_sender, slot_to_sender) = DeferredSink::new();

        let sender_transport = MockTransport::new(sink_to_receiver);
        let receiver_transport = MockTransport::new(sink_to_sender);

        let sender = SenderSession::new(sender_transport, RecordingSenderCallbacks::default(), config.clone());
        let receiver = ReceiverSession::new(receiver_transport, RecordingReceiverCallbacks::default(), config);

        let sender_mux = EventMux::new(sender);
        let receiver_mux = EventMux::new(receiver);

        *slot_to_receiver.borrow_mut() = Some(receiver_mux.sink());
        *slot_to_sender.borrow_mut() = Some(sender_mux.sink());

        Self { sender_mux, receiver_mux }
    }

    /// Connect both peers at a given negotiated MTU and mark the sender
    /// ready to send (control subscribed, data handle known).
    pub fn connect(&mut self, mtu: u16) {
        use bletinyflow::event_mux::EventHandler;
        self.sender_mux.handler_mut().handle_event(TransportEvent::Connect);
        self.sender_mux.handler_mut().handle_event(TransportEvent::MtuChanged(mtu));
        self.sender_mux.handler_mut().notify_ready();
        self.receiver_mux.handler_mut().handle_event(TransportEvent::Connect);
        self.receiver_mux.handler_mut().handle_event(TransportEvent::MtuChanged(mtu));
    }

    /// Start a transfer and drain both muxes until the queues go quiet.
    pub fn transfer_file(&mut self, payload: std::vec::Vec<u8>) {
        self.sender_mux.handler_mut().transfer_file(payload);
        self.pump();
    }

    /// Alternately drain both sides enough times to settle any bounded
    /// request/response exchange these tests ever produce.
    pub fn pump(&mut self) {
        for _ in 0..256 {
            self.sender_mux.drain();
            self.receiver_mux.drain();
        }
    }
}
