//! Event mux — the thin dispatcher common to both peers.
//!
//! Routes inbound [`TransportEvent`] values to the active session's handler
//! on a single serialized execution context, regardless of what thread or
//! interrupt context the transport's own callbacks run on.
//!
//! ```text
//!  ┌───────────────────────────────────────────────────────────┐
//!  │  transport callback thread(s)            mux owner thread   │
//!  │  ┌──────────────┐   push()    ┌────────┐  drain()  ┌──────┐ │
//!  │  │ MockTransport │ ─────────▶ │ Channel│ ────────▶ │ Fsm  │ │
//!  │  │ / real BLE    │            │ (N=16) │           │      │ │
//!  │  └──────────────┘             └────────┘           └──────┘ │
//!  └───────────────────────────────────────────────────────────┘
//! ```
//!
//! The channel is bounded; a full queue drops the *oldest* pending event and
//! logs a warning rather than blocking the producer — a transport
//! callback thread/interrupt context cannot be allowed to block on
//! backpressure from a slow consumer.

use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::channel::{Channel, TrySendError};
use std::rc::Rc;

use crate::transport::{EventSink, TransportEvent};

/// Pending-event capacity. Sized to absorb a burst of out-of-order data
/// frames between mux drains without growing unbounded.
pub const EVENT_QUEUE_DEPTH: usize = 16;

type Queue = Channel<NoopRawMutex, TransportEvent, EVENT_QUEUE_DEPTH>;

/// Implemented by whatever owns protocol state for a session (the receiver
/// or sender state machine) so the mux can deliver events without knowing
/// which one it's driving.
pub trait EventHandler {
    fn handle_event(&mut self, event: TransportEvent);
}

/// Single-threaded dispatcher owning one session's event queue and handler.
pub struct EventMux<H: EventHandler> {
    queue: Rc<Queue>,
    handler: H,
}

impl<H: EventHandler> EventMux<H> {
    #[must_use]
    pub fn new(handler: H) -> Self {
        Self {
            queue: Rc::new(Channel::new()),
            handler,
        }
    }

    /// A cloneable [`EventSink`] handle a transport can be given to push
    /// inbound events into this mux's queue.
    #[must_use]
    pub fn sink(&self) -> EventMuxSink {
        EventMuxSink {
            queue: self.queue.clone(),
        }
    }

    /// Drain every currently-queued event through the handler, in arrival
    /// order, then return. Synchronous — suitable for a test driving loop
    /// or a host application's own tick.
    pub fn drain(&mut self) {
        while let Ok(event) = self.queue.try_receive() {
            self.handler.handle_event(event);
        }
    }

    #[must_use]
    pub fn handler(&self) -> &H {
        &self.handler
    }

    #[must_use]
    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    /// Run forever, awaiting each event as it arrives rather than polling.
    /// Intended for a host application that dedicates a thread to the mux;
    /// not used by this crate's own tests, which drive `drain()` directly
    /// after each simulated transport action.
    pub fn run_blocking(&mut self) -> ! {
        let executor: edge_executor::LocalExecutor<'_, 4> = edge_executor::LocalExecutor::new();
        let queue = self.queue.clone();
        let handler = &mut self.handler;
        futures_lite::future::block_on(executor.run(async {
            loop {
                let event = queue.receive().await;
                handler.handle_event(event);
            }
        }))
    }
}

/// Producer-side handle pushed into by a [`crate::transport::Transport`]
/// implementation.
#[derive(Clone)]
pub struct EventMuxSink {
    queue: Rc<Queue>,
}

impl EventSink for EventMuxSink {
    fn push(&self, event: TransportEvent) {
        match self.queue.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                if self.queue.try_receive().is_ok() {
                    log::warn!(
                        "event mux queue full ({EVENT_QUEUE_DEPTH} capacity); dropped oldest pending event"
                    );
                }
                // Best-effort: if another producer raced us and drained
                // first, this simply succeeds without a second drop.
                let _ = self.queue.try_send(event);
            }
        }
    }
}
