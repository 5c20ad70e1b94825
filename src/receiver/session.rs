//! Receiver session: the stateful engine for one incoming transfer.

use crate::config::EngineConfig;
use crate::device_info::DeviceInfo;
use crate::error::ReceiverError;
use crate::event_mux::EventHandler;
use crate::mtu;
use crate::receiver::buffer::ReceivedBitmap;
use crate::transport::{Transport, TransportEvent};
use crate::wire::{self, Opcode};

/// Inclusive chunk-id range requested in one `CHUNK_REQUEST`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchWindow {
    pub start: u32,
    pub end: u32,
}

/// Receiver states. `InitReceived` is reachable but transient: the same
/// `IDLE + INIT` handler that sets it immediately promotes to `Requesting`
/// once the buffer and bitmap allocate successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverState {
    Idle,
    InitReceived,
    Requesting(BatchWindow),
    Receiving(BatchWindow),
    Complete { total_bytes: u32 },
    Error(ReceiverError),
}

/// Application callbacks the receiver side exposes to the host application.
pub trait ReceiverCallbacks {
    /// Fired exactly once, when every chunk has been received.
    fn on_transfer_complete(&mut self, buffer: &[u8], jpeg_magic_detected: bool);
    /// Fired exactly once per failed session.
    fn on_transfer_error(&mut self, error: ReceiverError);
    /// Fired after the engine successfully queues a `DEVICE_INFO` send.
    fn on_device_info_sent(&mut self, _info: DeviceInfo) {}
}

/// Orchestrates one incoming transfer end to end.
pub struct ReceiverSession<T: Transport, C: ReceiverCallbacks> {
    config: EngineConfig,
    transport: T,
    callbacks: C,
    state: ReceiverState,
    negotiated_mtu: u16,
    max_payload: u16,
    total_size: u32,
    chunk_size: u16,
    expected_chunks: u32,
    buffer: Option<std::vec::Vec<u8>>,
    received: Option<ReceivedBitmap>,
    sequence: u16,
}

impl<T: Transport, C: ReceiverCallbacks> ReceiverSession<T, C> {
    #[must_use]
    pub fn new(transport: T, callbacks: C, config: EngineConfig) -> Self {
        let negotiated_mtu = config.default_mtu;
        let max_payload = EngineConfig::max_payload_for_mtu(negotiated_mtu);
        Self {
            config,
            transport,
            callbacks,
            state: ReceiverState::Idle,
            negotiated_mtu,
            max_payload,
            total_size: 0,
            chunk_size: 0,
            expected_chunks: 0,
            buffer: None,
            received: None,
            sequence: 0,
        }
    }

    #[must_use]
    pub const fn state(&self) -> ReceiverState {
        self.state
    }

    #[must_use]
    pub fn callbacks(&self) -> &C {
        &self.callbacks
    }

    #[must_use]
    pub fn callbacks_mut(&mut self) -> &mut C {
        &mut self.callbacks
    }

    /// Release the receive buffer. A no-op (with a logged warning) if
    /// already released — double-release is a no-op.
    pub fn release_buffer(&mut self) -> Option<std::vec::Vec<u8>> {
        match self.buffer.take() {
            Some(buf) => Some(buf),
            None => {
                log::warn!("release_buffer called with no buffer held (already released)");
                None
            }
        }
    }

    /// Send an optional `DEVICE_INFO` advisory (opcode `0x02`).
    pub fn send_device_info(&mut self, info: DeviceInfo) {
        let (p1, p2) = info.to_params();
        let seq = self.next_sequence();
        let bytes = wire::encode_control(Opcode::DeviceInfo, seq, p1, p2, 0);
        if let Err(e) = self.transport.notify_control(&bytes) {
            log::warn!("DEVICE_INFO send failed: {e:?}");
            return;
        }
        self.callbacks.on_device_info_sent(info);
    }

    fn next_sequence(&mut self) -> u16 {
        let seq = self.sequence;
        self.sequence = self.sequence.wrapping_add(1);
        seq
    }

    fn reset_for_next_connection(&mut self) {
        self.state = ReceiverState::Idle;
        self.buffer = None;
        self.received = None;
        self.total_size = 0;
        self.chunk_size = 0;
        self.expected_chunks = 0;
        self.negotiated_mtu = self.config.default_mtu;
        self.max_payload = EngineConfig::max_payload_for_mtu(self.negotiated_mtu);
        self.sequence = 0;
    }

    fn on_mtu_changed(&mut self, mtu: u16) {
        self.negotiated_mtu = mtu.min(self.config.max_mtu);
        self.max_payload = EngineConfig::max_payload_for_mtu(self.negotiated_mtu);
        log::debug!("receiver MTU negotiated: {} (max payload {})", self.negotiated_mtu, self.max_payload);
    }

    fn on_disconnect(&mut self) {
        log::info!("receiver: transport disconnected, tearing down session");
        self.reset_for_next_connection();
    }

    fn on_control_frame(&mut self, bytes: &[u8]) {
        let msg = match wire::decode_control(bytes) {
            Ok(m) => m,
            Err(e) => {
                self.fail(e.into());
                return;
            }
        };

        match msg.opcode {
            Opcode::TransferInit => self.on_init(msg.param1, msg.param2, msg.param3),
            // Every other opcode on the control channel is sender-bound
            // (CHUNK_REQUEST/ACK/ERROR) or receiver-originated (DEVICE_INFO);
            // none of them are valid *inbound* to a receiver.
            _ => {
                log::warn!("receiver: unexpected inbound opcode {:?}, ignoring", msg.opcode);
            }
        }
    }

    fn on_init(&mut self, total_size: u32, chunk_size: u32, total_chunks: u32) {
        if !matches!(self.state, ReceiverState::Idle) {
            log::warn!("receiver: TRANSFER_INIT received outside IDLE ({:?}), ignoring", self.state);
            return;
        }

        if total_size > self.config.max_transfer_size {
            self.fail(ReceiverError::TransferTooLarge);
            return;
        }
        if chunk_size > u32::from(self.max_payload) {
            self.fail(ReceiverError::ChunkSizeTooLarge);
            return;
        }
        if chunk_size == 0 {
            // A zero chunk size makes `expected_chunks` degenerate to 0
            // regardless of `total_size`, which would let a peer claim a
            // false zero-chunk completion for an arbitrary declared size.
            // The only legitimate zero-chunk transfer is `total_size == 0`,
            // which needs no real chunk size to begin with.
            self.fail(ReceiverError::InvalidCommand);
            return;
        }
        let chunk_size_u16 = chunk_size as u16;
        let expected = mtu::expected_chunks(total_size, chunk_size_u16);
        if total_chunks != expected {
            self.fail(ReceiverError::InvalidCommand);
            return;
        }

        let mut buffer = std::vec::Vec::new();
        if buffer.try_reserve_exact(total_size as usize).is_err() {
            self.fail(ReceiverError::MemoryAllocationFailed);
            return;
        }
        buffer.resize(total_size as usize, 0);

        self.total_size = total_size;
        self.chunk_size = chunk_size_u16;
        self.expected_chunks = expected;
        self.buffer = Some(buffer);
        self.received = Some(ReceivedBitmap::new(expected));

        log::info!("receiver: IDLE -> InitReceived (total={total_size}, chunk_size={chunk_size_u16}, chunks={expected})");
        self.state = ReceiverState::InitReceived;

        if expected == 0 {
            // A zero-length transfer completes without any CHUNK_REQUEST
            // or data packet at all.
            self.complete();
            return;
        }

        let batch_len = expected.min(u32::from(self.config.batch_size));
        let batch = BatchWindow { start: 0, end: batch_len - 1 };
        self.request_batch(batch);
    }

    fn request_batch(&mut self, batch: BatchWindow) {
        let seq = self.next_sequence();
        let count = batch.end - batch.start + 1;
        let bytes = wire::encode_control(Opcode::ChunkRequest, seq, batch.start, count, 0);
        if let Err(e) = self.transport.notify_control(&bytes) {
            log::warn!("CHUNK_REQUEST notify failed: {e:?}");
            self.fail(ReceiverError::NotificationSendFailed);
            return;
        }
        log::info!("receiver: -> Requesting {{ start: {}, end: {} }}", batch.start, batch.end);
        self.state = ReceiverState::Requesting(batch);
    }

    fn on_data_frame(&mut self, bytes: &[u8]) {
        let current_batch = match self.state {
            ReceiverState::Requesting(b) | ReceiverState::Receiving(b) => b,
            _ => {
                log::debug!("receiver: data frame ignored in state {:?}", self.state);
                return;
            }
        };

        let (chunk_id, payload_len, payload) = match wire::decode_data(bytes) {
            Ok(v) => v,
            Err(e) => {
                self.fail(e.into());
                return;
            }
        };
        let chunk_id = u32::from(chunk_id);

        if chunk_id >= self.expected_chunks {
            self.fail(ReceiverError::InvalidChunkId);
            return;
        }
        let received = self.received.as_ref().expect("allocated at INIT");
        if received.is_set(chunk_id) {
            self.fail(ReceiverError::DuplicateChunk);
            return;
        }

        let offset = chunk_id * u32::from(self.chunk_size);
        let end = offset + u32::from(payload_len);
        if end > self.total_size {
            self.fail(ReceiverError::BufferOverflow);
            return;
        }

        if chunk_id < current_batch.start || chunk_id > current_batch.end {
            log::debug!(
                "receiver: chunk {chunk_id} outside current batch [{}, {}], accepting out-of-order",
                current_batch.start, current_batch.end
            );
        }

        {
            let buffer = self.buffer.as_mut().expect("allocated at INIT");
            buffer[offset as usize..end as usize].copy_from_slice(payload);
        }
        let duplicate = self.received.as_mut().expect("allocated at INIT").set(chunk_id);
        debug_assert!(!duplicate, "checked above");

        if matches!(self.state, ReceiverState::Requesting(_)) {
            self.state = ReceiverState::Receiving(current_batch);
        }

        let received_count = self.received.as_ref().unwrap().count_ones();
        if received_count == self.expected_chunks {
            self.complete();
            return;
        }

        let batch_done = self
            .received
            .as_ref()
            .unwrap()
            .range_fully_set(current_batch.start, current_batch.end);
        if batch_done && current_batch.end + 1 < self.expected_chunks {
            let next_start = current_batch.end + 1;
            let next_len = (self.expected_chunks - next_start).min(u32::from(self.config.batch_size));
            self.request_batch(BatchWindow {
                start: next_start,
                end: next_start + next_len - 1,
            });
        }
    }

    fn complete(&mut self) {
        let total_bytes = self.total_size;
        let seq = self.next_sequence();
        let bytes = wire::encode_control(Opcode::TransferCompleteAck, seq, total_bytes, 0, 0);
        if let Err(e) = self.transport.notify_control(&bytes) {
            log::warn!("TRANSFER_COMPLETE_ACK notify failed: {e:?}");
        }
        log::info!("receiver: -> Complete ({total_bytes} bytes)");
        self.state = ReceiverState::Complete { total_bytes };

        let jpeg_magic_detected = self
            .buffer
            .as_ref()
            .is_some_and(|b| b.len() >= 2 && b[0] == 0xFF && b[1] == 0xD8);
        if let Some(buffer) = self.buffer.as_ref() {
            self.callbacks.on_transfer_complete(buffer, jpeg_magic_detected);
        } else {
            self.callbacks.on_transfer_complete(&[], jpeg_magic_detected);
        }

        // Connection teardown is a connection-management concern the engine
        // notifies the application of completion and stops here. Actually
        // dropping the link, if desired, is the host application's call
        // through whatever connection-management interface it owns — not
        // something reachable from the `Transport` trait.
    }

    fn fail(&mut self, error: ReceiverError) {
        if matches!(self.state, ReceiverState::Error(_)) {
            // Already terminal: TRANSFER_ERROR is emitted once per session.
            return;
        }
        let seq = self.next_sequence();
        let bytes = wire::encode_control(Opcode::TransferError, seq, u32::from(error.wire_code()), 0, 0);
        if let Err(e) = self.transport.notify_control(&bytes) {
            log::error!("TRANSFER_ERROR notify failed while reporting {error}: {e:?}");
        }
        log::warn!("receiver: -> Error({error})");
        self.state = ReceiverState::Error(error);
        self.buffer = None;
        self.received = None;
        self.callbacks.on_transfer_error(error);
    }
}

impl<T: Transport, C: ReceiverCallbacks> EventHandler for ReceiverSession<T, C> {
    fn handle_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::ControlFrame(bytes) => self.on_control_frame(&bytes),
            TransportEvent::DataFrame(bytes) => self.on_data_frame(&bytes),
            TransportEvent::MtuChanged(mtu) => self.on_mtu_changed(mtu),
            TransportEvent::Connect => log::debug!("receiver: transport connected"),
            TransportEvent::Disconnect => self.on_disconnect(),
        }
    }
}
