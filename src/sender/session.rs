//! Sender session: the stateful engine for one outgoing transfer.

use std::time::{Duration, Instant};

use crate::config::EngineConfig;
use crate::device_info::DeviceInfo;
use crate::error::{ReceiverError, SenderError};
use crate::event_mux::EventHandler;
use crate::mtu;
use crate::transport::{Transport, TransportEvent};
use crate::wire::{self, Opcode};

/// Sender states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenderState {
    Idle,
    Connecting,
    SendingInit,
    WaitingForRequest,
    SendingData,
    Completed { total_bytes: u32 },
    Failed,
}

/// Application callbacks the sender side exposes to the host application.
pub trait SenderCallbacks {
    /// Coalesced progress update, emitted no more than every 5 chunks.
    fn on_progress(&mut self, _bytes_sent: u32, _total_bytes: u32) {}
    /// Fired exactly once, when the receiver acknowledges completion.
    fn on_transfer_complete(&mut self, total_bytes: u32, elapsed: Duration, throughput_bytes_per_sec: f64);
    /// Fired exactly once per failed session.
    fn on_transfer_error(&mut self, error: SenderError);
    /// Forwarded when the receiver sends an optional `DEVICE_INFO` advisory.
    fn on_device_info(&mut self, _info: DeviceInfo) {}
}

/// Orchestrates one outgoing transfer end to end.
pub struct SenderSession<T: Transport, C: SenderCallbacks> {
    config: EngineConfig,
    transport: T,
    callbacks: C,
    state: SenderState,
    connected: bool,
    negotiated_mtu: u16,
    max_payload: u16,
    payload: Option<std::vec::Vec<u8>>,
    total_size: u32,
    chunk_size: u16,
    expected_chunks: u32,
    sequence: u16,
    bytes_sent: u32,
    chunks_since_progress: u32,
    start_time: Option<Instant>,
    last_activity: Option<Instant>,
}

impl<T: Transport, C: SenderCallbacks> SenderSession<T, C> {
    #[must_use]
    pub fn new(transport: T, callbacks: C, config: EngineConfig) -> Self {
        let negotiated_mtu = config.default_mtu;
        let max_payload = EngineConfig::max_payload_for_mtu(negotiated_mtu);
        Self {
            config,
            transport,
            callbacks,
            state: SenderState::Idle,
            connected: false,
            negotiated_mtu,
            max_payload,
            payload: None,
            total_size: 0,
            chunk_size: 0,
            expected_chunks: 0,
            sequence: 0,
            bytes_sent: 0,
            chunks_since_progress: 0,
            start_time: None,
            last_activity: None,
        }
    }

    #[must_use]
    pub const fn state(&self) -> SenderState {
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

    fn next_sequence(&mut self) -> u16 {
        let seq = self.sequence;
        self.sequence = self.sequence.wrapping_add(1);
        seq
    }

    /// `IDLE + transferFile(bytes)`.
    pub fn transfer_file(&mut self, payload: std::vec::Vec<u8>) {
        if !matches!(self.state, SenderState::Idle) {
            log::warn!("sender: transferFile called outside IDLE ({:?}), ignoring", self.state);
            return;
        }
        if payload.len() as u64 > u64::from(self.config.max_transfer_size) {
            // Local failure: never touches the transport.
            self.callbacks.on_transfer_error(SenderError::FileTooLarge);
            return;
        }

        self.payload = Some(payload);
        if self.connected {
            self.send_init();
        } else {
            log::info!("sender: IDLE -> Connecting (awaiting transport readiness)");
            self.state = SenderState::Connecting;
        }
    }

    /// `CONNECTING + ready`: control notifications subscribed and the data
    /// characteristic handle known. Modeled as an explicit call because
    /// GATT subscription bookkeeping is out of this engine's scope — the
    /// host signals readiness once it has completed it.
    pub fn notify_ready(&mut self) {
        self.connected = true;
        if matches!(self.state, SenderState::Connecting) && self.payload.is_some() {
            self.send_init();
        }
    }

    fn send_init(&mut self) {
        let Some(payload) = self.payload.as_ref() else {
            return;
        };
        self.chunk_size = mtu::chunk_size_for_mtu(self.negotiated_mtu);
        self.total_size = payload.len() as u32;
        self.expected_chunks = mtu::expected_chunks(self.total_size, self.chunk_size);
        self.bytes_sent = 0;
        self.chunks_since_progress = 0;
        self.state = SenderState::SendingInit;

        let seq = self.next_sequence();
        let bytes = wire::encode_control(
            Opcode::TransferInit,
            seq,
            self.total_size,
            u32::from(self.chunk_size),
            self.expected_chunks,
        );
        if let Err(e) = self.transport.send_control(&bytes) {
            self.fail_transport(&format!("{e:?}"));
            return;
        }

        self.start_time = Some(Instant::now());
        self.last_activity = Some(Instant::now());
        log::info!(
            "sender: -> SendingInit -> WaitingForRequest (total={}, chunk_size={}, chunks={})",
            self.total_size, self.chunk_size, self.expected_chunks
        );
        self.state = SenderState::WaitingForRequest;
    }

    fn chunk_slice<'a>(payload: &'a [u8], id: u32, total_size: u32, chunk_size: u16) -> Option<&'a [u8]> {
        let (start, end) = mtu::chunk_bounds(id, total_size, chunk_size)?;
        Some(&payload[start as usize..end as usize])
    }

    fn on_control_frame(&mut self, bytes: &[u8]) {
        let msg = match wire::decode_control(bytes) {
            Ok(m) => m,
            Err(e) => {
                log::warn!("sender: malformed inbound control frame ignored: {e}");
                return;
            }
        };

        self.last_activity = Some(Instant::now());

        match msg.opcode {
            Opcode::ChunkRequest => self.on_chunk_request(msg.param1, msg.param2),
            Opcode::TransferCompleteAck => self.on_complete_ack(msg.param1),
            Opcode::TransferError => self.on_transfer_error(msg.param1),
            Opcode::DeviceInfo => {
                self.callbacks.on_device_info(DeviceInfo::from_params(msg.param1, msg.param2));
            }
            Opcode::TransferInit => {
                log::warn!("sender: unexpected inbound TRANSFER_INIT, ignoring");
            }
        }
    }

    fn on_chunk_request(&mut self, start: u32, n: u32) {
        if !matches!(self.state, SenderState::WaitingForRequest) {
            // Single-threaded engine: by the time a new CHUNK_REQUEST is
            // dispatched here, the prior batch's send loop has already
            // returned to WaitingForRequest — there is no real concurrent
            // mid-batch arrival to queue.
            log::debug!("sender: CHUNK_REQUEST ignored in state {:?}", self.state);
            return;
        }
        if start >= self.expected_chunks {
            log::warn!("sender: CHUNK_REQUEST start {start} >= {} total chunks, ignoring (receiver error)", self.expected_chunks);
            return;
        }

        // Clamp the in-range prefix, drop the overlong tail.
        let end = (start + n).min(self.expected_chunks);
        log::info!("sender: -> SendingData [{start}, {end})");
        self.state = SenderState::SendingData;

        let Some(payload) = self.payload.take() else {
            log::error!("sender: SendingData with no payload held, failing");
            self.fail(SenderError::NotConnected);
            return;
        };

        let mut transport_err = None;
        for id in start..end {
            let Some(slice) = Self::chunk_slice(&payload, id, self.total_size, self.chunk_size) else {
                log::error!("sender: chunk {id} out of bounds for total={}, chunk_size={}", self.total_size, self.chunk_size);
                continue;
            };
            let Some(frame) = wire::encode_data(id as u16, slice) else {
                log::error!("sender: chunk {id} does not fit a single frame, dropping");
                continue;
            };
            if let Err(e) = self.transport.send_data(&frame) {
                transport_err = Some(format!("{e:?}"));
                break;
            }
            self.bytes_sent += slice.len() as u32;
            self.chunks_since_progress += 1;
            if self.chunks_since_progress >= 5 {
                self.callbacks.on_progress(self.bytes_sent, self.total_size);
                self.chunks_since_progress = 0;
            }
        }
        if self.chunks_since_progress > 0 {
            self.callbacks.on_progress(self.bytes_sent, self.total_size);
            self.chunks_since_progress = 0;
        }
        self.payload = Some(payload);

        if let Some(msg) = transport_err {
            self.fail_transport(&msg);
            return;
        }

        log::info!("sender: -> WaitingForRequest (batch [{start}, {end}) sent)");
        self.state = SenderState::WaitingForRequest;
    }

    fn on_complete_ack(&mut self, total_bytes: u32) {
        if matches!(self.state, SenderState::Completed { .. } | SenderState::Failed) {
            return;
        }
        self.last_activity = None;
        let elapsed = self.start_time.map_or(Duration::ZERO, |t| t.elapsed());
        let throughput = if elapsed.as_secs_f64() > 0.0 {
            f64::from(total_bytes) / elapsed.as_secs_f64()
        } else {
            0.0
        };
        log::info!("sender: -> Completed ({total_bytes} bytes in {elapsed:?})");
        self.state = SenderState::Completed { total_bytes };
        self.callbacks.on_transfer_complete(total_bytes, elapsed, throughput);
    }

    fn on_transfer_error(&mut self, code: u32) {
        let code = code.min(u32::from(u8::MAX)) as u8;
        self.fail(SenderError::PeerReported(ReceiverError::from_wire_code(code)));
    }

    fn fail_transport(&mut self, msg: &str) {
        let mut end = msg.len().min(128);
        while end > 0 && !msg.is_char_boundary(end) {
            end -= 1;
        }
        let mut s = heapless::String::<128>::new();
        let _ = s.push_str(&msg[..end]);
        self.fail(SenderError::Transport(s));
    }

    fn fail(&mut self, error: SenderError) {
        if matches!(self.state, SenderState::Failed | SenderState::Completed { .. }) {
            return;
        }
        log::warn!("sender: -> Failed({error})");
        self.state = SenderState::Failed;
        self.last_activity = None;
        self.callbacks.on_transfer_error(error);
    }

    /// Check the single coarse inactivity timer. The host application is
    /// expected to call this periodically (e.g. from its own tick or a
    /// dedicated timer), passing the current instant.
    pub fn poll_timeout(&mut self, now: Instant) {
        let Some(last) = self.last_activity else {
            return;
        };
        if matches!(self.state, SenderState::WaitingForRequest | SenderState::SendingData)
            && now.duration_since(last) >= self.config.timeout
        {
            self.fail(SenderError::Timeout);
        }
    }

    /// Application-invoked cancellation: immediate and unconditional, no
    /// wire-visible error is emitted.
    pub fn cancel(&mut self) {
        log::info!("sender: cancel() -> Idle");
        self.reset();
    }

    fn on_connect(&mut self) {
        log::debug!("sender: transport connected");
    }

    fn on_disconnect(&mut self) {
        log::info!("sender: transport disconnected, tearing down session");
        self.connected = false;
        self.reset();
    }

    fn reset(&mut self) {
        self.state = SenderState::Idle;
        self.payload = None;
        self.total_size = 0;
        self.chunk_size = 0;
        self.expected_chunks = 0;
        self.bytes_sent = 0;
        self.chunks_since_progress = 0;
        self.start_time = None;
        self.last_activity = None;
    }

    fn on_mtu_changed(&mut self, mtu: u16) {
        self.negotiated_mtu = mtu.min(self.config.max_mtu);
        self.max_payload = EngineConfig::max_payload_for_mtu(self.negotiated_mtu);
        log::debug!("sender: MTU negotiated: {} (max payload {})", self.negotiated_mtu, self.max_payload);
    }
}

impl<T: Transport, C: SenderCallbacks> EventHandler for SenderSession<T, C> {
    fn handle_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::ControlFrame(bytes) => self.on_control_frame(&bytes),
            TransportEvent::DataFrame(_) => {
                log::warn!("sender: unexpected inbound data frame, ignoring");
            }
            TransportEvent::MtuChanged(mtu) => self.on_mtu_changed(mtu),
            TransportEvent::Connect => self.on_connect(),
            TransportEvent::Disconnect => self.on_disconnect(),
        }
    }
}
