//! Unified error types for the BLETinyFlow protocol engine.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! host application's error handling uniform. Subsystem enums are defined
//! independently so call sites that only care about one layer (codec,
//! receiver, sender) can match narrowly without going through the top type.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level engine error
// ---------------------------------------------------------------------------

/// Every fallible operation in the engine funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A control or data frame could not be decoded.
    Codec(CodecError),
    /// A receiver-session transition failed (wire-visible, see [`ReceiverError::wire_code`]).
    Receiver(ReceiverError),
    /// A sender-session transition failed.
    Sender(SenderError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Codec(e) => write!(f, "codec: {e}"),
            Self::Receiver(e) => write!(f, "receiver: {e}"),
            Self::Sender(e) => write!(f, "sender: {e}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Wire codec errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    /// `decodeControl` saw fewer than 15 bytes.
    ControlTooShort { got: usize },
    /// `decodeData` saw fewer than 4 bytes.
    DataTooShort { got: usize },
    /// Command opcode is not one of the known v1 opcodes.
    UnknownOpcode(u8),
    /// Bit 7 of the command byte (reserved for future protocol versions) was set.
    ReservedVersionBit,
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ControlTooShort { got } => {
                write!(f, "control message too short: {got} bytes (need >= 15)")
            }
            Self::DataTooShort { got } => {
                write!(f, "data packet too short: {got} bytes (need >= 4)")
            }
            Self::UnknownOpcode(op) => write!(f, "unknown opcode {op:#04x}"),
            Self::ReservedVersionBit => write!(f, "reserved version bit set on command byte"),
        }
    }
}

impl From<CodecError> for Error {
    fn from(e: CodecError) -> Self {
        Self::Codec(e)
    }
}

// ---------------------------------------------------------------------------
// Receiver errors — mirror the wire TRANSFER_ERROR taxonomy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ReceiverError {
    UnknownError = 0x01,
    TransferTooLarge = 0x02,
    ChunkSizeTooLarge = 0x03,
    MemoryAllocationFailed = 0x04,
    BufferOverflow = 0x05,
    InvalidChunkId = 0x06,
    DuplicateChunk = 0x07,
    ControlMessageTooShort = 0x08,
    DataChunkTooShort = 0x09,
    NotificationSendFailed = 0x0A,
    InvalidCommand = 0x0B,
}

impl ReceiverError {
    /// The byte carried as `param1` of a `TRANSFER_ERROR` control message.
    #[must_use]
    pub const fn wire_code(self) -> u8 {
        self as u8
    }

    /// Reconstruct a receiver error from a wire-carried error code.
    ///
    /// Any code outside the known taxonomy maps to `UnknownError` rather
    /// than failing — the sender must never panic on a peer-controlled byte.
    #[must_use]
    pub const fn from_wire_code(code: u8) -> Self {
        match code {
            0x02 => Self::TransferTooLarge,
            0x03 => Self::ChunkSizeTooLarge,
            0x04 => Self::MemoryAllocationFailed,
            0x05 => Self::BufferOverflow,
            0x06 => Self::InvalidChunkId,
            0x07 => Self::DuplicateChunk,
            0x08 => Self::ControlMessageTooShort,
            0x09 => Self::DataChunkTooShort,
            0x0A => Self::NotificationSendFailed,
            0x0B => Self::InvalidCommand,
            _ => Self::UnknownError,
        }
    }
}

impl fmt::Display for ReceiverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownError => write!(f, "unknown error"),
            Self::TransferTooLarge => write!(f, "transfer exceeds max transfer size"),
            Self::ChunkSizeTooLarge => write!(f, "chunk size exceeds max payload for MTU"),
            Self::MemoryAllocationFailed => write!(f, "buffer or bitmap allocation failed"),
            Self::BufferOverflow => write!(f, "data write would exceed total size"),
            Self::InvalidChunkId => write!(f, "chunk id >= expected chunk count"),
            Self::DuplicateChunk => write!(f, "chunk already received"),
            Self::ControlMessageTooShort => write!(f, "control message shorter than 15 bytes"),
            Self::DataChunkTooShort => write!(f, "data packet shorter than 4 bytes"),
            Self::NotificationSendFailed => write!(f, "transport refused a control notification"),
            Self::InvalidCommand => write!(f, "unknown opcode or reserved version bit set"),
        }
    }
}

impl From<ReceiverError> for Error {
    fn from(e: ReceiverError) -> Self {
        Self::Receiver(e)
    }
}

impl From<CodecError> for ReceiverError {
    fn from(e: CodecError) -> Self {
        match e {
            CodecError::ControlTooShort { .. } => Self::ControlMessageTooShort,
            CodecError::DataTooShort { .. } => Self::DataChunkTooShort,
            CodecError::UnknownOpcode(_) | CodecError::ReservedVersionBit => Self::InvalidCommand,
        }
    }
}

// ---------------------------------------------------------------------------
// Sender-local errors (not wire-visible, except PeerReported)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SenderError {
    /// `transferFile` was called with a payload larger than `max_transfer_size`.
    FileTooLarge,
    /// A send was attempted while the transport was not connected.
    NotConnected,
    /// The transport never became ready (subscribed + MTU known) in time.
    ConnectionTimeout,
    /// The 30-second inactivity timer elapsed waiting for a control frame.
    Timeout,
    /// The receiver emitted `TRANSFER_ERROR` with this code.
    PeerReported(ReceiverError),
    /// The transport itself returned an error on a write or notify.
    Transport(heapless::String<128>),
}

impl SenderError {
    /// The closest wire error code, when this error has one. Local-only
    /// failures that never reach the wire (timeouts, `NotConnected`,
    /// transport I/O) return `None`.
    #[must_use]
    pub const fn wire_code(&self) -> Option<u8> {
        match self {
            Self::FileTooLarge => Some(ReceiverError::TransferTooLarge.wire_code()),
            Self::PeerReported(e) => Some(e.wire_code()),
            Self::NotConnected | Self::ConnectionTimeout | Self::Timeout | Self::Transport(_) => {
                None
            }
        }
    }
}

impl fmt::Display for SenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FileTooLarge => write!(f, "file exceeds max transfer size"),
            Self::NotConnected => write!(f, "transport not connected"),
            Self::ConnectionTimeout => write!(f, "timed out waiting for transport to become ready"),
            Self::Timeout => write!(f, "timed out waiting for a control frame from the receiver"),
            Self::PeerReported(e) => write!(f, "receiver reported: {e}"),
            Self::Transport(msg) => write!(f, "transport error: {msg}"),
        }
    }
}

impl From<SenderError> for Error {
    fn from(e: SenderError) -> Self {
        Self::Sender(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Engine-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
