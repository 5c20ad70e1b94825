//! Receiver state machine — the peer that drives an incoming transfer.
//!
//! ```text
//!  IDLE ──INIT──▶ INIT_RECEIVED ──(alloc ok)──▶ REQUESTING ──data──▶ RECEIVING
//!    ▲                                               │                  │
//!    │                                        (complete batch)         │
//!    │                                               ▼                  │
//!    │                                         REQUESTING◀──────────────┘
//!    │                                                                  │
//!    │                                                         (all chunks)
//!    │                                                                  ▼
//!    └──────────────────────────(disconnect)──────────────────────  COMPLETE
//!                                      ▲
//!                        (any state) ERROR
//! ```

pub mod buffer;
pub mod session;

pub use session::{BatchWindow, ReceiverCallbacks, ReceiverSession, ReceiverState};
