//! Sender state machine — the peer that streams the requested data.
//!
//! ```text
//!  IDLE ──transferFile──▶ CONNECTING ──ready──▶ SENDING_INIT ──▶ WAITING_FOR_REQUEST
//!                                                                       │   ▲
//!                                                            CHUNK_REQUEST  │
//!                                                                       ▼   │
//!                                                                 SENDING_DATA
//!                                                                       │
//!                                          TRANSFER_COMPLETE_ACK ───────┤
//!                                                                       ▼
//!                                                                  COMPLETED
//!
//!  (any state) + TRANSFER_ERROR / timeout / transport error ──▶ FAILED
//! ```

pub mod session;

pub use session::{SenderCallbacks, SenderSession, SenderState};
