//! Wire codec — fixed 20-byte control frames and variable-length data packets.
//!
//! ```text
//!  ┌──────────────────────────────────────────────────────────┐
//!  │  ControlMessage (20 bytes, both directions)               │
//!  │  ┌─────┬──────────┬────────┬────────┬────────┬─────────┐ │
//!  │  │ cmd │ sequence │ param1 │ param2 │ param3 │ reserved│ │
//!  │  │ 1B  │   2B     │  4B    │  4B    │  4B    │   5B    │ │
//!  │  └─────┴──────────┴────────┴────────┴────────┴─────────┘ │
//!  └──────────────────────────────────────────────────────────┘
//!  ┌──────────────────────────────────────────────────────────┐
//!  │  DataPacket (4 + N bytes, sender -> receiver)              │
//!  │  ┌──────────┬──────────────┬─────────────────────────┐   │
//!  │  │ chunk id │ payload len  │ payload                 │   │
//!  │  │   2B     │    2B        │  N bytes                │   │
//!  │  └──────────┴──────────────┴─────────────────────────┘   │
//!  └──────────────────────────────────────────────────────────┘
//! ```
//!
//! All multi-byte integers are little-endian. Decoding never panics: every
//! length and bounds check returns a typed [`crate::error::CodecError`].

pub mod control;
pub mod data;

pub use control::{ControlMessage, Opcode, decode_control, encode_control};
pub use data::{decode_data, encode_data};

/// Maximum encoded frame size on either channel (bounded by `MAX_MTU`).
pub const MAX_FRAME_SIZE: usize = 512;
