//! Engine configuration parameters.
//!
//! All tunable parameters for the BLETinyFlow protocol engine. A host
//! application may override any field before constructing sender/receiver
//! sessions; neither peer reads these values from anywhere else, so a single
//! `EngineConfig` instance shared between both sides of a test is enough to
//! guarantee they agree on policy (see `max_transfer_size`).

use core::time::Duration;
use serde::{Deserialize, Serialize};

/// Core engine configuration, shared by sender and receiver sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum total transfer size, enforced identically by the sender's
    /// `transferFile` and the receiver's `TRANSFER_INIT` validation.
    pub max_transfer_size: u32,
    /// Upper bound on the MTU the transport may ever negotiate.
    pub max_mtu: u16,
    /// MTU assumed before any negotiation has completed.
    pub default_mtu: u16,
    /// Chunks requested per `CHUNK_REQUEST` batch.
    pub batch_size: u16,
    /// Inactivity timeout before a session fails with `Timeout`.
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_transfer_size: 1024 * 1024, // 1 MiB, shared by both peers
            max_mtu: 512,
            default_mtu: 23,
            batch_size: 40,
            timeout: Duration::from_secs(30),
        }
    }
}

impl EngineConfig {
    /// Maximum data-packet payload in bytes for a given negotiated MTU:
    /// `mtu - ATT_HEADER(3) - DATA_HEADER(4)`.
    #[must_use]
    pub const fn max_payload_for_mtu(mtu: u16) -> u16 {
        mtu.saturating_sub(3).saturating_sub(4)
    }
}

/// `Duration` has no native serde support without the `serde` feature on
/// `std`'s `Duration` re-export, so round-trip through whole seconds — the
/// engine's only duration field is the coarse 30-second inactivity timer.
mod duration_secs {
    use core::time::Duration;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        d.as_secs().serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}
