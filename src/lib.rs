//! BLETinyFlow protocol engine.
//!
//! A unidirectional file-transfer protocol over Bluetooth Low Energy between
//! a central (sender) and a peripheral (receiver). The receiver drives the
//! transfer by requesting batches of chunks; the sender streams fixed-framed
//! data packets in response. This crate is the protocol engine only — wire
//! codec, MTU-aware packetization, and the two peer state machines — and
//! never depends on a concrete GATT stack, scanning/discovery, or storage
//! layer.

#![deny(unused_must_use)]
#![warn(unsafe_op_in_unsafe_fn)]

pub mod config;
pub mod device_info;
pub mod error;
pub mod event_mux;
pub mod mtu;
pub mod receiver;
pub mod sender;
pub mod transport;
pub mod wire;

pub use config::EngineConfig;
pub use error::{Error, Result};
