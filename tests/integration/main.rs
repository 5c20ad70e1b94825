//! End-to-end integration tests: drives a [`bletinyflow::sender::SenderSession`]
//! and a [`bletinyflow::receiver::ReceiverSession`] against each other over
//! an in-memory mock transport, exercising the boundary scenarios and
//! lifecycle properties: boundary payload sizes, batching, disconnects,
//! and error propagation.

mod harness;
mod lifecycle_tests;
