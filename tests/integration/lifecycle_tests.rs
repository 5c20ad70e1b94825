//! Lifecycle properties: multi-batch happy paths, disconnect/cancel
//! cleanup, and the `DEVICE_INFO` advisory path.

use crate::harness::Link;
use bletinyflow::config::EngineConfig;
use bletinyflow::device_info::DeviceInfo;
use bletinyflow::event_mux::EventHandler;
use bletinyflow::receiver::ReceiverState;
use bletinyflow::sender::SenderState;
use bletinyflow::transport::TransportEvent;

/// A transfer spanning several batches completes with the full payload
/// intact on the receiver and a matching `Completed` report on the sender.
#[test]
fn multi_batch_transfer_reaches_completed_on_both_peers() {
    let mut link = Link::new(EngineConfig::default());
    link.connect(512);
    let payload: std::vec::Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
    link.transfer_file(payload.clone());

    assert!(matches!(
        link.sender_mux.handler().state(),
        SenderState::Completed { total_bytes } if total_bytes == payload.len() as u32
    ));
    assert!(matches!(
        link.receiver_mux.handler().state(),
        ReceiverState::Complete { total_bytes } if total_bytes == payload.len() as u32
    ));
    let (buf, _) = link.receiver_mux.handler().callbacks().completed.clone().unwrap();
    assert_eq!(buf, payload);
    assert_eq!(link.sender_mux.handler().callbacks().completed.unwrap().0, payload.len() as u32);
}

/// A transport disconnect mid-transfer (between batches, the only
/// externally observable point since a batch send is synchronous) leaves
/// no leaked buffers and returns the sender to `Idle`, ready for a fresh
/// `transferFile` call.
#[test]
fn disconnect_mid_transfer_resets_sender_to_idle() {
    let mut link = Link::new(EngineConfig::default());
    link.connect(512);
    let payload = std::vec![0x11u8; 505 * 41];
    link.sender_mux.handler_mut().transfer_file(payload);
    // Let the INIT reach the receiver and its first CHUNK_REQUEST come back,
    // but stop short of draining the sender's queue so it never sends data.
    link.receiver_mux.drain();
    assert!(matches!(link.sender_mux.handler().state(), SenderState::WaitingForRequest));

    link.sender_mux.handler_mut().handle_event(TransportEvent::Disconnect);

    assert!(matches!(link.sender_mux.handler().state(), SenderState::Idle));
    assert!(link.sender_mux.handler().callbacks().errors.is_empty());
    assert!(link.sender_mux.handler().callbacks().completed.is_none());
}

/// A transport disconnect during reception resets the receiver to `Idle`
/// and releases its buffer (no leaked allocation survives into the next
/// connection).
#[test]
fn disconnect_mid_transfer_resets_receiver_to_idle() {
    let mut harness = crate::harness::StandaloneReceiverHarness::new(EngineConfig::default());
    harness.mux.handler_mut().handle_event(TransportEvent::MtuChanged(512));
    let init = bletinyflow::wire::encode_control(bletinyflow::wire::Opcode::TransferInit, 0, 2020, 505, 4);
    let mut f = heapless::Vec::new();
    f.extend_from_slice(&init).unwrap();
    harness.mux.handler_mut().handle_event(TransportEvent::ControlFrame(f));
    assert!(!matches!(harness.mux.handler().state(), ReceiverState::Idle));

    harness.mux.handler_mut().handle_event(TransportEvent::Disconnect);

    assert!(matches!(harness.mux.handler().state(), ReceiverState::Idle));
    assert_eq!(harness.mux.handler_mut().release_buffer(), None);
}

/// Application-invoked `cancel()` unconditionally returns the sender to
/// `Idle` without emitting any wire-visible error frame.
#[test]
fn cancel_returns_sender_to_idle_without_wire_error() {
    let mut link = Link::new(EngineConfig::default());
    link.connect(512);
    link.sender_mux.handler_mut().transfer_file(std::vec![0x22u8; 505 * 41]);
    link.pump();

    link.sender_mux.handler_mut().cancel();

    assert!(matches!(link.sender_mux.handler().state(), SenderState::Idle));
    assert!(link.sender_mux.handler().callbacks().errors.is_empty());
}

/// The receiver's `DEVICE_INFO` advisory is forwarded verbatim to the
/// sender's application callback.
#[test]
fn device_info_advisory_forwards_to_sender_callback() {
    let mut link = Link::new(EngineConfig::default());
    link.connect(512);

    let info = DeviceInfo { device_type: 1, battery_percent: 77, width: 640, height: 480 };
    link.receiver_mux.handler_mut().send_device_info(info);
    link.pump();

    assert_eq!(link.receiver_mux.handler().callbacks().device_info, std::vec![info]);
}

/// `release_buffer` is idempotent: calling it twice after completion yields
/// the buffer once, then `None`.
#[test]
fn release_buffer_is_idempotent() {
    let mut harness = crate::harness::StandaloneReceiverHarness::new(EngineConfig::default());
    harness.mux.handler_mut().handle_event(TransportEvent::MtuChanged(512));
    let init = bletinyflow::wire::encode_control(bletinyflow::wire::Opcode::TransferInit, 0, 1, 505, 1);
    let mut f = heapless::Vec::new();
    f.extend_from_slice(&init).unwrap();
    harness.mux.handler_mut().handle_event(TransportEvent::ControlFrame(f));
    let chunk = bletinyflow::wire::encode_data(0, &[0xAA]).unwrap();
    harness.mux.handler_mut().handle_event(TransportEvent::DataFrame(chunk));

    assert_eq!(harness.mux.handler_mut().release_buffer(), Some(std::vec![0xAA]));
    assert_eq!(harness.mux.handler_mut().release_buffer(), None);
}
