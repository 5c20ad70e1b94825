//! Data channel codec: `chunk id (2B LE) | payload length (2B LE) | payload`.

use crate::error::CodecError;
use crate::wire::MAX_FRAME_SIZE;
use heapless::Vec;

const DATA_HEADER_LEN: usize = 4;

/// Encode a single data packet. Length is always `4 + payload.len()`.
///
/// Returns `None` if the encoded frame would not fit the bounded frame
/// buffer (`MAX_FRAME_SIZE`) — this can only happen if the caller passes a
/// payload larger than what any valid MTU negotiation could have produced.
#[must_use]
pub fn encode_data(chunk_id: u16, payload: &[u8]) -> Option<Vec<u8, MAX_FRAME_SIZE>> {
    if DATA_HEADER_LEN + payload.len() > MAX_FRAME_SIZE {
        return None;
    }
    let mut out = Vec::new();
    out.extend_from_slice(&chunk_id.to_le_bytes()).ok()?;
    out.extend_from_slice(&(payload.len() as u16).to_le_bytes()).ok()?;
    out.extend_from_slice(payload).ok()?;
    Some(out)
}

/// Decode a data packet from `bytes`, returning `(chunk_id, payload_len, payload)`.
///
/// The receiver prefers the observed trailing slice length
/// over the declared `payload_len` field, but logs when they disagree — the
/// declared length is informational, not authoritative, since the transport
/// already delivers exactly one write per packet.
pub fn decode_data(bytes: &[u8]) -> Result<(u16, u16, &[u8]), CodecError> {
    if bytes.len() < DATA_HEADER_LEN {
        return Err(CodecError::DataTooShort { got: bytes.len() });
    }

    let chunk_id = u16::from_le_bytes([bytes[0], bytes[1]]);
    let declared_len = u16::from_le_bytes([bytes[2], bytes[3]]);
    let payload = &bytes[DATA_HEADER_LEN..];

    if declared_len as usize != payload.len() {
        log::warn!(
            "data packet {chunk_id}: declared payload length {declared_len} does not match observed {} bytes, trusting observed length",
            payload.len()
        );
    }

    Ok((chunk_id, payload.len() as u16, payload))
}
