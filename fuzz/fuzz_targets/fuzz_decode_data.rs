//! Fuzz target: `wire::decode_data`
//!
//! Drives arbitrary byte sequences into the data-packet decoder and asserts
//! it never panics, never returns a payload slice longer than the input
//! minus the 4-byte header, and always prefers the observed trailing-slice
//! length over a (possibly corrupt) declared length field.
//!
//! cargo fuzz run fuzz_decode_data

#![no_main]

use bletinyflow::wire::decode_data;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    match decode_data(data) {
        Ok((_chunk_id, len, payload)) => {
            assert_eq!(payload.len(), data.len() - 4, "observed slice must cover every trailing byte");
            assert_eq!(len as usize, payload.len(), "declared length must be normalized to the observed slice");
        }
        Err(_) => {
            assert!(data.len() < 4, "decode_data must only reject inputs shorter than 4 bytes");
        }
    }
});
