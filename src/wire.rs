//! Binary framing shared by every message that passes through the registry.
//!
//! A framed payload is `header byte | compression byte | version id | payload`.
//! The layout is fixed by the wire protocol and must stay byte-compatible with
//! the other registry clients.

use uuid::Uuid;

use crate::{Error, Result};

/// Magic/version byte every frame starts with.
pub const HEADER_VERSION_BYTE: u8 = 0x03;

/// Length of the fixed prefix: header byte, compression byte and the 16 raw
/// bytes of the schema version id.
pub const PREFIX_LEN: usize = 18;

/// Frame `payload` under the given schema version id and compression code.
pub fn encode(version_id: Uuid, compression_code: u8, payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(PREFIX_LEN + payload.len());
    frame.push(HEADER_VERSION_BYTE);
    frame.push(compression_code);
    frame.extend_from_slice(version_id.as_bytes());
    frame.extend_from_slice(payload);
    frame
}

/// Split a frame back into `(version id, compression code, payload)`.
///
/// The payload is returned as-is; decompression is the caller's concern.
pub fn decode(data: &[u8]) -> Result<(Uuid, u8, &[u8])> {
    if data.len() < PREFIX_LEN {
        return Err(Error::MalformedData(format!(
            "frame is {} bytes long, expected at least {}",
            data.len(),
            PREFIX_LEN
        )));
    }
    if data[0] != HEADER_VERSION_BYTE {
        return Err(Error::MalformedData(format!(
            "unknown header byte {:#04x}",
            data[0]
        )));
    }
    let compression_code = data[1];
    let mut id = [0u8; 16];
    id.copy_from_slice(&data[2..PREFIX_LEN]);
    Ok((Uuid::from_bytes(id), compression_code, &data[PREFIX_LEN..]))
}
