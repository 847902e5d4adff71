use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Sync marker that starts every packet.
pub const SYNC: u8 = 0x02;

/// Packet header: sync (1) + group (1) + opcode (1) + length (2) = 5 bytes.
pub const HEADER_SIZE: usize = 5;

/// Packet trailer: checksum (1).
pub const TRAILER_SIZE: usize = 1;

/// Default maximum payload size: the full range of the length field.
pub const DEFAULT_MAX_PAYLOAD: usize = u16::MAX as usize;

/// A framed FSCI message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Opcode group selecting the table family.
    pub group: u8,
    /// Opcode within the group.
    pub opcode: u8,
    /// The message payload.
    pub payload: Bytes,
}

impl Packet {
    /// Create a new packet.
    pub fn new(group: u8, opcode: u8, payload: impl Into<Bytes>) -> Self {
        Self {
            group,
            opcode,
            payload: payload.into(),
        }
    }

    /// The total wire size of this packet (header + payload + checksum).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.payload.len() + TRAILER_SIZE
    }
}

/// XOR checksum over group, opcode, length and payload.
pub fn checksum(group: u8, opcode: u8, payload: &[u8]) -> u8 {
    let len = (payload.len() as u16).to_le_bytes();
    payload
        .iter()
        .fold(group ^ opcode ^ len[0] ^ len[1], |acc, byte| acc ^ byte)
}

/// Encode a packet into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────┬───────┬────────┬──────────┬──────────────┬──────────┐
/// │ 0x02 │ Group │ Opcode │ Length   │ Payload      │ Checksum │
/// │ (1B) │ (1B)  │ (1B)   │ (2B LE)  │ (Length B)   │ (1B XOR) │
/// └──────┴───────┴────────┴──────────┴──────────────┴──────────┘
/// ```
pub fn encode_packet(group: u8, opcode: u8, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.len() > DEFAULT_MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: DEFAULT_MAX_PAYLOAD,
        });
    }
    dst.reserve(HEADER_SIZE + payload.len() + TRAILER_SIZE);
    dst.put_u8(SYNC);
    dst.put_u8(group);
    dst.put_u8(opcode);
    dst.put_u16_le(payload.len() as u16);
    dst.put_slice(payload);
    dst.put_u8(checksum(group, opcode, payload));
    Ok(())
}

/// Decode a packet from a buffer.
///
/// Bytes preceding a sync marker are discarded. Returns `Ok(None)` if the
/// buffer doesn't contain a complete packet yet. A packet with a bad
/// checksum is consumed before the error is returned, so the stream can
/// continue with the next packet.
pub fn decode_packet(src: &mut BytesMut, max_payload: usize) -> Result<Option<Packet>> {
    match src.iter().position(|byte| *byte == SYNC) {
        Some(0) => {}
        Some(skip) => {
            tracing::trace!(skipped = skip, "discarding bytes before sync marker");
            src.advance(skip);
        }
        None => {
            src.clear();
            return Ok(None);
        }
    }

    if src.len() < HEADER_SIZE {
        return Ok(None);
    }

    let group = src[1];
    let opcode = src[2];
    let payload_len = usize::from(u16::from_le_bytes([src[3], src[4]]));

    if payload_len > max_payload {
        // Drop the sync byte so the next call resynchronises.
        src.advance(1);
        return Err(FrameError::PayloadTooLarge {
            size: payload_len,
            max: max_payload,
        });
    }

    let total = HEADER_SIZE + payload_len + TRAILER_SIZE;
    if src.len() < total {
        return Ok(None);
    }

    src.advance(HEADER_SIZE);
    let payload = src.split_to(payload_len).freeze();
    let actual = src.get_u8();
    let expected = checksum(group, opcode, &payload);
    if actual != expected {
        return Err(FrameError::ChecksumMismatch { expected, actual });
    }

    Ok(Some(Packet {
        group,
        opcode,
        payload,
    }))
}

/// Configuration for the packet codec.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum payload size in bytes. Default: 65535.
    pub max_payload_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
        }
    }
}
