//! `tokio_util::codec` adapter for FSCI packets.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{decode_packet, encode_packet, FrameConfig, Packet};
use crate::error::{FrameError, Result};

/// Stream codec yielding complete [`Packet`]s.
#[derive(Debug, Clone, Default)]
pub struct FsciCodec {
    config: FrameConfig,
}

impl FsciCodec {
    pub fn new(config: FrameConfig) -> Self {
        Self { config }
    }
}

impl Decoder for FsciCodec {
    type Item = Packet;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Packet>> {
        decode_packet(src, self.config.max_payload_size)
    }
}

impl Encoder<Packet> for FsciCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Packet, dst: &mut BytesMut) -> Result<()> {
        if item.payload.len() > self.config.max_payload_size {
            return Err(FrameError::PayloadTooLarge {
                size: item.payload.len(),
                max: self.config.max_payload_size,
            });
        }
        encode_packet(item.group, item.opcode, &item.payload, dst)
    }
}
