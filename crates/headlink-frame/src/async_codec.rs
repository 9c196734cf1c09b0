//! `tokio_util` codec for use with `Framed`, `FramedRead` and `FramedWrite`.

use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::debug;

use crate::error::FrameError;
use crate::framer::{extract_packet, FrameResult};
use crate::packet::{Packet, Request, Response};

/// Decodes headlink packets from, and encodes them into, an async byte stream.
///
/// Framing matches [`crate::PacketReader`]: rejected leading bytes are
/// dropped one at a time.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadCodec {
    dropped: u64,
}

impl HeadCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total bytes discarded while resynchronizing.
    pub fn dropped_bytes(&self) -> u64 {
        self.dropped
    }
}

impl Decoder for HeadCodec {
    type Item = Packet;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Packet>, FrameError> {
        loop {
            match extract_packet(src) {
                FrameResult::Complete(len) => {
                    let packet = src.split_to(len);
                    return Packet::decode(&packet).map(Some);
                }
                FrameResult::NeedMoreBytes(missing) => {
                    src.reserve(missing);
                    return Ok(None);
                }
                FrameResult::Invalid(reason) => {
                    debug!(byte = src[0], %reason, "dropping byte");
                    src.advance(1);
                    self.dropped += 1;
                }
            }
        }
    }
}

impl Encoder<Request> for HeadCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Request, dst: &mut BytesMut) -> Result<(), FrameError> {
        item.encode_into(dst)
    }
}

impl Encoder<Response> for HeadCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Response, dst: &mut BytesMut) -> Result<(), FrameError> {
        item.encode_into(dst)
    }
}

impl Encoder<Packet> for HeadCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Packet, dst: &mut BytesMut) -> Result<(), FrameError> {
        match item {
            Packet::Request(request) => request.encode_into(dst),
            Packet::Response(response) => response.encode_into(dst),
        }
    }
}
