use std::io::{ErrorKind, Read};

use bytes::{Buf, Bytes, BytesMut};
use headlink_transport::LinkStream;
use tracing::debug;

use crate::error::{FrameError, Result};
use crate::framer::{FrameConfig, FrameResult, Framer, PacketFramer};
use crate::packet::Packet;
use crate::protocol::MAX_PACKET_SIZE;

const READ_CHUNK_SIZE: usize = MAX_PACKET_SIZE * 10;

/// Reads validated packets from any `Read` stream.
///
/// Bytes are buffered until the framer recognizes a complete packet.
/// Leading bytes the framer rejects are dropped one at a time, so a reader
/// started mid-stream or fed line noise resynchronizes on its own.
pub struct PacketReader<T, F = PacketFramer> {
    inner: T,
    framer: F,
    buf: BytesMut,
    config: FrameConfig,
    dropped: u64,
}

impl<T: Read> PacketReader<T> {
    /// Create a new packet reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new packet reader with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self::with_framer(inner, PacketFramer, config)
    }
}

impl<T: Read, F: Framer> PacketReader<T, F> {
    /// Create a reader around a custom framer.
    pub fn with_framer(inner: T, framer: F, config: FrameConfig) -> Self {
        let capacity = READ_CHUNK_SIZE.max(framer.max_packet_size());
        Self {
            inner,
            framer,
            buf: BytesMut::with_capacity(capacity),
            config,
            dropped: 0,
        }
    }

    /// Read the next complete packet (blocking).
    ///
    /// Returns `Err(FrameError::ConnectionClosed)` when EOF is reached, and
    /// `Err(FrameError::Io)` with `WouldBlock`/`TimedOut` when a read timeout
    /// elapses. Buffered bytes survive a timeout.
    pub fn read_packet(&mut self) -> Result<Bytes> {
        loop {
            if let Some(packet) = self.next_buffered() {
                return Ok(packet);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            };

            if read == 0 {
                return Err(FrameError::ConnectionClosed);
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Read the next packet and decode it.
    pub fn read_decoded(&mut self) -> Result<Packet> {
        let packet = self.read_packet()?;
        Packet::decode(&packet)
    }
}

impl<T, F: Framer> PacketReader<T, F> {
    /// Extract a packet from bytes already buffered, without reading.
    pub fn next_buffered(&mut self) -> Option<Bytes> {
        loop {
            match self.framer.try_extract(&self.buf) {
                FrameResult::Complete(len) => return Some(self.buf.split_to(len).freeze()),
                FrameResult::NeedMoreBytes(_) => return None,
                FrameResult::Invalid(reason) => {
                    debug!(byte = self.buf[0], %reason, "dropping byte");
                    self.buf.advance(1);
                    self.dropped += 1;
                }
            }
        }
    }

    /// Append bytes obtained elsewhere to the receive buffer.
    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Number of bytes buffered but not yet returned as packets.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Total bytes discarded while resynchronizing.
    pub fn dropped_bytes(&self) -> u64 {
        self.dropped
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current packet reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl PacketReader<LinkStream> {
    /// Create a packet reader for a `LinkStream` and apply the read timeout.
    pub fn with_config_link(inner: LinkStream, config: FrameConfig) -> Result<Self> {
        inner
            .set_read_timeout(config.read_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(inner, config))
    }
}

pub(crate) fn transport_to_frame_error(err: headlink_transport::TransportError) -> FrameError {
    use headlink_transport::TransportError;

    match err {
        TransportError::Io(io) | TransportError::Accept(io) => FrameError::Io(io),
        TransportError::Bind { source, .. } | TransportError::Connect { source, .. } => {
            FrameError::Io(source)
        }
    }
}
