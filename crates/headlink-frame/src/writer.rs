use std::io::{ErrorKind, Write};

use bytes::BytesMut;
use headlink_transport::LinkStream;

use crate::error::{FrameError, Result};
use crate::framer::FrameConfig;
use crate::packet::{Packet, Request, Response};
use crate::protocol::MAX_PACKET_SIZE;
use crate::reader::transport_to_frame_error;

/// Writes complete, checksummed packets to any `Write` stream.
pub struct PacketWriter<T> {
    inner: T,
    buf: BytesMut,
    config: FrameConfig,
}

impl<T: Write> PacketWriter<T> {
    /// Create a new packet writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new packet writer with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(MAX_PACKET_SIZE),
            config,
        }
    }

    /// Encode and send a request (blocking).
    ///
    /// Nothing is written if a value cannot be encoded. An elapsed write
    /// timeout surfaces as `FrameError::Io` with `WouldBlock`/`TimedOut`.
    pub fn write_request(&mut self, request: &Request) -> Result<()> {
        self.buf.clear();
        request.encode_into(&mut self.buf)?;
        self.write_buffered()
    }

    /// Encode and send a response (blocking).
    pub fn write_response(&mut self, response: &Response) -> Result<()> {
        self.buf.clear();
        response.encode_into(&mut self.buf)?;
        self.write_buffered()
    }

    /// Encode and send either kind of packet.
    pub fn write_packet(&mut self, packet: &Packet) -> Result<()> {
        match packet {
            Packet::Request(request) => self.write_request(request),
            Packet::Response(response) => self.write_response(response),
        }
    }

    fn write_buffered(&mut self) -> Result<()> {
        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current packet writer configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl PacketWriter<LinkStream> {
    /// Create a packet writer for a `LinkStream` and apply the write timeout.
    pub fn with_config_link(inner: LinkStream, config: FrameConfig) -> Result<Self> {
        inner
            .set_write_timeout(config.write_timeout)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(inner, config))
    }
}
