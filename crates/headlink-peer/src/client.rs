use std::io::Write;
use std::time::{Duration, Instant};

use bytes::Bytes;
use headlink_frame::{
    header, CommandId, MessageKind, PacketReader, PacketWriter, Request, Response, Status,
};
use headlink_transport::ReadTimeout;
use tracing::debug;

use crate::config::{LinkConfig, MIN_SOCKET_TIMEOUT};
use crate::error::{read_error, PeerError, Result};

/// Controller side of a link: one request in flight at a time.
pub struct ClientLink<R, W> {
    reader: PacketReader<R>,
    writer: PacketWriter<W>,
    config: LinkConfig,
}

impl<R: ReadTimeout, W: Write> ClientLink<R, W> {
    pub fn new(reader: PacketReader<R>, writer: PacketWriter<W>, config: LinkConfig) -> Self {
        Self {
            reader,
            writer,
            config,
        }
    }

    /// Send a request and wait for the head's answer.
    ///
    /// Responses to other commands are discarded without looking at their
    /// status. Each read is bounded by the time left before the response
    /// deadline. If no matching response arrives by then the result is
    /// [`Status::Timeout`], which is local and never goes on the wire.
    pub fn request(&mut self, request: &Request) -> Result<Status> {
        let expected = request.command_id();
        self.writer.write_request(request)?;
        debug!(command = %expected, "sent request");

        let deadline = Instant::now() + self.config.response_timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                debug!(command = %expected, "response deadline elapsed");
                return Ok(Status::Timeout);
            }

            let (packet, command_id) = match self.read_response_packet(Some(remaining)) {
                Ok(read) => read,
                Err(PeerError::Timeout(_)) => {
                    debug!(command = %expected, "read timed out awaiting response");
                    return Ok(Status::Timeout);
                }
                Err(err) => return Err(err),
            };

            if command_id != expected {
                debug!(
                    expected = %expected,
                    actual = %command_id,
                    "discarding unmatched response"
                );
                continue;
            }

            let response = Response::decode(&packet)?;
            debug!(command = %expected, status = %response.status, "received response");
            return Ok(response.status);
        }
    }

    /// Read exactly one response packet.
    ///
    /// A request packet on this link is a [`PeerError::Sequencing`] error.
    pub fn read_response(&mut self) -> Result<Response> {
        let (packet, _) = self.read_response_packet(None)?;
        Ok(Response::decode(&packet)?)
    }

    /// Read one packet and check that it is a response.
    ///
    /// `limit` shortens the configured read timeout for this read only.
    fn read_response_packet(&mut self, limit: Option<Duration>) -> Result<(Bytes, CommandId)> {
        let read_timeout = match (self.reader.config().read_timeout, limit) {
            (Some(configured), Some(limit)) => Some(configured.min(limit)),
            (configured, None) => configured,
            (None, limit) => limit,
        }
        .map(|timeout| timeout.max(MIN_SOCKET_TIMEOUT));
        self.reader.get_ref().set_read_timeout(read_timeout)?;

        let packet = self
            .reader
            .read_packet()
            .map_err(|err| read_error(err, read_timeout, "awaiting a response"))?;

        let (command_id, kind) = header(&packet)?;
        if kind != MessageKind::Response {
            return Err(PeerError::Sequencing {
                expected: MessageKind::Response,
                actual: kind,
                command_id,
            });
        }

        Ok((packet, command_id))
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    pub fn into_parts(self) -> (PacketReader<R>, PacketWriter<W>) {
        (self.reader, self.writer)
    }
}
