use std::io::{Read, Write};

use headlink_frame::{
    header, CommandId, MessageKind, PacketReader, PacketWriter, Request, Response,
};
use tracing::debug;

use crate::error::{read_error, PeerError, Result};
use crate::interpreter::{Interpreter, RequestedConfiguration, StabilizationState};

/// Head side of a link: reads requests, interprets them, answers them.
pub struct HeadLink<R, W> {
    reader: PacketReader<R>,
    writer: PacketWriter<W>,
    interpreter: Interpreter,
}

impl<R: Read, W: Write> HeadLink<R, W> {
    pub fn new(reader: PacketReader<R>, writer: PacketWriter<W>) -> Self {
        Self {
            reader,
            writer,
            interpreter: Interpreter::new(),
        }
    }

    /// Read, decode and interpret the next request.
    ///
    /// A response packet on this link is a [`PeerError::Sequencing`] error.
    pub fn next_request(&mut self) -> Result<Request> {
        let read_timeout = self.reader.config().read_timeout;
        let packet = self
            .reader
            .read_packet()
            .map_err(|err| read_error(err, read_timeout, "awaiting a request"))?;

        let (command_id, kind) = header(&packet)?;
        if kind != MessageKind::Request {
            return Err(PeerError::Sequencing {
                expected: MessageKind::Request,
                actual: kind,
                command_id,
            });
        }

        let request = Request::decode(&packet)?;
        self.interpreter.apply(&request);
        Ok(request)
    }

    /// Read and interpret the next request, returning its command id.
    pub fn read_request(&mut self) -> Result<CommandId> {
        self.next_request().map(|request| request.command_id())
    }

    /// Send the outcome of a request back to the client.
    pub fn write_response(&mut self, response: Response) -> Result<()> {
        debug!(command = %response.command_id, status = %response.status, "writing response");
        self.writer.write_response(&response)?;
        Ok(())
    }

    pub fn requested_configuration(&self) -> &RequestedConfiguration {
        self.interpreter.requested_configuration()
    }

    pub fn stabilization(&self) -> StabilizationState {
        self.interpreter.stabilization()
    }

    /// Bytes dropped so far while resynchronizing on the request stream.
    pub fn dropped_bytes(&self) -> u64 {
        self.reader.dropped_bytes()
    }

    pub fn reader(&self) -> &PacketReader<R> {
        &self.reader
    }

    pub fn into_parts(self) -> (PacketReader<R>, PacketWriter<W>) {
        (self.reader, self.writer)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use headlink_frame::{FrameError, Rpy, Status};

    use super::*;
    use crate::interpreter::ControlMode;

    fn head(bytes: &[u8]) -> HeadLink<Cursor<Vec<u8>>, Cursor<Vec<u8>>> {
        HeadLink::new(
            PacketReader::new(Cursor::new(bytes.to_vec())),
            PacketWriter::new(Cursor::new(Vec::new())),
        )
    }

    #[test]
    fn interprets_requests_in_order() {
        let mut bytes = vec![0x07, 0x00, 0x00, 0x00, 0x00, 0x29];
        bytes.extend_from_slice(&[0x06, 0x00, 0x00, 0x39, 0x01, 0x73, 0x00, 0xAC, 0xC6]);
        let mut link = head(&bytes);

        assert_eq!(link.read_request().unwrap(), CommandId::EnableStabilization);
        assert_eq!(link.read_request().unwrap(), CommandId::AngularVelocity);

        let config = link.requested_configuration();
        assert_eq!(config.control_mode, ControlMode::AngularVelocityRelative);
        assert!(config.rpy.approx_eq(&Rpy::new(0.300197, -0.200713, 0.09948), 1e-4));
        assert!(!link.stabilization().is_enabled());
    }

    #[test]
    fn response_where_request_expected_is_a_sequencing_error() {
        let mut link = head(&[0x05, 0x01, 0x01, 0xD2]);
        let err = link.read_request().unwrap_err();
        assert!(matches!(
            err,
            PeerError::Sequencing {
                expected: MessageKind::Request,
                actual: MessageKind::Response,
                command_id: CommandId::AnglesGeo,
            }
        ));
        assert_eq!(link.requested_configuration().command_id, None);
    }

    #[test]
    fn skips_noise_before_a_request() {
        let mut link = head(&[0xF0, 0xAA, 0x00, 0x00, 0x00]);
        assert_eq!(link.read_request().unwrap(), CommandId::Stop);
        assert_eq!(link.dropped_bytes(), 2);
    }

    #[test]
    fn undecodable_request_is_a_frame_error() {
        let mut bytes = vec![0x03, 0x00, 0x09];
        bytes.push(headlink_frame::codec::compute_checksum(&bytes));
        let mut link = head(&bytes);
        assert!(matches!(
            link.read_request(),
            Err(PeerError::Frame(FrameError::InvalidField { field: "rate", .. }))
        ));
    }

    #[test]
    fn end_of_stream_is_a_disconnect() {
        let mut link = head(&[]);
        assert!(matches!(link.read_request(), Err(PeerError::Disconnected(_))));
    }

    #[test]
    fn writes_checksummed_responses() {
        let mut link = head(&[]);
        link.write_response(Response::new(CommandId::AnglesGeo, Status::Failed))
            .unwrap();
        assert!(matches!(
            link.write_response(Response::new(CommandId::Stop, Status::Timeout)),
            Err(PeerError::Frame(FrameError::LocalStatus(Status::Timeout)))
        ));

        let (_, writer) = link.into_parts();
        assert_eq!(
            writer.into_inner().into_inner(),
            [0x05, 0x01, 0x01, 0xD2]
        );
    }
}
