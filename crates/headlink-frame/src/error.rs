use crate::protocol::MessageKind;

/// Errors that can occur during packet encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The command id byte does not name a known command.
    #[error("unknown command id 0x{0:02X}")]
    UnknownCommand(u8),

    /// The message kind byte is neither request nor response.
    #[error("unknown message kind 0x{0:02X}")]
    UnknownMessageKind(u8),

    /// The slice handed to a decoder is not exactly one packet long.
    #[error("packet length mismatch ({actual} bytes, expected {expected})")]
    LengthMismatch { expected: usize, actual: usize },

    /// The trailing checksum does not match header and payload.
    #[error("checksum mismatch (packet carries 0x{expected:02X}, computed 0x{actual:02X})")]
    ChecksumMismatch { expected: u8, actual: u8 },

    /// A request was decoded where a response was expected, or vice versa.
    #[error("expected a {expected} packet but got a {actual}")]
    UnexpectedKind {
        expected: MessageKind,
        actual: MessageKind,
    },

    /// A payload byte holds a value outside its enumeration.
    #[error("invalid {field} byte 0x{value:02X}")]
    InvalidField { field: &'static str, value: u8 },

    /// A physical value cannot be represented in its wire encoding.
    #[error("{field} value {value} cannot be encoded")]
    ValueOutOfRange { field: &'static str, value: f64 },

    /// The status exists only locally and is never transmitted.
    #[error("status {0} is local-only and cannot be encoded")]
    LocalStatus(crate::protocol::Status),

    /// An I/O error occurred while reading or writing packets.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection was closed before a complete packet was received.
    #[error("connection closed (incomplete packet)")]
    ConnectionClosed,
}

impl FrameError {
    /// True if this is a read or write timeout reported by the stream.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            FrameError::Io(err)
                if err.kind() == std::io::ErrorKind::WouldBlock
                    || err.kind() == std::io::ErrorKind::TimedOut
        )
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
