use std::time::Duration;

use headlink_frame::{CommandId, FrameError, MessageKind};

/// Errors that can occur on a head or client link.
#[derive(Debug, thiserror::Error)]
pub enum PeerError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] headlink_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] headlink_frame::FrameError),

    /// The peer sent a request where a response was expected, or vice versa.
    #[error("protocol sequencing error: expected a {expected}, got a {actual} for {command_id}")]
    Sequencing {
        expected: MessageKind,
        actual: MessageKind,
        command_id: CommandId,
    },

    /// Peer disconnected.
    #[error("peer disconnected: {0}")]
    Disconnected(String),

    /// A blocking read timed out.
    #[error("read timed out after {0:?}")]
    Timeout(Duration),
}

pub type Result<T> = std::result::Result<T, PeerError>;

/// Translate a failed packet read on a link into a peer error.
pub(crate) fn read_error(
    err: FrameError,
    read_timeout: Option<Duration>,
    context: &str,
) -> PeerError {
    if err.is_timeout() {
        return PeerError::Timeout(read_timeout.unwrap_or_default());
    }
    match err {
        FrameError::ConnectionClosed => {
            PeerError::Disconnected(format!("connection closed while {context}"))
        }
        other => PeerError::Frame(other),
    }
}
