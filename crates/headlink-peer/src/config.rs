use std::time::Duration;

use headlink_frame::FrameConfig;

/// Default stream read/write timeout.
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(10);

/// Default time a client waits for the response to one request.
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(10);

pub(crate) const MIN_SOCKET_TIMEOUT: Duration = Duration::from_millis(1);

/// Timeouts applied to a head or client link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkConfig {
    /// Read timeout on the underlying stream. `None` blocks forever.
    pub read_timeout: Option<Duration>,
    /// Write timeout on the underlying stream. `None` blocks forever.
    pub write_timeout: Option<Duration>,
    /// How long [`crate::ClientLink::request`] waits for a matching response.
    pub response_timeout: Duration,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            read_timeout: Some(DEFAULT_IO_TIMEOUT),
            write_timeout: Some(DEFAULT_IO_TIMEOUT),
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
        }
    }
}

impl LinkConfig {
    pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn with_write_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.write_timeout = timeout;
        self
    }

    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    /// Stream timeouts for a head link, as configured.
    pub fn head_frame_config(&self) -> FrameConfig {
        FrameConfig {
            read_timeout: self.read_timeout,
            write_timeout: self.write_timeout,
        }
    }

    /// Stream timeouts for a client. Reads never block past the response
    /// timeout.
    pub fn client_frame_config(&self) -> FrameConfig {
        let read_timeout = match self.read_timeout {
            Some(timeout) => timeout.min(self.response_timeout),
            None => self.response_timeout,
        };
        FrameConfig {
            // Sockets reject a zero timeout.
            read_timeout: Some(read_timeout.max(MIN_SOCKET_TIMEOUT)),
            write_timeout: self.write_timeout,
        }
    }
}
