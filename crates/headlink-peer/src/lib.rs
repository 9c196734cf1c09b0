//! Head and controller ends of a headlink connection.
//!
//! [`HeadLink`] reads requests and feeds them through the [`Interpreter`],
//! which keeps the requested configuration and the stabilization state for
//! one link. [`ClientLink`] sends one request at a time and waits for the
//! matching response, turning an elapsed wait into [`Status::Timeout`].
//!
//! [`Status::Timeout`]: headlink_frame::Status::Timeout

pub mod client;
pub mod config;
pub mod connector;
pub mod error;
pub mod head;
pub mod interpreter;
pub mod listener;

pub use client::ClientLink;
pub use config::{LinkConfig, DEFAULT_IO_TIMEOUT, DEFAULT_RESPONSE_TIMEOUT};
pub use connector::{client_over, connect, connect_with_config, TcpClientLink};
pub use error::{PeerError, Result};
pub use head::HeadLink;
pub use interpreter::{
    interpret, ControlMode, Interpreter, RequestedConfiguration, StabilizationState,
};
pub use listener::{HeadListener, TcpHeadLink};
