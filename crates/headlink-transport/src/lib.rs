//! Duplex byte links for the headlink control protocol.
//!
//! The protocol only needs a blocking byte stream with read and write
//! timeouts. This crate provides [`LinkStream`], a thin wrapper over:
//! - TCP streams (operator console to sensor head over Ethernet)
//! - Unix domain streams (local simulators, tests)
//!
//! This is the lowest layer of headlink. Everything else builds on top of
//! the [`LinkStream`] type provided here.

pub mod error;
pub mod tcp;
pub mod traits;

pub use error::{Result, TransportError};
pub use tcp::{connect_tcp, TcpLinkListener};
pub use traits::{LinkStream, ReadTimeout};
