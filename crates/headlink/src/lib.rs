//! Binary control protocol for stabilized sensor heads.
//!
//! A controller drives a gimbal-like head (roll/pitch/yaw pose and rate
//! channels) over any duplex byte stream. Each request is acknowledged by a
//! status response; packets carry no delimiters and are recovered from the
//! stream by header lookup and a CRC-8 check.
//!
//! # Crate Structure
//!
//! - [`transport`]: TCP and Unix stream links with read/write timeouts
//! - [`frame`]: Packet layouts, fixed-point codec, resynchronizing framer
//! - [`peer`]: Command interpreter, head and client links (behind `peer` feature)

/// Re-export transport types.
pub mod transport {
    pub use headlink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use headlink_frame::*;
}

/// Re-export peer types (requires `peer` feature).
#[cfg(feature = "peer")]
pub mod peer {
    pub use headlink_peer::*;
}
