//! Wire layer of the headlink sensor-head control protocol.
//!
//! Every packet on the wire is laid out as:
//! - a 1-byte command id and a 1-byte message kind (request/response)
//! - a fixed-size payload, its size a pure function of the header
//! - a 1-byte CRC-8/SMBUS checksum over header and payload
//!
//! There are no delimiters and no length fields. [`PacketReader`] recovers
//! packet boundaries from a raw byte stream by dropping one byte at a time
//! until the header and checksum line up again.

pub mod codec;
pub mod error;
pub mod framer;
pub mod packet;
pub mod protocol;
pub mod reader;
pub mod writer;

#[cfg(feature = "async")]
pub mod async_codec;

#[cfg(feature = "async")]
pub use async_codec::HeadCodec;
pub use error::{FrameError, Result};
pub use framer::{extract_packet, FrameConfig, FrameResult, Framer, InvalidReason, PacketFramer};
pub use packet::{
    decode_request, decode_response, header, GeoTarget, Packet, Request, Response, Rpy,
    StabilizationAxes,
};
pub use protocol::{
    packet_size, CommandId, MessageKind, Rate, Status, CHECKSUM_SIZE, HEADER_SIZE,
    MAX_PACKET_SIZE, MIN_PACKET_SIZE,
};
pub use reader::PacketReader;
pub use writer::PacketWriter;
