use std::fmt::Debug;
use std::net::ToSocketAddrs;

use headlink_frame::{FrameConfig, PacketReader, PacketWriter};
use headlink_transport::LinkStream;

use crate::client::ClientLink;
use crate::config::LinkConfig;
use crate::error::Result;

/// A client link over an established stream.
pub type TcpClientLink = ClientLink<LinkStream, LinkStream>;

/// Connect to a head over TCP with default timeouts.
pub fn connect(addr: impl ToSocketAddrs + Debug) -> Result<TcpClientLink> {
    connect_with_config(addr, &LinkConfig::default())
}

/// Connect to a head over TCP with explicit timeouts.
///
/// The connect attempt itself is bounded by the write timeout.
pub fn connect_with_config(
    addr: impl ToSocketAddrs + Debug,
    config: &LinkConfig,
) -> Result<TcpClientLink> {
    let stream = headlink_transport::connect_tcp(addr, config.write_timeout)?;
    client_over(stream, config)
}

/// Build a client link over an already connected stream.
pub fn client_over(stream: LinkStream, config: &LinkConfig) -> Result<TcpClientLink> {
    let (reader, writer) = split_link(stream, config.client_frame_config())?;
    Ok(ClientLink::new(reader, writer, config.clone()))
}

/// Split one stream into a reader and a writer half with timeouts applied.
pub(crate) fn split_link(
    stream: LinkStream,
    frame_config: FrameConfig,
) -> Result<(PacketReader<LinkStream>, PacketWriter<LinkStream>)> {
    let reader_stream = stream.try_clone()?;
    let reader = PacketReader::with_config_link(reader_stream, frame_config.clone())?;
    let writer = PacketWriter::with_config_link(stream, frame_config)?;
    Ok((reader, writer))
}
