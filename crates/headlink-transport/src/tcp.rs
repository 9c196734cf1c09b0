use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::LinkStream;

/// TCP listener handing out one [`LinkStream`] per accepted client.
///
/// The protocol assumes one controller per head, so callers usually accept
/// a client, serve it until it disconnects, and only then accept again.
pub struct TcpLinkListener {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl TcpLinkListener {
    /// Bind and listen on a TCP address (e.g. `0.0.0.0:17001`).
    ///
    /// Port `0` picks an ephemeral port; see [`TcpLinkListener::local_addr`].
    pub fn bind(addr: impl ToSocketAddrs + std::fmt::Debug) -> Result<Self> {
        let addr_label = format!("{addr:?}");
        let listener = TcpListener::bind(&addr).map_err(|e| TransportError::Bind {
            addr: addr_label.clone(),
            source: e,
        })?;
        let local_addr = listener.local_addr().map_err(|e| TransportError::Bind {
            addr: addr_label,
            source: e,
        })?;

        info!(%local_addr, "listening for head links");

        Ok(Self {
            listener,
            local_addr,
        })
    }

    /// Accept the next client (blocking).
    pub fn accept(&self) -> Result<LinkStream> {
        let (stream, peer) = self.listener.accept().map_err(TransportError::Accept)?;
        accepted(stream, peer)
    }

    /// Accept a client if one is already waiting, without blocking.
    pub fn try_accept(&self) -> Result<Option<LinkStream>> {
        self.listener
            .set_nonblocking(true)
            .map_err(TransportError::Accept)?;
        let result = self.listener.accept();
        self.listener
            .set_nonblocking(false)
            .map_err(TransportError::Accept)?;

        match result {
            Ok((stream, peer)) => accepted(stream, peer).map(Some),
            Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => Ok(None),
            Err(err) => Err(TransportError::Accept(err)),
        }
    }

    /// The address the listener is actually bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

fn accepted(stream: TcpStream, peer: SocketAddr) -> Result<LinkStream> {
    // Some platforms hand out sockets that inherit the listener's mode.
    stream.set_nonblocking(false).map_err(TransportError::Accept)?;
    stream.set_nodelay(true).map_err(TransportError::Accept)?;
    debug!(%peer, "accepted link");
    Ok(LinkStream::from(stream))
}

/// Connect to a listening head over TCP.
///
/// With a `timeout`, each resolved address is tried with that connect
/// timeout in turn; the last failure is reported.
pub fn connect_tcp(
    addr: impl ToSocketAddrs + std::fmt::Debug,
    timeout: Option<Duration>,
) -> Result<LinkStream> {
    let addr_label = format!("{addr:?}");
    let connect_err = |source| TransportError::Connect {
        addr: addr_label.clone(),
        source,
    };

    let stream = match timeout {
        None => TcpStream::connect(&addr).map_err(connect_err)?,
        Some(timeout) => {
            let mut last_err = std::io::Error::new(
                std::io::ErrorKind::AddrNotAvailable,
                "address resolved to nothing",
            );
            let mut connected = None;
            for candidate in addr.to_socket_addrs().map_err(connect_err)? {
                match TcpStream::connect_timeout(&candidate, timeout) {
                    Ok(stream) => {
                        connected = Some(stream);
                        break;
                    }
                    Err(err) => last_err = err,
                }
            }
            connected.ok_or_else(|| connect_err(last_err))?
        }
    };

    stream.set_nodelay(true)?;
    debug!(addr = %addr_label, "connected link");
    Ok(LinkStream::from(stream))
}
