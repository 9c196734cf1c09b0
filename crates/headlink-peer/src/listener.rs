use std::fmt::Debug;
use std::net::{SocketAddr, ToSocketAddrs};

use headlink_transport::{LinkStream, TcpLinkListener};
use tracing::info;

use crate::config::LinkConfig;
use crate::connector::split_link;
use crate::error::Result;
use crate::head::HeadLink;

/// A head link over an accepted stream.
pub type TcpHeadLink = HeadLink<LinkStream, LinkStream>;

impl TcpHeadLink {
    /// Address of the connected controller, when known.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.reader().get_ref().peer_addr()
    }
}

/// Listens for controllers and hands out one [`HeadLink`] per connection.
///
/// Each accepted link gets a fresh interpreter session.
pub struct HeadListener {
    listener: TcpLinkListener,
    config: LinkConfig,
}

impl HeadListener {
    /// Bind to a TCP address.
    pub fn bind(addr: impl ToSocketAddrs + Debug) -> Result<Self> {
        let listener = TcpLinkListener::bind(addr)?;
        Ok(Self {
            listener,
            config: LinkConfig::default(),
        })
    }

    /// Override link timeouts for subsequently accepted links.
    pub fn with_config(mut self, config: LinkConfig) -> Self {
        self.config = config;
        self
    }

    /// Accept the next controller (blocking).
    pub fn accept(&self) -> Result<TcpHeadLink> {
        let stream = self.listener.accept()?;
        self.session(stream)
    }

    /// Accept a controller if one is already waiting, without blocking.
    pub fn try_accept(&self) -> Result<Option<TcpHeadLink>> {
        match self.listener.try_accept()? {
            Some(stream) => self.session(stream).map(Some),
            None => Ok(None),
        }
    }

    fn session(&self, stream: LinkStream) -> Result<TcpHeadLink> {
        let peer = stream.peer_addr();
        let (reader, writer) = split_link(stream, self.config.head_frame_config())?;
        info!(peer = ?peer, "controller connected");
        Ok(HeadLink::new(reader, writer))
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.listener.local_addr()
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    use headlink_frame::{Request, Response, Rpy, StabilizationAxes, Status};

    use super::*;
    use crate::connector::connect;
    use crate::error::PeerError;
    use crate::interpreter::ControlMode;

    fn serve_until_disconnect(link: &mut TcpHeadLink) -> ControlMode {
        loop {
            match link.read_request() {
                Ok(command) => link
                    .write_response(Response::new(command, Status::Ok))
                    .expect("should answer"),
                Err(PeerError::Disconnected(_)) => break,
                Err(err) => panic!("unexpected error: {err}"),
            }
        }
        link.requested_configuration().control_mode
    }

    #[test]
    fn accepted_links_start_with_fresh_sessions() {
        let listener = HeadListener::bind("127.0.0.1:0").expect("listener should bind");
        let addr = listener.local_addr();

        let head = thread::spawn(move || {
            let mut modes = Vec::new();
            for _ in 0..2 {
                let mut link = listener.accept().expect("listener should accept");
                modes.push(serve_until_disconnect(&mut link));
            }
            modes
        });

        let rates = Request::AngularVelocity(Rpy::new(0.1, 0.0, 0.0));
        {
            let mut client = connect(addr).expect("first client should connect");
            let disable = Request::EnableStabilization(StabilizationAxes::all(false));
            assert_eq!(client.request(&disable).unwrap(), Status::Ok);
            assert_eq!(client.request(&rates).unwrap(), Status::Ok);
        }
        {
            let mut client = connect(addr).expect("second client should connect");
            assert_eq!(client.request(&rates).unwrap(), Status::Ok);
        }

        let modes = head.join().expect("head thread should finish");
        assert_eq!(
            modes,
            [
                ControlMode::AngularVelocityRelative,
                ControlMode::AngularVelocityGeo,
            ]
        );
    }

    #[test]
    fn try_accept_polls_for_controllers() {
        let listener = HeadListener::bind("127.0.0.1:0").expect("listener should bind");
        assert!(listener.try_accept().expect("poll should succeed").is_none());

        let addr = listener.local_addr();
        let client = thread::spawn(move || {
            let mut client = connect(addr).expect("client should connect");
            client.request(&Request::SelfTest).expect("request should complete")
        });

        let mut link = loop {
            if let Some(link) = listener.try_accept().expect("poll should succeed") {
                break link;
            }
            thread::sleep(Duration::from_millis(10));
        };
        let command = link.read_request().expect("request should arrive");
        link.write_response(Response::new(command, Status::Unsupported))
            .expect("should answer");
        assert_eq!(client.join().expect("client thread"), Status::Unsupported);
    }

    #[test]
    fn idle_head_read_times_out() {
        let config = LinkConfig::default().with_read_timeout(Some(Duration::from_millis(50)));
        let listener = HeadListener::bind("127.0.0.1:0")
            .expect("listener should bind")
            .with_config(config);
        let addr = listener.local_addr();

        let client = thread::spawn(move || {
            let client = connect(addr).expect("client should connect");
            thread::sleep(Duration::from_millis(300));
            drop(client);
        });

        let mut link = listener.accept().expect("listener should accept");
        assert!(link.peer_addr().is_some());
        assert!(matches!(link.read_request(), Err(PeerError::Timeout(_))));
        client.join().expect("client thread should finish");
    }
}
