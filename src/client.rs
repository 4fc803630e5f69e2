//! Client-side connect/disconnect glue.
//!
//! The listener core only ever needs "open a connection, then tear it
//! down" from the outside world. [`Connector`] packages that for tests,
//! probes, and callers driving a listener remotely.

use crate::error::Error;
use std::io;
use std::net::{IpAddr, SocketAddr};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

/// A single outbound TCP connection with explicit setup and teardown.
pub struct Connector {
    addr: SocketAddr,
    stream: Option<TcpStream>,
}

impl Connector {
    pub fn new(host: IpAddr, port: u16) -> Self {
        Connector {
            addr: SocketAddr::new(host, port),
            stream: None,
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Establish the connection.
    ///
    /// Fails with [`Error::ConnectionFailure`] if the peer is
    /// unreachable or refuses.
    pub async fn connect(&mut self) -> Result<(), Error> {
        let stream = TcpStream::connect(self.addr)
            .await
            .map_err(|source| Error::ConnectionFailure {
                addr: self.addr,
                source,
            })?;
        self.stream = Some(stream);
        Ok(())
    }

    /// Shut down the write half and drop the connection.
    ///
    /// Fails with [`Error::CannotDisconnect`], also when no connection
    /// is active.
    pub async fn disconnect(&mut self) -> Result<(), Error> {
        let mut stream = self.stream.take().ok_or_else(|| Error::CannotDisconnect {
            addr: self.addr,
            source: io::ErrorKind::NotConnected.into(),
        })?;
        stream
            .shutdown()
            .await
            .map_err(|source| Error::CannotDisconnect {
                addr: self.addr,
                source,
            })
    }

    /// Access the live stream for reads and writes.
    pub fn stream_mut(&mut self) -> Option<&mut TcpStream> {
        self.stream.as_mut()
    }
}
