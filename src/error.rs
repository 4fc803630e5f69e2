//! Error types for the server core and the client glue.

use std::io;
use std::net::SocketAddr;
use thiserror::Error;

/// Errors surfaced by [`Listener`](crate::Listener) and
/// [`Connector`](crate::Connector).
#[derive(Debug, Error)]
pub enum Error {
    /// Configured port is outside the range `1..=65535`.
    #[error("invalid port {0}: must be in 1..=65535")]
    InvalidPort(u32),

    /// The OS refused to bind or listen on the configured address.
    #[error("failed to bind {addr}")]
    BindFailure {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// `start` was called on a listener that is already running or has
    /// already stopped. A stopped listener is not restartable.
    #[error("listener already started")]
    AlreadyStarted,

    /// The accept loop did not confirm termination within the shutdown
    /// grace period. The listener state must be checked independently.
    #[error("accept loop did not confirm termination")]
    ShutdownIncomplete,

    /// An outbound connection could not be established.
    #[error("could not connect to {addr}")]
    ConnectionFailure {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// An outbound connection could not be torn down cleanly.
    #[error("could not disconnect from {addr}")]
    CannotDisconnect {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
}
