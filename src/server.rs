//! TCP listener lifecycle: bind, accept loop, dispatch, shutdown.
//!
//! A [`Listener`] owns the bound socket and the accept loop. Each
//! accepted connection is handed to the [`WorkerPool`] as an independent
//! handler instance. Stopping the listener only affects future accepts,
//! never in-flight connections.

use crate::error::Error;
use crate::handler::HandlerFactory;
use crate::pool::WorkerPool;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::time;
use tracing::{debug, info, warn};

/// Accept backlog passed to `listen(2)`.
const BACKLOG: i32 = 1024;

/// How long `stop` waits for the accept loop to confirm termination.
const STOP_GRACE: Duration = Duration::from_secs(5);

/// Validated listening address.
#[derive(Debug, Clone)]
pub struct ListenerConfig {
    host: IpAddr,
    port: u16,
}

impl ListenerConfig {
    /// Validate the port once; the config is immutable afterwards.
    ///
    /// Port 0 and anything above 65535 are rejected with
    /// [`Error::InvalidPort`].
    pub fn new(port: u32) -> Result<Self, Error> {
        if port == 0 || port > u16::MAX as u32 {
            return Err(Error::InvalidPort(port));
        }
        Ok(ListenerConfig {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: port as u16,
        })
    }

    /// Bind to a specific interface instead of loopback.
    pub fn with_host(mut self, host: IpAddr) -> Self {
        self.host = host;
        self
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Lifecycle of a listener.
///
/// One-shot: `Stopped` is terminal, restarting means building a new
/// listener. A failed bind returns to `Idle` since the loop never began.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Idle,
    Running,
    Stopped,
}

/// Owns the bound socket and the accept loop.
///
/// `start` occupies the calling task for the loop's entire duration;
/// `stop` is called from another task and signals the loop to exit.
pub struct Listener {
    config: ListenerConfig,
    factory: Arc<dyn HandlerFactory>,
    pool: WorkerPool,
    shutdown: watch::Sender<bool>,
    state: watch::Sender<Lifecycle>,
}

impl Listener {
    /// Build a listener from a validated config and a handler factory.
    ///
    /// No socket is opened here; that happens in [`start`](Self::start).
    pub fn new(config: ListenerConfig, factory: impl HandlerFactory) -> Self {
        let (shutdown, _) = watch::channel(false);
        let (state, _) = watch::channel(Lifecycle::Idle);
        Listener {
            config,
            factory: Arc::new(factory),
            pool: WorkerPool::new(),
            shutdown,
            state,
        }
    }

    pub fn port(&self) -> u16 {
        self.config.port()
    }

    pub fn state(&self) -> Lifecycle {
        *self.state.borrow()
    }

    pub fn is_running(&self) -> bool {
        self.state() == Lifecycle::Running
    }

    /// Handlers currently executing on the pool.
    pub fn active_connections(&self) -> usize {
        self.pool.active()
    }

    /// Bind the configured address and run the accept loop.
    ///
    /// Occupies the calling task until [`stop`](Self::stop) is invoked
    /// from elsewhere or an accept error ends the loop. Both of those
    /// terminations return `Ok`; only a failed bind or a listener that
    /// is not idle is an error.
    pub async fn start(&self) -> Result<(), Error> {
        let entered = self.state.send_if_modified(|s| {
            if *s == Lifecycle::Idle {
                *s = Lifecycle::Running;
                true
            } else {
                false
            }
        });
        if !entered {
            return Err(Error::AlreadyStarted);
        }

        let addr = self.config.addr();
        let socket = match bind_listener(addr) {
            Ok(socket) => socket,
            Err(source) => {
                // The loop never began; the listener may be started again
                // once the address frees up.
                self.state.send_replace(Lifecycle::Idle);
                return Err(Error::BindFailure { addr, source });
            }
        };
        info!(addr = %addr, "listener bound");

        let mut shutdown = self.shutdown.subscribe();
        loop {
            tokio::select! {
                biased;
                _ = shutdown.wait_for(|stop| *stop) => {
                    debug!("shutdown signal received");
                    break;
                }
                accepted = socket.accept() => match accepted {
                    Ok((stream, peer)) => {
                        debug!(peer = %peer, "connection accepted");
                        let handler = self.factory.make();
                        self.pool.submit(async move {
                            if let Err(e) = handler.handle(stream).await {
                                debug!(error = %e, "connection handler failed");
                            }
                        });
                    }
                    Err(e) => {
                        warn!(error = %e, "accept failed, stopping listener");
                        break;
                    }
                },
            }
        }

        // Close the socket before publishing Stopped, so a confirmed stop
        // means the port is released.
        drop(socket);
        self.state.send_replace(Lifecycle::Stopped);
        info!(dispatched = self.pool.dispatched(), "listener stopped");
        Ok(())
    }

    /// Ask the accept loop to terminate and wait for confirmation.
    ///
    /// Idempotent: stopping an idle or already-stopped listener returns
    /// `Ok` immediately. [`Error::ShutdownIncomplete`] means the signal
    /// was sent but the loop did not confirm within the grace period, so
    /// the listener state must be checked independently.
    pub async fn stop(&self) -> Result<(), Error> {
        if self.state() == Lifecycle::Idle {
            return Ok(());
        }
        // send_replace stores the value even with no subscriber yet, so a
        // stop racing the loop's own startup is not lost.
        self.shutdown.send_replace(true);

        let mut state = self.state.subscribe();
        let result = match time::timeout(STOP_GRACE, state.wait_for(|s| *s == Lifecycle::Stopped)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(_)) | Err(_) => Err(Error::ShutdownIncomplete),
        };
        result
    }
}

/// Create the listening socket.
///
/// `SO_REUSEADDR` keeps a fast restart from failing while the previous
/// socket lingers in `TIME_WAIT`.
fn bind_listener(addr: SocketAddr) -> std::io::Result<TcpListener> {
    let socket = socket2::Socket::new(
        match addr {
            SocketAddr::V4(_) => socket2::Domain::IPV4,
            SocketAddr::V6(_) => socket2::Domain::IPV6,
        },
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(BACKLOG)?;

    TcpListener::from_std(socket.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{factory_fn, handler_fn, HandlerError};

    fn noop_factory() -> impl HandlerFactory {
        factory_fn(|| handler_fn(|_stream| async { Ok::<(), HandlerError>(()) }))
    }

    #[test]
    fn ports_in_range_are_accepted() {
        for port in [1u32, 80, 7878, 65535] {
            let config = ListenerConfig::new(port).unwrap();
            assert_eq!(config.port() as u32, port);
        }
    }

    #[test]
    fn ports_out_of_range_are_rejected() {
        for port in [0u32, 65536, 70000, u32::MAX] {
            assert!(matches!(
                ListenerConfig::new(port),
                Err(Error::InvalidPort(p)) if p == port
            ));
        }
    }

    #[test]
    fn default_host_is_loopback() {
        let config = ListenerConfig::new(7878).unwrap();
        assert_eq!(config.addr().ip(), IpAddr::V4(Ipv4Addr::LOCALHOST));

        let config = config.with_host(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert_eq!(config.addr().ip(), IpAddr::V4(Ipv4Addr::UNSPECIFIED));
    }

    #[test]
    fn stop_before_start_is_a_no_op() {
        let listener = Listener::new(ListenerConfig::new(7878).unwrap(), noop_factory());
        tokio_test::block_on(async {
            listener.stop().await.unwrap();
        });
        assert_eq!(listener.state(), Lifecycle::Idle);
    }

    #[test]
    fn a_new_listener_is_idle() {
        let listener = Listener::new(ListenerConfig::new(7878).unwrap(), noop_factory());
        assert_eq!(listener.state(), Lifecycle::Idle);
        assert!(!listener.is_running());
        assert_eq!(listener.active_connections(), 0);
    }
}
