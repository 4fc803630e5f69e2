//! Per-connection handler abstraction.
//!
//! The listener never runs application logic itself. Each accepted
//! connection gets a fresh [`ConnectionHandler`] value built by a
//! [`HandlerFactory`], so concurrent connections share no mutable state.

use std::future::Future;
use std::pin::Pin;
use tokio::net::TcpStream;

/// Error type handlers may return. Failures stay inside the worker task
/// and never reach the accept loop.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Boxed future driving one connection to completion.
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<(), HandlerError>> + Send>>;

/// Behavior bound to exactly one accepted connection.
///
/// The handler consumes itself along with the stream: binding and
/// execution are a single operation, so a half-bound instance cannot
/// exist, and the value is dropped when the connection is done.
pub trait ConnectionHandler: Send + 'static {
    /// Take ownership of the accepted stream and drive it until the
    /// connection is finished.
    fn handle(self: Box<Self>, stream: TcpStream) -> HandlerFuture;
}

/// Builds one handler per accepted connection.
///
/// Invoked from the accept loop, concurrently with running handlers, so
/// implementations must be `Sync`. Each call must produce a value that
/// carries no mutable state shared with earlier instances.
pub trait HandlerFactory: Send + Sync + 'static {
    fn make(&self) -> Box<dyn ConnectionHandler>;
}

/// Adapts an async closure into a [`ConnectionHandler`].
///
/// Built with [`handler_fn`].
pub struct HandlerFn<F>(F);

/// Wrap an async closure as a connection handler.
pub fn handler_fn<F, Fut>(f: F) -> HandlerFn<F>
where
    F: FnOnce(TcpStream) -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    HandlerFn(f)
}

impl<F, Fut> ConnectionHandler for HandlerFn<F>
where
    F: FnOnce(TcpStream) -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    fn handle(self: Box<Self>, stream: TcpStream) -> HandlerFuture {
        Box::pin((self.0)(stream))
    }
}

/// Adapts a closure into a [`HandlerFactory`].
///
/// Built with [`factory_fn`].
pub struct FactoryFn<F>(F);

/// Wrap a closure as a handler factory. The closure runs once per
/// accepted connection.
pub fn factory_fn<F, H>(f: F) -> FactoryFn<F>
where
    F: Fn() -> H + Send + Sync + 'static,
    H: ConnectionHandler,
{
    FactoryFn(f)
}

impl<F, H> HandlerFactory for FactoryFn<F>
where
    F: Fn() -> H + Send + Sync + 'static,
    H: ConnectionHandler,
{
    fn make(&self) -> Box<dyn ConnectionHandler> {
        Box::new((self.0)())
    }
}

/// Factory that clones a prototype value for every connection.
///
/// The prototype itself is never run. The `Clone` bound is checked at
/// compile time, so there is no runtime "cannot copy" failure mode.
/// What a clone shares is the handler's own choice: a handler holding an
/// `Arc` shares that interior deliberately.
pub struct Prototype<H>(H);

impl<H> Prototype<H>
where
    H: ConnectionHandler + Clone + Sync,
{
    pub fn new(template: H) -> Self {
        Prototype(template)
    }
}

impl<H> HandlerFactory for Prototype<H>
where
    H: ConnectionHandler + Clone + Sync,
{
    fn make(&self) -> Box<dyn ConnectionHandler> {
        Box::new(self.0.clone())
    }
}
