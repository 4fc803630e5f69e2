//! doorman: a small TCP accept/dispatch server core.
//!
//! The crate is the concurrency and lifecycle shell around `accept(2)`:
//! - [`Listener`] owns the bound socket and the accept loop
//! - [`WorkerPool`] runs one task per accepted connection
//! - [`HandlerFactory`] builds an independent [`ConnectionHandler`] for
//!   every connection
//! - [`Connector`] is the matching client-side connect/disconnect glue
//!
//! No application protocol is imposed; [`protocols`] ships echo and ping
//! handlers for smoke testing.

pub mod client;
pub mod config;
pub mod error;
pub mod handler;
pub mod pool;
pub mod protocols;
pub mod server;

pub use client::Connector;
pub use error::Error;
pub use handler::{factory_fn, handler_fn, ConnectionHandler, HandlerFactory, Prototype};
pub use pool::WorkerPool;
pub use server::{Lifecycle, Listener, ListenerConfig};
