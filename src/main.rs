//! doorman server binary.
//!
//! Binds the configured port and serves the selected built-in handler
//! until Ctrl-C.

use doorman::config::{Config, HandlerKind};
use doorman::protocols::{EchoHandler, PingHandler};
use doorman::{factory_fn, Listener, ListenerConfig};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load()?;

    // Initialize logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    info!(
        host = %config.host,
        port = config.port,
        handler = ?config.handler,
        "starting doorman"
    );

    let listener_config = ListenerConfig::new(config.port)?.with_host(config.host);
    let listener = match config.handler {
        HandlerKind::Echo => Arc::new(Listener::new(listener_config, factory_fn(EchoHandler::new))),
        HandlerKind::Ping => Arc::new(Listener::new(listener_config, factory_fn(|| PingHandler))),
    };

    let accept_loop = {
        let listener = Arc::clone(&listener);
        tokio::spawn(async move { listener.start().await })
    };

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");

    listener.stop().await?;
    accept_loop.await??;

    info!(
        in_flight = listener.active_connections(),
        "accept loop terminated"
    );
    Ok(())
}
