//! Shared helpers for integration tests.

use doorman::handler::{factory_fn, handler_fn, HandlerError, HandlerFactory};
use std::net::TcpListener as StdTcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;

/// Reserve a free loopback port by binding to port 0 and releasing it.
pub fn free_port() -> u32 {
    let listener = StdTcpListener::bind(("127.0.0.1", 0)).expect("bind ephemeral port");
    listener.local_addr().expect("local addr").port() as u32
}

/// Factory whose handlers bump a shared counter, then drain the
/// connection until the peer closes it.
pub fn counting_factory(hits: Arc<AtomicUsize>) -> impl HandlerFactory {
    factory_fn(move || {
        let hits = Arc::clone(&hits);
        handler_fn(move |mut stream: TcpStream| async move {
            hits.fetch_add(1, Ordering::SeqCst);
            let mut buf = [0u8; 256];
            while stream.read(&mut buf).await? > 0 {}
            Ok::<(), HandlerError>(())
        })
    })
}

/// Poll `cond` every 10ms until it holds or `deadline` elapses.
pub async fn wait_until(deadline: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}
