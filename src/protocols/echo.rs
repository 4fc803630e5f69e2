//! Byte-stream echo handler.

use crate::handler::{ConnectionHandler, HandlerFuture};
use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::trace;

/// Read buffer size
const BUFFER_SIZE: usize = 4 * 1024;

/// Echoes every byte it reads until the peer closes the connection.
///
/// No framing is applied. Each connection gets its own instance and
/// therefore its own buffer.
#[derive(Clone)]
pub struct EchoHandler {
    buffer: BytesMut,
}

impl EchoHandler {
    pub fn new() -> Self {
        EchoHandler {
            buffer: BytesMut::with_capacity(BUFFER_SIZE),
        }
    }
}

impl Default for EchoHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionHandler for EchoHandler {
    fn handle(mut self: Box<Self>, stream: TcpStream) -> HandlerFuture {
        Box::pin(async move {
            let (mut reader, mut writer) = stream.into_split();

            loop {
                self.buffer.clear();
                let n = reader.read_buf(&mut self.buffer).await?;
                if n == 0 {
                    trace!("connection closed by client");
                    return Ok(());
                }
                writer.write_all(&self.buffer).await?;
            }
        })
    }
}
