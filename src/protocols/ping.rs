//! Line-based PING/PONG handler.

use crate::handler::{ConnectionHandler, HandlerFuture};
use bytes::BytesMut;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

const MAX_LINE_LENGTH: usize = 1024;

/// What a received line asks the handler to do.
#[derive(Debug, PartialEq, Eq)]
enum Reply {
    Pong(Option<String>),
    Quit,
    Unknown,
}

fn parse_line(line: &str) -> Reply {
    let trimmed = line.trim_end();

    if trimmed.eq_ignore_ascii_case("PING") {
        Reply::Pong(None)
    } else if let Some(message) = trimmed
        .strip_prefix("PING ")
        .or_else(|| trimmed.strip_prefix("ping "))
    {
        Reply::Pong(Some(message.to_string()))
    } else if trimmed.eq_ignore_ascii_case("QUIT") {
        Reply::Quit
    } else {
        Reply::Unknown
    }
}

/// Stateless health-check handler.
///
/// Responds to `PING` with `PONG`, echoes a message after `PING `, and
/// closes on `QUIT`.
#[derive(Clone, Copy, Default)]
pub struct PingHandler;

impl ConnectionHandler for PingHandler {
    fn handle(self: Box<Self>, stream: TcpStream) -> HandlerFuture {
        Box::pin(async move {
            let (reader, mut writer) = stream.into_split();
            let mut reader = BufReader::new(reader);
            let mut line = String::with_capacity(MAX_LINE_LENGTH);

            loop {
                line.clear();

                let n = reader.read_line(&mut line).await?;
                if n == 0 {
                    // EOF
                    break;
                }

                match parse_line(&line) {
                    Reply::Pong(None) => writer.write_all(b"PONG\r\n").await?,
                    Reply::Pong(Some(message)) => {
                        let mut resp = BytesMut::with_capacity(6 + message.len());
                        resp.extend_from_slice(b"PONG ");
                        resp.extend_from_slice(message.as_bytes());
                        resp.extend_from_slice(b"\r\n");
                        writer.write_all(&resp).await?;
                    }
                    Reply::Quit => {
                        writer.write_all(b"OK\r\n").await?;
                        break;
                    }
                    Reply::Unknown => writer.write_all(b"ERROR unknown command\r\n").await?,
                }
            }

            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_ping_pongs() {
        assert_eq!(parse_line("PING\r\n"), Reply::Pong(None));
        assert_eq!(parse_line("ping\n"), Reply::Pong(None));
    }

    #[test]
    fn ping_with_message_echoes_it() {
        assert_eq!(
            parse_line("PING hello\r\n"),
            Reply::Pong(Some("hello".to_string()))
        );
        assert_eq!(
            parse_line("ping hello\r\n"),
            Reply::Pong(Some("hello".to_string()))
        );
    }

    #[test]
    fn quit_and_garbage() {
        assert_eq!(parse_line("QUIT\r\n"), Reply::Quit);
        assert_eq!(parse_line("quit\n"), Reply::Quit);
        assert_eq!(parse_line("FETCH key\r\n"), Reply::Unknown);
        assert_eq!(parse_line("\r\n"), Reply::Unknown);
    }
}
