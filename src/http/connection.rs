use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::handler::Dispatcher;
use crate::http::body::complete_body;
use crate::http::parser::{ParseError, find_headers_end, parse_http_request};
use crate::http::request::Request;
use crate::http::writer::ResponseWriter;

/// Per-connection read limits.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionSettings {
    /// Size of each socket read
    pub read_buffer_size: usize,
    /// Largest header block accepted before the blank line
    pub max_header_size: usize,
    /// How long to wait for the next request; `None` waits forever
    pub idle_timeout: Option<Duration>,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            read_buffer_size: 2048,
            max_header_size: 64 * 1024,
            idle_timeout: None,
        }
    }
}

pub struct Connection<S> {
    stream: S,
    peer: SocketAddr,
    buffer: BytesMut,
    state: ConnectionState,
    dispatcher: Arc<Dispatcher>,
    settings: ConnectionSettings,
}

#[derive(Debug)]
pub enum ConnectionState {
    Reading,
    Processing(Request),
    Writing(ResponseWriter),
    Closed,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(
        stream: S,
        peer: SocketAddr,
        dispatcher: Arc<Dispatcher>,
        settings: ConnectionSettings,
    ) -> Self {
        Self {
            stream,
            peer,
            buffer: BytesMut::with_capacity(settings.read_buffer_size),
            state: ConnectionState::Reading,
            dispatcher,
            settings,
        }
    }

    /// Serves requests until the peer closes the connection.
    ///
    /// Malformed framing and failed handlers close the connection and are
    /// not reported as errors; socket failures are.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            match &mut self.state {
                ConnectionState::Reading => {
                    self.state = match self.next_request().await {
                        Ok(Some(req)) => ConnectionState::Processing(req),
                        Ok(None) => ConnectionState::Closed,
                        Err(ParseError::Io { source }) => return Err(source.into()),
                        Err(e) => {
                            tracing::warn!(peer = %self.peer, error = %e, "malformed request, closing connection");
                            ConnectionState::Closed
                        }
                    };
                }

                ConnectionState::Processing(req) => {
                    self.state = match self.dispatcher.dispatch(req, self.peer).await {
                        Ok(response) => ConnectionState::Writing(ResponseWriter::new(&response)),
                        Err(e) => {
                            tracing::error!(peer = %self.peer, error = %e, "handler failed, closing connection");
                            ConnectionState::Closed
                        }
                    };
                }

                ConnectionState::Writing(writer) => {
                    writer.write_to_stream(&mut self.stream).await?;
                    self.state = ConnectionState::Reading; // go back for next request
                }

                ConnectionState::Closed => {
                    break;
                }
            }
        }

        // the peer may already be gone
        let _ = self.stream.shutdown().await;
        Ok(())
    }

    /// Waits for the next request, honouring the idle timeout.
    async fn next_request(&mut self) -> Result<Option<Request>, ParseError> {
        match self.settings.idle_timeout {
            None => self.read_request().await,
            Some(limit) => match tokio::time::timeout(limit, self.read_request()).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::debug!(peer = %self.peer, "idle timeout, closing connection");
                    Ok(None)
                }
            },
        }
    }

    /// Reads one complete request.
    ///
    /// Returns `None` once the peer closes the connection. Bytes received
    /// past the end of the request stay buffered for the next call. A head
    /// left in the buffer without its blank line when the peer stops
    /// sending is still parsed and answered.
    pub async fn read_request(&mut self) -> Result<Option<Request>, ParseError> {
        loop {
            if let Some(end) = find_headers_end(&self.buffer) {
                return self.finish_request(end + 4).await.map(Some);
            }

            if self.buffer.len() > self.settings.max_header_size {
                return Err(ParseError::HeadersTooLarge {
                    limit: self.settings.max_header_size,
                });
            }

            // Read more data
            let mut temp = vec![0u8; self.settings.read_buffer_size.max(1)];
            let n = self.stream.read(&mut temp).await?;

            if n == 0 {
                // Client closed connection
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                tracing::debug!(peer = %self.peer, pending = self.buffer.len(), "peer closed before blank line");
                let head_len = self.buffer.len();
                return self.finish_request(head_len).await.map(Some);
            }

            self.buffer.extend_from_slice(&temp[..n]);
        }
    }

    /// Parses the first `head_len` buffered bytes as a request head and
    /// completes its body.
    async fn finish_request(&mut self, head_len: usize) -> Result<Request, ParseError> {
        let (head, body_offset) = parse_http_request(&self.buffer[..head_len])?;
        self.buffer.advance(body_offset);

        let body = complete_body(
            &head,
            &mut self.buffer,
            &mut self.stream,
            self.settings.read_buffer_size,
        )
        .await?;

        Ok(head.with_body(body))
    }
}

impl<S> std::fmt::Debug for Connection<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("peer", &self.peer)
            .field("buffered", &self.buffer.len())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
