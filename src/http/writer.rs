use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::response::{Headers, Response};

pub const HTTP_VERSION: &str = "HTTP/1.1";
pub const SERVER_NAME: &str = "SIMP-HTTP";

/// Headers sent on every response before the caller's own.
fn baseline_headers() -> Headers {
    let mut headers = Headers::new();
    headers.insert("Server", SERVER_NAME);
    headers.insert("Connection", "keep-alive");
    headers
}

/// Serializes a response into its wire form.
///
/// The baseline `Server` and `Connection` headers come first; a caller
/// header with the same name replaces the baseline value in place.
pub fn serialize_response(resp: &Response) -> Vec<u8> {
    let mut headers = baseline_headers();
    for (k, v) in resp.headers.iter() {
        headers.insert(k, v);
    }

    let mut buf = Vec::with_capacity(128 + resp.body.len());

    // Status line
    let status_line = format!(
        "{} {} {}\r\n",
        HTTP_VERSION,
        resp.status.as_u16(),
        resp.status.reason_phrase()
    );
    buf.extend_from_slice(status_line.as_bytes());

    // Headers
    for (k, v) in headers.iter() {
        buf.extend_from_slice(k.as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(v.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }

    // Header/body separator
    buf.extend_from_slice(b"\r\n");

    // Body
    buf.extend_from_slice(&resp.body);

    buf
}

#[derive(Debug)]
pub struct ResponseWriter {
    buffer: Vec<u8>,
    written: usize,
}

impl ResponseWriter {
    pub fn new(response: &Response) -> Self {
        Self {
            buffer: serialize_response(response),
            written: 0,
        }
    }

    pub async fn write_to_stream<W>(&mut self, stream: &mut W) -> anyhow::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        while self.written < self.buffer.len() {
            let n = stream
                .write(&self.buffer[self.written..])
                .await?;

            if n == 0 {
                return Err(anyhow::anyhow!("connection closed while writing"));
            }

            self.written += n;
        }

        stream.flush().await?;
        Ok(())
    }
}
