//! Content-Length framing of request bodies.

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::http::parser::{ParseError, RequestHead};

/// Completes the body declared by `head`.
///
/// `buffered` holds the bytes already received after the header block.
/// Without a Content-Length header the body is absent and nothing is read.
/// Otherwise further reads of at most `chunk_size` bytes are issued on
/// `source` until the declared length is available. Exactly the declared
/// number of bytes is taken out of `buffered`; anything after them stays
/// there and belongs to the next request.
///
/// Reads block for as long as the peer keeps the connection open. A peer
/// that closes before the body is complete yields an `UnexpectedEof` error.
pub async fn complete_body<R>(
    head: &RequestHead,
    buffered: &mut BytesMut,
    source: &mut R,
    chunk_size: usize,
) -> Result<Option<Vec<u8>>, ParseError>
where
    R: AsyncRead + Unpin,
{
    let Some(content_length) = head.content_length()? else {
        return Ok(None);
    };

    let mut chunk = vec![0u8; chunk_size.max(1)];

    while buffered.len() < content_length {
        let n = source.read(&mut chunk).await?;

        if n == 0 {
            return Err(ParseError::Io {
                source: std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    format!(
                        "connection closed after {} of {} body bytes",
                        buffered.len(),
                        content_length
                    ),
                ),
            });
        }

        buffered.extend_from_slice(&chunk[..n]);
    }

    Ok(Some(buffered.split_to(content_length).to_vec()))
}
