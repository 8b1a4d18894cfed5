use crate::http::request::{Request, header_value};
use std::collections::HashMap;
use std::io;
use thiserror::Error;

const CRLF: &[u8] = b"\r\n";
const HEADERS_END: &[u8] = b"\r\n\r\n";

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed request line")]
    MalformedRequestLine,

    #[error("malformed header field: {0:?}")]
    MalformedHeaderField(String),

    #[error("invalid content-length header: {0:?}")]
    InvalidContentLength(String),

    #[error("header block exceeds {limit} bytes")]
    HeadersTooLarge { limit: usize },

    #[error("io error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

/// Request line and header fields of a request whose body has not been
/// completed yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHead {
    pub method: String,
    pub path: String,
    pub version: String,
    pub headers: HashMap<String, String>,
}

impl RequestHead {
    /// Declared body length, `None` when no Content-Length header was sent.
    pub fn content_length(&self) -> Result<Option<usize>, ParseError> {
        header_value(&self.headers, "Content-Length")
            .map(|v| {
                v.trim()
                    .parse::<usize>()
                    .map_err(|_| ParseError::InvalidContentLength(v.to_string()))
            })
            .transpose()
    }

    /// Finishes the request with its (possibly absent) body.
    pub fn with_body(self, body: Option<Vec<u8>>) -> Request {
        Request {
            method: self.method,
            path: self.path,
            version: self.version,
            headers: self.headers,
            body,
        }
    }
}

/// Parses the request line and header fields at the start of `buf`.
///
/// Returns the head together with the offset at which the body starts.
/// When `buf` holds no blank line the whole buffer is treated as the
/// header block and the body offset is `buf.len()`. A header line shorter
/// than two bytes also ends the header block. When a name repeats, in any
/// letter case, only its last occurrence is kept.
pub fn parse_http_request(buf: &[u8]) -> Result<(RequestHead, usize), ParseError> {
    let (header_bytes, body_offset) = match find_headers_end(buf) {
        Some(end) => (&buf[..end], end + HEADERS_END.len()),
        None => (buf, buf.len()),
    };

    let mut lines = split_lines(header_bytes);

    // Request line
    let request_line = lines
        .next()
        .and_then(|line| std::str::from_utf8(line).ok())
        .ok_or(ParseError::MalformedRequestLine)?;
    let (method, path, version) = parse_request_line(request_line)?;

    // Headers
    let mut headers = HashMap::new();

    for line in lines {
        if line.len() < 2 {
            break;
        }

        let line = std::str::from_utf8(line)
            .map_err(|_| ParseError::MalformedHeaderField(String::from_utf8_lossy(line).into_owned()))?;

        let (key, value) = line
            .split_once(": ")
            .ok_or_else(|| ParseError::MalformedHeaderField(line.to_string()))?;

        // names compare case-insensitively, so a later spelling replaces
        // every earlier one and lookups stay unambiguous
        headers.retain(|name: &String, _| !name.eq_ignore_ascii_case(key));
        headers.insert(key.to_string(), value.to_string());
    }

    let head = RequestHead {
        method: method.to_string(),
        path: path.to_string(),
        version: version.to_string(),
        headers,
    };

    Ok((head, body_offset))
}

fn parse_request_line(line: &str) -> Result<(&str, &str, &str), ParseError> {
    let mut parts = line.split(' ');

    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(method), Some(path), Some(version), None)
            if !method.is_empty() && !path.is_empty() && !version.is_empty() =>
        {
            Ok((method, path, version))
        }
        _ => Err(ParseError::MalformedRequestLine),
    }
}

/// Position of the `\r\n\r\n` separator, if the buffer holds one.
pub fn find_headers_end(buf: &[u8]) -> Option<usize> {
    buf.windows(HEADERS_END.len())
        .position(|w| w == HEADERS_END)
}

fn split_lines(buf: &[u8]) -> impl Iterator<Item = &[u8]> {
    let mut rest = Some(buf);

    std::iter::from_fn(move || {
        let current = rest?;
        match current.windows(CRLF.len()).position(|w| w == CRLF) {
            Some(i) => {
                rest = Some(&current[i + CRLF.len()..]);
                Some(&current[..i])
            }
            None => {
                rest = None;
                Some(current)
            }
        }
    })
}
