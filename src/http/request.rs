use std::collections::HashMap;

/// Dispatch class of a request method.
///
/// The server only knows three methods. Every other token is carried
/// verbatim in `Unsupported` so it can be answered with 501 and logged as
/// it was received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    /// GET - Serve a file or a directory listing
    Get,
    /// POST - Submit form data
    Post,
    /// OPTIONS - Describe the allowed methods
    Options,
    /// Any other method token
    Unsupported(String),
}

impl Method {
    /// Classifies a method token. Matching is case-sensitive.
    ///
    /// # Example
    ///
    /// ```
    /// # use simp_http::http::request::Method;
    /// assert_eq!(Method::from_token("GET"), Method::Get);
    /// assert_eq!(Method::from_token("get"), Method::Unsupported("get".to_string()));
    /// ```
    pub fn from_token(token: &str) -> Self {
        match token {
            "GET" => Method::Get,
            "POST" => Method::Post,
            "OPTIONS" => Method::Options,
            other => Method::Unsupported(other.to_string()),
        }
    }
}

/// Represents a parsed HTTP request from a client.
///
/// Built once per exchange from bytes already received and never mutated
/// afterwards. `method`, `path` and `version` are always non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// The method token exactly as received (e.g. "GET", "PATCH")
    pub method: String,
    /// The raw request target, not percent-decoded (e.g. "/index.html")
    pub path: String,
    /// HTTP version token (typically "HTTP/1.1")
    pub version: String,
    /// Request headers, names as received, last duplicate wins
    pub headers: HashMap<String, String>,
    /// Request body, present only when a Content-Length was declared
    pub body: Option<Vec<u8>>,
}

impl Request {
    /// Retrieves a header value by name.
    ///
    /// An exact match is preferred; otherwise names are compared
    /// ASCII case-insensitively. The parser keeps one spelling per name,
    /// so the fallback has at most one candidate.
    pub fn header(&self, key: &str) -> Option<&str> {
        header_value(&self.headers, key)
    }

    /// Classifies the method token for dispatch.
    pub fn method(&self) -> Method {
        Method::from_token(&self.method)
    }

    /// The User-Agent header, or an empty string when the client sent none.
    pub fn user_agent(&self) -> &str {
        self.header("User-Agent").unwrap_or("")
    }

    /// The request body, empty when none was declared.
    pub fn body_bytes(&self) -> &[u8] {
        self.body.as_deref().unwrap_or(&[])
    }
}

pub(crate) fn header_value<'a>(headers: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    if let Some(v) = headers.get(key) {
        return Some(v.as_str());
    }

    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v.as_str())
}
