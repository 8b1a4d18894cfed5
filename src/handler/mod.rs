//! Request handlers.
//!
//! A request is classified once by its method and handed to exactly one
//! handler:
//!
//! - `GET` serves files and directory listings below the configured root
//! - `POST` decodes a form body and hands it to the [`FormStore`]
//! - `OPTIONS` advertises the supported methods
//! - anything else is answered with 501
//!
//! Every handled request produces one [`AccessEntry`].

pub mod form;
pub mod listing;
pub mod static_files;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;

use crate::access_log::{AccessEntry, AccessLog};
use crate::http::date;
use crate::http::request::{Method, Request};
use crate::http::response::{Response, ResponseBuilder, StatusCode};

pub use form::{FormData, FormStore, JsonFileStore};

pub const ALLOWED_METHODS: &str = "GET, POST, OPTIONS";

const NOT_FOUND_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>404 Not Found</title>
    <link rel="stylesheet" href="/styles/404.css">
</head>
<body>
    <div class="container">
        <h1>Oops...404 NOT FOUND</h1>
    </div>
</body>
</html>
"#;

const SAVED_PAGE: &str = "<h1>Data Saved successfully!</h1>";
const NOT_IMPLEMENTED_PAGE: &str = "<h1>501 Not Implemented</h1>";

/// Routes requests to the handlers and records them in the access log.
///
/// Holds only read-only handles, so one instance is shared by all
/// connections.
pub struct Dispatcher {
    root: PathBuf,
    store: Arc<dyn FormStore>,
    access_log: Arc<dyn AccessLog>,
}

impl Dispatcher {
    pub fn new(
        root: impl Into<PathBuf>,
        store: Arc<dyn FormStore>,
        access_log: Arc<dyn AccessLog>,
    ) -> Self {
        Self {
            root: root.into(),
            store,
            access_log,
        }
    }

    /// Produces the response for `req`.
    ///
    /// Fails only when a submitted form cannot be persisted.
    pub async fn dispatch(&self, req: &Request, client: SocketAddr) -> anyhow::Result<Response> {
        let response = match req.method() {
            Method::Get => static_files::serve(&self.root, &req.path).await,
            Method::Post => self.submit_form(req).await?,
            Method::Options => options(),
            Method::Unsupported(_) => not_implemented(),
        };

        self.access_log.record(&AccessEntry {
            client,
            method: req.method.clone(),
            path: req.path.clone(),
            status: response.status,
            user_agent: req.user_agent().to_string(),
        });

        Ok(response)
    }

    async fn submit_form(&self, req: &Request) -> anyhow::Result<Response> {
        let record = form::decode_form(req.body_bytes());

        // stores do blocking file I/O; keep it off the connection tasks
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || store.save(&[record]))
            .await
            .context("form store task failed")??;

        Ok(html(StatusCode::Ok, SAVED_PAGE))
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

/// 204 with the list of supported methods.
pub fn options() -> Response {
    ResponseBuilder::new(StatusCode::NoContent)
        .header("Allow", ALLOWED_METHODS)
        .header("Date", date::now())
        .build()
}

pub fn not_found() -> Response {
    html(StatusCode::NotFound, NOT_FOUND_PAGE)
}

pub fn not_implemented() -> Response {
    html(StatusCode::NotImplemented, NOT_IMPLEMENTED_PAGE)
}

fn html(status: StatusCode, page: &str) -> Response {
    ResponseBuilder::new(status)
        .header("Content-Type", "text/html")
        .header("Content-Length", page.len().to_string())
        .header("Date", date::now())
        .body(page.as_bytes().to_vec())
        .build()
}
