use std::path::{Component, Path, PathBuf};

use crate::handler::{listing, not_found};
use crate::http::date;
use crate::http::mime;
use crate::http::response::{Response, ResponseBuilder, StatusCode};

const DEFAULT_CONTENT_TYPE: &str = "text/html";

/// Maps a request path onto `root`.
///
/// Leading slashes are stripped. Paths that would climb out of `root`, or
/// that name nothing once stripped, do not map.
pub fn map_path(root: &Path, url_path: &str) -> Option<PathBuf> {
    let relative = url_path.trim_start_matches('/');
    if relative.is_empty() {
        return None;
    }

    let mut pb = root.to_path_buf();
    for comp in Path::new(relative).components() {
        match comp {
            Component::Normal(s) => pb.push(s),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(pb)
}

/// Serves `url_path` below `root`: a listing for directories, the file
/// contents for regular files, 404 for anything else. Filesystem errors
/// are answered with 404 as well.
pub async fn serve(root: &Path, url_path: &str) -> Response {
    if url_path == "/" {
        return directory(root).await;
    }

    let Some(target) = map_path(root, url_path) else {
        return not_found();
    };

    match tokio::fs::metadata(&target).await {
        Ok(meta) if meta.is_dir() => directory(&target).await,
        Ok(meta) if meta.is_file() => file(&target).await,
        _ => not_found(),
    }
}

async fn directory(dir: &Path) -> Response {
    let page = match listing::render_directory(dir).await {
        Ok(page) => page,
        Err(e) => {
            tracing::warn!(path = %dir.display(), error = %e, "directory listing failed");
            return not_found();
        }
    };

    html_ok(page.into_bytes())
}

async fn file(path: &Path) -> Response {
    let payload = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "reading file failed");
            return not_found();
        }
    };

    let modified = tokio::fs::metadata(path)
        .await
        .and_then(|meta| meta.modified())
        .ok();

    let mut builder = ResponseBuilder::new(StatusCode::Ok)
        .header("Content-Type", mime::guess(path).unwrap_or(DEFAULT_CONTENT_TYPE))
        .header("Content-Length", payload.len().to_string())
        .header("Date", date::now());

    if let Some(last_modified) = modified.and_then(date::fmt_http_date) {
        builder = builder.header("Last-Modified", last_modified);
    }

    builder.body(payload).build()
}

fn html_ok(payload: Vec<u8>) -> Response {
    ResponseBuilder::new(StatusCode::Ok)
        .header("Content-Type", DEFAULT_CONTENT_TYPE)
        .header("Content-Length", payload.len().to_string())
        .header("Date", date::now())
        .body(payload)
        .build()
}
