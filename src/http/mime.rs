//! MIME type detection based on file extensions.

use std::path::Path;

/// Guesses a content type from the extension of `path`.
///
/// Returns `None` for unknown or missing extensions.
///
/// # Example
///
/// ```
/// # use simp_http::http::mime::guess;
/// assert_eq!(guess("styles/site.css"), Some("text/css"));
/// assert_eq!(guess("README"), None);
/// ```
pub fn guess(path: impl AsRef<Path>) -> Option<&'static str> {
    let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();

    let mime = match ext.as_str() {
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" | "mjs" => "text/javascript",
        "json" => "application/json",
        "txt" | "text" | "log" => "text/plain",
        "csv" => "text/csv",
        "xml" => "application/xml",
        "md" => "text/markdown",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/vnd.microsoft.icon",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "gz" => "application/gzip",
        "tar" => "application/x-tar",
        "wasm" => "application/wasm",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "mp3" => "audio/mpeg",
        "wav" => "audio/x-wav",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        _ => return None,
    };

    Some(mime)
}
