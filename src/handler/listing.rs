//! Directory listing pages.

use std::io;
use std::path::Path;

/// Renders an HTML page listing the entries of `dir`.
///
/// Directories are linked with a trailing slash. Entries appear in the
/// order the filesystem yields them.
pub async fn render_directory(dir: &Path) -> io::Result<String> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut items = String::new();

    while let Some(entry) = entries.next_entry().await? {
        let name = escape_html(&entry.file_name().to_string_lossy());

        // follow symlinks the way a stat would
        let is_dir = match tokio::fs::metadata(entry.path()).await {
            Ok(meta) => meta.is_dir(),
            Err(_) => entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false),
        };

        if is_dir {
            items.push_str(&format!("<li><a href=\"{name}/\">{name}/</a></li>"));
        } else {
            items.push_str(&format!("<li><a href=\"{name}\">{name}</a></li>"));
        }
    }

    Ok(directory_page(&items))
}

fn directory_page(items: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Directory Listing</title>
    <link rel="stylesheet" href="/styles/directory.css">
</head>
<body>
    <div class="container">
        <h1>Directory Listing</h1>
        <ul>
            {items}
        </ul>
    </div>
</body>
</html>
"#
    )
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
