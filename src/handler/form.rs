//! Form submissions.
//!
//! Bodies are `application/x-www-form-urlencoded`. Each submission replaces
//! the contents of the data file with a one-element JSON array.

use std::io;
use std::path::PathBuf;

use anyhow::Context;
use serde::Serialize;
use serde_json::ser::{Formatter, PrettyFormatter};
use serde_json::{Map, Value};

/// Decoded form fields, in order of first appearance.
pub type FormData = Map<String, Value>;

/// Decodes a form body with query-string rules.
///
/// `+` becomes a space and `%XX` escapes are decoded. Pairs with an empty
/// value are dropped and the last occurrence of a key wins.
pub fn decode_form(body: &[u8]) -> FormData {
    let mut form = FormData::new();

    for (key, value) in url::form_urlencoded::parse(body) {
        if value.is_empty() {
            continue;
        }
        form.insert(key.into_owned(), Value::String(value.into_owned()));
    }

    form
}

/// Destination of submitted forms.
///
/// The dispatcher calls `save` on tokio's blocking pool, so implementations
/// may use synchronous I/O.
pub trait FormStore: Send + Sync {
    fn save(&self, records: &[FormData]) -> anyhow::Result<()>;
}

/// Writes submissions to a JSON file, overwriting it each time.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl FormStore for JsonFileStore {
    fn save(&self, records: &[FormData]) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }

        let json = to_ascii_json(records)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("writing {}", self.path.display()))?;

        tracing::debug!(path = %self.path.display(), "form data saved");
        Ok(())
    }
}

/// Four-space indented JSON with every non-ASCII character escaped.
pub fn to_ascii_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut out, AsciiFormatter::new());
    value.serialize(&mut ser)?;
    Ok(out)
}

struct AsciiFormatter<'a> {
    pretty: PrettyFormatter<'a>,
}

impl AsciiFormatter<'_> {
    fn new() -> Self {
        Self {
            pretty: PrettyFormatter::with_indent(b"    "),
        }
    }
}

impl Formatter for AsciiFormatter<'_> {
    fn begin_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_array(writer)
    }

    fn end_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        self.pretty.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_object(writer)
    }

    fn end_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        self.pretty.begin_object_key(writer, first)
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_object_value(writer)
    }

    fn end_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_object_value(writer)
    }

    fn write_string_fragment<W: ?Sized + io::Write>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()> {
        if !fragment.chars().any(needs_escape) {
            return writer.write_all(fragment.as_bytes());
        }

        let mut units = [0u16; 2];
        for c in fragment.chars() {
            if !needs_escape(c) {
                writer.write_all(&[c as u8])?;
            } else {
                for unit in c.encode_utf16(&mut units) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }
}

/// DEL is ASCII but still escaped; serde_json already handles the
/// control characters below 0x20.
fn needs_escape(c: char) -> bool {
    !c.is_ascii() || c == '\x7f'
}
