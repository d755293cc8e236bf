//! File read strategies for import sources.
//!
//! # Responsibility
//! - Read import text from bare paths and `file://` URIs directly.
//! - Fall back to a binary copy into private scratch storage for sources
//!   that refuse direct text reads (content-style URIs).
//!
//! # Invariants
//! - Strategies are tried in the given order; the first success wins.
//! - Scratch copies are removed after reading.

use super::{TransferError, TransferResult};
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use uuid::Uuid;

static URI_SCHEME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<scheme>[A-Za-z][A-Za-z0-9+.\-]*)://(?P<rest>.*)$").expect("valid uri regex")
});

/// A reference to an import file as handed over by the file picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileRef {
    /// Directly addressable path (bare path or `file://` URI).
    Path(PathBuf),
    /// Provider-mediated URI, e.g. `content://...`.
    Content {
        scheme: String,
        uri: String,
        /// Percent-decoded path component of `uri`; may be empty.
        path: PathBuf,
    },
}

impl FileRef {
    pub fn parse(uri: &str) -> Self {
        let trimmed = uri.trim();
        let Some(caps) = URI_SCHEME_RE.captures(trimmed) else {
            return Self::Path(PathBuf::from(trimmed));
        };

        let scheme = caps["scheme"].to_ascii_lowercase();
        let path = decoded_path_component(&caps["rest"]);
        if scheme == "file" {
            Self::Path(path)
        } else {
            Self::Content {
                scheme,
                uri: trimmed.to_string(),
                path,
            }
        }
    }
}

/// Path part of `authority/path?query#fragment`, percent-decoded.
///
/// Text that does not decode to UTF-8 is kept verbatim.
fn decoded_path_component(rest: &str) -> PathBuf {
    let path = rest.find('/').map_or("", |start| &rest[start..]);
    let path = path.split(['?', '#']).next().unwrap_or_default();
    match urlencoding::decode(path) {
        Ok(decoded) => PathBuf::from(decoded.into_owned()),
        Err(_) => PathBuf::from(path),
    }
}

/// One strategy for turning a picked file reference into text.
pub trait FileReader {
    /// Short strategy name used in logs and error reports.
    fn name(&self) -> &'static str;
    fn read_text(&self, uri: &str) -> io::Result<String>;
}

/// Reads directly addressable files as UTF-8 text.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectReader;

impl FileReader for DirectReader {
    fn name(&self) -> &'static str {
        "direct"
    }

    fn read_text(&self, uri: &str) -> io::Result<String> {
        match FileRef::parse(uri) {
            FileRef::Path(path) => fs::read_to_string(path),
            FileRef::Content { scheme, .. } => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("`{scheme}` URIs cannot be read directly"),
            )),
        }
    }
}

/// Opaque binary access to a picked file.
pub trait ByteSource {
    fn read_bytes(&self, uri: &str) -> io::Result<Vec<u8>>;
}

/// Byte source resolving every URI to filesystem bytes by its path
/// component.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathByteSource;

impl ByteSource for PathByteSource {
    fn read_bytes(&self, uri: &str) -> io::Result<Vec<u8>> {
        match FileRef::parse(uri) {
            FileRef::Path(path) => fs::read(path),
            FileRef::Content { scheme, path, .. } => {
                if path.as_os_str().is_empty() {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("`{scheme}` URI has no path component"),
                    ));
                }
                fs::read(path)
            }
        }
    }
}

/// Copies the source bytes into `scratch_dir`, then reads the copy as text.
pub struct CopyThenReadReader<B: ByteSource> {
    source: B,
    scratch_dir: PathBuf,
}

impl<B: ByteSource> CopyThenReadReader<B> {
    pub fn new(source: B, scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            source,
            scratch_dir: scratch_dir.into(),
        }
    }

    pub fn scratch_dir(&self) -> &Path {
        self.scratch_dir.as_path()
    }
}

impl<B: ByteSource> FileReader for CopyThenReadReader<B> {
    fn name(&self) -> &'static str {
        "copy_then_read"
    }

    fn read_text(&self, uri: &str) -> io::Result<String> {
        let bytes = self.source.read_bytes(uri)?;
        fs::create_dir_all(&self.scratch_dir)?;

        let copy_path = self
            .scratch_dir
            .join(format!("import-{}.json", Uuid::new_v4().simple()));
        fs::write(&copy_path, &bytes)?;
        let text = fs::read_to_string(&copy_path);

        if let Err(err) = fs::remove_file(&copy_path) {
            warn!("event=import_read module=transfer status=cleanup_failed error={err}");
        }
        text
    }
}

/// Tries each reader in order and returns the first successful read.
pub fn read_with_fallback(readers: &[&dyn FileReader], uri: &str) -> TransferResult<String> {
    let mut attempts = Vec::with_capacity(readers.len());

    for reader in readers {
        match reader.read_text(uri) {
            Ok(text) => {
                debug!(
                    "event=import_read module=transfer status=ok reader={} bytes={}",
                    reader.name(),
                    text.len()
                );
                return Ok(text);
            }
            Err(err) => {
                warn!(
                    "event=import_read module=transfer status=fallback reader={} error={}",
                    reader.name(),
                    err
                );
                attempts.push(format!("{}: {err}", reader.name()));
            }
        }
    }

    if attempts.is_empty() {
        return Err(TransferError::FileAccess(
            "no file readers configured".to_string(),
        ));
    }
    Err(TransferError::FileAccess(attempts.join("; ")))
}

#[cfg(test)]
mod tests {
    use super::{
        read_with_fallback, ByteSource, CopyThenReadReader, DirectReader, FileReader, FileRef,
        PathByteSource,
    };
    use crate::transfer::TransferError;
    use std::io;
    use std::path::PathBuf;

    struct FailingReader;

    impl FileReader for FailingReader {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn read_text(&self, _uri: &str) -> io::Result<String> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
        }
    }

    struct FixedReader(&'static str);

    impl FileReader for FixedReader {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn read_text(&self, _uri: &str) -> io::Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct FakeProvider(Vec<u8>);

    impl ByteSource for FakeProvider {
        fn read_bytes(&self, _uri: &str) -> io::Result<Vec<u8>> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn parse_distinguishes_paths_and_content_uris() {
        assert_eq!(
            FileRef::parse("/tmp/books.json"),
            FileRef::Path(PathBuf::from("/tmp/books.json"))
        );
        assert_eq!(
            FileRef::parse("file:///tmp/books.json"),
            FileRef::Path(PathBuf::from("/tmp/books.json"))
        );
        assert!(matches!(
            FileRef::parse("content://com.android.providers/doc/12"),
            FileRef::Content { scheme, .. } if scheme == "content"
        ));
    }

    #[test]
    fn direct_reader_refuses_content_uris() {
        let err = DirectReader
            .read_text("content://provider/doc/1")
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Unsupported);
    }

    #[test]
    fn fallback_uses_second_reader_after_failure() {
        let text = read_with_fallback(&[&FailingReader, &FixedReader("[]")], "any").unwrap();
        assert_eq!(text, "[]");
    }

    #[test]
    fn fallback_reports_every_attempt_when_all_fail() {
        let err = read_with_fallback(&[&FailingReader, &FailingReader], "any").unwrap_err();
        match err {
            TransferError::FileAccess(message) => {
                assert_eq!(message.matches("failing: denied").count(), 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn copy_then_read_reads_provider_bytes_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = dir.path().join("scratch");
        let reader = CopyThenReadReader::new(
            FakeProvider("[{\"title\":\"A\"}]".as_bytes().to_vec()),
            &scratch,
        );

        let text = reader.read_text("content://provider/doc/7").unwrap();
        assert_eq!(text, "[{\"title\":\"A\"}]");
        assert_eq!(std::fs::read_dir(&scratch).unwrap().count(), 0);
    }

    #[test]
    fn parse_percent_decodes_path_components() {
        assert_eq!(
            FileRef::parse("file:///tmp/my%20books.json"),
            FileRef::Path(PathBuf::from("/tmp/my books.json"))
        );
        assert_eq!(
            FileRef::parse("file://localhost/tmp/%DA%A9%D8%AA%D8%A7%D8%A8.json"),
            FileRef::Path(PathBuf::from("/tmp/کتاب.json"))
        );
        assert!(matches!(
            FileRef::parse("content://media/external/my%20file.json?x=1"),
            FileRef::Content { path, .. } if path == PathBuf::from("/external/my file.json")
        ));
    }

    #[test]
    fn path_byte_source_reads_content_uri_path_component() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.json");
        std::fs::write(&path, b"[]").unwrap();

        let bytes = PathByteSource
            .read_bytes(&format!("content://{}", path.display()))
            .unwrap();
        assert_eq!(bytes, b"[]");

        let err = PathByteSource.read_bytes("content://provider").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
