//! JSON export pipeline.
//!
//! # Responsibility
//! - Serialize a book list to a pretty JSON array.
//! - Write it to the fixed export file in app-private storage.
//! - Offer the written file to a platform share target when one exists.
//!
//! # Invariants
//! - An empty list writes nothing.
//! - The export path only ever holds a fully written file.
//! - Sharing is attempted only after the write succeeded.

use super::messages;
use super::{TransferError, TransferResult};
use crate::model::book::Book;
use log::{error, info};
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the export inside the export directory.
pub const EXPORT_FILE_NAME: &str = "books_export.json";
const EXPORT_TEMP_SUFFIX: &str = ".partial";

/// Platform share surface for a written export file.
pub trait ShareTarget {
    fn share(&self, path: &Path) -> Result<(), String>;
}

/// Terminal state of one export run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    NothingToExport,
    Shared(PathBuf),
    /// No share target was available; the file stays in private storage.
    SavedPrivately(PathBuf),
}

impl ExportOutcome {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::NothingToExport => messages::EXPORT_NOTHING,
            Self::Shared(_) => messages::EXPORT_SHARED,
            Self::SavedPrivately(_) => messages::EXPORT_PRIVATE_ONLY,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::NothingToExport => None,
            Self::Shared(path) | Self::SavedPrivately(path) => Some(path.as_path()),
        }
    }
}

/// Every export failure is reported with the same generic message.
pub fn user_message(_err: &TransferError) -> &'static str {
    messages::EXPORT_FAILED
}

/// Serializes `books` as a pretty JSON array in input order.
pub fn serialize_books(books: &[Book]) -> TransferResult<String> {
    serde_json::to_string_pretty(books)
        .map_err(|err| TransferError::FileAccess(format!("serialize export: {err}")))
}

/// Exports `books` into `export_dir` and offers the file to `share`.
pub fn export_books(
    books: &[Book],
    export_dir: &Path,
    share: Option<&dyn ShareTarget>,
) -> TransferResult<ExportOutcome> {
    if books.is_empty() {
        info!("event=export module=transfer status=skipped reason=empty");
        return Ok(ExportOutcome::NothingToExport);
    }

    let result = write_and_share(books, export_dir, share);
    match &result {
        Ok(outcome) => info!(
            "event=export module=transfer status=ok books={} shared={}",
            books.len(),
            matches!(outcome, ExportOutcome::Shared(_))
        ),
        Err(err) => error!("event=export module=transfer status=error error={err}"),
    }
    result
}

fn write_and_share(
    books: &[Book],
    export_dir: &Path,
    share: Option<&dyn ShareTarget>,
) -> TransferResult<ExportOutcome> {
    let json = serialize_books(books)?;
    let path = export_dir.join(EXPORT_FILE_NAME);
    write_replacing(&path, json.as_bytes())?;

    match share {
        Some(target) => {
            target.share(&path).map_err(TransferError::Share)?;
            Ok(ExportOutcome::Shared(path))
        }
        None => Ok(ExportOutcome::SavedPrivately(path)),
    }
}

fn write_replacing(path: &Path, contents: &[u8]) -> TransferResult<()> {
    let file_access = |err: std::io::Error| TransferError::FileAccess(err.to_string());

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(file_access)?;
    }

    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(EXPORT_TEMP_SUFFIX);
    let temp_path = PathBuf::from(temp_name);

    if let Err(err) = fs::write(&temp_path, contents).and_then(|()| fs::rename(&temp_path, path)) {
        let _ = fs::remove_file(&temp_path);
        return Err(file_access(err));
    }
    Ok(())
}
