//! JSON import pipeline.
//!
//! # Responsibility
//! - Turn a picked file into validated book drafts (`ImportPlan`).
//! - Gate writes behind an explicit user confirmation of the count.
//! - Insert all confirmed drafts in one transaction and report the result.
//!
//! # Invariants
//! - Parse/read failures abort before any write.
//! - Entries without a usable `title` are skipped, never fatal.
//! - Missing or `null` `author`/`location` become empty strings.
//! - Either every candidate is inserted or none is.

use super::messages;
use super::reader::{read_with_fallback, CopyThenReadReader, DirectReader, FileReader, PathByteSource};
use super::{TransferError, TransferResult};
use crate::model::book::{BookField, BookId, NewBook};
use crate::repo::book_repo::BookRepository;
use log::{error, info};
use serde_json::{Map, Value};
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Instant;

/// MIME type the file picker should filter on.
pub const IMPORT_MIME_TYPE: &str = "application/json";

/// Why one import entry was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryRejection {
    NotAnObject,
    MissingTitle,
    /// Field present with a non-string value.
    InvalidField(BookField),
}

impl Display for EntryRejection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAnObject => write!(f, "entry is not an object"),
            Self::MissingTitle => write!(f, "entry has no usable title"),
            Self::InvalidField(field) => write!(f, "entry {field} is not a string"),
        }
    }
}

/// Import entry skipped during validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    /// Zero-based position in the imported array.
    pub index: usize,
    pub reason: EntryRejection,
}

/// Validated import content, ready for confirmation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportPlan {
    pub candidates: Vec<NewBook>,
    pub skipped: Vec<SkippedEntry>,
}

/// Final report of a confirmed import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub imported_ids: Vec<BookId>,
    pub skipped: Vec<SkippedEntry>,
}

impl ImportReport {
    pub fn imported(&self) -> usize {
        self.imported_ids.len()
    }
}

/// Terminal state of one import run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    /// The file picker was dismissed.
    Cancelled,
    /// The user rejected the confirmation prompt.
    Declined { candidates: usize },
    Imported(ImportReport),
}

impl ImportOutcome {
    /// Message for the UI collaborator; `None` when nothing should be shown.
    pub fn user_message(&self) -> Option<String> {
        match self {
            Self::Cancelled => None,
            Self::Declined { .. } => Some(messages::IMPORT_DECLINED.to_string()),
            Self::Imported(report) if report.imported() == 0 => {
                Some(messages::IMPORT_NOTHING_VALID.to_string())
            }
            Self::Imported(report) => Some(messages::import_success(report.imported())),
        }
    }
}

/// Asks the user to approve importing `candidate_count` books.
pub trait ImportConfirmer {
    fn confirm(&mut self, candidate_count: usize) -> bool;
}

impl<F> ImportConfirmer for F
where
    F: FnMut(usize) -> bool,
{
    fn confirm(&mut self, candidate_count: usize) -> bool {
        self(candidate_count)
    }
}

/// Maps a pipeline error to the message shown to the user.
pub fn user_message(err: &TransferError) -> &'static str {
    match err {
        TransferError::Parse(_) => messages::IMPORT_INVALID_FILE,
        TransferError::FileAccess(_) | TransferError::Repo(_) | TransferError::Share(_) => {
            messages::IMPORT_FAILED
        }
    }
}

/// Import pipeline over an ordered list of read strategies.
pub struct ImportPipeline {
    readers: Vec<Box<dyn FileReader + Send + Sync>>,
}

impl ImportPipeline {
    pub fn new(readers: Vec<Box<dyn FileReader + Send + Sync>>) -> Self {
        Self { readers }
    }

    /// Direct read first, then binary copy into `scratch_dir`.
    pub fn with_default_readers(scratch_dir: impl Into<PathBuf>) -> Self {
        Self::new(vec![
            Box::new(DirectReader),
            Box::new(CopyThenReadReader::new(PathByteSource, scratch_dir)),
        ])
    }

    /// Reads, parses and validates `uri` without writing anything.
    pub fn preview(&self, uri: &str) -> TransferResult<ImportPlan> {
        let readers = self
            .readers
            .iter()
            .map(|reader| reader.as_ref() as &dyn FileReader)
            .collect::<Vec<_>>();
        let text = read_with_fallback(&readers, uri)?;
        parse_import(text.as_str())
    }

    /// Runs the whole import flow for a picked file.
    ///
    /// `picked` is `None` when the user dismissed the file picker.
    pub fn run<R, C>(
        &self,
        repo: &R,
        picked: Option<&str>,
        confirmer: &mut C,
    ) -> TransferResult<ImportOutcome>
    where
        R: BookRepository + ?Sized,
        C: ImportConfirmer + ?Sized,
    {
        let Some(uri) = picked else {
            info!("event=import module=transfer status=cancelled");
            return Ok(ImportOutcome::Cancelled);
        };

        let started_at = Instant::now();
        info!("event=import module=transfer status=start");

        let result = self.run_picked(repo, uri, confirmer);
        match &result {
            Ok(ImportOutcome::Imported(report)) => info!(
                "event=import module=transfer status=ok duration_ms={} imported={} skipped={}",
                started_at.elapsed().as_millis(),
                report.imported(),
                report.skipped.len()
            ),
            Ok(ImportOutcome::Declined { candidates }) => info!(
                "event=import module=transfer status=declined candidates={candidates}"
            ),
            Ok(ImportOutcome::Cancelled) => {}
            Err(err) => error!(
                "event=import module=transfer status=error duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }

    fn run_picked<R, C>(&self, repo: &R, uri: &str, confirmer: &mut C) -> TransferResult<ImportOutcome>
    where
        R: BookRepository + ?Sized,
        C: ImportConfirmer + ?Sized,
    {
        let plan = self.preview(uri)?;

        if plan.candidates.is_empty() {
            return Ok(ImportOutcome::Imported(ImportReport {
                imported_ids: Vec::new(),
                skipped: plan.skipped,
            }));
        }

        if !confirmer.confirm(plan.candidates.len()) {
            return Ok(ImportOutcome::Declined {
                candidates: plan.candidates.len(),
            });
        }

        let imported_ids = repo.insert_books(&plan.candidates)?;
        Ok(ImportOutcome::Imported(ImportReport {
            imported_ids,
            skipped: plan.skipped,
        }))
    }
}

/// Parses import text into an [`ImportPlan`].
///
/// A leading UTF-8 byte order mark is ignored.
pub fn parse_import(text: &str) -> TransferResult<ImportPlan> {
    let text = text.trim_start_matches('\u{feff}');
    let value: Value =
        serde_json::from_str(text).map_err(|err| TransferError::Parse(err.to_string()))?;

    let entries = match value {
        Value::Array(entries) => entries,
        other => {
            return Err(TransferError::Parse(format!(
                "expected a JSON array, found {}",
                json_kind(&other)
            )));
        }
    };
    if entries.is_empty() {
        return Err(TransferError::Parse("import array is empty".to_string()));
    }

    let mut plan = ImportPlan::default();
    for (index, entry) in entries.iter().enumerate() {
        match validate_entry(entry) {
            Ok(book) => plan.candidates.push(book),
            Err(reason) => plan.skipped.push(SkippedEntry { index, reason }),
        }
    }

    Ok(plan)
}

fn validate_entry(entry: &Value) -> Result<NewBook, EntryRejection> {
    let Value::Object(fields) = entry else {
        return Err(EntryRejection::NotAnObject);
    };

    let title = match fields.get(BookField::Title.column()) {
        Some(Value::String(title)) if !title.trim().is_empty() => title.clone(),
        _ => return Err(EntryRejection::MissingTitle),
    };

    Ok(NewBook {
        title,
        author: optional_text(fields, BookField::Author)?,
        location: optional_text(fields, BookField::Location)?,
    })
}

fn optional_text(fields: &Map<String, Value>, field: BookField) -> Result<String, EntryRejection> {
    match fields.get(field.column()) {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(value)) => Ok(value.clone()),
        Some(_) => Err(EntryRejection::InvalidField(field)),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_import, EntryRejection, ImportOutcome, ImportReport, SkippedEntry};
    use crate::model::book::{BookField, NewBook};
    use crate::transfer::TransferError;

    #[test]
    fn parse_defaults_missing_author_and_location() {
        let plan = parse_import(r#"[{"title":"A"},{"author":"onlyAuthor"}]"#).unwrap();
        assert_eq!(plan.candidates, vec![NewBook::new("A", "", "")]);
        assert_eq!(
            plan.skipped,
            vec![SkippedEntry {
                index: 1,
                reason: EntryRejection::MissingTitle,
            }]
        );
    }

    #[test]
    fn parse_rejects_non_array_and_empty_array() {
        assert!(matches!(
            parse_import(r#"{"title":"A"}"#),
            Err(TransferError::Parse(message)) if message.contains("an object")
        ));
        assert!(matches!(parse_import("[]"), Err(TransferError::Parse(_))));
        assert!(matches!(parse_import("not json"), Err(TransferError::Parse(_))));
    }

    #[test]
    fn parse_skips_blank_titles_and_non_string_fields() {
        let plan = parse_import(
            r#"[{"title":"  "},{"title":"B","author":7},"C",{"title":"D","location":null}]"#,
        )
        .unwrap();
        assert_eq!(plan.candidates, vec![NewBook::new("D", "", "")]);
        let reasons = plan
            .skipped
            .iter()
            .map(|entry| entry.reason.clone())
            .collect::<Vec<_>>();
        assert_eq!(
            reasons,
            vec![
                EntryRejection::MissingTitle,
                EntryRejection::InvalidField(BookField::Author),
                EntryRejection::NotAnObject,
            ]
        );
    }

    #[test]
    fn parse_ignores_byte_order_mark_and_extra_fields() {
        let plan = parse_import("\u{feff}[{\"id\":9,\"title\":\"شاهنامه\",\"author\":\"فردوسی\"}]")
            .unwrap();
        assert_eq!(plan.candidates, vec![NewBook::new("شاهنامه", "فردوسی", "")]);
    }

    #[test]
    fn outcome_messages_follow_result() {
        assert_eq!(ImportOutcome::Cancelled.user_message(), None);
        let empty = ImportOutcome::Imported(ImportReport::default());
        assert!(empty.user_message().is_some());
    }
}
