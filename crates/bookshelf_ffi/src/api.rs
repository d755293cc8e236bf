//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level book functions to Dart via FRB.
//! - Own the process-wide session: resolved paths plus one lazily opened
//!   database handle.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Every call returns an envelope; failures carry `ok=false` and a message.
//! - Import never writes unless Dart approved the exact candidate count.

use bookshelf_core::transfer::import::user_message as import_error_message;
use bookshelf_core::transfer::messages;
use bookshelf_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, is_alphabet_letter,
    ping as ping_inner, Book, BookId, BookService, CoreConfig, DbHandle, ExportOutcome, ImportOutcome,
    ImportPipeline, SearchResults, SortField, SqliteBookRepository,
};
use log::{info, warn};
use std::sync::{Mutex, MutexGuard, OnceLock};

static SESSION: OnceLock<Mutex<Session>> = OnceLock::new();

struct Session {
    config: CoreConfig,
    db: DbHandle,
}

impl Session {
    fn new(config: CoreConfig) -> Self {
        let db = DbHandle::file(&config.db_path);
        Self { config, db }
    }
}

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Reconfiguration attempts with different level or directory return error.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Book record as seen by Dart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookItem {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub location: String,
}

impl From<Book> for BookItem {
    fn from(book: Book) -> Self {
        Self {
            id: book.id.0,
            title: book.title,
            author: book.author,
            location: book.location,
        }
    }
}

/// Response envelope for single-book commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookActionResponse {
    pub ok: bool,
    /// Stored record after add/update, or the fetched record.
    pub book: Option<BookItem>,
    pub message: String,
}

impl BookActionResponse {
    fn success(message: impl Into<String>, book: Option<Book>) -> Self {
        Self {
            ok: true,
            book: book.map(BookItem::from),
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            book: None,
            message: message.into(),
        }
    }
}

/// Response envelope for list, page and search calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookListResponse {
    pub ok: bool,
    pub items: Vec<BookItem>,
    /// Diagnostics; carries the data-format warning when rows were unreadable.
    pub message: String,
}

impl BookListResponse {
    fn from_books(books: Vec<Book>) -> Self {
        let message = if books.is_empty() {
            "No books.".to_string()
        } else {
            format!("Found {} book(s).", books.len())
        };
        Self {
            ok: true,
            items: books.into_iter().map(BookItem::from).collect(),
            message,
        }
    }

    fn from_search(results: SearchResults) -> Self {
        match results.data_format_warning {
            Some(warning) => Self {
                ok: true,
                items: Vec::new(),
                message: warning,
            },
            None => Self::from_books(results.items),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            items: Vec::new(),
            message: message.into(),
        }
    }
}

/// One row of the per-location summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationItem {
    pub location: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationSummaryResponse {
    pub ok: bool,
    pub items: Vec<LocationItem>,
    pub message: String,
}

/// Response envelope for both import steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportResponse {
    pub ok: bool,
    /// Valid entries found in the file.
    pub candidates: u32,
    pub imported: u32,
    pub skipped: u32,
    /// Localized message to show as-is.
    pub message: String,
}

impl ImportResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            candidates: 0,
            imported: 0,
            skipped: 0,
            message: message.into(),
        }
    }
}

/// Response envelope for export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportResponse {
    pub ok: bool,
    /// Written export file; `None` when nothing was written.
    pub path: Option<String>,
    /// Dart must share `path` and then report via `books_export_share_finished`.
    pub share_pending: bool,
    /// Localized message to show as-is; empty while a share is pending.
    pub message: String,
}

/// Points the session at `data_dir` and creates its directories.
///
/// Blank `data_dir` falls back to `BOOKSHELF_DATA_DIR`, then the temp dir.
/// Re-initializing closes the previous database handle.
///
/// # FFI contract
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn books_init(data_dir: String) -> String {
    let config = CoreConfig::resolve(Some(data_dir.as_str()));
    if let Err(err) = config.ensure_dirs() {
        return format!("books_init failed: {err}");
    }

    let cell = SESSION.get_or_init(|| Mutex::new(Session::new(config.clone())));
    let mut session = lock_session(cell);
    if session.config != config {
        if let Err(err) = session.db.close() {
            return format!("books_init failed: {err}");
        }
        *session = Session::new(config);
    }
    let opened = session.db.connection().map(|_| ());
    match opened {
        Ok(()) => String::new(),
        Err(err) => format!("books_init failed: {err}"),
    }
}

/// Closes the session database; the next call re-opens it.
#[flutter_rust_bridge::frb(sync)]
pub fn books_close() -> String {
    let Some(cell) = SESSION.get() else {
        return String::new();
    };
    match lock_session(cell).db.close() {
        Ok(()) => String::new(),
        Err(err) => format!("books_close failed: {err}"),
    }
}

/// Adds a book from the add screen; every field is required.
#[flutter_rust_bridge::frb(sync)]
pub fn book_add(title: String, author: String, location: String) -> BookActionResponse {
    let result = with_book_service(|service, _| {
        service
            .add_book(title.trim(), author.trim(), location.trim())
            .map_err(|err| err.to_string())
    });
    match result {
        Ok(book) => BookActionResponse::success("Book added.", Some(book)),
        Err(err) => BookActionResponse::failure(format!("book_add failed: {err}")),
    }
}

/// Replaces every field of book `id`.
#[flutter_rust_bridge::frb(sync)]
pub fn book_update(id: i64, title: String, author: String, location: String) -> BookActionResponse {
    let result = with_book_service(|service, _| {
        service
            .update_book(BookId(id), title.trim(), author.trim(), location.trim())
            .map_err(|err| err.to_string())
    });
    match result {
        Ok(book) => BookActionResponse::success("Book updated.", Some(book)),
        Err(err) => BookActionResponse::failure(format!("book_update failed: {err}")),
    }
}

/// Deletes book `id`; deleting a missing id still succeeds.
#[flutter_rust_bridge::frb(sync)]
pub fn book_delete(id: i64) -> BookActionResponse {
    match with_book_service(|service, _| {
        service.delete_book(BookId(id)).map_err(|err| err.to_string())
    }) {
        Ok(true) => BookActionResponse::success("Book deleted.", None),
        Ok(false) => BookActionResponse::success("No such book.", None),
        Err(err) => BookActionResponse::failure(format!("book_delete failed: {err}")),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn book_get(id: i64) -> BookActionResponse {
    match with_book_service(|service, _| service.get_book(BookId(id)).map_err(|err| err.to_string()))
    {
        Ok(Some(book)) => BookActionResponse::success("Book found.", Some(book)),
        Ok(None) => BookActionResponse::failure(format!("book_get failed: book not found: {id}")),
        Err(err) => BookActionResponse::failure(format!("book_get failed: {err}")),
    }
}

/// Lists every book.
///
/// Input semantics:
/// - `order`: `None` for storage order, otherwise `title|author`.
#[flutter_rust_bridge::frb(sync)]
pub fn books_list(order: Option<String>) -> BookListResponse {
    let order = match order.as_deref().map(str::trim).filter(|raw| !raw.is_empty()) {
        None => None,
        Some(raw) => match SortField::parse(raw) {
            Some(field) => Some(field),
            None => {
                return BookListResponse::failure(format!(
                    "books_list failed: unsupported order `{raw}`"
                ))
            }
        },
    };
    let result = with_book_service(|service, _| {
        match order {
            Some(field) => service.list_books_ordered(field),
            None => service.list_books(),
        }
        .map_err(|err| err.to_string())
    });
    match result {
        Ok(books) => BookListResponse::from_books(books),
        Err(err) => BookListResponse::failure(format!("books_list failed: {err}")),
    }
}

/// Returns 1-based page `page` of `limit` books in storage order.
#[flutter_rust_bridge::frb(sync)]
pub fn books_page(page: u32, limit: u32) -> BookListResponse {
    match with_book_service(|service, _| {
        service.fetch_page(page, limit).map_err(|err| err.to_string())
    }) {
        Ok(books) => BookListResponse::from_books(books),
        Err(err) => BookListResponse::failure(format!("books_page failed: {err}")),
    }
}

/// Substring search over title, author and location.
#[flutter_rust_bridge::frb(sync)]
pub fn books_search(text: String) -> BookListResponse {
    match with_book_service(|service, _| {
        service
            .search_any_field(text.as_str())
            .map_err(|err| err.to_string())
    }) {
        Ok(results) => BookListResponse::from_search(results),
        Err(err) => BookListResponse::failure(format!("books_search failed: {err}")),
    }
}

/// Books whose title starts with `letter` (alphabet browse screen).
#[flutter_rust_bridge::frb(sync)]
pub fn books_by_letter(letter: String) -> BookListResponse {
    if !is_alphabet_letter(letter.as_str()) {
        return BookListResponse::failure(format!(
            "books_by_letter failed: `{letter}` is not an alphabet letter"
        ));
    }
    match with_book_service(|service, _| {
        service
            .search_by_letter(letter.as_str())
            .map_err(|err| err.to_string())
    }) {
        Ok(results) => BookListResponse::from_search(results),
        Err(err) => BookListResponse::failure(format!("books_by_letter failed: {err}")),
    }
}

/// Book counts per storage location.
#[flutter_rust_bridge::frb(sync)]
pub fn books_locations() -> LocationSummaryResponse {
    match with_book_service(|service, _| service.location_summary().map_err(|err| err.to_string()))
    {
        Ok(summary) => LocationSummaryResponse {
            ok: true,
            message: format!("Found {} location(s).", summary.len()),
            items: summary
                .into_iter()
                .map(|entry| LocationItem {
                    location: entry.location,
                    count: entry.count,
                })
                .collect(),
        },
        Err(err) => LocationSummaryResponse {
            ok: false,
            items: Vec::new(),
            message: format!("books_locations failed: {err}"),
        },
    }
}

/// First import step: reads and validates `uri` without writing.
///
/// On success `message` is the confirmation prompt for `candidates` books.
#[flutter_rust_bridge::frb(sync)]
pub fn books_import_preview(uri: String) -> ImportResponse {
    let scratch_dir = match with_session(|session| Ok(session.config.scratch_dir.clone())) {
        Ok(dir) => dir,
        Err(err) => {
            warn!("event=import_preview module=ffi status=error error={err}");
            return ImportResponse::failure(messages::IMPORT_FAILED);
        }
    };
    match ImportPipeline::with_default_readers(scratch_dir).preview(uri.as_str()) {
        Ok(plan) => {
            let candidates = plan.candidates.len();
            let message = if candidates == 0 {
                messages::IMPORT_NOTHING_VALID.to_string()
            } else {
                messages::import_confirm_prompt(candidates)
            };
            ImportResponse {
                ok: true,
                candidates: to_u32(candidates),
                imported: 0,
                skipped: to_u32(plan.skipped.len()),
                message,
            }
        }
        Err(err) => ImportResponse::failure(import_error_message(&err)),
    }
}

/// Second import step: imports `uri` once the user approved the prompt.
///
/// `uri=None` means the picker was dismissed. The file is re-validated and
/// nothing is written unless it still holds exactly `approved_count`
/// candidates.
#[flutter_rust_bridge::frb(sync)]
pub fn books_import(uri: Option<String>, approved_count: u32) -> ImportResponse {
    let result = with_book_service(|service, config| {
        let pipeline = ImportPipeline::with_default_readers(config.scratch_dir.clone());
        let mut confirmer = |count: usize| count == approved_count as usize;
        Ok(service.import_books(&pipeline, uri.as_deref(), &mut confirmer))
    });
    let outcome = match result {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(err)) => return ImportResponse::failure(import_error_message(&err)),
        Err(err) => {
            warn!("event=import module=ffi status=error error={err}");
            return ImportResponse::failure(messages::IMPORT_FAILED);
        }
    };

    let message = outcome.user_message().unwrap_or_default();
    match outcome {
        ImportOutcome::Cancelled => ImportResponse {
            ok: true,
            candidates: 0,
            imported: 0,
            skipped: 0,
            message,
        },
        ImportOutcome::Declined { candidates } => ImportResponse {
            ok: false,
            candidates: to_u32(candidates),
            imported: 0,
            skipped: 0,
            message,
        },
        ImportOutcome::Imported(report) => ImportResponse {
            ok: true,
            candidates: to_u32(report.imported()),
            imported: to_u32(report.imported()),
            skipped: to_u32(report.skipped.len()),
            message,
        },
    }
}

/// Writes `books_export.json` into the export directory.
///
/// Input semantics:
/// - `share_available`: Dart will hand the returned path to the platform
///   share sheet. The final message then comes from
///   `books_export_share_finished`. When `false` the file stays in private
///   storage and the message is final.
#[flutter_rust_bridge::frb(sync)]
pub fn books_export(share_available: bool) -> ExportResponse {
    let result =
        with_book_service(|service, config| Ok(service.export_all(&config.export_dir, None)));
    match result {
        Ok(Ok(ExportOutcome::NothingToExport)) => ExportResponse {
            ok: false,
            path: None,
            share_pending: false,
            message: messages::EXPORT_NOTHING.to_string(),
        },
        Ok(Ok(outcome)) => {
            let path = outcome.path().map(|path| path.display().to_string());
            if share_available {
                info!("event=export module=ffi status=share_pending");
                ExportResponse {
                    ok: true,
                    path,
                    share_pending: true,
                    message: String::new(),
                }
            } else {
                ExportResponse {
                    ok: true,
                    path,
                    share_pending: false,
                    message: outcome.user_message().to_string(),
                }
            }
        }
        Ok(Err(err)) => ExportResponse {
            ok: false,
            path: None,
            share_pending: false,
            message: bookshelf_core::transfer::export::user_message(&err).to_string(),
        },
        Err(err) => {
            warn!("event=export module=ffi status=error error={err}");
            ExportResponse {
                ok: false,
                path: None,
                share_pending: false,
                message: messages::EXPORT_FAILED.to_string(),
            }
        }
    }
}

/// Reports the result of the Dart share sheet for a pending export.
///
/// Returns the localized message to show: success only when the share
/// actually completed.
#[flutter_rust_bridge::frb(sync)]
pub fn books_export_share_finished(shared: bool) -> String {
    if shared {
        info!("event=export_share module=ffi status=ok");
        messages::EXPORT_SHARED.to_string()
    } else {
        warn!("event=export_share module=ffi status=error");
        messages::EXPORT_FAILED.to_string()
    }
}

fn lock_session(cell: &Mutex<Session>) -> MutexGuard<'_, Session> {
    cell.lock().unwrap_or_else(|poisoned| {
        warn!("event=session_lock module=ffi status=recovered");
        poisoned.into_inner()
    })
}

fn with_session<T>(f: impl FnOnce(&mut Session) -> Result<T, String>) -> Result<T, String> {
    let cell = SESSION.get_or_init(|| {
        let config = CoreConfig::resolve(None);
        Mutex::new(Session::new(config))
    });
    let mut session = lock_session(cell);
    f(&mut session)
}

fn with_book_service<T>(
    f: impl FnOnce(&BookService<SqliteBookRepository<'_>>, &CoreConfig) -> Result<T, String>,
) -> Result<T, String> {
    with_session(|session| {
        let Session { config, db } = session;
        let conn = db
            .connection()
            .map_err(|err| format!("book DB open failed: {err}"))?;
        let repo = SqliteBookRepository::try_new(conn)
            .map_err(|err| format!("book repo init failed: {err}"))?;
        f(&BookService::new(repo), config)
    })
}

fn to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
