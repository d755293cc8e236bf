//! Core data layer for the bookshelf catalog app.
//! This crate is the single source of truth for book storage invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;
pub mod transfer;

pub use config::CoreConfig;
pub use db::{DbError, DbHandle, HandleState};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::book::{Book, BookField, BookId, BookValidationError, NewBook, SortField};
pub use repo::book_repo::{
    BookListQuery, BookRepository, LikePattern, LocationCount, PageRequest, RepoError, RepoResult,
    SqliteBookRepository,
};
pub use search::alphabet::{is_alphabet_letter, PERSIAN_ALPHABET};
pub use search::query::{merge_unique, SearchError, SearchResult, SearchResults};
pub use service::book_service::{BookService, BookServiceError, UNKNOWN_LOCATION_LABEL};
pub use transfer::export::{ExportOutcome, ShareTarget, EXPORT_FILE_NAME};
pub use transfer::import::{ImportConfirmer, ImportOutcome, ImportPipeline, ImportReport};
pub use transfer::TransferError;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
