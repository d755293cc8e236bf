//! Book use-case service.
//!
//! # Responsibility
//! - Provide the use-case API called by the UI collaborator (FFI/CLI).
//! - Apply add/edit-flow validation on top of repository validation.
//! - Wire search and import/export pipelines to the repository.
//!
//! # Invariants
//! - Add rejects any blank field; edit and import only require `title`.
//! - Service APIs never bypass repository persistence contracts.

use crate::model::book::{Book, BookId, BookValidationError, NewBook, SortField};
use crate::repo::book_repo::{
    BookListQuery, BookRepository, LocationCount, PageRequest, RepoError, RepoResult,
};
use crate::search::query::{search_any_field, search_by_letter, SearchResult, SearchResults};
use crate::transfer::export::{export_books, ExportOutcome, ShareTarget};
use crate::transfer::import::{ImportConfirmer, ImportOutcome, ImportPipeline};
use crate::transfer::TransferResult;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// Label used for books stored without a location.
pub const UNKNOWN_LOCATION_LABEL: &str = "نامشخص";

/// Service error for add/edit/delete use-cases.
#[derive(Debug)]
pub enum BookServiceError {
    /// User input failed add/edit validation.
    Validation(BookValidationError),
    BookNotFound(BookId),
    Repo(RepoError),
}

impl Display for BookServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::BookNotFound(id) => write!(f, "book not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for BookServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::BookNotFound(_) => None,
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for BookServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::BookNotFound(id),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<BookValidationError> for BookServiceError {
    fn from(value: BookValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Book service facade over repository implementations.
pub struct BookService<R: BookRepository> {
    repo: R,
}

impl<R: BookRepository> BookService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Adds one book from the add screen.
    ///
    /// # Contract
    /// - Every field must be non-blank.
    /// - Returns the stored record with its assigned id.
    pub fn add_book(
        &self,
        title: impl Into<String>,
        author: impl Into<String>,
        location: impl Into<String>,
    ) -> Result<Book, BookServiceError> {
        let draft = NewBook::new(title, author, location);
        draft.validate_complete()?;
        let id = self.repo.insert_book(&draft)?;
        info!("event=book_add module=service status=ok book_id={id}");
        Ok(draft.into_book(id))
    }

    /// Replaces all mutable fields of an existing book (edit screen).
    ///
    /// Only `title` is required, so imported books with empty author or
    /// location stay editable.
    pub fn update_book(
        &self,
        id: BookId,
        title: impl Into<String>,
        author: impl Into<String>,
        location: impl Into<String>,
    ) -> Result<Book, BookServiceError> {
        let draft = NewBook::new(title, author, location);
        draft.validate()?;
        let book = draft.into_book(id);
        self.repo.update_book(&book)?;
        info!("event=book_update module=service status=ok book_id={id}");
        Ok(book)
    }

    /// Deletes a book; returns `false` when no such book existed.
    pub fn delete_book(&self, id: BookId) -> RepoResult<bool> {
        let removed = self.repo.delete_book(id)?;
        info!("event=book_delete module=service status=ok book_id={id} removed={removed}");
        Ok(removed)
    }

    pub fn get_book(&self, id: BookId) -> RepoResult<Option<Book>> {
        self.repo.get_book(id)
    }

    /// All books in storage order.
    pub fn list_books(&self) -> RepoResult<Vec<Book>> {
        self.repo.list_books(&BookListQuery::default())
    }

    /// All books ascending by `field`.
    pub fn list_books_ordered(&self, field: SortField) -> RepoResult<Vec<Book>> {
        self.repo.list_books(&BookListQuery::ordered_by(field))
    }

    /// One 1-based page of books in storage order.
    pub fn fetch_page(&self, page: u32, limit: u32) -> RepoResult<Vec<Book>> {
        self.repo.fetch_page(PageRequest::new(page, limit))
    }

    pub fn search_any_field(&self, query: &str) -> SearchResult<SearchResults> {
        search_any_field(&self.repo, query)
    }

    pub fn search_by_letter(&self, letter: &str) -> SearchResult<SearchResults> {
        search_by_letter(&self.repo, letter)
    }

    /// Book counts per location; empty locations use
    /// [`UNKNOWN_LOCATION_LABEL`] and are merged into one group.
    /// Whitespace-only locations keep their own group.
    pub fn location_summary(&self) -> RepoResult<Vec<LocationCount>> {
        let mut summary: Vec<LocationCount> = Vec::new();
        for group in self.repo.location_counts()? {
            let label = if group.location.is_empty() {
                UNKNOWN_LOCATION_LABEL.to_string()
            } else {
                group.location
            };
            match summary.iter_mut().find(|entry| entry.location == label) {
                Some(entry) => entry.count += group.count,
                None => summary.push(LocationCount {
                    location: label,
                    count: group.count,
                }),
            }
        }
        Ok(summary)
    }

    /// Exports every stored book into `export_dir`.
    pub fn export_all(
        &self,
        export_dir: &Path,
        share: Option<&dyn ShareTarget>,
    ) -> TransferResult<ExportOutcome> {
        let books = self.list_books()?;
        export_books(&books, export_dir, share)
    }

    /// Runs the import flow for a picked file against this service's store.
    pub fn import_books<C>(
        &self,
        pipeline: &ImportPipeline,
        picked: Option<&str>,
        confirmer: &mut C,
    ) -> TransferResult<ImportOutcome>
    where
        C: ImportConfirmer + ?Sized,
    {
        pipeline.run(&self.repo, picked, confirmer)
    }
}
