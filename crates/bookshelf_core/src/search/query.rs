//! Multi-field and prefix search over the book repository.
//!
//! # Responsibility
//! - Run one substring search per text column and merge the hits.
//! - Run title prefix search for the letter-search screen.
//!
//! # Invariants
//! - Merged results contain each book id at most once; first occurrence wins.
//! - Merge order is title hits, then new author hits, then new location hits.
//! - Blank queries are rejected before any DB call.
//! - Undecodable rows degrade to an empty result with a warning; DB
//!   failures propagate unchanged.

use crate::model::book::{Book, BookField};
use crate::repo::book_repo::{BookRepository, LikePattern, RepoError, RepoResult};
use log::{debug, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type for search APIs.
pub type SearchResult<T> = Result<T, SearchError>;

#[derive(Debug)]
pub enum SearchError {
    /// Query text is empty or whitespace only.
    EmptyQuery,
    Repo(RepoError),
}

impl Display for SearchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyQuery => write!(f, "search query cannot be empty"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SearchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::EmptyQuery => None,
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<RepoError> for SearchError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Search hits plus an optional data-format warning for the caller to show.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResults {
    pub items: Vec<Book>,
    /// Set when stored rows could not be decoded; `items` is empty then.
    pub data_format_warning: Option<String>,
}

impl SearchResults {
    fn found(items: Vec<Book>) -> Self {
        Self {
            items,
            data_format_warning: None,
        }
    }

    fn degraded(message: String) -> Self {
        Self {
            items: Vec::new(),
            data_format_warning: Some(message),
        }
    }
}

/// Searches title, author and location for `query` as a substring.
pub fn search_any_field<R>(repo: &R, query: &str) -> SearchResult<SearchResults>
where
    R: BookRepository + ?Sized,
{
    let text = query.trim();
    if text.is_empty() {
        return Err(SearchError::EmptyQuery);
    }

    let pattern = LikePattern::substring(text);
    let searched = (|| -> RepoResult<[Vec<Book>; 3]> {
        Ok([
            repo.search_field(BookField::Title, &pattern)?,
            repo.search_field(BookField::Author, &pattern)?,
            repo.search_field(BookField::Location, &pattern)?,
        ])
    })();

    match searched {
        Ok([by_title, by_author, by_location]) => {
            let items = merge_unique(by_title, by_author, by_location);
            debug!(
                "event=search_any_field module=search status=ok hits={}",
                items.len()
            );
            Ok(SearchResults::found(items))
        }
        Err(err) => degrade("search_any_field", err),
    }
}

/// Returns books whose title starts with `letter`.
pub fn search_by_letter<R>(repo: &R, letter: &str) -> SearchResult<SearchResults>
where
    R: BookRepository + ?Sized,
{
    if letter.is_empty() {
        return Err(SearchError::EmptyQuery);
    }

    match repo.search_field(BookField::Title, &LikePattern::prefix(letter)) {
        Ok(items) => {
            debug!(
                "event=search_by_letter module=search status=ok hits={}",
                items.len()
            );
            Ok(SearchResults::found(items))
        }
        Err(err) => degrade("search_by_letter", err),
    }
}

/// Concatenates the three hit lists and drops repeated book ids.
pub fn merge_unique(by_title: Vec<Book>, by_author: Vec<Book>, by_location: Vec<Book>) -> Vec<Book> {
    let mut seen = HashSet::new();
    by_title
        .into_iter()
        .chain(by_author)
        .chain(by_location)
        .filter(|book| seen.insert(book.id))
        .collect()
}

fn degrade(event: &str, err: RepoError) -> SearchResult<SearchResults> {
    match err {
        RepoError::InvalidData(message) => {
            warn!("event={event} module=search status=degraded error_code=data_format error={message}");
            Ok(SearchResults::degraded(message))
        }
        other => Err(SearchError::Repo(other)),
    }
}
