//! Book domain model.
//!
//! # Responsibility
//! - Define the single persisted record and its write-side draft.
//! - Provide validation for repository writes and the stricter add/edit flow.
//!
//! # Invariants
//! - `id` is assigned by storage and never changes for a record.
//! - `title` is never blank when written through this crate.
//! - `author` and `location` are always present strings (possibly empty).

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage-assigned identifier of a book row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(pub i64);

impl Display for BookId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Committed book record as read back from storage.
///
/// Field order and names double as the export file schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    /// Free-text shelf/location description.
    pub location: String,
}

impl Book {
    /// Returns the mutable fields as a draft, e.g. for re-insertion.
    pub fn to_draft(&self) -> NewBook {
        NewBook::new(
            self.title.as_str(),
            self.author.as_str(),
            self.location.as_str(),
        )
    }

    pub fn validate(&self) -> Result<(), BookValidationError> {
        validate_title(self.title.as_str())
    }
}

/// Book fields before storage assigns an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub location: String,
}

impl NewBook {
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            location: location.into(),
        }
    }

    /// Storage-level validation: only `title` is required.
    ///
    /// Import and edit paths rely on this permissive rule.
    pub fn validate(&self) -> Result<(), BookValidationError> {
        validate_title(self.title.as_str())
    }

    /// Add-flow validation: every field must be non-blank.
    pub fn validate_complete(&self) -> Result<(), BookValidationError> {
        validate_title(self.title.as_str())?;
        if self.author.trim().is_empty() {
            return Err(BookValidationError::EmptyField(BookField::Author));
        }
        if self.location.trim().is_empty() {
            return Err(BookValidationError::EmptyField(BookField::Location));
        }
        Ok(())
    }

    pub fn into_book(self, id: BookId) -> Book {
        Book {
            id,
            title: self.title,
            author: self.author,
            location: self.location,
        }
    }
}

/// Text column of the `books` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookField {
    Title,
    Author,
    Location,
}

impl BookField {
    /// Column name in the `books` table.
    pub fn column(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Author => "author",
            Self::Location => "location",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "title" => Some(Self::Title),
            "author" => Some(Self::Author),
            "location" => Some(Self::Location),
            _ => None,
        }
    }
}

impl Display for BookField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.column())
    }
}

/// Columns accepted by ordered listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Title,
    Author,
}

impl SortField {
    pub fn column(self) -> &'static str {
        match self {
            Self::Title => BookField::Title.column(),
            Self::Author => BookField::Author.column(),
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match BookField::parse(value)? {
            BookField::Title => Some(Self::Title),
            BookField::Author => Some(Self::Author),
            BookField::Location => None,
        }
    }
}

/// Write-side validation failure for book fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookValidationError {
    EmptyField(BookField),
}

impl Display for BookValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyField(field) => write!(f, "book {field} cannot be empty"),
        }
    }
}

impl Error for BookValidationError {}

fn validate_title(title: &str) -> Result<(), BookValidationError> {
    if title.trim().is_empty() {
        return Err(BookValidationError::EmptyField(BookField::Title));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{BookField, BookValidationError, NewBook, SortField};

    #[test]
    fn storage_validation_only_requires_title() {
        assert!(NewBook::new("A", "", "").validate().is_ok());
        assert_eq!(
            NewBook::new("  ", "author", "shelf").validate(),
            Err(BookValidationError::EmptyField(BookField::Title))
        );
    }

    #[test]
    fn complete_validation_reports_first_blank_field() {
        let err = NewBook::new("Divan", "Hafez", " ")
            .validate_complete()
            .unwrap_err();
        assert_eq!(err, BookValidationError::EmptyField(BookField::Location));
        assert!(err.to_string().contains("location"));
    }

    #[test]
    fn sort_field_rejects_location() {
        assert_eq!(SortField::parse("Author"), Some(SortField::Author));
        assert_eq!(SortField::parse("location"), None);
    }
}
