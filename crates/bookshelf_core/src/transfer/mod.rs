//! JSON import/export of the book catalog.
//!
//! # Responsibility
//! - Read import files through ordered [`reader::FileReader`] strategies.
//! - Validate, confirm and transactionally insert imported books.
//! - Serialize and write the export file, then hand it to a share target.
//!
//! # Invariants
//! - No book is written before the user confirms an import.
//! - An import is all-or-nothing at the storage level.
//! - User-facing messages come from a small fixed set; technical detail
//!   goes to the log only.

use crate::repo::book_repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod export;
pub mod import;
pub mod reader;

pub type TransferResult<T> = Result<T, TransferError>;

/// Error raised by import/export pipelines.
#[derive(Debug)]
pub enum TransferError {
    /// File could not be read or written by any strategy.
    FileAccess(String),
    /// Import content is not JSON, or not a non-empty array.
    Parse(String),
    Repo(RepoError),
    /// Export file was written but handing it to the share target failed.
    Share(String),
}

impl Display for TransferError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FileAccess(message) => write!(f, "file access failed: {message}"),
            Self::Parse(message) => write!(f, "invalid import file: {message}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Share(message) => write!(f, "share failed: {message}"),
        }
    }
}

impl Error for TransferError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::FileAccess(_) | Self::Parse(_) | Self::Share(_) => None,
        }
    }
}

impl From<RepoError> for TransferError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Localized (Persian) messages shown by the UI collaborator.
pub mod messages {
    pub const IMPORT_FAILED: &str = "در وارد کردن فایل مشکلی پیش آمد.";
    pub const IMPORT_INVALID_FILE: &str = "فایل انتخاب‌شده فهرست معتبری از کتاب‌ها نیست.";
    pub const IMPORT_DECLINED: &str = "وارد کردن کتاب‌ها لغو شد.";
    pub const IMPORT_NOTHING_VALID: &str = "هیچ کتاب معتبری در فایل پیدا نشد.";
    pub const EXPORT_NOTHING: &str = "کتابی برای خروجی گرفتن وجود ندارد.";
    pub const EXPORT_FAILED: &str = "ذخیره فایل با مشکل مواجه شد.";
    pub const EXPORT_SHARED: &str = "فایل JSON با موفقیت ذخیره و ارسال شد.";
    pub const EXPORT_PRIVATE_ONLY: &str = "فایل فقط در حافظه داخلی برنامه ذخیره شد.";

    pub fn import_success(count: usize) -> String {
        format!("{count} کتاب با موفقیت وارد شد.")
    }

    pub fn import_confirm_prompt(count: usize) -> String {
        format!("{count} کتاب وارد شود؟")
    }
}
