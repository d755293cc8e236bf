//! Book repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide stable CRUD and query APIs over the `books` table.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths call `validate()` before SQL mutations.
//! - Read paths reject rows whose columns are not UTF-8 text
//!   (`RepoError::InvalidData`) instead of masking them. Stored text is
//!   returned as-is; whitespace-only titles from older writers stay readable.
//! - Unordered reads return storage order (ascending `id`).
//! - `delete_book` on a missing id is a no-op; `update_book` is not.

use crate::db::DbError;
use crate::model::book::{Book, BookField, BookId, BookValidationError, NewBook, SortField};
use rusqlite::types::{Value, ValueRef};
use rusqlite::{params, params_from_iter, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const BOOK_SELECT_SQL: &str = "SELECT
    id,
    title,
    author,
    location
FROM books";

const LIKE_ESCAPE: char = '\\';

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for book persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(BookValidationError),
    Db(DbError),
    NotFound(BookId),
    /// A stored row does not have the shape of a book record.
    InvalidData(String),
    /// Page numbers are 1-based and limits must be positive.
    InvalidPage {
        page: u32,
        limit: u32,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "book not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted book data: {message}"),
            Self::InvalidPage { page, limit } => {
                write!(f, "invalid page request: page={page} limit={limit}")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) | Self::InvalidPage { .. } => None,
        }
    }
}

impl From<BookValidationError> for RepoError {
    fn from(value: BookValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Query options for listing books.
#[derive(Debug, Clone, Default)]
pub struct BookListQuery {
    /// `None` keeps storage order.
    pub order: Option<SortField>,
    pub limit: Option<u32>,
    pub offset: u32,
}

impl BookListQuery {
    pub fn ordered_by(field: SortField) -> Self {
        Self {
            order: Some(field),
            ..Self::default()
        }
    }
}

/// 1-based page request in storage order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    pub fn new(page: u32, limit: u32) -> Self {
        Self { page, limit }
    }

    /// Row offset of the first record on this page.
    pub fn offset(&self) -> RepoResult<u32> {
        if self.page == 0 || self.limit == 0 {
            return Err(RepoError::InvalidPage {
                page: self.page,
                limit: self.limit,
            });
        }
        (self.page - 1)
            .checked_mul(self.limit)
            .ok_or(RepoError::InvalidPage {
                page: self.page,
                limit: self.limit,
            })
    }
}

/// `LIKE` pattern built from user text.
///
/// `%`, `_` and the escape character in user text are escaped, so the text
/// is always matched literally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikePattern(String);

impl LikePattern {
    /// Matches values containing `text` anywhere.
    pub fn substring(text: &str) -> Self {
        Self(format!("%{}%", escape_like(text)))
    }

    /// Matches values starting with `text`.
    pub fn prefix(text: &str) -> Self {
        Self(format!("{}%", escape_like(text)))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// Number of books stored under one location value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationCount {
    pub location: String,
    pub count: u64,
}

/// Repository interface for book CRUD and query operations.
pub trait BookRepository {
    fn insert_book(&self, book: &NewBook) -> RepoResult<BookId>;
    /// Inserts every book in one transaction; nothing is written on error.
    fn insert_books(&self, books: &[NewBook]) -> RepoResult<Vec<BookId>>;
    fn get_book(&self, id: BookId) -> RepoResult<Option<Book>>;
    fn list_books(&self, query: &BookListQuery) -> RepoResult<Vec<Book>>;
    fn fetch_page(&self, page: PageRequest) -> RepoResult<Vec<Book>>;
    fn update_book(&self, book: &Book) -> RepoResult<()>;
    /// Returns whether a row was removed.
    fn delete_book(&self, id: BookId) -> RepoResult<bool>;
    fn search_field(&self, field: BookField, pattern: &LikePattern) -> RepoResult<Vec<Book>>;
    /// Location groups in order of first appearance.
    fn location_counts(&self) -> RepoResult<Vec<LocationCount>>;
}

/// SQLite-backed book repository.
pub struct SqliteBookRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBookRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Creates a repository after checking that the `books` table exists.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'books'
            );",
            [],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::InvalidData(
                "books table is missing; open the database through db::open_db".to_string(),
            ));
        }
        Ok(Self::new(conn))
    }

    fn query_books(&self, sql: &str, bind_values: Vec<Value>) -> RepoResult<Vec<Book>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut books = Vec::new();

        while let Some(row) = rows.next()? {
            books.push(parse_book_row(row)?);
        }

        Ok(books)
    }
}

impl BookRepository for SqliteBookRepository<'_> {
    fn insert_book(&self, book: &NewBook) -> RepoResult<BookId> {
        book.validate()?;
        insert_row(self.conn, book)
    }

    fn insert_books(&self, books: &[NewBook]) -> RepoResult<Vec<BookId>> {
        for book in books {
            book.validate()?;
        }

        let tx = self.conn.unchecked_transaction()?;
        let mut ids = Vec::with_capacity(books.len());
        for book in books {
            ids.push(insert_row(&tx, book)?);
        }
        tx.commit()?;

        Ok(ids)
    }

    fn get_book(&self, id: BookId) -> RepoResult<Option<Book>> {
        let mut books = self.query_books(
            &format!("{BOOK_SELECT_SQL} WHERE id = ?;"),
            vec![Value::Integer(id.0)],
        )?;
        Ok(books.pop())
    }

    fn list_books(&self, query: &BookListQuery) -> RepoResult<Vec<Book>> {
        let mut sql = String::from(BOOK_SELECT_SQL);
        let mut bind_values: Vec<Value> = Vec::new();

        match query.order {
            Some(field) => {
                sql.push_str(&format!(" ORDER BY {} ASC, id ASC", field.column()));
            }
            None => sql.push_str(" ORDER BY id ASC"),
        }

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        self.query_books(&sql, bind_values)
    }

    fn fetch_page(&self, page: PageRequest) -> RepoResult<Vec<Book>> {
        let offset = page.offset()?;
        self.list_books(&BookListQuery {
            order: None,
            limit: Some(page.limit),
            offset,
        })
    }

    fn update_book(&self, book: &Book) -> RepoResult<()> {
        book.validate()?;

        let changed = self.conn.execute(
            "UPDATE books
             SET
                title = ?1,
                author = ?2,
                location = ?3
             WHERE id = ?4;",
            params![
                book.title.as_str(),
                book.author.as_str(),
                book.location.as_str(),
                book.id.0,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(book.id));
        }

        Ok(())
    }

    fn delete_book(&self, id: BookId) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM books WHERE id = ?1;", [id.0])?;
        Ok(changed > 0)
    }

    fn search_field(&self, field: BookField, pattern: &LikePattern) -> RepoResult<Vec<Book>> {
        let sql = format!(
            "{BOOK_SELECT_SQL} WHERE {} LIKE ? ESCAPE '{LIKE_ESCAPE}' ORDER BY id ASC;",
            field.column()
        );
        self.query_books(&sql, vec![Value::Text(pattern.as_str().to_string())])
    }

    fn location_counts(&self) -> RepoResult<Vec<LocationCount>> {
        let mut stmt = self.conn.prepare(
            "SELECT location, COUNT(*) AS book_count
             FROM books
             GROUP BY location
             ORDER BY MIN(id) ASC;",
        )?;
        let mut rows = stmt.query([])?;
        let mut counts = Vec::new();

        while let Some(row) = rows.next()? {
            let count: i64 = row.get("book_count")?;
            counts.push(LocationCount {
                location: text_column(row, "location")?,
                count: u64::try_from(count).map_err(|_| {
                    RepoError::InvalidData(format!("negative location count `{count}`"))
                })?,
            });
        }

        Ok(counts)
    }
}

fn insert_row(conn: &Connection, book: &NewBook) -> RepoResult<BookId> {
    conn.execute(
        "INSERT INTO books (title, author, location) VALUES (?1, ?2, ?3);",
        params![
            book.title.as_str(),
            book.author.as_str(),
            book.location.as_str()
        ],
    )?;
    Ok(BookId(conn.last_insert_rowid()))
}

fn parse_book_row(row: &Row<'_>) -> RepoResult<Book> {
    Ok(Book {
        id: BookId(row.get("id")?),
        title: text_column(row, "title")?,
        author: text_column(row, "author")?,
        location: text_column(row, "location")?,
    })
}

fn text_column(row: &Row<'_>, column: &str) -> RepoResult<String> {
    match row.get_ref(column)? {
        ValueRef::Text(bytes) => String::from_utf8(bytes.to_vec()).map_err(|_| {
            RepoError::InvalidData(format!("non UTF-8 text in books.{column}"))
        }),
        other => Err(RepoError::InvalidData(format!(
            "expected text in books.{column}, found {}",
            other.data_type()
        ))),
    }
}

fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch == '%' || ch == '_' || ch == LIKE_ESCAPE {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(ch);
    }
    escaped
}
