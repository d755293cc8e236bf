use bookshelf_core::db::open_db_in_memory;
use bookshelf_core::{
    BookField, BookId, BookListQuery, BookRepository, BookService, BookServiceError,
    BookValidationError, ExportOutcome, NewBook, RepoError, SortField, SqliteBookRepository,
    UNKNOWN_LOCATION_LABEL,
};
use std::collections::HashSet;

#[test]
fn insert_and_get_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBookRepository::try_new(&conn).unwrap();

    let id = repo
        .insert_book(&NewBook::new("شاهنامه", "فردوسی", "قفسه الف"))
        .unwrap();

    let loaded = repo.get_book(id).unwrap().unwrap();
    assert_eq!(loaded.id, id);
    assert_eq!(loaded.title, "شاهنامه");
    assert_eq!(loaded.author, "فردوسی");
    assert_eq!(loaded.location, "قفسه الف");
}

#[test]
fn inserted_ids_are_unique() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBookRepository::try_new(&conn).unwrap();

    let mut seen = HashSet::new();
    for index in 0..25 {
        let id = repo
            .insert_book(&NewBook::new(format!("book {index}"), "", ""))
            .unwrap();
        assert!(seen.insert(id), "id {id} was issued twice");
    }
}

#[test]
fn blank_title_is_rejected_on_insert() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBookRepository::try_new(&conn).unwrap();

    let err = repo.insert_book(&NewBook::new("   ", "x", "y")).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(BookValidationError::EmptyField(BookField::Title))
    ));
    assert!(repo.list_books(&BookListQuery::default()).unwrap().is_empty());
}

#[test]
fn list_without_order_follows_insertion() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBookRepository::try_new(&conn).unwrap();

    for title in ["c", "a", "b"] {
        repo.insert_book(&NewBook::new(title, "", "")).unwrap();
    }

    let books = repo.list_books(&BookListQuery::default()).unwrap();
    let titles = titles(&books);
    assert_eq!(titles, vec!["c", "a", "b"]);
}

#[test]
fn ordered_by_title_puts_divan_before_shahnameh() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBookRepository::try_new(&conn).unwrap();
    repo.insert_book(&NewBook::new("Shahnameh", "Ferdowsi", "Shelf A"))
        .unwrap();
    repo.insert_book(&NewBook::new("Divan", "Hafez", "Shelf B"))
        .unwrap();

    let by_title = repo
        .list_books(&BookListQuery::ordered_by(SortField::Title))
        .unwrap();
    assert_eq!(titles(&by_title), vec!["Divan", "Shahnameh"]);

    let by_author = repo
        .list_books(&BookListQuery::ordered_by(SortField::Author))
        .unwrap();
    assert_eq!(titles(&by_author), vec!["Shahnameh", "Divan"]);
}

#[test]
fn ordering_is_bytewise_for_persian_titles() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBookRepository::try_new(&conn).unwrap();
    for title in ["گلستان", "بوستان", "دیوان"] {
        repo.insert_book(&NewBook::new(title, "", "")).unwrap();
    }

    let books = repo
        .list_books(&BookListQuery::ordered_by(SortField::Title))
        .unwrap();
    let ordered = titles(&books);
    let mut expected = vec!["گلستان", "بوستان", "دیوان"];
    expected.sort_by(|a, b| a.as_bytes().cmp(b.as_bytes()));
    assert_eq!(ordered, expected);
}

#[test]
fn fetch_page_slices_storage_order() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBookRepository::try_new(&conn).unwrap();
    for index in 1..=5 {
        repo.insert_book(&NewBook::new(format!("b{index}"), "", ""))
            .unwrap();
    }

    let service = BookService::new(repo);
    assert_eq!(titles(&service.fetch_page(1, 2).unwrap()), vec!["b1", "b2"]);
    assert_eq!(titles(&service.fetch_page(3, 2).unwrap()), vec!["b5"]);
    assert!(service.fetch_page(4, 2).unwrap().is_empty());
    assert!(matches!(
        service.fetch_page(0, 2).unwrap_err(),
        RepoError::InvalidPage { page: 0, limit: 2 }
    ));
}

#[test]
fn update_replaces_all_fields() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBookRepository::try_new(&conn).unwrap();
    let id = repo
        .insert_book(&NewBook::new("draft", "someone", "box"))
        .unwrap();

    let mut book = repo.get_book(id).unwrap().unwrap();
    book.title = "Masnavi".to_string();
    book.author = "Rumi".to_string();
    book.location = "Shelf C".to_string();
    repo.update_book(&book).unwrap();

    assert_eq!(repo.get_book(id).unwrap().unwrap(), book);
}

#[test]
fn update_missing_id_returns_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBookRepository::try_new(&conn).unwrap();

    let ghost = NewBook::new("ghost", "", "").into_book(BookId(9999));
    let err = repo.update_book(&ghost).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(BookId(9999))));
}

#[test]
fn delete_is_idempotent() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBookRepository::try_new(&conn).unwrap();
    let keep = repo.insert_book(&NewBook::new("keep", "", "")).unwrap();
    let drop_id = repo.insert_book(&NewBook::new("drop", "", "")).unwrap();

    assert!(repo.delete_book(drop_id).unwrap());
    let after_once = repo.list_books(&BookListQuery::default()).unwrap();

    assert!(!repo.delete_book(drop_id).unwrap());
    let after_twice = repo.list_books(&BookListQuery::default()).unwrap();

    assert_eq!(after_once, after_twice);
    assert_eq!(after_twice.len(), 1);
    assert_eq!(after_twice[0].id, keep);
}

#[test]
fn delete_missing_id_leaves_store_unchanged() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBookRepository::try_new(&conn).unwrap();
    repo.insert_book(&NewBook::new("only", "", "")).unwrap();
    let before = repo.list_books(&BookListQuery::default()).unwrap();

    assert!(!repo.delete_book(BookId(9999)).unwrap());
    assert_eq!(repo.list_books(&BookListQuery::default()).unwrap(), before);
}

#[test]
fn insert_books_is_all_or_nothing() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TRIGGER reject_poison BEFORE INSERT ON books
         WHEN NEW.title = 'poison'
         BEGIN SELECT RAISE(ABORT, 'poisoned row'); END;",
    )
    .unwrap();
    let repo = SqliteBookRepository::try_new(&conn).unwrap();

    let batch = vec![
        NewBook::new("first", "", ""),
        NewBook::new("poison", "", ""),
        NewBook::new("third", "", ""),
    ];
    let err = repo.insert_books(&batch).unwrap_err();
    assert!(matches!(err, RepoError::Db(_)));
    assert!(repo.list_books(&BookListQuery::default()).unwrap().is_empty());

    let ids = repo.insert_books(&batch[..1]).unwrap();
    assert_eq!(ids.len(), 1);
}

#[test]
fn undecodable_row_is_reported_as_invalid_data() {
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO books (title, author, location) VALUES (X'00FF', 'a', 'b')",
        [],
    )
    .unwrap();
    let repo = SqliteBookRepository::try_new(&conn).unwrap();

    let err = repo.list_books(&BookListQuery::default()).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(message) if message.contains("books.title")));
}

#[test]
fn service_add_requires_every_field() {
    let conn = open_db_in_memory().unwrap();
    let service = BookService::new(SqliteBookRepository::try_new(&conn).unwrap());

    let err = service.add_book("Divan", "", "Shelf B").unwrap_err();
    assert!(matches!(
        err,
        BookServiceError::Validation(BookValidationError::EmptyField(BookField::Author))
    ));

    let added = service.add_book("Divan", "Hafez", "Shelf B").unwrap();
    assert_eq!(service.get_book(added.id).unwrap(), Some(added));
}

#[test]
fn service_update_maps_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = BookService::new(SqliteBookRepository::try_new(&conn).unwrap());

    let err = service
        .update_book(BookId(42), "t", "a", "l")
        .unwrap_err();
    assert!(matches!(err, BookServiceError::BookNotFound(BookId(42))));
}

#[test]
fn location_summary_relabels_only_empty_locations() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteBookRepository::try_new(&conn).unwrap();
    repo.insert_book(&NewBook::new("a", "", "Shelf A")).unwrap();
    repo.insert_book(&NewBook::new("b", "", "")).unwrap();
    repo.insert_book(&NewBook::new("c", "", "Shelf A")).unwrap();
    repo.insert_book(&NewBook::new("d", "", " ")).unwrap();

    let summary = BookService::new(repo).location_summary().unwrap();
    let pairs = summary
        .iter()
        .map(|entry| (entry.location.as_str(), entry.count))
        .collect::<Vec<_>>();
    assert_eq!(
        pairs,
        vec![("Shelf A", 2), (UNKNOWN_LOCATION_LABEL, 1), (" ", 1)]
    );
}

#[test]
fn whitespace_title_rows_stay_listable() {
    let dir = tempfile::tempdir().unwrap();
    let conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO books (title, author, location) VALUES (' ', 'a', 'b')",
        [],
    )
    .unwrap();
    let service = BookService::new(SqliteBookRepository::try_new(&conn).unwrap());
    service.add_book("Divan", "Hafez", "Shelf B").unwrap();

    let books = service.list_books().unwrap();
    assert_eq!(titles(&books), vec![" ", "Divan"]);
    assert_eq!(service.get_book(books[0].id).unwrap(), Some(books[0].clone()));
    assert!(matches!(
        service.export_all(dir.path(), None).unwrap(),
        ExportOutcome::SavedPrivately(_)
    ));
}

#[test]
fn service_update_requires_only_title() {
    let conn = open_db_in_memory().unwrap();
    let service = BookService::new(SqliteBookRepository::try_new(&conn).unwrap());
    let id = service
        .repository()
        .insert_book(&NewBook::new("Masnavi", "", ""))
        .unwrap();

    let updated = service.update_book(id, "Masnavi-ye Ma'navi", "", "").unwrap();
    assert_eq!(updated.title, "Masnavi-ye Ma'navi");
    assert_eq!(updated.author, "");

    let err = service.update_book(id, " ", "Rumi", "Shelf C").unwrap_err();
    assert!(matches!(
        err,
        BookServiceError::Validation(BookValidationError::EmptyField(BookField::Title))
    ));
    assert_eq!(service.get_book(id).unwrap(), Some(updated));
}

fn titles(books: &[bookshelf_core::Book]) -> Vec<&str> {
    books.iter().map(|book| book.title.as_str()).collect()
}
