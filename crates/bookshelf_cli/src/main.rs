//! Command-line front end for the bookshelf catalog.
//!
//! # Responsibility
//! - Drive every core use-case from a terminal: CRUD, search, import/export.
//! - Resolve storage paths through `CoreConfig` and log to its log dir.
//!
//! # Invariants
//! - User-facing transfer messages are printed exactly as the core returns them.
//! - Import writes nothing unless confirmed (`--yes` or an interactive `y`).

use anyhow::{bail, Context, Result};
use bookshelf_core::transfer::{export, import};
use bookshelf_core::{
    default_log_level, init_logging, is_alphabet_letter, Book, BookId, BookService, CoreConfig,
    DbHandle, ImportPipeline, SearchResults, SortField, SqliteBookRepository,
};
use clap::{Parser, Subcommand};
use log::info;
use std::io::{self, BufRead, Write};

/// Bookshelf - a local catalog of books and where they are kept
#[derive(Parser, Debug)]
#[command(name = "bookshelf")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Data directory holding the database, exports and logs
    #[arg(short, long, global = true)]
    data_dir: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Add a book; every field is required
    Add {
        title: String,
        author: String,
        location: String,
    },

    /// List all books
    List {
        /// Sort by `title` or `author` instead of storage order
        #[arg(short, long)]
        order: Option<String>,
    },

    /// Show one page of books in storage order
    Page {
        /// 1-based page number
        page: u32,

        #[arg(short, long, default_value_t = 20)]
        limit: u32,
    },

    /// Search title, author and location
    Search { query: String },

    /// List books whose title starts with a letter of the alphabet
    Letter { letter: String },

    /// Replace the fields of a book; only the title is required
    Update {
        id: i64,
        title: String,
        author: String,
        location: String,
    },

    /// Delete a book by id
    Delete { id: i64 },

    /// Import books from a JSON file
    Import {
        path: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Export all books to the export directory
    Export,

    /// Show book counts per location
    Locations,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = CoreConfig::resolve(cli.data_dir.as_deref());
    config
        .ensure_dirs()
        .with_context(|| format!("failed to prepare data dir for {}", config.db_path.display()))?;

    let level = cli.log_level.as_deref().unwrap_or(default_log_level());
    let log_dir = std::env::current_dir()
        .context("failed to resolve working directory")?
        .join(&config.log_dir);
    init_logging(level, &log_dir.to_string_lossy()).context("failed to start logging")?;
    info!("event=cli_start module=cli status=ok command={:?}", cli.command);

    let mut db = DbHandle::file(&config.db_path);
    let conn = db.connection().context("failed to open book database")?;
    let repo = SqliteBookRepository::try_new(conn).context("failed to open book repository")?;
    let service = BookService::new(repo);

    let result = run_command(&cli.command, &service, &config);
    db.close().context("failed to close book database")?;
    result
}

fn run_command(
    command: &Commands,
    service: &BookService<SqliteBookRepository<'_>>,
    config: &CoreConfig,
) -> Result<()> {
    match command {
        Commands::Add {
            title,
            author,
            location,
        } => {
            let book = service.add_book(title.trim(), author.trim(), location.trim())?;
            println!("added {}", format_book(&book));
        }
        Commands::List { order } => {
            let books = match order.as_deref() {
                None => service.list_books()?,
                Some(raw) => {
                    let Some(field) = SortField::parse(raw) else {
                        bail!("unsupported order `{raw}`; use `title` or `author`");
                    };
                    service.list_books_ordered(field)?
                }
            };
            print_books(&books);
        }
        Commands::Page { page, limit } => print_books(&service.fetch_page(*page, *limit)?),
        Commands::Search { query } => print_search(service.search_any_field(query)?),
        Commands::Letter { letter } => {
            let letter = letter.trim();
            if !is_alphabet_letter(letter) {
                bail!("`{letter}` is not a letter of the alphabet");
            }
            print_search(service.search_by_letter(letter)?);
        }
        Commands::Update {
            id,
            title,
            author,
            location,
        } => {
            let book =
                service.update_book(BookId(*id), title.trim(), author.trim(), location.trim())?;
            println!("updated {}", format_book(&book));
        }
        Commands::Delete { id } => {
            if service.delete_book(BookId(*id))? {
                println!("deleted {id}");
            } else {
                println!("no book with id {id}");
            }
        }
        Commands::Import { path, yes } => {
            let pipeline = ImportPipeline::with_default_readers(config.scratch_dir.clone());
            let assume_yes = *yes;
            let mut confirmer = |count: usize| assume_yes || prompt_import(count);
            match service.import_books(&pipeline, Some(path.as_str()), &mut confirmer) {
                Ok(outcome) => {
                    if let Some(message) = outcome.user_message() {
                        println!("{message}");
                    }
                }
                Err(err) => {
                    eprintln!("{}", import::user_message(&err));
                    return Err(err.into());
                }
            }
        }
        Commands::Export => match service.export_all(&config.export_dir, None) {
            Ok(outcome) => {
                println!("{}", outcome.user_message());
                if let Some(path) = outcome.path() {
                    println!("{}", path.display());
                }
            }
            Err(err) => {
                eprintln!("{}", export::user_message(&err));
                return Err(err.into());
            }
        },
        Commands::Locations => {
            for entry in service.location_summary()? {
                println!("{}\t{}", entry.count, entry.location);
            }
        }
    }
    Ok(())
}

fn prompt_import(count: usize) -> bool {
    print!("{} [y/N] ", import_prompt(count));
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    match io::stdin().lock().read_line(&mut answer) {
        Ok(_) => matches!(answer.trim(), "y" | "Y" | "yes"),
        Err(_) => false,
    }
}

fn import_prompt(count: usize) -> String {
    bookshelf_core::transfer::messages::import_confirm_prompt(count)
}

fn print_search(results: SearchResults) {
    if let Some(warning) = results.data_format_warning {
        eprintln!("{warning}");
    }
    print_books(&results.items);
}

fn print_books(books: &[Book]) {
    if books.is_empty() {
        println!("no books");
        return;
    }
    for book in books {
        println!("{}", format_book(book));
    }
}

fn format_book(book: &Book) -> String {
    format!(
        "{}\t{}\t{}\t{}",
        book.id, book.title, book.author, book.location
    )
}
