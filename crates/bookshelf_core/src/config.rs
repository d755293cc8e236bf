//! Filesystem layout and environment overrides for core storage.
//!
//! # Responsibility
//! - Derive database, export, scratch and log locations from one data dir.
//! - Apply `BOOKSHELF_*` environment overrides.
//!
//! # Invariants
//! - Blank override values are ignored.
//! - Resolution never touches the filesystem; [`CoreConfig::ensure_dirs`] does.

use std::path::{Path, PathBuf};

/// Database file name inside the data directory.
pub const DB_FILE_NAME: &str = "books.db";
pub const DB_PATH_ENV: &str = "BOOKSHELF_DB_PATH";
pub const EXPORT_DIR_ENV: &str = "BOOKSHELF_EXPORT_DIR";
pub const DATA_DIR_ENV: &str = "BOOKSHELF_DATA_DIR";
const DEFAULT_DATA_DIR_NAME: &str = "bookshelf";

/// Resolved storage locations used by the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    /// App-private directory receiving `books_export.json`.
    pub export_dir: PathBuf,
    /// Private directory for binary copies of picked import files.
    pub scratch_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl CoreConfig {
    /// Lays out every location beneath `data_dir`.
    pub fn from_data_dir(data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref();
        Self {
            db_path: data_dir.join(DB_FILE_NAME),
            export_dir: data_dir.join("exports"),
            scratch_dir: data_dir.join("import-cache"),
            log_dir: data_dir.join("logs"),
        }
    }

    /// Resolves the layout from an optional caller-supplied data dir, the
    /// process environment and finally the system temp dir.
    pub fn resolve(data_dir: Option<&str>) -> Self {
        Self::resolve_with(data_dir, |key| std::env::var(key).ok())
    }

    /// Same as [`CoreConfig::resolve`] with an injectable env lookup.
    pub fn resolve_with(data_dir: Option<&str>, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let base = non_blank(data_dir.map(str::to_string))
            .or_else(|| non_blank(lookup(DATA_DIR_ENV)))
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DATA_DIR_NAME));

        let mut config = Self::from_data_dir(base);
        if let Some(path) = non_blank(lookup(DB_PATH_ENV)) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(path) = non_blank(lookup(EXPORT_DIR_ENV)) {
            config.export_dir = PathBuf::from(path);
        }
        config
    }

    /// Creates every directory the core writes into.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        if let Some(parent) = self.db_path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::create_dir_all(&self.export_dir)?;
        std::fs::create_dir_all(&self.scratch_dir)?;
        std::fs::create_dir_all(&self.log_dir)?;
        Ok(())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{CoreConfig, DATA_DIR_ENV, DB_FILE_NAME, DB_PATH_ENV};
    use std::path::PathBuf;

    #[test]
    fn explicit_data_dir_wins_over_env() {
        let config = CoreConfig::resolve_with(Some("/data/app"), |key| {
            (key == DATA_DIR_ENV).then(|| "/elsewhere".to_string())
        });
        assert_eq!(config.db_path, PathBuf::from("/data/app").join(DB_FILE_NAME));
    }

    #[test]
    fn db_path_override_replaces_only_db_path() {
        let config = CoreConfig::resolve_with(Some("/data/app"), |key| {
            (key == DB_PATH_ENV).then(|| " /custom/books.sqlite ".to_string())
        });
        assert_eq!(config.db_path, PathBuf::from("/custom/books.sqlite"));
        assert_eq!(config.export_dir, PathBuf::from("/data/app/exports"));
    }

    #[test]
    fn blank_values_fall_back_to_temp_dir() {
        let config = CoreConfig::resolve_with(Some("  "), |_| Some(String::new()));
        assert!(config.db_path.starts_with(std::env::temp_dir()));
    }
}
