//! Lazily opened, explicitly owned database handle.
//!
//! # Responsibility
//! - Hold at most one open connection for one database location.
//! - Open on first use, cache for reuse, and tear down on request.
//!
//! # Invariants
//! - State is `Closed` until the first successful [`DbHandle::connection`].
//! - After [`DbHandle::close`], the next use re-opens lazily.
//! - A failed open leaves the handle `Closed`.

use super::open::{open_db, open_db_in_memory};
use super::DbResult;
use log::{info, warn};
use rusqlite::Connection;
use std::path::{Path, PathBuf};

/// Where a [`DbHandle`] opens its connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbLocation {
    File(PathBuf),
    /// Private in-memory database; contents are dropped on close.
    Memory,
}

/// Connection lifecycle state of a [`DbHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    Closed,
    Open,
}

/// Owned database handle with lazy-open semantics.
#[derive(Debug)]
pub struct DbHandle {
    location: DbLocation,
    conn: Option<Connection>,
}

impl DbHandle {
    pub fn new(location: DbLocation) -> Self {
        Self {
            location,
            conn: None,
        }
    }

    /// Handle for a database file at `path`.
    pub fn file(path: impl AsRef<Path>) -> Self {
        Self::new(DbLocation::File(path.as_ref().to_path_buf()))
    }

    pub fn in_memory() -> Self {
        Self::new(DbLocation::Memory)
    }

    pub fn location(&self) -> &DbLocation {
        &self.location
    }

    pub fn state(&self) -> HandleState {
        if self.conn.is_some() {
            HandleState::Open
        } else {
            HandleState::Closed
        }
    }

    /// Returns the cached connection, opening and initializing it first if
    /// the handle is closed.
    pub fn connection(&mut self) -> DbResult<&Connection> {
        let conn = match self.conn.take() {
            Some(conn) => conn,
            None => self.open_connection()?,
        };
        Ok(self.conn.insert(conn))
    }

    /// Closes the cached connection. A closed handle is left untouched.
    ///
    /// On failure the connection stays cached and the handle stays `Open`.
    pub fn close(&mut self) -> DbResult<()> {
        let Some(conn) = self.conn.take() else {
            return Ok(());
        };

        match conn.close() {
            Ok(()) => {
                info!("event=db_close module=db status=ok");
                Ok(())
            }
            Err((conn, err)) => {
                warn!("event=db_close module=db status=error error={err}");
                self.conn = Some(conn);
                Err(err.into())
            }
        }
    }

    fn open_connection(&self) -> DbResult<Connection> {
        match &self.location {
            DbLocation::File(path) => open_db(path),
            DbLocation::Memory => open_db_in_memory(),
        }
    }
}
