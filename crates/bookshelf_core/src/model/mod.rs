//! Book domain model.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//!
//! # Invariants
//! - Every book is identified by a storage-assigned `BookId`.
//! - Deletion is a hard delete; there are no tombstones.

pub mod book;
