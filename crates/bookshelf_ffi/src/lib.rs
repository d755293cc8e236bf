//! Flutter-facing bindings for the bookshelf core.

pub mod api;
