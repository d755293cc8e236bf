//! Book search entry points.
//!
//! # Responsibility
//! - Compose multi-field substring search and title prefix search.
//! - Keep result merging inside core as a pure, testable step.

pub mod alphabet;
pub mod query;
