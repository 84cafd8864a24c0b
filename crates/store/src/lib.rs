//! Seatplan persistence.
//!
//! Classroom data is kept as a handful of named JSON sections (students,
//! constraints, layouts, seating, history, preferences, settings) behind the
//! [`SectionStore`] trait. Repositories translate between those sections and
//! the domain types of `seatplan-core`.

pub mod error;
pub mod repositories;
pub mod store;

pub use error::StoreError;
pub use store::{JsonFileStore, MemoryStore, SectionStore};
