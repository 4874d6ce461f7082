//! Store implementations
//!
//! Concrete implementations of the [`crate::core::RecordStore`] contract.
//! Only the in-memory store lives here; a database-backed implementation
//! belongs to the surrounding application.

pub mod memory;

pub use memory::{MemoryRecordStore, UserRecord};
