//! Review ledger: last-reviewed instant per watched note.
//!
//! # Responsibility
//! - Define the get/set contract the engine needs from durable storage.
//! - Provide an in-memory ledger and a SQLite-backed ledger.
//!
//! # Invariants
//! - `record_review` overwrites unconditionally; one entry per note.
//! - Entries are never removed implicitly.
//! - Reads and writes for one note id are atomic with respect to each other.

pub mod review_ledger;
pub mod sqlite_ledger;
