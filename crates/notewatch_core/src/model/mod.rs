//! Domain model for watched notes and their review cadence.
//!
//! # Responsibility
//! - Define the typed cadence rule carried by every watched note.
//! - Define derived review states shared by the evaluator and service.
//!
//! # Invariants
//! - Exactly one `CadenceKind` is active per rule.
//! - Fields irrelevant to the active kind are ignored, never rejected.

pub mod cadence;
