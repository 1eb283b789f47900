//! Recurrence computation and derived overdue state.
//!
//! # Responsibility
//! - Compute the next due instant from a cadence rule, last review and now.
//! - Derive overdue flags and elapsed/remaining durations for display.
//!
//! # Invariants
//! - Every function here is total and pure: no clock reads beyond the `now`
//!   argument, no storage access, no panics on odd input.
//! - Calendar arithmetic uses the wall clock of `now`'s time zone.

pub mod calculator;
pub mod evaluator;
