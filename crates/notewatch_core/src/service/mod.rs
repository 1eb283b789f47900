//! Use-case services.
//!
//! # Responsibility
//! - Orchestrate codec, calculator, ledger and note store into watchlist
//!   operations.
//! - Keep host UI layers decoupled from storage details.

pub mod watch_service;
