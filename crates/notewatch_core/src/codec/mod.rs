//! Cadence tag wire format.
//!
//! # Responsibility
//! - Convert `CadenceRule` to and from the `key=value;...` payload.
//! - Locate, replace, and remove the cadence tag line inside note text.
//!
//! # Invariants
//! - Decoding never fails loudly: malformed segments are skipped and a
//!   payload without a recognizable `type=` decodes to `None`.
//! - A note carries at most one cadence line after `upsert_cadence_line`.

pub mod rule_codec;
pub mod tag_line;
