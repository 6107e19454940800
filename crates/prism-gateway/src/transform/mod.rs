//! Request preparation: security screening, validation, effort inference
//!
//! Runs between dialect conversion and the upstream call. Screening
//! mutates message content (control-character stripping) and rejects
//! hostile payloads; validation enforces the canonical invariants;
//! effort inference fills in `reasoning_effort` when the caller left it
//! unset.

pub mod effort;
pub mod security;
pub mod validate;

pub use effort::{EffortPolicy, KeywordEffortPolicy};
pub use security::{screen, screen_body_size};
pub use validate::{clamp_output_tokens, validate};
