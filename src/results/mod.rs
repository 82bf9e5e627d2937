//! Domain entities returned to callers
//!
//! Providers, their addresses and codes, insurance plans, and the
//! paginated result envelopes built around them.

mod types;

pub use types::*;
