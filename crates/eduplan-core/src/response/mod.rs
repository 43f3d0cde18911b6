//! Post-processing of raw model text: sanitize, parse, validate, reconcile.

pub mod parser;
pub mod reconcile;
pub mod sanitize;

pub use parser::{ParseError, ValidationPolicy, parse_and_validate, parse_and_validate_with};
pub use reconcile::reconcile;
pub use sanitize::sanitize;

/// Maximum length, in characters, of diagnostic excerpts.
pub const EXCERPT_LIMIT: usize = 500;

/// The first [`EXCERPT_LIMIT`] characters of `text`.
///
/// Counts chars, not bytes, so multi-byte text is never split mid-codepoint.
pub fn excerpt(text: &str) -> String {
    text.chars().take(EXCERPT_LIMIT).collect()
}
