//! crates/lookup_core/src/validation.rs
//!
//! The pre-submit gate for usernames typed into the search box.

use regex::Regex;
use std::sync::OnceLock;

/// Shortest prefixed input that is checked against the full pattern.
pub const CHECKABLE_LENGTH: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("username is required")]
    Empty,
    #[error("username must start with @")]
    MissingAtPrefix,
    #[error("invalid username: use @ followed by 5-32 letters, digits or underscores")]
    InvalidFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationPolicy {
    /// When set, usernames must be written as `@handle`.
    pub require_at_prefix: bool,
}

fn handle_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^@[A-Za-z0-9_]{5,32}$").expect("static pattern compiles"))
}

impl ValidationPolicy {
    /// Validates raw input.
    ///
    /// A prefixed value shorter than [`CHECKABLE_LENGTH`] is provisionally valid:
    /// it is not reported until it is long enough to check.
    pub fn validate(&self, input: &str) -> Result<(), ValidationError> {
        if input.trim().is_empty() {
            return Err(ValidationError::Empty);
        }
        if !self.require_at_prefix {
            return Ok(());
        }
        if !input.starts_with('@') {
            return Err(ValidationError::MissingAtPrefix);
        }
        if input.chars().count() >= CHECKABLE_LENGTH && !handle_pattern().is_match(input) {
            return Err(ValidationError::InvalidFormat);
        }
        Ok(())
    }
}
