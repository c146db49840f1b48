//! Error types for pattern construction and parsing.

use thiserror::Error;

/// Errors that can occur when building or parsing a search pattern.
#[derive(Debug, Error)]
pub enum PatternError {
    /// The pattern asks for neither declarations nor references.
    #[error("pattern must find declarations, references, or both")]
    NoSearchTarget,

    /// A regular-expression name could not be compiled.
    #[error("invalid regular expression '{pattern}': {source}")]
    InvalidRegex {
        /// The rejected expression.
        pattern: String,
        /// Underlying regex error.
        source: regex::Error,
    },

    /// A wildcard name could not be compiled.
    #[error("invalid wildcard pattern '{pattern}': {source}")]
    InvalidWildcard {
        /// The rejected wildcard text.
        pattern: String,
        /// Underlying glob error.
        source: globset::Error,
    },

    /// The textual pattern is malformed.
    #[error("{}", format_syntax(.message, .position, .input))]
    Syntax {
        /// Error message.
        message: String,
        /// Byte position in the input where the error occurred.
        position: usize,
        /// The original pattern text.
        input: String,
    },
}

impl PatternError {
    /// Creates a syntax error at a byte position of `input`.
    pub(crate) fn syntax(message: impl Into<String>, position: usize, input: &str) -> Self {
        Self::Syntax {
            message: message.into(),
            position,
            input: input.to_string(),
        }
    }
}

/// Formats a syntax error with a caret line pointing at the offending position.
fn format_syntax(message: &str, position: &usize, input: &str) -> String {
    let position = *position;
    let column = input
        .get(..position)
        .map_or(position, |prefix| prefix.chars().count());
    format!(
        "pattern syntax error: {message}\n  {input}\n  {}^",
        " ".repeat(column)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_error_points_at_position() {
        let err = PatternError::syntax("unexpected ')'", 4, "Foo()) int");
        let rendered = err.to_string();
        assert!(rendered.starts_with("pattern syntax error: unexpected ')'"));
        assert!(rendered.ends_with("\n      ^"));
    }

    #[test]
    fn no_search_target_message() {
        assert_eq!(
            PatternError::NoSearchTarget.to_string(),
            "pattern must find declarations, references, or both"
        );
    }
}
