//! Low-level lexing failures.

use std::fmt;

use crate::Span;

/// What went wrong while splitting the source into tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexErrorKind {
    /// A `"` string with no closing quote.
    UnterminatedString,
    /// A `/*` comment with no closing `*/`.
    UnterminatedComment,
    /// A modifier expression like `LC(LS(TAB)` whose parentheses don't balance.
    UnbalancedParen,
    /// A `&` that isn't immediately followed by an identifier.
    DanglingAmpersand,
    /// A numeric literal that is malformed or doesn't fit in an `i64`.
    InvalidNumber,
    /// A character that can't start any token.
    UnexpectedChar(char),
}

impl fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LexErrorKind::UnterminatedString => write!(f, "unterminated string"),
            LexErrorKind::UnterminatedComment => write!(f, "unterminated block comment"),
            LexErrorKind::UnbalancedParen => write!(f, "unbalanced parenthesis"),
            LexErrorKind::DanglingAmpersand => write!(f, "`&` must be followed by a name"),
            LexErrorKind::InvalidNumber => write!(f, "invalid number"),
            LexErrorKind::UnexpectedChar(c) => write!(f, "unexpected character {:?}", c),
        }
    }
}

/// A lexing failure with the approximate source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    /// The kind of error.
    pub kind: LexErrorKind,
    /// Where it happened.
    pub span: Span,
}

impl LexError {
    /// Create a new lex error.
    pub fn new(kind: LexErrorKind, span: Span) -> Self {
        Self { kind, span }
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at offset {}", self.kind, self.span.start)
    }
}

impl std::error::Error for LexError {}
