//! Errors raised while building the node tree.

use std::fmt;

use keymap_tokenizer::{LexError, Span};

/// Structural problems in the brace/property grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxErrorKind {
    /// A token that doesn't fit here.
    UnexpectedToken {
        /// What the parser was looking for.
        expected: &'static str,
    },
    /// Input ended in the middle of a statement.
    UnexpectedEof {
        /// What the parser was looking for.
        expected: &'static str,
    },
    /// A `<` array that reaches `;` without its `>`.
    UnclosedArray,
    /// A node body that reaches end of input without its `}`.
    UnclosedNode,
    /// Nodes nested deeper than [`crate::ParseOptions::max_depth`].
    TooDeep {
        /// The configured limit.
        limit: usize,
    },
}

/// A syntax error with the offending token and its position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    /// The kind of error.
    pub kind: SyntaxErrorKind,
    /// Source location.
    pub span: Span,
    /// Source text of the offending token, if there was one.
    pub found: Option<String>,
}

impl SyntaxError {
    /// Create a new syntax error.
    pub fn new(kind: SyntaxErrorKind, span: Span, found: Option<String>) -> Self {
        Self { kind, span, found }
    }
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            SyntaxErrorKind::UnexpectedToken { expected } => match &self.found {
                Some(found) => write!(f, "expected {}, found `{}`", expected, found),
                None => write!(f, "expected {}", expected),
            },
            SyntaxErrorKind::UnexpectedEof { expected } => {
                write!(f, "unexpected end of input, expected {}", expected)
            }
            SyntaxErrorKind::UnclosedArray => write!(f, "unclosed `<` array"),
            SyntaxErrorKind::UnclosedNode => write!(f, "unclosed node, missing `}}`"),
            SyntaxErrorKind::TooDeep { limit } => {
                write!(f, "nodes nested deeper than {} levels", limit)
            }
        }?;
        write!(f, " at offset {}", self.span.start)
    }
}

impl std::error::Error for SyntaxError {}

/// Any failure that aborts building the node tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The tokenizer rejected the input.
    Lex(LexError),
    /// The tokens don't form valid nodes and properties.
    Syntax(SyntaxError),
}

impl ParseError {
    /// Source location of the failure.
    pub fn span(&self) -> Span {
        match self {
            ParseError::Lex(err) => err.span,
            ParseError::Syntax(err) => err.span,
        }
    }
}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        ParseError::Lex(err)
    }
}

impl From<SyntaxError> for ParseError {
    fn from(err: SyntaxError) -> Self {
        ParseError::Syntax(err)
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Lex(err) => write!(f, "lex error: {}", err),
            ParseError::Syntax(err) => write!(f, "syntax error: {}", err),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseError::Lex(err) => Some(err),
            ParseError::Syntax(err) => Some(err),
        }
    }
}
