#![doc = include_str!("../README.md")]

pub use keymap_tokenizer::{LexError, LexErrorKind, Span, Token, TokenKind, Tokenizer};

mod error;
pub use error::{ParseError, SyntaxError, SyntaxErrorKind};

mod node;
pub use node::{Node, Property, Walk};

mod parser;
pub use parser::{ParseOptions, Parser};

/// Parse keymap source into its root node with default options.
pub fn parse(source: &str) -> Result<Node<'_>, ParseError> {
    Parser::new(source).parse()
}
