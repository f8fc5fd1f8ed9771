#![doc = include_str!("../README.md")]

mod error;
pub use error::{LexError, LexErrorKind};

mod span;
pub use span::Span;

mod token;
pub use token::{Token, TokenKind, parse_number};

mod tokenizer;
pub use tokenizer::Tokenizer;
