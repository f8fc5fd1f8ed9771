//! Tokenizer for device-tree keymap source.

use crate::{LexError, LexErrorKind, Span, Token, TokenKind, parse_number};
use tracing::trace;

/// A tokenizer that produces tokens from keymap source text.
///
/// Whitespace, comments and preprocessor lines are skipped and never show up
/// as tokens. Iteration stops for good after the first [`LexError`].
#[derive(Clone)]
pub struct Tokenizer<'src> {
    /// The source text being tokenized.
    source: &'src str,
    /// The remaining source text (suffix of `source`).
    remaining: &'src str,
    /// Current byte position in `source`.
    pos: u32,
    /// Only whitespace has been seen since the last newline.
    line_start: bool,
    /// An error has been returned; nothing more will be produced.
    failed: bool,
}

impl<'src> Tokenizer<'src> {
    /// Create a new tokenizer for the given source text.
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            remaining: source,
            pos: 0,
            line_start: true,
            failed: false,
        }
    }

    /// Get the current byte position.
    #[inline]
    pub fn position(&self) -> u32 {
        self.pos
    }

    /// Check if we're at the end of input.
    #[inline]
    pub fn is_eof(&self) -> bool {
        self.remaining.is_empty()
    }

    /// Peek at the next character without consuming it.
    #[inline]
    fn peek(&self) -> Option<char> {
        self.remaining.chars().next()
    }

    /// Peek at the nth character (0-indexed) without consuming.
    #[inline]
    fn peek_nth(&self, n: usize) -> Option<char> {
        self.remaining.chars().nth(n)
    }

    /// Advance by one character and return it.
    #[inline]
    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8() as u32;
        self.remaining = &self.remaining[c.len_utf8()..];
        Some(c)
    }

    /// Check if the remaining text starts with the given prefix.
    #[inline]
    fn starts_with(&self, prefix: &str) -> bool {
        self.remaining.starts_with(prefix)
    }

    /// Create a token whose text is its whole span.
    fn token(&self, kind: TokenKind, start: u32) -> Token<'src> {
        let span = Span::new(start, self.pos);
        self.token_with_text(kind, span, span.slice(self.source))
    }

    fn token_with_text(&self, kind: TokenKind, span: Span, text: &'src str) -> Token<'src> {
        trace!("Token {:?} at {:?}: {:?}", kind, span, text);
        Token::new(kind, span, text)
    }

    fn punct(&mut self, kind: TokenKind) -> Token<'src> {
        let start = self.pos;
        self.advance();
        self.token(kind, start)
    }

    fn error(&mut self, kind: LexErrorKind, start: u32) -> LexError {
        self.failed = true;
        LexError::new(kind, Span::new(start, self.pos))
    }

    /// Get the next token, or `None` at end of input.
    pub fn next_token(&mut self) -> Option<Result<Token<'src>, LexError>> {
        if self.failed {
            return None;
        }
        if let Err(err) = self.skip_trivia() {
            return Some(Err(err));
        }

        let start = self.pos;
        let c = self.peek()?;
        self.line_start = false;

        let result = match c {
            '{' => Ok(self.punct(TokenKind::LBrace)),
            '}' => Ok(self.punct(TokenKind::RBrace)),
            ';' => Ok(self.punct(TokenKind::Semi)),
            '=' => Ok(self.punct(TokenKind::Eq)),
            '<' => Ok(self.punct(TokenKind::Lt)),
            '>' => Ok(self.punct(TokenKind::Gt)),
            ':' => Ok(self.punct(TokenKind::Colon)),
            ',' => Ok(self.punct(TokenKind::Comma)),
            '"' => self.tokenize_string(),
            '&' => self.tokenize_reference(),
            '-' if matches!(self.peek_nth(1), Some(d) if d.is_ascii_digit()) => {
                self.tokenize_number()
            }
            _ if c.is_ascii_digit() => self.tokenize_number(),
            _ if is_identifier_start(c) => self.tokenize_identifier(),
            _ => {
                self.advance();
                Err(self.error(LexErrorKind::UnexpectedChar(c), start))
            }
        };
        Some(result)
    }

    /// Skip whitespace, comments and preprocessor lines.
    fn skip_trivia(&mut self) -> Result<(), LexError> {
        loop {
            match self.peek() {
                Some('\n') => {
                    self.advance();
                    self.line_start = true;
                }
                Some(c) if c.is_whitespace() => {
                    self.advance();
                }
                Some('#') if self.line_start => self.skip_directive(),
                Some('/') if self.starts_with("//") => self.skip_line_comment(),
                Some('/') if self.starts_with("/*") => self.skip_block_comment()?,
                _ => return Ok(()),
            }
        }
    }

    /// Skip a preprocessor line such as `#include <behaviors.dtsi>`,
    /// following `\` line continuations.
    fn skip_directive(&mut self) {
        let start = self.pos;
        while let Some(c) = self.advance() {
            match c {
                '\\' if self.starts_with("\r\n") => {
                    self.advance();
                    self.advance();
                }
                '\\' if self.peek() == Some('\n') => {
                    self.advance();
                }
                '\n' => break,
                _ => {}
            }
        }
        trace!("Skipped directive at {}", Span::new(start, self.pos));
    }

    fn skip_line_comment(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.advance();
        }
    }

    fn skip_block_comment(&mut self) -> Result<(), LexError> {
        let start = self.pos;
        // Consume `/*`
        self.advance();
        self.advance();
        loop {
            if self.starts_with("*/") {
                self.advance();
                self.advance();
                return Ok(());
            }
            if self.advance().is_none() {
                return Err(self.error(LexErrorKind::UnterminatedComment, start));
            }
        }
    }

    /// Tokenize a quoted string: `"..."`.
    fn tokenize_string(&mut self) -> Result<Token<'src>, LexError> {
        let start = self.pos;

        // Consume opening quote
        self.advance();
        let content_start = self.pos;

        loop {
            match self.peek() {
                None => return Err(self.error(LexErrorKind::UnterminatedString, start)),
                Some('"') => break,
                Some('\\') => {
                    // Escape sequence - consume backslash and next char
                    self.advance();
                    self.advance();
                }
                Some(_) => {
                    self.advance();
                }
            }
        }

        let content = &self.source[content_start as usize..self.pos as usize];
        self.advance();
        Ok(self.token_with_text(TokenKind::String, Span::new(start, self.pos), content))
    }

    /// Tokenize `&name`.
    fn tokenize_reference(&mut self) -> Result<Token<'src>, LexError> {
        let start = self.pos;
        self.advance(); // consume `&`

        match self.peek() {
            Some(c) if is_identifier_start(c) => {
                let name_start = self.pos;
                self.scan_identifier_tail(name_start)?;
                let name = &self.source[name_start as usize..self.pos as usize];
                Ok(self.token_with_text(TokenKind::Reference, Span::new(start, self.pos), name))
            }
            _ => Err(self.error(LexErrorKind::DanglingAmpersand, start)),
        }
    }

    fn tokenize_identifier(&mut self) -> Result<Token<'src>, LexError> {
        let start = self.pos;
        self.scan_identifier_tail(start)?;
        Ok(self.token(TokenKind::Identifier, start))
    }

    /// Tokenize `42`, `-1` or `0x1f`. Digits that run straight into
    /// identifier characters (`2KRO`) make an identifier instead.
    fn tokenize_number(&mut self) -> Result<Token<'src>, LexError> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.advance();
        }
        let hex = self.starts_with("0x") || self.starts_with("0X");
        if hex {
            self.advance();
            self.advance();
        }
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || (hex && c.is_ascii_hexdigit()) {
                self.advance();
            } else {
                break;
            }
        }

        if matches!(self.peek(), Some(c) if is_identifier_char(c) || c == '(') {
            self.scan_identifier_tail(start)?;
            return Ok(self.token(TokenKind::Identifier, start));
        }

        let text = &self.source[start as usize..self.pos as usize];
        if parse_number(text).is_none() {
            return Err(self.error(LexErrorKind::InvalidNumber, start));
        }
        Ok(self.token(TokenKind::Number, start))
    }

    /// Consume identifier characters and parenthesized groups.
    fn scan_identifier_tail(&mut self, start: u32) -> Result<(), LexError> {
        loop {
            match self.peek() {
                // A comment may follow a name with no whitespace in between.
                Some('/') if self.starts_with("//") || self.starts_with("/*") => break,
                Some('(') => self.scan_group(start)?,
                Some(c) if is_identifier_char(c) => {
                    self.advance();
                }
                _ => break,
            }
        }
        Ok(())
    }

    /// Consume a balanced `( ... )` group, e.g. the `(LS(TAB))` of `LC(LS(TAB))`.
    fn scan_group(&mut self, start: u32) -> Result<(), LexError> {
        let mut depth = 0usize;
        while let Some(c) = self.peek() {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        self.advance();
                        return Ok(());
                    }
                }
                _ if is_group_char(c) => {}
                _ => break,
            }
            self.advance();
        }
        Err(self.error(LexErrorKind::UnbalancedParen, start))
    }
}

impl<'src> Iterator for Tokenizer<'src> {
    type Item = Result<Token<'src>, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

impl std::iter::FusedIterator for Tokenizer<'_> {}

/// Check if a character can start an identifier.
fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || matches!(c, '_' | '/' | '.' | '#')
}

/// Check if a character can continue an identifier.
fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ',' | '@' | '+' | '/' | '?' | '#')
}

/// Characters allowed inside the parentheses of a modifier expression.
fn is_group_char(c: char) -> bool {
    is_identifier_char(c) || matches!(c, ' ' | '\t' | '|')
}
