//! Token types for keymap source.

use crate::Span;

/// The kind of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Structural tokens
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `;`
    Semi,
    /// `=`
    Eq,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `:`
    Colon,
    /// `,`
    Comma,

    // Value tokens
    /// Bare name: `default_layer`, `ESC`, `LC(LS(TAB))`, `/`
    Identifier,
    /// `&name`; the token text is the name without the `&`.
    Reference,
    /// Integer literal: `42`, `-1`, `0x1f`
    Number,
    /// Quoted string; the token text is the content between the quotes.
    String,
}

impl TokenKind {
    /// Whether this token is a single punctuation character.
    pub fn is_punct(&self) -> bool {
        !matches!(
            self,
            TokenKind::Identifier | TokenKind::Reference | TokenKind::Number | TokenKind::String
        )
    }

    /// Short human-readable description, used in error messages.
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::LBrace => "`{`",
            TokenKind::RBrace => "`}`",
            TokenKind::Semi => "`;`",
            TokenKind::Eq => "`=`",
            TokenKind::Lt => "`<`",
            TokenKind::Gt => "`>`",
            TokenKind::Colon => "`:`",
            TokenKind::Comma => "`,`",
            TokenKind::Identifier => "identifier",
            TokenKind::Reference => "reference",
            TokenKind::Number => "number",
            TokenKind::String => "string",
        }
    }
}

/// A token with its kind, span, and source text slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'src> {
    /// The kind of token.
    pub kind: TokenKind,
    /// The span in the source text.
    pub span: Span,
    /// The text of this token (see [`TokenKind`] for what is stripped).
    pub text: &'src str,
}

impl<'src> Token<'src> {
    /// Create a new token.
    pub fn new(kind: TokenKind, span: Span, text: &'src str) -> Self {
        Self { kind, span, text }
    }

    /// The integer value of a [`TokenKind::Number`] token.
    pub fn as_number(&self) -> Option<i64> {
        match self.kind {
            TokenKind::Number => parse_number(self.text),
            _ => None,
        }
    }
}

/// Parse a decimal or `0x` hexadecimal literal with an optional leading `-`.
pub fn parse_number(text: &str) -> Option<i64> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let (radix, digits) = match digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        Some(hex) => (16, hex),
        None => (10, digits),
    };
    // `from_str_radix` tolerates a leading `+`, the source grammar doesn't.
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    let value = i64::from_str_radix(digits, radix).ok()?;
    Some(if negative { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("50"), Some(50));
        assert_eq!(parse_number("-3"), Some(-3));
        assert_eq!(parse_number("0x1F"), Some(31));
        assert_eq!(parse_number("0x"), None);
        assert_eq!(parse_number("+5"), None);
        assert_eq!(parse_number("--5"), None);
        assert_eq!(parse_number("99999999999999999999"), None);
    }
}
