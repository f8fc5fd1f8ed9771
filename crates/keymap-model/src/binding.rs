//! Splitting `< ... >` property values into behavior invocations and cells.

use std::fmt;

use keymap_parse::{Span, Token, TokenKind};
use tracing::trace;

use crate::model::{Behavior, Param};

/// Why a property value couldn't be read as an array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingErrorKind {
    /// The value isn't `<...>` (or a comma-separated list of them).
    NotAnArray,
    /// A token that can't be a cell: a string, `:`, `=` and so on.
    UnexpectedToken(TokenKind),
    /// A cell that should have been a number.
    ExpectedNumber,
    /// A value that should have been a single string.
    ExpectedString,
    /// The array has the wrong number of cells.
    WrongCellCount {
        /// How many cells were expected.
        expected: usize,
        /// How many were found.
        found: usize,
    },
}

/// An array value that couldn't be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingError {
    /// The kind of error.
    pub kind: BindingErrorKind,
    /// The offending token; empty at offset 0 when the value was empty.
    pub span: Span,
}

impl BindingError {
    fn new(kind: BindingErrorKind, span: Span) -> Self {
        Self { kind, span }
    }
}

impl fmt::Display for BindingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            BindingErrorKind::NotAnArray => write!(f, "expected a `<...>` array"),
            BindingErrorKind::UnexpectedToken(kind) => {
                write!(f, "unexpected {} inside array", kind.describe())
            }
            BindingErrorKind::ExpectedNumber => write!(f, "expected a number"),
            BindingErrorKind::ExpectedString => write!(f, "expected a string"),
            BindingErrorKind::WrongCellCount { expected, found } => {
                write!(f, "expected {} cell(s), found {}", expected, found)
            }
        }
    }
}

impl std::error::Error for BindingError {}

/// Strip the `<` `>` markers and return the cells in order. Several arrays
/// separated by commas (`<1 2>, <3>`) are concatenated.
fn array_cells<'t, 'src>(tokens: &'t [Token<'src>]) -> Result<Vec<&'t Token<'src>>, BindingError> {
    let end = tokens.last().map(|t| Span::empty(t.span.end)).unwrap_or_default();
    let mut cells = Vec::new();
    let mut iter = tokens.iter();

    loop {
        match iter.next() {
            Some(token) if token.kind == TokenKind::Lt => {}
            Some(token) => return Err(BindingError::new(BindingErrorKind::NotAnArray, token.span)),
            None => return Err(BindingError::new(BindingErrorKind::NotAnArray, end)),
        }

        loop {
            match iter.next() {
                Some(token) if token.kind == TokenKind::Gt => break,
                Some(token) => cells.push(token),
                None => return Err(BindingError::new(BindingErrorKind::NotAnArray, end)),
            }
        }

        match iter.next() {
            None => return Ok(cells),
            Some(token) if token.kind == TokenKind::Comma => {}
            Some(token) => {
                return Err(BindingError::new(
                    BindingErrorKind::UnexpectedToken(token.kind),
                    token.span,
                ));
            }
        }
    }
}

/// Partition an array of behavior invocations.
///
/// Each reference (`&kp`) opens a new [`Behavior`]; every following cell up
/// to the next reference or the end of the array is one of its params. No
/// arity table is consulted, so `&kp ESC &mt LSFT Z &trans` is three
/// behaviors with one, two and zero params.
///
/// Cells before the first reference belong to nothing and are dropped.
pub fn parse_bindings(tokens: &[Token<'_>]) -> Result<Vec<Behavior>, BindingError> {
    let mut behaviors = Vec::new();
    let mut current: Option<Behavior> = None;

    for token in array_cells(tokens)? {
        let param = match token.kind {
            TokenKind::Reference => {
                behaviors.extend(current.replace(Behavior::new(token.text, Vec::new())));
                continue;
            }
            TokenKind::Identifier => Param::KeyCode(token.text.to_string()),
            TokenKind::Number => Param::Number(number(token)?),
            kind => {
                return Err(BindingError::new(
                    BindingErrorKind::UnexpectedToken(kind),
                    token.span,
                ));
            }
        };

        match current.as_mut() {
            Some(behavior) => behavior.params.push(param),
            None => trace!(?param, "dropping cell before the first behavior"),
        }
    }

    behaviors.extend(current);
    Ok(behaviors)
}

/// Read an array whose cells are all numbers, e.g. `key-positions = <0 1>`.
pub fn parse_cells(tokens: &[Token<'_>]) -> Result<Vec<i64>, BindingError> {
    array_cells(tokens)?.into_iter().map(number).collect()
}

/// Read an array holding exactly one number, e.g. `timeout-ms = <50>`.
pub fn parse_single_cell(tokens: &[Token<'_>]) -> Result<i64, BindingError> {
    match parse_cells(tokens)?.as_slice() {
        [value] => Ok(*value),
        cells => Err(BindingError::new(
            BindingErrorKind::WrongCellCount {
                expected: 1,
                found: cells.len(),
            },
            span_of(tokens),
        )),
    }
}

/// Read a value made of one string, e.g. `display-name = "Base"`.
pub fn parse_string(tokens: &[Token<'_>]) -> Result<String, BindingError> {
    match tokens {
        [token] if token.kind == TokenKind::String => Ok(token.text.to_string()),
        _ => Err(BindingError::new(
            BindingErrorKind::ExpectedString,
            span_of(tokens),
        )),
    }
}

fn number(token: &Token<'_>) -> Result<i64, BindingError> {
    token
        .as_number()
        .ok_or_else(|| BindingError::new(BindingErrorKind::ExpectedNumber, token.span))
}

fn span_of(tokens: &[Token<'_>]) -> Span {
    match (tokens.first(), tokens.last()) {
        (Some(first), Some(last)) => first.span.to(last.span),
        _ => Span::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keymap_parse::Tokenizer;

    fn tokens(source: &str) -> Vec<Token<'_>> {
        Tokenizer::new(source)
            .collect::<Result<_, _>>()
            .expect("should tokenize")
    }

    fn bindings(source: &str) -> Vec<Behavior> {
        parse_bindings(&tokens(source)).expect("should parse bindings")
    }

    fn key(text: &str) -> Param {
        Param::KeyCode(text.to_string())
    }

    #[test]
    fn test_single_key_press() {
        assert_eq!(
            bindings("<&kp ESC>"),
            vec![Behavior::new("kp", vec![key("ESC")])]
        );
    }

    #[test]
    fn test_numeric_param() {
        assert_eq!(
            bindings("<&mo 1>"),
            vec![Behavior::new("mo", vec![Param::Number(1)])]
        );
    }

    #[test]
    fn test_no_params() {
        assert_eq!(bindings("<&trans>"), vec![Behavior::new("trans", vec![])]);
    }

    #[test]
    fn test_mixed_arity() {
        assert_eq!(
            bindings("<&trans &kp A &mt LSFT Z &none &lt 2 SPC>"),
            vec![
                Behavior::new("trans", vec![]),
                Behavior::new("kp", vec![key("A")]),
                Behavior::new("mt", vec![key("LSFT"), key("Z")]),
                Behavior::new("none", vec![]),
                Behavior::new("lt", vec![Param::Number(2), key("SPC")]),
            ]
        );
    }

    #[test]
    fn test_nested_modifier_is_opaque() {
        let parsed = bindings("<&kp LC(LS(TAB)) &kp LC(S)>");
        assert_eq!(parsed[0].params, vec![key("LC(LS(TAB))")]);
        assert_eq!(parsed[0].to_string(), "&kp LC(LS(TAB))");
        assert_eq!(parsed[1].params, vec![key("LC(S)")]);
    }

    #[test]
    fn test_empty_array() {
        assert!(bindings("<>").is_empty());
    }

    #[test]
    fn test_array_without_references() {
        assert!(bindings("<0 1 ESC>").is_empty());
    }

    #[test]
    fn test_cells_before_first_reference_are_dropped() {
        assert_eq!(
            bindings("<5 &kp A>"),
            vec![Behavior::new("kp", vec![key("A")])]
        );
    }

    #[test]
    fn test_comma_separated_arrays_concatenate() {
        assert_eq!(
            bindings("<&kp A>, <&kp B &trans>"),
            vec![
                Behavior::new("kp", vec![key("A")]),
                Behavior::new("kp", vec![key("B")]),
                Behavior::new("trans", vec![]),
            ]
        );
    }

    #[test]
    fn test_not_an_array() {
        let err = parse_bindings(&tokens("&kp A")).expect_err("no brackets");
        assert_eq!(err.kind, BindingErrorKind::NotAnArray);
        assert_eq!(err.span, Span::new(0, 3));

        let err = parse_bindings(&[]).expect_err("empty value");
        assert_eq!(err.kind, BindingErrorKind::NotAnArray);
    }

    #[test]
    fn test_string_inside_array() {
        let err = parse_bindings(&tokens(r#"<&kp "A">"#)).expect_err("string cell");
        assert_eq!(err.kind, BindingErrorKind::UnexpectedToken(TokenKind::String));
        assert_eq!(err.to_string(), "unexpected string inside array");
    }

    #[test]
    fn test_junk_after_array() {
        let err = parse_bindings(&tokens("<&kp A> B")).expect_err("trailing identifier");
        assert_eq!(
            err.kind,
            BindingErrorKind::UnexpectedToken(TokenKind::Identifier)
        );
    }

    #[test]
    fn test_parse_cells() {
        assert_eq!(parse_cells(&tokens("<0 1>")), Ok(vec![0, 1]));
        assert_eq!(parse_cells(&tokens("<17 16>, <0x10>")), Ok(vec![17, 16, 16]));
        assert_eq!(parse_cells(&tokens("<>")), Ok(vec![]));

        let err = parse_cells(&tokens("<0 ESC>")).expect_err("identifier cell");
        assert_eq!(err.kind, BindingErrorKind::ExpectedNumber);
        assert_eq!(err.span, Span::new(3, 6));
    }

    #[test]
    fn test_parse_single_cell() {
        assert_eq!(parse_single_cell(&tokens("<50>")), Ok(50));

        let err = parse_single_cell(&tokens("<50 60>")).expect_err("two cells");
        assert_eq!(
            err.kind,
            BindingErrorKind::WrongCellCount {
                expected: 1,
                found: 2
            }
        );
        assert_eq!(err.to_string(), "expected 1 cell(s), found 2");
    }

    #[test]
    fn test_parse_string() {
        assert_eq!(parse_string(&tokens(r#""Base""#)), Ok("Base".to_string()));

        let err = parse_string(&tokens("<1>")).expect_err("array, not string");
        assert_eq!(err.kind, BindingErrorKind::ExpectedString);
        assert_eq!(err.span, Span::new(0, 3));
    }
}
