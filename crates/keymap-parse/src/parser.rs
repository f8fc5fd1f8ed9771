//! Recursive-descent parser over `{ ... };` blocks.

use keymap_tokenizer::{Span, Token, TokenKind, Tokenizer};
use tracing::debug;

use crate::error::{ParseError, SyntaxError, SyntaxErrorKind};
use crate::node::{Node, Property};

/// Knobs for [`Parser`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// How many levels of nested nodes are accepted before giving up.
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self { max_depth: 256 }
    }
}

/// Builds the node tree from a token stream.
///
/// The whole document is read in one left-to-right pass; every decision is
/// made from the token just consumed.
/// Anything outside the node/property grammar is a [`SyntaxError`]; there is
/// no token-level recovery.
pub struct Parser<'src> {
    source: &'src str,
    tokens: Tokenizer<'src>,
    options: ParseOptions,
    depth: usize,
}

impl<'src> Parser<'src> {
    /// Create a new parser with default options.
    pub fn new(source: &'src str) -> Self {
        Self::with_options(source, ParseOptions::default())
    }

    /// Create a new parser with the given options.
    pub fn with_options(source: &'src str, options: ParseOptions) -> Self {
        Self {
            source,
            tokens: Tokenizer::new(source),
            options,
            depth: 0,
        }
    }

    /// Parse the whole input into a synthetic, unnamed root node.
    pub fn parse(mut self) -> Result<Node<'src>, ParseError> {
        debug!(len = self.source.len(), "parsing node tree");
        let mut root = Node::new("", Span::new(0, self.source.len() as u32));
        self.parse_body(&mut root, None)?;
        debug!(
            children = root.children.len(),
            properties = root.properties.len(),
            "parsed node tree"
        );
        Ok(root)
    }

    fn next(&mut self) -> Result<Option<Token<'src>>, ParseError> {
        Ok(self.tokens.next().transpose()?)
    }

    fn eof_span(&self) -> Span {
        Span::empty(self.source.len() as u32)
    }

    fn unexpected(&self, token: &Token<'src>, expected: &'static str) -> ParseError {
        SyntaxError::new(
            SyntaxErrorKind::UnexpectedToken { expected },
            token.span,
            Some(token.span.slice(self.source).to_string()),
        )
        .into()
    }

    fn eof(&self, expected: &'static str) -> ParseError {
        SyntaxError::new(
            SyntaxErrorKind::UnexpectedEof { expected },
            self.eof_span(),
            None,
        )
        .into()
    }

    /// Consume the next token, which must be of `kind`.
    fn expect(&mut self, kind: TokenKind, expected: &'static str) -> Result<Token<'src>, ParseError> {
        match self.next()? {
            Some(token) if token.kind == kind => Ok(token),
            Some(token) => Err(self.unexpected(&token, expected)),
            None => Err(self.eof(expected)),
        }
    }

    /// Parse statements into `node` until its closing `};`, or until end of
    /// input for the root (`open` is `None`). Returns the span of the last
    /// token consumed.
    fn parse_body(&mut self, node: &mut Node<'src>, open: Option<Span>) -> Result<Span, ParseError> {
        loop {
            let Some(token) = self.next()? else {
                return match open {
                    None => Ok(self.eof_span()),
                    Some(open) => {
                        Err(SyntaxError::new(SyntaxErrorKind::UnclosedNode, open, None).into())
                    }
                };
            };

            match token.kind {
                TokenKind::RBrace if open.is_some() => {
                    let semi = self.expect(TokenKind::Semi, "`;` after `}`")?;
                    return Ok(semi.span);
                }
                TokenKind::Identifier => self.parse_statement(node, token)?,
                TokenKind::Reference => {
                    let brace = self.expect(TokenKind::LBrace, "`{` after reference")?;
                    let mut child = Node::new(token.text, token.span);
                    child.reference = true;
                    node.children.push(self.parse_node(child, brace.span)?);
                }
                _ => return Err(self.unexpected(&token, "a node or property")),
            }
        }
    }

    /// Parse what follows a leading identifier: a child node, a property or a flag.
    fn parse_statement(&mut self, node: &mut Node<'src>, name: Token<'src>) -> Result<(), ParseError> {
        let Some(token) = self.next()? else {
            return Err(self.eof("`{`, `=`, `:` or `;` after name"));
        };

        match token.kind {
            TokenKind::LBrace => {
                let child = Node::new(name.text, name.span);
                node.children.push(self.parse_node(child, token.span)?);
            }
            TokenKind::Colon => {
                let real_name = self.expect(TokenKind::Identifier, "node name after label")?;
                let brace = self.expect(TokenKind::LBrace, "`{` after node name")?;
                let mut child = Node::new(real_name.text, name.span);
                child.label = Some(name.text);
                node.children.push(self.parse_node(child, brace.span)?);
            }
            TokenKind::Eq => {
                let (value, end) = self.parse_value()?;
                node.properties.push(Property {
                    name: name.text,
                    value,
                    span: name.span.to(end),
                });
            }
            TokenKind::Semi => node.properties.push(Property {
                name: name.text,
                value: Vec::new(),
                span: name.span.to(token.span),
            }),
            _ => return Err(self.unexpected(&token, "`{`, `=`, `:` or `;` after name")),
        }
        Ok(())
    }

    /// Parse a node body; `node.span` starts at its name and `open` is its `{`.
    fn parse_node(&mut self, mut node: Node<'src>, open: Span) -> Result<Node<'src>, ParseError> {
        if self.depth >= self.options.max_depth {
            return Err(SyntaxError::new(
                SyntaxErrorKind::TooDeep {
                    limit: self.options.max_depth,
                },
                open,
                Some("{".to_string()),
            )
            .into());
        }

        self.depth += 1;
        let end = self.parse_body(&mut node, Some(open))?;
        self.depth -= 1;

        node.span = node.span.to(end);
        Ok(node)
    }

    /// Collect the raw tokens of a property value up to its `;`.
    ///
    /// Values aren't interpreted here, but `<` must be closed by `>` before
    /// the `;` and arrays don't nest.
    fn parse_value(&mut self) -> Result<(Vec<Token<'src>>, Span), ParseError> {
        let mut value = Vec::new();
        let mut array_open: Option<Span> = None;

        loop {
            let Some(token) = self.next()? else {
                return Err(match array_open {
                    Some(open) => SyntaxError::new(SyntaxErrorKind::UnclosedArray, open, None).into(),
                    None => self.eof("`;` to end the property"),
                });
            };

            match token.kind {
                TokenKind::Semi => match array_open {
                    Some(open) => {
                        return Err(SyntaxError::new(
                            SyntaxErrorKind::UnclosedArray,
                            open.to(token.span),
                            Some(";".to_string()),
                        )
                        .into());
                    }
                    None => return Ok((value, token.span)),
                },
                TokenKind::Lt if array_open.is_some() => {
                    return Err(self.unexpected(&token, "`>` to close the array"));
                }
                TokenKind::Lt => array_open = Some(token.span),
                TokenKind::Gt if array_open.is_none() => {
                    return Err(self.unexpected(&token, "`;` to end the property"));
                }
                TokenKind::Gt => array_open = None,
                TokenKind::LBrace | TokenKind::RBrace => {
                    return Err(self.unexpected(&token, "`;` to end the property"));
                }
                _ => {}
            }
            value.push(token);
        }
    }
}
