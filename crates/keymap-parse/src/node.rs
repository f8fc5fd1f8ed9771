//! Generic node tree mirroring the brace/property structure of the source.

use keymap_tokenizer::{Span, Token, TokenKind};

/// A named `{ ... };` block.
///
/// Children and properties are kept in source order. Names are not unique;
/// lookups by name return the first match, iterate the vectors to see them all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node<'src> {
    /// Node name. Empty for the synthetic root, `/` for the device-tree root.
    pub name: &'src str,
    /// Label from the `label: name { ... }` form.
    pub label: Option<&'src str>,
    /// Opened as `&name { ... }`, i.e. an override of something defined elsewhere.
    pub reference: bool,
    /// From the name (or label) up to the closing `;`.
    pub span: Span,
    /// Property assignments, in source order.
    pub properties: Vec<Property<'src>>,
    /// Child nodes, in source order.
    pub children: Vec<Node<'src>>,
}

impl<'src> Node<'src> {
    /// Create an empty node.
    pub fn new(name: &'src str, span: Span) -> Self {
        Self {
            name,
            label: None,
            reference: false,
            span,
            properties: Vec::new(),
            children: Vec::new(),
        }
    }

    /// First property with the given name.
    pub fn property(&self, name: &str) -> Option<&Property<'src>> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// First direct child with the given name.
    pub fn child(&self, name: &str) -> Option<&Node<'src>> {
        self.children.iter().find(|n| n.name == name)
    }

    /// Depth-first, pre-order walk over this node and all its descendants.
    pub fn walk(&self) -> Walk<'_, 'src> {
        Walk { stack: vec![self] }
    }
}

/// Iterator returned by [`Node::walk`].
pub struct Walk<'a, 'src> {
    stack: Vec<&'a Node<'src>>,
}

impl<'a, 'src> Iterator for Walk<'a, 'src> {
    type Item = &'a Node<'src>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// A `name = value;` assignment, or a bare `name;` flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property<'src> {
    /// Property name, e.g. `bindings` or `timeout-ms`.
    pub name: &'src str,
    /// Every token between `=` and `;`, brackets included. Empty for flags.
    pub value: Vec<Token<'src>>,
    /// From the name up to the closing `;`.
    pub span: Span,
}

impl<'src> Property<'src> {
    /// Whether this is a bare `name;` flag with no value.
    pub fn is_flag(&self) -> bool {
        self.value.is_empty()
    }

    /// The content of a value made of exactly one string.
    pub fn as_str(&self) -> Option<&'src str> {
        match self.value.as_slice() {
            [token] if token.kind == TokenKind::String => Some(token.text),
            _ => None,
        }
    }

    /// Span of the value tokens, or of the whole property for flags.
    pub fn value_span(&self) -> Span {
        match (self.value.first(), self.value.last()) {
            (Some(first), Some(last)) => first.span.to(last.span),
            _ => self.span,
        }
    }
}
