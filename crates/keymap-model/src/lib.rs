#![doc = include_str!("../README.md")]
//! Keymap model for ZMK device-tree keymap files.
//!
//! [`parse`] runs the whole pipeline: tokens, then the node tree, then the
//! layers and combos found in it.

mod binding;
mod diagnostic;
mod error;
mod extract;
mod model;

pub use binding::{
    BindingError, BindingErrorKind, parse_bindings, parse_cells, parse_single_cell, parse_string,
};
pub use diagnostic::{Diagnostic, DiagnosticKind, Subject};
pub use error::{Error, StructureError};
pub use extract::{Parsed, extract};
pub use keymap_parse::{ParseOptions, Span};
pub use model::{Behavior, Combo, KeymapModel, Layer, Param};

use tracing::debug;

/// Parse a keymap file with default options.
pub fn parse(source: &str) -> Result<Parsed, Error> {
    parse_with_options(source, ParseOptions::default())
}

/// Parse a keymap file.
///
/// Lexical and syntax errors and a document without any `keymap` or
/// `combos` node are fatal. Broken layers and combos are skipped and
/// listed in [`Parsed::diagnostics`].
pub fn parse_with_options(source: &str, options: ParseOptions) -> Result<Parsed, Error> {
    debug!(len = source.len(), "parsing keymap");
    let root = keymap_parse::Parser::with_options(source, options).parse()?;
    Ok(extract(&root)?)
}
