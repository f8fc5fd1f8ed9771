//! Fatal errors and their rendering.

use std::fmt;

use ariadne::{Color, Label, Report, ReportKind, Source};
use keymap_parse::{LexError, ParseError, Span, SyntaxError, SyntaxErrorKind};

/// The document parsed, but contains neither a `keymap` nor a `combos` node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructureError {
    /// The whole document.
    pub span: Span,
}

impl fmt::Display for StructureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no `keymap` or `combos` node found")
    }
}

impl std::error::Error for StructureError {}

/// Anything that stops a keymap from being produced at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Malformed low-level token, e.g. an unterminated string.
    Lex(LexError),
    /// Tokens that don't form nodes and properties.
    Syntax(SyntaxError),
    /// Not recognizable as a keymap file.
    Structure(StructureError),
}

impl Error {
    /// Source location of the failure.
    pub fn span(&self) -> Span {
        match self {
            Error::Lex(err) => err.span,
            Error::Syntax(err) => err.span,
            Error::Structure(err) => err.span,
        }
    }

    /// Render this error with ariadne.
    ///
    /// Returns a string containing the formatted error message with source context.
    pub fn render(&self, filename: &str, source: &str) -> String {
        let mut output = Vec::new();
        self.write_report(filename, source, &mut output);
        String::from_utf8(output).unwrap_or_else(|_| format!("{}", self))
    }

    /// Write the error report to a writer.
    pub fn write_report<W: std::io::Write>(&self, filename: &str, source: &str, writer: W) {
        let report = self.build_report(filename);
        let _ = report
            .finish()
            .write((filename, Source::from(source)), writer);
    }

    fn build_report<'a>(
        &self,
        filename: &'a str,
    ) -> ariadne::ReportBuilder<'static, (&'a str, std::ops::Range<usize>)> {
        let range: std::ops::Range<usize> = self.span().into();

        match self {
            Error::Lex(err) => Report::build(ReportKind::Error, (filename, range.clone()))
                .with_message(err.kind.to_string())
                .with_label(
                    Label::new((filename, range))
                        .with_message("here")
                        .with_color(Color::Red),
                ),

            Error::Syntax(err) => {
                let label = match (&err.kind, &err.found) {
                    (SyntaxErrorKind::UnclosedArray, _) => "array opened here".to_string(),
                    (SyntaxErrorKind::UnclosedNode, _) => "node opened here".to_string(),
                    (_, Some(found)) => format!("found `{}`", found),
                    (_, None) => "input ends here".to_string(),
                };
                let report = Report::build(ReportKind::Error, (filename, range.clone()))
                    .with_message(syntax_message(err))
                    .with_label(
                        Label::new((filename, range))
                            .with_message(label)
                            .with_color(Color::Red),
                    );
                match err.kind {
                    SyntaxErrorKind::UnclosedArray => report.with_help("add a closing '>'"),
                    SyntaxErrorKind::UnclosedNode => report.with_help("add a closing '};'"),
                    _ => report,
                }
            }

            Error::Structure(_) => Report::build(ReportKind::Error, (filename, 0..0))
                .with_message("not a keymap file")
                .with_help("expected a `keymap { ... };` or `combos { ... };` node"),
        }
    }
}

/// The syntax error text without the trailing offset.
fn syntax_message(err: &SyntaxError) -> String {
    match &err.kind {
        SyntaxErrorKind::UnexpectedToken { expected } => format!("expected {}", expected),
        SyntaxErrorKind::UnexpectedEof { expected } => {
            format!("unexpected end of input, expected {}", expected)
        }
        SyntaxErrorKind::UnclosedArray => "unclosed `<` array".to_string(),
        SyntaxErrorKind::UnclosedNode => "unclosed node".to_string(),
        SyntaxErrorKind::TooDeep { limit } => format!("nodes nested deeper than {} levels", limit),
    }
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::Lex(err) => Error::Lex(err),
            ParseError::Syntax(err) => Error::Syntax(err),
        }
    }
}

impl From<LexError> for Error {
    fn from(err: LexError) -> Self {
        Error::Lex(err)
    }
}

impl From<SyntaxError> for Error {
    fn from(err: SyntaxError) -> Self {
        Error::Syntax(err)
    }
}

impl From<StructureError> for Error {
    fn from(err: StructureError) -> Self {
        Error::Structure(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Lex(err) => write!(f, "lex error: {}", err),
            Error::Syntax(err) => write!(f, "syntax error: {}", err),
            Error::Structure(err) => write!(f, "structure error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Lex(err) => Some(err),
            Error::Syntax(err) => Some(err),
            Error::Structure(err) => Some(err),
        }
    }
}
