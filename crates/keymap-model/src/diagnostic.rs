//! Non-fatal findings collected while extracting the model.

use std::fmt;

use ariadne::{Color, Label, Report, ReportKind, Source};
use keymap_parse::Span;

use crate::binding::BindingError;

/// The layer or combo a diagnostic is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subject {
    /// A child of a `keymap` node.
    Layer(String),
    /// A child of a `combos` node.
    Combo(String),
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::Layer(name) => write!(f, "layer `{}`", name),
            Subject::Combo(name) => write!(f, "combo `{}`", name),
        }
    }
}

/// What was wrong with the entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A required property is absent.
    MissingProperty {
        /// The property name.
        property: &'static str,
    },
    /// A property is present but its value can't be decoded.
    InvalidProperty {
        /// The property name.
        property: String,
        /// Why decoding failed.
        error: BindingError,
    },
    /// A combo's `bindings` doesn't hold exactly one behavior.
    ComboBindingCount {
        /// How many behaviors it holds.
        found: usize,
    },
    /// Another entry of the same kind already uses this name.
    DuplicateName {
        /// Where the first one was defined.
        original: Span,
    },
}

/// A skipped or suspicious layer/combo. Extraction carries on regardless.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// The kind of finding.
    pub kind: DiagnosticKind,
    /// The entry it concerns.
    pub subject: Subject,
    /// Source location.
    pub span: Span,
    /// Whether the entry was left out of the model because of this.
    pub skipped: bool,
}

impl Diagnostic {
    /// Render this diagnostic with ariadne.
    ///
    /// Returns a string containing the formatted warning with source context.
    pub fn render(&self, filename: &str, source: &str) -> String {
        let mut output = Vec::new();
        self.write_report(filename, source, &mut output);
        String::from_utf8(output).unwrap_or_else(|_| format!("{}", self))
    }

    /// Write the report to a writer.
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
        let range: std::ops::Range<usize> = self.span.into();
        let report = Report::build(ReportKind::Warning, (filename, range.clone()))
            .with_message(self.message());

        let report = match &self.kind {
            DiagnosticKind::MissingProperty { property } => report.with_label(
                Label::new((filename, range))
                    .with_message(format!("no `{}` here", property))
                    .with_color(Color::Yellow),
            ),
            DiagnosticKind::InvalidProperty { error, .. } => report.with_label(
                Label::new((filename, range))
                    .with_message(error.to_string())
                    .with_color(Color::Yellow),
            ),
            DiagnosticKind::ComboBindingCount { found } => report
                .with_label(
                    Label::new((filename, range))
                        .with_message(format!("{} behaviors", found))
                        .with_color(Color::Yellow),
                )
                .with_help("a combo binds exactly one behavior, e.g. `bindings = <&kp ESC>;`"),
            DiagnosticKind::DuplicateName { original } => {
                let original: std::ops::Range<usize> = (*original).into();
                report
                    .with_label(
                        Label::new((filename, original))
                            .with_message("first defined here")
                            .with_color(Color::Blue),
                    )
                    .with_label(
                        Label::new((filename, range))
                            .with_message("defined again here")
                            .with_color(Color::Yellow),
                    )
            }
        };

        if self.skipped {
            report.with_note(format!("{} was left out of the keymap", self.subject))
        } else {
            report
        }
    }

    /// One-line description without the location.
    pub fn message(&self) -> String {
        match &self.kind {
            DiagnosticKind::MissingProperty { property } => {
                format!("{} has no `{}` property", self.subject, property)
            }
            DiagnosticKind::InvalidProperty { property, error } => {
                format!("{} has an invalid `{}`: {}", self.subject, property, error)
            }
            DiagnosticKind::ComboBindingCount { found } => {
                format!(
                    "{} must bind exactly one behavior, found {}",
                    self.subject, found
                )
            }
            DiagnosticKind::DuplicateName { .. } => {
                format!("{} is defined more than once", self.subject)
            }
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at offset {}", self.message(), self.span.start)
    }
}
