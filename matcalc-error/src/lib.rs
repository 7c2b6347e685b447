//! Contains the common [`ErrorKind`] trait used by all errors to display user-facing error
//! messages.
//!
//! Errors raised by the parser carry the spans of the offending tokens. Errors raised further
//! down the pipeline (differentiation diagnostics, canonicalization budgets, numeric evaluation)
//! have no source positions of their own; they are created with [`Error::spanless`] and are
//! pointed at the whole input with [`Error::or_span`] by whoever holds the source text.

extern crate self as matcalc_error;

use ariadne::{Color, Report};
use std::{fmt::Debug, ops::Range};

/// The color to use to highlight expressions.
pub const EXPR: Color = Color::RGB(52, 235, 152);

/// Represents any kind of error that can occur during some operation.
pub trait ErrorKind: Debug + Send {
    /// Builds the report for this error.
    fn build_report<'a>(
        &self,
        src_id: &'a str,
        spans: &[Range<usize>],
    ) -> Report<(&'a str, Range<usize>)>;
}

/// An error associated with regions of source code that can be highlighted.
#[derive(Debug)]
pub struct Error {
    /// The regions of the source code that this error originated from.
    pub spans: Vec<Range<usize>>,

    /// The kind of error that occurred.
    pub kind: Box<dyn ErrorKind>,
}

impl Error {
    /// Creates a new error with the given spans and kind.
    pub fn new(spans: Vec<Range<usize>>, kind: impl ErrorKind + 'static) -> Self {
        Self { spans, kind: Box::new(kind) }
    }

    /// Creates a new error that is not associated with any region of the source code.
    pub fn spanless(kind: impl ErrorKind + 'static) -> Self {
        Self::new(Vec::new(), kind)
    }

    /// Points a spanless error at the given span. Errors that already have spans are returned
    /// unchanged.
    pub fn or_span(mut self, span: Range<usize>) -> Self {
        if self.spans.is_empty() {
            self.spans.push(span);
        }
        self
    }

    /// Build a report from this error kind.
    pub fn build_report<'a>(&self, src_id: &'a str) -> Report<(&'a str, Range<usize>)> {
        self.kind.build_report(src_id, &self.spans)
    }
}

#[cfg(test)]
mod tests {
    use ariadne::{Fmt, Source};
    use matcalc_attrs::ErrorKind;
    use super::*;

    #[derive(Debug, Clone, ErrorKind, PartialEq)]
    #[error(
        message = format!("`{}` is not square", name),
        labels = ["this matrix", "used here"],
        help = format!("only square matrices have a {}", "trace".fg(EXPR)),
    )]
    struct NotSquare {
        name: String,
    }

    #[derive(Debug, Clone, ErrorKind, PartialEq)]
    #[error(
        message = "gave up",
        labels = ["here"],
        kind = ariadne::ReportKind::Warning,
    )]
    struct GaveUp;

    /// Renders the error against the given source, with ANSI escapes removed.
    fn render(err: &Error, src: &str) -> String {
        let mut buf = Vec::new();
        err.build_report("input")
            .write(("input", Source::from(src)), &mut buf)
            .unwrap();
        String::from_utf8(strip_ansi_escapes::strip(buf)).unwrap()
    }

    #[test]
    fn report_contains_message_labels_and_help() {
        let err = Error::new(vec![3..4, 5..6], NotSquare { name: "A".to_string() });
        let out = render(&err, "Tr(A)*B");

        assert!(out.contains("`A` is not square"));
        assert!(out.contains("this matrix"));
        assert!(out.contains("used here"));
        assert!(out.contains("only square matrices have a trace"));
    }

    #[test]
    fn spanless_error_reports_without_labels() {
        let err = Error::spanless(NotSquare { name: "B".to_string() });
        let out = render(&err, "B");

        assert!(out.contains("`B` is not square"));
        assert!(!out.contains("this matrix"));
    }

    #[test]
    fn or_span_fills_missing_span_only() {
        let err = Error::spanless(GaveUp).or_span(0..3);
        assert_eq!(err.spans, vec![0..3]);

        let err = Error::new(vec![1..2], GaveUp).or_span(0..3);
        assert_eq!(err.spans, vec![1..2]);
    }

    #[test]
    fn custom_report_kind() {
        let err = Error::new(vec![0..1], GaveUp);
        let out = render(&err, "X");

        assert!(out.contains("Warning"));
        assert!(out.contains("gave up"));
    }
}
