use ariadne::{Fmt, Source};
use matcalc_attrs::ErrorKind;
use matcalc_error::{Error as SourceError, EXPR};
use std::ops::Range;

/// The command is not one of the known commands.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("unknown command `:{}`", self.name),
    labels = ["this command"],
    help = if self.suggestions.is_empty() {
        format!("type {} for a list of commands", ":help".fg(EXPR))
    } else {
        format!("did you mean `{}`?", format!(":{}", self.suggestions[0]).fg(EXPR))
    },
)]
pub struct UnknownCommand {
    /// The name of the command, without the leading colon.
    pub name: String,

    /// Similarly named commands.
    pub suggestions: Vec<String>,
}

/// The command was given too few arguments, or arguments it does not understand.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = "invalid arguments",
    labels = ["for this command"],
    help = format!("usage: {}", usage.fg(EXPR)),
)]
pub struct InvalidArguments {
    /// The usage string of the command.
    pub usage: &'static str,
}

/// Utility enum to package errors that can occur while reading and running input.
#[derive(Debug)]
pub enum Error {
    /// An error in the input line, with spans relative to the line.
    Input(SourceError),

    /// The input could not be read.
    Io(std::io::Error),
}

impl Error {
    /// Report the error to stderr.
    ///
    /// The `ariadne` crate's [`Report`](ariadne::Report) type actually does not have a `Display`
    /// implementation, so we can only use its `eprint` method to print to stderr.
    pub fn report_to_stderr(&self, input: &str) {
        match self {
            Self::Input(err) => report_to_stderr(err, input),
            Self::Io(err) => eprintln!("error: {}", err),
        }
    }
}

/// Report a single source error to stderr.
pub fn report_to_stderr(err: &SourceError, input: &str) {
    let report = err.build_report("input");
    if let Err(err) = report.eprint(("input", Source::from(input))) {
        eprintln!("error: {}", err);
    }
}

/// Moves the spans of an error that was raised on a substring of the input line, so that they
/// point into the line itself. A spanless error is pointed at the whole substring.
pub fn relocate(mut err: SourceError, substring: Range<usize>) -> SourceError {
    let offset = substring.start;
    for span in err.spans.iter_mut() {
        *span = span.start + offset..span.end + offset;
    }
    err.or_span(substring)
}

impl From<SourceError> for Error {
    fn from(err: SourceError) -> Self {
        Self::Input(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use super::*;

    #[test]
    fn relocate_shifts_spans() {
        let err = SourceError::new(vec![1..2, 3..5], InvalidArguments { usage: ":d X <expr>" });
        assert_eq!(relocate(err, 10..20).spans, vec![11..12, 13..15]);

        let err = SourceError::spanless(InvalidArguments { usage: ":d X <expr>" });
        assert_eq!(relocate(err, 10..20).spans, vec![10..20]);
    }

    #[test]
    fn unknown_command_report() {
        let err = SourceError::new(vec![0..5], UnknownCommand {
            name: "tez".to_string(),
            suggestions: vec!["tex".to_string()],
        });
        let mut buf = Vec::new();
        err.build_report("input")
            .write(("input", Source::from(":tez X")), &mut buf)
            .unwrap();
        let out = String::from_utf8(strip_ansi_escapes::strip(buf)).unwrap();
        assert!(out.contains("unknown command `:tez`"));
        assert!(out.contains("did you mean `:tex`?"));
    }
}
