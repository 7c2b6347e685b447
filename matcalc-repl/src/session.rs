use levenshtein::levenshtein;
use matcalc_compute::symbolic::{
    canonical::{Canonicalizer, Options, Step},
    derivative::{differentiate_with, Order},
    expr::{latex::derivative_latex, Expr},
    lower::{parse, Symbols},
};
use matcalc_error::Error as SourceError;
use std::ops::Range;
use crate::error::{relocate, Error, InvalidArguments, UnknownCommand};

/// The rewrite budget of a new session.
pub const DEFAULT_BUDGET: usize = 10_000;

/// The commands of the shell, with their usage strings.
const COMMANDS: [(&str, &str); 9] = [
    ("d", ":d X <expr>          differentiate with respect to X and canonicalize"),
    ("h", ":h X <expr>          second differential with respect to X"),
    ("c", ":c <expr>            canonicalize"),
    ("tex", ":tex X <expr>        the derivative with respect to X as LaTeX"),
    ("tree", ":tree <expr>         the expression tree"),
    ("scalar", ":scalar a b ...      declare scalar variables"),
    ("steps", ":steps on|off        show the rewrites made by the canonicalizer"),
    ("budget", ":budget N|off        limit the number of rewrites"),
    ("help", ":help                this message"),
];

/// Returns the usage string of a command.
fn usage(name: &str) -> &'static str {
    COMMANDS.iter()
        .find(|(command, _)| *command == name)
        .map_or("", |(_, usage)| usage)
}

/// The output of a line of input.
#[derive(Debug, Default)]
pub struct Output {
    /// The text to print.
    pub text: String,

    /// Non-fatal diagnostics, with spans relative to the line.
    pub warnings: Vec<SourceError>,
}

impl From<String> for Output {
    fn from(text: String) -> Self {
        Self { text, warnings: Vec::new() }
    }
}

/// A word of the input line, with its position in the line.
#[derive(Debug, Clone, Copy)]
struct Word<'a> {
    text: &'a str,
    start: usize,
}

impl Word<'_> {
    fn span(&self) -> Range<usize> {
        self.start..self.start + self.text.len()
    }

    /// Returns the word without surrounding whitespace.
    fn trimmed(&self) -> Self {
        let text = self.text.trim_start();
        Word {
            start: self.start + self.text.len() - text.len(),
            text: text.trim_end(),
        }
    }
}

/// Splits the first whitespace-delimited word off the input, which starts at `start` in the line.
/// Returns the word and the rest of the input.
fn split_word(input: &str, start: usize) -> Option<(Word, Word)> {
    let trimmed = input.trim_start();
    if trimmed.is_empty() {
        return None;
    }
    let start = start + input.len() - trimmed.len();
    let end = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
    let word = Word { text: &trimmed[..end], start };
    let rest = Word { text: &trimmed[end..], start: start + end };
    Some((word, rest))
}

/// The state of the shell between lines.
#[derive(Debug, Clone)]
pub struct Session {
    /// The names declared as scalar variables.
    symbols: Symbols,

    /// Whether to print the rewrites made by the canonicalizer.
    steps: bool,

    /// The options passed to the canonicalizer.
    options: Options,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            symbols: Symbols::new(),
            steps: false,
            options: Options::default().max_rewrites(Some(DEFAULT_BUDGET)),
        }
    }
}

impl Session {
    /// Creates a new session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs a line of input.
    pub fn run(&mut self, line: &str) -> Result<Output, Error> {
        let Some((first, rest)) = split_word(line, 0) else {
            return Ok(Output::default());
        };

        let Some(name) = first.text.strip_prefix(':') else {
            let whole = Word { text: line.trim(), start: first.start };
            let expr = self.parse(whole)?;
            return Ok(expr.to_string().into());
        };

        let invalid = || SourceError::new(vec![first.span()], InvalidArguments { usage: usage(name) });
        match name {
            "d" | "h" | "tex" => {
                let (wrt, expr) = split_word(rest.text, rest.start)
                    .filter(|(_, expr)| !expr.text.trim().is_empty())
                    .ok_or_else(invalid)?;
                let order = if name == "h" { Order::Second } else { Order::First };
                self.differentiate(wrt, expr, order, name == "tex").map_err(Error::from)
            },
            "c" => {
                let rest = rest.trimmed();
                let expr = self.parse(rest)?;
                let mut output = Output::default();
                let canonical = self.canonicalize(&expr, rest, &mut output);
                output.text.push_str(&canonical.to_string());
                Ok(output)
            },
            "tree" => {
                let expr = self.parse(rest)?;
                Ok(expr.structure().trim_end().to_string().into())
            },
            "scalar" => {
                let names = rest.text.split_whitespace().collect::<Vec<_>>();
                if names.is_empty() {
                    return Err(invalid().into());
                }
                for name in names {
                    self.symbols.declare_scalar(name);
                }
                Ok(format!("scalars: {}", self.symbols.scalars().join(", ")).into())
            },
            "steps" => {
                self.steps = match rest.text.trim() {
                    "on" => true,
                    "off" => false,
                    _ => return Err(invalid().into()),
                };
                Ok(format!("steps {}", rest.text.trim()).into())
            },
            "budget" => {
                let budget = match rest.text.trim() {
                    "off" => None,
                    n => Some(n.parse::<usize>().map_err(|_| invalid())?),
                };
                self.options = self.options.max_rewrites(budget);
                Ok(match budget {
                    Some(n) => format!("budget {} rewrites", n),
                    None => "budget off".to_string(),
                }.into())
            },
            "help" => Ok(COMMANDS.iter()
                .map(|(_, usage)| *usage)
                .collect::<Vec<_>>()
                .join("\n")
                .into()),
            _ => {
                let suggestions = COMMANDS.iter()
                    .map(|(command, _)| *command)
                    .filter(|command| levenshtein(command, name) < 2)
                    .map(str::to_string)
                    .collect();
                Err(SourceError::new(vec![first.span()], UnknownCommand {
                    name: name.to_string(),
                    suggestions,
                }).into())
            },
        }
    }

    /// Parses an expression from a word of the line.
    fn parse(&self, word: Word) -> Result<Expr, SourceError> {
        let word = word.trimmed();
        parse(word.text, &self.symbols).map_err(|err| relocate(err, word.span()))
    }

    /// Canonicalizes an expression, adding the steps and warnings to the output.
    fn canonicalize(&self, expr: &Expr, word: Word, output: &mut Output) -> Expr {
        let mut steps = Vec::<Step>::new();
        let result = Canonicalizer::new(self.options).run(expr, &mut steps);
        if self.steps {
            for step in steps {
                output.text.push_str(&step.to_string());
                output.text.push('\n');
            }
        }
        match result {
            Ok(expr) => expr,
            Err(err) => {
                let partial = err.partial.clone();
                output.warnings.push(relocate(SourceError::spanless(err), word.span()));
                partial
            },
        }
    }

    /// Differentiates an expression and canonicalizes the result.
    fn differentiate(
        &self,
        wrt: Word,
        word: Word,
        order: Order,
        latex: bool,
    ) -> Result<Output, SourceError> {
        let word = word.trimmed();
        let expr = self.parse(word)?;
        let mut diagnostics = Vec::new();
        let raw = differentiate_with(&expr, wrt.text, order, &mut diagnostics);

        let mut output = Output::default();
        output.warnings.extend(diagnostics.into_iter()
            .map(|diagnostic| relocate(SourceError::spanless(diagnostic), word.span())));

        let canonical = self.canonicalize(&raw, word, &mut output);
        if latex {
            output.text.push_str(&derivative_latex(&expr, wrt.text, &canonical, order));
        } else {
            output.text.push_str(&format!("{}\n= {}", raw, canonical));
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use super::*;

    fn run(session: &mut Session, line: &str) -> String {
        session.run(line).unwrap().text
    }

    fn spans(session: &mut Session, line: &str) -> Vec<Range<usize>> {
        match session.run(line).unwrap_err() {
            Error::Input(err) => err.spans,
            Error::Io(err) => panic!("unexpected io error: {}", err),
        }
    }

    #[test]
    fn bare_expression_is_echoed() {
        let mut session = Session::new();
        assert_eq!(run(&mut session, "  (A * B)' "), "(A*B)'");
        assert_eq!(run(&mut session, ""), "");
    }

    #[test]
    fn differentiate_and_canonicalize() {
        let mut session = Session::new();
        assert_eq!(run(&mut session, ":d X Tr(A*X*B)"), "Tr(A*d(X)*B)\n= Tr(B*A*d(X))");
        assert_eq!(run(&mut session, ":c Tr(A + B)"), "Tr(A)+Tr(B)");
    }

    #[test]
    fn scalars_and_latex() {
        let mut session = Session::new();
        assert_eq!(run(&mut session, ":scalar lambda mu"), "scalars: lambda, mu");
        assert_eq!(
            run(&mut session, ":tex X lambda*Tr(X)"),
            "\\frac{\\partial lambda \\mathrm{Tr}\\left(\\mathbf{X}\\right)}{\\partial \\mathbf{X}} = lambda \\mathrm{Tr}\\left(\\partial \\mathbf{X}\\right)",
        );
    }

    #[test]
    fn steps_are_printed() {
        let mut session = Session::new();
        run(&mut session, ":steps on");
        let out = run(&mut session, ":c Tr(A*d(X)*B)");
        assert!(out.starts_with("[1] Applying Tr(d(A)*B) -> Tr(B*A)\n"));
        assert!(out.ends_with("Tr(B*A*d(X))"));
    }

    #[test]
    fn budget_exhaustion_warns() {
        let mut session = Session::new();
        assert_eq!(run(&mut session, ":budget 1"), "budget 1 rewrites");
        let output = session.run(":c Tr(A*d(X)*B)").unwrap();
        assert_eq!(output.warnings.len(), 1);
        assert_eq!(output.warnings[0].spans, vec![3..15]);
        assert_eq!(run(&mut session, ":budget off"), "budget off");
        assert!(session.run(":c Tr(A*d(X)*B)").unwrap().warnings.is_empty());
    }

    #[test]
    fn unsupported_differential_warns() {
        let mut session = Session::new();
        run(&mut session, ":scalar s");
        let output = session.run(":d s s").unwrap();
        assert_eq!(output.text, "d(s)\n= d(s)");
        assert_eq!(output.warnings[0].spans, vec![5..6]);
    }

    #[test]
    fn errors_point_into_the_line() {
        let mut session = Session::new();
        assert_eq!(spans(&mut session, ":d X A*T"), vec![7..8]);
        assert_eq!(spans(&mut session, ":tez X A"), vec![0..4]);
        assert_eq!(spans(&mut session, ":steps maybe"), vec![0..6]);
        assert_eq!(spans(&mut session, ":d X"), vec![0..2]);
        assert_eq!(spans(&mut session, ":c Tx(A)"), vec![3..5]);
    }
}
