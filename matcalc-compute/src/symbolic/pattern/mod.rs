//! Structural pattern matching of expressions against rewrite rules.
//!
//! A pattern is an ordinary [`Expr`] in which every leaf variable is a _pattern variable_:
//!
//! - A [`Expr::Variable`] matches any subtree.
//! - A [`Expr::ScalarVariable`] matches any scalar-kind subtree.
//! - A [`Expr::Differential`] is a wildcard for "something carrying a differential". It matches
//!   any subtree that contains a differential anywhere inside it, and the pattern inside it is
//!   then matched against that same subtree. `d(A*B)` therefore matches any product with a
//!   differential somewhere in one of its factors.
//!
//! Every other node must match a node of the same variant, and literal scalars and `Null` must
//! match exactly. A variable that appears more than once must be bound to structurally equal
//! subtrees at every occurrence.
//!
//! ```
//! use matcalc_compute::symbolic::{lower::{parse, Symbols}, pattern::match_pattern};
//!
//! let symbols = Symbols::new();
//! let pattern = parse("Tr(d(A)*B)", &symbols).unwrap();
//! let expr = parse("Tr(C*d(X)*Y)", &symbols).unwrap();
//!
//! let bindings = match_pattern(&expr, &pattern).unwrap();
//! assert_eq!(bindings["A"].to_string(), "C*d(X)");
//! assert_eq!(bindings["B"].to_string(), "Y");
//! ```

mod rule;

use std::collections::HashMap;
use super::expr::{Expr, ExprKind};

pub use rule::{apply_rule, Rule, UnboundVariable};

/// Maps each pattern variable to the subtree it was bound to.
pub type Bindings = HashMap<String, Expr>;

/// The reason a pattern did not match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchError {
    /// The variable was bound to two structurally different subtrees.
    Inconsistent {
        /// The name of the variable.
        name: String,
    },

    /// The expression and the pattern have different shapes.
    Mismatch,

    /// A scalar pattern variable met a subtree that is not scalar-kind.
    NotScalar {
        /// The name of the variable.
        name: String,
    },

    /// A differential wildcard met a subtree with no differential in it.
    NoDifferential,
}

/// Binds `name` to `expr`, failing if it is already bound to something else.
fn bind(bindings: &mut Bindings, name: &str, expr: &Expr) -> Result<(), MatchError> {
    match bindings.get(name) {
        Some(bound) if bound != expr => Err(MatchError::Inconsistent { name: name.to_string() }),
        Some(_) => Ok(()),
        None => {
            bindings.insert(name.to_string(), expr.clone());
            Ok(())
        },
    }
}

fn match_into(expr: &Expr, pattern: &Expr, bindings: &mut Bindings) -> Result<(), MatchError> {
    match (pattern, expr) {
        (Expr::Variable(name), _) => bind(bindings, name, expr),
        (Expr::ScalarVariable(name), _) => {
            if expr.is_scalar() {
                bind(bindings, name, expr)
            } else {
                Err(MatchError::NotScalar { name: name.clone() })
            }
        },
        (Expr::Differential(inner), _) => {
            if expr.contains(ExprKind::Differential) {
                match_into(expr, inner, bindings)
            } else {
                Err(MatchError::NoDifferential)
            }
        },
        (Expr::Scalar(a), Expr::Scalar(b)) if a == b => Ok(()),
        (Expr::Null, Expr::Null) => Ok(()),
        (Expr::Trace(p), Expr::Trace(e)) => match_into(e, p, bindings),
        (Expr::Star(p_op, p), Expr::Star(e_op, e)) if p_op == e_op => match_into(e, p, bindings),
        (Expr::Add(pl, pr), Expr::Add(el, er))
            | (Expr::Sub(pl, pr), Expr::Sub(el, er))
            | (Expr::ScalarMul(pl, pr), Expr::ScalarMul(el, er))
            | (Expr::MatMul(pl, pr), Expr::MatMul(el, er)) => {
            match_into(el, pl, bindings)?;
            match_into(er, pr, bindings)
        },
        _ => Err(MatchError::Mismatch),
    }
}

/// Matches `expr` against `pattern`, returning the bindings of the pattern variables.
pub fn match_pattern(expr: &Expr, pattern: &Expr) -> Result<Bindings, MatchError> {
    let mut bindings = Bindings::new();
    match_into(expr, pattern, &mut bindings)?;
    Ok(bindings)
}

/// A rule whose pattern matched an expression, with the bindings it produced.
#[derive(Debug, Clone)]
pub struct Candidate<'a> {
    /// The matching rule.
    pub rule: &'a Rule,

    /// The position of the rule in its rule set.
    pub index: usize,

    /// The bindings of the rule's pattern variables.
    pub bindings: Bindings,
}

/// Matches `expr` against every rule in the rule set, returning the rules that matched with all
/// of their pattern variables bound. The most specific rules (those with the largest patterns)
/// come first; rules with equally large patterns keep their order in the rule set.
pub fn match_all_rules<'a>(expr: &Expr, rules: &'a [Rule]) -> Vec<Candidate<'a>> {
    let mut candidates = rules.iter()
        .enumerate()
        .filter_map(|(index, rule)| {
            let bindings = match_pattern(expr, rule.pattern()).ok()?;
            rule.variables()
                .iter()
                .all(|name| bindings.contains_key(name))
                .then_some(Candidate { rule, index, bindings })
        })
        .collect::<Vec<_>>();
    candidates.sort_by(|a, b| b.rule.size().cmp(&a.rule.size()));
    candidates
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use crate::symbolic::lower::{parse, Symbols};
    use super::*;

    fn p(source: &str) -> Expr {
        parse(source, &Symbols::new().with_scalar("s").with_scalar("u")).unwrap()
    }

    /// Wraps an arbitrary pattern in a differential wildcard, which the parser only allows
    /// around a single name.
    fn d(inner: Expr) -> Expr {
        Expr::Differential(Arc::new(inner))
    }

    fn mm(lhs: Expr, rhs: Expr) -> Expr {
        Expr::MatMul(Arc::new(lhs), Arc::new(rhs))
    }

    #[test]
    fn variables_bind_subtrees() {
        let bindings = match_pattern(&p("(Y-D*X)'*B"), &p("A'*B")).unwrap();
        assert_eq!(bindings["A"], p("Y-D*X"));
        assert_eq!(bindings["B"], p("B"));
    }

    #[test]
    fn repeated_variables_must_agree() {
        assert!(match_pattern(&p("Tr(X)+Tr(X*Y)"), &p("Tr(A)+Tr(A*B)")).is_ok());
        assert_eq!(
            match_pattern(&p("Tr(X)+Tr(Y*Y)"), &p("Tr(A)+Tr(A*B)")),
            Err(MatchError::Inconsistent { name: "A".to_string() }),
        );
    }

    #[test]
    fn scalar_variables_need_scalars() {
        let bindings = match_pattern(&p("2*X"), &p("s*A")).unwrap();
        assert_eq!(bindings["s"], Expr::Scalar(2.0));

        let product = Expr::ScalarMul(Arc::new(p("B")), Arc::new(p("X")));
        assert_eq!(
            match_pattern(&product, &p("s*A")),
            Err(MatchError::NotScalar { name: "s".to_string() }),
        );
    }

    #[test]
    fn differential_wildcard_looks_inside() {
        let pattern = mm(d(p("A+B")), p("C"));
        let bindings = match_pattern(&p("(X*d(X)+Y)*Z"), &pattern).unwrap();
        assert_eq!(bindings["A"], p("X*d(X)"));
        assert_eq!(bindings["B"], p("Y"));
        assert_eq!(bindings["C"], p("Z"));

        assert_eq!(match_pattern(&p("(X+Y)*Z"), &pattern), Err(MatchError::NoDifferential));
        assert_eq!(match_pattern(&p("d(X)*Z"), &pattern), Err(MatchError::Mismatch));
    }

    #[test]
    fn literals_match_exactly() {
        assert!(match_pattern(&p("2*X"), &p("2*A")).is_ok());
        assert_eq!(match_pattern(&p("3*X"), &p("2*A")), Err(MatchError::Mismatch));
        assert_eq!(match_pattern(&p("X'"), &p("Tr(A)")), Err(MatchError::Mismatch));
    }

    #[test]
    fn most_specific_rule_first() {
        let rules = vec![
            Rule::new(p("Tr(A)"), p("Tr(A)")),
            Rule::new(p("Tr(d(A)*B)"), p("Tr(B*A)")),
            Rule::new(mm(p("A"), d(p("B*C"))).trace(), p("Tr(A*B*C)")),
            Rule::new(p("Tr(A+B)"), p("Tr(A)+Tr(B)")),
        ];
        let candidates = match_all_rules(&p("Tr(A*d(X)*B)"), &rules);
        let order = candidates.iter().map(|c| c.index).collect::<Vec<_>>();
        assert_eq!(order, vec![1, 0]);
    }
}
