//! The rule sets of each canonicalization stage.
//!
//! Patterns are built from the raw enum variants, since the smart constructors would fold them.
//! `A`, `B` and `C` are matrix pattern variables, `s` and `u` are scalar pattern variables, and
//! `d(..)` is the differential wildcard described in [`pattern`](crate::symbolic::pattern).
//!
//! Every rule is a valid identity on the expressions it matches. The trace rules rely on the
//! trace being invariant under transposition and cyclic permutation of its product.

use once_cell::sync::Lazy;
use std::sync::Arc;
use crate::symbolic::{expr::{Expr, StarOp}, pattern::Rule};
use super::step::Stage;

fn var(name: &str) -> Expr {
    Expr::Variable(name.to_string())
}

fn sca(name: &str) -> Expr {
    Expr::ScalarVariable(name.to_string())
}

fn d(inner: Expr) -> Expr {
    Expr::Differential(Arc::new(inner))
}

fn tr(inner: Expr) -> Expr {
    Expr::Trace(Arc::new(inner))
}

fn t(inner: Expr) -> Expr {
    Expr::Star(StarOp::Transpose, Arc::new(inner))
}

fn mm(lhs: Expr, rhs: Expr) -> Expr {
    Expr::MatMul(Arc::new(lhs), Arc::new(rhs))
}

fn add(lhs: Expr, rhs: Expr) -> Expr {
    Expr::Add(Arc::new(lhs), Arc::new(rhs))
}

fn sub(lhs: Expr, rhs: Expr) -> Expr {
    Expr::Sub(Arc::new(lhs), Arc::new(rhs))
}

fn smul(lhs: Expr, rhs: Expr) -> Expr {
    Expr::ScalarMul(Arc::new(lhs), Arc::new(rhs))
}

/// Rules that move differentials rightward and outward.
fn isolate() -> Vec<Rule> {
    let (a, b, c) = (var("A"), var("B"), var("C"));
    let s = sca("s");
    vec![
        // Tr(dA*B) = Tr(B*dA)
        Rule::new(tr(mm(d(a.clone()), b.clone())), tr(mm(b.clone(), a.clone()))),
        // the trace of a differential of a sum is the sum of traces
        Rule::new(tr(d(add(a.clone(), b.clone()))), add(tr(a.clone()), tr(b.clone()))),
        Rule::new(tr(d(sub(a.clone(), b.clone()))), sub(tr(a.clone()), tr(b.clone()))),
        // Tr(A*dB') = Tr(dB*A') = Tr(A'*dB)
        Rule::new(tr(mm(a.clone(), t(d(b.clone())))), tr(mm(t(a.clone()), b.clone()))),
        Rule::new(tr(t(d(a.clone()))), tr(a.clone())),
        // distribute products over sums that carry a differential
        Rule::new(
            mm(d(add(a.clone(), b.clone())), c.clone()),
            add(mm(a.clone(), c.clone()), mm(b.clone(), c.clone())),
        ),
        Rule::new(
            mm(a.clone(), d(add(b.clone(), c.clone()))),
            add(mm(a.clone(), b.clone()), mm(a.clone(), c.clone())),
        ),
        Rule::new(
            mm(d(sub(a.clone(), b.clone())), c.clone()),
            sub(mm(a.clone(), c.clone()), mm(b.clone(), c.clone())),
        ),
        Rule::new(
            mm(a.clone(), d(sub(b.clone(), c.clone()))),
            sub(mm(a.clone(), b.clone()), mm(a.clone(), c.clone())),
        ),
        // Tr(A*(B*C)) = Tr((A*B)*C), bringing a rightmost differential to the top product
        Rule::new(
            tr(mm(a.clone(), d(mm(b.clone(), c.clone())))),
            tr(mm(mm(a.clone(), b.clone()), c.clone())),
        ),
        // push transposes of differentials down
        Rule::new(t(d(mm(a.clone(), b.clone()))), mm(t(b.clone()), t(a.clone()))),
        Rule::new(t(d(add(a.clone(), b.clone()))), add(t(a.clone()), t(b.clone()))),
        Rule::new(t(d(sub(a.clone(), b.clone()))), sub(t(a.clone()), t(b.clone()))),
        // scalars leave transposes and traces
        Rule::new(t(smul(s.clone(), a.clone())), smul(s.clone(), t(a.clone()))),
        Rule::new(tr(smul(s.clone(), a.clone())), smul(s, tr(a))),
    ]
}

/// Rules that re-associate products and push every transpose to the leaves.
fn normalize() -> Vec<Rule> {
    let (a, b, c) = (var("A"), var("B"), var("C"));
    vec![
        Rule::new(mm(a.clone(), mm(b.clone(), c.clone())), mm(mm(a.clone(), b.clone()), c)),
        Rule::new(t(mm(a.clone(), b.clone())), mm(t(b.clone()), t(a.clone()))),
        Rule::new(t(add(a.clone(), b.clone())), add(t(a.clone()), t(b.clone()))),
        Rule::new(t(sub(a.clone(), b.clone())), sub(t(a.clone()), t(b))),
        Rule::new(tr(t(a.clone())), tr(a)),
    ]
}

/// Rules that collect traces sharing the same differential into a single trace, and split
/// traces of sums.
fn collect() -> Vec<Rule> {
    let (a, b, c) = (var("A"), var("B"), var("C"));
    let (s, u) = (sca("s"), sca("u"));

    let term = |g: Expr| tr(mm(g, d(c.clone())));
    let scaled = |k: &Expr, g: Expr| smul(k.clone(), term(g));
    let collected = |g: Expr| tr(mm(g, c.clone()));

    vec![
        Rule::new(add(term(a.clone()), term(b.clone())), collected(add(a.clone(), b.clone()))),
        Rule::new(sub(term(a.clone()), term(b.clone())), collected(sub(a.clone(), b.clone()))),
        Rule::new(
            add(scaled(&s, a.clone()), term(b.clone())),
            collected(add(smul(s.clone(), a.clone()), b.clone())),
        ),
        Rule::new(
            add(term(a.clone()), scaled(&s, b.clone())),
            collected(add(a.clone(), smul(s.clone(), b.clone()))),
        ),
        Rule::new(
            add(scaled(&s, a.clone()), scaled(&u, b.clone())),
            collected(add(smul(s.clone(), a.clone()), smul(u.clone(), b.clone()))),
        ),
        Rule::new(
            sub(scaled(&s, a.clone()), term(b.clone())),
            collected(sub(smul(s.clone(), a.clone()), b.clone())),
        ),
        Rule::new(
            sub(term(a.clone()), scaled(&s, b.clone())),
            collected(sub(a.clone(), smul(s.clone(), b.clone()))),
        ),
        Rule::new(
            sub(scaled(&s, a.clone()), scaled(&u, b.clone())),
            collected(sub(smul(s, a.clone()), smul(u, b.clone()))),
        ),
        // split traces of sums, so that equal traces can meet in one sum
        Rule::new(tr(add(a.clone(), b.clone())), add(tr(a.clone()), tr(b.clone()))),
        Rule::new(tr(sub(a.clone(), b.clone())), sub(tr(a), tr(b))),
    ]
}

static ISOLATE: Lazy<Vec<Rule>> = Lazy::new(isolate);

static NORMALIZE: Lazy<Vec<Rule>> = Lazy::new(|| {
    let mut rules = isolate();
    rules.extend(normalize());
    rules
});

static COLLECT: Lazy<Vec<Rule>> = Lazy::new(|| {
    let mut rules = isolate();
    rules.extend(normalize());
    rules.extend(collect());
    rules
});

/// Returns the rules that are active in the given stage.
pub fn rules(stage: Stage) -> &'static [Rule] {
    match stage {
        Stage::Isolate => &ISOLATE,
        Stage::Normalize => &NORMALIZE,
        Stage::Collect => &COLLECT,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use super::*;

    #[test]
    fn stages_are_cumulative() {
        assert_eq!(rules(Stage::Isolate).len(), 15);
        assert_eq!(rules(Stage::Normalize).len(), 20);
        assert_eq!(rules(Stage::Collect).len(), 30);
        assert_eq!(&rules(Stage::Collect)[..20], rules(Stage::Normalize));
    }

    #[test]
    fn replacements_only_use_bound_variables() {
        for rule in rules(Stage::Collect) {
            assert!(
                Rule::try_new(rule.pattern().clone(), rule.replacement().clone()).is_ok(),
                "{}",
                rule,
            );
        }
    }

    #[test]
    fn patterns_are_distinct() {
        let patterns = rules(Stage::Collect).iter()
            .map(|rule| rule.pattern().clone())
            .collect::<HashSet<_>>();
        assert_eq!(patterns.len(), rules(Stage::Collect).len());
    }
}
