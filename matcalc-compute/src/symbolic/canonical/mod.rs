//! Canonicalization of differentials by staged term rewriting.
//!
//! The differential of a scalar function of a matrix `X` can always be written as a sum of terms
//! `Tr(G*d(X))`, from which the gradient `G'` can be read off. This module rewrites the raw
//! output of [`differentiate`](super::differentiate) into that form.
//!
//! # Stages
//!
//! Rewriting runs in three [`Stage`]s, each with a larger rule set than the last (see
//! [`rules`]):
//!
//! 1. [`Stage::Isolate`] moves differentials to the right of products and out of sums.
//! 2. [`Stage::Normalize`] re-associates products to the left and pushes transposes to the
//!    leaves.
//! 3. [`Stage::Collect`] merges traces that share the same differential.
//!
//! Within a stage, every node is canonicalized bottom-up. The children of a node are brought to
//! a fixpoint first, then the node is rebuilt through the smart constructors (see
//! [`Expr::reassociate`]), and then rules are applied at the node until none applies. Each
//! rewrite sends the new node's children through the same process again.
//!
//! The three stages are run again and again until a full round leaves the expression unchanged,
//! so canonicalizing a canonical expression gives the same expression back.
//!
//! # Termination
//!
//! Every shipped rule moves the expression toward the canonical shape, but two rules can undo
//! each other on some inputs. At each node, the canonicalizer prefers rules whose replacement
//! differs from the one it just applied, and never revisits an expression it has already seen at
//! that node. An optional rewrite budget ([`Options::max_rewrites`]) bounds the total work;
//! exhausting it returns a [`NonConvergence`] that carries the best-effort result.
//!
//! The rule just applied is not excluded outright. It is moved behind every other candidate, and
//! is still applied if it is the only rule that changes the node into an unseen expression. The
//! marker is local to one node: each node's fixpoint starts without one, and it is not handed
//! down to the children that are canonicalized after a rewrite. The set of seen expressions is
//! what rules out cycles, of any length, at a node.

pub mod rules;
pub mod step;

use matcalc_attrs::ErrorKind;
use std::collections::{HashMap, HashSet};
use super::{
    expr::{Expr, ExprKind},
    pattern::{apply_rule, match_all_rules, Rule},
    step_collector::StepCollector,
};

pub use step::{Stage, Step};

/// Canonicalization used up its rewrite budget before reaching a fixpoint.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("canonicalization did not converge within {} rewrites", budget),
    labels = ["this expression"],
    help = format!("the partially canonical form is `{}`", partial),
    kind = ariadne::ReportKind::Warning,
)]
pub struct NonConvergence {
    /// The rewrite budget that was exhausted.
    pub budget: usize,

    /// The expression as it was when the budget ran out.
    pub partial: Expr,
}

/// Options for the [`Canonicalizer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// The maximum number of rewrites to perform, or [`None`] for no limit.
    pub max_rewrites: Option<usize>,

    /// Whether to remember canonicalized subtrees within a stage.
    pub memoize: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_rewrites: None,
            memoize: true,
        }
    }
}

impl Options {
    /// Sets the rewrite budget.
    pub fn max_rewrites(mut self, max_rewrites: Option<usize>) -> Self {
        self.max_rewrites = max_rewrites;
        self
    }

    /// Enables or disables memoization.
    pub fn memoize(mut self, memoize: bool) -> Self {
        self.memoize = memoize;
        self
    }
}

/// Drives expressions to the canonical form.
#[derive(Debug, Clone, Default)]
pub struct Canonicalizer {
    options: Options,
}

/// The mutable state of a single run, shared by all stages.
struct Run<'a> {
    options: Options,
    steps: &'a mut dyn StepCollector<Step>,

    /// The number of rewrites performed so far.
    rewrites: usize,

    /// Set once the budget runs out. No further rewrites are made after that.
    exhausted: bool,
}

impl Run<'_> {
    /// Counts one rewrite against the budget, returning false if there is none left.
    fn charge(&mut self) -> bool {
        if let Some(max) = self.options.max_rewrites {
            if self.rewrites >= max {
                self.exhausted = true;
                return false;
            }
        }
        self.rewrites += 1;
        true
    }
}

/// One stage of a run.
struct Pass<'a, 'b> {
    stage: Stage,
    rules: &'static [Rule],
    run: &'a mut Run<'b>,
    memo: HashMap<Expr, Expr>,
}

impl Pass<'_, '_> {
    /// Canonicalizes every child of `expr`, then rebuilds `expr` through the smart constructors,
    /// until a round makes no change.
    fn children_pass(&mut self, expr: &Expr, path: &mut Vec<usize>) -> Expr {
        let mut current = expr.clone();
        let mut seen = HashSet::from([current.clone()]);
        loop {
            let mut index = 0;
            let next = current.map_children(|child| {
                index += 1;
                path.push(index);
                let child = self.fixpoint(child, path);
                path.pop();
                child
            }).reassociate();

            let done = next == current || self.run.exhausted || !seen.insert(next.clone());
            current = next;
            if done {
                return current;
            }
        }
    }

    /// Brings `expr` to a fixpoint of the stage's rules, children first.
    fn fixpoint(&mut self, expr: &Expr, path: &mut Vec<usize>) -> Expr {
        if self.run.options.memoize {
            if let Some(result) = self.memo.get(expr) {
                return result.clone();
            }
        }

        let mut current = self.children_pass(expr, path);
        let mut seen = HashSet::from([current.clone()]);
        let mut previous: Option<Expr> = None;

        while !self.run.exhausted {
            let candidates = match_all_rules(&current, self.rules);

            // the rule just applied goes last, so that two rules cannot undo each other forever
            let (fresh, repeated): (Vec<_>, Vec<_>) = candidates.into_iter()
                .partition(|candidate| Some(candidate.rule.replacement()) != previous.as_ref());
            let chosen = fresh.into_iter()
                .chain(repeated)
                .map(|candidate| {
                    let output = apply_rule(candidate.rule, &candidate.bindings);
                    (candidate, output)
                })
                .find(|(_, output)| *output != current && !seen.contains(output));

            let Some((candidate, output)) = chosen else { break };
            if !self.run.charge() {
                break;
            }

            log::trace!(
                "[{}] {}: {} => {}",
                self.stage,
                candidate.rule,
                current,
                output,
            );
            self.run.steps.push(Step {
                stage: self.stage,
                path: path.clone(),
                pattern: candidate.rule.pattern().clone(),
                replacement: candidate.rule.replacement().clone(),
                before: current.clone(),
                after: output.clone(),
            });

            let next = self.children_pass(&output, path);
            previous = Some(candidate.rule.replacement().clone());
            let revisited = !seen.insert(next.clone());
            current = next;
            if revisited {
                break;
            }
        }

        if self.run.options.memoize && !self.run.exhausted {
            self.memo.insert(expr.clone(), current.clone());
            self.memo.insert(current.clone(), current.clone());
        }
        current
    }
}

impl Canonicalizer {
    /// Creates a canonicalizer with the given options.
    pub fn new(options: Options) -> Self {
        Self { options }
    }

    /// Returns the options of this canonicalizer.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Canonicalizes the expression, reporting every rewrite to `steps`.
    pub fn run(
        &self,
        expr: &Expr,
        steps: &mut dyn StepCollector<Step>,
    ) -> Result<Expr, NonConvergence> {
        let mut run = Run {
            options: self.options,
            steps,
            rewrites: 0,
            exhausted: false,
        };

        let mut current = expr.clone();
        let mut seen = HashSet::from([current.clone()]);
        loop {
            let input = current.clone();
            for stage in Stage::ALL {
                log::debug!("entering stage `{}` with {}", stage, current);
                let mut pass = Pass {
                    stage,
                    rules: rules::rules(stage),
                    run: &mut run,
                    memo: HashMap::new(),
                };
                current = pass.fixpoint(&current, &mut vec![1]);
            }

            if run.exhausted {
                let budget = run.options.max_rewrites.unwrap_or(run.rewrites);
                log::warn!("canonicalization gave up after {} rewrites at {}", budget, current);
                return Err(NonConvergence { budget, partial: current });
            }

            if current == input || !seen.insert(current.clone()) {
                log::debug!("canonical form {} after {} rewrites", current, run.rewrites);
                return Ok(current);
            }
        }
    }
}

/// Canonicalizes the expression with the default options.
pub fn canonicalize(expr: &Expr) -> Expr {
    // without a budget, a run cannot exhaust it
    Canonicalizer::default()
        .run(expr, &mut ())
        .unwrap_or_else(|err| err.partial)
}

/// Canonicalizes the expression with the given options.
pub fn canonicalize_with(expr: &Expr, options: &Options) -> Result<Expr, NonConvergence> {
    Canonicalizer::new(*options).run(expr, &mut ())
}

/// Canonicalizes the expression with the default options, returning every rewrite made along
/// the way.
pub fn canonicalize_with_steps(expr: &Expr) -> (Expr, Vec<Step>) {
    let mut steps = Vec::new();
    let expr = Canonicalizer::default()
        .run(expr, &mut steps)
        .unwrap_or_else(|err| err.partial);
    (expr, steps)
}

/// Returns true if the expression is a single canonical term: `Tr(G*d(X))` with no differential
/// in `G`, `Tr(d(X))`, or a scalar multiple of either.
fn is_canonical_term(expr: &Expr) -> bool {
    match expr {
        Expr::ScalarMul(scale, term) => scale.is_scalar() && is_canonical_term(term),
        Expr::Trace(inner) => match &**inner {
            Expr::Differential(_) => true,
            Expr::MatMul(factor, differential) => {
                matches!(**differential, Expr::Differential(_))
                    && !factor.contains(ExprKind::Differential)
            },
            _ => false,
        },
        _ => false,
    }
}

/// Returns true if the expression is in canonical form: `0`, or a sum or difference of
/// canonical terms.
pub fn is_canonical(expr: &Expr) -> bool {
    match expr {
        Expr::Null => true,
        Expr::Add(lhs, rhs) | Expr::Sub(lhs, rhs) => is_canonical(lhs) && is_canonical(rhs),
        term => is_canonical_term(term),
    }
}
