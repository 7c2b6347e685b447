use std::fmt;
use super::super::expr::Expr;

/// A stage of canonicalization. Each stage's rule set includes all the rules of the stages
/// before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Rules that move differentials to the right of products and out of sums.
    Isolate,

    /// Adds re-association of products to the left and pushes transposes toward the leaves.
    Normalize,

    /// Adds collection of traces that share a differential.
    Collect,
}

impl Stage {
    /// All stages, in the order they run.
    pub const ALL: [Stage; 3] = [Stage::Isolate, Stage::Normalize, Stage::Collect];
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Isolate => write!(f, "isolate"),
            Stage::Normalize => write!(f, "normalize"),
            Stage::Collect => write!(f, "collect"),
        }
    }
}

/// A single rule application made by the canonicalizer.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    /// The stage the rule was applied in.
    pub stage: Stage,

    /// The position of the rewritten node, as 1-based child indices starting at the root `[1]`.
    pub path: Vec<usize>,

    /// The pattern of the applied rule.
    pub pattern: Expr,

    /// The replacement of the applied rule.
    pub replacement: Expr,

    /// The node before the rewrite.
    pub before: Expr,

    /// The node after the rewrite, before its children were canonicalized again.
    pub after: Expr,
}

impl Step {
    /// Returns the path formatted as dot-separated indices, such as `1.2.1`.
    pub fn path_string(&self) -> String {
        self.path.iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(".")
    }
}

/// Writes the step on two lines:
///
/// ```text
/// [1.2] Applying Tr(d(A)*B) -> Tr(B*A)
/// [1.2] :: Tr(d(X)*Y) -> Tr(Y*d(X))
/// ```
impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = self.path_string();
        writeln!(f, "[{}] Applying {} -> {}", path, self.pattern, self.replacement)?;
        write!(f, "[{}] :: {} -> {}", path, self.before, self.after)
    }
}
