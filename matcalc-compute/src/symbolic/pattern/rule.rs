use matcalc_attrs::ErrorKind;
use std::{collections::BTreeSet, fmt, sync::Arc};
use super::{super::expr::{Expr, StarOp}, Bindings};

/// The replacement of a rule uses a variable that its pattern never binds.
#[derive(Debug, Clone, ErrorKind, PartialEq)]
#[error(
    message = format!("the replacement uses `{}`, which the pattern does not bind", name),
    labels = ["this rule"],
    help = "every variable in the replacement must also appear in the pattern",
)]
pub struct UnboundVariable {
    /// The name of the unbound variable.
    pub name: String,
}

/// A unary node of a compiled template.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Unary {
    Differential,
    Trace,
    Star(StarOp),
}

/// A binary node of a compiled template. Both products go through the same smart constructor,
/// which decides between a scaling and a matrix product from the operands.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Binary {
    Add,
    Sub,
    Mul,
}

/// A node of a compiled template. Operands refer to earlier nodes by index.
#[derive(Debug, Clone, PartialEq)]
enum Node {
    /// A pattern variable, with the leaf to fall back on if it is unbound. Bound values are
    /// placed through the template's sites.
    Var(String, Expr),

    /// A constant leaf, copied as it is.
    Leaf(Expr),

    Unary(Unary, usize),
    Binary(Binary, usize, usize),
}

/// The occurrence of a pattern variable in a template.
#[derive(Debug, Clone, PartialEq)]
struct Site {
    /// The index of the node the variable is an operand of, or [`None`] at the root.
    owner: Option<usize>,

    /// Which operand of the owner the variable is.
    slot: usize,

    /// The name of the variable.
    name: String,
}

/// A replacement compiled into a flat list of nodes in post-order, so it can be instantiated
/// without recursion. The last node is the root.
#[derive(Debug, Clone, PartialEq)]
struct Template {
    nodes: Vec<Node>,
    sites: Vec<Site>,
}

impl Template {
    fn compile(expr: &Expr) -> Self {
        let mut template = Template { nodes: Vec::new(), sites: Vec::new() };
        template.push(expr);

        // every operand index is known once the whole tree is pushed
        for (owner, node) in template.nodes.iter().enumerate() {
            let operands = match node {
                Node::Unary(_, a) => vec![*a],
                Node::Binary(_, a, b) => vec![*a, *b],
                _ => continue,
            };
            for (slot, operand) in operands.into_iter().enumerate() {
                if let Node::Var(name, _) = &template.nodes[operand] {
                    template.sites.push(Site { owner: Some(owner), slot, name: name.clone() });
                }
            }
        }
        if let Some(Node::Var(name, _)) = template.nodes.last() {
            template.sites.push(Site { owner: None, slot: 0, name: name.clone() });
        }

        template
    }

    /// Pushes the nodes of `expr` in post-order, returning the index of its root.
    fn push(&mut self, expr: &Expr) -> usize {
        let node = match expr {
            Expr::Variable(name) | Expr::ScalarVariable(name) => Node::Var(name.clone(), expr.clone()),
            Expr::Scalar(_) | Expr::Null => Node::Leaf(expr.clone()),
            Expr::Differential(inner) => Node::Unary(Unary::Differential, self.push(inner)),
            Expr::Trace(inner) => Node::Unary(Unary::Trace, self.push(inner)),
            Expr::Star(op, inner) => Node::Unary(Unary::Star(*op), self.push(inner)),
            Expr::Add(lhs, rhs) => {
                let lhs = self.push(lhs);
                Node::Binary(Binary::Add, lhs, self.push(rhs))
            },
            Expr::Sub(lhs, rhs) => {
                let lhs = self.push(lhs);
                Node::Binary(Binary::Sub, lhs, self.push(rhs))
            },
            Expr::ScalarMul(lhs, rhs) | Expr::MatMul(lhs, rhs) => {
                let lhs = self.push(lhs);
                Node::Binary(Binary::Mul, lhs, self.push(rhs))
            },
        };
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    /// Returns the index of the node that fills the given operand slot of `owner`, or the root
    /// when there is no owner.
    fn operand(&self, owner: Option<usize>, slot: usize) -> Option<usize> {
        match owner.map(|owner| &self.nodes[owner]) {
            None => self.nodes.len().checked_sub(1),
            Some(Node::Unary(_, a)) if slot == 0 => Some(*a),
            Some(Node::Binary(_, a, b)) => [*a, *b].get(slot).copied(),
            Some(_) => None,
        }
    }

    /// Builds the template with its variables substituted, through the smart constructors.
    ///
    /// Bindings are placed at the recorded sites before the nodes are built. A binding that is
    /// itself a transpose, placed under a transpose, replaces the owner with the untransposed
    /// binding instead.
    fn instantiate(&self, bindings: &Bindings) -> Expr {
        let mut substitutions: Vec<Option<Expr>> = vec![None; self.nodes.len()];
        for site in &self.sites {
            let Some(value) = bindings.get(&site.name) else { continue };
            let Some(index) = self.operand(site.owner, site.slot) else { continue };

            match (site.owner, value) {
                (Some(owner), Expr::Star(StarOp::Transpose, inner))
                    if matches!(self.nodes[owner], Node::Unary(Unary::Star(StarOp::Transpose), _)) =>
                {
                    log::trace!("double transpose of `{}` collapses at node {}", site.name, owner);
                    substitutions[owner] = Some((**inner).clone());
                },
                _ => substitutions[index] = Some(value.clone()),
            }
        }

        let mut values: Vec<Expr> = Vec::with_capacity(self.nodes.len());
        for (index, node) in self.nodes.iter().enumerate() {
            let value = match (substitutions[index].take(), node) {
                (Some(value), _) => value,
                (None, Node::Var(_, leaf) | Node::Leaf(leaf)) => leaf.clone(),
                (None, Node::Unary(op, a)) => {
                    let a = values[*a].clone();
                    match op {
                        Unary::Differential => Expr::Differential(Arc::new(a)),
                        Unary::Trace => a.trace(),
                        Unary::Star(op) => op.apply(a),
                    }
                },
                (None, Node::Binary(op, a, b)) => {
                    let (a, b) = (values[*a].clone(), values[*b].clone());
                    match op {
                        Binary::Add => a + b,
                        Binary::Sub => a - b,
                        Binary::Mul => a * b,
                    }
                },
            };
            values.push(value);
        }
        values.pop().unwrap_or(Expr::Null)
    }
}

/// Collects the names of the variables in `expr`.
fn variables(expr: &Expr) -> BTreeSet<String> {
    expr.post_order_iter()
        .filter_map(|node| node.as_name().map(str::to_string))
        .collect()
}

/// A rewrite rule: any expression matching `pattern` may be replaced by `replacement`, with the
/// pattern's variables substituted.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pattern: Expr,
    replacement: Expr,
    template: Template,
    size: usize,
    variables: BTreeSet<String>,
}

impl Rule {
    /// Creates a rule. A variable of the replacement that the pattern does not bind is left in
    /// the output as it is.
    pub fn new(pattern: Expr, replacement: Expr) -> Self {
        Self {
            template: Template::compile(&replacement),
            size: pattern.size(),
            variables: variables(&pattern),
            pattern,
            replacement,
        }
    }

    /// Creates a rule, failing if the replacement uses a variable the pattern does not bind.
    pub fn try_new(pattern: Expr, replacement: Expr) -> Result<Self, UnboundVariable> {
        let rule = Self::new(pattern, replacement);
        match variables(&rule.replacement).difference(&rule.variables).next() {
            Some(name) => Err(UnboundVariable { name: name.clone() }),
            None => Ok(rule),
        }
    }

    /// The pattern of the rule.
    pub fn pattern(&self) -> &Expr {
        &self.pattern
    }

    /// The replacement of the rule.
    pub fn replacement(&self) -> &Expr {
        &self.replacement
    }

    /// The number of nodes in the pattern. Larger patterns are more specific.
    pub fn size(&self) -> usize {
        self.size
    }

    /// The names of the pattern's variables.
    pub fn variables(&self) -> &BTreeSet<String> {
        &self.variables
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.pattern, self.replacement)
    }
}

/// Builds the replacement of `rule` with the given bindings substituted for its variables. The
/// output is rebuilt bottom-up through the smart constructors, so it is simplified as it is
/// built.
pub fn apply_rule(rule: &Rule, bindings: &Bindings) -> Expr {
    rule.template.instantiate(bindings)
}
