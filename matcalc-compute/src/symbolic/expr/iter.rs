use super::Expr;

/// An iterator that iteratively traverses the tree of expressions in left-to-right post-order
/// (i.e. depth-first).
///
/// This iterator is created by [`Expr::post_order_iter`].
pub struct ExprIter<'a> {
    /// Nodes still to visit, each paired with whether its children have already been pushed.
    /// Subtrees can be shared between several parents, so nodes are never told apart by address.
    stack: Vec<(&'a Expr, bool)>,
}

impl<'a> ExprIter<'a> {
    /// Creates a new iterator that traverses the tree of expressions in left-to-right post-order
    /// (i.e. depth-first).
    pub fn new(expr: &'a Expr) -> Self {
        Self {
            stack: vec![(expr, false)],
        }
    }
}

impl<'a> Iterator for ExprIter<'a> {
    type Item = &'a Expr;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (expr, expanded) = self.stack.pop()?;
            if expanded {
                return Some(expr);
            }

            match expr {
                Expr::Variable(_) | Expr::ScalarVariable(_) | Expr::Scalar(_) | Expr::Null => {
                    return Some(expr);
                },
                Expr::Differential(inner) | Expr::Trace(inner) | Expr::Star(_, inner) => {
                    self.stack.push((expr, true));
                    self.stack.push((&**inner, false));
                },
                Expr::Add(lhs, rhs)
                    | Expr::Sub(lhs, rhs)
                    | Expr::ScalarMul(lhs, rhs)
                    | Expr::MatMul(lhs, rhs) => {
                    self.stack.push((expr, true));
                    self.stack.push((&**rhs, false));
                    self.stack.push((&**lhs, false));
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use super::*;

    #[test]
    fn post_order() {
        // Tr(A*X) - A
        let a = Arc::new(Expr::Variable("A".to_string()));
        let expr = Expr::Sub(
            Arc::new(Expr::Trace(Arc::new(Expr::MatMul(
                a.clone(),
                Arc::new(Expr::Variable("X".to_string())),
            )))),
            a,
        );

        let visited = expr.post_order_iter().map(|e| e.to_string()).collect::<Vec<_>>();
        assert_eq!(visited, vec!["A", "X", "A*X", "Tr(A*X)", "A", "Tr(A*X)-A"]);
    }
}
