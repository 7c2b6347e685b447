use levenshtein::levenshtein;
use std::collections::HashMap;
use super::value::Value;

/// How differentials are evaluated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EvalMode {
    /// Every differential `d(X)` is looked up as a variable of that name, like any other
    /// variable. This is how a direction is fed to a differential.
    #[default]
    Value,

    /// The differential of `wrt` evaluates to an identity matrix, and traces pass their operand
    /// through unchanged. Evaluating a canonical term `Tr(G*d(X))` in this mode yields `G`.
    Gradient {
        /// The variable the gradient is taken with respect to.
        wrt: String,
    },
}

/// A context to use when evaluating an expression, holding the values of its variables.
#[derive(Debug, Clone, Default)]
pub struct Ctxt {
    /// The variables in the context.
    vars: HashMap<String, Value>,

    /// How differentials are evaluated.
    pub mode: EvalMode,
}

impl Ctxt {
    /// Creates a new empty context in [`EvalMode::Value`].
    pub fn new() -> Ctxt {
        Ctxt::default()
    }

    /// Add a variable to the context.
    pub fn add_var(&mut self, name: &str, value: impl Into<Value>) {
        self.vars.insert(name.to_string(), value.into());
    }

    /// Get the value of a variable in the context.
    pub fn get_var(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    /// Returns the variables in the context.
    pub fn get_vars(&self) -> &HashMap<String, Value> {
        &self.vars
    }

    /// Sets the evaluation mode.
    pub fn set_mode(&mut self, mode: EvalMode) {
        self.mode = mode;
    }

    /// Returns the context with the given evaluation mode, builder-style.
    pub fn with_mode(mut self, mode: EvalMode) -> Self {
        self.mode = mode;
        self
    }

    /// Returns all variables in the context with a name similar to the given name, sorted.
    pub fn get_similar_vars(&self, name: &str) -> Vec<&str> {
        let mut names = self.vars
            .keys()
            .filter(|n| levenshtein(n, name) < 2)
            .map(String::as_str)
            .collect::<Vec<_>>();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use super::*;

    #[test]
    fn similar_names() {
        let mut ctxt = Ctxt::new();
        ctxt.add_var("X", 1.0);
        ctxt.add_var("Y", 2.0);
        ctxt.add_var("Xt", 3.0);
        ctxt.add_var("lambda", 4.0);
        assert_eq!(ctxt.get_similar_vars("Z"), vec!["X", "Y"]);
        assert_eq!(ctxt.get_similar_vars("lamda"), vec!["lambda"]);
    }

    #[test]
    fn modes() {
        let ctxt = Ctxt::new().with_mode(EvalMode::Gradient { wrt: "X".to_string() });
        assert_eq!(ctxt.mode, EvalMode::Gradient { wrt: "X".to_string() });
        assert_eq!(Ctxt::new().mode, EvalMode::Value);
    }
}
