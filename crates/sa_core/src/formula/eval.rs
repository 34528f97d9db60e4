//! Formula evaluation over resolved bindings.
//!
//! Identifier resolution is a single explicit priority chain (supplied
//! input, then declared parameter default, then game constant), kept
//! auditable in one place rather than spread over dictionary fallbacks.

use std::collections::BTreeMap;

use super::parser::{Expr, Formula, Func};
use super::EvalError;

/// A resolved binding value. Strings and booleans can be bound (they arrive
/// from player inputs) but only numbers are usable in arithmetic.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Number(f64),
    Bool(bool),
    Text(String),
}

impl Scalar {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Scalar::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Scalar::Number(_) => "number",
            Scalar::Bool(_) => "boolean",
            Scalar::Text(_) => "string",
        }
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Scalar::Number(v)
    }
}

/// Identifier lookup used during evaluation.
pub trait Resolve {
    fn resolve(&self, key: &str) -> Option<Scalar>;
}

impl Resolve for BTreeMap<String, Scalar> {
    fn resolve(&self, key: &str) -> Option<Scalar> {
        self.get(key).cloned()
    }
}

impl Resolve for BTreeMap<String, f64> {
    fn resolve(&self, key: &str) -> Option<Scalar> {
        self.get(key).map(|n| Scalar::Number(*n))
    }
}

/// Priority chain for metric formulas: supplied player input first, then the
/// declared parameter default, then the game constant. First match wins.
#[derive(Debug, Clone, Copy)]
pub struct ResolutionChain<'a> {
    pub inputs: &'a BTreeMap<String, Scalar>,
    pub defaults: &'a BTreeMap<String, Scalar>,
    pub constants: &'a BTreeMap<String, Scalar>,
}

impl Resolve for ResolutionChain<'_> {
    fn resolve(&self, key: &str) -> Option<Scalar> {
        self.inputs
            .get(key)
            .or_else(|| self.defaults.get(key))
            .or_else(|| self.constants.get(key))
            .cloned()
    }
}

/// Parse and evaluate in one step. Use `Formula::parse` + `Formula::evaluate`
/// when the same formula runs against many binding sets.
pub fn evaluate(formula: &str, bindings: &dyn Resolve) -> Result<f64, EvalError> {
    Formula::parse(formula)?.evaluate(bindings)
}

impl Formula {
    /// Evaluate against the given bindings.
    ///
    /// Division by zero, unresolved identifiers, non-numeric operands, and
    /// non-finite results all surface as `EvalError` rather than NaN.
    pub fn evaluate(&self, bindings: &dyn Resolve) -> Result<f64, EvalError> {
        let value = eval_expr(self.expr(), bindings)?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(EvalError::NonFinite)
        }
    }
}

fn eval_expr(expr: &Expr, bindings: &dyn Resolve) -> Result<f64, EvalError> {
    match expr {
        Expr::Number(value) => Ok(*value),
        Expr::Ident(key) => {
            let scalar = bindings
                .resolve(key)
                .ok_or_else(|| EvalError::UnresolvedIdentifier { key: key.clone() })?;
            scalar.as_number().ok_or_else(|| EvalError::NonNumericOperand { key: key.clone() })
        }
        Expr::Neg(inner) => Ok(-eval_expr(inner, bindings)?),
        Expr::Add(a, b) => Ok(eval_expr(a, bindings)? + eval_expr(b, bindings)?),
        Expr::Sub(a, b) => Ok(eval_expr(a, bindings)? - eval_expr(b, bindings)?),
        Expr::Mul(a, b) => Ok(eval_expr(a, bindings)? * eval_expr(b, bindings)?),
        Expr::Div(a, b) => {
            let denominator = eval_expr(b, bindings)?;
            if denominator == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            Ok(eval_expr(a, bindings)? / denominator)
        }
        Expr::Pow(a, b) => Ok(eval_expr(a, bindings)?.powf(eval_expr(b, bindings)?)),
        Expr::Call(func, args) => {
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                let value = eval_expr(arg, bindings)?;
                // min/max/clamp would swallow a NaN argument, so reject it
                // before the function sees it.
                if !value.is_finite() {
                    return Err(EvalError::NonFinite);
                }
                values.push(value);
            }
            Ok(apply_func(*func, &values))
        }
    }
}

fn apply_func(func: Func, args: &[f64]) -> f64 {
    // Arity is checked at parse time.
    match func {
        Func::Min => args.iter().copied().fold(f64::INFINITY, f64::min),
        Func::Max => args.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        Func::Abs => args[0].abs(),
        Func::Round => args[0].round(),
        Func::Clamp => args[0].max(args[1]).min(args[2]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn bindings(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_eval_precedence_and_associativity() {
        let empty = BTreeMap::<String, f64>::new();
        assert_eq!(evaluate("1 + 2 * 3", &empty).unwrap(), 7.0);
        assert_eq!(evaluate("10 - 4 - 3", &empty).unwrap(), 3.0); // left-to-right
        assert_eq!(evaluate("2 ^ 3 ^ 2", &empty).unwrap(), 512.0); // right-to-left
        assert_eq!(evaluate("(1 + 2) * 3", &empty).unwrap(), 9.0);
        assert_eq!(evaluate("-2 ^ 2", &empty).unwrap(), -4.0); // -(2^2)
    }

    #[test]
    fn test_eval_identifiers() {
        let vars = bindings(&[("hits", 45.0), ("shots", 50.0)]);
        assert_eq!(evaluate("hits / shots * 100", &vars).unwrap(), 90.0);
    }

    #[test]
    fn test_eval_functions() {
        let vars = bindings(&[("x", 137.5)]);
        assert_eq!(evaluate("min(x, 100, 50)", &vars).unwrap(), 50.0);
        assert_eq!(evaluate("max(x, 200)", &vars).unwrap(), 200.0);
        assert_eq!(evaluate("abs(-x)", &vars).unwrap(), 137.5);
        assert_eq!(evaluate("round(x)", &vars).unwrap(), 138.0);
        assert_eq!(evaluate("clamp(x, 0, 100)", &vars).unwrap(), 100.0);
    }

    #[test]
    fn test_eval_division_by_zero() {
        let vars = bindings(&[("shots", 0.0)]);
        assert_eq!(evaluate("10 / shots", &vars).unwrap_err(), EvalError::DivisionByZero);
    }

    #[test]
    fn test_eval_unresolved_identifier() {
        let empty = BTreeMap::<String, f64>::new();
        assert_eq!(
            evaluate("score + 1", &empty).unwrap_err(),
            EvalError::UnresolvedIdentifier { key: "score".into() }
        );
    }

    #[test]
    fn test_eval_non_numeric_operand() {
        let mut vars = BTreeMap::new();
        vars.insert("mode".to_string(), Scalar::Text("hard".into()));
        assert_eq!(
            evaluate("mode * 2", &vars).unwrap_err(),
            EvalError::NonNumericOperand { key: "mode".into() }
        );
    }

    #[test]
    fn test_eval_non_finite_result() {
        let empty = BTreeMap::<String, f64>::new();
        // (-1) ^ 0.5 is NaN in real arithmetic
        assert_eq!(evaluate("(0 - 1) ^ 0.5", &empty).unwrap_err(), EvalError::NonFinite);
    }

    #[test]
    fn test_eval_non_finite_function_argument() {
        // f64::min/max ignore NaN operands and a clamp built from them
        // collapses NaN to the lower bound; a NaN argument must error
        // instead of being absorbed into a finite result.
        let empty = BTreeMap::<String, f64>::new();
        assert_eq!(
            evaluate("clamp((0 - 1) ^ 0.5, 0, 100)", &empty).unwrap_err(),
            EvalError::NonFinite
        );
        assert_eq!(evaluate("min((0 - 1) ^ 0.5, 5)", &empty).unwrap_err(), EvalError::NonFinite);
        assert_eq!(evaluate("max((0 - 1) ^ 0.5, 5)", &empty).unwrap_err(), EvalError::NonFinite);
    }

    #[test]
    fn test_resolution_chain_priority() {
        let inputs: BTreeMap<String, Scalar> =
            [("x".to_string(), Scalar::Number(1.0))].into_iter().collect();
        let defaults: BTreeMap<String, Scalar> = [
            ("x".to_string(), Scalar::Number(2.0)),
            ("y".to_string(), Scalar::Number(20.0)),
        ]
        .into_iter()
        .collect();
        let constants: BTreeMap<String, Scalar> = [
            ("x".to_string(), Scalar::Number(3.0)),
            ("y".to_string(), Scalar::Number(30.0)),
            ("z".to_string(), Scalar::Number(300.0)),
        ]
        .into_iter()
        .collect();

        let chain = ResolutionChain { inputs: &inputs, defaults: &defaults, constants: &constants };
        assert_eq!(chain.resolve("x"), Some(Scalar::Number(1.0))); // input wins
        assert_eq!(chain.resolve("y"), Some(Scalar::Number(20.0))); // default over constant
        assert_eq!(chain.resolve("z"), Some(Scalar::Number(300.0))); // constant fallback
        assert_eq!(chain.resolve("w"), None);

        assert_eq!(evaluate("x + y + z", &chain).unwrap(), 321.0);
    }

    proptest! {
        /// Same formula + same bindings always yields the same result.
        #[test]
        fn prop_evaluation_is_deterministic(a in -1000.0f64..1000.0, b in -1000.0f64..1000.0, c in 0.1f64..100.0) {
            let vars = bindings(&[("a", a), ("b", b), ("c", c)]);
            for formula in ["a + b * c", "clamp(a, b - c, b + c)", "(a - b) / c", "min(a, b, c) + max(a, b)"] {
                let first = evaluate(formula, &vars);
                let second = evaluate(formula, &vars);
                prop_assert_eq!(first, second);
            }
        }

        /// Arbitrary junk input never panics, it either parses or errors.
        #[test]
        fn prop_parser_never_panics(src in "[ a-z0-9+*/^(),.-]{0,40}") {
            let _ = Formula::parse(&src);
        }
    }
}
